use console_error_panic_hook::set_once as set_panic_hook;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod convert;

pub use convert::{ConversionError, FileFormat};

#[wasm_bindgen(start)]
pub fn wasm_start() {
    set_panic_hook();
}

fn error_to_js(err: &ConversionError) -> JsValue {
    serde_wasm_bindgen::to_value(err).unwrap_or_else(|_| JsValue::from_str(&err.message))
}

fn parse_format(name: &str, role: &str) -> Result<FileFormat, ConversionError> {
    FileFormat::parse(name)
        .ok_or_else(|| ConversionError::new(format!("Unsupported {role} format: {name}")))
}

/// Converts file content between JSON, CSV, and XML. Errors cross the boundary
/// as `{ message, line? }` objects so the UI can point at the offending row.
#[wasm_bindgen]
pub fn convert_file(from: &str, to: &str, content: &str) -> Result<String, JsValue> {
    convert_file_internal(from, to, content).map_err(|err| error_to_js(&err))
}

fn convert_file_internal(
    from: &str,
    to: &str,
    content: &str,
) -> Result<String, ConversionError> {
    let from = parse_format(from, "source")?;
    let to = parse_format(to, "target")?;
    convert::convert_formats(from, to, content)
}

/// Pretty-prints or minifies content in its own format for the editor pane.
#[wasm_bindgen]
pub fn format_file(format: &str, content: &str, minify: bool) -> Result<String, JsValue> {
    format_file_internal(format, content, minify).map_err(|err| error_to_js(&err))
}

fn format_file_internal(
    format: &str,
    content: &str,
    minify: bool,
) -> Result<String, ConversionError> {
    let format = parse_format(format, "content")?;
    convert::format_content(format, content, minify)
}

/// Guesses a format tag from a dropped file's name, for pre-selecting the
/// source dropdown. Returns `undefined` for unknown extensions.
#[wasm_bindgen]
pub fn detect_format(file_name: &str) -> Option<String> {
    convert::infer_format_from_name(file_name).map(|format| format.tag().to_string())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DownloadInfo {
    mime_type: &'static str,
    file_name: String,
}

/// Returns the MIME type and suggested file name for downloading converted
/// output in the given format.
#[wasm_bindgen]
pub fn download_info(format: &str) -> Result<JsValue, JsValue> {
    let format = parse_format(format, "target").map_err(|err| error_to_js(&err))?;
    let (mime_type, ext) = format.mime_and_ext();
    let info = DownloadInfo {
        mime_type,
        file_name: format!("converted.{ext}"),
    };
    serde_wasm_bindgen::to_value(&info).map_err(|err| JsValue::from_str(&err.to_string()))
}
