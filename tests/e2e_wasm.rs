#![cfg(target_arch = "wasm32")]

use serde_json::Value as JsonValue;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

use converter_core::{convert_file, detect_format, download_info, format_file};

wasm_bindgen_test_configure!(run_in_browser);

fn js_to_json(value: JsValue) -> JsonValue {
    serde_wasm_bindgen::from_value(value).expect("JsValue -> JSON")
}

#[wasm_bindgen_test]
fn converter_json_to_csv_via_wasm() {
    let csv = convert_file("json", "csv", r#"[{"id":1,"name":"Ada"},{"id":2,"name":"Bob"}]"#)
        .expect("json -> csv");
    assert_eq!(csv, "id,name\n1,Ada\n2,Bob\n");
}

#[wasm_bindgen_test]
fn converter_identity_passes_through_unvalidated() {
    let out = convert_file("xml", "xml", "<not really xml").expect("identity passthrough");
    assert_eq!(out, "<not really xml");
}

#[wasm_bindgen_test]
fn converter_errors_cross_as_structured_objects() {
    let err = convert_file("json", "xml", "{\"a\":").expect_err("malformed json");
    let obj = js_to_json(err);
    let message = obj
        .get("message")
        .and_then(|v| v.as_str())
        .expect("error carries a message");
    assert!(message.starts_with("Invalid JSON:"), "message: {message}");
}

#[wasm_bindgen_test]
fn converter_csv_errors_point_at_the_row() {
    let err = convert_file("csv", "json", "a,b\n1,2\n3\n").expect_err("ragged csv");
    let obj = js_to_json(err);
    assert_eq!(obj.get("line").and_then(|v| v.as_u64()), Some(3));
}

#[wasm_bindgen_test]
fn formatter_pretty_prints_json() {
    let pretty = format_file("json", "{\"a\":1}", false).expect("pretty print");
    assert_eq!(pretty, "{\n  \"a\": 1\n}");
}

#[wasm_bindgen_test]
fn upload_zone_format_detection() {
    assert_eq!(detect_format("export.Json").as_deref(), Some("json"));
    assert_eq!(detect_format("report.pdf"), None);
}

#[wasm_bindgen_test]
fn download_info_reports_mime_and_file_name() {
    let info = js_to_json(download_info("csv").expect("csv download info"));
    assert_eq!(
        info.get("mimeType").and_then(|v| v.as_str()),
        Some("text/csv")
    );
    assert_eq!(
        info.get("fileName").and_then(|v| v.as_str()),
        Some("converted.csv")
    );
}
