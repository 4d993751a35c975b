//! Format conversion pipeline.
//!
//! Every conversion passes through a single intermediate representation
//! (`serde_json::Value`): the source format parses into it and the target
//! format serializes out of it. The intermediate value lives for one call
//! only, so conversions are independent and safe to run concurrently.
//!
//! # Examples
//!
//! ```rust
//! use converter_core::convert::formats::{convert_formats, FileFormat};
//!
//! let json = convert_formats(FileFormat::Csv, FileFormat::Json, "a,b\n1,2\n")?;
//! assert!(json.contains("\"a\": 1"));
//! # Ok::<(), converter_core::convert::formats::ConversionError>(())
//! ```
use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

use crate::convert::csv::{csv_to_value, value_to_csv};
use crate::convert::json_utils::{encode_json, parse_json};
use crate::convert::xml::{value_to_xml, xml_to_value};

/// Structured failure returned instead of converted text. Parse errors and
/// structural serialization errors share this one shape; `line` is populated
/// when the underlying parser reports a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
}

impl ConversionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {line})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ConversionError {}

/// The formats the converter understands. The tag doubles as the UI value for
/// the source/target dropdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Csv,
    Xml,
}

impl FileFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Xml => "xml",
        }
    }

    pub fn mime_and_ext(&self) -> (&'static str, &'static str) {
        match self {
            Self::Json => ("application/json", "json"),
            Self::Csv => ("text/csv", "csv"),
            Self::Xml => ("application/xml", "xml"),
        }
    }
}

/// Converts text between the supported formats.
///
/// Identical source and target short-circuit to the unmodified input, even
/// when the content is not valid for that format. Otherwise the source parses
/// into the intermediate value and the target serializes it:
///
/// - JSON output is pretty-printed with 2-space indentation.
/// - CSV output needs an array of records; a bare object becomes a
///   single-record sequence. XML sources are first searched depth-first for
///   an array of rows, falling back to the whole parsed value as one row.
/// - XML output is wrapped under a synthetic `<root>`; CSV rows additionally
///   get a repeated `<item>` wrapper so the document keeps a single root.
///
/// # Examples
/// ```
/// use converter_core::convert::formats::{convert_formats, FileFormat};
///
/// let csv = convert_formats(FileFormat::Json, FileFormat::Csv, "{\"a\":1,\"b\":2}")?;
/// assert_eq!(csv, "a,b\n1,2\n");
/// # Ok::<(), converter_core::convert::formats::ConversionError>(())
/// ```
pub fn convert_formats(
    from: FileFormat,
    to: FileFormat,
    input: &str,
) -> Result<String, ConversionError> {
    if from == to {
        return Ok(input.to_string());
    }
    let value = match from {
        FileFormat::Json => parse_json(input)?,
        FileFormat::Csv => csv_to_value(input)?,
        FileFormat::Xml => xml_to_value(input)?,
    };
    match to {
        FileFormat::Json => encode_json(&value, false),
        FileFormat::Csv => {
            let rows = if from == FileFormat::Xml {
                rows_for_csv(value)
            } else {
                value
            };
            value_to_csv(&rows)
        }
        FileFormat::Xml => {
            // CSV always parses to a row array; the <item> wrapper keeps the
            // repeated records under one root element.
            let value = if from == FileFormat::Csv {
                json!({ "item": value })
            } else {
                value
            };
            Ok(value_to_xml(&value))
        }
    }
}

// Depth-first search for the first array in an XML tree so repeated elements
// become the CSV rows. With no array present the whole value is a single row.
fn rows_for_csv(value: Value) -> Value {
    if let Some(rows) = find_array(&value) {
        return rows.clone();
    }
    Value::Array(vec![value])
}

fn find_array(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(_) => Some(value),
        Value::Object(map) => map.values().find_map(find_array),
        _ => None,
    }
}

/// Pretty-prints or minifies content in place for the editor pane. CSV and XML
/// re-render in canonical form; only JSON distinguishes `minify`.
///
/// # Examples
/// ```
/// use converter_core::convert::formats::{format_content, FileFormat};
/// let minified = format_content(FileFormat::Json, "{ \"a\": 1 }", true)?;
/// assert_eq!(minified, "{\"a\":1}");
/// # Ok::<(), converter_core::convert::formats::ConversionError>(())
/// ```
pub fn format_content(
    format: FileFormat,
    input: &str,
    minify: bool,
) -> Result<String, ConversionError> {
    match format {
        FileFormat::Json => {
            let value = parse_json(input)?;
            encode_json(&value, minify)
        }
        FileFormat::Csv => {
            let value = csv_to_value(input)?;
            value_to_csv(&value)
        }
        FileFormat::Xml => {
            let value = xml_to_value(input)?;
            Ok(value_to_xml(&value))
        }
    }
}

/// Guesses a format from a file name so the UI can pre-select the source
/// dropdown after a drop or upload.
pub fn infer_format_from_name(name: &str) -> Option<FileFormat> {
    let lowered = name.to_lowercase();
    if lowered.ends_with(".json") {
        Some(FileFormat::Json)
    } else if lowered.ends_with(".csv") {
        Some(FileFormat::Csv)
    } else if lowered.ends_with(".xml") {
        Some(FileFormat::Xml)
    } else {
        None
    }
}
