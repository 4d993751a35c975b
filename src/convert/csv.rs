// CSV leg of the converter: header-keyed rows in, flattened records out.
use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::convert::formats::ConversionError;
use crate::convert::json_utils::infer_scalar;

/// Parses CSV with a header row into an array of row objects. Blank lines are
/// skipped and every field runs through scalar type inference, so numeric
/// strings come back as numbers.
pub fn csv_to_value(input: &str) -> Result<Value, ConversionError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());
    let headers = reader.headers().map_err(csv_error)?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let mut obj = Map::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            obj.insert(header.to_string(), infer_scalar(field));
        }
        rows.push(Value::Object(obj));
    }
    Ok(Value::Array(rows))
}

/// Serializes a value into CSV text. The value must be an array of records; a
/// bare object is wrapped as a single-record sequence first. The header is the
/// sorted union of record keys, and nested values are embedded as JSON text.
pub fn value_to_csv(value: &Value) -> Result<String, ConversionError> {
    let rows: Vec<&Map<String, Value>> = match value {
        Value::Array(items) => {
            let mut rows = Vec::with_capacity(items.len());
            for item in items {
                let obj = item.as_object().ok_or_else(|| {
                    ConversionError::new("CSV rows must be objects")
                })?;
                rows.push(obj);
            }
            rows
        }
        Value::Object(obj) => vec![obj],
        _ => {
            return Err(ConversionError::new(
                "CSV output requires an object or an array of objects",
            ))
        }
    };

    let mut key_set = BTreeSet::new();
    for row in &rows {
        for key in row.keys() {
            key_set.insert(key.clone());
        }
    }
    let headers: Vec<String> = key_set.into_iter().collect();
    if headers.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(&headers).map_err(csv_error)?;
    for row in &rows {
        let mut cells = Vec::with_capacity(headers.len());
        for header in &headers {
            cells.push(cell_text(row.get(header))?);
        }
        writer.write_record(&cells).map_err(csv_error)?;
    }
    writer.flush().map_err(|err| ConversionError::new(err.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|err| ConversionError::new(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ConversionError::new(err.to_string()))
}

fn cell_text(value: Option<&Value>) -> Result<String, ConversionError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(Value::Number(num)) => Ok(num.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => serde_json::to_string(other)
            .map_err(|err| ConversionError::new(format!("Failed to encode nested value: {err}"))),
    }
}

fn csv_error(err: csv::Error) -> ConversionError {
    let line = match err.kind() {
        csv::ErrorKind::Utf8 { pos, .. } => pos.as_ref().map(|p| p.line()),
        csv::ErrorKind::UnequalLengths { pos, .. } => pos.as_ref().map(|p| p.line()),
        _ => None,
    };
    ConversionError {
        message: format!("CSV error: {err}"),
        line,
    }
}
