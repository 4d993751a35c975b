// Lightweight JSON helpers shared by the CSV and XML converters.
use serde_json::{Map, Number, Value};

use crate::convert::formats::ConversionError;

/// Parses a JSON string into `serde_json::Value`, carrying the parser's line
/// number in the returned error when one is reported.
///
/// # Example
/// ```
/// use converter_core::convert::json_utils::parse_json;
/// let value = parse_json("{\"id\":1}")?;
/// assert_eq!(value["id"], 1);
/// # Ok::<(), converter_core::convert::formats::ConversionError>(())
/// ```
pub fn parse_json(input: &str) -> Result<Value, ConversionError> {
    serde_json::from_str(input).map_err(|err| {
        let line = (err.line() > 0).then(|| err.line() as u64);
        ConversionError {
            message: format!("Invalid JSON: {err}"),
            line,
        }
    })
}

/// Encodes a JSON `Value` with optional minification, trimming trailing
/// newlines so the output is UI-friendly. Pretty output uses 2-space indent.
///
/// # Example
/// ```
/// use serde_json::json;
/// use converter_core::convert::json_utils::encode_json;
/// let text = encode_json(&json!({"a":1}), true)?;
/// assert_eq!(text, "{\"a\":1}");
/// # Ok::<(), converter_core::convert::formats::ConversionError>(())
/// ```
pub fn encode_json(value: &Value, minify: bool) -> Result<String, ConversionError> {
    let serialized = if minify {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .map_err(|err| ConversionError::new(err.to_string()))?;
    Ok(serialized.trim_end().to_string())
}

/// Returns keys of a JSON object sorted alphabetically for deterministic output.
pub fn ordered_keys(map: &Map<String, Value>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}

/// Applies the automatic type inference used when reading CSV fields and XML
/// text/attribute values: booleans and numeric-looking strings become typed
/// scalars, everything else stays a string.
///
/// Inference is intentionally lossy for zero-padded codes (`"007"` parses to
/// `7`); round-trip fidelity for such values is documented behavior.
pub fn infer_scalar(text: &str) -> Value {
    let trimmed = text.trim();
    match trimmed {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if looks_numeric(trimmed) {
        if let Ok(int) = trimmed.parse::<i64>() {
            return Value::Number(Number::from(int));
        }
        if let Ok(float) = trimmed.parse::<f64>() {
            if float.is_finite() {
                if let Some(num) = Number::from_f64(float) {
                    return Value::Number(num);
                }
            }
        }
    }
    Value::String(text.to_string())
}

// Restricts float parsing to digit-shaped text so "inf"/"nan" stay strings.
fn looks_numeric(s: &str) -> bool {
    let mut has_digit = false;
    for ch in s.chars() {
        match ch {
            '0'..='9' => has_digit = true,
            '-' | '+' | '.' | 'e' | 'E' => {}
            _ => return false,
        }
    }
    has_digit
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn infer_scalar_detects_integers_and_floats() {
        assert_eq!(infer_scalar("42"), json!(42));
        assert_eq!(infer_scalar("-3"), json!(-3));
        assert_eq!(infer_scalar("2.5"), json!(2.5));
        assert_eq!(infer_scalar("1e3"), json!(1000.0));
    }

    #[test]
    fn infer_scalar_detects_booleans() {
        assert_eq!(infer_scalar("true"), json!(true));
        assert_eq!(infer_scalar("false"), json!(false));
    }

    #[test]
    fn infer_scalar_keeps_non_numeric_text() {
        assert_eq!(infer_scalar("Ada"), json!("Ada"));
        assert_eq!(infer_scalar(""), json!(""));
        assert_eq!(infer_scalar("inf"), json!("inf"));
        assert_eq!(infer_scalar("NaN"), json!("NaN"));
        assert_eq!(infer_scalar("1.2.3"), json!("1.2.3"));
        assert_eq!(infer_scalar("TRUE"), json!("TRUE"));
    }

    #[test]
    fn infer_scalar_drops_leading_zeros() {
        // Zero-padded codes lose their padding on purpose.
        assert_eq!(infer_scalar("007"), json!(7));
    }

    #[test]
    fn parse_json_reports_line() {
        let err = parse_json("{\n  \"a\":\n}").unwrap_err();
        assert!(err.message.starts_with("Invalid JSON:"), "msg: {}", err.message);
        assert_eq!(err.line, Some(3));
    }

    #[test]
    fn encode_json_pretty_uses_two_space_indent() {
        let text = encode_json(&json!({"a": 1}), false).unwrap();
        assert_eq!(text, "{\n  \"a\": 1\n}");
    }
}
