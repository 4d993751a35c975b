// XML leg of the converter, built on quick-xml events. Attributes map to
// "@_"-prefixed fields and repeated sibling tags group into arrays.
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::convert::formats::ConversionError;
use crate::convert::json_utils::{infer_scalar, ordered_keys};

const ATTRIBUTE_PREFIX: &str = "@_";
const TEXT_KEY: &str = "#text";

/// Parses an XML document into the intermediate value. The root element's own
/// name is dropped; its content becomes the value, so a document produced by
/// [`value_to_xml`] round-trips without accumulating `root` wrappers.
pub fn xml_to_value(input: &str) -> Result<Value, ConversionError> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(tag)) => {
                let node = element_from_tag(&tag)?;
                stack.push(node);
            }
            Ok(Event::Empty(tag)) => {
                let node = element_from_tag(&tag)?;
                attach(node, &mut stack, &mut root);
            }
            Ok(Event::End(_)) => {
                if let Some(node) = stack.pop() {
                    attach(node, &mut stack, &mut root);
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(text.unescape().unwrap_or_default().as_ref());
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(String::from_utf8_lossy(&data).as_ref());
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(ConversionError {
                    message: format!("Invalid XML: {err}"),
                    line: Some(line_at(input, reader.buffer_position())),
                })
            }
            _ => {}
        }
        buf.clear();
    }
    let root = root.ok_or_else(|| ConversionError::new("Invalid XML: no root element"))?;
    Ok(element_to_value(&root))
}

/// Renders the intermediate value as an XML document wrapped under a synthetic
/// `<root>` element. `@_`-prefixed fields become attributes, `#text` becomes
/// element text, and arrays repeat the enclosing element name.
pub fn value_to_xml(value: &Value) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    build_xml(&mut out, "root", value, 0);
    out
}

fn element_from_tag(tag: &quick_xml::events::BytesStart<'_>) -> Result<XmlElement, ConversionError> {
    let name = String::from_utf8_lossy(tag.name().as_ref()).trim().to_string();
    let mut node = XmlElement::new(name);
    for attr in tag.attributes() {
        let attr = attr.map_err(|err| ConversionError::new(format!("Invalid XML: {err}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| ConversionError::new(format!("Invalid XML: {err}")))?;
        node.attributes.push((key, infer_scalar(value.as_ref())));
    }
    Ok(node)
}

fn attach(node: XmlElement, stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else {
        *root = Some(node);
    }
}

fn element_to_value(el: &XmlElement) -> Value {
    let text = el.text.trim();
    if el.children.is_empty() && el.attributes.is_empty() {
        return infer_scalar(text);
    }
    let mut obj = Map::new();
    for (name, value) in &el.attributes {
        obj.insert(format!("{ATTRIBUTE_PREFIX}{name}"), value.clone());
    }
    for child in &el.children {
        let entry = obj.entry(child.name.clone()).or_insert(Value::Null);
        let value = element_to_value(child);
        if entry.is_null() {
            *entry = value;
        } else if let Value::Array(arr) = entry {
            arr.push(value);
        } else {
            let existing = entry.clone();
            *entry = Value::Array(vec![existing, value]);
        }
    }
    if !text.is_empty() {
        obj.insert(TEXT_KEY.into(), infer_scalar(text));
    }
    Value::Object(obj)
}

fn build_xml(buf: &mut String, name: &str, value: &Value, depth: usize) {
    let indent = "  ".repeat(depth);
    match value {
        Value::Object(map) => {
            let mut attrs = String::new();
            let mut text: Option<String> = None;
            let mut children: Vec<(String, &Value)> = Vec::new();
            for key in ordered_keys(map) {
                let child = match map.get(&key) {
                    Some(child) => child,
                    None => continue,
                };
                if let Some(attr_name) = key.strip_prefix(ATTRIBUTE_PREFIX) {
                    attrs.push_str(&format!(
                        " {attr_name}=\"{}\"",
                        attr_escape(&scalar_text(child))
                    ));
                } else if key == TEXT_KEY {
                    text = Some(xml_escape(&scalar_text(child)));
                } else {
                    children.push((key, child));
                }
            }
            if children.is_empty() {
                let text = text.unwrap_or_default();
                buf.push_str(&format!("{indent}<{name}{attrs}>{text}</{name}>\n"));
            } else {
                buf.push_str(&format!("{indent}<{name}{attrs}>\n"));
                if let Some(text) = text {
                    buf.push_str(&format!("{indent}  {text}\n"));
                }
                for (key, child) in children {
                    build_xml(buf, &key, child, depth + 1);
                }
                buf.push_str(&format!("{indent}</{name}>\n"));
            }
        }
        Value::Array(items) => {
            for item in items {
                build_xml(buf, name, item, depth);
            }
        }
        _ => {
            buf.push_str(&format!(
                "{indent}<{name}>{}</{name}>\n",
                xml_escape(&scalar_text(value))
            ));
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => String::new(),
    }
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn attr_escape(input: &str) -> String {
    xml_escape(input).replace('"', "&quot;")
}

fn line_at(input: &str, byte_offset: usize) -> u64 {
    let end = byte_offset.min(input.len());
    input[..end].bytes().filter(|b| *b == b'\n').count() as u64 + 1
}

#[derive(Debug, Clone)]
struct XmlElement {
    name: String,
    text: String,
    attributes: Vec<(String, Value)>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn xml_to_value_groups_repeated_tags_into_arrays() {
        let value = xml_to_value("<root><item>1</item><item>2</item></root>").unwrap();
        assert_eq!(value, json!({"item": [1, 2]}));
    }

    #[test]
    fn xml_to_value_prefixes_attributes_and_infers_types() {
        let value = xml_to_value("<root><user id=\"7\" admin=\"true\">Ada</user></root>").unwrap();
        assert_eq!(
            value,
            json!({"user": {"@_id": 7, "@_admin": true, "#text": "Ada"}})
        );
    }

    #[test]
    fn xml_to_value_handles_self_closing_elements() {
        let value = xml_to_value("<root><flag enabled=\"false\"/></root>").unwrap();
        assert_eq!(value, json!({"flag": {"@_enabled": false}}));
    }

    #[test]
    fn xml_to_value_infers_scalar_root_content() {
        let value = xml_to_value("<root><a>1</a><b>x</b></root>").unwrap();
        assert_eq!(value, json!({"a": 1, "b": "x"}));
    }

    #[test]
    fn xml_to_value_rejects_malformed_documents() {
        let err = xml_to_value("<root><a>1</b></root>").unwrap_err();
        assert!(err.message.starts_with("Invalid XML:"), "msg: {}", err.message);
    }

    #[test]
    fn xml_to_value_rejects_empty_input() {
        let err = xml_to_value("").unwrap_err();
        assert!(err.message.contains("no root element"), "msg: {}", err.message);
    }

    #[test]
    fn value_to_xml_wraps_under_root() {
        let xml = value_to_xml(&json!({"a": 1}));
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n  <a>1</a>\n</root>\n"
        );
    }

    #[test]
    fn value_to_xml_renders_attributes_and_text() {
        let xml = value_to_xml(&json!({"user": {"@_id": 7, "#text": "Ada"}}));
        assert!(xml.contains("<user id=\"7\">Ada</user>"), "xml: {xml}");
    }

    #[test]
    fn value_to_xml_escapes_markup() {
        let xml = value_to_xml(&json!({"a": "x < y & z"}));
        assert!(xml.contains("<a>x &lt; y &amp; z</a>"), "xml: {xml}");
        let xml = value_to_xml(&json!({"b": {"@_note": "say \"hi\""}}));
        assert!(xml.contains("note=\"say &quot;hi&quot;\""), "xml: {xml}");
    }

    #[test]
    fn value_to_xml_repeats_element_for_arrays() {
        let xml = value_to_xml(&json!({"item": [{"a": 1}, {"a": 2}]}));
        assert_eq!(xml.matches("<item>").count(), 2);
        assert_eq!(xml.matches("</item>").count(), 2);
    }
}
