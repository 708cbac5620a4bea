//! Normalization of YGL responses.
//!
//! YGL mostly answers in XML. XML bodies are turned into a generic JSON tree:
//!
//! - the document becomes `{ <root name>: <root element> }`
//! - an element with only text becomes that string (`""` when empty)
//! - attributes live under `"$"`, text next to attributes or children under `"_"`
//! - repeated child names collapse into an array in document order
//! - a child named `_` or `$` shares its key with the element's own text or
//!   attributes; the values collapse into one array, the element's own first
//!
//! Anything that cannot be parsed is returned as `{ "raw": <body> }`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{json, Map, Value};
use std::fmt;

#[derive(Debug)]
pub enum XmlTreeError {
    Parse(quick_xml::Error),
    Malformed(&'static str),
}

impl fmt::Display for XmlTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlTreeError::Parse(e) => write!(f, "XML parse error: {}", e),
            XmlTreeError::Malformed(msg) => write!(f, "Malformed XML: {}", msg),
        }
    }
}

impl std::error::Error for XmlTreeError {}

impl From<quick_xml::Error> for XmlTreeError {
    fn from(err: quick_xml::Error) -> Self {
        XmlTreeError::Parse(err)
    }
}

impl From<quick_xml::events::attributes::AttrError> for XmlTreeError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        XmlTreeError::Parse(err.into())
    }
}

/// Normalizes an upstream body.
///
/// XML content types, and bodies that are not JSON, go through the XML tree
/// conversion; JSON passes through unchanged.
pub fn normalize(content_type: Option<&str>, body: &str) -> Value {
    let declared_xml = content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("xml"));

    if !declared_xml {
        if let Ok(value) = serde_json::from_str::<Value>(body) {
            return value;
        }
    }

    match xml_to_value(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Returning raw upstream body: {}", e);
            json!({ "raw": body })
        }
    }
}

struct Element {
    name: String,
    attributes: Map<String, Value>,
    text: String,
    children: Vec<(String, Value)>,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, XmlTreeError> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|_| XmlTreeError::Malformed("element name is not UTF-8"))?
            .to_string();

        let mut attributes = Map::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|_| XmlTreeError::Malformed("attribute name is not UTF-8"))?
                .to_string();
            let value = attr.unescape_value()?.into_owned();
            attributes.insert(key, Value::String(value));
        }

        Ok(Self {
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    fn into_value(self) -> Value {
        let text = self.text.trim();
        if self.attributes.is_empty() && self.children.is_empty() {
            return Value::String(text.to_string());
        }

        let mut object = Map::new();
        if !self.attributes.is_empty() {
            object.insert("$".to_string(), Value::Object(self.attributes));
        }
        if !text.is_empty() {
            object.insert("_".to_string(), Value::String(text.to_string()));
        }
        for (name, value) in self.children {
            match object.get_mut(&name) {
                // Already collapsed: a repeated child, or a child sharing a reserved key.
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    object.insert(name, value);
                }
            }
        }
        Value::Object(object)
    }
}

/// Parses an XML document into the generic tree described in the module docs.
pub fn xml_to_value(xml: &str) -> Result<Value, XmlTreeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(XmlTreeError::Malformed("more than one root element"));
                }
                stack.push(Element::open(&start)?);
            }
            Event::Empty(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(XmlTreeError::Malformed("more than one root element"));
                }
                let element = Element::open(&start)?;
                close(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or(XmlTreeError::Malformed("closing tag without opening tag"))?;
                close(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                append_text(&mut stack, &text)?;
            }
            Event::CData(data) => {
                let data = data.into_inner();
                append_text(&mut stack, &String::from_utf8_lossy(&data))?;
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(XmlTreeError::Malformed("unclosed element"));
    }

    let (name, value) = root.ok_or(XmlTreeError::Malformed("no root element"))?;
    let mut document = Map::new();
    document.insert(name, value);
    Ok(Value::Object(document))
}

fn close(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<(String, Value)>,
) -> Result<(), XmlTreeError> {
    let name = element.name.clone();
    let value = element.into_value();
    match stack.last_mut() {
        Some(parent) => parent.children.push((name, value)),
        None => {
            if root.is_some() {
                return Err(XmlTreeError::Malformed("more than one root element"));
            }
            *root = Some((name, value));
        }
    }
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str) -> Result<(), XmlTreeError> {
    match stack.last_mut() {
        Some(element) => {
            element.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(XmlTreeError::Malformed("text outside the root element")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTINGS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<YGLResponse responseCode="300">
  <Total>2</Total>
  <Listings>
    <Listing>
      <ID>BOS-1</ID>
      <Beds>2</Beds>
      <Photos count="1"><Photo>https://img.example.com/1.jpg</Photo></Photos>
    </Listing>
    <Listing>
      <ID>BOS-2</ID>
      <Beds>3</Beds>
      <Note/>
    </Listing>
  </Listings>
</YGLResponse>"#;

    #[test]
    fn test_xml_listings_to_tree() {
        let value = normalize(Some("text/xml; charset=utf-8"), LISTINGS_XML);
        let root = &value["YGLResponse"];

        assert_eq!(root["$"]["responseCode"], "300");
        assert_eq!(root["Total"], "2");

        let listings = root["Listings"]["Listing"].as_array().unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0]["ID"], "BOS-1");
        assert_eq!(listings[0]["Photos"]["$"]["count"], "1");
        assert_eq!(listings[0]["Photos"]["Photo"], "https://img.example.com/1.jpg");
        assert_eq!(listings[1]["Note"], "");
    }

    #[test]
    fn test_single_child_is_not_an_array() {
        let value = xml_to_value("<a><b>1</b></a>").unwrap();
        assert_eq!(value, json!({"a": {"b": "1"}}));
    }

    #[test]
    fn test_text_with_attributes_goes_under_underscore() {
        let value = xml_to_value(r#"<rent currency="USD">2500</rent>"#).unwrap();
        assert_eq!(value, json!({"rent": {"$": {"currency": "USD"}, "_": "2500"}}));
    }

    #[test]
    fn test_child_named_underscore_joins_text() {
        let value = xml_to_value(r#"<a x="1">t<_>u</_></a>"#).unwrap();
        assert_eq!(value, json!({"a": {"$": {"x": "1"}, "_": ["t", "u"]}}));

        let value = xml_to_value(r#"<a x="1">t<_>u</_><_>v</_></a>"#).unwrap();
        assert_eq!(value["a"]["_"], json!(["t", "u", "v"]));
    }

    #[test]
    fn test_entities_and_cdata() {
        let value = xml_to_value("<a><b>Tom &amp; Jerry</b><c><![CDATA[<raw>]]></c></a>").unwrap();
        assert_eq!(value["a"]["b"], "Tom & Jerry");
        assert_eq!(value["a"]["c"], "<raw>");
    }

    #[test]
    fn test_json_passes_through() {
        let body = r#"{"listings": [1, 2]}"#;
        assert_eq!(
            normalize(Some("application/json"), body),
            json!({"listings": [1, 2]})
        );
        assert_eq!(normalize(None, body), json!({"listings": [1, 2]}));
    }

    #[test]
    fn test_xml_without_content_type_is_detected() {
        let value = normalize(None, "<ok>yes</ok>");
        assert_eq!(value, json!({"ok": "yes"}));
    }

    #[test]
    fn test_malformed_xml_returns_raw() {
        for body in [
            "<a><b></a>",
            "<a><b>unclosed",
            "</a>",
            "plain text reply",
            "<a/><b/>",
            "",
        ] {
            assert_eq!(
                normalize(Some("application/xml"), body),
                json!({ "raw": body }),
                "body: {:?}",
                body
            );
        }
    }
}
