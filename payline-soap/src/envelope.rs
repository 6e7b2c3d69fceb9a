//! SOAP 1.1 envelope encoding and decoding.
//!
//! Documents are `serde_json::Value` trees. Objects become elements in
//! insertion order, arrays repeat their element, `null` is skipped. On the
//! way back, prefixes are dropped, repeated siblings collapse into arrays
//! and leaf elements become strings.

use std::fmt::Write;

use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde_json::{Map, Value};

use crate::{Document, Result, SoapError};

/// SOAP 1.1 envelope namespace.
pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Namespaces used when serializing a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespaces {
    /// Namespace of the operation element and its direct children.
    pub operation: String,
    /// Namespace of nested object fields. Falls back to `operation`.
    pub object: Option<String>,
}

impl Namespaces {
    /// Use a single namespace for every element.
    pub fn single(namespace: impl Into<String>) -> Self {
        Self {
            operation: namespace.into(),
            object: None,
        }
    }

    /// Qualify nested fields with a separate object namespace.
    pub fn with_object(mut self, namespace: impl Into<String>) -> Self {
        self.object = Some(namespace.into());
        self
    }
}

/// Serialize a request document into a complete SOAP envelope.
///
/// The body element is `<impl:{operation}Request>`.
pub fn encode_request(operation: &str, namespaces: &Namespaces, document: &Document) -> Result<String> {
    let Value::Object(fields) = document else {
        return Err(SoapError::Xml(format!(
            "request document for {operation} must be an object"
        )));
    };

    let mut xml = String::with_capacity(1024);
    xml.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    let _ = write!(
        xml,
        r#"<soapenv:Envelope xmlns:soapenv="{}" xmlns:impl="{}""#,
        SOAP_ENVELOPE_NS,
        escape(namespaces.operation.as_str())
    );
    if let Some(object) = &namespaces.object {
        let _ = write!(xml, r#" xmlns:obj="{}""#, escape(object.as_str()));
    }
    xml.push_str("><soapenv:Header/><soapenv:Body>");
    let _ = write!(xml, "<impl:{operation}Request>");
    for (name, value) in fields {
        write_element(&mut xml, name, value, 0, namespaces);
    }
    let _ = write!(xml, "</impl:{operation}Request>");
    xml.push_str("</soapenv:Body></soapenv:Envelope>");

    Ok(xml)
}

fn write_element(xml: &mut String, name: &str, value: &Value, depth: usize, namespaces: &Namespaces) {
    let prefix = if depth == 0 || namespaces.object.is_none() {
        "impl"
    } else {
        "obj"
    };

    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                write_element(xml, name, item, depth, namespaces);
            }
        }
        Value::Object(fields) if fields.is_empty() => {
            let _ = write!(xml, "<{prefix}:{name}/>");
        }
        Value::Object(fields) => {
            let _ = write!(xml, "<{prefix}:{name}>");
            for (child, value) in fields {
                write_element(xml, child, value, depth + 1, namespaces);
            }
            let _ = write!(xml, "</{prefix}:{name}>");
        }
        Value::String(text) => {
            let _ = write!(xml, "<{prefix}:{name}>{}</{prefix}:{name}>", escape(text.as_str()));
        }
        Value::Number(number) => {
            let _ = write!(xml, "<{prefix}:{name}>{number}</{prefix}:{name}>");
        }
        Value::Bool(flag) => {
            let _ = write!(xml, "<{prefix}:{name}>{flag}</{prefix}:{name}>");
        }
    }
}

/// Decode a SOAP response envelope into the content of its body element.
///
/// A `Fault` in the body is returned as [`SoapError::Fault`].
pub fn decode_response(xml: &str) -> Result<Document> {
    let mut tree = parse_tree(xml)?;
    let body = tree
        .pointer_mut("/Envelope/Body")
        .map(Value::take)
        .ok_or_else(|| SoapError::Xml("missing SOAP envelope body".to_string()))?;

    let Value::Object(mut body) = body else {
        return Ok(Value::Object(Map::new()));
    };

    if let Some(fault) = body.get("Fault") {
        return Err(fault_error(fault));
    }

    // Body has a single response element.
    let first = body.keys().next().cloned();
    match first.and_then(|key| body.remove(&key)) {
        Some(Value::Object(content)) => Ok(Value::Object(content)),
        _ => Ok(Value::Object(Map::new())),
    }
}

/// Try to extract a fault from a raw body, used for non-2xx responses.
pub fn decode_fault(xml: &str) -> Option<SoapError> {
    let tree = parse_tree(xml).ok()?;
    tree.pointer("/Envelope/Body/Fault").map(fault_error)
}

fn fault_error(fault: &Value) -> SoapError {
    let field = |name: &str| {
        fault
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    SoapError::Fault {
        code: field("faultcode"),
        message: field("faultstring"),
    }
}

struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
    nil: bool,
}

impl Frame {
    fn root() -> Self {
        Self {
            name: String::new(),
            children: Map::new(),
            text: String::new(),
            nil: false,
        }
    }

    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = utf8(start.local_name().as_ref())?.to_string();
        let mut nil = false;
        for attr in start.attributes() {
            let attr = attr.map_err(|e| SoapError::Xml(e.to_string()))?;
            if attr.key.local_name().as_ref() == b"nil" && attr.value.as_ref() == b"true" {
                nil = true;
            }
        }
        Ok(Self {
            name,
            children: Map::new(),
            text: String::new(),
            nil,
        })
    }

    fn into_value(self) -> (String, Value) {
        let value = if self.nil {
            Value::Null
        } else if !self.children.is_empty() {
            Value::Object(self.children)
        } else {
            Value::String(self.text)
        };
        (self.name, value)
    }
}

/// Parse an XML document into a prefix-free value tree.
pub fn parse_tree(xml: &str) -> Result<Value> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Frame::root()];

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Frame::open(&start)?),
            Event::Empty(start) => {
                let frame = Frame::open(&start)?;
                close(&mut stack, frame)?;
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| SoapError::Xml("unbalanced end tag".to_string()))?;
                close(&mut stack, frame)?;
            }
            Event::Text(text) => {
                let raw = utf8(&text)?;
                let unescaped = unescape(raw).map_err(|e| SoapError::Xml(e.to_string()))?;
                top(&mut stack)?.text.push_str(&unescaped);
            }
            Event::CData(data) => {
                let raw = utf8(&data)?.to_string();
                top(&mut stack)?.text.push_str(&raw);
            }
            Event::GeneralRef(reference) => {
                let resolved = resolve_reference(utf8(&reference)?)?;
                top(&mut stack)?.text.push(resolved);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(SoapError::Xml("unexpected end of document".to_string()));
    }
    let root = stack.pop().map(|frame| frame.children).unwrap_or_default();
    Ok(Value::Object(root))
}

fn close(stack: &mut [Frame], frame: Frame) -> Result<()> {
    let (name, value) = frame.into_value();
    let parent = top(stack)?;
    match parent.children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.children.insert(name, value);
        }
    }
    Ok(())
}

fn top(stack: &mut [Frame]) -> Result<&mut Frame> {
    stack
        .last_mut()
        .ok_or_else(|| SoapError::Xml("content outside of root element".to_string()))
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| SoapError::Xml(e.to_string()))
}

fn resolve_reference(name: &str) -> Result<char> {
    let resolved = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => match name.strip_prefix('#') {
            Some(hex) if hex.starts_with('x') || hex.starts_with('X') => {
                u32::from_str_radix(&hex[1..], 16).ok().and_then(char::from_u32)
            }
            Some(decimal) => decimal.parse::<u32>().ok().and_then(char::from_u32),
            None => None,
        },
    };
    resolved.ok_or_else(|| SoapError::Xml(format!("unknown entity reference &{name};")))
}
