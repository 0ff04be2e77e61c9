//! Generic XML-to-tree decoding.
//!
//! Converts an XML document into a [`serde_json::Value`] tree without forcing
//! single children into arrays:
//!
//! - an element with neither attributes nor child elements becomes its text
//! - otherwise it becomes an object with attributes under `"$"`, non-blank
//!   text under `"_"` and children keyed by qualified name
//! - a child name seen more than once becomes an array in document order
//!
//! Consumers decide per field whether a value is "one or many".

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use thiserror::Error;

/// Key holding an element's attributes.
pub const ATTR_KEY: &str = "$";
/// Key holding an element's text when it also has attributes or children.
pub const TEXT_KEY: &str = "_";

/// SEC-003: Maximum element nesting depth accepted from a remote document.
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum TreeError {
    /// SEC-003: Document nesting exceeds the safety limit.
    #[error("XML nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("XML document has no root element")]
    Empty,
}

/// Element under construction.
struct Frame {
    name: String,
    attrs: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Self, TreeError> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attrs = Map::new();

        for attr_result in e.attributes() {
            let attr = match attr_result {
                Ok(attr) => attr,
                Err(e) => {
                    tracing::warn!(element = %name, error = %e, "Skipping malformed XML attribute");
                    continue;
                }
            };
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .decode_and_unescape_value(reader.decoder())
                .map_err(|e| TreeError::Xml(e.to_string()))?;
            attrs.insert(key, Value::String(value.into_owned()));
        }

        Ok(Self {
            name,
            attrs,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn close(self) -> (String, Value) {
        if self.attrs.is_empty() && self.children.is_empty() {
            return (self.name, Value::String(self.text));
        }

        let mut object = self.children;
        if !self.text.trim().is_empty() {
            object.insert(TEXT_KEY.to_string(), Value::String(self.text));
        }
        if !self.attrs.is_empty() {
            object.insert(ATTR_KEY.to_string(), Value::Object(self.attrs));
        }
        (self.name, Value::Object(object))
    }
}

/// Inserts a child, promoting the slot to an array when the name repeats.
fn insert_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        None => {
            children.insert(name, value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

/// Parses an XML document into a generic tree rooted at `{ <root name>: ... }`.
///
/// # Errors
///
/// - [`TreeError::Xml`] for malformed XML or undecodable text
/// - [`TreeError::MaxDepthExceeded`] for documents nested deeper than 64 levels
/// - [`TreeError::Empty`] when no root element is present
///
/// # Security
///
/// SEC-002: `quick-xml` 0.37 never expands `<!ENTITY>` declarations; only the
/// five predefined entities are resolved.
pub fn parse_tree(xml: &str) -> Result<Value, TreeError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if stack.len() >= MAX_TREE_DEPTH {
                    return Err(TreeError::MaxDepthExceeded(MAX_TREE_DEPTH));
                }
                stack.push(Frame::open(&e, &reader)?);
            }
            Ok(Event::Empty(e)) => {
                let frame = Frame::open(&e, &reader)?;
                let (name, value) = frame.close();
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.children, name, value),
                    None if root.is_none() => root = Some((name, value)),
                    None => {}
                }
            }
            Ok(Event::End(_)) => {
                let Some(frame) = stack.pop() else {
                    return Err(TreeError::Xml("unexpected closing tag".to_string()));
                };
                let (name, value) = frame.close();
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.children, name, value),
                    None if root.is_none() => root = Some((name, value)),
                    None => {}
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(frame) = stack.last_mut() {
                    let text = e.unescape().map_err(|e| TreeError::Xml(e.to_string()))?;
                    frame.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TreeError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(TreeError::Xml("unexpected end of document".to_string()));
    }

    let (name, value) = root.ok_or(TreeError::Empty)?;
    let mut document = Map::new();
    document.insert(name, value);
    Ok(Value::Object(document))
}
