//! SOAP response extraction.
//!
//! Two primitives over a streaming reader, no DOM:
//! - [`extract_tag`] pulls the text of the first element with a given name;
//! - [`parse_return_values`] turns a `RetrievePropertiesResponse` into
//!   [`ParsedObject`]s, one per `<returnval>`.
//!
//! Neither primitive fails. Missing elements yield empty strings or absent
//! properties, and malformed input stops the scan with whatever was already
//! collected.
//!
//! Each `<propSet>` contributes its `<name>` paired with the first `<val>`
//! only. Every property this crate requests is single-valued; a multi-valued
//! path would be silently truncated to its first value.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::warn;

/// One managed object from a property-collector result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedObject {
    /// Managed object type, e.g. `Datastore`.
    pub obj_type: String,
    /// Server-assigned managed object reference, e.g. `datastore-14`.
    pub mo_ref: String,
    /// Property path → string value.
    pub props: HashMap<String, String>,
}

impl ParsedObject {
    /// Property value, if the server returned one.
    pub fn prop(&self, path: &str) -> Option<&str> {
        self.props.get(path).map(String::as_str)
    }

    /// The `name` property, or an empty string.
    pub fn name(&self) -> &str {
        self.prop("name").unwrap_or_default()
    }
}

/// Text content of the first element whose local name is `tag`.
///
/// Returns an empty string when the element is absent or the input is not
/// well-formed before the element is reached.
pub fn extract_tag(xml: &str, tag: &str) -> String {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == tag.as_bytes() => {
                return read_text(&mut reader).unwrap_or_default();
            }
            Ok(Event::Eof) | Err(_) => return String::new(),
            Ok(_) => {}
        }
    }
}

/// Split a property-collector response into objects.
pub fn parse_return_values(xml: &str) -> Vec<ParsedObject> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut objects = Vec::new();
    let mut current: Option<ParsedObject> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    position = reader.buffer_position(),
                    error = %e,
                    "malformed property collector response"
                );
                break;
            }
        };

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"returnval" => current = Some(ParsedObject::default()),
                b"obj" if current.is_some() => {
                    let obj_type = attr(&e, "type");
                    let mo_ref = read_text(&mut reader).unwrap_or_default();
                    if let Some(obj) = current.as_mut() {
                        obj.obj_type = obj_type;
                        obj.mo_ref = mo_ref;
                    }
                }
                b"propSet" if current.is_some() => match read_prop_set(&mut reader) {
                    Ok(Some((name, val))) => {
                        if let Some(obj) = current.as_mut() {
                            obj.props.insert(name, val);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(error = %e, "malformed propSet, stopping");
                        break;
                    }
                },
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"returnval" => {
                if let Some(obj) = current.take() {
                    objects.push(obj);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    objects
}

/// Read the children of a `<propSet>` up to its end tag.
///
/// Returns `None` when either the name or any value is missing.
fn read_prop_set(reader: &mut Reader<&[u8]>) -> quick_xml::Result<Option<(String, String)>> {
    let mut name = None;
    let mut val = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"name" => name = Some(read_text(reader)?),
                b"val" if val.is_none() => val = Some(read_text(reader)?),
                _ => {
                    read_text(reader)?;
                }
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"name" if name.is_none() => name = Some(String::new()),
                b"val" if val.is_none() => val = Some(String::new()),
                _ => {}
            },
            Event::End(_) | Event::Eof => break,
            _ => {}
        }
    }

    Ok(name.zip(val))
}

/// Concatenated text of the current element, consuming up to its end tag.
fn read_text(reader: &mut Reader<&[u8]>) -> quick_xml::Result<String> {
    let mut depth = 0usize;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    return Ok(text);
                }
                depth -= 1;
            }
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
            Event::Eof => return Ok(text),
            _ => {}
        }
    }
}

fn attr(e: &BytesStart<'_>, key: &str) -> String {
    e.try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
        .unwrap_or_default()
}
