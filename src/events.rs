//! Forward-only markup event cursor
//!
//! The row engine never touches XML directly. It pulls owned [`XmlEvent`]s
//! from an [`EventSource`], which keeps it testable against a scripted event
//! list and independent of the XML and archive layers.

use crate::error::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::io::BufRead;

/// Start of an element: local name plus attributes in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementStart {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl ElementStart {
    /// Look up an attribute by local name (`r:id` is found as `id`)
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == local_name)
            .map(|(_, value)| value.as_str())
    }

    fn from_xml(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(ElementStart { name, attributes })
    }
}

/// One markup event, names reduced to their local part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    Start(ElementStart),
    End(String),
    Text(String),
}

impl XmlEvent {
    /// Build a start event
    pub fn start(name: &str, attributes: &[(&str, &str)]) -> Self {
        XmlEvent::Start(ElementStart {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    /// Build an end event
    pub fn end(name: &str) -> Self {
        XmlEvent::End(name.to_string())
    }

    /// Build a text event
    pub fn text(text: &str) -> Self {
        XmlEvent::Text(text.to_string())
    }
}

/// A forward-only cursor over markup events.
///
/// `Ok(None)` marks the end of the stream. Self-closing elements are reported
/// as a start immediately followed by an end.
pub trait EventSource {
    fn next_event(&mut self) -> Result<Option<XmlEvent>>;
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn next_event(&mut self) -> Result<Option<XmlEvent>> {
        (**self).next_event()
    }
}

/// Scripted events, used to drive the engine without a package
impl EventSource for std::vec::IntoIter<XmlEvent> {
    fn next_event(&mut self) -> Result<Option<XmlEvent>> {
        Ok(self.next())
    }
}

/// [`EventSource`] over any buffered XML byte stream
pub struct XmlEventSource<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> XmlEventSource<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.expand_empty_elements(true);
        XmlEventSource {
            reader,
            buf: Vec::with_capacity(1024),
        }
    }
}

impl<R: BufRead> EventSource for XmlEventSource<R> {
    fn next_event(&mut self) -> Result<Option<XmlEvent>> {
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => XmlEvent::Start(ElementStart::from_xml(&e)?),
                Event::End(e) => {
                    XmlEvent::End(String::from_utf8_lossy(e.local_name().as_ref()).into_owned())
                }
                Event::Text(e) => XmlEvent::Text(e.unescape()?.into_owned()),
                Event::CData(e) => {
                    XmlEvent::Text(String::from_utf8_lossy(&e.into_inner()).into_owned())
                }
                Event::Eof => return Ok(None),
                // declarations, comments, processing instructions
                _ => continue,
            };
            return Ok(Some(event));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(xml: &str) -> Vec<XmlEvent> {
        let mut source = XmlEventSource::new(xml.as_bytes());
        let mut events = Vec::new();
        while let Some(event) = source.next_event().unwrap() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_local_names_and_attributes() {
        let events = collect(
            r#"<?xml version="1.0"?><x:row xmlns:x="urn:x" x:r="3"><x:c r="A3" t="s"><x:v>0</x:v></x:c></x:row>"#,
        );
        match &events[0] {
            XmlEvent::Start(start) => {
                assert_eq!(start.name, "row");
                assert_eq!(start.attribute("r"), Some("3"));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(events[1], XmlEvent::start("c", &[("r", "A3"), ("t", "s")]));
        assert_eq!(events[2], XmlEvent::start("v", &[]));
        assert_eq!(events[3], XmlEvent::text("0"));
        assert_eq!(events[4], XmlEvent::end("v"));
        assert_eq!(events[6], XmlEvent::end("row"));
    }

    #[test]
    fn test_self_closing_expands_to_start_and_end() {
        let events = collect(r#"<sheetData><row r="1"/></sheetData>"#);
        assert_eq!(
            events,
            vec![
                XmlEvent::start("sheetData", &[]),
                XmlEvent::start("row", &[("r", "1")]),
                XmlEvent::end("row"),
                XmlEvent::end("sheetData"),
            ]
        );
    }

    #[test]
    fn test_text_is_unescaped() {
        let events = collect("<t>a &amp; b &lt;c&gt;</t>");
        assert_eq!(events[1], XmlEvent::text("a & b <c>"));
    }

    #[test]
    fn test_scripted_source() {
        let mut source = vec![XmlEvent::start("row", &[("r", "1")]), XmlEvent::end("row")].into_iter();
        assert!(matches!(source.next_event().unwrap(), Some(XmlEvent::Start(_))));
        assert!(matches!(source.next_event().unwrap(), Some(XmlEvent::End(_))));
        assert!(source.next_event().unwrap().is_none());
    }
}
