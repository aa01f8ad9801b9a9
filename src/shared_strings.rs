//! Shared strings table
//!
//! Cells of type `s` store an index into the workbook-wide string table. The
//! table has to be resident before any worksheet row can be decoded, so it
//! is loaded fully, once per reader.

use crate::error::{ExcelError, Result};
use crate::events::{EventSource, XmlEvent};
use std::borrow::Cow;

/// Ordered, 0-based list of decoded shared strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedStrings {
    strings: Vec<String>,
}

impl SharedStrings {
    /// Table for a workbook without a shared-string part
    pub fn empty() -> Self {
        SharedStrings::default()
    }

    /// Read every `<si>` entry of a shared-string part in document order.
    ///
    /// Rich-text entries are split into runs; their `<t>` texts are joined
    /// into the one entry. Phonetic hints (`<rPh>`) are not part of the value.
    /// Entries are kept as-is, duplicates included.
    pub fn load<S: EventSource + ?Sized>(events: &mut S, decode_escapes: bool) -> Result<Self> {
        let mut strings = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut phonetic_depth = 0u32;

        while let Some(event) = events.next_event()? {
            match event {
                XmlEvent::Start(start) => match start.name.as_str() {
                    "si" => {
                        in_si = true;
                        current.clear();
                    }
                    "rPh" => phonetic_depth += 1,
                    "t" if in_si && phonetic_depth == 0 => in_t = true,
                    _ => {}
                },
                XmlEvent::End(name) => match name.as_str() {
                    "si" => {
                        let entry = if decode_escapes {
                            decode_excel_escapes(&current).into_owned()
                        } else {
                            current.clone()
                        };
                        strings.push(entry);
                        current.clear();
                        in_si = false;
                    }
                    "rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    "t" => in_t = false,
                    _ => {}
                },
                XmlEvent::Text(text) if in_t => current.push_str(&text),
                XmlEvent::Text(_) => {}
            }
        }

        Ok(SharedStrings { strings })
    }

    /// Entry at `index`; a reference past the end means the file is corrupt
    pub fn get(&self, index: usize) -> Result<&str> {
        self.strings
            .get(index)
            .map(String::as_str)
            .ok_or(ExcelError::SharedStringOutOfRange {
                index,
                count: self.strings.len(),
            })
    }

    /// Get number of strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }

    /// Rough heap footprint in bytes
    pub fn estimated_size(&self) -> usize {
        self.strings.iter().map(|s| s.len() + 24).sum() // 24 bytes per String overhead
    }
}

/// Decode Excel's `_xHHHH_` escapes (`_x000d_` is a carriage return).
///
/// Malformed sequences are kept verbatim.
pub(crate) fn decode_excel_escapes(text: &str) -> Cow<'_, str> {
    if !text.contains("_x") {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &candidate[7..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::XmlEventSource;

    fn load(xml: &str) -> SharedStrings {
        SharedStrings::load(&mut XmlEventSource::new(xml.as_bytes()), true).unwrap()
    }

    #[test]
    fn test_plain_entries_in_order() {
        let sst = load(
            r#"<sst count="3" uniqueCount="3"><si><t>Name</t></si><si><t>Age</t></si><si><t>Name</t></si></sst>"#,
        );
        assert_eq!(sst.len(), 3);
        assert_eq!(sst.get(0).unwrap(), "Name");
        assert_eq!(sst.get(1).unwrap(), "Age");
        assert_eq!(sst.get(2).unwrap(), "Name");
    }

    #[test]
    fn test_rich_text_runs_are_joined() {
        let sst = load(
            r#"<sst><si><r><rPr><b/></rPr><t>Bold</t></r><r><t xml:space="preserve"> tail</t></r></si><si><t>next</t></si></sst>"#,
        );
        assert_eq!(sst.iter().collect::<Vec<_>>(), vec!["Bold tail", "next"]);
    }

    #[test]
    fn test_phonetic_runs_are_skipped() {
        let sst = load(r#"<sst><si><t>東京</t><rPh sb="0" eb="2"><t>トウキョウ</t></rPh></si></sst>"#);
        assert_eq!(sst.get(0).unwrap(), "東京");
    }

    #[test]
    fn test_empty_entry_keeps_position() {
        let sst = load("<sst><si><t/></si><si><t>b</t></si></sst>");
        assert_eq!(sst.get(0).unwrap(), "");
        assert_eq!(sst.get(1).unwrap(), "b");
    }

    #[test]
    fn test_out_of_range_index() {
        let sst = load("<sst><si><t>only</t></si></sst>");
        assert!(matches!(
            sst.get(1),
            Err(ExcelError::SharedStringOutOfRange { index: 1, count: 1 })
        ));
        assert!(SharedStrings::empty().get(0).is_err());
    }

    #[test]
    fn test_decode_excel_escapes() {
        assert_eq!(decode_excel_escapes("plain text"), "plain text");
        assert_eq!(decode_excel_escapes("line1_x000d__x000a_line2"), "line1\r\nline2");
        assert_eq!(decode_excel_escapes("col1_x0009_col2"), "col1\tcol2");
        assert_eq!(decode_excel_escapes("under_x005F_score"), "under_score");
        assert_eq!(decode_excel_escapes("_x00"), "_x00");
        assert_eq!(decode_excel_escapes("_x000d"), "_x000d");
        assert_eq!(decode_excel_escapes("_xZZZZ_"), "_xZZZZ_");
    }

    #[test]
    fn test_escapes_left_alone_when_disabled() {
        let xml = "<sst><si><t>a_x0009_b</t></si></sst>";
        let sst = SharedStrings::load(&mut XmlEventSource::new(xml.as_bytes()), false).unwrap();
        assert_eq!(sst.get(0).unwrap(), "a_x0009_b");
    }
}
