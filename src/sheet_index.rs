//! Sheet lookup by name or position
//!
//! The workbook part declares every sheet with its name, its `sheetId`
//! position and the relationship id of its worksheet part.

use crate::error::{ExcelError, Result};
use crate::events::{EventSource, XmlEvent};
use std::fmt;

/// A declared worksheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRef {
    /// Relationship id of the worksheet part (`r:id`)
    pub relationship_id: String,
    /// Sheet tab name
    pub name: String,
    /// Declared 1-based position (`sheetId`), which may differ from
    /// declaration order once sheets have been reordered
    pub position: u32,
}

/// How a caller picks a sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    Name(String),
    /// 1-based `sheetId`
    Position(u32),
}

impl From<&str> for SheetSelector {
    fn from(name: &str) -> Self {
        SheetSelector::Name(name.to_string())
    }
}

impl From<String> for SheetSelector {
    fn from(name: String) -> Self {
        SheetSelector::Name(name)
    }
}

impl From<u32> for SheetSelector {
    fn from(position: u32) -> Self {
        SheetSelector::Position(position)
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Name(name) => write!(f, "{}", name),
            SheetSelector::Position(position) => write!(f, "position {}", position),
        }
    }
}

/// Declared sheets of one workbook, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetIndex {
    sheets: Vec<SheetRef>,
}

impl SheetIndex {
    /// Collect the `<sheet>` declarations of a workbook part
    pub fn resolve<S: EventSource + ?Sized>(events: &mut S) -> Result<Self> {
        let mut sheets = Vec::new();
        let mut in_sheets = false;

        while let Some(event) = events.next_event()? {
            match event {
                XmlEvent::Start(start) if start.name == "sheets" => in_sheets = true,
                XmlEvent::End(name) if name == "sheets" => in_sheets = false,
                XmlEvent::Start(start) if in_sheets && start.name == "sheet" => {
                    let name = start.attribute("name").unwrap_or_default().to_string();
                    let relationship_id = start
                        .attribute("id")
                        .ok_or_else(|| {
                            ExcelError::ReadError(format!(
                                "Sheet '{}' has no relationship id",
                                name
                            ))
                        })?
                        .to_string();
                    let position = start
                        .attribute("sheetId")
                        .and_then(|id| id.trim().parse::<u32>().ok())
                        .ok_or_else(|| {
                            ExcelError::ReadError(format!("Sheet '{}' has no valid sheetId", name))
                        })?;

                    sheets.push(SheetRef {
                        relationship_id,
                        name,
                        position,
                    });
                }
                _ => {}
            }
        }

        Ok(SheetIndex { sheets })
    }

    /// First sheet with this name
    pub fn find_by_name(&self, name: &str) -> Option<&SheetRef> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// First sheet with this declared position
    pub fn find_by_position(&self, position: u32) -> Option<&SheetRef> {
        self.sheets.iter().find(|s| s.position == position)
    }

    /// Look up a sheet, failing with [`ExcelError::SheetNotFound`]
    pub fn find(&self, selector: &SheetSelector) -> Result<&SheetRef> {
        let found = match selector {
            SheetSelector::Name(name) => self.find_by_name(name),
            SheetSelector::Position(position) => self.find_by_position(*position),
        };

        found.ok_or_else(|| ExcelError::SheetNotFound {
            sheet: selector.to_string(),
            available: self.names().join(", "),
        })
    }

    /// All declared sheets
    pub fn sheets(&self) -> &[SheetRef] {
        &self.sheets
    }

    /// Sheet names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::XmlEventSource;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Summary" sheetId="3" r:id="rId1"/>
    <sheet name="Data &amp; Notes" sheetId="1" r:id="rId2"/>
    <sheet name="Archive" sheetId="2" r:id="rId3"/>
  </sheets>
</workbook>"#;

    fn index() -> SheetIndex {
        SheetIndex::resolve(&mut XmlEventSource::new(WORKBOOK.as_bytes())).unwrap()
    }

    #[test]
    fn test_declaration_order_and_positions() {
        let index = index();
        assert_eq!(index.names(), vec!["Summary", "Data & Notes", "Archive"]);
        assert_eq!(
            index.sheets()[0],
            SheetRef {
                relationship_id: "rId1".to_string(),
                name: "Summary".to_string(),
                position: 3,
            }
        );
    }

    #[test]
    fn test_find_by_position_uses_sheet_id() {
        let index = index();
        assert_eq!(index.find_by_position(1).unwrap().name, "Data & Notes");
        assert_eq!(index.find_by_position(3).unwrap().relationship_id, "rId1");
        assert!(index.find_by_position(4).is_none());
    }

    #[test]
    fn test_find_by_name() {
        let index = index();
        assert_eq!(index.find_by_name("Archive").unwrap().relationship_id, "rId3");
        assert!(index.find_by_name("archive").is_none());
    }

    #[test]
    fn test_sheet_not_found_carries_request() {
        let index = index();
        match index.find(&SheetSelector::from("Missing")) {
            Err(ExcelError::SheetNotFound { sheet, available }) => {
                assert_eq!(sheet, "Missing");
                assert_eq!(available, "Summary, Data & Notes, Archive");
            }
            other => panic!("unexpected {:?}", other),
        }
        match index.find(&SheetSelector::from(9u32)) {
            Err(ExcelError::SheetNotFound { sheet, .. }) => assert_eq!(sheet, "position 9"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
