//! Package and part access
//!
//! An `.xlsx` file is a ZIP package of XML parts tied together by
//! relationship files. This module locates parts (directly by name or through
//! a relationship id) and opens them as forward-only event streams.
//!
//! Parts are opened independently and read-only, so several streams over the
//! same file may be alive at once.

pub mod zip_reader;

use crate::error::{ExcelError, Result};
use crate::events::{EventSource, XmlEvent, XmlEventSource};
use std::io::{BufReader, Read};
use std::path::Path;

pub use zip_reader::{ZipEntry, ZipIndex};

const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";
const DEFAULT_SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";
const SHARED_STRINGS_REL: &str = "/sharedStrings";

/// Event stream over one package part
pub type PartEvents = XmlEventSource<BufReader<Box<dyn Read + Send>>>;

/// One entry of a `.rels` part, target resolved to a package path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

/// Read-only view of a spreadsheet package
#[derive(Debug, Clone)]
pub struct Package {
    zip: ZipIndex,
    buffer_capacity: usize,
}

impl Package {
    /// Open the package and index its entries
    pub fn open<P: AsRef<Path>>(path: P, buffer_capacity: usize) -> Result<Self> {
        let zip = ZipIndex::open(path.as_ref()).map_err(|e| match e {
            ExcelError::IoError(io) => ExcelError::IoError(io),
            other => ExcelError::ReadError(format!(
                "Failed to open package {}: {}",
                path.as_ref().display(),
                other
            )),
        })?;

        Ok(Package {
            zip,
            buffer_capacity,
        })
    }

    /// Whether a part exists
    pub fn has_part(&self, part: &str) -> bool {
        self.zip.find_entry(part).is_some()
    }

    /// Open a part by name as an event stream
    pub fn part_events(&self, part: &str) -> Result<PartEvents> {
        let reader = self.zip.open_entry_by_name(part)?;
        Ok(XmlEventSource::new(BufReader::with_capacity(
            self.buffer_capacity,
            reader,
        )))
    }

    /// Relationships declared by `owner` (an empty list when it has none)
    pub fn relationships(&self, owner: &str) -> Result<Vec<Relationship>> {
        let rels_part = rels_part_for(owner);
        if !self.has_part(&rels_part) {
            return Ok(Vec::new());
        }

        let base = parent_dir(owner);
        let mut events = self.part_events(&rels_part)?;
        let mut relationships = Vec::new();
        while let Some(event) = events.next_event()? {
            if let XmlEvent::Start(start) = event {
                if start.name != "Relationship" {
                    continue;
                }
                // external targets (hyperlinks) are not package parts
                if start.attribute("TargetMode") == Some("External") {
                    continue;
                }
                if let (Some(id), Some(target)) = (start.attribute("Id"), start.attribute("Target"))
                {
                    relationships.push(Relationship {
                        id: id.to_string(),
                        rel_type: start.attribute("Type").unwrap_or_default().to_string(),
                        target: resolve_target(base, target),
                    });
                }
            }
        }

        Ok(relationships)
    }

    /// Resolve a relationship id declared by `owner` to a part name
    pub fn part_by_relationship(&self, owner: &str, id: &str) -> Result<String> {
        self.relationships(owner)?
            .into_iter()
            .find(|rel| rel.id == id)
            .map(|rel| rel.target)
            .ok_or_else(|| {
                ExcelError::ReadError(format!(
                    "Relationship '{}' not declared by {}",
                    id, owner
                ))
            })
    }

    /// Name of the workbook part, as declared by the package root
    pub fn workbook_part(&self) -> Result<String> {
        let declared = self
            .relationships("")?
            .into_iter()
            .find(|rel| rel.rel_type.ends_with(OFFICE_DOCUMENT_REL))
            .map(|rel| rel.target);

        match declared {
            Some(part) => Ok(part),
            None if self.has_part(DEFAULT_WORKBOOK_PART) => Ok(DEFAULT_WORKBOOK_PART.to_string()),
            None => Err(ExcelError::ReadError(
                "Package has no workbook part".to_string(),
            )),
        }
    }

    /// Name of the shared-string part, if the workbook has one
    pub fn shared_strings_part(&self, workbook_part: &str) -> Result<Option<String>> {
        let declared = self
            .relationships(workbook_part)?
            .into_iter()
            .find(|rel| rel.rel_type.ends_with(SHARED_STRINGS_REL))
            .map(|rel| rel.target);

        Ok(declared
            .filter(|part| self.has_part(part))
            .or_else(|| {
                self.has_part(DEFAULT_SHARED_STRINGS_PART)
                    .then(|| DEFAULT_SHARED_STRINGS_PART.to_string())
            }))
    }
}

// "xl/workbook.xml" -> "xl/_rels/workbook.xml.rels", "" -> "_rels/.rels"
fn rels_part_for(owner: &str) -> String {
    match owner.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", owner),
    }
}

fn parent_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn resolve_target(base: &str, target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => normalize(absolute.split('/')),
        None => normalize(base.split('/').chain(target.split('/'))),
    }
}

fn normalize<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in segments {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}
