//! Sparse-to-dense row reconstruction
//!
//! Worksheet parts only store rows and cells that hold something, addressed
//! by A1-style references. [`RowReconstructor`] walks the part's events once,
//! front to back, and produces every row from line 1 up to the last stored
//! row, each exactly as wide as the declared sheet dimension. Lines the file
//! skipped come out as all-empty rows. Nothing past the last stored row is
//! synthesized, even if the dimension declares more lines.
//!
//! How a decoded cell is represented is left to a [`CellDecoder`]: typed
//! [`CellValue`]s for the row iterator and table builder, source text for the
//! CSV export. Everything else is shared.

use crate::address::{self, AddressRange, Coordinate};
use crate::error::{ExcelError, Result};
use crate::events::{ElementStart, EventSource, XmlEvent};
use crate::options::CellTypePolicy;
use crate::shared_strings::{decode_excel_escapes, SharedStrings};
use crate::types::CellValue;
use log::{debug, trace, warn};

const DIMENSION: &str = "dimension";
const ROW: &str = "row";
const CELL: &str = "c";
const VALUE: &str = "v";

/// Declared bounding range of a worksheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SheetDimension {
    pub first_row: u32,
    pub first_column: u32,
    pub last_row: u32,
    /// Width of every reconstructed row
    pub last_column: u32,
}

impl From<AddressRange> for SheetDimension {
    fn from(range: AddressRange) -> Self {
        let last = range.last();
        SheetDimension {
            first_row: range.start.row,
            first_column: range.start.column,
            last_row: last.row,
            last_column: last.column,
        }
    }
}

/// Monotonic cursor over 1-based positions (lines or columns).
///
/// It remembers the next position it expects; any position reported later
/// than that leaves a gap that can be drained one position at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapCursor {
    next: u32,
}

impl GapCursor {
    pub fn new(start: u32) -> Self {
        GapCursor { next: start }
    }

    /// Position expected next
    pub fn next_expected(&self) -> u32 {
        self.next
    }

    /// Next skipped position before `target`, advancing past it
    pub fn next_gap(&mut self, target: u32) -> Option<u32> {
        if self.next < target {
            let gap = self.next;
            self.next += 1;
            Some(gap)
        } else {
            None
        }
    }

    /// Record `position` as present
    pub fn seen(&mut self, position: u32) {
        self.next = position.saturating_add(1);
    }
}

/// Value encoding of a cell, from its `t` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// absent or `n`
    Number,
    /// `s`
    SharedString,
    /// `str`
    InlineString,
    /// `b`
    Boolean,
}

impl CellKind {
    /// `None` for codes this reader does not decode
    pub fn from_code(code: Option<&str>) -> Option<Self> {
        match code {
            None | Some("n") => Some(CellKind::Number),
            Some("s") => Some(CellKind::SharedString),
            Some("str") => Some(CellKind::InlineString),
            Some("b") => Some(CellKind::Boolean),
            Some(_) => None,
        }
    }
}

/// Turns a cell's value text into the representation a sink wants
pub trait CellDecoder {
    type Value: Clone + Default;

    fn decode(
        &self,
        kind: CellKind,
        text: &str,
        shared: &SharedStrings,
        address: &str,
    ) -> Result<Self::Value>;
}

/// Typed cells: integers stay integers, booleans are `Bool`
#[derive(Debug, Clone, Copy)]
pub struct TypedCells {
    pub decode_escapes: bool,
}

impl CellDecoder for TypedCells {
    type Value = CellValue;

    fn decode(
        &self,
        kind: CellKind,
        text: &str,
        shared: &SharedStrings,
        address: &str,
    ) -> Result<CellValue> {
        Ok(match kind {
            CellKind::Number => parse_number(text).ok_or_else(|| invalid_value(address, text))?,
            CellKind::SharedString => {
                CellValue::String(shared_string(text, shared, address)?.to_string())
            }
            CellKind::InlineString => CellValue::String(self.text(text)),
            CellKind::Boolean => CellValue::Bool(text == "1"),
        })
    }
}

impl TypedCells {
    fn text(&self, text: &str) -> String {
        if self.decode_escapes {
            decode_excel_escapes(text).into_owned()
        } else {
            text.to_string()
        }
    }
}

/// Stringified cells: numbers keep their source text, booleans become
/// `true`/`false`
#[derive(Debug, Clone, Copy)]
pub struct TextCells {
    pub decode_escapes: bool,
}

impl CellDecoder for TextCells {
    type Value = String;

    fn decode(
        &self,
        kind: CellKind,
        text: &str,
        shared: &SharedStrings,
        address: &str,
    ) -> Result<String> {
        Ok(match kind {
            CellKind::Number => text.to_string(),
            CellKind::SharedString => shared_string(text, shared, address)?.to_string(),
            CellKind::InlineString if self.decode_escapes => {
                decode_excel_escapes(text).into_owned()
            }
            CellKind::InlineString => text.to_string(),
            CellKind::Boolean => (if text == "1" { "true" } else { "false" }).to_string(),
        })
    }
}

/// Integer first, then a locale-invariant float: `"42"` is `Int(42)`,
/// `"42.0"` is `Float(42.0)`.
pub fn parse_number(text: &str) -> Option<CellValue> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(CellValue::Int(i));
    }
    text.parse::<f64>().ok().map(CellValue::Float)
}

fn shared_string<'s>(text: &str, shared: &'s SharedStrings, address: &str) -> Result<&'s str> {
    let index = text
        .trim()
        .parse::<usize>()
        .map_err(|_| invalid_value(address, text))?;
    shared.get(index)
}

fn invalid_value(address: &str, text: &str) -> ExcelError {
    ExcelError::InvalidCellValue {
        address: address.to_string(),
        value: text.to_string(),
    }
}

/// One reconstructed row
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow<V> {
    /// 1-based line number in the sheet
    pub line: u32,
    pub cells: Vec<V>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingDimension,
    AwaitingRow,
    Done,
}

/// Pull-based engine turning worksheet events into dense rows.
///
/// Each call to `next` blocks until one full row is available; a row is never
/// handed out half decoded. After the first error the engine is finished.
pub struct RowReconstructor<'a, S, D: CellDecoder> {
    source: S,
    decoder: D,
    shared: &'a SharedStrings,
    policy: CellTypePolicy,
    state: State,
    dimension: Option<SheetDimension>,
    lines: GapCursor,
    // line of a row start already read, waiting for the gap before it to drain
    held_line: Option<u32>,
}

impl<'a, S: EventSource, D: CellDecoder> RowReconstructor<'a, S, D> {
    pub fn new(source: S, decoder: D, shared: &'a SharedStrings, policy: CellTypePolicy) -> Self {
        RowReconstructor {
            source,
            decoder,
            shared,
            policy,
            state: State::AwaitingDimension,
            dimension: None,
            lines: GapCursor::new(1),
            held_line: None,
        }
    }

    /// Read the dimension marker if that has not happened yet
    pub fn dimension(&mut self) -> Result<SheetDimension> {
        if self.state == State::AwaitingDimension {
            if let Err(e) = self.read_dimension() {
                self.state = State::Done;
                return Err(e);
            }
        }
        self.dimension.ok_or_else(|| {
            ExcelError::MalformedWorksheet("worksheet declares no dimension".to_string())
        })
    }

    /// Produce the next row, `None` once the last stored row was emitted
    pub fn next_row(&mut self) -> Option<Result<SheetRow<D::Value>>> {
        if self.state == State::Done {
            return None;
        }
        match self.step() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.state = State::Done;
                None
            }
            Err(e) => {
                self.state = State::Done;
                Some(Err(e))
            }
        }
    }

    fn read_dimension(&mut self) -> Result<()> {
        while let Some(event) = self.source.next_event()? {
            if let XmlEvent::Start(start) = event {
                if start.name == ROW {
                    return Err(ExcelError::MalformedWorksheet(
                        "row before dimension".to_string(),
                    ));
                }
                if start.name != DIMENSION {
                    continue;
                }
                let reference = start.attribute("ref").ok_or_else(|| {
                    ExcelError::MalformedWorksheet("dimension without ref".to_string())
                })?;
                let dimension = SheetDimension::from(address::decode(reference)?);
                debug!(
                    "Sheet dimension {}: {} rows x {} columns",
                    reference, dimension.last_row, dimension.last_column
                );
                self.dimension = Some(dimension);
                self.state = State::AwaitingRow;
                return Ok(());
            }
        }
        Err(ExcelError::MalformedWorksheet(
            "worksheet declares no dimension".to_string(),
        ))
    }

    fn step(&mut self) -> Result<Option<SheetRow<D::Value>>> {
        let width = self.dimension()?.last_column as usize;

        loop {
            if let Some(line) = self.held_line {
                if let Some(gap) = self.lines.next_gap(line) {
                    trace!("Filling omitted row {}", gap);
                    return Ok(Some(SheetRow {
                        line: gap,
                        cells: vec![D::Value::default(); width],
                    }));
                }
                self.held_line = None;
                self.lines.seen(line);
                return self.read_row(line, width).map(Some);
            }

            match self.source.next_event()? {
                None => return Ok(None),
                Some(XmlEvent::Start(start)) if start.name == ROW => {
                    let line = self.row_line(&start)?;
                    self.held_line = Some(line);
                }
                Some(_) => {}
            }
        }
    }

    fn row_line(&self, start: &ElementStart) -> Result<u32> {
        let expected = self.lines.next_expected();
        let line = match start.attribute("r") {
            None => expected,
            Some(r) => r.trim().parse::<u32>().ok().filter(|&l| l >= 1).ok_or_else(|| {
                ExcelError::MalformedWorksheet(format!("invalid row number '{}'", r))
            })?,
        };
        if line < expected {
            return Err(ExcelError::MalformedWorksheet(format!(
                "row {} appears after row {}",
                line,
                expected - 1
            )));
        }
        Ok(line)
    }

    // Cells until the row closes
    fn read_row(&mut self, line: u32, width: usize) -> Result<SheetRow<D::Value>> {
        let mut cells = vec![D::Value::default(); width];
        let mut columns = GapCursor::new(1);

        loop {
            match self.source.next_event()? {
                None => {
                    return Err(ExcelError::MalformedWorksheet(format!(
                        "row {} is not closed",
                        line
                    )))
                }
                Some(XmlEvent::End(name)) if name == ROW => {
                    return Ok(SheetRow { line, cells });
                }
                Some(XmlEvent::Start(start)) if start.name == CELL => {
                    self.read_cell(&start, line, &mut columns, &mut cells)?;
                }
                Some(_) => {}
            }
        }
    }

    fn read_cell(
        &mut self,
        start: &ElementStart,
        line: u32,
        columns: &mut GapCursor,
        cells: &mut [D::Value],
    ) -> Result<()> {
        // the row part of the reference is ignored, the enclosing row decides
        let column = match start.attribute("r") {
            Some(r) => address::decode(r)?.start.column,
            None => columns.next_expected(),
        };
        columns.seen(column);

        let reference = match start.attribute("r") {
            Some(r) => r.to_string(),
            None => address::encode(Coordinate::new(line, column))?,
        };

        if column as usize > cells.len() {
            return Err(ExcelError::ColumnOutOfDeclaredRange {
                row: line,
                column,
                last_column: cells.len() as u32,
            });
        }

        let code = start.attribute("t");
        let kind = match CellKind::from_code(code) {
            Some(kind) => Some(kind),
            None => {
                let code = code.unwrap_or_default().to_string();
                match self.policy {
                    CellTypePolicy::Strict => {
                        return Err(ExcelError::UnknownCellType {
                            cell_type: code,
                            address: reference,
                        })
                    }
                    CellTypePolicy::Lenient => {
                        warn!("Leaving cell {} empty: unknown type '{}'", reference, code);
                        None
                    }
                }
            }
        };

        let text = self.cell_value_text(line)?;
        if let (Some(kind), Some(text)) = (kind, text) {
            if !text.is_empty() {
                cells[column as usize - 1] =
                    self.decoder.decode(kind, &text, self.shared, &reference)?;
            }
        }
        Ok(())
    }

    // Text of the cell's value node, consuming events up to the cell's end
    fn cell_value_text(&mut self, line: u32) -> Result<Option<String>> {
        let mut value: Option<String> = None;
        let mut in_value = false;

        loop {
            match self.source.next_event()? {
                None => {
                    return Err(ExcelError::MalformedWorksheet(format!(
                        "cell in row {} is not closed",
                        line
                    )))
                }
                Some(XmlEvent::Start(start)) if start.name == VALUE => {
                    in_value = true;
                    value.get_or_insert_with(String::new);
                }
                Some(XmlEvent::End(name)) if name == VALUE => in_value = false,
                Some(XmlEvent::End(name)) if name == CELL => return Ok(value),
                Some(XmlEvent::Text(text)) if in_value => {
                    if let Some(v) = value.as_mut() {
                        v.push_str(&text);
                    }
                }
                Some(_) => {}
            }
        }
    }
}

impl<'a, S: EventSource, D: CellDecoder> Iterator for RowReconstructor<'a, S, D> {
    type Item = Result<SheetRow<D::Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row()
    }
}
