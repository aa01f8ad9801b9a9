//! Streaming reader for one worksheet of an XLSX file
//!
//! Rows are rebuilt from the worksheet part while it is being decompressed,
//! one at a time, so memory does not grow with the number of rows.
//!
//! **Memory Usage:**
//! - Shared Strings Table (SST): loaded fully when the reader is opened
//! - Worksheet XML: streamed from the package, never held as a whole
//! - One row buffer, as wide as the sheet dimension
//!
//! **Trade-offs:**
//! - Sequential read only (can't jump to random rows)
//! - No styles or number formats: dates come out as their serial numbers

use crate::error::{ExcelError, Result};
use crate::options::ReaderOptions;
use crate::package::{Package, PartEvents};
use crate::reconstruct::{CellDecoder, RowReconstructor, SheetDimension, TypedCells};
use crate::shared_strings::SharedStrings;
use crate::sheet_index::{SheetIndex, SheetRef, SheetSelector};
use crate::types::Row;
use log::debug;
use std::path::Path;

/// Streaming reader bound to one worksheet
///
/// Opening resolves the sheet and loads the shared strings; the package index
/// is rebuilt on every open and nothing is cached between readers. Each call
/// to [`rows`](Self::rows) opens its own stream over the worksheet part, so a
/// reader can be iterated any number of times.
///
/// # Example
///
/// ```no_run
/// use xlsxstream::XlsxStreamReader;
///
/// let reader = XlsxStreamReader::open_by_name("large.xlsx", "Sheet1")?;
/// for row in reader.rows()? {
///     let row = row?;
///     println!("Row {}: {:?}", row.index, row.to_strings());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct XlsxStreamReader {
    package: Package,
    options: ReaderOptions,
    shared_strings: SharedStrings,
    sheets: SheetIndex,
    sheet: SheetRef,
    worksheet_part: String,
}

impl XlsxStreamReader {
    /// Open a sheet selected by name or 1-based position, default options
    pub fn open<P: AsRef<Path>, S: Into<SheetSelector>>(path: P, sheet: S) -> Result<Self> {
        Self::open_with_options(path, sheet, ReaderOptions::default())
    }

    /// Open the sheet called `name`
    pub fn open_by_name<P: AsRef<Path>>(path: P, name: &str) -> Result<Self> {
        Self::open(path, SheetSelector::Name(name.to_string()))
    }

    /// Open the sheet whose declared position (`sheetId`) is `position`
    pub fn open_by_position<P: AsRef<Path>>(path: P, position: u32) -> Result<Self> {
        Self::open(path, SheetSelector::Position(position))
    }

    /// Open a sheet with explicit options
    ///
    /// Fails with [`ExcelError::SheetNotFound`] when the workbook declares no
    /// such sheet, and with `IoError`/`ReadError` when the file is missing
    /// or not a spreadsheet package.
    pub fn open_with_options<P: AsRef<Path>, S: Into<SheetSelector>>(
        path: P,
        sheet: S,
        options: ReaderOptions,
    ) -> Result<Self> {
        let selector = sheet.into();
        let package = Package::open(path, options.buffer_capacity)?;
        let workbook_part = package.workbook_part()?;

        let sheets = SheetIndex::resolve(&mut package.part_events(&workbook_part)?)?;
        debug!("Found {} sheets: {:?}", sheets.sheets().len(), sheets.names());

        let sheet = sheets.find(&selector)?.clone();
        let worksheet_part =
            package.part_by_relationship(&workbook_part, &sheet.relationship_id)?;
        if !package.has_part(&worksheet_part) {
            return Err(ExcelError::ReadError(format!(
                "Worksheet part {} of sheet '{}' is missing",
                worksheet_part, sheet.name
            )));
        }

        let shared_strings = match package.shared_strings_part(&workbook_part)? {
            Some(part) => SharedStrings::load(
                &mut package.part_events(&part)?,
                options.decode_escapes,
            )?,
            None => SharedStrings::empty(),
        };
        debug!(
            "Loaded {} shared strings (~{:.2} MB in memory)",
            shared_strings.len(),
            shared_strings.estimated_size() as f64 / (1024.0 * 1024.0)
        );

        Ok(XlsxStreamReader {
            package,
            options,
            shared_strings,
            sheets,
            sheet,
            worksheet_part,
        })
    }

    /// The sheet this reader is bound to
    pub fn sheet(&self) -> &SheetRef {
        &self.sheet
    }

    /// Every sheet declared by the workbook
    pub fn sheets(&self) -> &[SheetRef] {
        self.sheets.sheets()
    }

    /// Get list of sheet names
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.names().into_iter().map(String::from).collect()
    }

    pub fn shared_strings(&self) -> &SharedStrings {
        &self.shared_strings
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Stream dense, typed rows of the sheet
    ///
    /// Every row holds one [`CellValue`](crate::types::CellValue) per column of the sheet dimension.
    /// Dropping the iterator closes the worksheet stream and its file handle.
    pub fn rows(&self) -> Result<RowIterator<'_>> {
        Ok(RowIterator {
            inner: self.engine(TypedCells {
                decode_escapes: self.options.decode_escapes,
            })?,
        })
    }

    /// Row engine over a fresh worksheet stream
    pub(crate) fn engine<D: CellDecoder>(
        &self,
        decoder: D,
    ) -> Result<RowReconstructor<'_, PartEvents, D>> {
        let events = self.package.part_events(&self.worksheet_part)?;
        Ok(RowReconstructor::new(
            events,
            decoder,
            &self.shared_strings,
            self.options.cell_type_policy,
        ))
    }
}

/// Lazy sequence of [`Row`]s
///
/// Rows come out in sheet order starting at line 1, with omitted lines as
/// all-empty rows. The sequence ends after the last row stored in the file.
pub struct RowIterator<'a> {
    inner: RowReconstructor<'a, PartEvents, TypedCells>,
}

impl<'a> RowIterator<'a> {
    /// Declared dimension of the sheet, read before the first row
    pub fn dimension(&mut self) -> Result<SheetDimension> {
        self.inner.dimension()
    }
}

impl<'a> Iterator for RowIterator<'a> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next_row()
            .map(|row| row.map(|r| Row::new(r.line - 1, r.cells)))
    }
}
