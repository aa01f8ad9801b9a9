//! In-memory table of a whole sheet
//!
//! Unlike [`XlsxStreamReader::rows`], building a [`SheetTable`] keeps every
//! row. Memory grows with the size of the sheet, so prefer the row iterator
//! for large files.

use crate::address;
use crate::error::Result;
use crate::sheet_index::SheetSelector;
use crate::streaming_reader::XlsxStreamReader;
use crate::types::{CellValue, Row};
use log::debug;
use std::path::Path;

/// All rows of a sheet with generated column labels `A, B, …, AA, …`
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SheetTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl SheetTable {
    /// Column labels, one per column of the sheet dimension
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of a column label such as `"C"`
    pub fn column_position(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(label))
    }

    /// Cell by 0-based row and column label
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_position(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

impl XlsxStreamReader {
    /// Read the whole sheet into a [`SheetTable`]
    ///
    /// **Memory:** O(sheet size). Every row is held until the table is
    /// dropped.
    pub fn to_table(&self) -> Result<SheetTable> {
        let mut rows = self.rows()?;
        let dimension = rows.dimension()?;

        let columns = (1..=dimension.last_column)
            .map(address::column_name)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let rows = rows.collect::<Result<Vec<_>>>()?;

        debug!(
            "Built table of {} rows x {} columns",
            rows.len(),
            columns.len()
        );
        Ok(SheetTable { columns, rows })
    }
}

/// Open `xlsx`, select a sheet and read it into memory
pub fn read_table<P: AsRef<Path>, S: Into<SheetSelector>>(xlsx: P, sheet: S) -> Result<SheetTable> {
    XlsxStreamReader::open(xlsx, sheet)?.to_table()
}
