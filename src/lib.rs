//! # xlsxstream
//!
//! Streaming row reader for XLSX worksheets.
//!
//! Worksheet parts store only the rows and cells that hold data. This crate
//! walks the part once, front to back, and hands out dense rows: every line
//! from 1 up to the last stored row, each as wide as the declared sheet
//! dimension, with empty cells wherever the file stored nothing.
//!
//! ## Features
//!
//! - **Streaming Read**: one row in memory at a time, whatever the sheet size
//! - **Typed Values**: integers, floats, text and booleans as [`CellValue`]
//! - **CSV Export**: rows written as soon as they are rebuilt
//! - **Address Utilities**: `B7` / `A1:C3` to coordinates and back
//!
//! ## Quick Start
//!
//! ### Reading rows
//!
//! ```rust,no_run
//! use xlsxstream::XlsxStreamReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = XlsxStreamReader::open("data.xlsx", "Sheet1")?;
//!
//! for row_result in reader.rows()? {
//!     let row = row_result?;
//!     println!("Row {}: {:?}", row.index, row.to_strings());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Exporting to CSV
//!
//! ```rust,no_run
//! use xlsxstream::{write_csv, CsvOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // second sheet by position, semicolon separated
//! write_csv("data.xlsx", 2u32, "data.csv", &CsvOptions::new().separator(b';'))?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Addresses
//!
//! ```rust
//! use xlsxstream::address::{column_name, decode};
//!
//! let range = decode("$A$1:C3").unwrap();
//! assert_eq!(range.end.unwrap().column, 3);
//! assert_eq!(column_name(28).unwrap(), "AB");
//! ```

pub mod address;
pub mod csv_export;
pub mod error;
pub mod events;
pub mod options;
pub mod package;
pub mod reconstruct;
pub mod shared_strings;
pub mod sheet_index;
pub mod streaming_reader;
pub mod table;
pub mod types;

pub use address::{AddressError, AddressRange, Coordinate};
pub use csv_export::write_csv;
pub use error::{ExcelError, Result};
pub use events::{EventSource, XmlEvent, XmlEventSource};
pub use options::{CellTypePolicy, CsvOptions, LineTerminator, ReaderOptions};
pub use reconstruct::{
    CellDecoder, CellKind, GapCursor, RowReconstructor, SheetDimension, SheetRow, TextCells,
    TypedCells,
};
pub use shared_strings::SharedStrings;
pub use sheet_index::{SheetIndex, SheetRef, SheetSelector};
pub use streaming_reader::{RowIterator, XlsxStreamReader};
pub use table::{read_table, SheetTable};
pub use types::{CellValue, Row};
