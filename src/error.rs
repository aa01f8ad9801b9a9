//! Error types for the xlsxstream library

use thiserror::Error;

use crate::address::AddressError;

/// Result type alias for xlsxstream operations
pub type Result<T> = std::result::Result<T, ExcelError>;

/// Main error type for all reading and export operations
#[derive(Error, Debug)]
pub enum ExcelError {
    /// The package could not be read (missing part, bad ZIP structure, ...)
    #[error("Failed to read Excel file: {0}")]
    ReadError(String),

    /// Requested sheet name or position is not declared in the workbook
    #[error("Sheet '{sheet}' not found. Available sheets: {available}")]
    SheetNotFound { sheet: String, available: String },

    /// Address that could not be decoded
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Column letters outside A-Z
    #[error("The column address '{0}' is not valid")]
    InvalidColumnLetter(String),

    /// Column index below 1
    #[error("Column index {0} is out of range, it must be greater than 0")]
    IndexOutOfRange(u32),

    /// Worksheet markup that violates the structure rows are rebuilt from
    #[error("Malformed worksheet: {0}")]
    MalformedWorksheet(String),

    /// Cell addressed past the width declared by the sheet dimension
    #[error("Cell in column {column} of row {row} lies outside the declared width of {last_column} columns")]
    ColumnOutOfDeclaredRange {
        row: u32,
        column: u32,
        last_column: u32,
    },

    /// Cell type code other than absent, "n", "s", "str" or "b"
    #[error("Unknown cell type '{cell_type}' at {address}")]
    UnknownCellType { cell_type: String, address: String },

    /// Shared-string reference past the end of the table
    #[error("Shared string index {index} is out of range ({count} strings loaded)")]
    SharedStringOutOfRange { index: usize, count: usize },

    /// Value text that does not parse for its cell type
    #[error("Invalid value '{value}' at {address}")]
    InvalidCellValue { address: String, value: String },

    /// XML error wrapper
    #[error("XML error: {0}")]
    XmlError(String),

    /// CSV error wrapper
    #[error("CSV error: {0}")]
    CsvError(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<AddressError> for ExcelError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::InvalidAddress(a) => ExcelError::InvalidAddress(a),
            AddressError::InvalidColumnLetter(c) => ExcelError::InvalidColumnLetter(c),
            AddressError::IndexOutOfRange(i) => ExcelError::IndexOutOfRange(i),
        }
    }
}

impl From<quick_xml::Error> for ExcelError {
    fn from(err: quick_xml::Error) -> Self {
        ExcelError::XmlError(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ExcelError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        ExcelError::XmlError(err.to_string())
    }
}

impl From<csv::Error> for ExcelError {
    fn from(err: csv::Error) -> Self {
        ExcelError::CsvError(err.to_string())
    }
}
