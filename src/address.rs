//! Spreadsheet address codec
//!
//! Converts between A1-style addresses ("B7", "$A$1", "A1:C3", "2:5", "B:D")
//! and 1-based row/column coordinates. Everything here is a pure function.
//!
//! Two decoders are provided:
//! - [`decode`] is permissive: `$` anchors may appear anywhere and the row may
//!   carry leading zeros. It is what the worksheet engine uses for `r` and
//!   `ref` attributes.
//! - [`decode_checked`] first validates the whole string against the strict
//!   address grammar and reports a typed failure for anything else, for
//!   callers that expect malformed input.

use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;
use thiserror::Error;

/// Highest row number of a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Highest column number of a worksheet (XFD)
pub const MAX_COLUMNS: u32 = 16_384;

static STRICT_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:\$?[A-Z]+\$?[1-9][0-9]*(?::\$?[A-Z]+\$?[1-9][0-9]*)?|\$?[1-9][0-9]*:\$?[1-9][0-9]*|\$?[A-Z]+:\$?[A-Z]+)$",
    )
    .expect("address grammar is a valid regex")
});

/// Failure of an address conversion
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("The column address '{0}' is not valid")]
    InvalidColumnLetter(String),

    #[error("Column index {0} is out of range, it must be greater than 0")]
    IndexOutOfRange(u32),
}

/// A 1-based cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    /// Row number, 1-based
    pub row: u32,
    /// Column number, 1-based (A = 1)
    pub column: u32,
}

impl Coordinate {
    pub fn new(row: u32, column: u32) -> Self {
        Coordinate { row, column }
    }
}

/// A single cell (`end` is `None`) or a rectangular range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AddressRange {
    pub start: Coordinate,
    pub end: Option<Coordinate>,
}

impl AddressRange {
    /// A bare cell address
    pub fn cell(start: Coordinate) -> Self {
        AddressRange { start, end: None }
    }

    /// A range between two corners
    pub fn range(start: Coordinate, end: Coordinate) -> Self {
        AddressRange {
            start,
            end: Some(end),
        }
    }

    /// Whether this was written with a `:`
    pub fn is_range(&self) -> bool {
        self.end.is_some()
    }

    /// Bottom-right corner; the cell itself for a bare address
    pub fn last(&self) -> Coordinate {
        self.end.unwrap_or(self.start)
    }
}

impl FromStr for AddressRange {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_checked(s)
    }
}

// One side of an address. Whole-row and whole-column forms leave one part out.
struct Half {
    row: Option<u32>,
    column: Option<u32>,
}

/// Decode an address or range into coordinates.
///
/// Letters are upper-cased and `$` anchors dropped before parsing. In range
/// form a side without letters spans every column and a side without digits
/// spans every row, so `"2:5"` covers `A2:XFD5`. Column letters outside
/// A-Z fail with [`AddressError::InvalidAddress`].
///
/// # Examples
///
/// ```
/// use xlsxstream::address::{decode, Coordinate};
///
/// let range = decode("B7").unwrap();
/// assert_eq!(range.start, Coordinate::new(7, 2));
/// assert!(range.end.is_none());
///
/// let range = decode("a1:c3").unwrap();
/// assert_eq!(range.end, Some(Coordinate::new(3, 3)));
/// ```
pub fn decode(address: &str) -> Result<AddressRange, AddressError> {
    let upper = address.to_uppercase();

    match upper.split_once(':') {
        Some((first, second)) => {
            let first = decode_half(first, address)?;
            let second = decode_half(second, address)?;
            Ok(AddressRange::range(
                Coordinate::new(first.row.unwrap_or(1), first.column.unwrap_or(1)),
                Coordinate::new(
                    second.row.unwrap_or(MAX_ROWS),
                    second.column.unwrap_or(MAX_COLUMNS),
                ),
            ))
        }
        None => match decode_half(&upper, address)? {
            Half {
                row: Some(row),
                column: Some(column),
            } => Ok(AddressRange::cell(Coordinate::new(row, column))),
            _ => Err(AddressError::InvalidAddress(address.to_string())),
        },
    }
}

/// Validate `address` against the strict grammar, then decode it.
///
/// Accepted forms: `A1`, `$A$1`, `A1:C3`, `2:5` and `B:D`. Anything else is
/// returned as [`AddressError::InvalidAddress`].
pub fn decode_checked(address: &str) -> Result<AddressRange, AddressError> {
    let upper = address.to_uppercase();
    if !STRICT_ADDRESS.is_match(&upper) {
        return Err(AddressError::InvalidAddress(address.to_string()));
    }
    decode(&upper)
}

fn decode_half(half: &str, address: &str) -> Result<Half, AddressError> {
    let stripped: String = half.chars().filter(|&c| c != '$').collect();
    let letters_len: usize = stripped
        .chars()
        .take_while(|c| c.is_alphabetic())
        .map(char::len_utf8)
        .sum();
    let (letters, digits) = stripped.split_at(letters_len);

    if letters.is_empty() && digits.is_empty() {
        return Err(AddressError::InvalidAddress(address.to_string()));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AddressError::InvalidAddress(address.to_string()));
    }

    let column = if letters.is_empty() {
        None
    } else {
        Some(
            column_index(letters)
                .map_err(|_| AddressError::InvalidAddress(address.to_string()))?,
        )
    };

    let row = if digits.is_empty() {
        None
    } else {
        match digits.parse::<u32>() {
            Ok(row) if row >= 1 => Some(row),
            _ => return Err(AddressError::InvalidAddress(address.to_string())),
        }
    };

    Ok(Half { row, column })
}

/// Convert column letters to a 1-based index (A = 1, Z = 26, AA = 27).
///
/// Only upper-case A-Z is accepted.
pub fn column_index(letters: &str) -> Result<u32, AddressError> {
    let invalid = || AddressError::InvalidColumnLetter(letters.to_string());
    if letters.is_empty() {
        return Err(invalid());
    }

    let mut index: u32 = 0;
    let mut multiplier: Option<u32> = Some(1);
    for c in letters.chars().rev() {
        if !c.is_ascii_uppercase() {
            return Err(invalid());
        }
        let digit = c as u32 - 'A' as u32 + 1;
        index = multiplier
            .and_then(|m| digit.checked_mul(m))
            .and_then(|v| index.checked_add(v))
            .ok_or_else(invalid)?;
        multiplier = multiplier.and_then(|m| m.checked_mul(26));
    }

    Ok(index)
}

/// Convert a 1-based column index to its letters (1 -> "A", 27 -> "AA").
pub fn column_name(index: u32) -> Result<String, AddressError> {
    if index == 0 {
        return Err(AddressError::IndexOutOfRange(index));
    }
    Ok(column_letters(index))
}

fn column_letters(index: u32) -> String {
    if index <= 26 {
        char::from(b'A' + (index - 1) as u8).to_string()
    } else {
        let mut letters = column_letters((index - 1) / 26);
        letters.push(char::from(b'A' + ((index - 1) % 26) as u8));
        letters
    }
}

/// Format a coordinate as an A1-style address
pub fn encode(coordinate: Coordinate) -> Result<String, AddressError> {
    if coordinate.row == 0 {
        return Err(AddressError::InvalidAddress(format!(
            "row {} of column {}",
            coordinate.row, coordinate.column
        )));
    }
    Ok(format!("{}{}", column_name(coordinate.column)?, coordinate.row))
}

/// Format a cell or range, `"A1"` or `"A1:C3"`
pub fn encode_range(range: &AddressRange) -> Result<String, AddressError> {
    let start = encode(range.start)?;
    match range.end {
        Some(end) => Ok(format!("{}:{}", start, encode(end)?)),
        None => Ok(start),
    }
}
