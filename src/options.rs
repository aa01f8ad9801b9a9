//! Reader and export configuration

/// What to do with a cell whose type code is not understood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellTypePolicy {
    /// Fail with `UnknownCellType`
    #[default]
    Strict,
    /// Leave the cell empty and log a warning
    Lenient,
}

/// Options used when opening a workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    pub cell_type_policy: CellTypePolicy,
    /// Decode `_xHHHH_` escapes in text values
    pub decode_escapes: bool,
    /// Read buffer placed around each part stream, in bytes
    pub buffer_capacity: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            cell_type_policy: CellTypePolicy::Strict,
            decode_escapes: true,
            buffer_capacity: 64 * 1024,
        }
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell_type_policy(mut self, policy: CellTypePolicy) -> Self {
        self.cell_type_policy = policy;
        self
    }

    pub fn decode_escapes(mut self, decode: bool) -> Self {
        self.decode_escapes = decode;
        self
    }

    /// Buffer size for part streams (at least 4 KB)
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(4 * 1024);
        self
    }
}

/// Line terminator written after each CSV record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineTerminator {
    #[default]
    LF,
    CRLF,
}

/// Options for delimited-text export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Single-byte field separator
    pub separator: u8,
    pub line_terminator: LineTerminator,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            separator: b',',
            line_terminator: LineTerminator::LF,
        }
    }
}

impl CsvOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    pub fn line_terminator(mut self, terminator: LineTerminator) -> Self {
        self.line_terminator = terminator;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReaderOptions::default();
        assert_eq!(options.cell_type_policy, CellTypePolicy::Strict);
        assert!(options.decode_escapes);
        assert_eq!(options.buffer_capacity, 64 * 1024);

        let csv = CsvOptions::default();
        assert_eq!(csv.separator, b',');
        assert_eq!(csv.line_terminator, LineTerminator::LF);
    }

    #[test]
    fn test_builder_setters() {
        let options = ReaderOptions::new()
            .cell_type_policy(CellTypePolicy::Lenient)
            .decode_escapes(false)
            .buffer_capacity(16);
        assert_eq!(options.cell_type_policy, CellTypePolicy::Lenient);
        assert!(!options.decode_escapes);
        assert_eq!(options.buffer_capacity, 4 * 1024);

        assert_eq!(CsvOptions::new().separator(b';').separator, b';');
    }
}
