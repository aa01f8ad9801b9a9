//! Delimited-text export
//!
//! Rows are rebuilt with the same engine as [`XlsxStreamReader::rows`], but
//! every cell is turned into text while it is decoded: numbers keep the
//! digits stored in the file and booleans become `true`/`false`. Each row is
//! written as soon as it is complete.

use crate::error::Result;
use crate::options::{CsvOptions, LineTerminator};
use crate::reconstruct::TextCells;
use crate::sheet_index::SheetSelector;
use crate::streaming_reader::XlsxStreamReader;
use log::debug;
use std::fs::File;
use std::io::Write;
use std::path::Path;

impl XlsxStreamReader {
    /// Write the sheet to a CSV file, replacing it if it exists
    ///
    /// Returns the number of rows written. Fields holding the separator, a
    /// quote or a line break are quoted.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P, options: &CsvOptions) -> Result<u64> {
        let file = File::create(path.as_ref())?;
        let writer = csv_builder(options).from_writer(file);
        let rows = self.write_csv_to(writer)?;
        debug!("Wrote {} rows to {}", rows, path.as_ref().display());
        Ok(rows)
    }

    /// Write the sheet as CSV to any writer
    pub fn write_csv_writer<W: Write>(&self, writer: W, options: &CsvOptions) -> Result<u64> {
        self.write_csv_to(csv_builder(options).from_writer(writer))
    }

    fn write_csv_to<W: Write>(&self, mut writer: csv::Writer<W>) -> Result<u64> {
        let mut engine = self.engine(TextCells {
            decode_escapes: self.options().decode_escapes,
        })?;

        let mut count = 0u64;
        while let Some(row) = engine.next_row() {
            writer.write_record(&row?.cells)?;
            count += 1;
        }

        writer.flush()?;
        Ok(count)
    }
}

fn csv_builder(options: &CsvOptions) -> csv::WriterBuilder {
    let terminator = match options.line_terminator {
        LineTerminator::LF => csv::Terminator::Any(b'\n'),
        LineTerminator::CRLF => csv::Terminator::CRLF,
    };

    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(options.separator)
        .terminator(terminator)
        .flexible(false);
    builder
}

/// Open `xlsx`, select a sheet and export it to `csv`
///
/// The sheet is resolved before the destination is touched, so a missing
/// sheet leaves an existing CSV file as it was.
///
/// # Example
///
/// ```no_run
/// use xlsxstream::{write_csv, CsvOptions};
///
/// let rows = write_csv("report.xlsx", "Sheet1", "report.csv", &CsvOptions::default())?;
/// println!("{} rows", rows);
/// # Ok::<(), xlsxstream::ExcelError>(())
/// ```
pub fn write_csv<P, S, Q>(xlsx: P, sheet: S, csv: Q, options: &CsvOptions) -> Result<u64>
where
    P: AsRef<Path>,
    S: Into<SheetSelector>,
    Q: AsRef<Path>,
{
    XlsxStreamReader::open(xlsx, sheet)?.write_csv(csv, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_applies_separator_and_terminator() {
        let options = CsvOptions::new()
            .separator(b';')
            .line_terminator(LineTerminator::CRLF);
        let mut bytes = Vec::new();
        {
            let mut writer = csv_builder(&options).from_writer(&mut bytes);
            writer.write_record(["a", "b;c", ""]).unwrap();
            writer.write_record(["1", "2", "3"]).unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(String::from_utf8(bytes).unwrap(), "a;\"b;c\";\r\n1;2;3\r\n");
    }

    #[test]
    fn test_missing_workbook_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.csv");
        std::fs::write(&dest, "keep").unwrap();

        let result = write_csv(
            dir.path().join("missing.xlsx"),
            "Sheet1",
            &dest,
            &CsvOptions::default(),
        );
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "keep");
    }
}
