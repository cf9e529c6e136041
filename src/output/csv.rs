//! CSV record sink
//!
//! Comma-delimited, UTF-8, header first. Fields are quoted only when they
//! contain the delimiter, a quote or a line break; embedded quotes are
//! doubled.

use super::traits::{OutputResult, RecordSink};
use crate::extract::{OrganizationRecord, HEADER};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const DELIMITER: char = ',';

fn needs_quotes(field: &str) -> bool {
    field.contains(DELIMITER) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Writes one CSV row, terminated by `\r\n`
pub fn write_row<W: Write, S: AsRef<str>>(writer: &mut W, row: &[S]) -> std::io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(writer, "{}", DELIMITER)?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(writer, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            writer.write_all(cell.as_bytes())?;
        }
    }
    writer.write_all(b"\r\n")
}

/// Streams records to any writer as CSV rows
pub struct CsvSink<W: Write> {
    writer: W,
    rows_written: usize,
}

impl CsvSink<BufWriter<File>> {
    /// Creates (or truncates) the file at `path` and writes the header
    pub fn create(path: impl AsRef<Path>) -> OutputResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        tracing::debug!("Writing records to {}", path.display());
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> CsvSink<W> {
    /// Wraps `writer` and writes the header row
    pub fn new(mut writer: W) -> OutputResult<Self> {
        write_row(&mut writer, HEADER.as_slice())?;
        writer.flush()?;
        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_record(&mut self, record: &OrganizationRecord) -> OutputResult<()> {
        write_row(&mut self.writer, record.to_row().as_slice())?;
        self.writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        tracing::debug!("CSV complete: header plus {} row(s)", self.rows_written);
        Ok(())
    }
}
