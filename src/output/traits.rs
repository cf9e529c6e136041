//! Record sink trait and output errors

use crate::extract::OrganizationRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for extracted records
///
/// A sink writes its header as soon as it exists, so a crawl that yields
/// no records still leaves a header-only output behind. Rows must be
/// durable once `write_record` returns.
pub trait RecordSink {
    /// Appends one record as one row
    ///
    /// # Arguments
    ///
    /// * `record` - The record to write
    fn write_record(&mut self, record: &OrganizationRecord) -> OutputResult<()>;

    /// Flushes anything still buffered
    fn finish(&mut self) -> OutputResult<()>;
}

/// Collects rows in memory
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemorySink {
    pub rows: Vec<Vec<String>>,
    pub finished: bool,
}

#[cfg(test)]
impl RecordSink for MemorySink {
    fn write_record(&mut self, record: &OrganizationRecord) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Write("sink already finished".to_string()));
        }
        self.rows.push(record.to_row());
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.finished = true;
        Ok(())
    }
}
