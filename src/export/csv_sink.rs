//! CSV file sink

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::export::{ExportError, TabularSink};

/// Appends rows to a CSV file, creating it on first use.
///
/// The header counts as present once the file holds any bytes.
pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Opened CSV sink at {}", path.display());
        Ok(Self {
            path,
            writer: csv::Writer::from_writer(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TabularSink for CsvSink {
    async fn header_present(&mut self) -> Result<bool, ExportError> {
        self.writer.flush()?;
        Ok(std::fs::metadata(&self.path)?.len() > 0)
    }

    async fn append_row(&mut self, row: Vec<String>) -> Result<(), ExportError> {
        self.writer.write_record(&row)?;
        self.writer.flush()?;
        Ok(())
    }

    async fn append_rows(&mut self, rows: Vec<Vec<String>>) -> Result<(), ExportError> {
        for row in &rows {
            self.writer.write_record(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
