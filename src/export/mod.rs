//! # Export Module
//!
//! Writes extraction records to a tabular sink with a fixed five-column
//! layout. A sink only needs to answer whether its header row exists and
//! accept appended rows; the header is written once, then one row per record,
//! all stamped with the same run timestamp.
//!
//! ## Sinks
//!
//! - `CsvSink`: appends to a local CSV file
//! - `SheetsSink`: appends to the first worksheet of a Google spreadsheet,
//!   authorized through `credentials`

pub mod credentials;
mod csv_sink;
mod error;
mod sheets;

pub use csv_sink::CsvSink;
pub use error::ExportError;
pub use sheets::{SheetsSink, spreadsheet_id_from_url};

use std::future::Future;

use tracing::{info, instrument};

use crate::extractor::ExtractionRecord;

/// Header row written once per sink
pub const EXPORT_HEADER: [&str; 5] = [
    "Source URL",
    "Keyword Matched",
    "Extracted Context",
    "Type",
    "Timestamp",
];

/// Destination that rows can be appended to
pub trait TabularSink {
    /// Whether the sink already starts with a header row
    fn header_present(&mut self) -> impl Future<Output = Result<bool, ExportError>> + Send;

    /// Append a single row
    fn append_row(
        &mut self,
        row: Vec<String>,
    ) -> impl Future<Output = Result<(), ExportError>> + Send;

    /// Append several rows in one operation
    fn append_rows(
        &mut self,
        rows: Vec<Vec<String>>,
    ) -> impl Future<Output = Result<(), ExportError>> + Send;
}

/// Timestamp shared by every row of one export
pub fn run_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Render one record as `(url, keyword, context, type, timestamp)`
pub fn record_row(record: &ExtractionRecord, timestamp: &str) -> Vec<String> {
    vec![
        record.url.clone(),
        record.keyword.clone(),
        record.context.clone(),
        record.context_type.label().to_string(),
        timestamp.to_string(),
    ]
}

/// Append `records` to `sink`, adding the header row first if it is absent.
///
/// Returns the number of rows written. Nothing is written for an empty
/// record list.
#[instrument(skip(sink, records))]
pub async fn export_records<S: TabularSink>(
    sink: &mut S,
    records: &[ExtractionRecord],
    timestamp: &str,
) -> Result<usize, ExportError> {
    if records.is_empty() {
        return Ok(0);
    }

    if !sink.header_present().await? {
        info!("Sink has no header row, adding one");
        sink.append_row(EXPORT_HEADER.iter().map(|h| h.to_string()).collect())
            .await?;
    }

    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| record_row(record, timestamp))
        .collect();
    sink.append_rows(rows).await?;

    info!("Exported {} rows", records.len());
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ContextType;

    /// Keeps rows in memory
    #[derive(Default)]
    struct MemorySink {
        rows: Vec<Vec<String>>,
        batches: usize,
    }

    impl TabularSink for MemorySink {
        async fn header_present(&mut self) -> Result<bool, ExportError> {
            Ok(!self.rows.is_empty())
        }

        async fn append_row(&mut self, row: Vec<String>) -> Result<(), ExportError> {
            self.rows.push(row);
            Ok(())
        }

        async fn append_rows(&mut self, rows: Vec<Vec<String>>) -> Result<(), ExportError> {
            self.batches += 1;
            self.rows.extend(rows);
            Ok(())
        }
    }

    fn record(keyword: &str, context: &str) -> ExtractionRecord {
        ExtractionRecord {
            keyword: keyword.to_string(),
            context: context.to_string(),
            context_type: ContextType::TableRow,
            url: "https://bank.example/".to_string(),
        }
    }

    #[tokio::test]
    async fn test_header_written_once() {
        let mut sink = MemorySink::default();
        let records = vec![record("Millennia", "Millennia | 1.5%")];

        export_records(&mut sink, &records, "2024-01-01 10:00:00")
            .await
            .unwrap();
        export_records(&mut sink, &records, "2024-01-02 10:00:00")
            .await
            .unwrap();

        assert_eq!(sink.rows.len(), 3);
        assert_eq!(sink.rows[0], EXPORT_HEADER.to_vec());
        assert_eq!(
            sink.rows[1],
            vec![
                "https://bank.example/",
                "Millennia",
                "Millennia | 1.5%",
                "Table Row",
                "2024-01-01 10:00:00"
            ]
        );
        assert_eq!(sink.rows[2][4], "2024-01-02 10:00:00");
        assert_eq!(sink.batches, 2);
    }

    #[tokio::test]
    async fn test_all_rows_share_timestamp() {
        let mut sink = MemorySink::default();
        let records = vec![record("a", "aaa"), record("b", "bbb"), record("c", "ccc")];

        let written = export_records(&mut sink, &records, "2024-05-05 05:05:05")
            .await
            .unwrap();

        assert_eq!(written, 3);
        assert!(
            sink.rows[1..]
                .iter()
                .all(|row| row[4] == "2024-05-05 05:05:05")
        );
    }

    #[tokio::test]
    async fn test_empty_export_touches_nothing() {
        let mut sink = MemorySink::default();
        let written = export_records(&mut sink, &[], "ts").await.unwrap();
        assert_eq!(written, 0);
        assert!(sink.rows.is_empty());
    }

    #[test]
    fn test_run_timestamp_format() {
        let ts = run_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%d %H:%M:%S").is_ok());
    }
}
