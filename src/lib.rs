//! # sitesift - keyword evidence extraction for websites
//!
//! Given a starting URL and a list of keywords, sitesift scans the page and
//! the same-domain pages it links to for those keywords, classifies every
//! occurrence by the structure around it (table row, section header, list
//! item or text block) and exports the snippets, with the page they came
//! from, to a tabular sink.
//!
//! ## Features
//!
//! - Structure-aware snippet extraction over an abstract DOM interface
//! - Keyword-relevant, same-domain link discovery
//! - Sequential two-phase crawl with a politeness delay between requests
//! - CSV and Google Sheets export with a fixed five-column layout
//! - Async API with Tokio and structured logging with tracing

mod error;
pub mod export;
pub mod extractor;

pub use error::{Error, Result};

/// Re-export of commonly used types
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::export::{CsvSink, SheetsSink, TabularSink, export_records};
    pub use crate::extractor::{
        ContextType, CrawlReport, ExtractionRecord, ExtractorConfig, HttpFetcher, SiteExtractor,
    };
}
