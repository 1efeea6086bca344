//! # Keyword Evidence Extractor
//!
//! Finds where keywords appear on a website and turns each occurrence into a
//! short, structured snippet with source attribution.
//!
//! ## Key Components
//!
//! - `classifier`: assigns each keyword match one `ContextType` and builds a
//!   bounded, deduplicated snippet
//! - `links`: picks same-domain links whose text or href mentions a keyword
//! - `SiteExtractor`: the two-phase crawl over the seed page and its
//!   keyword-relevant children
//! - `PageFetcher` / `HttpFetcher`: markup retrieval with timeouts and a fixed
//!   identification header
//! - `DomNode` / `DomDocument`: the tree navigation contract the classifier
//!   is written against
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sitesift::extractor::{ExtractorConfig, HttpFetcher, SiteExtractor};
//!
//! # async fn demo() -> Result<(), sitesift::extractor::ExtractError> {
//! let config = ExtractorConfig::default();
//! let extractor = SiteExtractor::new(HttpFetcher::new(&config)?, config);
//! let keywords = vec!["Millennia".to_string(), "Fees".to_string()];
//! let report = extractor.run("https://bank.example", &keywords, None).await?;
//! println!("{} records", report.records.len());
//! # Ok(())
//! # }
//! ```

pub mod classifier;
mod config;
pub mod document;
mod error;
mod fetcher;
pub mod links;
mod orchestrator;
pub mod text;

pub use classifier::{ContextType, ExtractionRecord, extract_records};
pub use config::{DEFAULT_USER_AGENT, ExtractorConfig, ExtractorConfigBuilder, SnippetLimits};
pub use document::{DomDocument, DomNode, HtmlPage};
pub use error::ExtractError;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use links::find_relevant_links;
pub use orchestrator::{CrawlEvent, CrawlReport, PageScan, SiteExtractor, SkippedLink, scan_page};
pub use text::{normalize_whitespace, split_keywords};
