//! Two-phase crawl orchestrator
//!
//! Phase 1 fetches the seed page, strips noise elements, classifies it for
//! every keyword and discovers keyword-relevant same-domain links. Phase 2
//! visits each candidate once, strictly sequentially, pausing before every
//! fetch. A seed failure aborts the run; a child failure only skips that
//! link.

use std::collections::HashSet;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::extractor::classifier::{ExtractionRecord, extract_records};
use crate::extractor::config::{ExtractorConfig, SnippetLimits};
use crate::extractor::document::{DomDocument, HtmlPage};
use crate::extractor::error::ExtractError;
use crate::extractor::fetcher::PageFetcher;
use crate::extractor::links::find_relevant_links;

/// Progress notifications emitted while a run is in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    /// Phase 1 is fetching the seed page
    SeedStarted { url: String },
    /// Phase 1 found candidate child pages
    CandidatesFound { count: usize },
    /// Phase 1 found no candidate pages; Phase 2 is skipped
    NoCandidates,
    /// Phase 2 is about to fetch a candidate (1-based index)
    Scanning {
        url: String,
        index: usize,
        total: usize,
    },
    /// The run is complete
    Finished { records: usize },
}

/// A candidate page that could not be scanned
#[derive(Debug, Clone, Serialize)]
pub struct SkippedLink {
    pub url: String,
    pub reason: String,
}

/// Outcome of one completed run
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlReport {
    /// Seed URL as the caller supplied it
    pub seed_url: String,

    /// All records, seed page first, then candidates in visiting order
    pub records: Vec<ExtractionRecord>,

    /// Keyword-relevant same-domain links discovered on the seed page
    pub candidate_links: Vec<String>,

    /// Number of pages fetched and classified
    pub pages_scanned: usize,

    /// Candidates dropped because their fetch failed
    pub skipped_links: Vec<SkippedLink>,
}

impl CrawlReport {
    fn new(seed_url: &str) -> Self {
        Self {
            seed_url: seed_url.to_string(),
            ..Default::default()
        }
    }

    /// No record qualified on any visited page
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Only the seed page was scanned because no link qualified
    pub fn no_candidate_links(&self) -> bool {
        self.candidate_links.is_empty()
    }
}

/// Records and candidate links found on one page
#[derive(Debug, Clone, Default)]
pub struct PageScan {
    pub records: Vec<ExtractionRecord>,
    pub links: Vec<Url>,
}

/// Parse `markup`, strip `noise_tags`, classify for every keyword and,
/// when requested, collect candidate links.
///
/// The parsed tree is dropped before returning.
pub fn scan_page(
    markup: &str,
    url: &Url,
    keywords: &[String],
    noise_tags: &[String],
    limits: &SnippetLimits,
    discover_links: bool,
) -> PageScan {
    let mut page = HtmlPage::parse(markup);
    page.remove_elements(noise_tags);

    let records = extract_records(&page, keywords, url.as_str(), limits);
    let links = if discover_links {
        find_relevant_links(url, &page, keywords)
    } else {
        Vec::new()
    };

    PageScan { records, links }
}

/// Drives fetch, classify and link discovery across the seed page and its
/// keyword-relevant children
pub struct SiteExtractor<F> {
    fetcher: F,
    config: ExtractorConfig,
}

impl<F: PageFetcher> SiteExtractor<F> {
    pub fn new(fetcher: F, config: ExtractorConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Run both phases for `seed_url`.
    ///
    /// Seed page records carry `seed_url` exactly as given; the parsed form
    /// is used only for fetching, link resolution and the visited set.
    ///
    /// Returns `Err` only when the seed URL is invalid or the seed page
    /// cannot be fetched. An empty keyword list produces an empty report
    /// without any request.
    #[instrument(skip(self, keywords, events))]
    pub async fn run(
        &self,
        seed_url: &str,
        keywords: &[String],
        events: Option<&UnboundedSender<CrawlEvent>>,
    ) -> Result<CrawlReport, ExtractError> {
        let emit = |event: CrawlEvent| {
            if let Some(tx) = events {
                let _ = tx.send(event);
            }
        };

        let seed = Url::parse(seed_url)?;
        let mut report = CrawlReport::new(seed_url);
        if keywords.is_empty() {
            debug!("No keywords supplied, nothing to do");
            return Ok(report);
        }

        let limits = self.config.snippet_limits();

        info!("Phase 1: analyzing home page {}", seed);
        emit(CrawlEvent::SeedStarted {
            url: seed.to_string(),
        });
        let markup = self
            .fetch_with_retries(&seed, self.config.seed_timeout)
            .await?;
        let scan = scan_page(
            &markup,
            &seed,
            keywords,
            &self.config.seed_noise_tags,
            &limits,
            true,
        );
        report
            .records
            .extend(scan.records.into_iter().map(|record| ExtractionRecord {
                url: seed_url.to_string(),
                ..record
            }));
        report.pages_scanned = 1;
        report.candidate_links = scan.links.iter().map(Url::to_string).collect();

        let mut visited = HashSet::new();
        visited.insert(seed.to_string());

        if scan.links.is_empty() {
            info!("No relevant sub-links found, only the home page was checked");
            emit(CrawlEvent::NoCandidates);
            emit(CrawlEvent::Finished {
                records: report.records.len(),
            });
            return Ok(report);
        }

        let total = scan.links.len();
        info!("Phase 2: found {} relevant pages", total);
        emit(CrawlEvent::CandidatesFound { count: total });

        for (i, link) in scan.links.iter().enumerate() {
            if !visited.insert(link.to_string()) {
                debug!("Already visited {}", link);
                continue;
            }

            emit(CrawlEvent::Scanning {
                url: link.to_string(),
                index: i + 1,
                total,
            });

            if !self.config.politeness_delay.is_zero() {
                tokio::time::sleep(self.config.politeness_delay).await;
            }

            match self
                .fetch_with_retries(link, self.config.child_timeout)
                .await
            {
                Ok(markup) => {
                    let page = scan_page(
                        &markup,
                        link,
                        keywords,
                        &self.config.child_noise_tags,
                        &limits,
                        false,
                    );
                    debug!("{} records from {}", page.records.len(), link);
                    report.records.extend(page.records);
                    report.pages_scanned += 1;
                }
                Err(e) => {
                    debug!("Skipping {}: {}", link, e);
                    report.skipped_links.push(SkippedLink {
                        url: link.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Run complete: {} records from {} pages",
            report.records.len(),
            report.pages_scanned
        );
        emit(CrawlEvent::Finished {
            records: report.records.len(),
        });
        Ok(report)
    }

    async fn fetch_with_retries(
        &self,
        url: &Url,
        timeout: std::time::Duration,
    ) -> Result<String, ExtractError> {
        let mut attempt = 0;
        loop {
            match self.fetcher.fetch(url, timeout).await {
                Ok(markup) => return Ok(markup),
                Err(e) if e.is_transient() && attempt < self.config.transport_retries => {
                    attempt += 1;
                    warn!("Fetch of {} failed (attempt {}): {}", url, attempt, e);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::classifier::ContextType;
    use std::collections::HashMap;
    use std::future::{Future, ready};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    const SEED: &str = "https://bank.example/";

    /// Serves pages from memory; unknown URLs fail like an unreachable host.
    /// `flaky` URLs fail that many times before succeeding.
    #[derive(Default)]
    struct MockFetcher {
        pages: HashMap<String, String>,
        flaky: Mutex<HashMap<String, u32>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn with_page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PageFetcher for MockFetcher {
        fn fetch(
            &self,
            url: &Url,
            _timeout: Duration,
        ) -> impl Future<Output = Result<String, ExtractError>> + Send {
            self.calls.lock().unwrap().push(url.to_string());

            let mut flaky = self.flaky.lock().unwrap();
            let failing = flaky.get_mut(url.as_str()).filter(|left| **left > 0);
            let result = match (failing, self.pages.get(url.as_str())) {
                (Some(left), _) => {
                    *left -= 1;
                    Err(ExtractError::Timeout {
                        url: url.to_string(),
                        timeout_secs: 10,
                    })
                }
                (None, Some(body)) => Ok(body.clone()),
                (None, None) => Err(ExtractError::Fetch {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                }),
            };
            ready(result)
        }
    }

    fn config() -> ExtractorConfig {
        ExtractorConfig::builder()
            .politeness_delay(Duration::ZERO)
            .build()
    }

    fn keywords(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    const SEED_PAGE: &str = r#"
        <html><body>
          <nav><a href="/nav-millennia">Millennia menu</a></nav>
          <table><tr><td>Millennia</td><td>1.5%</td></tr></table>
          <a href="/millennia-fees">Fees</a>
          <a href="/millennia-rewards">Rewards</a>
          <a href="/broken-millennia">Broken</a>
          <a href="https://other.example/millennia">External</a>
          <script>var millennia = true;</script>
        </body></html>
    "#;

    fn site() -> MockFetcher {
        MockFetcher::default()
            .with_page(SEED, SEED_PAGE)
            .with_page(
                "https://bank.example/millennia-fees",
                "<ul><li>Millennia annual fee Rs. 1000</li></ul>",
            )
            .with_page(
                "https://bank.example/millennia-rewards",
                "<p>Earn 5% on Millennia</p><footer><p>Millennia footer</p></footer>",
            )
    }

    #[tokio::test]
    async fn test_seed_failure_aborts_run() {
        let extractor = SiteExtractor::new(MockFetcher::default(), config());
        let result = extractor.run(SEED, &keywords(&["Millennia"]), None).await;

        assert!(matches!(result, Err(ExtractError::Fetch { .. })));
        assert_eq!(extractor.fetcher.calls(), vec![SEED.to_string()]);
    }

    #[tokio::test]
    async fn test_child_failure_is_skipped() {
        let extractor = SiteExtractor::new(site(), config());
        let report = extractor
            .run(SEED, &keywords(&["Millennia"]), None)
            .await
            .unwrap();

        let found: Vec<(&str, &str, ContextType)> = report
            .records
            .iter()
            .map(|r| (r.url.as_str(), r.context.as_str(), r.context_type))
            .collect();
        assert_eq!(
            found,
            vec![
                (SEED, "Millennia | 1.5%", ContextType::TableRow),
                (
                    "https://bank.example/millennia-fees",
                    "Millennia annual fee Rs. 1000",
                    ContextType::ListItem
                ),
                (
                    "https://bank.example/millennia-rewards",
                    "Earn 5% on Millennia",
                    ContextType::TextBlock
                ),
            ]
        );

        assert_eq!(report.candidate_links.len(), 3);
        assert_eq!(report.pages_scanned, 3);
        assert_eq!(report.skipped_links.len(), 1);
        assert_eq!(
            report.skipped_links[0].url,
            "https://bank.example/broken-millennia"
        );
        assert!(!report.no_candidate_links());
    }

    #[tokio::test]
    async fn test_no_candidates_skips_phase_two() {
        let fetcher = MockFetcher::default().with_page(
            SEED,
            r#"<p>Millennia card</p><a href="/about">About</a>"#,
        );
        let extractor = SiteExtractor::new(fetcher, config());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let report = extractor
            .run(SEED, &keywords(&["Millennia"]), Some(&tx))
            .await
            .unwrap();

        assert!(report.no_candidate_links());
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].url, SEED);
        assert_eq!(extractor.fetcher.calls().len(), 1);

        drop(tx);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                CrawlEvent::SeedStarted {
                    url: SEED.to_string()
                },
                CrawlEvent::NoCandidates,
                CrawlEvent::Finished { records: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_seed_without_matches_completes_empty() {
        let fetcher = MockFetcher::default().with_page(
            SEED,
            r#"<p>Savings accounts</p><a href="/loans">Loans</a>"#,
        );
        let extractor = SiteExtractor::new(fetcher, config());
        let result = extractor.run(SEED, &keywords(&["Millennia"]), None).await;

        let report = result.expect("a page without matches is not a failure");
        assert!(report.is_empty());
        assert!(report.no_candidate_links());
        assert_eq!(report.pages_scanned, 1);
        assert!(report.skipped_links.is_empty());
        assert_eq!(extractor.fetcher.calls(), vec![SEED.to_string()]);
    }

    #[tokio::test]
    async fn test_seed_records_keep_the_url_as_given() {
        let fetcher = MockFetcher::default().with_page(
            SEED,
            r#"<table><tr><td>Millennia</td><td>1.5%</td></tr></table>"#,
        );
        let extractor = SiteExtractor::new(fetcher, config());
        let report = extractor
            .run("https://Bank.Example", &keywords(&["Millennia"]), None)
            .await
            .unwrap();

        assert_eq!(report.seed_url, "https://Bank.Example");
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].url, "https://Bank.Example");
        assert_eq!(report.records[0].context, "Millennia | 1.5%");
        assert_eq!(extractor.fetcher.calls(), vec![SEED.to_string()]);
    }

    #[tokio::test]
    async fn test_empty_keywords_fetch_nothing() {
        let extractor = SiteExtractor::new(site(), config());
        let report = extractor.run(SEED, &[], None).await.unwrap();

        assert!(report.is_empty());
        assert!(extractor.fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_seed_url() {
        let extractor = SiteExtractor::new(site(), config());
        let result = extractor.run("not a url", &keywords(&["x"]), None).await;
        assert!(matches!(result, Err(ExtractError::UrlParse(_))));
    }

    #[tokio::test]
    async fn test_seed_is_not_revisited() {
        let fetcher = MockFetcher::default().with_page(
            SEED,
            r#"<p>Millennia home</p><a href="/">Millennia home link</a>"#,
        );
        let extractor = SiteExtractor::new(fetcher, config());
        let report = extractor
            .run(SEED, &keywords(&["millennia"]), None)
            .await
            .unwrap();

        assert_eq!(report.candidate_links, vec![SEED.to_string()]);
        assert_eq!(report.pages_scanned, 1);
        assert_eq!(extractor.fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_scanning_events_in_order() {
        let extractor = SiteExtractor::new(site(), config());
        let (tx, mut rx) = mpsc::unbounded_channel();
        extractor
            .run(SEED, &keywords(&["Millennia"]), Some(&tx))
            .await
            .unwrap();
        drop(tx);

        let mut scanning = Vec::new();
        while let Some(event) = rx.recv().await {
            if let CrawlEvent::Scanning { url, index, total } = event {
                scanning.push((url, index, total));
            }
        }
        assert_eq!(
            scanning,
            vec![
                ("https://bank.example/millennia-fees".to_string(), 1, 3),
                ("https://bank.example/millennia-rewards".to_string(), 2, 3),
                ("https://bank.example/broken-millennia".to_string(), 3, 3),
            ]
        );
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried_when_configured() {
        let fetcher = site();
        fetcher.flaky.lock().unwrap().insert(SEED.to_string(), 1);
        let config = ExtractorConfig::builder()
            .politeness_delay(Duration::ZERO)
            .transport_retries(1)
            .build();

        let extractor = SiteExtractor::new(fetcher, config);
        let report = extractor
            .run(SEED, &keywords(&["Millennia"]), None)
            .await
            .unwrap();

        assert_eq!(report.records[0].context, "Millennia | 1.5%");
        let seed_calls = extractor
            .fetcher
            .calls()
            .iter()
            .filter(|u| u.as_str() == SEED)
            .count();
        assert_eq!(seed_calls, 2);
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let fetcher = site();
        fetcher.flaky.lock().unwrap().insert(SEED.to_string(), 1);
        let extractor = SiteExtractor::new(fetcher, config());

        let result = extractor.run(SEED, &keywords(&["Millennia"]), None).await;
        assert!(matches!(result, Err(ExtractError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_politeness_delay_between_child_fetches() {
        let config = ExtractorConfig::builder()
            .politeness_delay(Duration::from_millis(20))
            .build();
        let extractor = SiteExtractor::new(site(), config);

        let started = std::time::Instant::now();
        extractor
            .run(SEED, &keywords(&["Millennia"]), None)
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn test_scan_page_strips_noise_before_links() {
        let seed = Url::parse(SEED).unwrap();
        let config = ExtractorConfig::default();
        let scan = scan_page(
            SEED_PAGE,
            &seed,
            &keywords(&["Millennia"]),
            &config.seed_noise_tags,
            &config.snippet_limits(),
            true,
        );

        assert_eq!(scan.records.len(), 1);
        assert!(
            scan.links
                .iter()
                .all(|link| !link.as_str().contains("nav-millennia"))
        );
    }
}
