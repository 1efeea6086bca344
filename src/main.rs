//! # sitesift CLI
//!
//! Command-line front end for the keyword evidence extractor.
//!
//! ## Subcommands
//!
//! - `scrape`: crawl a site from a starting URL, preview the matches and
//!   export them to a CSV file or a Google Sheet
//! - `classify`: run the classifier and link filter over a local HTML file
//!
//! Status lines go to stdout, logs go to stderr (and optionally a file).

mod telemetry;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sitesift::export::credentials::{
    DEFAULT_CREDENTIALS_PATH, SHEETS_TOKEN_ENV, resolve_access_token,
};
use sitesift::export::{CsvSink, SheetsSink, TabularSink, export_records, run_timestamp};
use sitesift::extractor::{
    CrawlEvent, CrawlReport, ExtractionRecord, ExtractorConfig, HttpFetcher, SiteExtractor,
    scan_page, split_keywords,
};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tokio::sync::mpsc;
use tracing::{info, instrument};
use url::Url;

#[derive(Parser)]
#[command(author, version, about = "Extract keyword evidence from a website", long_about = None)]
struct Cli {
    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a website and its relevant sub-pages for keywords
    Scrape(ScrapeArgs),

    /// Classify keyword matches in a local HTML file
    Classify(ClassifyArgs),
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Starting URL
    #[arg(required = true)]
    url: String,

    /// Keywords to look for (comma-separated)
    #[arg(short, long, required = true)]
    keywords: String,

    /// CSV file the results are appended to
    #[arg(short, long, default_value = "sitesift-results.csv")]
    output: PathBuf,

    /// Google Sheet URL; export there instead of the CSV file
    #[arg(long)]
    sheet_url: Option<String>,

    /// Service account key used to authorize Google Sheets access
    #[arg(long, default_value = DEFAULT_CREDENTIALS_PATH)]
    credentials: PathBuf,

    /// Pause before each sub-page request in milliseconds
    #[arg(short, long, default_value = "1000")]
    delay_ms: u64,

    /// Extra attempts for a failed request
    #[arg(short, long, default_value = "0")]
    retries: u32,

    /// Number of records shown in the preview
    #[arg(short, long, default_value = "10")]
    preview: usize,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Scan only, do not export
    #[arg(long)]
    no_export: bool,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    /// HTML file to classify
    #[arg(required = true)]
    file: PathBuf,

    /// Keywords to look for (comma-separated)
    #[arg(short, long, required = true)]
    keywords: String,

    /// URL the file was served from, used for attribution and link resolution
    #[arg(short, long, default_value = "http://localhost/")]
    url: String,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[derive(Debug, Clone, Copy)]
enum Status {
    Info,
    Success,
    Warning,
    Error,
}

fn print_status(status: Status, message: &str) -> std::io::Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut spec = ColorSpec::new();
    match status {
        Status::Info => {}
        Status::Success => {
            spec.set_fg(Some(Color::Green)).set_bold(true);
        }
        Status::Warning => {
            spec.set_fg(Some(Color::Yellow));
        }
        Status::Error => {
            spec.set_fg(Some(Color::Red)).set_bold(true);
        }
    }
    stdout.set_color(&spec)?;
    writeln!(stdout, "{message}")?;
    stdout.reset()
}

/// Where a scrape run's rows end up
enum ExportTarget {
    Csv(CsvSink),
    Sheets(SheetsSink),
}

impl ExportTarget {
    fn describe(&self) -> String {
        match self {
            ExportTarget::Csv(sink) => sink.path().display().to_string(),
            ExportTarget::Sheets(sink) => format!("Google Sheet {}", sink.spreadsheet_id()),
        }
    }

    async fn export(
        &mut self,
        records: &[ExtractionRecord],
        timestamp: &str,
    ) -> sitesift::Result<usize> {
        let written = match self {
            ExportTarget::Csv(sink) => export_records(sink, records, timestamp).await?,
            ExportTarget::Sheets(sink) => export_records(sink, records, timestamp).await?,
        };
        Ok(written)
    }
}

/// Open the sink and confirm it is usable before any page is fetched
async fn prepare_sink(args: &ScrapeArgs) -> sitesift::Result<ExportTarget> {
    match &args.sheet_url {
        Some(sheet_url) => {
            let token =
                resolve_access_token(&args.credentials, std::env::var(SHEETS_TOKEN_ENV).ok())
                    .await?;
            let mut sink = SheetsSink::new(sheet_url, token)?;
            sink.header_present().await?;
            Ok(ExportTarget::Sheets(sink))
        }
        None => Ok(ExportTarget::Csv(CsvSink::open(&args.output)?)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = telemetry::init_tracing_subscriber(cli.log_file.as_deref())?;

    match cli.command {
        Some(Commands::Scrape(args)) => {
            scrape_command(args).await?;
        }
        Some(Commands::Classify(args)) => {
            classify_command(args).await?;
        }
        None => {
            let _ = Cli::parse_from(["sitesift", "--help"]);
        }
    }

    Ok(())
}

fn parse_inputs(url: &str, keywords: &str) -> anyhow::Result<(Url, Vec<String>)> {
    let keywords = split_keywords(keywords);
    if url.trim().is_empty() || keywords.is_empty() {
        bail!("Please enter both a URL and Keywords.");
    }
    let url = Url::parse(url.trim()).with_context(|| format!("Invalid URL: {url}"))?;
    Ok((url, keywords))
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .map(|style| style.progress_chars("##-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Render crawl events as status lines and a progress bar over Phase 2
async fn render_progress(mut events: mpsc::UnboundedReceiver<CrawlEvent>) {
    let mut bar: Option<ProgressBar> = None;

    while let Some(event) = events.recv().await {
        match event {
            CrawlEvent::SeedStarted { url } => {
                let _ = print_status(Status::Info, &format!("Phase 1: Analyzing Home Page: {url}"));
            }
            CrawlEvent::CandidatesFound { count } => {
                let _ = print_status(
                    Status::Info,
                    &format!("Phase 2: Found {count} relevant pages. Crawling..."),
                );
                let progress = ProgressBar::new(count as u64);
                progress.set_style(progress_style());
                bar = Some(progress);
            }
            CrawlEvent::NoCandidates => {
                let _ = print_status(
                    Status::Warning,
                    "No relevant sub-links found. Only checked Home Page.",
                );
            }
            CrawlEvent::Scanning { url, index, .. } => {
                if let Some(progress) = &bar {
                    progress.set_position(index.saturating_sub(1) as u64);
                    progress.set_message(format!("Scanning: {url}"));
                }
            }
            CrawlEvent::Finished { .. } => {
                if let Some(progress) = bar.take() {
                    progress.finish_and_clear();
                }
            }
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn print_records(records: &[ExtractionRecord], limit: usize) {
    println!("{:<20} {:<14} {:<60} URL", "KEYWORD", "TYPE", "CONTEXT");
    for record in records.iter().take(limit) {
        println!(
            "{:<20} {:<14} {:<60} {}",
            truncate(&record.keyword, 20),
            record.context_type.label(),
            truncate(&record.context, 60),
            record.url
        );
    }
    if records.len() > limit {
        println!("... and {} more", records.len() - limit);
    }
}

fn sink_error_message(args: &ScrapeArgs, error: &sitesift::Error) -> String {
    match (&args.sheet_url, error) {
        (Some(_), sitesift::Error::Auth(_)) => error.to_string(),
        (Some(_), _) => format!("Authentication Error: {error}"),
        (None, _) => format!("Could not open {}: {error}", args.output.display()),
    }
}

#[instrument]
async fn scrape_command(args: ScrapeArgs) -> anyhow::Result<()> {
    let (_, keywords) = parse_inputs(&args.url, &args.keywords)?;

    let mut target = if args.no_export {
        None
    } else {
        match prepare_sink(&args).await {
            Ok(target) => Some(target),
            Err(e) => {
                print_status(Status::Error, &sink_error_message(&args, &e))?;
                return Err(anyhow!(e).context("Could not prepare the export destination"));
            }
        }
    };

    let config = ExtractorConfig::builder()
        .politeness_delay(Duration::from_millis(args.delay_ms))
        .transport_retries(args.retries)
        .build();
    let extractor = SiteExtractor::new(HttpFetcher::new(&config)?, config);

    let (tx, rx) = mpsc::unbounded_channel();
    let progress_handle = tokio::spawn(render_progress(rx));

    let result = extractor.run(args.url.trim(), &keywords, Some(&tx)).await;
    drop(tx);
    let _ = progress_handle.await;

    let report: CrawlReport = match result {
        Ok(report) => report,
        Err(e) => {
            print_status(Status::Error, &format!("Error accessing home page: {e}"))?;
            return Err(anyhow!(e).context("Scan aborted"));
        }
    };
    info!(
        "Scanned {} pages, skipped {}",
        report.pages_scanned,
        report.skipped_links.len()
    );

    if report.is_empty() {
        print_status(Status::Warning, "No data found matching those keywords.")?;
        return Ok(());
    }

    print_status(
        Status::Success,
        &format!("Scanning Complete. Found {} data points.", report.records.len()),
    )?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_records(&report.records, args.preview);
    }

    if let Some(target) = target.as_mut() {
        let timestamp = run_timestamp();
        match target.export(&report.records, &timestamp).await {
            Ok(written) => print_status(
                Status::Success,
                &format!("Success! {written} rows exported to {}", target.describe()),
            )?,
            Err(e) => {
                print_status(Status::Error, &format!("Failed to write export: {e}"))?;
                return Err(anyhow!(e));
            }
        }
    }

    Ok(())
}

#[instrument]
async fn classify_command(args: ClassifyArgs) -> anyhow::Result<()> {
    let (url, keywords) = parse_inputs(&args.url, &args.keywords)?;
    let markup = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let config = ExtractorConfig::default();
    let scan = scan_page(
        &markup,
        &url,
        &keywords,
        &config.seed_noise_tags,
        &config.snippet_limits(),
        true,
    );
    let links: Vec<String> = scan.links.iter().map(Url::to_string).collect();

    if args.format == "json" {
        let output = serde_json::json!({
            "records": scan.records,
            "candidate_links": links,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if scan.records.is_empty() {
        print_status(Status::Warning, "No data found matching those keywords.")?;
    } else {
        print_records(&scan.records, scan.records.len());
    }

    println!();
    println!("Relevant links: {}", links.len());
    for link in &links {
        println!("  {link}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inputs_requires_keywords() {
        assert!(parse_inputs("https://bank.example", " , ,").is_err());
        assert!(parse_inputs("  ", "fees").is_err());

        let (url, keywords) = parse_inputs("https://bank.example", "Fees, Millennia").unwrap();
        assert_eq!(url.as_str(), "https://bank.example/");
        assert_eq!(keywords, vec!["Fees", "Millennia"]);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_cli_parses_scrape() {
        let cli = Cli::parse_from([
            "sitesift",
            "scrape",
            "https://bank.example",
            "--keywords",
            "fees",
            "--delay-ms",
            "0",
        ]);
        match cli.command {
            Some(Commands::Scrape(args)) => {
                assert_eq!(args.delay_ms, 0);
                assert_eq!(args.output, PathBuf::from("sitesift-results.csv"));
                assert_eq!(args.preview, 10);
                assert!(!args.no_export);
                assert_eq!(args.credentials, PathBuf::from("credentials.json"));
            }
            _ => panic!("expected scrape"),
        }
    }

    fn scrape_args(extra: &[&str]) -> ScrapeArgs {
        let mut argv = vec!["sitesift", "scrape", "https://bank.example", "-k", "fees"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Some(Commands::Scrape(args)) => args,
            _ => panic!("expected scrape"),
        }
    }

    #[tokio::test]
    async fn test_unopenable_csv_is_not_reported_as_auth_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("out.csv");
        let args = scrape_args(&["--output", missing.to_str().unwrap()]);

        let error = match prepare_sink(&args).await {
            Err(e) => e,
            Ok(_) => panic!("expected the sink to fail"),
        };
        let message = sink_error_message(&args, &error);
        assert!(message.starts_with("Could not open "));
        assert!(message.contains("out.csv"));
        assert!(!message.contains("Authentication"));
    }

    #[test]
    fn test_sheet_errors_use_authentication_wording() {
        let args = scrape_args(&[
            "--sheet-url",
            "https://docs.google.com/spreadsheets/d/abc/edit",
        ]);
        let auth = sitesift::Error::Auth("token expired".to_string());
        assert_eq!(
            sink_error_message(&args, &auth),
            "Authentication error: token expired"
        );

        let other = sitesift::Error::Export("Invalid sheet URL: x".to_string());
        assert!(sink_error_message(&args, &other).starts_with("Authentication Error: "));
    }
}
