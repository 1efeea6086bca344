//! # Extractor Configuration Module
//!
//! Configuration for a two-phase extraction run: fetch timeouts, the
//! politeness delay between child-page fetches, the identification header,
//! which noise elements are stripped before classification, and the bounds of
//! the truncated text-block window. Uses the same builder pattern as the rest
//! of the crate.

use std::time::Duration;

/// Identification header sent with every page request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Configuration for an extraction run
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Timeout for the seed page fetch
    pub seed_timeout: Duration,

    /// Timeout for each child page fetch
    pub child_timeout: Duration,

    /// Pause inserted before every child page fetch
    pub politeness_delay: Duration,

    /// User agent to use for requests
    pub user_agent: String,

    /// Elements removed from the seed page before classification
    pub seed_noise_tags: Vec<String>,

    /// Elements removed from child pages before classification
    pub child_noise_tags: Vec<String>,

    /// Text blocks longer than this many characters are truncated
    pub max_block_chars: usize,

    /// Characters kept ahead of the keyword in a truncated block
    pub window_before: usize,

    /// Characters kept from the keyword onward in a truncated block
    pub window_after: usize,

    /// Additional attempts after a failed fetch. Zero disables retries.
    pub transport_retries: u32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            seed_timeout: Duration::from_secs(15),
            child_timeout: Duration::from_secs(10),
            politeness_delay: Duration::from_secs(1),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            seed_noise_tags: vec![
                "script".to_string(),
                "style".to_string(),
                "nav".to_string(),
                "footer".to_string(),
                "noscript".to_string(),
            ],
            child_noise_tags: vec![
                "script".to_string(),
                "style".to_string(),
                "nav".to_string(),
                "footer".to_string(),
            ],
            max_block_chars: 300,
            window_before: 50,
            window_after: 150,
            transport_retries: 0,
        }
    }
}

/// Builder for ExtractorConfig
#[derive(Debug, Default)]
pub struct ExtractorConfigBuilder {
    config: ExtractorConfig,
}

impl ExtractorConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ExtractorConfig::default(),
        }
    }

    /// Set the seed page timeout
    pub fn seed_timeout(mut self, seed_timeout: Duration) -> Self {
        self.config.seed_timeout = seed_timeout;
        self
    }

    /// Set the child page timeout
    pub fn child_timeout(mut self, child_timeout: Duration) -> Self {
        self.config.child_timeout = child_timeout;
        self
    }

    /// Set the pause between child page fetches
    pub fn politeness_delay(mut self, politeness_delay: Duration) -> Self {
        self.config.politeness_delay = politeness_delay;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the elements stripped from the seed page
    pub fn seed_noise_tags(mut self, seed_noise_tags: Vec<String>) -> Self {
        self.config.seed_noise_tags = seed_noise_tags;
        self
    }

    /// Set the elements stripped from child pages
    pub fn child_noise_tags(mut self, child_noise_tags: Vec<String>) -> Self {
        self.config.child_noise_tags = child_noise_tags;
        self
    }

    /// Set the truncation threshold for text blocks
    pub fn max_block_chars(mut self, max_block_chars: usize) -> Self {
        self.config.max_block_chars = max_block_chars;
        self
    }

    /// Set the characters kept before and after the keyword when truncating
    pub fn window(mut self, before: usize, after: usize) -> Self {
        self.config.window_before = before;
        self.config.window_after = after;
        self
    }

    /// Set the number of extra attempts for a failed fetch
    pub fn transport_retries(mut self, transport_retries: u32) -> Self {
        self.config.transport_retries = transport_retries;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ExtractorConfig {
        self.config
    }
}

impl ExtractorConfig {
    /// Create a new builder
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder::new()
    }

    /// Snippet bounds used by the classifier
    pub fn snippet_limits(&self) -> SnippetLimits {
        SnippetLimits {
            max_block_chars: self.max_block_chars,
            window_before: self.window_before,
            window_after: self.window_after,
        }
    }
}

/// Length bounds applied to text-block snippets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnippetLimits {
    pub max_block_chars: usize,
    pub window_before: usize,
    pub window_after: usize,
}

impl Default for SnippetLimits {
    fn default() -> Self {
        ExtractorConfig::default().snippet_limits()
    }
}
