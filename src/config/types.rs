use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Listing-Harvest
///
/// Every section is optional; a missing section takes the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub session: SessionConfig,
    pub pacing: PacingConfig,
    pub discovery: DiscoveryConfig,
    pub retry: RetryConfig,
    pub extraction: ExtractionConfig,
    pub output: OutputConfig,
    /// Provider key -> search term
    pub providers: BTreeMap<String, String>,
}

impl Config {
    /// Configuration with the built-in provider table filled in
    pub fn with_default_providers() -> Self {
        Self {
            providers: default_providers(),
            ..Self::default()
        }
    }
}

/// The directory site being harvested
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin used for search URLs and for resolving relative listing links
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the search results endpoint
    #[serde(rename = "search-path")]
    pub search_path: String,

    /// Lower-case body fragments that identify an anti-bot challenge page
    #[serde(rename = "challenge-markers")]
    pub challenge_markers: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.yellowpages.com".to_string(),
            search_path: "/search".to_string(),
            challenge_markers: vec!["challenge-platform".to_string(), "just a moment".to_string()],
        }
    }
}

/// Outbound identity and transport settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,

    /// Single static proxy applied to every request of a session
    pub proxy: Option<String>,

    #[serde(rename = "plain-timeout-secs")]
    pub plain_timeout_secs: u64,

    #[serde(rename = "bypass-timeout-secs")]
    pub bypass_timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Visit the homepage before crawling to pick up cookies
    #[serde(rename = "warm-up")]
    pub warm_up: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            proxy: None,
            plain_timeout_secs: 30,
            bypass_timeout_secs: 60,
            connect_timeout_secs: 10,
            warm_up: true,
        }
    }
}

/// An inclusive range of milliseconds a randomized pause is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayRange {
    #[serde(rename = "min-ms")]
    pub min_ms: u64,

    #[serde(rename = "max-ms")]
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

/// Randomized delays applied before network calls
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    #[serde(rename = "warm-up")]
    pub warm_up: DelayRange,

    #[serde(rename = "between-pages")]
    pub between_pages: DelayRange,

    #[serde(rename = "after-empty-page")]
    pub after_empty_page: DelayRange,

    #[serde(rename = "after-failure")]
    pub after_failure: DelayRange,

    #[serde(rename = "challenge-wait")]
    pub challenge_wait: DelayRange,

    #[serde(rename = "between-records")]
    pub between_records: DelayRange,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            warm_up: DelayRange::new(3_000, 5_000),
            between_pages: DelayRange::new(3_000, 6_000),
            after_empty_page: DelayRange::new(3_000, 5_000),
            after_failure: DelayRange::new(5_000, 8_000),
            challenge_wait: DelayRange::new(10_000, 15_000),
            between_records: DelayRange::new(3_000, 8_000),
        }
    }
}

impl PacingConfig {
    /// All pauses set to zero, for tests and dry environments
    pub fn immediate() -> Self {
        Self {
            warm_up: DelayRange::zero(),
            between_pages: DelayRange::zero(),
            after_empty_page: DelayRange::zero(),
            after_failure: DelayRange::zero(),
            challenge_wait: DelayRange::zero(),
            between_records: DelayRange::zero(),
        }
    }
}

/// Pagination crawl limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Hard ceiling on result pages visited in one run
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Consecutive unproductive pages that end a run early
    #[serde(rename = "failure-threshold")]
    pub failure_threshold: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            failure_threshold: 3,
        }
    }
}

/// Per-URL retry budget for detail extraction
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Base pause after a generic failure, multiplied by the attempt number
    pub backoff: DelayRange,

    /// Base pause after a 403/429 or challenge page, multiplied by the attempt number
    #[serde(rename = "blocked-backoff")]
    pub blocked_backoff: DelayRange,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: DelayRange::new(5_000, 10_000),
            blocked_backoff: DelayRange::new(10_000, 20_000),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Number of concurrent extraction workers
    pub workers: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root under which per-state folders are created
    pub directory: String,

    /// Where HTML of blocked or card-less result pages is saved, if set
    #[serde(rename = "debug-dir")]
    pub debug_dir: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            debug_dir: None,
        }
    }
}

/// The built-in provider table
pub fn default_providers() -> BTreeMap<String, String> {
    [
        ("diagnostic-center", "medical diagnostic center"),
        ("imaging-labs", "medical imaging labs"),
        ("primary-care", "primary care"),
        ("dental-care", "dental care"),
        ("urgent-care", "urgent care"),
        ("vision-care", "medical vision care"),
        ("chiropractics", "chiropractics"),
        ("physiotherapy", "physiotherapy"),
    ]
    .into_iter()
    .map(|(key, term)| (key.to_string(), term.to_string()))
    .collect()
}
