use serde::Deserialize;

/// Top-level configuration file structure for Ripple-Scan
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScannerConfig {
    /// Run options; any key may be overridden on the command line
    #[serde(default)]
    pub scan: PartialScanOptions,

    #[serde(default)]
    pub fetcher: FetcherConfig,

    #[serde(default)]
    pub controller: ControllerConfig,
}

/// Immutable options for a single scan run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScanOptions {
    /// Seed URL the scan starts from
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Number of pages fetched concurrently within a layer
    #[serde(rename = "thread-count")]
    pub thread_count: usize,

    /// Text every fetched page is searched for
    #[serde(rename = "searched-text")]
    pub searched_text: String,

    /// Maximum number of distinct URLs assigned an id, base URL included
    #[serde(rename = "scan-url-count")]
    pub scan_url_count: usize,
}

impl ScanOptions {
    pub fn new(
        base_url: impl Into<String>,
        thread_count: usize,
        searched_text: impl Into<String>,
        scan_url_count: usize,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            thread_count,
            searched_text: searched_text.into(),
            scan_url_count,
        }
    }
}

/// The `[scan]` table as written in a config file, where every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialScanOptions {
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    #[serde(rename = "thread-count")]
    pub thread_count: Option<usize>,

    #[serde(rename = "searched-text")]
    pub searched_text: Option<String>,

    #[serde(rename = "scan-url-count")]
    pub scan_url_count: Option<usize>,
}

impl PartialScanOptions {
    /// Overlays `other` on top of `self`, keys present in `other` winning
    pub fn merge(self, other: PartialScanOptions) -> Self {
        Self {
            base_url: other.base_url.or(self.base_url),
            thread_count: other.thread_count.or(self.thread_count),
            searched_text: other.searched_text.or(self.searched_text),
            scan_url_count: other.scan_url_count.or(self.scan_url_count),
        }
    }

    /// Fills missing keys with values that fail validation, so that every
    /// absent option is reported together with the invalid ones
    pub fn into_options(self) -> ScanOptions {
        ScanOptions {
            base_url: self.base_url.unwrap_or_default(),
            thread_count: self.thread_count.unwrap_or(0),
            searched_text: self.searched_text.unwrap_or_default(),
            scan_url_count: self.scan_url_count.unwrap_or(0),
        }
    }
}

/// HTTP fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// TCP connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Run-loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    /// Upper bound on how long a paused run sleeps between state checks (milliseconds)
    #[serde(rename = "pause-poll-ms", default = "default_pause_poll_ms")]
    pub pause_poll_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            pause_poll_ms: default_pause_poll_ms(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("ripple-scan/{}", env!("CARGO_PKG_VERSION"))
}

fn default_pause_poll_ms() -> u64 {
    100
}
