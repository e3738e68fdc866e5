use crate::download::ExistingFilePolicy;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default browser user agent; the site rejects obvious bots
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/72.0.3626.109 Safari/537.36";

/// Public IAPD site
pub const DEFAULT_BASE_URL: &str = "https://adviserinfo.sec.gov";

/// Main configuration structure for the IAPD crawler
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub site: SiteConfig,
    pub retry: RetryConfig,
    pub download: DownloadConfig,
}

/// HTTP session behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionConfig {
    /// Lower bound of the randomized delay between requests (milliseconds)
    pub min_delay_ms: u64,

    /// Upper bound of the randomized delay between requests (milliseconds)
    pub max_delay_ms: u64,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    pub user_agent: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1500,
            max_delay_ms: 2500,
            timeout_secs: 60,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Target site
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Scheme and host every endpoint is resolved against
    pub base_url: String,

    /// Refuse plain-HTTP connections
    pub https_only: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            https_only: true,
        }
    }
}

/// Retry behavior applied around crawler calls
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds)
    pub delay_ms: u64,

    /// Multiplier applied to the delay after each retry
    pub backoff: f64,

    /// HTTP status codes worth retrying
    pub retry_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay_ms: 5000,
            backoff: 1.0,
            retry_codes: vec![429, 503],
        }
    }
}

/// Filing download settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DownloadConfig {
    /// Directory for downloaded filings; a temp directory when unset
    pub output_dir: Option<PathBuf>,

    pub existing_files: ExistingFilePolicy,
}
