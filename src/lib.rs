//! IAPD Crawler: a client for the Investment Adviser Public Disclosure site
//!
//! This crate searches https://adviserinfo.sec.gov for firms and individuals,
//! looks up filings by CRD number and optionally downloads the documents.
//! A retry policy can wrap any of those calls and substitute a default value
//! once retries are exhausted.

pub mod config;
pub mod crawler;
pub mod download;
pub mod output;
pub mod retry;
pub mod session;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for IAPD operations
#[derive(Debug, Error)]
pub enum IapdError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Unexpected response from {url}: {message}")]
    UnexpectedResponse { url: String, message: String },

    #[error("Unknown CRD number: {crd}")]
    UnknownCrd { crd: u64 },

    #[error("No adviser profile found at {url}")]
    NotFound { url: String },

    #[error("Invalid search scope '{0}', must be firm or individual")]
    InvalidScope(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl IapdError {
    /// Wraps a reqwest error, classifying timeouts separately
    pub fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            IapdError::Timeout {
                url: url.to_string(),
            }
        } else {
            IapdError::Http {
                url: url.to_string(),
                source,
            }
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for IAPD operations
pub type Result<T> = std::result::Result<T, IapdError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    FirmFilings, Iapd, IndividualReport, Registration, SearchOptions, SearchPages, SearchResult,
    SearchScope, Target,
};
pub use download::ExistingFilePolicy;
pub use retry::{RetryPolicy, Retryable};
