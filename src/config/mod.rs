//! Configuration module for the IAPD crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing values fall back to the defaults used
//! against the public site.
//!
//! # Example
//!
//! ```no_run
//! use iapd_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("iapd.toml")).unwrap();
//! println!("Retries: {}", config.retry.max_retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DownloadConfig, RetryConfig, SessionConfig, SiteConfig, DEFAULT_BASE_URL,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
