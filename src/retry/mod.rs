//! Retry wrapper with backoff and a default value on exhaustion
//!
//! [`RetryPolicy`] wraps any fallible call. Failures the error type reports
//! as retryable (see [`Retryable`]) are retried after a delay that grows by
//! the backoff factor; everything else stops immediately.
//!
//! # Example
//!
//! ```no_run
//! use iapd_crawler::{Iapd, RetryPolicy, Target};
//! use iapd_crawler::config::Config;
//!
//! # async fn run() -> iapd_crawler::Result<()> {
//! let config = Config::default();
//! let iapd = &Iapd::new(&config)?;
//! let policy = RetryPolicy::from_config(&config.retry);
//! let _filings = policy
//!     .run_or(None, move || async move {
//!         iapd.get_firm_filings(&Target::Crd(160_882), false, None).await.map(Some)
//!     })
//!     .await;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::IapdError;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Default retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry
const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// Largest accepted backoff factor
pub const MAX_BACKOFF: f64 = 10.0;

/// Ceiling for a single retry delay
pub const MAX_DELAY: Duration = Duration::from_secs(60 * 60);

/// Facts about an error the retry policy needs
pub trait Retryable {
    /// HTTP status code carried by the error, if any
    fn status_code(&self) -> Option<u16> {
        None
    }

    /// Whether the error is a transient transport failure (e.g. a timeout)
    fn is_transient(&self) -> bool {
        false
    }
}

impl Retryable for IapdError {
    fn status_code(&self) -> Option<u16> {
        match self {
            IapdError::Status { status, .. } => Some(*status),
            IapdError::Http { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    fn is_transient(&self) -> bool {
        match self {
            IapdError::Timeout { .. } => true,
            IapdError::Http { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

/// Bounded retry with multiplicative backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
    backoff: f64,
    retry_codes: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_DELAY,
            backoff: 1.0,
            retry_codes: vec![429, 503],
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration, backoff: f64, retry_codes: Vec<u16>) -> Self {
        Self {
            max_retries,
            delay,
            backoff: if backoff.is_finite() {
                backoff.clamp(1.0, MAX_BACKOFF)
            } else {
                1.0
            },
            retry_codes,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.delay_ms),
            config.backoff,
            config.retry_codes.clone(),
        )
    }

    /// Upper bound on how many times the wrapped call runs
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether `error` qualifies for another attempt
    pub fn should_retry<E: Retryable>(&self, error: &E) -> bool {
        error.is_transient()
            || error
                .status_code()
                .is_some_and(|code| self.retry_codes.contains(&code))
    }

    /// Delay before retry number `retry` (1-indexed), capped at [`MAX_DELAY`]
    pub fn delay_for(&self, retry: u32) -> Duration {
        if self.delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let factor = self.backoff.powi(exponent);
        if factor == 1.0 {
            return self.delay.min(MAX_DELAY);
        }
        Duration::try_from_secs_f64(self.delay.as_secs_f64() * factor)
            .map_or(MAX_DELAY, |delay| delay.min(MAX_DELAY))
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or
    /// the retry budget is spent. Returns the last error in the latter cases.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut retries = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => match self.next_delay(&e, &mut retries) {
                    Some(delay) => {
                        tracing::debug!("Error: {}, retrying in {:?}", e, delay);
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(e),
                },
            }
        }
    }

    /// Like [`run`](Self::run), but swallows the final error and returns
    /// `default` instead
    pub async fn run_or<T, E, F, Fut>(&self, default: T, op: F) -> T
    where
        E: Retryable + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.run(op).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Giving up, returning default value: {}", e);
                default
            }
        }
    }

    /// Blocking counterpart of [`run`](Self::run) for synchronous calls
    pub fn run_blocking<T, E, F>(&self, mut op: F) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut() -> Result<T, E>,
    {
        let mut retries = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) => match self.next_delay(&e, &mut retries) {
                    Some(delay) => {
                        tracing::debug!("Error: {}, retrying in {:?}", e, delay);
                        std::thread::sleep(delay);
                    }
                    None => return Err(e),
                },
            }
        }
    }

    /// Blocking counterpart of [`run_or`](Self::run_or)
    pub fn run_blocking_or<T, E, F>(&self, default: T, op: F) -> T
    where
        E: Retryable + Display,
        F: FnMut() -> Result<T, E>,
    {
        match self.run_blocking(op) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Giving up, returning default value: {}", e);
                default
            }
        }
    }

    /// Counts a failure and returns the delay before the next attempt, or
    /// `None` when the error is final
    fn next_delay<E: Retryable>(&self, error: &E, retries: &mut u32) -> Option<Duration> {
        if !self.should_retry(error) {
            return None;
        }
        if *retries >= self.max_retries {
            tracing::debug!("Max retries exceeded");
            return None;
        }
        *retries += 1;
        Some(self.delay_for(*retries))
    }
}
