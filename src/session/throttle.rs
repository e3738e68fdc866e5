//! Politeness delay between consecutive requests

use rand::Rng;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Spaces requests by a random delay drawn from `[min_delay, max_delay]`
///
/// The delay is measured from the end of the previous request, so time spent
/// parsing a response counts towards it. The first request is never delayed.
#[derive(Debug)]
pub struct Throttle {
    min_delay: Duration,
    max_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay: max_delay.max(min_delay),
            last_request: Mutex::new(None),
        }
    }

    /// Draws the delay for the next request
    pub fn pick_delay(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    /// Time still to wait before the next request may go out
    pub fn remaining(&self, delay: Duration) -> Duration {
        let last = *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match last {
            Some(at) => delay.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Sleeps until the randomized delay since the last request has passed
    pub async fn wait(&self) {
        let sleep_time = self.remaining(self.pick_delay());
        if !sleep_time.is_zero() {
            tracing::debug!("Request delayed for {:?}", sleep_time);
            tokio::time::sleep(sleep_time).await;
        }
    }

    /// Records that a request just completed
    pub fn mark(&self) {
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }
}
