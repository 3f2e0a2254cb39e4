//! Availability probing with bounded retries.
//!
//! A probe issues HEAD requests until the server answers. Only
//! connection-level failures (typically "connection refused" while a server
//! is still starting) are retried; any other error is returned right away.
//! The delay between attempts is either fixed or an ordered sequence whose
//! last value repeats, which allows for backoff.

use crate::error::{MarkupError, Result};
use crate::http;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Default delay between probe attempts (100ms).
pub const DEFAULT_PROBE_DELAY: Duration = Duration::from_millis(100);

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 10;

/// Delay policy between probe attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delay {
    /// The same delay before every retry.
    Fixed(Duration),
    /// Delays used in order; the last one repeats once exhausted.
    Sequence(Vec<Duration>),
}

impl Delay {
    /// Returns the delay to wait before retry number `retry` (zero-based).
    #[must_use]
    pub fn before_retry(&self, retry: u32) -> Duration {
        match self {
            Delay::Fixed(delay) => *delay,
            Delay::Sequence(delays) => {
                let index = usize::try_from(retry).unwrap_or(usize::MAX);
                delays
                    .get(index)
                    .or_else(|| delays.last())
                    .copied()
                    .unwrap_or(Duration::ZERO)
            }
        }
    }

    /// Builds a sequence from millisecond values.
    #[must_use]
    pub fn from_millis(delays: &[u64]) -> Self {
        Delay::Sequence(delays.iter().copied().map(Duration::from_millis).collect())
    }
}

impl From<Duration> for Delay {
    fn from(delay: Duration) -> Self {
        Delay::Fixed(delay)
    }
}

impl From<Vec<Duration>> for Delay {
    fn from(delays: Vec<Duration>) -> Self {
        Delay::Sequence(delays)
    }
}

/// Configuration for probe operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Delay policy between attempts.
    pub delay: Delay,

    /// Maximum number of retries after the first attempt.
    pub retries: u32,
}

impl ProbeConfig {
    /// Creates a new probe configuration.
    pub fn new(delay: impl Into<Delay>, retries: u32) -> Self {
        Self {
            delay: delay.into(),
            retries,
        }
    }

    /// Replaces the delay policy.
    #[must_use]
    pub fn with_delay(mut self, delay: impl Into<Delay>) -> Self {
        self.delay = delay.into();
        self
    }

    /// Replaces the retry budget.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_DELAY, DEFAULT_RETRIES)
    }
}

/// Polls `uri` until it answers, returning the number of attempts used.
///
/// # Example
///
/// ```ignore
/// let config = ProbeConfig::new(Delay::from_millis(&[10, 15, 20, 25]), 10);
/// probe("http://localhost:3333", &config).await?;
/// ```
///
/// # Errors
///
/// Returns `ProbeTimeout` once the retry budget is spent, or the first
/// error that is not a connection failure.
pub async fn probe(uri: &str, config: &ProbeConfig) -> Result<u32> {
    let mut attempts = 0;

    loop {
        attempts += 1;
        match http::head(uri).await {
            Ok(()) => {
                debug!(uri, attempts, "server available");
                return Ok(attempts);
            }
            Err(MarkupError::Http(err)) if err.is_connect() => {
                debug!(uri, attempts, "server not reachable yet");
            }
            Err(err) => return Err(err),
        }

        let retry = attempts - 1;
        if retry >= config.retries {
            return Err(MarkupError::ProbeTimeout {
                uri: uri.to_string(),
                attempts,
            });
        }

        sleep(config.delay.before_retry(retry)).await;
    }
}
