//! Retry policy applied uniformly at the fetch boundary.
//!
//! Scanner and strategy code never retries on its own: it wraps its fetcher
//! in a [`RetryingFetcher`] and treats whatever error comes back as final.

use crate::error::{FetchError, Result};
use crate::fetcher::{PageContent, PageFetcher};
use lcdscan_core::FetchConfig;
use std::time::Duration;

/// Bounded attempts with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts per URL, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Growth factor between consecutive retries
    pub multiplier: u32,
    /// Upper bound on a single delay
    pub max_delay: Duration,
    /// Extra factor applied when the remote signalled rate limiting
    pub rate_limit_multiplier: u32,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_backoff_ms),
            multiplier: config.backoff_multiplier.max(1),
            max_delay: Duration::from_millis(config.max_backoff_ms),
            rate_limit_multiplier: config.rate_limit_multiplier.max(1),
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            multiplier: 1,
            max_delay: Duration::ZERO,
            rate_limit_multiplier: 1,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (zero-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32, error: &FetchError) -> Duration {
        let growth = self.multiplier.saturating_pow(attempt);
        let mut delay = self.base_delay.saturating_mul(growth);
        if error.is_rate_limited() {
            delay = delay.saturating_mul(self.rate_limit_multiplier);
        }
        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// A `PageFetcher` that retries transient failures of its inner fetcher.
pub struct RetryingFetcher<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F: PageFetcher> RetryingFetcher<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait::async_trait]
impl<F: PageFetcher> PageFetcher for RetryingFetcher<F> {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<PageContent> {
        let mut attempt = 0;

        loop {
            match self.inner.fetch_page(url, timeout).await {
                Ok(page) => return Ok(page),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    if attempt + 1 >= self.policy.max_attempts {
                        tracing::warn!(
                            url,
                            attempts = attempt + 1,
                            "giving up after transient failures: {}",
                            e
                        );
                        return Err(e);
                    }

                    let delay = self.policy.delay_for(attempt, &e);
                    tracing::warn!(
                        "Fetch failed for {} (attempt {}/{}), retrying in {:?}: {}",
                        url,
                        attempt + 1,
                        self.policy.max_attempts,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
