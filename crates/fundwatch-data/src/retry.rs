//! Retry policy and the paginating, retrying source.
//!
//! [`RetryingSource`] is the only place transient vendor failures are
//! absorbed. It drives a [`PagedSource`] page by page, retrying each page
//! request under a [`RetryPolicy`], and stops when:
//! - a newest-first page lies entirely at or before `since`
//! - a page is shorter than the nominal page size or reports no more pages
//! - the page ceiling is reached (partial result, logged)

use async_trait::async_trait;
use chrono::NaiveDate;
use fundwatch_core::error::FetchError;
use fundwatch_core::traits::{PageOrder, PagedSource, SeriesPage, SeriesSource};
use fundwatch_core::types::{InstrumentId, SeriesPoint};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Delay growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    Fixed,
    #[default]
    Exponential,
}

/// Bounded retry with fixed or exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first, at least 1
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(8000),
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after the `failed`-th failed attempt (1-based).
    pub fn delay_for(&self, failed: u32) -> Duration {
        let delay = match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential => {
                let factor = 2u32.saturating_pow(failed.saturating_sub(1));
                self.base_delay.saturating_mul(factor)
            }
        };
        delay.min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails terminally, or attempts run out.
    ///
    /// Terminal errors are returned as-is. Exhaustion yields
    /// [`FetchError::RetriesExhausted`] wrapping the last error. A rate-limit
    /// hint stretches the wait, still capped at `max_delay`.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_transient() {
                return Err(err);
            }
            if attempt >= attempts {
                return Err(FetchError::RetriesExhausted {
                    attempts,
                    last: Box::new(err),
                });
            }

            let mut delay = self.delay_for(attempt);
            if let FetchError::RateLimited { retry_after_secs } = &err {
                delay = delay
                    .max(Duration::from_secs(*retry_after_secs))
                    .min(self.max_delay);
            }
            debug!(attempt, error = %err, delay_ms = delay.as_millis() as u64, "Retrying");
            tokio::time::sleep(delay).await;
        }
    }
}

/// Incremental fetch over a paged adapter.
pub struct RetryingSource<P> {
    inner: P,
    policy: RetryPolicy,
    max_pages: usize,
}

impl<P: PagedSource> RetryingSource<P> {
    pub fn new(inner: P, policy: RetryPolicy, max_pages: usize) -> Self {
        Self {
            inner,
            policy,
            max_pages: max_pages.max(1),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    async fn fetch_page(
        &self,
        instrument: &InstrumentId,
        page_index: usize,
    ) -> Result<SeriesPage, FetchError> {
        self.policy
            .run(|| self.inner.fetch_page(instrument, page_index))
            .await
    }
}

#[async_trait]
impl<P: PagedSource> SeriesSource for RetryingSource<P> {
    async fn fetch_since(
        &self,
        instrument: &InstrumentId,
        since: Option<NaiveDate>,
    ) -> Result<Vec<SeriesPoint>, FetchError> {
        let newer = |p: &SeriesPoint| since.map_or(true, |s| p.date > s);
        let mut collected = Vec::new();

        for page_index in 0..self.max_pages {
            let page = self.fetch_page(instrument, page_index).await?;
            let page_len = page.points.len();

            let reached_since = self.inner.order() == PageOrder::NewestFirst
                && since.is_some()
                && page_len > 0
                && !page.points.iter().any(|p| newer(p));

            collected.extend(
                page.points
                    .into_iter()
                    .filter(|p| p.is_valid() && newer(p)),
            );

            if reached_since || page_len == 0 || page_len < self.inner.page_size() || !page.has_more
            {
                debug!(
                    code = %instrument,
                    source = self.inner.name(),
                    pages = page_index + 1,
                    rows = collected.len(),
                    "Fetch complete"
                );
                return Ok(collected);
            }
        }

        warn!(
            code = %instrument,
            source = self.inner.name(),
            max_pages = self.max_pages,
            rows = collected.len(),
            "Page ceiling reached, returning partial history"
        );
        Ok(collected)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
