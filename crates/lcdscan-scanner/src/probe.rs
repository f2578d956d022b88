//! Single-identifier probing under shared throttling and cancellation.
//!
//! A [`ProbeContext`] bundles everything a strategy needs to turn an
//! identifier into an outcome: the fetch capability, the classifier, the
//! run-wide processed set, the concurrency semaphore and the cancellation
//! token. It is cheap to clone and every clone shares the same state.

use crate::classifier::{Classification, PageClassifier};
use crate::error::{Result, ScanError};
use crate::processed::ProcessedSet;
use futures::stream::{self, Stream, StreamExt};
use lcdscan_browser::{FetchError, PageContent, PageFetcher};
use lcdscan_core::{AppConfig, PolicyId, PolicyRecord, SourceConfig, StrategyKind};
use std::ops::AddAssign;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Result of probing one identifier.
#[derive(Debug)]
pub enum ProbeOutcome {
    Found(PolicyRecord),
    NotFound(PolicyId),
    Ambiguous { id: PolicyId, reason: String },
    /// Retries were exhausted; the identifier is released for later probes.
    FetchFailed { id: PolicyId, error: FetchError },
    AlreadyProcessed(PolicyId),
    Cancelled(PolicyId),
}

impl ProbeOutcome {
    pub fn id(&self) -> PolicyId {
        match self {
            Self::Found(record) => record.id,
            Self::NotFound(id)
            | Self::AlreadyProcessed(id)
            | Self::Cancelled(id)
            | Self::Ambiguous { id, .. }
            | Self::FetchFailed { id, .. } => *id,
        }
    }

    pub fn into_record(self) -> Option<PolicyRecord> {
        match self {
            Self::Found(record) => Some(record),
            _ => None,
        }
    }
}

/// Counters over a set of probe outcomes.
///
/// `probed` counts pages that were fetched and classified. Fetch failures,
/// skipped identifiers and cancellations are tracked separately and never
/// enter the hit rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeStats {
    pub probed: usize,
    pub hits: usize,
    pub not_found: usize,
    pub ambiguous: usize,
    pub fetch_errors: usize,
    pub already_processed: usize,
    pub cancelled: usize,
}

impl ProbeStats {
    pub fn record(&mut self, outcome: &ProbeOutcome) {
        match outcome {
            ProbeOutcome::Found(_) => {
                self.probed += 1;
                self.hits += 1;
            }
            ProbeOutcome::NotFound(_) => {
                self.probed += 1;
                self.not_found += 1;
            }
            ProbeOutcome::Ambiguous { .. } => {
                self.probed += 1;
                self.ambiguous += 1;
            }
            ProbeOutcome::FetchFailed { .. } => self.fetch_errors += 1,
            ProbeOutcome::AlreadyProcessed(_) => self.already_processed += 1,
            ProbeOutcome::Cancelled(_) => self.cancelled += 1,
        }
    }

    /// Hits divided by classified pages; `None` before anything was classified.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> Option<f64> {
        (self.probed > 0).then(|| self.hits as f64 / self.probed as f64)
    }

    pub fn attempted(&self) -> usize {
        self.probed + self.fetch_errors
    }
}

impl AddAssign for ProbeStats {
    fn add_assign(&mut self, other: Self) {
        self.probed += other.probed;
        self.hits += other.hits;
        self.not_found += other.not_found;
        self.ambiguous += other.ambiguous;
        self.fetch_errors += other.fetch_errors;
        self.already_processed += other.already_processed;
        self.cancelled += other.cancelled;
    }
}

#[derive(Clone)]
pub struct ProbeContext {
    fetcher: Arc<dyn PageFetcher>,
    classifier: Arc<PageClassifier>,
    source: Arc<SourceConfig>,
    processed: ProcessedSet,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    timeout: Duration,
    min_delay: Duration,
    concurrency: usize,
}

impl ProbeContext {
    const DEFAULT_CONCURRENCY: usize = 4;

    /// Create a context with default concurrency and no inter-probe delay.
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        classifier: PageClassifier,
        source: SourceConfig,
    ) -> Self {
        Self {
            fetcher,
            classifier: Arc::new(classifier),
            source: Arc::new(source),
            processed: ProcessedSet::new(),
            permits: Arc::new(Semaphore::new(Self::DEFAULT_CONCURRENCY)),
            cancel: CancellationToken::new(),
            timeout: Duration::from_secs(12),
            min_delay: Duration::ZERO,
            concurrency: Self::DEFAULT_CONCURRENCY,
        }
    }

    /// Build a context from application configuration.
    pub fn from_config(config: &AppConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        let classifier = PageClassifier::new(&config.classifier)?;
        Ok(Self::new(fetcher, classifier, config.source.clone())
            .with_concurrency(config.fetch.concurrency)
            .with_min_delay(config.fetch.min_probe_delay())
            .with_timeout(config.fetch.timeout()))
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        self.permits = Arc::new(Semaphore::new(concurrency));
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn with_processed(mut self, processed: ProcessedSet) -> Self {
        self.processed = processed;
        self
    }

    pub fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    /// Fetch a page under the shared semaphore.
    ///
    /// The permit is held for the fetch and the minimum inter-request delay,
    /// which bounds the aggregate request rate across all strategies.
    pub async fn fetch(&self, url: &str) -> Result<PageContent> {
        let _permit = tokio::select! {
            () = self.cancel.cancelled() => return Err(ScanError::Cancelled),
            permit = self.permits.acquire() => permit.map_err(|_| ScanError::Cancelled)?,
        };

        let page = tokio::select! {
            () = self.cancel.cancelled() => return Err(ScanError::Cancelled),
            result = self.fetcher.fetch_page(url, self.timeout) => result?,
        };

        if !self.min_delay.is_zero() {
            tokio::select! {
                () = self.cancel.cancelled() => {}
                () = tokio::time::sleep(self.min_delay) => {}
            }
        }

        Ok(page)
    }

    /// Fetch and classify one identifier.
    pub async fn probe(&self, id: PolicyId, strategy: StrategyKind) -> ProbeOutcome {
        if self.cancel.is_cancelled() {
            return ProbeOutcome::Cancelled(id);
        }
        if !self.processed.claim(id) {
            return ProbeOutcome::AlreadyProcessed(id);
        }

        let url = self.source.record_url(id);
        let page = match self.fetch(&url).await {
            Ok(page) => page,
            Err(ScanError::Fetch(error)) => {
                self.processed.release(id);
                tracing::warn!(policy_id = %id, error = %error, "probe failed after retries, skipping");
                return ProbeOutcome::FetchFailed { id, error };
            }
            Err(_) => {
                self.processed.release(id);
                return ProbeOutcome::Cancelled(id);
            }
        };

        match self.classifier.classify_page(id, &page) {
            Classification::Valid(found) => {
                tracing::info!(policy_id = %id, doc_id = %found.doc_id, title = %found.title, "found policy");
                ProbeOutcome::Found(found.into_record(url, strategy))
            }
            Classification::NotFound => ProbeOutcome::NotFound(id),
            Classification::Ambiguous(reason) => {
                tracing::debug!(policy_id = %id, reason = %reason, "ambiguous page");
                ProbeOutcome::Ambiguous { id, reason }
            }
        }
    }

    /// Probe identifiers with at most `concurrency` in flight.
    ///
    /// Outcomes arrive in completion order. Once cancellation is requested
    /// no further identifiers are started.
    pub fn probe_stream<'a, I>(
        &'a self,
        ids: I,
        strategy: StrategyKind,
    ) -> impl Stream<Item = ProbeOutcome> + Send + 'a
    where
        I: IntoIterator<Item = PolicyId>,
        I::IntoIter: Send + 'a,
    {
        let cancel = self.cancel.clone();
        stream::iter(ids.into_iter().take_while(move |_| !cancel.is_cancelled()))
            .map(move |id| self.probe(id, strategy))
            .buffer_unordered(self.concurrency)
    }
}
