//! Discovery run orchestration.
//!
//! The `DiscoveryOrchestrator` runs the enabled strategies against one shared
//! probe context and hands their outputs to the merger. Seeded validation
//! runs first so the processed set is primed with known identifiers; the
//! remaining strategies then run concurrently. A failing strategy never
//! aborts the run: its partial records are merged and the failure is
//! reported.

use crate::error::Result;
use crate::merger::{Catalog, CatalogMerger, StrategyBatch};
use crate::probe::{ProbeContext, ProbeStats};
use crate::strategy::{build_strategy, DiscoveryStrategy, RecordSink};
use futures::future::join_all;
use lcdscan_core::{AppConfig, StrategyKind, Timestamp};

/// Outcome of one strategy within a run.
#[derive(Debug, Clone)]
pub struct StrategyReport {
    /// Strategy that produced this report
    pub strategy: StrategyKind,
    /// Probe counters accumulated by the strategy
    pub stats: ProbeStats,
    /// Records emitted, before deduplication
    pub records: usize,
    /// Error message if the strategy aborted
    pub failure: Option<String>,
    /// Whether the strategy stopped because the run was cancelled
    pub cancelled: bool,
}

impl StrategyReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none() && !self.cancelled
    }
}

/// Everything a run produced: the catalog plus per-strategy diagnostics.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub catalog: Catalog,
    /// Reports in configured strategy order
    pub reports: Vec<StrategyReport>,
    pub duplicates_dropped: usize,
    pub cancelled: bool,
}

impl RunSummary {
    /// Names of the strategies that ran, in order.
    pub fn strategies(&self) -> Vec<StrategyKind> {
        self.reports.iter().map(|report| report.strategy).collect()
    }

    pub fn report(&self, strategy: StrategyKind) -> Option<&StrategyReport> {
        self.reports.iter().find(|report| report.strategy == strategy)
    }
}

pub struct DiscoveryOrchestrator {
    ctx: ProbeContext,
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
}

impl DiscoveryOrchestrator {
    /// Create an orchestrator with no strategies.
    #[must_use]
    pub fn new(ctx: ProbeContext) -> Self {
        Self {
            ctx,
            strategies: Vec::new(),
        }
    }

    /// Build the enabled strategies from configuration, in configured order.
    ///
    /// A strategy listed more than once runs once, at its first position.
    pub fn from_config(config: &AppConfig, ctx: ProbeContext, sample: bool) -> Result<Self> {
        let mut orchestrator = Self::new(ctx);
        let mut kinds: Vec<StrategyKind> = Vec::new();
        for kind in &config.strategies.enabled {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        for kind in kinds {
            orchestrator = orchestrator.with_boxed(build_strategy(kind, config, sample)?);
        }
        Ok(orchestrator)
    }

    /// Append a strategy; merge priority follows insertion order.
    #[must_use]
    pub fn with_strategy<S: DiscoveryStrategy + 'static>(self, strategy: S) -> Self {
        self.with_boxed(Box::new(strategy))
    }

    #[must_use]
    pub fn with_boxed(mut self, strategy: Box<dyn DiscoveryStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn strategies(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    pub fn context(&self) -> &ProbeContext {
        &self.ctx
    }

    /// Check every strategy's parameters. Intended to run before any probing.
    pub fn validate(&self) -> Result<()> {
        for strategy in &self.strategies {
            strategy.validate()?;
        }
        Ok(())
    }

    /// Execute all strategies and merge their outputs.
    pub async fn run(&self) -> RunSummary {
        let search_date = Timestamp::now();
        tracing::info!(strategies = ?self.strategies(), "starting discovery run");

        let mut outcomes: Vec<Option<(StrategyBatch, StrategyReport)>> =
            self.strategies.iter().map(|_| None).collect();

        for (index, strategy) in self.strategies.iter().enumerate() {
            if strategy.kind() == StrategyKind::SeededValidation {
                outcomes[index] = Some(self.run_strategy(strategy.as_ref()).await);
            }
        }

        let concurrent = self
            .strategies
            .iter()
            .enumerate()
            .filter(|(_, strategy)| strategy.kind() != StrategyKind::SeededValidation)
            .map(|(index, strategy)| async move {
                (index, self.run_strategy(strategy.as_ref()).await)
            });
        for (index, outcome) in join_all(concurrent).await {
            outcomes[index] = Some(outcome);
        }

        let (batches, reports): (Vec<_>, Vec<_>) = outcomes.into_iter().flatten().unzip();
        let merged = CatalogMerger::merge(batches, search_date);

        let summary = RunSummary {
            catalog: merged.catalog,
            reports,
            duplicates_dropped: merged.duplicates_dropped,
            cancelled: self.ctx.is_cancelled(),
        };

        tracing::info!(
            total = summary.catalog.total(),
            duplicates_dropped = summary.duplicates_dropped,
            cancelled = summary.cancelled,
            "discovery run complete"
        );
        summary
    }

    async fn run_strategy(&self, strategy: &dyn DiscoveryStrategy) -> (StrategyBatch, StrategyReport) {
        let kind = strategy.kind();
        tracing::info!(strategy = %kind, "starting strategy");

        let mut sink = RecordSink::new();
        let result = match strategy.validate() {
            Ok(()) => strategy.discover(&self.ctx, &mut sink).await,
            Err(e) => Err(e),
        };
        let (records, stats) = sink.into_parts();

        let (failure, cancelled) = match result {
            Ok(()) => (None, false),
            Err(e) if e.is_cancelled() => {
                tracing::warn!(strategy = %kind, records = records.len(), "strategy cancelled");
                (None, true)
            }
            Err(e) => {
                tracing::error!(strategy = %kind, records = records.len(), error = %e, "strategy failed");
                (Some(e.to_string()), false)
            }
        };

        tracing::info!(
            strategy = %kind,
            records = records.len(),
            probed = stats.probed,
            not_found = stats.not_found,
            ambiguous = stats.ambiguous,
            fetch_errors = stats.fetch_errors,
            skipped = stats.already_processed,
            "strategy finished"
        );

        let report = StrategyReport {
            strategy: kind,
            stats,
            records: records.len(),
            failure,
            cancelled,
        };
        (StrategyBatch::new(kind, records), report)
    }
}
