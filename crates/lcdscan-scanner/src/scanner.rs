use crate::probe::{ProbeContext, ProbeStats};
use crate::range::SearchRange;
use futures::StreamExt;
use lcdscan_core::{PolicyRecord, StrategyKind};
use std::pin::pin;

const PROGRESS_INTERVAL: usize = 20;

/// Records and counters from one pass over a range.
#[derive(Debug, Default)]
pub struct RangeScan {
    pub records: Vec<PolicyRecord>,
    pub stats: ProbeStats,
}

/// Probes every candidate of a range once.
pub struct RangeScanner<'a> {
    ctx: &'a ProbeContext,
    strategy: StrategyKind,
}

impl<'a> RangeScanner<'a> {
    pub fn new(ctx: &'a ProbeContext, strategy: StrategyKind) -> Self {
        Self { ctx, strategy }
    }

    /// Scan `range`, returning records sorted by identifier.
    ///
    /// Identifiers already claimed elsewhere in the run are skipped and
    /// counted, never fetched. Fetch failures are counted and do not stop
    /// the pass.
    pub async fn scan(&self, range: &SearchRange) -> RangeScan {
        tracing::debug!(%range, candidates = range.len(), strategy = %self.strategy, "scanning range");

        let mut result = RangeScan::default();
        let mut outcomes = pin!(self.ctx.probe_stream(range.candidates(), self.strategy));
        let mut seen = 0usize;

        while let Some(outcome) = outcomes.next().await {
            result.stats.record(&outcome);
            seen += 1;
            if seen % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    %range,
                    progress = seen,
                    total = range.len(),
                    hits = result.stats.hits,
                    "range scan progress"
                );
            }
            if let Some(record) = outcome.into_record() {
                result.records.push(record);
            }
        }

        result.records.sort_by_key(|record| record.id);
        result
    }
}
