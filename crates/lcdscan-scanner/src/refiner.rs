//! Density-adaptive refinement.
//!
//! A coarse pass over a range samples one identifier per stride. When the
//! fraction of valid pages in that pass exceeds the density threshold, the
//! same span is scanned again at a finer stride. Identifiers probed by an
//! earlier pass are skipped through the shared processed set, so each level
//! only fetches the gaps.
//!
//! Refinement stops when the pass is sparse, when the stride reaches 1 or
//! already covers the whole span, or when the maximum depth is reached.

use crate::probe::{ProbeContext, ProbeStats};
use crate::range::SearchRange;
use crate::scanner::RangeScanner;
use lcdscan_core::{PolicyRecord, RefineConfig, StrategyKind};

/// One scan pass in a refinement chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinementLevel {
    pub depth: u32,
    pub range: SearchRange,
    pub stats: ProbeStats,
}

#[derive(Debug, Default)]
pub struct RefineOutcome {
    /// Records from every level, sorted by identifier.
    pub records: Vec<PolicyRecord>,
    pub levels: Vec<RefinementLevel>,
}

impl RefineOutcome {
    pub fn stats(&self) -> ProbeStats {
        let mut total = ProbeStats::default();
        for level in &self.levels {
            total += level.stats;
        }
        total
    }
}

pub struct DensityRefiner<'a> {
    scanner: RangeScanner<'a>,
    ctx: &'a ProbeContext,
    config: RefineConfig,
}

impl<'a> DensityRefiner<'a> {
    pub fn new(ctx: &'a ProbeContext, config: RefineConfig, strategy: StrategyKind) -> Self {
        Self {
            scanner: RangeScanner::new(ctx, strategy),
            ctx,
            config,
        }
    }

    pub async fn refine(&self, range: SearchRange) -> RefineOutcome {
        self.refine_from(range, 0).await
    }

    /// Scan `range` at `depth`, then keep refining while the pass is dense.
    pub async fn refine_from(&self, range: SearchRange, depth: u32) -> RefineOutcome {
        let mut outcome = RefineOutcome::default();
        let mut current = range;
        let mut depth = depth;

        loop {
            let pass = self.scanner.scan(&current).await;
            outcome.records.extend(pass.records);
            outcome.levels.push(RefinementLevel {
                depth,
                range: current,
                stats: pass.stats,
            });

            if self.ctx.is_cancelled() || !should_refine(&pass.stats, depth, &self.config) {
                break;
            }
            let Some(finer) = current.refined(self.config.refinement_factor) else {
                break;
            };

            tracing::info!(
                range = %current,
                hits = pass.stats.hits,
                probed = pass.stats.probed,
                next_stride = finer.stride(),
                depth = depth + 1,
                "dense range, refining"
            );
            current = finer;
            depth += 1;
        }

        outcome.records.sort_by_key(|record| record.id);
        outcome
    }
}

/// Whether a pass is dense enough to refine further.
///
/// A pass with nothing classified never refines.
pub fn should_refine(stats: &ProbeStats, depth: u32, config: &RefineConfig) -> bool {
    if depth >= config.max_depth {
        return false;
    }
    stats
        .hit_rate()
        .is_some_and(|rate| rate > config.density_threshold)
}
