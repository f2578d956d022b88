use super::{DiscoveryStrategy, RecordSink};
use crate::error::{Result, ScanError};
use crate::probe::ProbeContext;
use crate::range::SearchRange;
use crate::refiner::DensityRefiner;
use async_trait::async_trait;
use lcdscan_core::{RangeSpec, RefineConfig, StrategyKind};

/// Probes configured identifier ranges through the density-adaptive refiner.
#[derive(Debug, Clone)]
pub struct RangeProbe {
    ranges: Vec<RangeSpec>,
    refine: RefineConfig,
}

impl RangeProbe {
    pub fn new(ranges: Vec<RangeSpec>, refine: RefineConfig) -> Self {
        Self { ranges, refine }
    }

    fn search_ranges(&self) -> Result<Vec<SearchRange>> {
        self.ranges.iter().map(SearchRange::try_from).collect()
    }
}

#[async_trait]
impl DiscoveryStrategy for RangeProbe {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RangeProbe
    }

    fn validate(&self) -> Result<()> {
        self.search_ranges().map(|_| ())
    }

    async fn discover(&self, ctx: &ProbeContext, sink: &mut RecordSink) -> Result<()> {
        let ranges = self.search_ranges()?;
        let refiner = DensityRefiner::new(ctx, self.refine.clone(), self.kind());

        for (index, range) in ranges.into_iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            tracing::info!(range = %range, index = index + 1, total = self.ranges.len(), "probing range");

            let outcome = refiner.refine(range).await;
            let stats = outcome.stats();
            tracing::info!(
                range = %range,
                levels = outcome.levels.len(),
                probed = stats.probed,
                found = stats.hits,
                fetch_errors = stats.fetch_errors,
                "range complete"
            );

            sink.extend_stats(stats);
            for record in outcome.records {
                sink.push(record);
            }
        }

        if ctx.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        Ok(())
    }
}
