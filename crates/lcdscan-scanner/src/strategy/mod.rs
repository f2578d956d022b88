//! Discovery strategies.
//!
//! Each strategy is an independent procedure that turns the fetch capability
//! into a stream of validated records, tagged with its own [`StrategyKind`]
//! for provenance.

mod harvest;
mod range_probe;
mod seeded;

pub use harvest::{extract_links, HarvestedLink, LinkHarvest, PageLinks};
pub use range_probe::RangeProbe;
pub use seeded::SeededValidation;

use crate::error::Result;
use crate::probe::{ProbeContext, ProbeOutcome, ProbeStats};
use async_trait::async_trait;
use lcdscan_core::{AppConfig, PolicyRecord, StrategyKind};

/// A discovery procedure run against the shared probe context.
#[async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    /// Provenance name for records this strategy emits.
    fn kind(&self) -> StrategyKind;

    /// Check the strategy's parameters before any probing begins.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Run the strategy, pushing records into `sink` as they are found.
    ///
    /// On error the records already pushed are kept and still merged.
    async fn discover(&self, ctx: &ProbeContext, sink: &mut RecordSink) -> Result<()>;
}

/// Collects a strategy's records and probe counters.
#[derive(Debug, Default)]
pub struct RecordSink {
    records: Vec<PolicyRecord>,
    stats: ProbeStats,
}

impl RecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: PolicyRecord) {
        self.records.push(record);
    }

    /// Count a probe outcome, keeping its record when the page was valid.
    pub fn record_outcome(&mut self, outcome: ProbeOutcome) {
        self.stats.record(&outcome);
        if let Some(record) = outcome.into_record() {
            self.push(record);
        }
    }

    pub fn extend_stats(&mut self, stats: ProbeStats) {
        self.stats += stats;
    }

    pub fn records(&self) -> &[PolicyRecord] {
        &self.records
    }

    pub fn stats(&self) -> &ProbeStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_parts(self) -> (Vec<PolicyRecord>, ProbeStats) {
        (self.records, self.stats)
    }
}

/// Build the strategy for `kind` from configuration.
///
/// In sample mode refinement is disabled and pagination is limited to the
/// first page of each index.
pub fn build_strategy(
    kind: StrategyKind,
    config: &AppConfig,
    sample: bool,
) -> Result<Box<dyn DiscoveryStrategy>> {
    let strategy: Box<dyn DiscoveryStrategy> = match kind {
        StrategyKind::SeededValidation => Box::new(SeededValidation::from_ids(
            &config.strategies.seeded_ids,
        )?),
        StrategyKind::LinkHarvest => {
            let mut harvest = config.strategies.link_harvest.clone();
            if sample {
                harvest.max_pages = 1;
            }
            Box::new(LinkHarvest::new(harvest))
        }
        StrategyKind::RangeProbe => {
            let mut refine = config.refine.clone();
            if sample {
                refine.max_depth = 0;
            }
            Box::new(RangeProbe::new(
                config.strategies.range_probe.ranges.clone(),
                refine,
            ))
        }
    };
    Ok(strategy)
}
