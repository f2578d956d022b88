//! Catalog assembly.
//!
//! Merging is a pure function of the strategy outputs: the first record seen
//! for an identifier, in strategy order, wins; later duplicates are dropped
//! and counted. The surviving records are sorted by numeric identifier.

use lcdscan_core::{PolicyId, PolicyRecord, StrategyKind, Timestamp};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Records emitted by one strategy, in emission order.
#[derive(Debug, Clone)]
pub struct StrategyBatch {
    pub strategy: StrategyKind,
    pub records: Vec<PolicyRecord>,
}

impl StrategyBatch {
    pub fn new(strategy: StrategyKind, records: Vec<PolicyRecord>) -> Self {
        Self { strategy, records }
    }
}

/// The deduplicated, sorted result of a discovery run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    search_date: Timestamp,
    policies: Vec<PolicyRecord>,
    strategy_breakdown: BTreeMap<StrategyKind, usize>,
}

impl Catalog {
    pub fn search_date(&self) -> Timestamp {
        self.search_date
    }

    /// Records in ascending identifier order.
    pub fn policies(&self) -> &[PolicyRecord] {
        &self.policies
    }

    pub fn total(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Surviving records credited to each strategy that contributed a batch.
    pub fn strategy_breakdown(&self) -> &BTreeMap<StrategyKind, usize> {
        &self.strategy_breakdown
    }

    pub fn get(&self, id: PolicyId) -> Option<&PolicyRecord> {
        self.policies
            .binary_search_by_key(&id, |record| record.id)
            .ok()
            .map(|index| &self.policies[index])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub catalog: Catalog,
    pub duplicates_dropped: usize,
}

pub struct CatalogMerger;

impl CatalogMerger {
    pub fn merge(batches: Vec<StrategyBatch>, search_date: Timestamp) -> MergeOutcome {
        let mut seen = HashSet::new();
        let mut policies = Vec::new();
        let mut strategy_breakdown = BTreeMap::new();
        let mut duplicates_dropped = 0;

        for batch in batches {
            let credited = strategy_breakdown.entry(batch.strategy).or_insert(0);
            for mut record in batch.records {
                if seen.insert(record.id) {
                    // The batch names the strategy that ran.
                    record.strategy = batch.strategy;
                    *credited += 1;
                    policies.push(record);
                } else {
                    duplicates_dropped += 1;
                }
            }
        }

        policies.sort_by_key(|record| record.id);

        if duplicates_dropped > 0 {
            tracing::debug!(duplicates_dropped, "dropped duplicate records during merge");
        }

        MergeOutcome {
            catalog: Catalog {
                search_date,
                policies,
                strategy_breakdown,
            },
            duplicates_dropped,
        }
    }
}
