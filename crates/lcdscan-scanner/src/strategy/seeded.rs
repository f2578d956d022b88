use super::{DiscoveryStrategy, RecordSink};
use crate::error::{Result, ScanError};
use crate::probe::ProbeContext;
use async_trait::async_trait;
use futures::StreamExt;
use lcdscan_core::{ConfigError, PolicyId, StrategyKind};
use std::pin::pin;

/// Re-validates a fixed list of previously confirmed identifiers.
#[derive(Debug, Clone)]
pub struct SeededValidation {
    ids: Vec<PolicyId>,
}

impl SeededValidation {
    pub fn new(ids: Vec<PolicyId>) -> Self {
        Self { ids }
    }

    /// Build from raw configured values, rejecting zero.
    pub fn from_ids(raw: &[u64]) -> Result<Self> {
        let ids = raw
            .iter()
            .map(|&value| {
                PolicyId::new(value).map_err(|e| {
                    ScanError::Config(ConfigError::InvalidValue {
                        field: "strategies.seeded_ids".to_string(),
                        reason: e.to_string(),
                    })
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(ids))
    }

    pub fn ids(&self) -> &[PolicyId] {
        &self.ids
    }
}

#[async_trait]
impl DiscoveryStrategy for SeededValidation {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SeededValidation
    }

    async fn discover(&self, ctx: &ProbeContext, sink: &mut RecordSink) -> Result<()> {
        tracing::info!(count = self.ids.len(), "validating seeded identifiers");

        let mut outcomes = pin!(ctx.probe_stream(self.ids.iter().copied(), self.kind()));
        while let Some(outcome) = outcomes.next().await {
            sink.record_outcome(outcome);
        }

        if ctx.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        Ok(())
    }
}
