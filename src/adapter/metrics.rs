//! Metrics provider backed by externally supplied snapshots.
//!
//! The live order/position data that metrics derive from belongs to the
//! persistence collaborator; this adapter holds whatever snapshot that
//! collaborator last pushed. Tests drive it directly.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{StrategyId, StrategyPackage, StrategyRiskMetrics};
use crate::error::StoreError;
use crate::port::outbound::MetricsProvider;

#[derive(Default)]
pub struct SnapshotMetricsProvider {
    snapshots: DashMap<StrategyId, StrategyRiskMetrics>,
}

impl SnapshotMetricsProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot for a strategy.
    pub fn put(&self, strategy_id: StrategyId, metrics: StrategyRiskMetrics) {
        self.snapshots.insert(strategy_id, metrics);
    }

    /// Drop the snapshot for a strategy, making its metrics unavailable.
    pub fn clear(&self, strategy_id: &StrategyId) {
        self.snapshots.remove(strategy_id);
    }
}

#[async_trait]
impl MetricsProvider for SnapshotMetricsProvider {
    async fn metrics_for(
        &self,
        strategy: &StrategyPackage,
    ) -> Result<Option<StrategyRiskMetrics>, StoreError> {
        Ok(self.snapshots.get(&strategy.id).map(|m| m.clone()))
    }
}
