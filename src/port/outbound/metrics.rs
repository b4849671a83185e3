//! Metrics provider port.

use async_trait::async_trait;

use crate::domain::{StrategyPackage, StrategyRiskMetrics};
use crate::error::StoreError;

/// Computes a strategy's current risk metrics from live order and position
/// data. Returns `None` when no usable data exists for the strategy.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn metrics_for(
        &self,
        strategy: &StrategyPackage,
    ) -> Result<Option<StrategyRiskMetrics>, StoreError>;
}
