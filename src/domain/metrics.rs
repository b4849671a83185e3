//! Derived per-strategy risk metrics.
//!
//! Never persisted as their own entity: computed on demand from live order
//! and position data and cached with a short TTL.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Snapshot of a strategy's current exposure and performance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRiskMetrics {
    /// Capital utilization in [0, 1+]: exposure over allocated capital.
    pub utilization_ratio: f64,
    pub current_exposure: Decimal,
    pub long_exposure: Decimal,
    pub short_exposure: Decimal,
    pub unrealized_pnl: Decimal,
    /// Largest single open position, in quote currency.
    pub max_single_position: Decimal,
    /// Fraction of orders that completed successfully, in [0, 1].
    pub order_success_rate: f64,
    pub rejection_rate: f64,
    /// Fraction of recent orders that filled, in [0, 1].
    pub recent_fill_rate: f64,
    /// Standard deviation of recent fill-price returns.
    pub fill_return_stddev: f64,
    pub sortino_ratio: f64,
    /// Realized loss today, as a positive number.
    pub daily_loss: Decimal,
    /// Cumulative realized loss, as a positive number.
    pub total_loss: Decimal,
}

impl Default for StrategyRiskMetrics {
    fn default() -> Self {
        Self {
            utilization_ratio: 0.0,
            current_exposure: Decimal::ZERO,
            long_exposure: Decimal::ZERO,
            short_exposure: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            max_single_position: Decimal::ZERO,
            order_success_rate: 1.0,
            rejection_rate: 0.0,
            recent_fill_rate: 1.0,
            fill_return_stddev: 0.0,
            sortino_ratio: 0.0,
            daily_loss: Decimal::ZERO,
            total_loss: Decimal::ZERO,
        }
    }
}
