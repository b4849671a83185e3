//! Strategy packages submitted for approval and execution.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::StrategyId;

/// Declared risk appetite of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Lifecycle status of a strategy package.
///
/// Strategies are soft-deleted: `Deleted` is a status, never a removed row,
/// so assessments and orders keep a valid reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyStatus {
    Pending,
    Approved,
    Rejected,
    Active,
    Paused,
    Deleted,
}

impl StrategyStatus {
    /// Stable name used in logs and bus payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Deleted => "deleted",
        }
    }

    /// Whether new orders may be created against this strategy.
    #[must_use]
    pub const fn accepts_orders(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A strategy package as submitted by a strategy author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyPackage {
    pub id: StrategyId,
    pub name: String,
    pub risk_level: RiskLevel,
    pub status: StrategyStatus,
    /// Maximum size of a single position, in quote currency.
    pub max_position_size: Decimal,
    /// Annualized expected return declared by the author (e.g. 0.12 = 12%).
    pub expected_return: Decimal,
    pub stop_loss_pct: Decimal,
    pub take_profit_pct: Decimal,
    pub created_at: DateTime<Utc>,
}

impl StrategyPackage {
    /// Create a new strategy in `Pending` status.
    #[must_use]
    pub fn new(
        id: StrategyId,
        name: impl Into<String>,
        risk_level: RiskLevel,
        max_position_size: Decimal,
        expected_return: Decimal,
        stop_loss_pct: Decimal,
        take_profit_pct: Decimal,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            risk_level,
            status: StrategyStatus::Pending,
            max_position_size,
            expected_return,
            stop_loss_pct,
            take_profit_pct,
            created_at: Utc::now(),
        }
    }
}
