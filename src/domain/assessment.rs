//! Risk assessment records.
//!
//! Assessments are immutable once created. Every re-assessment is a new
//! record; "latest" is resolved by the most recent `created_at` per strategy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{AssessmentId, StrategyId};

/// When in the trade lifecycle an assessment was performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    PreTrade,
    RealTime,
    PostTrade,
}

/// Outcome of an assessment, derived from the risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentResult {
    Approved,
    Conditional,
    Rejected,
}

/// Risk tier derived from the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    /// Tier boundaries are inclusive at the lower bound.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Self::Critical,
            70..=89 => Self::High,
            50..=69 => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Map a tier to the assessment outcome.
    #[must_use]
    pub const fn to_result(self) -> AssessmentResult {
        match self {
            Self::Low => AssessmentResult::Approved,
            Self::Medium => AssessmentResult::Conditional,
            Self::High | Self::Critical => AssessmentResult::Rejected,
        }
    }
}

/// The nine weighted component scores, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RiskSubscores {
    pub position_size: f64,
    pub volatility: f64,
    pub correlation: f64,
    pub liquidity: f64,
    pub drawdown: f64,
    pub sharpe: f64,
    pub order_success: f64,
    pub risk_adjusted_return: f64,
    pub operational: f64,
}

/// A persisted risk assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub id: AssessmentId,
    pub strategy_id: StrategyId,
    pub assessment_type: AssessmentType,
    /// Total score in [0, 100].
    pub risk_score: u8,
    pub subscores: RiskSubscores,
    pub result: AssessmentResult,
    pub recommendations: Vec<String>,
    pub assessed_by: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries_inclusive() {
        assert_eq!(RiskTier::from_score(90), RiskTier::Critical);
        assert_eq!(RiskTier::from_score(89), RiskTier::High);
        assert_eq!(RiskTier::from_score(70), RiskTier::High);
        assert_eq!(RiskTier::from_score(69), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(50), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(49), RiskTier::Low);
        assert_eq!(RiskTier::from_score(0), RiskTier::Low);
        assert_eq!(RiskTier::from_score(100), RiskTier::Critical);
    }

    #[test]
    fn test_tier_to_result() {
        assert_eq!(RiskTier::Low.to_result(), AssessmentResult::Approved);
        assert_eq!(RiskTier::Medium.to_result(), AssessmentResult::Conditional);
        assert_eq!(RiskTier::High.to_result(), AssessmentResult::Rejected);
        assert_eq!(RiskTier::Critical.to_result(), AssessmentResult::Rejected);
    }
}
