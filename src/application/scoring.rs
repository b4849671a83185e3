//! Multi-factor risk scoring.
//!
//! Pure computation: given a strategy and its current metrics, produce nine
//! weighted component scores, a 0-100 total, a tier and recommendations.
//! All configuration comes in through [`RiskConfig`]; nothing here touches
//! stores or the bus.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::RiskConfig;
use crate::domain::{RiskLevel, RiskSubscores, RiskTier, StrategyPackage, StrategyRiskMetrics};

/// Full scoring output for one strategy.
#[derive(Debug, Clone)]
pub struct RiskScoreDetails {
    /// Total weighted score in [0, 100].
    pub score: u8,
    pub tier: RiskTier,
    pub subscores: RiskSubscores,
    pub recommendations: Vec<String>,
}

/// Score a strategy against its current metrics.
#[must_use]
pub fn score(
    strategy: &StrategyPackage,
    metrics: &StrategyRiskMetrics,
    config: &RiskConfig,
) -> RiskScoreDetails {
    let subscores = RiskSubscores {
        position_size: position_size_score(metrics.utilization_ratio),
        volatility: volatility_score(metrics.fill_return_stddev, strategy.risk_level, config),
        correlation: correlation_score(metrics),
        liquidity: (1.0 - metrics.recent_fill_rate).clamp(0.0, 1.0),
        drawdown: drawdown_score(metrics, config),
        sharpe: sharpe_score(strategy.expected_return, config),
        order_success: (1.0 - metrics.order_success_rate).clamp(0.0, 1.0),
        risk_adjusted_return: 1.0 - (metrics.sortino_ratio / 3.0).clamp(0.0, 1.0),
        operational: config.operational_score,
    };

    let weights = &config.weights;
    let weighted = subscores.position_size * weights.position_size
        + subscores.volatility * weights.volatility
        + subscores.correlation * weights.correlation
        + subscores.liquidity * weights.liquidity
        + subscores.drawdown * weights.drawdown
        + subscores.sharpe * weights.sharpe_ratio
        + subscores.order_success * weights.order_success
        + subscores.risk_adjusted_return * weights.risk_adjusted_return
        + subscores.operational * weights.operational;

    let score = (weighted * 100.0).round().clamp(0.0, 100.0) as u8;
    let tier = RiskTier::from_score(score);
    let recommendations = recommendations(tier, &subscores, metrics);

    RiskScoreDetails {
        score,
        tier,
        subscores,
        recommendations,
    }
}

/// Stepped lookup on the capital utilization ratio.
fn position_size_score(utilization_ratio: f64) -> f64 {
    if utilization_ratio >= 0.9 {
        1.0
    } else if utilization_ratio >= 0.7 {
        0.8
    } else if utilization_ratio >= 0.5 {
        0.6
    } else if utilization_ratio >= 0.3 {
        0.4
    } else {
        0.2
    }
}

/// Fill-return dispersion against the configured threshold, floored by the
/// strategy's declared risk level. Also used by the real-time monitor.
pub(crate) fn volatility_score(fill_return_stddev: f64, risk_level: RiskLevel, config: &RiskConfig) -> f64 {
    let base = (fill_return_stddev / config.volatility_threshold).min(1.0);
    match risk_level {
        RiskLevel::High => 1.0,
        RiskLevel::Medium => base.max(0.7),
        RiskLevel::Low => base,
    }
}

/// Exposure-concentration proxy: how much of the book sits in the single
/// largest position.
fn correlation_score(metrics: &StrategyRiskMetrics) -> f64 {
    if metrics.current_exposure <= Decimal::ZERO {
        return 0.0;
    }
    let ratio = (metrics.max_single_position / metrics.current_exposure)
        .to_f64()
        .unwrap_or(1.0);
    ratio.clamp(0.0, 1.0)
}

fn drawdown_score(metrics: &StrategyRiskMetrics, config: &RiskConfig) -> f64 {
    if metrics.unrealized_pnl >= Decimal::ZERO || metrics.max_single_position <= Decimal::ZERO {
        return 0.0;
    }
    let loss_fraction = (metrics.unrealized_pnl.abs() / metrics.max_single_position)
        .to_f64()
        .unwrap_or(f64::MAX);
    (loss_fraction / config.max_drawdown).min(1.0)
}

/// Map the implied Sharpe ratio onto [0.1, 1.0]: ratio <= 0 is worst (1.0),
/// ratio >= 2 is best (0.1), linear between.
fn sharpe_score(expected_return: Decimal, config: &RiskConfig) -> f64 {
    let expected = expected_return.to_f64().unwrap_or(0.0);
    let ratio = (expected - config.risk_free_rate) / config.assumed_volatility;
    if ratio <= 0.0 {
        1.0
    } else if ratio >= 2.0 {
        0.1
    } else {
        1.0 - ratio * 0.45
    }
}

fn recommendations(
    tier: RiskTier,
    subscores: &RiskSubscores,
    metrics: &StrategyRiskMetrics,
) -> Vec<String> {
    let mut out: Vec<String> = match tier {
        RiskTier::Critical => vec![
            "Halt new positions immediately and begin reducing exposure".into(),
            "Escalate to the risk desk for manual intervention".into(),
        ],
        RiskTier::High => vec![
            "Reduce position sizes before further entries".into(),
            "Schedule a manual risk review".into(),
        ],
        RiskTier::Medium => vec![
            "Tighten stop-loss levels".into(),
            "Monitor capital utilization closely".into(),
        ],
        RiskTier::Low => vec![],
    };

    if subscores.position_size > 0.8 {
        out.push("Position size near limit: scale down order quantities".into());
    }
    if subscores.volatility > 0.7 {
        out.push("Elevated volatility: widen stops or reduce leverage".into());
    }
    if metrics.order_success_rate < 0.8 {
        out.push("Order success rate degraded: review execution quality".into());
    }

    if out.is_empty() {
        out.push("Risk profile acceptable, keep monitoring".into());
    }
    out
}
