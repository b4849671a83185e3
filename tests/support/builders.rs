//! Entity builders shared across integration tests.

use riskguard::domain::{
    OrderRequest, OrderSide, OrderType, RiskLevel, StrategyId, StrategyPackage,
    StrategyRiskMetrics, StrategyStatus,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// A low-risk strategy in `Pending` status with a 10k position limit.
pub fn strategy(id: &str) -> StrategyPackage {
    StrategyPackage::new(
        StrategyId::from(id),
        "test strategy",
        RiskLevel::Low,
        dec!(10000),
        dec!(0.10),
        dec!(0.02),
        dec!(0.05),
    )
}

/// Same as [`strategy`] but already `Active`.
pub fn active_strategy(id: &str) -> StrategyPackage {
    let mut strategy = strategy(id);
    strategy.status = StrategyStatus::Active;
    strategy
}

/// Metrics of a strategy trading comfortably inside every limit.
pub fn healthy_metrics() -> StrategyRiskMetrics {
    StrategyRiskMetrics {
        utilization_ratio: 0.25,
        current_exposure: dec!(8000),
        long_exposure: dec!(6000),
        short_exposure: dec!(2000),
        unrealized_pnl: dec!(150),
        max_single_position: dec!(2000),
        order_success_rate: 0.95,
        rejection_rate: 0.02,
        recent_fill_rate: 0.9,
        fill_return_stddev: 0.005,
        sortino_ratio: 1.2,
        daily_loss: Decimal::ZERO,
        total_loss: Decimal::ZERO,
    }
}

/// Metrics of a strategy in deep distress: maxed-out utilization, a large
/// unrealized loss and a dead execution pipeline.
pub fn distressed_metrics() -> StrategyRiskMetrics {
    StrategyRiskMetrics {
        utilization_ratio: 0.99,
        current_exposure: dec!(400000),
        long_exposure: dec!(400000),
        short_exposure: Decimal::ZERO,
        unrealized_pnl: dec!(-500000),
        max_single_position: dec!(400000),
        order_success_rate: 0.0,
        rejection_rate: 0.6,
        recent_fill_rate: 0.0,
        fill_return_stddev: 0.5,
        sortino_ratio: -2.0,
        daily_loss: dec!(500000),
        total_loss: dec!(500000),
    }
}

/// A market buy order request.
pub fn market_order(strategy_id: &str, quantity: Decimal) -> OrderRequest {
    OrderRequest {
        strategy_id: StrategyId::from(strategy_id),
        symbol: "BTC-USD".into(),
        order_type: OrderType::Market,
        side: OrderSide::Buy,
        quantity,
        price: None,
        stop_price: None,
    }
}

/// A limit buy order request.
pub fn limit_order(strategy_id: &str, quantity: Decimal, price: Decimal) -> OrderRequest {
    OrderRequest {
        strategy_id: StrategyId::from(strategy_id),
        symbol: "BTC-USD".into(),
        order_type: OrderType::Limit,
        side: OrderSide::Buy,
        quantity,
        price: Some(price),
        stop_price: None,
    }
}
