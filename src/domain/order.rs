//! Orders and their lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{OrderId, StrategyId};
use crate::error::OrderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Order status. Transitions are monotonic except the terminal trio
/// `Cancelled` / `Rejected` / `Failed`, reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Submitted,
    PartialFilled,
    Filled,
    Cancelled,
    Rejected,
    Failed,
}

impl OrderStatus {
    /// Stable name used in logs and bus payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::PartialFilled => "partial_filled",
            Self::Filled => "filled",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled | Self::Rejected | Self::Failed)
    }

    /// Whether a cancel request is still honoured in this state.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Submitted | Self::PartialFilled)
    }
}

/// Parameters for creating an order, before any validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub strategy_id: StrategyId,
    pub symbol: String,
    pub order_type: OrderType,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
}

impl OrderRequest {
    /// Validate request parameters. Fails fast before any row is created.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.quantity <= Decimal::ZERO {
            return Err(OrderError::Validation {
                reason: "quantity must be greater than 0".into(),
            });
        }
        if matches!(self.order_type, OrderType::Limit | OrderType::StopLimit)
            && !self.price.is_some_and(|p| p > Decimal::ZERO)
        {
            return Err(OrderError::Validation {
                reason: "limit orders require a positive price".into(),
            });
        }
        if matches!(self.order_type, OrderType::Stop | OrderType::StopLimit)
            && !self.stop_price.is_some_and(|p| p > Decimal::ZERO)
        {
            return Err(OrderError::Validation {
                reason: "stop orders require a positive stop price".into(),
            });
        }
        Ok(())
    }
}

/// A persisted order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub strategy_id: StrategyId,
    pub symbol: String,
    pub order_type: OrderType,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub status: OrderStatus,
    pub filled_quantity: Decimal,
    pub avg_fill_price: Option<Decimal>,
    pub commission: Decimal,
    pub risk_check_passed: bool,
    /// Gateway error message when the order ended up `Failed`.
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create an order in `Pending` status from a validated request.
    #[must_use]
    pub fn from_request(request: &OrderRequest) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::generate(),
            strategy_id: request.strategy_id.clone(),
            symbol: request.symbol.clone(),
            order_type: request.order_type,
            side: request.side,
            quantity: request.quantity,
            price: request.price,
            stop_price: request.stop_price,
            status: OrderStatus::Pending,
            filled_quantity: Decimal::ZERO,
            avg_fill_price: None,
            commission: Decimal::ZERO,
            risk_check_passed: false,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to a new status, enforcing terminal states.
    pub fn transition(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::InvalidTransition {
                order_id: self.id.to_string(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Apply a fill. Drives `PartialFilled` -> `Filled` once the cumulative
    /// filled quantity reaches the requested quantity.
    pub fn apply_fill(
        &mut self,
        filled_quantity: Decimal,
        avg_fill_price: Decimal,
        commission: Decimal,
    ) -> Result<(), OrderError> {
        self.filled_quantity = filled_quantity;
        self.avg_fill_price = Some(avg_fill_price);
        self.commission = commission;
        let next = if filled_quantity >= self.quantity {
            OrderStatus::Filled
        } else {
            OrderStatus::PartialFilled
        };
        self.transition(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn market_request(quantity: Decimal) -> OrderRequest {
        OrderRequest {
            strategy_id: StrategyId::from("strat-1"),
            symbol: "BTC-USD".into(),
            order_type: OrderType::Market,
            side: OrderSide::Buy,
            quantity,
            price: None,
            stop_price: None,
        }
    }

    #[test]
    fn test_zero_quantity_fails_validation() {
        let err = market_request(Decimal::ZERO).validate().unwrap_err();
        assert!(matches!(err, OrderError::Validation { .. }));
    }

    #[test]
    fn test_limit_requires_price() {
        let mut request = market_request(dec!(1));
        request.order_type = OrderType::Limit;
        assert!(request.validate().is_err());

        request.price = Some(dec!(50000));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_stop_limit_requires_both_prices() {
        let mut request = market_request(dec!(1));
        request.order_type = OrderType::StopLimit;
        request.price = Some(dec!(50000));
        assert!(request.validate().is_err());

        request.stop_price = Some(dec!(49000));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_fill_drives_partial_then_filled() {
        let mut order = Order::from_request(&market_request(dec!(10)));
        order.transition(OrderStatus::Submitted).unwrap();

        order.apply_fill(dec!(4), dec!(100), dec!(0.1)).unwrap();
        assert_eq!(order.status, OrderStatus::PartialFilled);

        order.apply_fill(dec!(10), dec!(101), dec!(0.2)).unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
    }

    #[test]
    fn test_terminal_states_stay_terminal() {
        let mut order = Order::from_request(&market_request(dec!(1)));
        order.transition(OrderStatus::Cancelled).unwrap();

        let err = order.transition(OrderStatus::Submitted).unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
    }
}
