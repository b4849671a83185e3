//! Execution gateway port.
//!
//! Venue connectivity is an external collaborator reached through a single
//! call: submit an order, receive the outcome.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Order, OrderStatus};
use crate::error::GatewayError;

/// Outcome reported by the venue for a submitted order.
#[derive(Debug, Clone)]
pub struct GatewayOutcome {
    /// Status the venue reports, commonly `Submitted` or `Filled`.
    pub status: OrderStatus,
    pub filled_quantity: Decimal,
    pub avg_fill_price: Option<Decimal>,
    pub commission: Decimal,
}

#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    async fn submit(&self, order: &Order) -> Result<GatewayOutcome, GatewayError>;
}
