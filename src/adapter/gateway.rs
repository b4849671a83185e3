//! Simulated execution gateway.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{Order, OrderStatus};
use crate::error::GatewayError;
use crate::port::outbound::{ExecutionGateway, GatewayOutcome};

/// Gateway that fills every order at its requested (or a reference) price.
///
/// Stands in for real venue connectivity; also the scriptable failure and
/// latency double for tests.
pub struct SimulatedGateway {
    commission_rate: Decimal,
    /// When set, every submission fails with this message.
    failure: Mutex<Option<String>>,
    /// When set, every submission takes this long to come back.
    latency: Mutex<Option<Duration>>,
}

impl SimulatedGateway {
    #[must_use]
    pub fn new() -> Self {
        Self {
            commission_rate: dec!(0.001),
            failure: Mutex::new(None),
            latency: Mutex::new(None),
        }
    }

    /// Make every subsequent submission fail.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    /// Restore normal fills.
    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    /// Delay every subsequent submission, keeping it in flight.
    pub fn delay_by(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionGateway for SimulatedGateway {
    async fn submit(&self, order: &Order) -> Result<GatewayOutcome, GatewayError> {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(message) = self.failure.lock().clone() {
            return Err(GatewayError::Transport(message));
        }

        let fill_price = order.price.unwrap_or(dec!(100));
        Ok(GatewayOutcome {
            status: OrderStatus::Filled,
            filled_quantity: order.quantity,
            avg_fill_price: Some(fill_price),
            commission: fill_price * order.quantity * self.commission_rate,
        })
    }
}
