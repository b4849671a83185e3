//! Finance/budget service.
//!
//! Answers `fund_request` traffic against a fixed capital pool. Approvals
//! reserve budget per strategy and are announced on the pool-approval topic.

use std::collections::HashMap;

use std::sync::Arc;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::bus::MessageBus;
use crate::domain::message::topics;
use crate::domain::{Envelope, Payload, StrategyId, StrategyStatus};
use crate::error::BusError;
use crate::port::outbound::StrategyStore;

const SOURCE: &str = "finance_service";

struct Pool {
    total: Decimal,
    allocations: HashMap<StrategyId, Decimal>,
}

impl Pool {
    fn allocated(&self) -> Decimal {
        self.allocations.values().copied().sum()
    }
}

pub struct FundingService {
    strategies: Arc<dyn StrategyStore>,
    bus: Arc<MessageBus>,
    pool: Mutex<Pool>,
}

impl FundingService {
    #[must_use]
    pub fn new(
        strategies: Arc<dyn StrategyStore>,
        bus: Arc<MessageBus>,
        total_budget: Decimal,
    ) -> Self {
        Self {
            strategies,
            bus,
            pool: Mutex::new(Pool {
                total: total_budget,
                allocations: HashMap::new(),
            }),
        }
    }

    /// Capital not yet allocated.
    #[must_use]
    pub fn available(&self) -> Decimal {
        let pool = self.pool.lock();
        pool.total - pool.allocated()
    }

    /// Return a strategy's allocation to the pool.
    pub fn release(&self, strategy_id: &StrategyId) -> Decimal {
        let released = self
            .pool
            .lock()
            .allocations
            .remove(strategy_id)
            .unwrap_or(Decimal::ZERO);
        if released > Decimal::ZERO {
            info!(strategy_id = %strategy_id, amount = %released, "Allocation released");
        }
        released
    }

    /// Subscribe to funding requests.
    pub fn attach(self: &Arc<Self>) {
        let service = Arc::clone(self);
        self.bus.subscribe(topics::FUND_REQUEST, move |envelope| {
            let service = Arc::clone(&service);
            async move {
                let (strategy_id, amount) = match &envelope.payload {
                    Payload::FundRequest {
                        strategy_id,
                        amount,
                        ..
                    } => (strategy_id.clone(), *amount),
                    _ => return Ok(()),
                };

                let (approved, reason) = service.decide(&strategy_id, amount).await;
                let allocated = if approved { amount } else { Decimal::ZERO };

                let reply = envelope.reply(
                    SOURCE,
                    Payload::FundResponse {
                        strategy_id: strategy_id.clone(),
                        approved,
                        allocated,
                        reason,
                    },
                );
                service
                    .bus
                    .publish(reply)
                    .map_err(|err| BusError::Handler(err.to_string()))?;

                if approved {
                    let _ = service.bus.publish(Envelope::new(
                        SOURCE,
                        Payload::PoolApproved {
                            strategy_id,
                            amount,
                        },
                    ));
                }
                Ok(())
            }
        });
    }

    /// Approve when the strategy is fundable and the pool covers the amount.
    async fn decide(&self, strategy_id: &StrategyId, amount: Decimal) -> (bool, Option<String>) {
        if amount <= Decimal::ZERO {
            return (false, Some("amount must be greater than 0".into()));
        }

        let strategy = match self.strategies.find(strategy_id).await {
            Ok(Some(strategy)) => strategy,
            Ok(None) => return (false, Some("strategy not found".into())),
            Err(err) => {
                warn!(strategy_id = %strategy_id, error = %err, "Strategy lookup failed");
                return (false, Some("strategy lookup failed".into()));
            }
        };
        if matches!(
            strategy.status,
            StrategyStatus::Rejected | StrategyStatus::Deleted
        ) {
            return (
                false,
                Some(format!("strategy is {}", strategy.status.as_str())),
            );
        }

        let mut pool = self.pool.lock();
        let available = pool.total - pool.allocated();
        if amount > available {
            return (
                false,
                Some(format!("insufficient budget: {amount} > {available}")),
            );
        }
        *pool
            .allocations
            .entry(strategy_id.clone())
            .or_insert(Decimal::ZERO) += amount;
        info!(strategy_id = %strategy_id, amount = %amount, "Allocation approved");
        (true, None)
    }
}
