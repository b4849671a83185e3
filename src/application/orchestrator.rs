//! Trader orchestration.
//!
//! Sequences the order-creation saga (validate -> persist -> risk check ->
//! async gateway submission), coordinates risk and funding approvals over
//! the bus, and reacts to inbound alerts and emergency stops.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::bus::MessageBus;
use crate::domain::message::topics;
use crate::domain::{
    AlertSeverity, CorrelationId, Envelope, Order, OrderId, OrderRequest, OrderStatus,
    Payload, RiskModuleMessage, StrategyId, StrategyPackage, StrategyStatus,
};
use crate::error::{OrderError, Result, StoreError};
use crate::port::outbound::{ExecutionGateway, OrderStore, StrategyStore};

const SOURCE: &str = "trader_service";

/// Which approvals a coordination call should obtain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinationRequest {
    Risk,
    Finance,
    Both,
}

/// Outcome of one saga step.
#[derive(Debug, Clone)]
pub enum StepOutcome<T> {
    /// The step was not requested, or its prerequisite disapproved.
    Skipped,
    Completed(T),
    /// Transport-level failure (timeout, bus closing). Completed prior
    /// steps stand.
    Failed(String),
}

impl<T> StepOutcome<T> {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

#[derive(Debug, Clone)]
pub struct RiskDecision {
    pub approved: bool,
    pub risk_score: u8,
}

#[derive(Debug, Clone)]
pub struct FundingDecision {
    pub approved: bool,
    pub allocated: Decimal,
    pub reason: Option<String>,
}

/// Combined result of a risk + funding coordination call.
#[derive(Debug, Clone)]
pub struct CoordinationOutcome {
    pub correlation_id: CorrelationId,
    pub risk: StepOutcome<RiskDecision>,
    pub funding: StepOutcome<FundingDecision>,
}

pub struct TraderOrchestrator {
    strategies: Arc<dyn StrategyStore>,
    orders: Arc<dyn OrderStore>,
    gateway: Arc<dyn ExecutionGateway>,
    bus: Arc<MessageBus>,
}

impl TraderOrchestrator {
    #[must_use]
    pub fn new(
        strategies: Arc<dyn StrategyStore>,
        orders: Arc<dyn OrderStore>,
        gateway: Arc<dyn ExecutionGateway>,
        bus: Arc<MessageBus>,
    ) -> Self {
        Self {
            strategies,
            orders,
            gateway,
            bus,
        }
    }

    /// Create an order and hand it to the execution gateway.
    ///
    /// Returns as soon as the order is persisted with its risk check passed;
    /// gateway submission continues on a spawned task and reports through
    /// `order_update` messages. Validation failures create no row; a failed
    /// risk check leaves the row in `Rejected`.
    pub async fn create_order(self: &Arc<Self>, request: OrderRequest) -> Result<Order> {
        request.validate()?;

        let strategy = self
            .strategies
            .find(&request.strategy_id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "strategy",
                id: request.strategy_id.to_string(),
            })?;
        if !strategy.status.accepts_orders() {
            return Err(OrderError::StrategyNotActive {
                strategy_id: strategy.id.to_string(),
                status: strategy.status.as_str(),
            }
            .into());
        }

        let mut order = Order::from_request(&request);
        self.orders.create(&order).await?;

        if let Err(reason) = pre_trade_check(&order, &strategy) {
            order.transition(OrderStatus::Rejected)?;
            order.error_message = Some(reason.clone());
            self.orders.save(&order).await?;
            self.publish_order_update(&order);
            warn!(order_id = %order.id, reason = %reason, "Order rejected by risk check");
            return Err(OrderError::RiskRejected { reason }.into());
        }

        order.risk_check_passed = true;
        self.orders.save(&order).await?;

        info!(
            order_id = %order.id,
            strategy_id = %order.strategy_id,
            symbol = %order.symbol,
            "Order accepted, submitting to gateway"
        );

        let orchestrator = Arc::clone(self);
        let submitted = order.clone();
        tokio::spawn(async move {
            orchestrator.submit_to_gateway(submitted).await;
        });

        Ok(order)
    }

    /// Cancel an order that has not reached a terminal state.
    pub async fn cancel_order(&self, order_id: &OrderId) -> Result<Order> {
        let mut order = self
            .orders
            .find(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound {
                order_id: order_id.to_string(),
            })?;
        if !order.status.is_cancellable() {
            return Err(OrderError::NotCancellable {
                order_id: order_id.to_string(),
                status: order.status,
            }
            .into());
        }
        order.transition(OrderStatus::Cancelled)?;
        self.orders.save(&order).await?;
        self.publish_order_update(&order);
        info!(order_id = %order.id, "Order cancelled");
        Ok(order)
    }

    /// Obtain risk and funding approval over the bus.
    ///
    /// Both requests share one correlation id. The funding step runs only
    /// when requested and when the risk step (if requested) explicitly
    /// approved; a risk disapproval skips funding entirely, while a
    /// transport failure of either step never rolls back the other.
    pub async fn request_risk_and_finance(
        &self,
        strategy_id: &StrategyId,
        request: CoordinationRequest,
        amount: Option<Decimal>,
        purpose: Option<String>,
    ) -> Result<CoordinationOutcome> {
        let correlation_id = CorrelationId::generate();
        let mut outcome = CoordinationOutcome {
            correlation_id: correlation_id.clone(),
            risk: StepOutcome::Skipped,
            funding: StepOutcome::Skipped,
        };

        if matches!(request, CoordinationRequest::Risk | CoordinationRequest::Both) {
            outcome.risk = self.request_risk(strategy_id, amount, &correlation_id).await;
        }

        if matches!(request, CoordinationRequest::Finance | CoordinationRequest::Both) {
            let risk_blocks = match &outcome.risk {
                StepOutcome::Completed(decision) => !decision.approved,
                StepOutcome::Failed(_) => true,
                StepOutcome::Skipped => false,
            };
            if risk_blocks {
                info!(strategy_id = %strategy_id, "Funding skipped: risk step did not approve");
            } else {
                outcome.funding = self
                    .request_funding(strategy_id, amount, purpose, &correlation_id)
                    .await;
            }
        }

        Ok(outcome)
    }

    async fn request_risk(
        &self,
        strategy_id: &StrategyId,
        amount: Option<Decimal>,
        correlation_id: &CorrelationId,
    ) -> StepOutcome<RiskDecision> {
        let envelope = Envelope::new(
            SOURCE,
            Payload::RiskModule(RiskModuleMessage::Request {
                strategy_id: strategy_id.clone(),
                amount,
            }),
        )
        .with_correlation(correlation_id.clone());

        match self.bus.request(envelope, None).await {
            Ok(reply) => match reply.payload {
                Payload::RiskModule(RiskModuleMessage::Response {
                    approved,
                    risk_score,
                    ..
                }) => StepOutcome::Completed(RiskDecision {
                    approved,
                    risk_score,
                }),
                other => StepOutcome::Failed(format!(
                    "unexpected risk reply on topic {}",
                    other.topic()
                )),
            },
            Err(err) => {
                warn!(strategy_id = %strategy_id, error = %err, "Risk check step failed");
                StepOutcome::Failed(err.to_string())
            }
        }
    }

    async fn request_funding(
        &self,
        strategy_id: &StrategyId,
        amount: Option<Decimal>,
        purpose: Option<String>,
        correlation_id: &CorrelationId,
    ) -> StepOutcome<FundingDecision> {
        let envelope = Envelope::new(
            SOURCE,
            Payload::FundRequest {
                strategy_id: strategy_id.clone(),
                amount: amount.unwrap_or(Decimal::ZERO),
                purpose,
            },
        )
        .with_correlation(correlation_id.clone());

        match self.bus.request(envelope, None).await {
            Ok(reply) => match reply.payload {
                Payload::FundResponse {
                    approved,
                    allocated,
                    reason,
                    ..
                } => StepOutcome::Completed(FundingDecision {
                    approved,
                    allocated,
                    reason,
                }),
                other => StepOutcome::Failed(format!(
                    "unexpected funding reply on topic {}",
                    other.topic()
                )),
            },
            Err(err) => {
                warn!(strategy_id = %strategy_id, error = %err, "Funding step failed");
                StepOutcome::Failed(err.to_string())
            }
        }
    }

    /// Subscribe to alert and emergency-stop traffic.
    pub fn attach_event_handlers(self: &Arc<Self>) {
        let orchestrator = Arc::clone(self);
        self.bus.subscribe(topics::RISK_ALERTS, move |envelope| {
            let orchestrator = Arc::clone(&orchestrator);
            async move {
                if let Payload::RiskAlertRaised { alert } = envelope.payload {
                    orchestrator.handle_alert(&alert).await;
                }
                Ok(())
            }
        });

        let orchestrator = Arc::clone(self);
        self.bus.subscribe(topics::EMERGENCY_STOP, move |envelope| {
            let orchestrator = Arc::clone(&orchestrator);
            async move {
                if let Payload::EmergencyStop { reason } = envelope.payload {
                    orchestrator.handle_emergency_stop(&reason).await;
                }
                Ok(())
            }
        });
    }

    /// Alert reactions: critical pauses the strategy and cancels its pending
    /// orders, high pauses only.
    async fn handle_alert(&self, alert: &crate::domain::RiskAlert) {
        let strategy_id = match &alert.entity {
            crate::domain::AlertEntity::Strategy(id) => StrategyId::from(id.clone()),
            _ => return,
        };
        match alert.severity() {
            AlertSeverity::Critical => {
                self.pause_strategy(&strategy_id, &alert.message).await;
                self.cancel_pending_for_strategy(&strategy_id).await;
            }
            AlertSeverity::High => {
                self.pause_strategy(&strategy_id, &alert.message).await;
            }
            AlertSeverity::Low | AlertSeverity::Medium => {}
        }
    }

    /// System-wide halt: pause every active strategy, cancel every pending
    /// order.
    async fn handle_emergency_stop(&self, reason: &str) {
        warn!(reason, "Emergency stop received");

        match self.strategies.list_active().await {
            Ok(active) => {
                for strategy in active {
                    self.pause_strategy(&strategy.id, reason).await;
                }
            }
            Err(err) => error!(error = %err, "Failed to list active strategies"),
        }

        match self.orders.list_by_status(OrderStatus::Pending).await {
            Ok(orders) => {
                for order in orders {
                    if let Err(err) = self.cancel_order(&order.id).await {
                        warn!(order_id = %order.id, error = %err, "Failed to cancel order");
                    }
                }
            }
            Err(err) => error!(error = %err, "Failed to list orders for cancellation"),
        }
    }

    async fn pause_strategy(&self, strategy_id: &StrategyId, reason: &str) {
        match self
            .strategies
            .update_status(strategy_id, StrategyStatus::Paused)
            .await
        {
            Ok(()) => {
                info!(strategy_id = %strategy_id, reason, "Strategy paused");
                let _ = self.bus.publish(Envelope::new(
                    SOURCE,
                    Payload::StrategyUpdate {
                        strategy_id: strategy_id.clone(),
                        status: StrategyStatus::Paused,
                        reason: Some(reason.to_string()),
                    },
                ));
            }
            Err(StoreError::NotFound { .. }) => {}
            Err(err) => {
                error!(strategy_id = %strategy_id, error = %err, "Failed to pause strategy");
            }
        }
    }

    async fn cancel_pending_for_strategy(&self, strategy_id: &StrategyId) {
        let pending = match self
            .orders
            .list_for_strategy(strategy_id, Some(OrderStatus::Pending))
            .await
        {
            Ok(orders) => orders,
            Err(err) => {
                error!(strategy_id = %strategy_id, error = %err, "Failed to list pending orders");
                return;
            }
        };
        for order in pending {
            if let Err(err) = self.cancel_order(&order.id).await {
                warn!(order_id = %order.id, error = %err, "Failed to cancel pending order");
            }
        }
    }

    /// Gateway submission path. Fire-and-forget from the caller's point of
    /// view: every failure in here ends as a logged error and, where
    /// possible, a terminal `Failed` order state.
    async fn submit_to_gateway(&self, order: Order) {
        let outcome = self.gateway.submit(&order).await;

        // The order may have been cancelled while the submission was in
        // flight; apply the outcome to the current row, never the snapshot
        // captured at spawn time.
        let mut current = match self.orders.find(&order.id).await {
            Ok(Some(current)) => current,
            Ok(None) => {
                error!(order_id = %order.id, "Order row vanished during gateway submission");
                return;
            }
            Err(err) => {
                error!(order_id = %order.id, error = %err, "Failed to re-read order after submission");
                return;
            }
        };
        if current.status.is_terminal() {
            info!(
                order_id = %current.id,
                status = current.status.as_str(),
                "Dropping gateway outcome for terminal order"
            );
            return;
        }

        match outcome {
            Ok(outcome) => {
                let applied = if outcome.filled_quantity > Decimal::ZERO {
                    current.apply_fill(
                        outcome.filled_quantity,
                        outcome.avg_fill_price.unwrap_or_default(),
                        outcome.commission,
                    )
                } else {
                    current.transition(outcome.status)
                };
                if let Err(err) = applied {
                    error!(order_id = %current.id, error = %err, "Gateway outcome not applicable");
                    return;
                }
            }
            Err(err) => {
                warn!(order_id = %current.id, error = %err, "Gateway submission failed");
                current.error_message = Some(err.to_string());
                if current.transition(OrderStatus::Failed).is_err() {
                    // Already terminal; nothing left to record.
                    return;
                }
            }
        }

        if let Err(err) = self.orders.save(&current).await {
            error!(order_id = %current.id, error = %err, "Failed to persist gateway outcome");
        }
        self.publish_order_update(&current);
    }

    fn publish_order_update(&self, order: &Order) {
        let envelope = Envelope::new(
            SOURCE,
            Payload::OrderUpdate {
                order_id: order.id.clone(),
                strategy_id: order.strategy_id.clone(),
                status: order.status,
                filled_quantity: order.filled_quantity,
                error: order.error_message.clone(),
            },
        );
        if let Err(err) = self.bus.publish(envelope) {
            warn!(order_id = %order.id, error = %err, "Failed to publish order update");
        }
    }
}

/// Synchronous pre-trade rules: the strategy must still be active and the
/// order notional must fit within the strategy's position limit.
fn pre_trade_check(order: &Order, strategy: &StrategyPackage) -> std::result::Result<(), String> {
    if !strategy.status.accepts_orders() {
        return Err("strategy not active".into());
    }
    let notional = order
        .price
        .map_or(order.quantity, |price| price * order.quantity);
    if notional > strategy.max_position_size {
        return Err(format!(
            "order notional {notional} exceeds position limit {}",
            strategy.max_position_size
        ));
    }
    Ok(())
}
