//! The bus message envelope and its typed payloads.
//!
//! Every payload variant is tagged with the topic string it travels on, so
//! the envelope's `type` field doubles as the pub/sub routing key. Payloads
//! are a tagged union rather than free-form maps: subscribers match on the
//! variant instead of probing dynamic fields.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::alert::RiskAlert;
use super::assessment::AssessmentResult;
use super::id::{CorrelationId, OrderId, StrategyId};
use super::order::OrderStatus;
use super::strategy::StrategyStatus;

/// Well-known topics used by the core services.
pub mod topics {
    pub const RISK_ALERTS: &str = "risk.alerts";
    pub const STRATEGY_UPDATE: &str = "strategy_update";
    pub const ORDER_UPDATE: &str = "order_update";
    pub const RISK_MODULE: &str = "risk_module";
    pub const FUND_REQUEST: &str = "fund_request";
    pub const FUND_RESPONSE: &str = "fund_response";
    pub const EMERGENCY_STOP: &str = "emergency_stop";
    pub const SYSTEM_STATUS: &str = "system_status";
    pub const POOL_APPROVED: &str = "reviewguard.pool.approved";
}

/// Typed message payloads, one variant per topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    /// A risk alert was raised.
    #[serde(rename = "risk.alerts")]
    RiskAlertRaised { alert: RiskAlert },

    /// A strategy changed status.
    #[serde(rename = "strategy_update")]
    StrategyUpdate {
        strategy_id: StrategyId,
        status: StrategyStatus,
        reason: Option<String>,
    },

    /// An order changed status.
    #[serde(rename = "order_update")]
    OrderUpdate {
        order_id: OrderId,
        strategy_id: StrategyId,
        status: OrderStatus,
        filled_quantity: Decimal,
        error: Option<String>,
    },

    /// Risk-check traffic. Requests and replies share the topic; replies are
    /// matched to their caller by correlation id, not by shape.
    #[serde(rename = "risk_module")]
    RiskModule(RiskModuleMessage),

    /// Ask the finance service for a capital allocation.
    #[serde(rename = "fund_request")]
    FundRequest {
        strategy_id: StrategyId,
        amount: Decimal,
        purpose: Option<String>,
    },

    /// Reply from the finance service.
    #[serde(rename = "fund_response")]
    FundResponse {
        strategy_id: StrategyId,
        approved: bool,
        allocated: Decimal,
        reason: Option<String>,
    },

    /// System-wide halt: pause everything, cancel pending orders.
    #[serde(rename = "emergency_stop")]
    EmergencyStop { reason: String },

    /// Operational notifications (assessment completed, sweep finished, ...).
    #[serde(rename = "system_status")]
    SystemStatus {
        component: String,
        detail: String,
    },

    /// The funding pool approved an allocation.
    #[serde(rename = "reviewguard.pool.approved")]
    PoolApproved {
        strategy_id: StrategyId,
        amount: Decimal,
    },
}

/// Body of a `risk_module` message.
///
/// Untagged: a reply is recognized by its `approved` field, anything else is
/// a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RiskModuleMessage {
    Response {
        strategy_id: StrategyId,
        approved: bool,
        risk_score: u8,
        result: AssessmentResult,
    },
    Request {
        strategy_id: StrategyId,
        amount: Option<Decimal>,
    },
}

impl Payload {
    /// The topic this payload travels on.
    #[must_use]
    pub const fn topic(&self) -> &'static str {
        match self {
            Self::RiskAlertRaised { .. } => topics::RISK_ALERTS,
            Self::StrategyUpdate { .. } => topics::STRATEGY_UPDATE,
            Self::OrderUpdate { .. } => topics::ORDER_UPDATE,
            Self::RiskModule(_) => topics::RISK_MODULE,
            Self::FundRequest { .. } => topics::FUND_REQUEST,
            Self::FundResponse { .. } => topics::FUND_RESPONSE,
            Self::EmergencyStop { .. } => topics::EMERGENCY_STOP,
            Self::SystemStatus { .. } => topics::SYSTEM_STATUS,
            Self::PoolApproved { .. } => topics::POOL_APPROVED,
        }
    }
}

/// A message on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(rename = "correlationId", skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    #[serde(flatten)]
    pub payload: Payload,
}

impl Envelope {
    /// Create an envelope from a source service and payload.
    #[must_use]
    pub fn new(source: impl Into<String>, payload: Payload) -> Self {
        Self {
            timestamp: Utc::now(),
            source: source.into(),
            target: None,
            correlation_id: None,
            payload,
        }
    }

    /// Address the envelope to a specific service.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Attach a correlation id, tying this envelope to a request.
    #[must_use]
    pub fn with_correlation(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// The topic this envelope is routed on.
    #[must_use]
    pub const fn topic(&self) -> &'static str {
        self.payload.topic()
    }

    /// Build a reply to this envelope, carrying its correlation id.
    #[must_use]
    pub fn reply(&self, source: impl Into<String>, payload: Payload) -> Self {
        let mut reply = Self::new(source, payload).with_target(self.source.clone());
        reply.correlation_id = self.correlation_id.clone();
        reply
    }
}
