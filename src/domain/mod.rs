//! Core domain types: strategies, assessments, alerts, orders, messages.

mod alert;
mod assessment;
mod id;
mod metrics;
mod order;
mod strategy;

pub mod message;

pub use alert::{AlertEntity, AlertSeverity, AlertStatus, AlertType, RiskAlert};
pub use assessment::{
    AssessmentResult, AssessmentType, RiskAssessment, RiskSubscores, RiskTier,
};
pub use id::{AlertId, AssessmentId, CorrelationId, OrderId, StrategyId};
pub use message::{Envelope, Payload, RiskModuleMessage};
pub use metrics::StrategyRiskMetrics;
pub use order::{Order, OrderRequest, OrderSide, OrderStatus, OrderType};
pub use strategy::{RiskLevel, StrategyPackage, StrategyStatus};
