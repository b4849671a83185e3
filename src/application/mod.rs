//! Application services: scoring, assessment, alerts, orchestration,
//! funding and monitoring.

pub mod alerts;
pub mod assessment;
pub mod funding;
pub mod monitor;
pub mod orchestrator;
pub mod risk_listener;
pub mod scoring;

pub use alerts::AlertService;
pub use assessment::RiskAssessmentWorkflow;
pub use funding::FundingService;
pub use monitor::RealTimeMonitor;
pub use orchestrator::{
    CoordinationOutcome, CoordinationRequest, FundingDecision, RiskDecision, StepOutcome,
    TraderOrchestrator,
};
pub use scoring::RiskScoreDetails;
