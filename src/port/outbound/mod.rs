//! Outbound ports: contracts for external collaborators.

mod cache;
mod gateway;
mod metrics;
mod store;

pub use cache::MetricsCache;
pub use gateway::{ExecutionGateway, GatewayOutcome};
pub use metrics::MetricsProvider;
pub use store::{AlertStore, AssessmentStore, OrderStore, StrategyStore};
