//! In-process adapters for the outbound ports.

mod cache;
mod gateway;
mod metrics;
mod store;

pub use cache::InMemoryCache;
pub use gateway::SimulatedGateway;
pub use metrics::SnapshotMetricsProvider;
pub use store::{
    InMemoryAlertStore, InMemoryAssessmentStore, InMemoryOrderStore, InMemoryStrategyStore,
};
