//! Process wiring.
//!
//! Builds every service once at startup and hands out shared references.
//! No hidden singletons: tests construct the same struct with substituted
//! collaborators.

use std::sync::Arc;

use crate::adapter::{
    InMemoryAlertStore, InMemoryAssessmentStore, InMemoryCache, InMemoryOrderStore,
    InMemoryStrategyStore, SimulatedGateway, SnapshotMetricsProvider,
};
use crate::application::{
    risk_listener, AlertService, FundingService, RealTimeMonitor, RiskAssessmentWorkflow,
    TraderOrchestrator,
};
use crate::bus::MessageBus;
use crate::config::{Config, SharedRiskConfig};
use crate::port::outbound::{
    AlertStore, AssessmentStore, ExecutionGateway, MetricsCache, MetricsProvider, OrderStore,
    StrategyStore,
};

/// External collaborators behind the outbound ports.
pub struct Collaborators {
    pub strategies: Arc<dyn StrategyStore>,
    pub assessments: Arc<dyn AssessmentStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub orders: Arc<dyn OrderStore>,
    pub metrics: Arc<dyn MetricsProvider>,
    pub cache: Arc<dyn MetricsCache>,
    pub gateway: Arc<dyn ExecutionGateway>,
}

impl Collaborators {
    /// In-process defaults: in-memory stores, TTL cache, simulated gateway.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            strategies: Arc::new(InMemoryStrategyStore::new()),
            assessments: Arc::new(InMemoryAssessmentStore::new()),
            alerts: Arc::new(InMemoryAlertStore::new()),
            orders: Arc::new(InMemoryOrderStore::new()),
            metrics: Arc::new(SnapshotMetricsProvider::new()),
            cache: Arc::new(InMemoryCache::new()),
            gateway: Arc::new(SimulatedGateway::new()),
        }
    }
}

/// The assembled system.
pub struct App {
    pub bus: Arc<MessageBus>,
    pub risk_config: SharedRiskConfig,
    pub alert_service: Arc<AlertService>,
    pub assessment_workflow: Arc<RiskAssessmentWorkflow>,
    pub orchestrator: Arc<TraderOrchestrator>,
    pub funding: Arc<FundingService>,
    pub monitor: Arc<RealTimeMonitor>,
    pub collaborators: Collaborators,
}

impl App {
    /// Wire all services against the given collaborators and attach the bus
    /// listeners.
    #[must_use]
    pub fn build(config: &Config, collaborators: Collaborators) -> Self {
        let bus = Arc::new(MessageBus::with_request_timeout(
            config.bus.request_timeout(),
        ));
        let risk_config = SharedRiskConfig::new(config.risk.clone());

        let alert_service = Arc::new(AlertService::new(
            Arc::clone(&collaborators.alerts),
            Arc::clone(&collaborators.strategies),
            Arc::clone(&bus),
        ));

        let assessment_workflow = Arc::new(RiskAssessmentWorkflow::new(
            Arc::clone(&collaborators.strategies),
            Arc::clone(&collaborators.assessments),
            Arc::clone(&collaborators.metrics),
            Arc::clone(&collaborators.cache),
            Arc::clone(&alert_service),
            Arc::clone(&bus),
            risk_config.clone(),
        ));

        let orchestrator = Arc::new(TraderOrchestrator::new(
            Arc::clone(&collaborators.strategies),
            Arc::clone(&collaborators.orders),
            Arc::clone(&collaborators.gateway),
            Arc::clone(&bus),
        ));

        let funding = Arc::new(FundingService::new(
            Arc::clone(&collaborators.strategies),
            Arc::clone(&bus),
            config.funding.total_budget,
        ));

        let monitor = Arc::new(RealTimeMonitor::new(
            Arc::clone(&collaborators.strategies),
            Arc::clone(&collaborators.metrics),
            Arc::clone(&collaborators.cache),
            Arc::clone(&alert_service),
            risk_config.clone(),
            config.monitor.clone(),
        ));

        risk_listener::attach(&bus, Arc::clone(&assessment_workflow));
        funding.attach();
        orchestrator.attach_event_handlers();

        Self {
            bus,
            risk_config,
            alert_service,
            assessment_workflow,
            orchestrator,
            funding,
            monitor,
            collaborators,
        }
    }

    /// Spawn the periodic monitor task.
    pub fn spawn_monitor(&self) -> tokio::task::JoinHandle<()> {
        let monitor = Arc::clone(&self.monitor);
        tokio::spawn(monitor.run())
    }

    /// Close the bus, failing all pending requests.
    pub fn shutdown(&self) {
        self.bus.close();
    }
}
