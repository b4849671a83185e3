//! A fully wired application over in-memory collaborators.

use std::sync::Arc;

use parking_lot::Mutex;
use riskguard::adapter::{
    InMemoryAlertStore, InMemoryAssessmentStore, InMemoryCache, InMemoryOrderStore,
    InMemoryStrategyStore, SimulatedGateway, SnapshotMetricsProvider,
};
use riskguard::app::{App, Collaborators};
use riskguard::bus::MessageBus;
use riskguard::config::Config;
use riskguard::domain::{Envelope, StrategyPackage};
use riskguard::port::outbound::StrategyStore;

use super::builders;

/// The application plus its concrete adapters, kept accessible so tests can
/// seed data and assert on stored state directly.
pub struct TestApp {
    pub app: App,
    pub strategies: Arc<InMemoryStrategyStore>,
    pub assessments: Arc<InMemoryAssessmentStore>,
    pub alerts: Arc<InMemoryAlertStore>,
    pub orders: Arc<InMemoryOrderStore>,
    pub metrics: Arc<SnapshotMetricsProvider>,
    pub gateway: Arc<SimulatedGateway>,
}

impl TestApp {
    pub fn start() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let strategies = Arc::new(InMemoryStrategyStore::new());
        let assessments = Arc::new(InMemoryAssessmentStore::new());
        let alerts = Arc::new(InMemoryAlertStore::new());
        let orders = Arc::new(InMemoryOrderStore::new());
        let metrics = Arc::new(SnapshotMetricsProvider::new());
        let gateway = Arc::new(SimulatedGateway::new());

        let app = App::build(
            &config,
            Collaborators {
                strategies: strategies.clone(),
                assessments: assessments.clone(),
                alerts: alerts.clone(),
                orders: orders.clone(),
                metrics: metrics.clone(),
                cache: Arc::new(InMemoryCache::new()),
                gateway: gateway.clone(),
            },
        );

        Self {
            app,
            strategies,
            assessments,
            alerts,
            orders,
            metrics,
            gateway,
        }
    }

    /// Seed an active strategy with a 10k position limit.
    pub async fn add_active_strategy(&self, id: &str) -> StrategyPackage {
        let strategy = builders::active_strategy(id);
        self.strategies.create(&strategy).await.unwrap();
        strategy
    }
}

/// Record every envelope delivered on a topic.
pub fn record_topic(bus: &Arc<MessageBus>, topic: &str) -> Arc<Mutex<Vec<Envelope>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    bus.subscribe(topic, move |envelope| {
        let sink = sink.clone();
        async move {
            sink.lock().push(envelope);
            Ok(())
        }
    });
    seen
}
