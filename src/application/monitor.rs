//! Timer-driven real-time risk monitoring.
//!
//! Sweeps every active strategy on an interval, evaluating each limit check
//! independently and refreshing the cached metrics. One strategy's failure
//! never aborts the sweep; a tick that fires while the previous sweep is
//! still running is skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::application::alerts::AlertService;
use crate::application::scoring;
use crate::config::{MonitorConfig, SharedRiskConfig};
use crate::domain::{
    AlertEntity, AlertSeverity, AlertType, StrategyPackage, StrategyRiskMetrics,
};
use crate::port::outbound::{MetricsCache, MetricsProvider, StrategyStore};

const CACHE_NAMESPACE: &str = "risk_metrics";
const METRICS_TTL: Duration = Duration::from_secs(60);

pub struct RealTimeMonitor {
    strategies: Arc<dyn StrategyStore>,
    metrics: Arc<dyn MetricsProvider>,
    cache: Arc<dyn MetricsCache>,
    alerts: Arc<AlertService>,
    risk_config: SharedRiskConfig,
    monitor_config: MonitorConfig,
    sweep_active: AtomicBool,
}

impl RealTimeMonitor {
    #[must_use]
    pub fn new(
        strategies: Arc<dyn StrategyStore>,
        metrics: Arc<dyn MetricsProvider>,
        cache: Arc<dyn MetricsCache>,
        alerts: Arc<AlertService>,
        risk_config: SharedRiskConfig,
        monitor_config: MonitorConfig,
    ) -> Self {
        Self {
            strategies,
            metrics,
            cache,
            alerts,
            risk_config,
            monitor_config,
            sweep_active: AtomicBool::new(false),
        }
    }

    /// Run the monitor until the task is dropped.
    pub async fn run(self: Arc<Self>) {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(self.monitor_config.interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.sweep().await;
        }
    }

    /// One full sweep across all active strategies plus the portfolio-level
    /// check. Public for tests and for on-demand evaluation.
    pub async fn sweep(&self) {
        // Bound resource use: never two sweeps in flight.
        if self.sweep_active.swap(true, Ordering::SeqCst) {
            debug!("Previous sweep still running, skipping tick");
            return;
        }

        let active = match self.strategies.list_active().await {
            Ok(active) => active,
            Err(err) => {
                warn!(error = %err, "Sweep aborted: cannot list active strategies");
                self.sweep_active.store(false, Ordering::SeqCst);
                return;
            }
        };

        let mut total_exposure = Decimal::ZERO;
        for strategy in &active {
            match self.check_strategy(strategy).await {
                Some(exposure) => total_exposure += exposure,
                None => {
                    warn!(strategy_id = %strategy.id, "Skipping strategy in sweep");
                }
            }
        }

        self.check_portfolio(total_exposure).await;

        debug!(strategies = active.len(), "Sweep complete");
        self.sweep_active.store(false, Ordering::SeqCst);
    }

    /// Evaluate one strategy's limits. Returns its current exposure for the
    /// portfolio aggregate, or `None` when metrics were unavailable.
    async fn check_strategy(&self, strategy: &StrategyPackage) -> Option<Decimal> {
        let metrics = match self.metrics.metrics_for(strategy).await {
            Ok(Some(metrics)) => metrics,
            Ok(None) => return None,
            Err(err) => {
                warn!(strategy_id = %strategy.id, error = %err, "Metrics lookup failed");
                return None;
            }
        };
        let config = self.risk_config.snapshot();

        if metrics.utilization_ratio >= self.monitor_config.utilization_critical {
            self.raise(
                strategy,
                AlertType::PositionLimit,
                AlertSeverity::Critical,
                format!("capital utilization at {:.0}%", metrics.utilization_ratio * 100.0),
            )
            .await;
        } else if metrics.utilization_ratio >= self.monitor_config.utilization_high {
            self.raise(
                strategy,
                AlertType::PositionLimit,
                AlertSeverity::High,
                format!("capital utilization at {:.0}%", metrics.utilization_ratio * 100.0),
            )
            .await;
        }

        if metrics.daily_loss >= config.daily_loss_limit {
            self.raise(
                strategy,
                AlertType::LossLimit,
                AlertSeverity::Critical,
                format!("daily loss {} breaches limit {}", metrics.daily_loss, config.daily_loss_limit),
            )
            .await;
        }

        if metrics.total_loss >= config.total_loss_limit {
            self.raise(
                strategy,
                AlertType::LossLimit,
                AlertSeverity::Critical,
                format!("total loss {} breaches limit {}", metrics.total_loss, config.total_loss_limit),
            )
            .await;
        }

        let volatility = scoring::volatility_score(
            metrics.fill_return_stddev,
            strategy.risk_level,
            &config,
        );
        if volatility >= self.monitor_config.volatility_high {
            self.raise(
                strategy,
                AlertType::MarketVolatility,
                AlertSeverity::High,
                format!("volatility score {volatility:.2}"),
            )
            .await;
        }

        self.refresh_cache(strategy, &metrics).await;
        Some(metrics.current_exposure)
    }

    /// Portfolio-level aggregate check, once per sweep.
    async fn check_portfolio(&self, total_exposure: Decimal) {
        let limit = self.risk_config.snapshot().portfolio_exposure_limit;
        if total_exposure <= limit {
            return;
        }
        info!(%total_exposure, %limit, "Portfolio exposure limit breached");
        if let Err(err) = self
            .alerts
            .create_alert(
                AlertType::PortfolioRisk,
                AlertSeverity::High,
                AlertEntity::Portfolio,
                format!("portfolio exposure {total_exposure} exceeds limit {limit}"),
            )
            .await
        {
            warn!(error = %err, "Failed to raise portfolio alert");
        }
    }

    async fn raise(
        &self,
        strategy: &StrategyPackage,
        alert_type: AlertType,
        severity: AlertSeverity,
        message: String,
    ) {
        if let Err(err) = self
            .alerts
            .create_alert(
                alert_type,
                severity,
                AlertEntity::Strategy(strategy.id.to_string()),
                message,
            )
            .await
        {
            warn!(strategy_id = %strategy.id, error = %err, "Failed to raise alert");
        }
    }

    async fn refresh_cache(&self, strategy: &StrategyPackage, metrics: &StrategyRiskMetrics) {
        let value = match serde_json::to_value(metrics) {
            Ok(value) => value,
            Err(err) => {
                warn!(strategy_id = %strategy.id, error = %err, "Metrics not serializable");
                return;
            }
        };
        if let Err(err) = self
            .cache
            .set(
                CACHE_NAMESPACE,
                strategy.id.as_str(),
                json!({ "metrics": value }),
                Some(METRICS_TTL),
            )
            .await
        {
            warn!(strategy_id = %strategy.id, error = %err, "Failed to refresh metrics cache");
        }
    }
}
