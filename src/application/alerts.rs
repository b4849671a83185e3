//! Alert lifecycle service.
//!
//! Owns creation, acknowledgement and resolution of risk alerts, and the
//! severity-driven side effects: a critical alert broadcasts an emergency
//! stop, and a critical position-limit alert pauses the offending strategy.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::bus::MessageBus;
use crate::domain::{
    AlertEntity, AlertId, AlertSeverity, AlertType, Envelope, Payload, RiskAlert, StrategyId,
    StrategyStatus,
};
use crate::error::{AlertError, Result};
use crate::port::outbound::{AlertStore, StrategyStore};

const SOURCE: &str = "risk_service";
const BACKLOG_MESSAGE_PREFIX: &str = "alert backlog";

/// Unresolved-critical count above which the health check raises a
/// backlog meta-alert.
const BACKLOG_THRESHOLD: usize = 10;

pub struct AlertService {
    alerts: Arc<dyn AlertStore>,
    strategies: Arc<dyn StrategyStore>,
    bus: Arc<MessageBus>,
}

impl AlertService {
    #[must_use]
    pub fn new(
        alerts: Arc<dyn AlertStore>,
        strategies: Arc<dyn StrategyStore>,
        bus: Arc<MessageBus>,
    ) -> Self {
        Self {
            alerts,
            strategies,
            bus,
        }
    }

    /// Create a new alert and run its severity-driven side effects.
    ///
    /// Persisting the alert is the only fatal step. Publishing and the
    /// critical-severity reactions are best-effort: failures are logged and
    /// the created alert is still returned.
    pub async fn create_alert(
        &self,
        alert_type: AlertType,
        severity: AlertSeverity,
        entity: AlertEntity,
        message: impl Into<String>,
    ) -> Result<RiskAlert> {
        let alert = RiskAlert::new(alert_type, severity, entity, message);
        self.alerts.create(&alert).await?;

        info!(
            alert_id = %alert.id,
            alert_type = ?alert.alert_type,
            severity = severity.as_str(),
            "Alert created"
        );

        if let Err(err) = self.bus.publish(Envelope::new(
            SOURCE,
            Payload::RiskAlertRaised {
                alert: alert.clone(),
            },
        )) {
            warn!(alert_id = %alert.id, error = %err, "Failed to publish alert");
        }

        if severity == AlertSeverity::Critical {
            self.handle_critical(&alert).await;
        }

        Ok(alert)
    }

    /// Acknowledge an active alert.
    pub async fn acknowledge(
        &self,
        alert_id: &AlertId,
        by: &str,
        notes: Option<String>,
    ) -> Result<RiskAlert> {
        let mut alert = self
            .alerts
            .find(alert_id)
            .await?
            .ok_or_else(|| AlertError::NotFound {
                alert_id: alert_id.to_string(),
            })?;
        alert.acknowledge(by, notes)?;
        self.alerts.save(&alert).await?;
        info!(alert_id = %alert.id, by, "Alert acknowledged");
        Ok(alert)
    }

    /// Resolve an alert. Resolution notes are mandatory.
    pub async fn resolve(
        &self,
        alert_id: &AlertId,
        by: &str,
        resolution_notes: &str,
    ) -> Result<RiskAlert> {
        let mut alert = self
            .alerts
            .find(alert_id)
            .await?
            .ok_or_else(|| AlertError::NotFound {
                alert_id: alert_id.to_string(),
            })?;
        alert.resolve(by, resolution_notes)?;
        self.alerts.save(&alert).await?;
        info!(alert_id = %alert.id, by, "Alert resolved");
        Ok(alert)
    }

    /// Periodic backlog check.
    ///
    /// Raises one `High` meta-alert when more than [`BACKLOG_THRESHOLD`]
    /// critical alerts remain unresolved. The meta-alert is itself `High`,
    /// so it can never feed back into this count, and an existing unresolved
    /// backlog alert suppresses a duplicate.
    pub async fn health_check(&self) -> Result<Option<RiskAlert>> {
        let critical_count = self.alerts.unresolved_critical_count().await?;
        if critical_count <= BACKLOG_THRESHOLD {
            return Ok(None);
        }

        let already_raised = self
            .alerts
            .list_unresolved()
            .await?
            .iter()
            .any(|a| a.message.starts_with(BACKLOG_MESSAGE_PREFIX));
        if already_raised {
            return Ok(None);
        }

        warn!(critical_count, "Unresolved critical alert backlog");
        let alert = self
            .create_alert(
                AlertType::PortfolioRisk,
                AlertSeverity::High,
                AlertEntity::Portfolio,
                format!("{BACKLOG_MESSAGE_PREFIX}: {critical_count} unresolved critical alerts"),
            )
            .await?;
        Ok(Some(alert))
    }

    /// Side effects of a critical alert. Best-effort: every failure is
    /// logged, none aborts alert creation.
    async fn handle_critical(&self, alert: &RiskAlert) {
        if let Err(err) = self.bus.publish(Envelope::new(
            SOURCE,
            Payload::EmergencyStop {
                reason: format!("critical alert {}: {}", alert.id, alert.message),
            },
        )) {
            error!(alert_id = %alert.id, error = %err, "Failed to broadcast emergency stop");
        }

        if alert.alert_type == AlertType::PositionLimit {
            if let AlertEntity::Strategy(strategy_id) = &alert.entity {
                let strategy_id = StrategyId::from(strategy_id.clone());
                match self
                    .strategies
                    .update_status(&strategy_id, StrategyStatus::Paused)
                    .await
                {
                    Ok(()) => {
                        info!(strategy_id = %strategy_id, "Strategy paused by critical alert");
                        let _ = self.bus.publish(Envelope::new(
                            SOURCE,
                            Payload::StrategyUpdate {
                                strategy_id,
                                status: StrategyStatus::Paused,
                                reason: Some(alert.message.clone()),
                            },
                        ));
                    }
                    Err(err) => {
                        error!(
                            strategy_id = %strategy_id,
                            error = %err,
                            "Failed to pause strategy after critical alert"
                        );
                    }
                }
            }
        }
    }
}
