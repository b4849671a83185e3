//! Risk alerts and their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::AlertId;
use crate::error::AlertError;

/// What limit or condition the alert is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    PositionLimit,
    LossLimit,
    VarBreach,
    Concentration,
    Liquidity,
    MarketVolatility,
    PortfolioRisk,
}

/// Alert severity. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    /// Stable name used in logs and bus payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Lifecycle state of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
    Escalated,
}

/// The entity an alert refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity_type", content = "entity_id", rename_all = "snake_case")]
pub enum AlertEntity {
    Strategy(String),
    Order(String),
    Portfolio,
}

/// A risk alert.
///
/// Lifecycle: `Active` -> `Acknowledged` -> `Resolved`, where resolution is
/// also allowed directly from `Active`. `Resolved` is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAlert {
    pub id: AlertId,
    pub alert_type: AlertType,
    severity: AlertSeverity,
    pub entity: AlertEntity,
    pub message: String,
    pub status: AlertStatus,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledgement_notes: Option<String>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
    pub triggered_at: DateTime<Utc>,
}

impl RiskAlert {
    /// Create a fresh alert in `Active` status.
    #[must_use]
    pub fn new(
        alert_type: AlertType,
        severity: AlertSeverity,
        entity: AlertEntity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: AlertId::generate(),
            alert_type,
            severity,
            entity,
            message: message.into(),
            status: AlertStatus::Active,
            acknowledged_by: None,
            acknowledged_at: None,
            acknowledgement_notes: None,
            resolved_by: None,
            resolved_at: None,
            resolution_notes: None,
            triggered_at: Utc::now(),
        }
    }

    /// Severity is fixed for the lifetime of the alert.
    #[must_use]
    pub const fn severity(&self) -> AlertSeverity {
        self.severity
    }

    /// Whether the alert still needs attention.
    #[must_use]
    pub const fn is_unresolved(&self) -> bool {
        !matches!(self.status, AlertStatus::Resolved)
    }

    /// Mark the alert acknowledged.
    pub fn acknowledge(
        &mut self,
        by: impl Into<String>,
        notes: Option<String>,
    ) -> Result<(), AlertError> {
        match self.status {
            AlertStatus::Active | AlertStatus::Escalated => {
                self.status = AlertStatus::Acknowledged;
                self.acknowledged_by = Some(by.into());
                self.acknowledged_at = Some(Utc::now());
                self.acknowledgement_notes = notes;
                Ok(())
            }
            AlertStatus::Acknowledged => Err(AlertError::AlreadyAcknowledged {
                alert_id: self.id.to_string(),
            }),
            AlertStatus::Resolved => Err(AlertError::AlreadyResolved {
                alert_id: self.id.to_string(),
            }),
        }
    }

    /// Resolve the alert. Resolution notes are mandatory and acknowledgement
    /// is not a prerequisite.
    pub fn resolve(
        &mut self,
        by: impl Into<String>,
        resolution_notes: impl Into<String>,
    ) -> Result<(), AlertError> {
        let notes = resolution_notes.into();
        if notes.trim().is_empty() {
            return Err(AlertError::MissingResolutionNotes {
                alert_id: self.id.to_string(),
            });
        }
        match self.status {
            AlertStatus::Resolved => Err(AlertError::AlreadyResolved {
                alert_id: self.id.to_string(),
            }),
            _ => {
                self.status = AlertStatus::Resolved;
                self.resolved_by = Some(by.into());
                self.resolved_at = Some(Utc::now());
                self.resolution_notes = Some(notes);
                Ok(())
            }
        }
    }
}
