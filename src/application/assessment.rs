//! Risk assessment workflow.
//!
//! Wraps the scoring engine with recency-based reuse, persistence, alert
//! triggering and completion notification.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::application::alerts::AlertService;
use crate::application::scoring;
use crate::bus::MessageBus;
use crate::config::SharedRiskConfig;
use crate::domain::{
    AlertEntity, AlertSeverity, AlertType, AssessmentId, AssessmentType, Envelope, Payload,
    RiskAssessment, RiskTier, StrategyId,
};
use crate::error::{Result, RiskError};
use crate::port::outbound::{AssessmentStore, MetricsCache, MetricsProvider, StrategyStore};

const SOURCE: &str = "risk_service";
const CACHE_NAMESPACE: &str = "risk_assessments";

pub struct RiskAssessmentWorkflow {
    strategies: Arc<dyn StrategyStore>,
    assessments: Arc<dyn AssessmentStore>,
    metrics: Arc<dyn MetricsProvider>,
    cache: Arc<dyn MetricsCache>,
    alerts: Arc<AlertService>,
    bus: Arc<MessageBus>,
    config: SharedRiskConfig,
}

impl RiskAssessmentWorkflow {
    #[must_use]
    pub fn new(
        strategies: Arc<dyn StrategyStore>,
        assessments: Arc<dyn AssessmentStore>,
        metrics: Arc<dyn MetricsProvider>,
        cache: Arc<dyn MetricsCache>,
        alerts: Arc<AlertService>,
        bus: Arc<MessageBus>,
        config: SharedRiskConfig,
    ) -> Self {
        Self {
            strategies,
            assessments,
            metrics,
            cache,
            alerts,
            bus,
            config,
        }
    }

    /// Assess a strategy's risk.
    ///
    /// Unless `force_reassessment` is set, an assessment created within the
    /// configured reuse window is returned as-is instead of re-scoring. The
    /// recency check is advisory freshness control, not a lock: two
    /// concurrent calls may both score and both persist.
    ///
    /// Persisting the new assessment is the only fatal step after scoring;
    /// caching, alerting and the completion notification are independent
    /// best-effort side effects.
    pub async fn perform_assessment(
        &self,
        strategy_id: &StrategyId,
        assessment_type: AssessmentType,
        assessed_by: &str,
        force_reassessment: bool,
    ) -> Result<RiskAssessment> {
        let strategy = self
            .strategies
            .find(strategy_id)
            .await?
            .ok_or_else(|| RiskError::StrategyNotFound {
                strategy_id: strategy_id.to_string(),
            })?;

        let config = self.config.snapshot();

        if !force_reassessment {
            if let Some(recent) = self.assessments.latest_for(strategy_id).await? {
                let age = Utc::now() - recent.created_at;
                if age.num_seconds() < config.assessment_reuse_secs {
                    info!(
                        strategy_id = %strategy_id,
                        assessment_id = %recent.id,
                        age_secs = age.num_seconds(),
                        "Reusing recent assessment"
                    );
                    return Ok(recent);
                }
            }
        }

        let metrics = self
            .metrics
            .metrics_for(&strategy)
            .await?
            .ok_or_else(|| RiskError::MetricsUnavailable {
                strategy_id: strategy_id.to_string(),
            })?;

        let details = scoring::score(&strategy, &metrics, &config);
        let assessment = RiskAssessment {
            id: AssessmentId::generate(),
            strategy_id: strategy_id.clone(),
            assessment_type,
            risk_score: details.score,
            subscores: details.subscores,
            result: details.tier.to_result(),
            recommendations: details.recommendations,
            assessed_by: assessed_by.to_string(),
            created_at: Utc::now(),
        };

        // The authoritative write: failure here fails the operation.
        self.assessments.create(&assessment).await?;

        info!(
            strategy_id = %strategy_id,
            assessment_id = %assessment.id,
            risk_score = assessment.risk_score,
            tier = ?details.tier,
            result = ?assessment.result,
            "Assessment persisted"
        );

        self.cache_result(&assessment).await;
        self.raise_alert_if_needed(&assessment, details.tier).await;
        self.notify_completed(&assessment);

        Ok(assessment)
    }

    async fn cache_result(&self, assessment: &RiskAssessment) {
        let ttl = Duration::from_secs(3600);
        let value = json!({
            "assessment_id": assessment.id,
            "risk_score": assessment.risk_score,
            "result": assessment.result,
            "created_at": assessment.created_at,
        });
        if let Err(err) = self
            .cache
            .set(CACHE_NAMESPACE, assessment.strategy_id.as_str(), value, Some(ttl))
            .await
        {
            warn!(
                strategy_id = %assessment.strategy_id,
                error = %err,
                "Failed to cache assessment"
            );
        }
    }

    async fn raise_alert_if_needed(&self, assessment: &RiskAssessment, tier: RiskTier) {
        let severity = match tier {
            RiskTier::Critical => AlertSeverity::Critical,
            RiskTier::High => AlertSeverity::High,
            RiskTier::Low | RiskTier::Medium => return,
        };
        if let Err(err) = self
            .alerts
            .create_alert(
                AlertType::PortfolioRisk,
                severity,
                AlertEntity::Strategy(assessment.strategy_id.to_string()),
                format!(
                    "strategy risk score {} ({:?} tier)",
                    assessment.risk_score, tier
                ),
            )
            .await
        {
            warn!(
                strategy_id = %assessment.strategy_id,
                error = %err,
                "Failed to raise assessment alert"
            );
        }
    }

    fn notify_completed(&self, assessment: &RiskAssessment) {
        let envelope = Envelope::new(
            SOURCE,
            Payload::SystemStatus {
                component: "risk_assessment".into(),
                detail: format!(
                    "assessment {} completed for strategy {} with score {}",
                    assessment.id, assessment.strategy_id, assessment.risk_score
                ),
            },
        );
        if let Err(err) = self.bus.publish(envelope) {
            warn!(
                assessment_id = %assessment.id,
                error = %err,
                "Failed to publish assessment notification"
            );
        }
    }
}
