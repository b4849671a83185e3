//! Bus-facing entry point of the risk service.
//!
//! Answers `risk_module` requests with a pre-trade assessment. Replies go
//! out on the same topic carrying the request's correlation id; inbound
//! replies from other responders are ignored to avoid answer loops.

use std::sync::Arc;

use tracing::warn;

use crate::application::assessment::RiskAssessmentWorkflow;
use crate::bus::MessageBus;
use crate::domain::message::topics;
use crate::domain::{AssessmentResult, AssessmentType, Payload, RiskModuleMessage, StrategyId};
use crate::error::BusError;

const SOURCE: &str = "risk_service";

/// Subscribe the risk service to `risk_module` requests.
pub fn attach(bus: &Arc<MessageBus>, workflow: Arc<RiskAssessmentWorkflow>) {
    let handler_bus = Arc::clone(bus);
    bus.subscribe(topics::RISK_MODULE, move |envelope| {
        let bus = Arc::clone(&handler_bus);
        let workflow = Arc::clone(&workflow);
        async move {
            let strategy_id = match &envelope.payload {
                Payload::RiskModule(RiskModuleMessage::Request { strategy_id, .. }) => {
                    strategy_id.clone()
                }
                // Replies travel on the same topic; nothing to answer.
                _ => return Ok(()),
            };

            let response = check_strategy(&workflow, &strategy_id).await;
            let reply = envelope.reply(SOURCE, Payload::RiskModule(response));
            bus.publish(reply)
                .map_err(|err| BusError::Handler(err.to_string()))
        }
    });
}

/// Run a pre-trade assessment and fold any failure into a disapproval.
async fn check_strategy(
    workflow: &RiskAssessmentWorkflow,
    strategy_id: &StrategyId,
) -> RiskModuleMessage {
    match workflow
        .perform_assessment(strategy_id, AssessmentType::PreTrade, SOURCE, false)
        .await
    {
        Ok(assessment) => RiskModuleMessage::Response {
            strategy_id: strategy_id.clone(),
            approved: assessment.result != AssessmentResult::Rejected,
            risk_score: assessment.risk_score,
            result: assessment.result,
        },
        Err(err) => {
            warn!(strategy_id = %strategy_id, error = %err, "Risk check failed");
            RiskModuleMessage::Response {
                strategy_id: strategy_id.clone(),
                approved: false,
                risk_score: 100,
                result: AssessmentResult::Rejected,
            }
        }
    }
}
