//! Tests for the risk + funding coordination saga.

mod support;

use std::sync::Arc;
use std::time::Duration;

use riskguard::adapter::{InMemoryOrderStore, InMemoryStrategyStore, SimulatedGateway};
use riskguard::application::{CoordinationRequest, StepOutcome, TraderOrchestrator};
use riskguard::bus::MessageBus;
use riskguard::config::Config;
use riskguard::domain::message::topics;
use support::builders;
use support::harness::{record_topic, TestApp};
use rust_decimal_macros::dec;

#[tokio::test]
async fn approved_risk_then_funding_share_one_correlation_id() {
    let t = TestApp::start();
    let strategy = t.add_active_strategy("strat-1").await;
    t.metrics.put(strategy.id.clone(), builders::healthy_metrics());

    let fund_requests = record_topic(&t.app.bus, topics::FUND_REQUEST);

    let outcome = t
        .app
        .orchestrator
        .request_risk_and_finance(
            &strategy.id,
            CoordinationRequest::Both,
            Some(dec!(1000)),
            Some("initial margin".into()),
        )
        .await
        .unwrap();

    match &outcome.risk {
        StepOutcome::Completed(decision) => assert!(decision.approved),
        other => panic!("risk step: {other:?}"),
    }
    match &outcome.funding {
        StepOutcome::Completed(decision) => {
            assert!(decision.approved);
            assert_eq!(decision.allocated, dec!(1000));
        }
        other => panic!("funding step: {other:?}"),
    }
    assert_eq!(
        t.app.funding.available(),
        Config::default().funding.total_budget - dec!(1000)
    );

    // The funding request went out under the saga's correlation id.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let seen = fund_requests.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].correlation_id, Some(outcome.correlation_id.clone()));
}

#[tokio::test]
async fn risk_disapproval_skips_funding_entirely() {
    let t = TestApp::start();
    let strategy = t.add_active_strategy("strat-1").await;
    t.metrics
        .put(strategy.id.clone(), builders::distressed_metrics());

    let fund_requests = record_topic(&t.app.bus, topics::FUND_REQUEST);
    let budget_before = t.app.funding.available();

    let outcome = t
        .app
        .orchestrator
        .request_risk_and_finance(
            &strategy.id,
            CoordinationRequest::Both,
            Some(dec!(1000)),
            None,
        )
        .await
        .unwrap();

    match &outcome.risk {
        StepOutcome::Completed(decision) => {
            assert!(!decision.approved);
            assert!(decision.risk_score >= 90);
        }
        other => panic!("risk step: {other:?}"),
    }
    assert!(matches!(outcome.funding, StepOutcome::Skipped));

    // The finance service was never consulted.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(fund_requests.lock().is_empty());
    assert_eq!(t.app.funding.available(), budget_before);
}

#[tokio::test]
async fn finance_only_request_skips_the_risk_step() {
    let t = TestApp::start();
    let strategy = t.add_active_strategy("strat-1").await;

    let outcome = t
        .app
        .orchestrator
        .request_risk_and_finance(
            &strategy.id,
            CoordinationRequest::Finance,
            Some(dec!(500)),
            None,
        )
        .await
        .unwrap();

    assert!(matches!(outcome.risk, StepOutcome::Skipped));
    match &outcome.funding {
        StepOutcome::Completed(decision) => assert!(decision.approved),
        other => panic!("funding step: {other:?}"),
    }
}

#[tokio::test]
async fn funding_denial_reports_a_reason() {
    let t = TestApp::start();
    let strategy = t.add_active_strategy("strat-1").await;
    t.metrics.put(strategy.id.clone(), builders::healthy_metrics());

    let outcome = t
        .app
        .orchestrator
        .request_risk_and_finance(
            &strategy.id,
            CoordinationRequest::Both,
            Some(Config::default().funding.total_budget + dec!(1)),
            None,
        )
        .await
        .unwrap();

    match &outcome.funding {
        StepOutcome::Completed(decision) => {
            assert!(!decision.approved);
            assert!(decision
                .reason
                .as_deref()
                .unwrap()
                .contains("insufficient budget"));
        }
        other => panic!("funding step: {other:?}"),
    }
}

#[tokio::test]
async fn unanswered_risk_request_fails_the_step_and_skips_funding() {
    // A bus with no risk listener attached and a short request deadline.
    let bus = Arc::new(MessageBus::with_request_timeout(Duration::from_millis(50)));
    let strategies = Arc::new(InMemoryStrategyStore::new());
    let orchestrator = Arc::new(TraderOrchestrator::new(
        strategies.clone(),
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(SimulatedGateway::new()),
        bus.clone(),
    ));

    let strategy = builders::active_strategy("strat-1");
    let outcome = orchestrator
        .request_risk_and_finance(
            &strategy.id,
            CoordinationRequest::Both,
            Some(dec!(1000)),
            None,
        )
        .await
        .unwrap();

    assert!(matches!(outcome.risk, StepOutcome::Failed(_)));
    assert!(matches!(outcome.funding, StepOutcome::Skipped));
    assert_eq!(bus.pending_request_count(), 0);
}
