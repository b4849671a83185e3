//! Tests for the risk assessment workflow: recency reuse, failure modes and
//! alert side effects.

mod support;

use std::time::Duration;

use riskguard::domain::message::topics;
use riskguard::domain::{AlertEntity, AlertSeverity, AssessmentResult, AssessmentType, StrategyId};
use riskguard::error::{Error, RiskError};
use riskguard::port::outbound::AlertStore;
use support::builders;
use support::harness::{record_topic, TestApp};

#[tokio::test]
async fn recent_assessment_is_reused_unless_forced() {
    let t = TestApp::start();
    let strategy = t.add_active_strategy("strat-1").await;
    t.metrics.put(strategy.id.clone(), builders::healthy_metrics());

    let first = t
        .app
        .assessment_workflow
        .perform_assessment(&strategy.id, AssessmentType::PreTrade, "tester", false)
        .await
        .unwrap();

    // Within the reuse window the same row comes back, nothing new persisted.
    let second = t
        .app
        .assessment_workflow
        .perform_assessment(&strategy.id, AssessmentType::PreTrade, "tester", false)
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(t.assessments.len(), 1);

    // Forcing bypasses the window and persists a fresh assessment.
    let third = t
        .app
        .assessment_workflow
        .perform_assessment(&strategy.id, AssessmentType::PreTrade, "tester", true)
        .await
        .unwrap();
    assert_ne!(third.id, first.id);
    assert_eq!(t.assessments.len(), 2);
}

#[tokio::test]
async fn unknown_strategy_fails_assessment() {
    let t = TestApp::start();
    let err = t
        .app
        .assessment_workflow
        .perform_assessment(
            &StrategyId::from("ghost"),
            AssessmentType::PreTrade,
            "tester",
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Risk(RiskError::StrategyNotFound { .. })
    ));
    assert!(t.assessments.is_empty());
}

#[tokio::test]
async fn missing_metrics_fail_assessment() {
    let t = TestApp::start();
    let strategy = t.add_active_strategy("strat-1").await;

    let err = t
        .app
        .assessment_workflow
        .perform_assessment(&strategy.id, AssessmentType::RealTime, "tester", false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Risk(RiskError::MetricsUnavailable { .. })
    ));
    assert!(t.assessments.is_empty());
}

#[tokio::test]
async fn healthy_strategy_is_approved_without_alerts() {
    let t = TestApp::start();
    let strategy = t.add_active_strategy("strat-1").await;
    t.metrics.put(strategy.id.clone(), builders::healthy_metrics());

    let assessment = t
        .app
        .assessment_workflow
        .perform_assessment(&strategy.id, AssessmentType::PreTrade, "tester", false)
        .await
        .unwrap();

    assert!(assessment.risk_score < 50, "score {}", assessment.risk_score);
    assert_eq!(assessment.result, AssessmentResult::Approved);
    assert!(t.alerts.is_empty());
}

#[tokio::test]
async fn distressed_strategy_is_rejected_and_raises_critical_alert() {
    let t = TestApp::start();
    let strategy = t.add_active_strategy("strat-1").await;
    t.metrics
        .put(strategy.id.clone(), builders::distressed_metrics());

    let stops = record_topic(&t.app.bus, topics::EMERGENCY_STOP);

    let assessment = t
        .app
        .assessment_workflow
        .perform_assessment(&strategy.id, AssessmentType::RealTime, "tester", false)
        .await
        .unwrap();

    assert!(assessment.risk_score >= 90, "score {}", assessment.risk_score);
    assert_eq!(assessment.result, AssessmentResult::Rejected);
    assert!(!assessment.recommendations.is_empty());

    let unresolved = t.alerts.list_unresolved().await.unwrap();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].severity(), AlertSeverity::Critical);
    assert_eq!(
        unresolved[0].entity,
        AlertEntity::Strategy(strategy.id.to_string())
    );

    // The critical alert broadcast exactly one emergency stop.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(stops.lock().len(), 1);
}
