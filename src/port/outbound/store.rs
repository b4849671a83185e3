//! Persistence ports for core entities.
//!
//! The relational store itself is an external collaborator; the core only
//! depends on these contracts. Assessment rows are immutable, so that store
//! has no update operation.

use async_trait::async_trait;

use crate::domain::{
    AlertId, AssessmentId, Order, OrderId, OrderStatus, RiskAlert, RiskAssessment,
    StrategyId, StrategyPackage, StrategyStatus,
};
use crate::error::StoreError;

/// Storage operations for strategy packages.
#[async_trait]
pub trait StrategyStore: Send + Sync {
    async fn create(&self, strategy: &StrategyPackage) -> Result<(), StoreError>;

    async fn find(&self, id: &StrategyId) -> Result<Option<StrategyPackage>, StoreError>;

    /// All strategies currently in `Active` status.
    async fn list_active(&self) -> Result<Vec<StrategyPackage>, StoreError>;

    async fn update_status(
        &self,
        id: &StrategyId,
        status: StrategyStatus,
    ) -> Result<(), StoreError>;
}

/// Storage operations for risk assessments.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn create(&self, assessment: &RiskAssessment) -> Result<(), StoreError>;

    async fn find(&self, id: &AssessmentId) -> Result<Option<RiskAssessment>, StoreError>;

    /// Most recent assessment for a strategy, by `created_at`.
    async fn latest_for(
        &self,
        strategy_id: &StrategyId,
    ) -> Result<Option<RiskAssessment>, StoreError>;
}

/// Storage operations for risk alerts.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn create(&self, alert: &RiskAlert) -> Result<(), StoreError>;

    async fn find(&self, id: &AlertId) -> Result<Option<RiskAlert>, StoreError>;

    /// Persist lifecycle changes (acknowledge/resolve).
    async fn save(&self, alert: &RiskAlert) -> Result<(), StoreError>;

    /// Unresolved alerts of `Critical` severity.
    async fn unresolved_critical_count(&self) -> Result<usize, StoreError>;

    /// Alerts that are not yet resolved.
    async fn list_unresolved(&self) -> Result<Vec<RiskAlert>, StoreError>;
}

/// Storage operations for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, order: &Order) -> Result<(), StoreError>;

    async fn find(&self, id: &OrderId) -> Result<Option<Order>, StoreError>;

    async fn save(&self, order: &Order) -> Result<(), StoreError>;

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError>;

    async fn list_for_strategy(
        &self,
        strategy_id: &StrategyId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StoreError>;
}
