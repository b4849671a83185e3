//! In-memory store adapters.
//!
//! Back the persistence ports with process-local maps. The production
//! deployment puts a relational store behind the same traits; these adapters
//! keep the core runnable and give tests substitutable collaborators.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::{
    AlertId, AlertSeverity, AssessmentId, Order, OrderId, OrderStatus, RiskAlert,
    RiskAssessment, StrategyId, StrategyPackage, StrategyStatus,
};
use crate::error::StoreError;
use crate::port::outbound::{AlertStore, AssessmentStore, OrderStore, StrategyStore};

#[derive(Default)]
pub struct InMemoryStrategyStore {
    rows: RwLock<HashMap<StrategyId, StrategyPackage>>,
}

impl InMemoryStrategyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StrategyStore for InMemoryStrategyStore {
    async fn create(&self, strategy: &StrategyPackage) -> Result<(), StoreError> {
        let mut rows = self.rows.write();
        if rows.contains_key(&strategy.id) {
            return Err(StoreError::Conflict {
                entity: "strategy",
                id: strategy.id.to_string(),
                reason: "already exists".into(),
            });
        }
        rows.insert(strategy.id.clone(), strategy.clone());
        Ok(())
    }

    async fn find(&self, id: &StrategyId) -> Result<Option<StrategyPackage>, StoreError> {
        Ok(self.rows.read().get(id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<StrategyPackage>, StoreError> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|s| s.status == StrategyStatus::Active)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: &StrategyId,
        status: StrategyStatus,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.write();
        let strategy = rows.get_mut(id).ok_or_else(|| StoreError::NotFound {
            entity: "strategy",
            id: id.to_string(),
        })?;
        strategy.status = status;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAssessmentStore {
    rows: RwLock<HashMap<AssessmentId, RiskAssessment>>,
}

impl InMemoryAssessmentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted assessments. For assertions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl AssessmentStore for InMemoryAssessmentStore {
    async fn create(&self, assessment: &RiskAssessment) -> Result<(), StoreError> {
        self.rows
            .write()
            .insert(assessment.id.clone(), assessment.clone());
        Ok(())
    }

    async fn find(&self, id: &AssessmentId) -> Result<Option<RiskAssessment>, StoreError> {
        Ok(self.rows.read().get(id).cloned())
    }

    async fn latest_for(
        &self,
        strategy_id: &StrategyId,
    ) -> Result<Option<RiskAssessment>, StoreError> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|a| &a.strategy_id == strategy_id)
            .max_by_key(|a| a.created_at)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryAlertStore {
    rows: RwLock<HashMap<AlertId, RiskAlert>>,
}

impl InMemoryAlertStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn create(&self, alert: &RiskAlert) -> Result<(), StoreError> {
        self.rows.write().insert(alert.id.clone(), alert.clone());
        Ok(())
    }

    async fn find(&self, id: &AlertId) -> Result<Option<RiskAlert>, StoreError> {
        Ok(self.rows.read().get(id).cloned())
    }

    async fn save(&self, alert: &RiskAlert) -> Result<(), StoreError> {
        let mut rows = self.rows.write();
        if !rows.contains_key(&alert.id) {
            return Err(StoreError::NotFound {
                entity: "alert",
                id: alert.id.to_string(),
            });
        }
        rows.insert(alert.id.clone(), alert.clone());
        Ok(())
    }

    async fn unresolved_critical_count(&self) -> Result<usize, StoreError> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|a| a.severity() == AlertSeverity::Critical && a.is_unresolved())
            .count())
    }

    async fn list_unresolved(&self) -> Result<Vec<RiskAlert>, StoreError> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|a| a.is_unresolved())
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryOrderStore {
    rows: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        self.rows.write().insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn find(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.rows.read().get(id).cloned())
    }

    async fn save(&self, order: &Order) -> Result<(), StoreError> {
        let mut rows = self.rows.write();
        if !rows.contains_key(&order.id) {
            return Err(StoreError::NotFound {
                entity: "order",
                id: order.id.to_string(),
            });
        }
        rows.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect())
    }

    async fn list_for_strategy(
        &self,
        strategy_id: &StrategyId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|o| &o.strategy_id == strategy_id)
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AlertEntity, AlertType, RiskLevel};
    use rust_decimal_macros::dec;

    fn make_strategy(id: &str) -> StrategyPackage {
        StrategyPackage::new(
            StrategyId::from(id),
            "test strategy",
            RiskLevel::Low,
            dec!(10000),
            dec!(0.10),
            dec!(0.02),
            dec!(0.05),
        )
    }

    #[tokio::test]
    async fn test_strategy_create_and_duplicate() {
        let store = InMemoryStrategyStore::new();
        let strategy = make_strategy("strat-1");

        store.create(&strategy).await.unwrap();
        let err = store.create(&strategy).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_strategy_status_update() {
        let store = InMemoryStrategyStore::new();
        store.create(&make_strategy("strat-1")).await.unwrap();

        store
            .update_status(&StrategyId::from("strat-1"), StrategyStatus::Active)
            .await
            .unwrap();

        let active = store.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_unresolved_critical_count() {
        let store = InMemoryAlertStore::new();
        let critical = RiskAlert::new(
            AlertType::LossLimit,
            AlertSeverity::Critical,
            AlertEntity::Portfolio,
            "breach",
        );
        let mut resolved_critical = RiskAlert::new(
            AlertType::LossLimit,
            AlertSeverity::Critical,
            AlertEntity::Portfolio,
            "old breach",
        );
        resolved_critical.resolve("ops", "handled").unwrap();
        let high = RiskAlert::new(
            AlertType::Liquidity,
            AlertSeverity::High,
            AlertEntity::Portfolio,
            "thin book",
        );

        store.create(&critical).await.unwrap();
        store.create(&resolved_critical).await.unwrap();
        store.create(&high).await.unwrap();

        assert_eq!(store.unresolved_critical_count().await.unwrap(), 1);
    }
}
