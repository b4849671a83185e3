//! Read-through cache port.
//!
//! Cache failures are never fatal: callers treat every error as a miss and
//! log it.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// Namespaced key-value cache with per-entry TTL.
#[async_trait]
pub trait MetricsCache: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError>;
}
