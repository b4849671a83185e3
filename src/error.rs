use thiserror::Error;

use crate::domain::OrderStatus;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unrecognized risk weight key: {key}")]
    UnknownWeight { key: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Message bus errors.
#[derive(Error, Debug, Clone)]
pub enum BusError {
    #[error("request on topic '{topic}' timed out after {timeout_ms}ms (correlation {correlation_id})")]
    RequestTimeout {
        topic: String,
        correlation_id: String,
        timeout_ms: u64,
    },

    #[error("bus closing, request rejected")]
    Closing,

    #[error("subscriber handler failed: {0}")]
    Handler(String),
}

/// Persistence collaborator errors.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflicting update for {entity} {id}: {reason}")]
    Conflict {
        entity: &'static str,
        id: String,
        reason: String,
    },

    #[error("store write failed: {0}")]
    Write(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Risk assessment errors.
#[derive(Error, Debug, Clone)]
pub enum RiskError {
    #[error("strategy not found: {strategy_id}")]
    StrategyNotFound { strategy_id: String },

    #[error("risk metrics unavailable for strategy {strategy_id}")]
    MetricsUnavailable { strategy_id: String },
}

/// Alert lifecycle errors.
#[derive(Error, Debug, Clone)]
pub enum AlertError {
    #[error("alert not found: {alert_id}")]
    NotFound { alert_id: String },

    #[error("alert {alert_id} is already acknowledged")]
    AlreadyAcknowledged { alert_id: String },

    #[error("alert {alert_id} is already resolved")]
    AlreadyResolved { alert_id: String },

    #[error("resolution notes are required for alert {alert_id}")]
    MissingResolutionNotes { alert_id: String },
}

/// Order creation and lifecycle errors.
#[derive(Error, Debug, Clone)]
pub enum OrderError {
    #[error("invalid order request: {reason}")]
    Validation { reason: String },

    #[error("strategy not active")]
    StrategyNotActive {
        strategy_id: String,
        status: &'static str,
    },

    #[error("order not found: {order_id}")]
    NotFound { order_id: String },

    #[error("order {order_id} is not cancellable in status {status:?}")]
    NotCancellable {
        order_id: String,
        status: OrderStatus,
    },

    #[error("risk check rejected order: {reason}")]
    RiskRejected { reason: String },

    #[error("invalid order transition for {order_id}: {from:?} -> {to:?}")]
    InvalidTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },
}

/// Execution gateway errors. Never propagated out of the submission path:
/// they are converted into a terminal `Failed` order state.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("order rejected by venue: {0}")]
    Rejected(String),

    #[error("gateway transport failure: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error(transparent)]
    Alert(#[from] AlertError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
