//! Configuration loading and runtime-mutable risk settings.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub bus: BusConfig,
    pub risk: RiskConfig,
    pub monitor: MonitorConfig,
    pub funding: FundingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Deadline for a bus request awaiting its correlated reply.
    pub request_timeout_secs: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 5,
        }
    }
}

impl BusConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Weights for the nine scoring components. A named set: unknown keys are
/// rejected at load time. The set SHOULD sum to 1.0 but the engine trusts
/// whatever is configured.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskWeights {
    pub position_size: f64,
    pub volatility: f64,
    pub correlation: f64,
    pub liquidity: f64,
    pub drawdown: f64,
    pub sharpe_ratio: f64,
    pub order_success: f64,
    pub risk_adjusted_return: f64,
    pub operational: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            position_size: 0.15,
            volatility: 0.15,
            correlation: 0.10,
            liquidity: 0.10,
            drawdown: 0.15,
            sharpe_ratio: 0.10,
            order_success: 0.10,
            risk_adjusted_return: 0.10,
            operational: 0.05,
        }
    }
}

impl RiskWeights {
    /// Sum of all weights, for the load-time sanity warning.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.position_size
            + self.volatility
            + self.correlation
            + self.liquidity
            + self.drawdown
            + self.sharpe_ratio
            + self.order_success
            + self.risk_adjusted_return
            + self.operational
    }

    /// Update one weight by its configured key name.
    pub fn set(&mut self, key: &str, value: f64) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::InvalidValue {
                field: "risk.weights",
                reason: format!("weight {key} must be in [0, 1], got {value}"),
            });
        }
        let slot = match key {
            "position_size" => &mut self.position_size,
            "volatility" => &mut self.volatility,
            "correlation" => &mut self.correlation,
            "liquidity" => &mut self.liquidity,
            "drawdown" => &mut self.drawdown,
            "sharpe_ratio" => &mut self.sharpe_ratio,
            "order_success" => &mut self.order_success,
            "risk_adjusted_return" => &mut self.risk_adjusted_return,
            "operational" => &mut self.operational,
            _ => {
                return Err(ConfigError::UnknownWeight {
                    key: key.to_string(),
                })
            }
        };
        *slot = value;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub weights: RiskWeights,
    /// Divisor for the fill-return standard deviation in the volatility score.
    pub volatility_threshold: f64,
    /// Maximum tolerated drawdown fraction in the drawdown score.
    pub max_drawdown: f64,
    pub risk_free_rate: f64,
    /// Volatility assumed when mapping expected return to a Sharpe ratio.
    pub assumed_volatility: f64,
    /// Placeholder operational score. No model behind it yet; kept
    /// configurable instead of hard-coded.
    pub operational_score: f64,
    /// Reuse an assessment younger than this instead of re-scoring.
    pub assessment_reuse_secs: i64,
    pub daily_loss_limit: Decimal,
    pub total_loss_limit: Decimal,
    /// Portfolio-wide exposure ceiling checked once per monitor sweep.
    pub portfolio_exposure_limit: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            weights: RiskWeights::default(),
            volatility_threshold: 0.02,
            max_drawdown: 0.2,
            risk_free_rate: 0.03,
            assumed_volatility: 0.15,
            operational_score: 0.4,
            assessment_reuse_secs: 3600,
            daily_loss_limit: Decimal::from(10_000),
            total_loss_limit: Decimal::from(50_000),
            portfolio_exposure_limit: Decimal::from(1_000_000),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub interval_secs: u64,
    pub utilization_critical: f64,
    pub utilization_high: f64,
    pub volatility_high: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            utilization_critical: 0.95,
            utilization_high: 0.85,
            volatility_high: 0.9,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FundingConfig {
    /// Total capital the finance service may allocate.
    pub total_budget: Decimal,
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            total_budget: Decimal::from(1_000_000),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    /// `RUST_LOG` overrides the configured level when set.
    pub fn init(&self) {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                tracing_subscriber::fmt().json().with_env_filter(filter).init();
            }
            _ => {
                tracing_subscriber::fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.risk.volatility_threshold <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "risk.volatility_threshold",
                reason: "must be greater than 0".into(),
            });
        }
        if self.risk.max_drawdown <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "risk.max_drawdown",
                reason: "must be greater than 0".into(),
            });
        }
        if self.risk.assumed_volatility <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "risk.assumed_volatility",
                reason: "must be greater than 0".into(),
            });
        }
        if self.monitor.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.interval_secs",
                reason: "must be greater than 0".into(),
            });
        }

        let total = self.risk.weights.total();
        if (total - 1.0).abs() > 0.001 {
            // Advisory only: the engine trusts configured weights.
            warn!(total, "Risk weights do not sum to 1.0");
        }
        Ok(())
    }
}

/// Shared, runtime-mutable risk configuration.
///
/// Readers take a whole-struct snapshot; writers hold the lock only for the
/// duration of the mutation. No snapshot consistency is promised across two
/// reads.
#[derive(Clone)]
pub struct SharedRiskConfig {
    inner: Arc<RwLock<RiskConfig>>,
}

impl SharedRiskConfig {
    #[must_use]
    pub fn new(config: RiskConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Clone the current configuration.
    #[must_use]
    pub fn snapshot(&self) -> RiskConfig {
        self.inner.read().clone()
    }

    /// Update one scoring weight by key name.
    pub fn set_weight(&self, key: &str, value: f64) -> Result<(), ConfigError> {
        self.inner.write().weights.set(key, value)
    }

    /// Apply an arbitrary mutation to the configuration.
    pub fn update(&self, mutate: impl FnOnce(&mut RiskConfig)) {
        mutate(&mut self.inner.write());
    }
}

impl Default for SharedRiskConfig {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}
