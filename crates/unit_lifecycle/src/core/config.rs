//! # Lifecycle Configuration
//!
//! One serializable document covering every tunable of the subsystem:
//!
//! - **Logging**: default log filter for hosts that initialize logging from it
//! - **Placement**: per-category spacing and UI canvas strategy
//! - **Pool**: bucket capacities with per-type overrides
//!
//! ```toml
//! log_level = "debug"
//!
//! [placement.world_3d]
//! axis = [0.0, 0.0, 1.0]
//! distance = 250.0
//!
//! [placement.ui]
//! mode = "Shared"
//!
//! [pool]
//! default_capacity = 2
//!
//! [pool.capacities]
//! runner = 4
//! ```

use serde::{Deserialize, Serialize};

pub use crate::assets::{AxisSpacing, CanvasStrategy, PlacementConfig};
pub use crate::config::{Config, ConfigError};
pub use crate::pool::PoolConfig;

/// # Lifecycle Configuration
///
/// Top-level settings for a [`UnitOrchestrator`](crate::lifecycle::UnitOrchestrator)
/// and the factory and pool beneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Default log filter (`RUST_LOG` still wins)
    pub log_level: String,
    /// Placement rules for new instances
    pub placement: PlacementConfig,
    /// Pool capacities
    pub pool: PoolConfig,
}

impl LifecycleConfig {
    /// Set the log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the placement rules
    pub fn with_placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    /// Set the pool capacities
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.log_level.trim().is_empty() {
            return Err("Log level cannot be empty".to_string());
        }

        self.placement.validate()?;
        self.pool.validate()?;

        Ok(())
    }

    /// Load from `path` and validate
    pub fn load_validated(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            placement: PlacementConfig::default(),
            pool: PoolConfig::default(),
        }
    }
}

impl Config for LifecycleConfig {}
