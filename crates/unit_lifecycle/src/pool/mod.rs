//! Bounded per-type pooling of unit instances
//!
//! Poolable unit types get one bucket each. Buckets hand out the
//! longest-parked instance first and never hold more inactive instances than
//! their capacity; anything beyond that is disposed on the way in.

pub mod unit_pool;

pub use unit_pool::{PoolStats, UnitPool};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::unit::UnitTypeId;

/// # Pool Configuration
///
/// Bucket capacities, with per-type overrides keyed by unit type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Capacity of buckets without an override
    pub default_capacity: usize,
    /// Overrides keyed by [`UnitTypeId::name`]
    pub capacities: BTreeMap<String, usize>,
}

impl PoolConfig {
    /// Set the default capacity
    pub fn with_default_capacity(mut self, capacity: usize) -> Self {
        self.default_capacity = capacity;
        self
    }

    /// Override the capacity of one unit type
    pub fn with_capacity(mut self, unit_name: impl Into<String>, capacity: usize) -> Self {
        self.capacities.insert(unit_name.into(), capacity);
        self
    }

    /// Capacity that applies to `unit_type`
    pub fn capacity_for(&self, unit_type: UnitTypeId) -> usize {
        self.capacities
            .get(unit_type.name())
            .copied()
            .unwrap_or(self.default_capacity)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.default_capacity == 0 {
            return Err("Default pool capacity must be at least 1".to_string());
        }
        if let Some((name, _)) = self.capacities.iter().find(|(_, capacity)| **capacity == 0) {
            return Err(format!("Pool capacity for '{}' must be at least 1", name));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            default_capacity: 3,
            capacities: BTreeMap::new(),
        }
    }
}
