//! Host-provided registry of unit types
//!
//! The catalog maps each unit type to the asset it is built from and caches
//! its category and capabilities. It is assembled once at startup and shared
//! read-only between the factory and the orchestrator.

use std::collections::HashMap;

use crate::assets::AssetId;

use super::kind::{UnitCategory, UnitDescriptor, UnitKind, UnitTypeId};

/// Registry of unit types known to the host
#[derive(Debug, Default, Clone)]
pub struct UnitCatalog {
    descriptors: HashMap<UnitTypeId, UnitDescriptor>,
    /// Registration order, for deterministic iteration
    order: Vec<UnitTypeId>,
}

impl UnitCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit kind backed by `asset_id`
    ///
    /// Registering the same type twice replaces the earlier entry.
    pub fn register<T: UnitKind>(&mut self, asset_id: impl Into<AssetId>) -> &mut Self {
        self.insert(UnitDescriptor::of::<T>(asset_id.into()));
        self
    }

    /// Builder-style variant of [`register`](Self::register)
    pub fn with<T: UnitKind>(mut self, asset_id: impl Into<AssetId>) -> Self {
        self.register::<T>(asset_id);
        self
    }

    /// Register a descriptor assembled at runtime
    pub fn insert(&mut self, descriptor: UnitDescriptor) {
        let unit_type = descriptor.unit_type;
        log::debug!(
            "Registering unit type {} -> {} ({:?}, poolable: {})",
            unit_type,
            descriptor.asset_id,
            descriptor.category,
            descriptor.is_poolable()
        );

        if self.descriptors.insert(unit_type, descriptor).is_some() {
            log::warn!("Unit type {} registered twice, replacing previous mapping", unit_type);
        } else {
            self.order.push(unit_type);
        }
    }

    /// Full descriptor of a unit type
    pub fn descriptor(&self, unit_type: UnitTypeId) -> Option<&UnitDescriptor> {
        self.descriptors.get(&unit_type)
    }

    /// Asset a unit type is instantiated from
    pub fn asset_id(&self, unit_type: UnitTypeId) -> Option<&AssetId> {
        self.descriptor(unit_type).map(|d| &d.asset_id)
    }

    /// Placement category; unknown types fall back to the default category
    pub fn category(&self, unit_type: UnitTypeId) -> UnitCategory {
        self.descriptor(unit_type)
            .map(|d| d.category)
            .unwrap_or_default()
    }

    /// Whether instances of the type are reused through the pool
    pub fn is_poolable(&self, unit_type: UnitTypeId) -> bool {
        self.descriptor(unit_type).is_some_and(UnitDescriptor::is_poolable)
    }

    /// Whether the type is registered
    pub fn contains(&self, unit_type: UnitTypeId) -> bool {
        self.descriptors.contains_key(&unit_type)
    }

    /// Registered types in registration order
    pub fn unit_types(&self) -> &[UnitTypeId] {
        &self.order
    }

    /// Descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &UnitDescriptor> {
        self.order.iter().filter_map(|t| self.descriptors.get(t))
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
