//! Unit type identity and capability classification
//!
//! Every unit type is described once, when it is registered in the
//! [`UnitCatalog`](super::UnitCatalog). After that the factory, pool and
//! orchestrator branch on the cached [`UnitDescriptor`] instead of asking the
//! type system again.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::assets::AssetId;

/// Stable key identifying a kind of unit
///
/// Equality and hashing use the Rust type identity only; the name is carried
/// along for logs and for config lookups keyed by name.
#[derive(Clone, Copy)]
pub struct UnitTypeId {
    type_id: TypeId,
    name: &'static str,
}

impl UnitTypeId {
    /// Identity of a registered unit kind
    pub fn of<T: UnitKind>() -> Self {
        Self::from_raw::<T>(T::NAME)
    }

    /// Identity of any `'static` type under an explicit name
    pub fn from_raw<T: 'static>(name: &'static str) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name,
        }
    }

    /// Human readable name
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for UnitTypeId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for UnitTypeId {}

impl Hash for UnitTypeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for UnitTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitTypeId({})", self.name)
    }
}

impl fmt::Display for UnitTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Placement classification of a unit type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitCategory {
    /// Lives in 3D world space
    #[default]
    World3D,
    /// Lives in 2D world space
    World2D,
    /// Lives on a UI canvas
    Ui,
}

bitflags! {
    /// Static capabilities a unit type declares
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UnitCapabilities: u8 {
        /// Instances may be parked in the pool and reused
        const POOLABLE = 1 << 0;
    }
}

/// Compile-time declaration of a unit type
///
/// Implemented by marker types on the host side:
///
/// ```
/// use unit_lifecycle::unit::{UnitCapabilities, UnitCategory, UnitKind};
///
/// struct Snake;
///
/// impl UnitKind for Snake {
///     const NAME: &'static str = "snake";
///     const CATEGORY: UnitCategory = UnitCategory::World2D;
///     const CAPABILITIES: UnitCapabilities = UnitCapabilities::POOLABLE;
/// }
/// ```
pub trait UnitKind: 'static {
    /// Name used in logs and config overrides
    const NAME: &'static str;

    /// Placement category; 3D unless the type says otherwise
    const CATEGORY: UnitCategory = UnitCategory::World3D;

    /// Declared capabilities
    const CAPABILITIES: UnitCapabilities = UnitCapabilities::empty();
}

/// Everything the subsystem needs to know about a unit type, resolved once
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDescriptor {
    /// Type identity
    pub unit_type: UnitTypeId,
    /// Asset the type is instantiated from
    pub asset_id: AssetId,
    /// Placement category
    pub category: UnitCategory,
    /// Declared capabilities
    pub capabilities: UnitCapabilities,
}

impl UnitDescriptor {
    /// Describe a [`UnitKind`] backed by `asset_id`
    pub fn of<T: UnitKind>(asset_id: AssetId) -> Self {
        Self {
            unit_type: UnitTypeId::of::<T>(),
            asset_id,
            category: T::CATEGORY,
            capabilities: T::CAPABILITIES,
        }
    }

    /// Whether instances of this type are reused through the pool
    pub fn is_poolable(&self) -> bool {
        self.capabilities.contains(UnitCapabilities::POOLABLE)
    }
}
