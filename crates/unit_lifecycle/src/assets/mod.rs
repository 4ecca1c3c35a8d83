//! Asset contracts and the unit factory
//!
//! The host plugs a [`ResourceLoader`] into the [`UnitFactory`]. The loader
//! turns an [`AssetId`] into a [`Template`]; the factory caches templates,
//! counts preload references against them and stamps out unit instances.

pub mod factory;
pub mod placement;

pub use factory::{FactoryStats, UnitFactory};
pub use placement::{AxisSpacing, CanvasPlacement, CanvasStrategy, Placement, PlacementConfig};

use std::fmt;

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::foundation::CancellationToken;
use crate::unit::Unit;

/// Identifier of a loadable asset (an address, a path, a bundle key)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Wrap a raw identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A loaded asset that can be instantiated any number of times
pub trait Template {
    /// Produce a fresh object from this template
    fn instantiate(&self) -> anyhow::Result<Box<dyn Instantiated>>;
}

/// An object freshly produced by a [`Template`]
///
/// Templates may yield objects that do not implement the unit contract (a
/// misconfigured asset). The factory destroys those instead of leaking them.
pub trait Instantiated {
    /// Hand over the unit, or give the object back if it is not one
    fn into_unit(self: Box<Self>) -> Result<Box<dyn Unit>, Box<dyn Instantiated>>;

    /// Destroy an object that will not be used
    fn destroy(self: Box<Self>);
}

/// [`Instantiated`] wrapper for objects that are units
pub struct UnitObject(Box<dyn Unit>);

impl UnitObject {
    /// Box `unit` as an instantiated object
    pub fn boxed(unit: impl Unit + 'static) -> Box<dyn Instantiated> {
        Box::new(Self(Box::new(unit)))
    }
}

impl Instantiated for UnitObject {
    fn into_unit(self: Box<Self>) -> Result<Box<dyn Unit>, Box<dyn Instantiated>> {
        Ok(self.0)
    }

    fn destroy(self: Box<Self>) {
        let mut unit = self.0;
        unit.dispose();
    }
}

/// Asynchronous template source provided by the host
pub trait ResourceLoader {
    /// Load the template for `asset_id`
    ///
    /// Implementations should give up early once `cancel` fires; the factory
    /// also stops waiting on its own.
    fn load<'a>(
        &'a self,
        asset_id: &'a AssetId,
        cancel: &'a CancellationToken,
    ) -> LocalBoxFuture<'a, anyhow::Result<Box<dyn Template>>>;

    /// Give a template back once nothing references it
    fn release(&self, asset_id: &AssetId, template: Box<dyn Template>);
}
