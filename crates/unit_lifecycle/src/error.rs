//! Error taxonomy for the unit lifecycle subsystem
//!
//! Host collaborators (loaders, templates, units) report failures as
//! `anyhow::Error`; everything that crosses the factory, pool or
//! orchestrator boundary is folded into [`LifecycleError`].

use crate::assets::AssetId;
use crate::unit::UnitTypeId;
use thiserror::Error;

/// Lifecycle subsystem errors
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// The host catalog has no asset registered for the unit type
    #[error("No asset mapping registered for unit type {0}")]
    MissingAssetMapping(UnitTypeId),

    /// The instantiated object does not expose the unit contract
    #[error("Asset {asset_id} instantiated for {unit_type} does not expose the unit capability")]
    MissingUnitCapability {
        /// Unit type that was requested
        unit_type: UnitTypeId,
        /// Asset the object was instantiated from
        asset_id: AssetId,
    },

    /// The resource loader failed to produce a template
    #[error("Failed to load asset {asset_id}: {source}")]
    AssetLoad {
        /// Asset that failed to load
        asset_id: AssetId,
        /// Loader-reported cause
        #[source]
        source: anyhow::Error,
    },

    /// The template failed to produce an object
    #[error("Failed to instantiate {unit_type}: {source}")]
    Instantiation {
        /// Unit type that was requested
        unit_type: UnitTypeId,
        /// Template-reported cause
        #[source]
        source: anyhow::Error,
    },

    /// The unit's own preload hook failed
    #[error("Unit {unit_type} failed to preload: {source}")]
    UnitPreload {
        /// Unit type whose hook failed
        unit_type: UnitTypeId,
        /// Unit-reported cause
        #[source]
        source: anyhow::Error,
    },

    /// The operation observed a cancellation signal
    #[error("Operation cancelled")]
    Cancelled,

    /// The component was already torn down
    #[error("{0} has been disposed")]
    Disposed(&'static str),

    /// Navigation was requested before anything was preloaded
    #[error("No preloaded units available")]
    NoPreloadedUnits,
}

impl LifecycleError {
    /// Whether this error is a cancellation rather than a failure
    ///
    /// Callers use this to decide whether the error deserves an error-level log.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether this error stems from host configuration (mapping or capability)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingAssetMapping(_) | Self::MissingUnitCapability { .. }
        )
    }
}

/// Result alias for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;
