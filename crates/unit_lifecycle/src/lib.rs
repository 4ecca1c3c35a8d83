//! # Unit Lifecycle
//!
//! Runtime management of self-contained interactive units (mini-games, demo
//! scenes) for hosts that swap between them, such as a vertical swiper.
//!
//! ## Features
//!
//! - **Template Cache**: asynchronous, cancellable asset loading with
//!   reference-counted templates
//! - **Placement**: category-aware spacing for 3D, 2D and UI units
//! - **Pooling**: bounded per-type FIFO reuse with eviction that always disposes
//! - **Orchestration**: preload lists, wrap-around navigation and a single
//!   running unit at a time
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use futures::executor::block_on;
//! use futures::future::LocalBoxFuture;
//! use unit_lifecycle::prelude::*;
//!
//! struct Snake;
//!
//! impl UnitKind for Snake {
//!     const NAME: &'static str = "snake";
//!     const CAPABILITIES: UnitCapabilities = UnitCapabilities::POOLABLE;
//! }
//!
//! struct SnakeGame;
//!
//! impl Unit for SnakeGame {
//!     fn start(&mut self) {}
//!     fn stop(&mut self) {}
//!     fn dispose(&mut self) {}
//! }
//!
//! struct SnakeTemplate;
//!
//! impl Template for SnakeTemplate {
//!     fn instantiate(&self) -> anyhow::Result<Box<dyn Instantiated>> {
//!         Ok(UnitObject::boxed(SnakeGame))
//!     }
//! }
//!
//! struct Bundles;
//!
//! impl ResourceLoader for Bundles {
//!     fn load<'a>(
//!         &'a self,
//!         _asset_id: &'a AssetId,
//!         _cancel: &'a CancellationToken,
//!     ) -> LocalBoxFuture<'a, anyhow::Result<Box<dyn Template>>> {
//!         Box::pin(async { Ok::<_, anyhow::Error>(Box::new(SnakeTemplate) as Box<dyn Template>) })
//!     }
//!
//!     fn release(&self, _asset_id: &AssetId, _template: Box<dyn Template>) {}
//! }
//!
//! fn main() -> Result<(), LifecycleError> {
//!     let catalog = Arc::new(UnitCatalog::new().with::<Snake>("games/snake"));
//!     let config = LifecycleConfig::default();
//!     let mut orchestrator = UnitOrchestrator::with_config(catalog, Box::new(Bundles), &config);
//!     let cancel = CancellationToken::new();
//!
//!     block_on(async {
//!         orchestrator.preload_many(&[UnitTypeId::of::<Snake>()], &cancel).await?;
//!         orchestrator.load_next(&cancel).await?;
//!         Ok::<_, LifecycleError>(())
//!     })?;
//!
//!     orchestrator.dispose();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Configuration
pub mod config;
pub mod core;

pub mod foundation;
pub mod unit;
pub mod assets;
pub mod pool;
pub mod lifecycle;

mod error;

pub use error::{LifecycleError, LifecycleResult};

#[cfg(test)]
mod test_support;

/// Common imports for hosts
pub mod prelude {
    pub use crate::{
        LifecycleError, LifecycleResult,
        foundation::CancellationToken,
        unit::{
            InstanceId, Unit, UnitCapabilities, UnitCatalog, UnitCategory, UnitInstance,
            UnitKind, UnitState, UnitTypeId,
        },
        assets::{
            AssetId, Instantiated, Placement, ResourceLoader, Template, UnitFactory, UnitObject,
        },
        pool::{PoolConfig, UnitPool},
        lifecycle::UnitOrchestrator,
        core::config::{Config, LifecycleConfig, PlacementConfig},
    };
}
