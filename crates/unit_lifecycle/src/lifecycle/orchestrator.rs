//! Unit Orchestrator - preload list, navigation and the current unit
//!
//! Ordering guarantees:
//! - Loading a unit always stops the current one first, so two units are
//!   never running at once.
//! - A stopped poolable unit goes back to the pool; anything else is disposed.
//! - Navigation moves the cursor before loading, so a failed load still
//!   advances and the next swipe moves on past the broken entry.

use std::sync::Arc;

use crate::assets::{ResourceLoader, UnitFactory};
use crate::core::LifecycleConfig;
use crate::error::{LifecycleError, LifecycleResult};
use crate::foundation::CancellationToken;
use crate::pool::UnitPool;
use crate::unit::{UnitCatalog, UnitInstance, UnitTypeId};

/// Coordinates preloading, switching and teardown of units
pub struct UnitOrchestrator {
    catalog: Arc<UnitCatalog>,
    factory: UnitFactory,
    pool: UnitPool,
    /// Preloaded types in request order, without duplicates
    preloaded: Vec<UnitTypeId>,
    cursor: Option<usize>,
    current: Option<UnitInstance>,
    disposed: bool,
}

impl UnitOrchestrator {
    /// Create an orchestrator over an existing factory and pool
    pub fn new(factory: UnitFactory, pool: UnitPool) -> Self {
        Self {
            catalog: Arc::clone(factory.catalog()),
            factory,
            pool,
            preloaded: Vec::new(),
            cursor: None,
            current: None,
            disposed: false,
        }
    }

    /// Build the factory and pool from configuration
    pub fn with_config(
        catalog: Arc<UnitCatalog>,
        loader: Box<dyn ResourceLoader>,
        config: &LifecycleConfig,
    ) -> Self {
        Self::new(
            UnitFactory::new(catalog, loader, config.placement.clone()),
            UnitPool::new(config.pool.clone()),
        )
    }

    /// Replace the preload list with `unit_types`
    ///
    /// Each type's template is loaded and referenced; poolable types also get
    /// one warmed instance. Failures of individual types are logged and
    /// skipped. Cancellation stops the batch and is returned.
    ///
    /// Types from the previous list lose their preload reference once the new
    /// list is in place; their pooled instances are cleared unless the type
    /// is preloaded again.
    pub async fn preload_many(
        &mut self,
        unit_types: &[UnitTypeId],
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        self.ensure_live("preload_many")?;

        let previous = std::mem::take(&mut self.preloaded);
        self.cursor = None;

        let mut outcome = Ok(());
        for &unit_type in unit_types {
            if self.preloaded.contains(&unit_type) {
                log::warn!("Skipping duplicate preload of {}", unit_type);
                continue;
            }

            match self.preload_one(unit_type, cancel).await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {
                    log::debug!("Preload batch cancelled at {}", unit_type);
                    outcome = Err(e);
                    break;
                }
                Err(e) => log::error!("Failed to preload {}: {}", unit_type, e),
            }
        }

        for unit_type in previous {
            if !self.preloaded.contains(&unit_type) {
                self.pool.clear_for_type(unit_type);
            }
            self.factory.unload(unit_type);
        }

        log::info!("Preloaded {} of {} unit type(s)", self.preloaded.len(), unit_types.len());
        outcome
    }

    /// Make a unit of `unit_type` the current one
    ///
    /// The previous unit is stopped first. Poolable types are reused from the
    /// pool when possible; otherwise a fresh instance is created and
    /// preloaded. If the type is on the preload list the cursor follows it.
    ///
    /// Dropping the returned future before it completes disposes any
    /// instance it had already created.
    pub async fn load(
        &mut self,
        unit_type: UnitTypeId,
        cancel: &CancellationToken,
    ) -> LifecycleResult<&mut UnitInstance> {
        self.ensure_live("load")?;
        self.stop_current();

        let pooled = if self.catalog.is_poolable(unit_type) {
            self.pool.try_get(unit_type)
        } else {
            None
        };

        let mut unit = match pooled {
            Some(unit) => unit,
            None => {
                let unit = self.create_preloaded(unit_type, cancel).await?;
                if self.catalog.is_poolable(unit_type) {
                    self.pool.track_active(&unit);
                }
                unit
            }
        };

        if let Some(index) = self.preloaded.iter().position(|t| *t == unit_type) {
            self.cursor = Some(index);
        }

        unit.start();
        log::debug!("Started {} {}", unit_type, unit.id());
        Ok(self.current.insert(unit))
    }

    /// Advance the cursor (wrapping) and load that unit
    pub async fn load_next(&mut self, cancel: &CancellationToken) -> LifecycleResult<&mut UnitInstance> {
        self.ensure_live("load_next")?;
        let count = self.preloaded_count()?;
        let index = self.cursor.map_or(0, |c| (c + 1) % count);
        self.load_at(index, cancel).await
    }

    /// Move the cursor back (wrapping) and load that unit
    pub async fn load_previous(&mut self, cancel: &CancellationToken) -> LifecycleResult<&mut UnitInstance> {
        self.ensure_live("load_previous")?;
        let count = self.preloaded_count()?;
        let index = self.cursor.map_or(count - 1, |c| (c + count - 1) % count);
        self.load_at(index, cancel).await
    }

    /// Stop the current unit and pool or dispose it
    pub fn stop_current(&mut self) {
        let Some(mut unit) = self.current.take() else {
            return;
        };

        unit.stop();
        if self.catalog.is_poolable(unit.unit_type()) {
            log::debug!("Returning {} {} to the pool", unit.unit_type(), unit.id());
            self.pool.release(unit);
        } else {
            unit.dispose();
        }
    }

    /// Pause the current unit; returns whether there was one
    pub fn pause_current(&mut self) -> bool {
        self.current.as_mut().map(UnitInstance::pause).is_some()
    }

    /// Resume the current unit; returns whether there was one
    pub fn resume_current(&mut self) -> bool {
        self.current.as_mut().map(UnitInstance::resume).is_some()
    }

    /// Restart the current unit; returns whether there was one
    pub fn restart_current(&mut self) -> bool {
        self.current.as_mut().map(UnitInstance::restart).is_some()
    }

    /// Drop every preload reference and clear the matching pool buckets
    ///
    /// The current unit keeps running; if its bucket was cleared it is
    /// disposed instead of pooled when it stops.
    pub fn clear_preloaded(&mut self) {
        if self.disposed {
            log::warn!("Ignoring clear_preloaded on a disposed UnitOrchestrator");
            return;
        }

        for unit_type in std::mem::take(&mut self.preloaded) {
            self.pool.clear_for_type(unit_type);
            self.factory.unload(unit_type);
        }
        self.cursor = None;
    }

    /// Stop the current unit and tear down the pool and the factory
    ///
    /// Calling this again is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            log::debug!("UnitOrchestrator already disposed");
            return;
        }

        self.stop_current();
        self.preloaded.clear();
        self.cursor = None;
        self.pool.dispose();
        self.factory.dispose();
        self.disposed = true;
        log::info!("UnitOrchestrator disposed");
    }

    /// The running unit, if any
    pub fn current_unit(&self) -> Option<&UnitInstance> {
        self.current.as_ref()
    }

    /// Mutable access to the running unit
    pub fn current_unit_mut(&mut self) -> Option<&mut UnitInstance> {
        self.current.as_mut()
    }

    /// Preloaded types in navigation order
    pub fn preloaded_types(&self) -> &[UnitTypeId] {
        &self.preloaded
    }

    /// Position in the preload list, if navigation has started
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The underlying factory
    pub fn factory(&self) -> &UnitFactory {
        &self.factory
    }

    /// The underlying pool
    pub fn pool(&self) -> &UnitPool {
        &self.pool
    }

    /// Whether [`dispose`](Self::dispose) has run
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    async fn preload_one(
        &mut self,
        unit_type: UnitTypeId,
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        self.factory.preload(unit_type, cancel).await?;
        self.preloaded.push(unit_type);

        if self.catalog.is_poolable(unit_type) {
            let unit = self.create_preloaded(unit_type, cancel).await?;
            self.pool.warm_up(unit);
        }
        Ok(())
    }

    async fn create_preloaded(
        &mut self,
        unit_type: UnitTypeId,
        cancel: &CancellationToken,
    ) -> LifecycleResult<UnitInstance> {
        let mut unit = self.factory.create(unit_type, cancel).await?;
        if let Err(e) = unit.preload(cancel).await {
            if !e.is_cancelled() {
                log::error!("Disposing {} {}: {}", unit_type, unit.id(), e);
            }
            unit.dispose();
            return Err(e);
        }
        Ok(unit)
    }

    async fn load_at(&mut self, index: usize, cancel: &CancellationToken) -> LifecycleResult<&mut UnitInstance> {
        self.cursor = Some(index);
        let unit_type = self.preloaded[index];
        self.load(unit_type, cancel).await
    }

    fn preloaded_count(&self) -> LifecycleResult<usize> {
        match self.preloaded.len() {
            0 => {
                log::warn!("Navigation requested with no preloaded units");
                Err(LifecycleError::NoPreloadedUnits)
            }
            n => Ok(n),
        }
    }

    fn ensure_live(&self, operation: &str) -> LifecycleResult<()> {
        if self.disposed {
            log::warn!("Ignoring {} on a disposed UnitOrchestrator", operation);
            return Err(LifecycleError::Disposed("UnitOrchestrator"));
        }
        Ok(())
    }
}

impl Drop for UnitOrchestrator {
    fn drop(&mut self) {
        if !self.disposed {
            self.dispose();
        }
    }
}
