//! Unit Factory - template cache, reference counting and instantiation
//!
//! The factory resolves a unit type to its asset through the catalog, loads
//! the template once through the host's [`ResourceLoader`], and keeps it in a
//! slot arena for every later instantiation.
//!
//! Reference counts track explicit preloads only:
//! - `preload` loads (or reuses) the template and adds one reference
//! - `create` loads on demand but never adds a reference
//! - `unload` drops one reference and releases the template at zero
//!
//! Templates loaded on demand therefore stay cached at count zero until the
//! factory is disposed.

use std::collections::HashMap;
use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};

use crate::error::{LifecycleError, LifecycleResult};
use crate::foundation::CancellationToken;
use crate::unit::{InstanceId, UnitCatalog, UnitInstance, UnitTypeId};

use super::placement::{PlacementConfig, PlacementCounters};
use super::{AssetId, ResourceLoader, Template};

new_key_type! {
    /// Arena key of a cached template
    struct TemplateKey;
}

struct TemplateEntry {
    unit_type: UnitTypeId,
    asset_id: AssetId,
    template: Box<dyn Template>,
    ref_count: u32,
}

/// Factory statistics for debugging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactoryStats {
    /// Templates obtained from the loader
    pub templates_loaded: u64,
    /// Templates handed back to the loader
    pub templates_released: u64,
    /// Unit instances produced
    pub units_created: u64,
    /// Instantiated objects destroyed for lacking the unit capability
    pub units_rejected: u64,
}

/// Loads, caches and instantiates unit templates
pub struct UnitFactory {
    catalog: Arc<UnitCatalog>,
    loader: Box<dyn ResourceLoader>,
    placement: PlacementConfig,
    templates: SlotMap<TemplateKey, TemplateEntry>,
    by_type: HashMap<UnitTypeId, TemplateKey>,
    counters: PlacementCounters,
    next_instance: u64,
    shutdown: CancellationToken,
    stats: FactoryStats,
    disposed: bool,
}

impl UnitFactory {
    /// Create a factory over the host's catalog and loader
    pub fn new(
        catalog: Arc<UnitCatalog>,
        loader: Box<dyn ResourceLoader>,
        placement: PlacementConfig,
    ) -> Self {
        log::info!("Creating UnitFactory for {} unit type(s)", catalog.len());
        Self {
            catalog,
            loader,
            placement,
            templates: SlotMap::with_key(),
            by_type: HashMap::new(),
            counters: PlacementCounters::default(),
            next_instance: 0,
            shutdown: CancellationToken::new(),
            stats: FactoryStats::default(),
            disposed: false,
        }
    }

    /// Create a new, placed unit instance
    ///
    /// Loads the template on demand (without taking a reference) if no
    /// preload cached it.
    ///
    /// # Arguments
    /// * `unit_type` - Type to instantiate
    /// * `cancel` - Caller cancellation; linked with the factory's shutdown signal
    ///
    /// # Returns
    /// * `Ok(UnitInstance)` - A fresh instance; its preload hook has not run
    /// * `Err(LifecycleError)` - Mapping, load, instantiation or capability failure,
    ///   cancellation, or a disposed factory
    pub async fn create(
        &mut self,
        unit_type: UnitTypeId,
        cancel: &CancellationToken,
    ) -> LifecycleResult<UnitInstance> {
        self.ensure_live("create")?;
        let cancel = cancel.linked_with(&self.shutdown);
        cancel.check()?;

        // 1. Get or load the template
        let cached = self.by_type.get(&unit_type).copied();
        let key = match cached {
            Some(key) => key,
            None => self.load_template(unit_type, &cancel).await?,
        };

        // 2. Instantiate and unwrap the unit contract
        let entry = &self.templates[key];
        let object = entry.template.instantiate().map_err(|source| {
            log::error!("Failed to instantiate {} from {}: {}", unit_type, entry.asset_id, source);
            LifecycleError::Instantiation { unit_type, source }
        })?;

        let unit = match object.into_unit() {
            Ok(unit) => unit,
            Err(object) => {
                object.destroy();
                self.stats.units_rejected += 1;
                log::error!(
                    "Asset {} does not produce a unit for {}; destroyed the instantiated object",
                    entry.asset_id,
                    unit_type
                );
                return Err(LifecycleError::MissingUnitCapability {
                    unit_type,
                    asset_id: entry.asset_id.clone(),
                });
            }
        };

        // 3. Place it; failure leaves the unit usable
        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        let mut instance = UnitInstance::new(id, unit_type, unit);

        let category = self.catalog.category(unit_type);
        let placement = self
            .placement
            .placement_for(category, self.counters.next(category));
        if let Err(e) = instance.place(&placement) {
            log::warn!("Failed to place {} {} at {:?}, it may be invisible: {}", unit_type, id, placement, e);
        }

        self.stats.units_created += 1;
        log::debug!("Created {} {} ({:?})", unit_type, id, placement);
        Ok(instance)
    }

    /// Load the template for `unit_type` if needed and take one reference
    pub async fn preload(
        &mut self,
        unit_type: UnitTypeId,
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        self.ensure_live("preload")?;
        let cancel = cancel.linked_with(&self.shutdown);
        cancel.check()?;

        let cached = self.by_type.get(&unit_type).copied();
        let key = match cached {
            Some(key) => key,
            None => self.load_template(unit_type, &cancel).await?,
        };

        let entry = &mut self.templates[key];
        entry.ref_count += 1;
        log::debug!("Preloaded {} (references: {})", unit_type, entry.ref_count);
        Ok(())
    }

    /// Drop one preload reference, releasing the template at zero
    ///
    /// Unloading a type that holds no reference only logs a warning.
    pub fn unload(&mut self, unit_type: UnitTypeId) {
        if self.disposed {
            log::warn!("Ignoring unload of {}: UnitFactory has been disposed", unit_type);
            return;
        }

        let Some(&key) = self.by_type.get(&unit_type) else {
            log::warn!("Ignoring unload of {}: no template cached", unit_type);
            return;
        };

        let entry = &mut self.templates[key];
        if entry.ref_count == 0 {
            log::warn!("Ignoring unload of {}: no outstanding preload references", unit_type);
            return;
        }

        entry.ref_count -= 1;
        if entry.ref_count > 0 {
            log::debug!("Unloaded {} (references: {})", unit_type, entry.ref_count);
            return;
        }

        self.by_type.remove(&unit_type);
        if let Some(entry) = self.templates.remove(key) {
            self.release_entry(entry);
        }
    }

    /// Cancel in-flight work and release every cached template
    ///
    /// Calling this again is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            log::debug!("UnitFactory already disposed");
            return;
        }

        self.shutdown.cancel();
        self.by_type.clear();
        let entries: Vec<_> = self.templates.drain().map(|(_, entry)| entry).collect();
        for entry in entries {
            if entry.ref_count > 0 {
                log::debug!("Releasing {} with {} outstanding reference(s)", entry.unit_type, entry.ref_count);
            }
            self.release_entry(entry);
        }
        self.disposed = true;
        log::info!("UnitFactory disposed: {:?}", self.stats);
    }

    /// Whether a template for `unit_type` is cached
    pub fn is_cached(&self, unit_type: UnitTypeId) -> bool {
        self.by_type.contains_key(&unit_type)
    }

    /// Preload references held on `unit_type`, if cached
    pub fn reference_count(&self, unit_type: UnitTypeId) -> Option<u32> {
        self.by_type
            .get(&unit_type)
            .map(|key| self.templates[*key].ref_count)
    }

    /// Types with a cached template
    pub fn cached_types(&self) -> Vec<UnitTypeId> {
        self.templates.values().map(|entry| entry.unit_type).collect()
    }

    /// Token fired on disposal; cancelling it aborts in-flight loads
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Catalog this factory resolves assets through
    pub fn catalog(&self) -> &Arc<UnitCatalog> {
        &self.catalog
    }

    /// Placement rules in use
    pub fn placement(&self) -> &PlacementConfig {
        &self.placement
    }

    /// Factory statistics
    pub fn stats(&self) -> FactoryStats {
        self.stats
    }

    /// Whether [`dispose`](Self::dispose) has run
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    async fn load_template(
        &mut self,
        unit_type: UnitTypeId,
        cancel: &CancellationToken,
    ) -> LifecycleResult<TemplateKey> {
        let Some(asset_id) = self.catalog.asset_id(unit_type).cloned() else {
            log::error!("No asset mapping registered for unit type {}", unit_type);
            return Err(LifecycleError::MissingAssetMapping(unit_type));
        };

        log::debug!("Loading template {} for {}", asset_id, unit_type);
        let loaded = match cancel
            .run_until_cancelled(self.loader.load(&asset_id, cancel))
            .await
        {
            Ok(loaded) => loaded,
            Err(e) => {
                log::debug!("Load of {} for {} cancelled", asset_id, unit_type);
                return Err(e);
            }
        };

        let template = match loaded {
            Ok(template) => template,
            // Loaders that watch the token report cancellation as their own error
            Err(source) if cancel.is_cancelled() => {
                log::debug!("Load of {} for {} cancelled: {}", asset_id, unit_type, source);
                return Err(LifecycleError::Cancelled);
            }
            Err(source) => {
                log::error!("Failed to load asset {} for {}: {}", asset_id, unit_type, source);
                return Err(LifecycleError::AssetLoad { asset_id, source });
            }
        };

        // Cancelled while the loader was finishing: do not cache
        if cancel.is_cancelled() {
            log::debug!("Discarding template {} loaded after cancellation", asset_id);
            self.loader.release(&asset_id, template);
            self.stats.templates_loaded += 1;
            self.stats.templates_released += 1;
            return Err(LifecycleError::Cancelled);
        }

        self.stats.templates_loaded += 1;
        let key = self.templates.insert(TemplateEntry {
            unit_type,
            asset_id,
            template,
            ref_count: 0,
        });
        self.by_type.insert(unit_type, key);
        Ok(key)
    }

    fn release_entry(&mut self, entry: TemplateEntry) {
        log::debug!("Releasing template {} for {}", entry.asset_id, entry.unit_type);
        self.loader.release(&entry.asset_id, entry.template);
        self.stats.templates_released += 1;
    }

    fn ensure_live(&self, operation: &str) -> LifecycleResult<()> {
        if self.disposed {
            log::warn!("Ignoring {} on a disposed UnitFactory", operation);
            return Err(LifecycleError::Disposed("UnitFactory"));
        }
        Ok(())
    }
}

impl Drop for UnitFactory {
    fn drop(&mut self) {
        if !self.disposed {
            self.dispose();
        }
    }
}
