//! Test doubles shared across module tests
//!
//! Unit kinds, probe units that record every hook into shared counters, and
//! an in-memory loader that can fail, hang or run a callback on each load.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use futures::future::{self, LocalBoxFuture};

use crate::assets::{AssetId, Instantiated, Placement, ResourceLoader, Template, UnitObject};
use crate::foundation::CancellationToken;
use crate::unit::{
    InstanceId, Unit, UnitCapabilities, UnitCatalog, UnitCategory, UnitInstance, UnitKind,
    UnitTypeId,
};

/// Poolable 3D unit
pub struct Runner;
/// Non-poolable 2D unit
pub struct Puzzle;
/// Poolable UI unit
pub struct Quiz;
/// Registered, but its asset does not produce a unit
pub struct Orphan;
/// Poolable unit whose preload hook fails
pub struct Flaky;
/// Never registered
pub struct Unmapped;

impl UnitKind for Runner {
    const NAME: &'static str = "runner";
    const CAPABILITIES: UnitCapabilities = UnitCapabilities::POOLABLE;
}

impl UnitKind for Puzzle {
    const NAME: &'static str = "puzzle";
    const CATEGORY: UnitCategory = UnitCategory::World2D;
}

impl UnitKind for Quiz {
    const NAME: &'static str = "quiz";
    const CATEGORY: UnitCategory = UnitCategory::Ui;
    const CAPABILITIES: UnitCapabilities = UnitCapabilities::POOLABLE;
}

impl UnitKind for Orphan {
    const NAME: &'static str = "orphan";
}

impl UnitKind for Flaky {
    const NAME: &'static str = "flaky";
    const CAPABILITIES: UnitCapabilities = UnitCapabilities::POOLABLE;
}

impl UnitKind for Unmapped {
    const NAME: &'static str = "unmapped";
}

/// Catalog with every test kind except [`Unmapped`]
pub fn catalog() -> UnitCatalog {
    UnitCatalog::new()
        .with::<Runner>("games/runner")
        .with::<Puzzle>("games/puzzle")
        .with::<Quiz>("games/quiz")
        .with::<Orphan>("games/orphan")
        .with::<Flaky>("games/flaky")
}

/// Everything probe units and the loader observed
#[derive(Debug, Default)]
pub struct ProbeCounts {
    pub preloaded: u32,
    pub started: u32,
    pub stopped: u32,
    pub paused: u32,
    pub resumed: u32,
    pub restarted: u32,
    pub pooled: u32,
    pub unpooled: u32,
    /// Serials of disposed units, in disposal order
    pub disposed: Vec<u64>,
    pub active_flags: Vec<bool>,
    pub placements: Vec<Placement>,
    /// Non-unit objects destroyed by the factory
    pub destroyed_objects: u32,
}

pub type SharedCounts = Rc<RefCell<ProbeCounts>>;

/// Unit that records its hooks
pub struct ProbeUnit {
    serial: u64,
    counts: SharedCounts,
    fail_preload: bool,
    hang_preload: bool,
    refuse_placement: bool,
}

impl ProbeUnit {
    pub fn new(serial: u64, counts: &SharedCounts) -> Self {
        Self {
            serial,
            counts: Rc::clone(counts),
            fail_preload: false,
            hang_preload: false,
            refuse_placement: false,
        }
    }

    /// A probe with its own counters
    pub fn detached() -> (Self, SharedCounts) {
        let counts = SharedCounts::default();
        (Self::new(0, &counts), counts)
    }

    /// A detached probe whose preload never completes
    pub fn stalled() -> (Self, SharedCounts) {
        let (mut unit, counts) = Self::detached();
        unit.hang_preload = true;
        (unit, counts)
    }
}

impl Unit for ProbeUnit {
    fn preload<'a>(
        &'a mut self,
        _cancel: &'a CancellationToken,
    ) -> LocalBoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.counts.borrow_mut().preloaded += 1;
            if self.fail_preload {
                anyhow::bail!("unit {} refused to preload", self.serial);
            }
            if self.hang_preload {
                future::pending::<()>().await;
            }
            Ok(())
        })
    }

    fn start(&mut self) {
        self.counts.borrow_mut().started += 1;
    }

    fn pause(&mut self) {
        self.counts.borrow_mut().paused += 1;
    }

    fn resume(&mut self) {
        self.counts.borrow_mut().resumed += 1;
    }

    fn restart(&mut self) {
        let mut counts = self.counts.borrow_mut();
        counts.restarted += 1;
        counts.started += 1;
    }

    fn stop(&mut self) {
        self.counts.borrow_mut().stopped += 1;
    }

    fn dispose(&mut self) {
        self.counts.borrow_mut().disposed.push(self.serial);
    }

    fn set_active(&mut self, active: bool) {
        self.counts.borrow_mut().active_flags.push(active);
    }

    fn on_pooled(&mut self) {
        self.counts.borrow_mut().pooled += 1;
    }

    fn on_unpooled(&mut self) {
        self.counts.borrow_mut().unpooled += 1;
    }

    fn place(&mut self, placement: &Placement) -> anyhow::Result<()> {
        if self.refuse_placement {
            anyhow::bail!("no scene to attach to");
        }
        self.counts.borrow_mut().placements.push(*placement);
        Ok(())
    }
}

/// Instance of kind `K` wrapping a probe with serial `id`
pub fn probe_instance<K: UnitKind>(id: u64, counts: &SharedCounts) -> UnitInstance {
    UnitInstance::new(
        InstanceId(id),
        UnitTypeId::of::<K>(),
        Box::new(ProbeUnit::new(id, counts)),
    )
}

/// Object without the unit capability
struct InertObject {
    counts: SharedCounts,
}

impl Instantiated for InertObject {
    fn into_unit(self: Box<Self>) -> Result<Box<dyn Unit>, Box<dyn Instantiated>> {
        Err(self)
    }

    fn destroy(self: Box<Self>) {
        self.counts.borrow_mut().destroyed_objects += 1;
    }
}

type LoadHook = Box<dyn Fn(&AssetId)>;

#[derive(Default)]
struct LoaderState {
    counts: SharedCounts,
    next_serial: Cell<u64>,
    loads: RefCell<Vec<AssetId>>,
    releases: RefCell<Vec<AssetId>>,
    failures: RefCell<HashMap<AssetId, String>>,
    hanging: RefCell<HashSet<AssetId>>,
    orphans: RefCell<HashSet<AssetId>>,
    failing_preload: RefCell<HashSet<AssetId>>,
    stalled_preload: RefCell<HashSet<AssetId>>,
    refuse_placement: Cell<bool>,
    on_load: RefCell<Option<LoadHook>>,
}

struct ProbeTemplate {
    asset_id: AssetId,
    state: Rc<LoaderState>,
}

impl Template for ProbeTemplate {
    fn instantiate(&self) -> anyhow::Result<Box<dyn Instantiated>> {
        let counts = Rc::clone(&self.state.counts);
        if self.state.orphans.borrow().contains(&self.asset_id) {
            return Ok(Box::new(InertObject { counts }));
        }

        let serial = self.state.next_serial.get();
        self.state.next_serial.set(serial + 1);

        let mut unit = ProbeUnit::new(serial, &counts);
        unit.fail_preload = self.state.failing_preload.borrow().contains(&self.asset_id);
        unit.hang_preload = self.state.stalled_preload.borrow().contains(&self.asset_id);
        unit.refuse_placement = self.state.refuse_placement.get();
        Ok(UnitObject::boxed(unit))
    }
}

/// In-memory asset store; clones share state
#[derive(Clone, Default)]
pub struct MemoryLoader {
    state: Rc<LoaderState>,
}

impl MemoryLoader {
    /// Loader matching [`catalog`]: `games/orphan` yields a non-unit object
    /// and `games/flaky` yields units whose preload fails
    pub fn standard() -> Self {
        let loader = Self::default();
        loader.state.orphans.borrow_mut().insert(AssetId::new("games/orphan"));
        loader
            .state
            .failing_preload
            .borrow_mut()
            .insert(AssetId::new("games/flaky"));
        loader
    }

    /// Make loads of `asset` fail with `message`
    pub fn fail(&self, asset: &str, message: &str) {
        self.state
            .failures
            .borrow_mut()
            .insert(AssetId::new(asset), message.to_string());
    }

    /// Make loads of `asset` never complete
    pub fn hang(&self, asset: &str) {
        self.state.hanging.borrow_mut().insert(AssetId::new(asset));
    }

    /// Make units instantiated from `asset` hang in their preload hook
    pub fn stall_preload(&self, asset: &str) {
        self.state.stalled_preload.borrow_mut().insert(AssetId::new(asset));
    }

    /// Make every new unit reject its placement
    pub fn refuse_placement(&self, refuse: bool) {
        self.state.refuse_placement.set(refuse);
    }

    /// Run `hook` at the start of every load
    pub fn on_load(&self, hook: impl Fn(&AssetId) + 'static) {
        *self.state.on_load.borrow_mut() = Some(Box::new(hook));
    }

    pub fn counts(&self) -> SharedCounts {
        Rc::clone(&self.state.counts)
    }

    pub fn loads(&self) -> Vec<AssetId> {
        self.state.loads.borrow().clone()
    }

    pub fn releases(&self) -> Vec<AssetId> {
        self.state.releases.borrow().clone()
    }

    pub fn load_count(&self, asset: &str) -> usize {
        self.state.loads.borrow().iter().filter(|a| a.as_str() == asset).count()
    }

    pub fn release_count(&self, asset: &str) -> usize {
        self.state.releases.borrow().iter().filter(|a| a.as_str() == asset).count()
    }
}

impl ResourceLoader for MemoryLoader {
    fn load<'a>(
        &'a self,
        asset_id: &'a AssetId,
        _cancel: &'a CancellationToken,
    ) -> LocalBoxFuture<'a, anyhow::Result<Box<dyn Template>>> {
        Box::pin(async move {
            self.state.loads.borrow_mut().push(asset_id.clone());
            if let Some(hook) = self.state.on_load.borrow().as_ref() {
                hook(asset_id);
            }

            if self.state.hanging.borrow().contains(asset_id) {
                future::pending::<()>().await;
            }

            if let Some(message) = self.state.failures.borrow().get(asset_id) {
                anyhow::bail!("{}", message);
            }

            let template: Box<dyn Template> = Box::new(ProbeTemplate {
                asset_id: asset_id.clone(),
                state: Rc::clone(&self.state),
            });
            Ok(template)
        })
    }

    fn release(&self, asset_id: &AssetId, template: Box<dyn Template>) {
        drop(template);
        self.state.releases.borrow_mut().push(asset_id.clone());
    }
}
