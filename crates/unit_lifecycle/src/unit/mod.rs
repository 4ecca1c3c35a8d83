//! Unit contract and per-instance state tracking
//!
//! A unit is a self-contained interactive experience (a mini-game, a demo
//! scene). Hosts implement [`Unit`]; the subsystem wraps every live object in
//! a [`UnitInstance`] that tracks where it is in its lifecycle and refuses
//! transitions that make no sense (resuming a stopped unit, pausing a pooled
//! one).

pub mod catalog;
pub mod kind;

pub use catalog::UnitCatalog;
pub use kind::{UnitCapabilities, UnitCategory, UnitDescriptor, UnitKind, UnitTypeId};

use std::fmt;

use futures::future::{self, LocalBoxFuture};

use crate::assets::Placement;
use crate::error::{LifecycleError, LifecycleResult};
use crate::foundation::CancellationToken;

/// Lifecycle hooks every unit exposes
///
/// Only [`start`](Unit::start), [`stop`](Unit::stop) and
/// [`dispose`](Unit::dispose) are required. The pooling hooks are only
/// called for poolable types.
pub trait Unit {
    /// Asynchronous warm-up run once after instantiation
    ///
    /// Long-running preloads should watch `cancel` and bail out early.
    fn preload<'a>(
        &'a mut self,
        _cancel: &'a CancellationToken,
    ) -> LocalBoxFuture<'a, anyhow::Result<()>> {
        Box::pin(future::ready(Ok::<(), anyhow::Error>(())))
    }

    /// Begin running
    fn start(&mut self);

    /// Suspend without tearing down
    fn pause(&mut self) {}

    /// Continue after [`pause`](Unit::pause)
    fn resume(&mut self) {}

    /// Reset to the initial running state
    fn restart(&mut self) {
        self.stop();
        self.start();
    }

    /// Stop running; the unit may be started again or pooled afterwards
    fn stop(&mut self);

    /// Release everything the unit owns; called exactly once
    fn dispose(&mut self);

    /// Toggle visibility and participation in the scene
    fn set_active(&mut self, _active: bool) {}

    /// Called before the unit is parked in the pool
    fn on_pooled(&mut self) {}

    /// Called after the unit is taken back out of the pool
    fn on_unpooled(&mut self) {}

    /// Move the unit to its assigned spot
    fn place(&mut self, _placement: &Placement) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Identity of a single unit instance, unique within one factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an instance is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitState {
    /// Produced by the factory, preload hook not yet run
    Instantiated,
    /// Preloaded and ready to start
    Preloaded,
    /// Running
    Active,
    /// Suspended while current
    Paused,
    /// Stopped, waiting to be pooled or disposed
    Stopped,
    /// Parked inactive in the pool
    Pooled,
}

impl UnitState {
    /// Whether the unit is running or paused
    pub fn is_running(self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }
}

/// A live unit plus the bookkeeping the subsystem needs about it
///
/// Disposal consumes the instance, so the dispose hook can only ever run once.
/// An instance dropped without [`dispose`](Self::dispose), such as one owned
/// by an abandoned load future, is disposed on drop.
pub struct UnitInstance {
    id: InstanceId,
    unit_type: UnitTypeId,
    state: UnitState,
    unit: Box<dyn Unit>,
    disposed: bool,
}

impl UnitInstance {
    /// Wrap a freshly instantiated unit
    pub fn new(id: InstanceId, unit_type: UnitTypeId, unit: Box<dyn Unit>) -> Self {
        Self {
            id,
            unit_type,
            state: UnitState::Instantiated,
            unit,
            disposed: false,
        }
    }

    /// Instance identity
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Type of the unit
    pub fn unit_type(&self) -> UnitTypeId {
        self.unit_type
    }

    /// Current lifecycle state
    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Borrow the host object
    pub fn unit(&self) -> &dyn Unit {
        self.unit.as_ref()
    }

    /// Mutably borrow the host object
    pub fn unit_mut(&mut self) -> &mut dyn Unit {
        self.unit.as_mut()
    }

    /// Run the unit's preload hook, honoring cancellation
    pub async fn preload(&mut self, cancel: &CancellationToken) -> LifecycleResult<()> {
        let unit_type = self.unit_type;
        match cancel.run_until_cancelled(self.unit.preload(cancel)).await? {
            Ok(()) => {
                self.state = UnitState::Preloaded;
                Ok(())
            }
            Err(source) => Err(LifecycleError::UnitPreload { unit_type, source }),
        }
    }

    /// Start the unit unless it is already running
    pub fn start(&mut self) {
        if self.state.is_running() {
            log::warn!("{} {} is already running, ignoring start", self.unit_type, self.id);
            return;
        }
        self.unit.start();
        self.state = UnitState::Active;
    }

    /// Pause a running unit
    pub fn pause(&mut self) {
        if self.state != UnitState::Active {
            log::warn!("Cannot pause {} {} in state {:?}", self.unit_type, self.id, self.state);
            return;
        }
        self.unit.pause();
        self.state = UnitState::Paused;
    }

    /// Resume a paused unit
    pub fn resume(&mut self) {
        if self.state != UnitState::Paused {
            log::warn!("Cannot resume {} {} in state {:?}", self.unit_type, self.id, self.state);
            return;
        }
        self.unit.resume();
        self.state = UnitState::Active;
    }

    /// Restart a running or paused unit
    pub fn restart(&mut self) {
        if !self.state.is_running() {
            log::warn!("Cannot restart {} {} in state {:?}", self.unit_type, self.id, self.state);
            return;
        }
        self.unit.restart();
        self.state = UnitState::Active;
    }

    /// Stop the unit if it is running
    pub fn stop(&mut self) {
        if self.state.is_running() {
            self.unit.stop();
        }
        self.state = UnitState::Stopped;
    }

    /// Forward a placement to the host object
    pub fn place(&mut self, placement: &Placement) -> anyhow::Result<()> {
        self.unit.place(placement)
    }

    /// Tear the unit down
    pub fn dispose(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if self.state.is_running() {
            log::debug!("Stopping {} {} before disposal", self.unit_type, self.id);
            self.unit.stop();
        }
        log::debug!("Disposing {} {}", self.unit_type, self.id);
        self.unit.dispose();
    }

    /// Pool entry hook
    pub(crate) fn notify_pooled(&mut self) {
        self.unit.on_pooled();
    }

    /// Park the instance inactive
    pub(crate) fn park(&mut self) {
        self.unit.set_active(false);
        self.state = UnitState::Pooled;
    }

    /// Take the instance back out of the pool
    pub(crate) fn unpark(&mut self) {
        self.unit.set_active(true);
        self.unit.on_unpooled();
        self.state = UnitState::Preloaded;
    }
}

impl Drop for UnitInstance {
    fn drop(&mut self) {
        if !self.disposed {
            log::debug!("{} {} dropped without dispose", self.unit_type, self.id);
            self.teardown();
        }
    }
}

impl fmt::Debug for UnitInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitInstance")
            .field("id", &self.id)
            .field("unit_type", &self.unit_type)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
