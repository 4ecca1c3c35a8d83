//! Unit Pool
//!
//! Owns parked instances of poolable unit types. Instances checked out through
//! [`UnitPool::try_get`] are owned by the caller; the pool only remembers
//! their ids so it can retire them when their bucket is cleared.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::unit::{InstanceId, UnitInstance, UnitTypeId};

use super::PoolConfig;

/// One bucket per unit type
#[derive(Debug)]
struct PoolBucket {
    /// Parked instances, oldest first
    inactive: VecDeque<UnitInstance>,
    /// Checked-out instances
    active: HashSet<InstanceId>,
    capacity: usize,
}

impl PoolBucket {
    fn new(capacity: usize) -> Self {
        Self {
            inactive: VecDeque::with_capacity(capacity),
            active: HashSet::new(),
            capacity,
        }
    }
}

/// Statistics for the unit pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances handed back out by `try_get`
    pub reused: u64,
    /// Instances parked by `release` or `warm_up`
    pub returned: u64,
    /// Instances disposed because their bucket was full
    pub evicted: u64,
    /// Instances disposed by the pool for any reason
    pub disposed: u64,
}

/// Bounded FIFO pool of unit instances, keyed by unit type
#[derive(Debug)]
pub struct UnitPool {
    config: PoolConfig,
    buckets: HashMap<UnitTypeId, PoolBucket>,
    /// Checked-out instances whose bucket was cleared
    retired: HashSet<InstanceId>,
    stats: PoolStats,
    disposed: bool,
}

impl UnitPool {
    /// Create an empty pool
    pub fn new(config: PoolConfig) -> Self {
        log::info!(
            "Creating UnitPool (default capacity {}, {} override(s))",
            config.default_capacity,
            config.capacities.len()
        );
        Self {
            config,
            buckets: HashMap::new(),
            retired: HashSet::new(),
            stats: PoolStats::default(),
            disposed: false,
        }
    }

    /// Take the longest-parked instance of `unit_type`, if any
    ///
    /// The returned instance has been reactivated and its unpooled hook has run.
    pub fn try_get(&mut self, unit_type: UnitTypeId) -> Option<UnitInstance> {
        if self.disposed {
            log::warn!("Ignoring try_get({}) on a disposed UnitPool", unit_type);
            return None;
        }

        let bucket = self.buckets.get_mut(&unit_type)?;
        let mut unit = bucket.inactive.pop_front()?;
        unit.unpark();
        bucket.active.insert(unit.id());
        self.stats.reused += 1;
        log::debug!(
            "Reusing {} {} ({} left in pool)",
            unit_type,
            unit.id(),
            bucket.inactive.len()
        );
        Some(unit)
    }

    /// Return a stopped instance to its bucket
    ///
    /// Runs the unit's pooled hook, then parks it, or disposes it if the
    /// bucket is already full.
    pub fn release(&mut self, unit: UnitInstance) {
        if self.disposed {
            log::warn!("Releasing {} {} into a disposed UnitPool, disposing it", unit.unit_type(), unit.id());
            self.dispose_unit(unit);
            return;
        }

        if self.retired.remove(&unit.id()) {
            log::debug!("{} {} was retired while checked out, disposing it", unit.unit_type(), unit.id());
            self.dispose_unit(unit);
            return;
        }

        self.insert(unit);
    }

    /// Seed the pool with an instance that was never checked out
    ///
    /// Follows the same capacity rule as [`release`](Self::release).
    pub fn warm_up(&mut self, unit: UnitInstance) {
        if self.disposed {
            log::warn!("Warming {} {} into a disposed UnitPool, disposing it", unit.unit_type(), unit.id());
            self.dispose_unit(unit);
            return;
        }

        self.insert(unit);
    }

    /// Record an instance created outside the pool as checked out
    ///
    /// Clearing its type then retires it the same way as an instance taken
    /// with [`try_get`](Self::try_get).
    pub fn track_active(&mut self, unit: &UnitInstance) {
        if self.disposed {
            log::warn!("Ignoring track_active({}) on a disposed UnitPool", unit.unit_type());
            return;
        }

        let unit_type = unit.unit_type();
        let capacity = self.config.capacity_for(unit_type);
        self.buckets
            .entry(unit_type)
            .or_insert_with(|| PoolBucket::new(capacity))
            .active
            .insert(unit.id());
    }

    /// Dispose every parked instance of `unit_type` and retire checked-out ones
    pub fn clear_for_type(&mut self, unit_type: UnitTypeId) {
        if self.disposed {
            log::warn!("Ignoring clear_for_type({}) on a disposed UnitPool", unit_type);
            return;
        }

        let Some(bucket) = self.buckets.remove(&unit_type) else {
            return;
        };

        let parked = bucket.inactive.len();
        let checked_out = bucket.active.len();
        for unit in bucket.inactive {
            self.dispose_unit(unit);
        }
        self.retired.extend(bucket.active);
        log::debug!(
            "Cleared pool for {}: disposed {}, retired {} checked out",
            unit_type,
            parked,
            checked_out
        );
    }

    /// Unit types that currently have a bucket
    pub fn list_pooled_types(&self) -> Vec<UnitTypeId> {
        self.buckets.keys().copied().collect()
    }

    /// Clear every bucket and refuse further use
    ///
    /// Calling this again is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            log::debug!("UnitPool already disposed");
            return;
        }

        for unit_type in self.list_pooled_types() {
            self.clear_for_type(unit_type);
        }
        self.disposed = true;
        log::info!("UnitPool disposed: {:?}", self.stats);
    }

    /// Parked instances of `unit_type`
    pub fn pooled_count(&self, unit_type: UnitTypeId) -> usize {
        self.buckets
            .get(&unit_type)
            .map_or(0, |bucket| bucket.inactive.len())
    }

    /// Checked-out instances of `unit_type`
    pub fn active_count(&self, unit_type: UnitTypeId) -> usize {
        self.buckets
            .get(&unit_type)
            .map_or(0, |bucket| bucket.active.len())
    }

    /// Capacity that applies to `unit_type`
    pub fn capacity_for(&self, unit_type: UnitTypeId) -> usize {
        self.buckets
            .get(&unit_type)
            .map_or_else(|| self.config.capacity_for(unit_type), |bucket| bucket.capacity)
    }

    /// Pool statistics
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Whether [`dispose`](Self::dispose) has run
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn insert(&mut self, mut unit: UnitInstance) {
        let unit_type = unit.unit_type();
        let capacity = self.config.capacity_for(unit_type);
        let bucket = self
            .buckets
            .entry(unit_type)
            .or_insert_with(|| PoolBucket::new(capacity));

        bucket.active.remove(&unit.id());
        unit.notify_pooled();

        if bucket.inactive.len() >= bucket.capacity {
            log::warn!(
                "Pool for {} is full ({}), disposing {}",
                unit_type,
                bucket.capacity,
                unit.id()
            );
            self.stats.evicted += 1;
            self.dispose_unit(unit);
            return;
        }

        unit.park();
        bucket.inactive.push_back(unit);
        self.stats.returned += 1;
        log::debug!("Pooled {} ({}/{})", unit_type, bucket.inactive.len(), bucket.capacity);
    }

    fn dispose_unit(&mut self, unit: UnitInstance) {
        unit.dispose();
        self.stats.disposed += 1;
    }
}

impl Drop for UnitPool {
    fn drop(&mut self) {
        if !self.disposed {
            self.dispose();
        }
    }
}
