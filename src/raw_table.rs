//! RawTable: structural layer of the map.
//!
//! Owns the slot array and implements linear probing, tombstone
//! deletion and the load-factor resize engine. This layer never calls
//! user code; the dropper capability lives one layer up in `str_map`.
//!
//! Probing discipline: a scan starts at `hash(key) % capacity` and
//! walks forward with wraparound. An Empty slot terminates the scan;
//! Tombstone slots never do, because a colliding key inserted after the
//! deleted one may live beyond them. The resize policy keeps `load`
//! strictly below capacity whenever allocation succeeds, so scans
//! normally hit an Empty slot; every loop is additionally bounded to
//! `capacity` probes so termination survives refused growth.

use crate::fnv::fnv_hash;
use core::fmt;
use core::mem;
use std::collections::TryReserveError;

/// Tables never shrink below this many slots.
pub(crate) const MIN_CAPACITY: usize = 10;
/// Grow when load reaches this percentage of capacity.
const GROW_AT_PERCENT: usize = 70;
/// Shrink when load falls to this percentage of capacity.
const SHRINK_AT_PERCENT: usize = 25;
const RESIZE_FACTOR: usize = 2;

/// The only failure the map reports: a refused memory allocation.
///
/// Raised by the initial table allocation, the per-entry key copy, and
/// the resize rebuild. Operations that hit it leave the map in its
/// prior valid state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory allocation failed")
    }
}

impl std::error::Error for AllocError {}

impl From<TryReserveError> for AllocError {
    fn from(_: TryReserveError) -> Self {
        AllocError
    }
}

/// Tri-state slot. A slot becomes Occupied only by inserting a new key
/// and Tombstone only by deleting that key; only a rebuild returns it
/// to Empty.
#[derive(Debug)]
pub(crate) enum Slot<V> {
    Empty,
    Occupied { key: String, value: V },
    Tombstone,
}

pub(crate) struct RawTable<V> {
    slots: Vec<Slot<V>>,
    /// Occupied slots only.
    count: usize,
    /// Occupied + Tombstone slots. Resize thresholds compare this, not
    /// `count`, so tombstone buildup alone can force a grow.
    load: usize,
}

impl<V> RawTable<V> {
    pub(crate) fn new() -> Result<Self, AllocError> {
        Ok(Self {
            slots: alloc_slots(MIN_CAPACITY)?,
            count: 0,
            load: 0,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn count(&self) -> usize {
        self.count
    }

    #[inline]
    fn bucket(&self, key: &str) -> usize {
        (fnv_hash(key.as_bytes()) % self.slots.len() as u64) as usize
    }

    /// Probe for `key`. Returns the index of its Occupied slot, or
    /// `None` after hitting an Empty slot or visiting every slot once.
    fn probe(&self, key: &str) -> Option<usize> {
        let cap = self.slots.len();
        let mut idx = self.bucket(key);
        for _ in 0..cap {
            match &self.slots[idx] {
                Slot::Empty => return None,
                Slot::Occupied { key: k, .. } if k == key => return Some(idx),
                _ => {}
            }
            idx += 1;
            if idx == cap {
                idx = 0;
            }
        }
        None
    }

    pub(crate) fn get(&self, key: &str) -> Option<&V> {
        match self.probe(key).map(|i| &self.slots[i]) {
            Some(Slot::Occupied { value, .. }) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        match self.probe(key).map(|i| &mut self.slots[i]) {
            Some(Slot::Occupied { value, .. }) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.probe(key).is_some()
    }

    /// Place `value` under `key`, returning the displaced value on
    /// overwrite. The grow check runs before placement; a failed
    /// rebuild is swallowed and placement proceeds against the current
    /// table, which stays correct at any load below full.
    pub(crate) fn put(&mut self, key: &str, value: V) -> Result<Option<V>, AllocError> {
        if self.load * 100 / self.capacity() >= GROW_AT_PERCENT {
            let _ = self.rebuild(self.capacity() * RESIZE_FACTOR);
        }

        let cap = self.capacity();
        let mut idx = self.bucket(key);
        let mut claim = None;
        for _ in 0..cap {
            match &mut self.slots[idx] {
                Slot::Empty => {
                    claim = Some(idx);
                    break;
                }
                Slot::Occupied { key: k, value: v } if k.as_str() == key => {
                    return Ok(Some(mem::replace(v, value)));
                }
                // Tombstones are skipped, never reclaimed: reclaiming
                // one would break the probe sequence of a colliding
                // key inserted after the deletion.
                _ => {}
            }
            idx += 1;
            if idx == cap {
                idx = 0;
            }
        }

        // A full scan without a match or an Empty slot is only
        // reachable once growth has been refused; report it as the
        // allocation failure it is rather than loop forever.
        let Some(idx) = claim else {
            return Err(AllocError);
        };

        // Copy the key before touching any slot or counter so a failed
        // copy leaves the table untouched.
        let owned = copy_key(key)?;
        self.slots[idx] = Slot::Occupied { key: owned, value };
        self.count += 1;
        self.load += 1;
        Ok(None)
    }

    /// Remove `key` and return its value by move. The shrink check runs
    /// before the lookup, mirroring the put-side ordering, and a failed
    /// rebuild is swallowed. `load` is not decremented: the Tombstone
    /// still occupies a probe position.
    pub(crate) fn remove(&mut self, key: &str) -> Option<V> {
        if self.load * 100 / self.capacity() <= SHRINK_AT_PERCENT {
            let target = (self.capacity() / RESIZE_FACTOR).max(MIN_CAPACITY);
            // A rebuild at unchanged capacity with zero tombstones
            // would reproduce the table verbatim; skip it.
            if target != self.capacity() || self.load != self.count {
                let _ = self.rebuild(target);
            }
        }

        let idx = self.probe(key)?;
        let Slot::Occupied { value, .. } = mem::replace(&mut self.slots[idx], Slot::Tombstone)
        else {
            unreachable!("probe only returns occupied indices");
        };
        self.count -= 1;
        Some(value)
    }

    /// Replace the slot array with a fresh all-Empty one of `capacity`
    /// slots and re-place every Occupied entry under the new modulus,
    /// moving key ownership. Tombstones are dropped, so afterwards
    /// `load == count`. On allocation failure the table is unchanged.
    fn rebuild(&mut self, capacity: usize) -> Result<(), AllocError> {
        let fresh = alloc_slots(capacity)?;
        let old = mem::replace(&mut self.slots, fresh);
        self.count = 0;
        self.load = 0;
        for slot in old {
            if let Slot::Occupied { key, value } = slot {
                self.place_moved(key, value);
            }
        }
        Ok(())
    }

    /// Placement used by rebuilds. Migrated keys are pairwise distinct
    /// and the fresh table is large enough to keep Empty slots, so the
    /// scan needs no match arm and cannot fail.
    fn place_moved(&mut self, key: String, value: V) {
        let cap = self.capacity();
        let mut idx = self.bucket(key.as_str());
        while !matches!(self.slots[idx], Slot::Empty) {
            idx += 1;
            if idx == cap {
                idx = 0;
            }
        }
        self.slots[idx] = Slot::Occupied { key, value };
        self.count += 1;
        self.load += 1;
    }

    /// Index of the first Occupied slot at or after `from`.
    pub(crate) fn next_occupied(&self, from: usize) -> Option<usize> {
        (from..self.slots.len()).find(|&i| matches!(self.slots[i], Slot::Occupied { .. }))
    }

    /// Key stored at `idx`, if that slot is Occupied.
    pub(crate) fn key_at(&self, idx: usize) -> Option<&str> {
        match self.slots.get(idx) {
            Some(Slot::Occupied { key, .. }) => Some(key),
            _ => None,
        }
    }

    /// Move every live value out for map teardown, releasing the owned
    /// keys along the way.
    pub(crate) fn take_each_value(&mut self, mut f: impl FnMut(V)) {
        for slot in &mut self.slots {
            if let Slot::Occupied { value, .. } = mem::replace(slot, Slot::Empty) {
                f(value);
            }
        }
        self.count = 0;
        self.load = 0;
    }

    /// Occupied and non-Empty totals recounted from the slots, for
    /// cross-checking the cached counters.
    #[cfg(test)]
    pub(crate) fn recount(&self) -> (usize, usize) {
        let occupied = self
            .slots
            .iter()
            .filter(|s| matches!(s, Slot::Occupied { .. }))
            .count();
        let tombstones = self
            .slots
            .iter()
            .filter(|s| matches!(s, Slot::Tombstone))
            .count();
        (occupied, occupied + tombstones)
    }

    #[cfg(test)]
    pub(crate) fn load(&self) -> usize {
        self.load
    }
}

fn alloc_slots<V>(capacity: usize) -> Result<Vec<Slot<V>>, AllocError> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(capacity)?;
    for _ in 0..capacity {
        slots.push(Slot::Empty);
    }
    Ok(slots)
}

fn copy_key(key: &str) -> Result<String, AllocError> {
    let mut owned = String::new();
    owned.try_reserve_exact(key.len())?;
    owned.push_str(key);
    Ok(owned)
}
