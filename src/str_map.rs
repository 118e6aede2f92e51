//! StrMap: public layer owning a `RawTable` plus the optional dropper
//! capability, and the external iterator over live keys.

use crate::guard::MutationGuard;
use crate::raw_table::{AllocError, RawTable};

/// Open-addressing hash map from string keys to values of type `V`.
///
/// Collisions resolve by linear probing, deletions leave tombstones,
/// and the table doubles at 70% load and halves at 25% (never below
/// the minimum capacity of 10 slots).
///
/// A dropper registered at construction is invoked on a stored value at
/// exactly two points: when `put` overwrites it and when the map itself
/// is dropped. [`StrMap::remove`] hands the value back by move without
/// running the dropper. Without a dropper, values are simply dropped at
/// those same points.
///
/// Single-threaded by design; the map is `!Send`/`!Sync`.
pub struct StrMap<V> {
    table: RawTable<V>,
    dropper: Option<Box<dyn FnMut(V)>>,
    guard: MutationGuard,
}

impl<V> StrMap<V> {
    /// Create an empty map. The initial slot allocation is fallible,
    /// like every other allocation the map performs.
    pub fn new() -> Result<Self, AllocError> {
        Ok(Self {
            table: RawTable::new()?,
            dropper: None,
            guard: MutationGuard::new(),
        })
    }

    /// Create an empty map with a dropper that is run on values the
    /// map destroys (overwrite and map drop, never `remove`).
    pub fn with_dropper(dropper: impl FnMut(V) + 'static) -> Result<Self, AllocError> {
        Ok(Self {
            table: RawTable::new()?,
            dropper: Some(Box::new(dropper)),
            guard: MutationGuard::new(),
        })
    }

    /// Associate `value` with `key`, overwriting any current value for
    /// that key (the overwritten value goes to the dropper). On
    /// allocation failure the map is unchanged: the key copy is made
    /// before any slot is touched, and a refused grow merely degrades
    /// probe lengths until a later put succeeds in growing.
    pub fn put(&mut self, key: &str, value: V) -> Result<(), AllocError> {
        let _section = self.guard.enter();
        if let Some(old) = self.table.put(key, value)? {
            match self.dropper.as_mut() {
                Some(dropper) => dropper(old),
                None => drop(old),
            }
        }
        Ok(())
    }

    /// Look up `key`. Absence is an ordinary `None`, never an error.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.table.get(key)
    }

    /// Mutable lookup. The key itself is immutable once stored.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.table.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.table.contains(key)
    }

    /// Remove `key`, transferring ownership of its value to the caller.
    /// The dropper is never run by this call.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let _section = self.guard.enter();
        self.table.remove(key)
    }

    /// Number of live entries. Tombstones are not counted.
    pub fn len(&self) -> usize {
        self.table.count()
    }

    pub fn is_empty(&self) -> bool {
        self.table.count() == 0
    }

    /// Current slot count. Starts at 10 and moves only in powers of two
    /// multiples of it as the resize policy fires.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Cursor over the live keys in slot order. The cursor borrows the
    /// map, so the compiler rejects any insertion or removal while it
    /// exists; a resize invalidating a live cursor cannot happen.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            table: &self.table,
            pos: self.table.next_occupied(0),
        }
    }
}

impl<V> Drop for StrMap<V> {
    /// Runs the dropper, if registered, on every live value exactly
    /// once. Keys and the slot array are released either way.
    fn drop(&mut self) {
        let _section = self.guard.enter();
        if let Some(dropper) = self.dropper.as_mut() {
            self.table.take_each_value(|v| dropper(v));
        }
    }
}

/// External cursor over a map's live keys, in slot-index order.
///
/// Freshly created, it sits on the lowest occupied slot, or already
/// at the end for an empty map. Also usable as a plain `Iterator`
/// yielding each key once.
pub struct Iter<'a, V> {
    table: &'a RawTable<V>,
    /// Current slot index; `None` is the end sentinel.
    pos: Option<usize>,
}

impl<'a, V> Iter<'a, V> {
    /// True once the cursor has passed the last live entry.
    pub fn at_end(&self) -> bool {
        self.pos.is_none()
    }

    /// Key under the cursor, or `None` at the end.
    pub fn current(&self) -> Option<&'a str> {
        self.pos.and_then(|i| self.table.key_at(i))
    }

    /// Move to the next occupied slot. Returns whether the cursor
    /// landed on one.
    pub fn advance(&mut self) -> bool {
        let Some(pos) = self.pos else {
            return false;
        };
        self.pos = self.table.next_occupied(pos + 1);
        self.pos.is_some()
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.current()?;
        self.advance();
        Some(key)
    }
}

impl<'a, V> IntoIterator for &'a StrMap<V> {
    type Item = &'a str;
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Invariant: the dropper runs exactly once per overwrite, on the
    /// displaced value, at the moment of the put.
    #[test]
    fn overwrite_drops_old_value_once() {
        let dropped: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let seen = Rc::clone(&dropped);
        let mut m = StrMap::with_dropper(move |v: i32| {
            assert!(seen.take().is_none(), "dropper ran twice");
            seen.set(Some(v));
        })
        .unwrap();

        m.put("k", 1).unwrap();
        assert_eq!(dropped.get(), None);

        m.put("k", 2).unwrap();
        assert_eq!(dropped.take(), Some(1));
        assert_eq!(m.get("k"), Some(&2));

        // Leave nothing live so the final drop stays silent.
        assert_eq!(m.remove("k"), Some(2));
    }

    /// Invariant: `remove` transfers the value out without running the
    /// dropper; only values still live at map drop reach it.
    #[test]
    fn remove_bypasses_dropper() {
        let calls = Rc::new(Cell::new(0usize));
        let c = Rc::clone(&calls);
        {
            let mut m = StrMap::with_dropper(move |_v: String| c.set(c.get() + 1)).unwrap();
            m.put("taken", "by caller".to_string()).unwrap();
            m.put("left", "for the map".to_string()).unwrap();

            let v = m.remove("taken").expect("present");
            assert_eq!(v, "by caller");
            assert_eq!(calls.get(), 0);
        }
        // Map drop ran the dropper for the one remaining value.
        assert_eq!(calls.get(), 1);
    }

    /// Invariant: without a dropper, values still drop normally on
    /// overwrite and map drop (ordinary Rust ownership).
    #[test]
    fn plain_ownership_without_dropper() {
        let mut m: StrMap<Vec<u8>> = StrMap::new().unwrap();
        m.put("k", vec![1, 2, 3]).unwrap();
        m.put("k", vec![4]).unwrap();
        assert_eq!(m.get("k").map(Vec::as_slice), Some(&[4][..]));
        assert_eq!(m.len(), 1);
    }

    /// Invariant: `get_mut` mutates in place and later reads observe
    /// the change.
    #[test]
    fn get_mut_updates_in_place() {
        let mut m: StrMap<i32> = StrMap::new().unwrap();
        m.put("n", 1).unwrap();
        *m.get_mut("n").unwrap() += 41;
        assert_eq!(m.get("n"), Some(&42));
        assert!(m.get_mut("absent").is_none());
    }

    /// Invariant: a cursor on an empty map is at the end before any
    /// advance, and `current`/`advance` report absence.
    #[test]
    fn empty_map_cursor_starts_at_end() {
        let m: StrMap<i32> = StrMap::new().unwrap();
        let mut it = m.iter();
        assert!(it.at_end());
        assert_eq!(it.current(), None);
        assert!(!it.advance());
        assert!(it.at_end());
    }

    /// Invariant: the cursor visits each live key exactly once in slot
    /// order, and the `Iterator` impl agrees with the cursor API.
    #[test]
    fn cursor_visits_each_key_once() {
        let mut m: StrMap<i32> = StrMap::new().unwrap();
        m.put("a", 1).unwrap();
        m.put("b", 2).unwrap();
        m.put("c", 3).unwrap();

        let mut seen = Vec::new();
        let mut it = m.iter();
        while !it.at_end() {
            seen.push(it.current().unwrap().to_string());
            it.advance();
        }
        seen.sort();
        assert_eq!(seen, ["a", "b", "c"]);

        let mut again: Vec<&str> = m.iter().collect();
        again.sort();
        assert_eq!(again, ["a", "b", "c"]);

        // For-loop sugar via IntoIterator on &map.
        let mut n = 0;
        for key in &m {
            assert!(m.contains(key));
            n += 1;
        }
        assert_eq!(n, 3);
    }

    /// Invariant: tombstones are invisible to iteration.
    #[test]
    fn cursor_skips_tombstones() {
        let mut m: StrMap<i32> = StrMap::new().unwrap();
        for k in ["a", "b", "c", "d"] {
            m.put(k, 0).unwrap();
        }
        assert_eq!(m.remove("b"), Some(0));
        assert_eq!(m.remove("d"), Some(0));

        let mut seen: Vec<&str> = m.iter().collect();
        seen.sort();
        assert_eq!(seen, ["a", "c"]);
    }

    /// Invariant (debug builds): a dropper that re-enters the map
    /// through a raw pointer trips the mutation guard instead of
    /// corrupting the table.
    #[cfg(debug_assertions)]
    #[test]
    fn dropper_reentry_panics_in_debug() {
        let target: Rc<Cell<*mut StrMap<i32>>> = Rc::new(Cell::new(std::ptr::null_mut()));
        let t = Rc::clone(&target);
        let mut m = Box::new(
            StrMap::with_dropper(move |_old: i32| {
                let p = t.get();
                if !p.is_null() {
                    let _ = unsafe { (*p).remove("other") };
                }
            })
            .unwrap(),
        );
        target.set(&mut *m as *mut StrMap<i32>);

        m.put("k", 1).unwrap();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            // Overwrite runs the dropper, which re-enters remove().
            let _ = m.put("k", 2);
        }));
        assert!(res.is_err(), "expected the guard to panic in debug");

        // Disarm before the map's own drop runs the dropper again.
        target.set(std::ptr::null_mut());
    }
}
