//! Debug-only reentrancy detection for dropper call sites.
//!
//! `StrMap` runs a user-supplied dropper callback during `put` (on
//! overwrite) and during map drop. Safe callers cannot reach the map
//! from inside that callback, but a callback holding a raw pointer
//! could. In debug builds a second entry into a guarded section panics
//! immediately instead of corrupting the table; in release builds the
//! guard compiles to nothing.

use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug, Default)]
pub(crate) struct MutationGuard {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
    // Keeps the guard !Send + !Sync, matching the single-threaded map.
    _nosend: PhantomData<*mut ()>,
}

impl MutationGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
            _nosend: PhantomData,
        }
    }

    /// Enter a mutating section. Panics in debug builds if the section
    /// is already active, i.e. a dropper callback re-entered the map.
    #[inline]
    pub(crate) fn enter(&self) -> MutationSection<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.replace(true),
                "map re-entered from inside a dropper callback"
            );
        }
        MutationSection { owner: self }
    }
}

/// RAII token for an active mutating section.
pub(crate) struct MutationSection<'a> {
    owner: &'a MutationGuard,
}

impl Drop for MutationSection<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.active.set(false);
        #[cfg(not(debug_assertions))]
        let _ = self.owner;
    }
}
