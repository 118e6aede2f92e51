//! strmap: a single-threaded, open-addressing hash map from string
//! keys to opaque values, with linear probing, tombstone deletion and
//! load-factor resizing.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep the subtle parts (probe-sequence integrity across
//!   deletions and resizes, amortized resize cost, iterator safety)
//!   in small layers that can be reasoned about independently.
//! - Layers:
//!   - fnv: the bucket-distribution hash, a seedless multiply-then-xor
//!     FNV-1 variant preserved bit-for-bit so bucket layout is
//!     deterministic.
//!   - RawTable<V>: structural layer. Owns the tri-state slot array
//!     (Empty / Occupied / Tombstone), the probing loops, and the
//!     resize engine. Never calls user code.
//!   - StrMap<V>: public API. Adds the optional dropper capability and
//!     the external key cursor; the only layer that runs user code.
//!
//! Constraints
//! - Single-threaded: the boxed dropper makes the map `!Send`/`!Sync`;
//!   no atomics, no locks.
//! - Keys are owned `String` copies; values are owned and handed back
//!   by move on `remove`.
//! - Capacity never drops below 10 slots, and the resize policy
//!   (grow at 70% load, shrink at 25%) keeps at least one Empty slot
//!   whenever allocation succeeds, which is what guarantees probe
//!   termination. Probe loops are additionally capacity-bounded as a
//!   safety net for refused growth.
//! - Load counts Occupied plus Tombstone slots. Deletion churn alone
//!   can therefore trigger a grow; the rebuild purges every tombstone,
//!   which is what bounds worst-case probe length.
//!
//! Why this split?
//! - Localize invariants: counter bookkeeping and probe discipline live
//!   entirely in `RawTable`; dropper call sites live entirely in
//!   `StrMap`; neither can violate the other's contract.
//! - Clear failure boundaries: every allocation (initial table, key
//!   copy, rebuild) is fallible and surfaces as [`AllocError`]. A put
//!   fails atomically; a rebuild that cannot allocate is skipped and
//!   the triggering operation completes against the old table.
//!
//! Dropper policy
//! - An optional `FnMut(V)` supplied at construction runs on a stored
//!   value at exactly two points: overwrite by `put`, and map drop.
//!   `remove` never runs it: removal transfers value ownership to the
//!   caller. A debug-only guard panics if the dropper re-enters the
//!   map through a raw pointer.
//!
//! Iteration
//! - `StrMap::iter` is an external cursor (`current` / `advance` /
//!   `at_end`) over live keys in slot order, doubling as a plain
//!   `Iterator`. It borrows the map shared-ly, so mutation while a
//!   cursor is live (the classic invalidated-by-resize hazard) is a
//!   compile error rather than a documented precondition.
//!
//! Notes and non-goals
//! - No thread-safety, no generic key types, no persistence, no
//!   cryptographic hashing. The hash is a distribution aid only.
//! - Tombstone slots are skipped during probes and never reclaimed by
//!   insertion; only a rebuild returns them to Empty.
//! - Public API surface is `StrMap`, `Iter` and `AllocError`; the
//!   structural layer is an implementation detail.

mod fnv;
mod guard;
mod raw_table;
mod raw_table_proptest;
mod str_map;

// Public surface
pub use raw_table::AllocError;
pub use str_map::{Iter, StrMap};
