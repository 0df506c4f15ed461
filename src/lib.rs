//! script-map: the insertion-ordered `Map` of a small script runtime, with
//! SameValueZero keys and a constructor that accepts any iterable source.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep the three subtle contracts of a script `Map` (key
//!   equality, construction from arbitrary producers, traversal under
//!   mutation) in separate layers that can be tested on their own.
//! - Layers:
//!   - `same_value`: the SameValueZero relation and the normalized key form
//!     that keeps hashing consistent with it.
//!   - `EntryStore<K, V, S>`: ordered hash table. A `HashTable` indexes
//!     generational slot keys; an order list records insertion order and
//!     keeps tombstones for deleted entries until compaction.
//!   - `Map`: shared handle (`Rc<RefCell<EntryStore<Value, Value>>>`) with
//!     restartable traversals that tolerate mutation between steps.
//!   - `MapBuilder`: the construction algorithm over the `Producer` and
//!     `IndexedRead` capabilities.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (no atomics, no locks).
//! - O(1) average `get`/`has`/`set`/`delete`; O(1) `size`.
//! - `set` on an existing key keeps the entry's position; delete followed
//!   by `set` appends at the end.
//! - Reentrancy: disallowed inside `EntryStore` probes (only
//!   `SameValueZero` may run there); allowed everywhere in `Map`, whose
//!   borrows never span user code.
//!
//! Traversal and compaction
//! - A traversal is a `Cursor` into the order list. Tombstones are skipped,
//!   appended entries are reached, and a `clear` bumps an epoch so open
//!   cursors restart at the new front.
//! - Compaction rewrites the order list only when no cursor is open, so a
//!   cursor position is never invalidated.
//!
//! Construction failures
//! - Invalid sources and a missing adder fail before any element is
//!   consumed; invalid elements and faults fail mid-way without rollback.
//! - Producers are released exactly once on every early exit; a fault
//!   from the release step is logged and never replaces the primary error.

pub mod capability;
mod construct;
pub mod entry_store;
mod entry_store_proptest;
mod error;
mod guard;
mod map;
pub mod same_value;
mod value;

// Public surface
pub use capability::{FnProducer, IndexedRead, IterProducer, Producer};
pub use construct::{AddCapability, Adder, MapBuilder};
pub use entry_store::{EntryStore, Handle};
pub use error::{ConstructError, Fault};
pub use guard::DebugReentrancy;
pub use map::{Entries, Keys, Map, Values};
pub use same_value::{same_value_zero, NormalizedKey, SameValueZero};
pub use value::{IterableFn, NativeFn, Object, ObjectKind, Value};
