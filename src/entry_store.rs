//! EntryStore: insertion-ordered hash table keyed by SameValueZero.
//!
//! Entries live in a generational `SlotMap`; a `HashTable` indexes their
//! slot keys by the stored hash of the normalized key. The order list
//! records slot keys in insertion order. Deleting an entry vacates its slot
//! and leaves a stale key (a tombstone) in the order list, which traversal
//! skips. Tombstones are compacted away once they outnumber live entries,
//! but never while a traversal cursor is open.

use crate::guard::{DebugReentrancy, TraversalPins};
use crate::same_value::SameValueZero;
use core::fmt;
use core::hash::{BuildHasher, Hasher};
use hashbrown::hash_table::Entry as TableEntry;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::hash_map::RandomState;

/// Tombstones tolerated before compaction is considered at all.
const COMPACT_MIN_TOMBSTONES: usize = 8;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(0);

/// Stable reference to one entry. Stale after the entry is deleted, even if
/// its slot is later reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub fn key<'a, K, V, S>(&self, store: &'a EntryStore<K, V, S>) -> Option<&'a K>
    where
        K: SameValueZero,
        S: BuildHasher,
    {
        store.slots.get(self.0).map(|e| &e.key)
    }

    pub fn value<'a, K, V, S>(&self, store: &'a EntryStore<K, V, S>) -> Option<&'a V>
    where
        K: SameValueZero,
        S: BuildHasher,
    {
        store.slots.get(self.0).map(|e| &e.value)
    }

    pub fn value_mut<'a, K, V, S>(&self, store: &'a mut EntryStore<K, V, S>) -> Option<&'a mut V>
    where
        K: SameValueZero,
        S: BuildHasher,
    {
        store.slots.get_mut(self.0).map(|e| &mut e.value)
    }
}

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
    sequence: u64,
}

/// Position of an in-progress traversal over the order list.
///
/// Obtained from `EntryStore::open_cursor` and handed back through
/// `close_cursor` of the same store; while open it pins the order list
/// against compaction. Using it with another store panics in debug builds.
#[derive(Debug)]
#[must_use = "an open cursor blocks compaction until it is closed"]
pub struct Cursor {
    store: u64,
    position: usize,
    epoch: u64,
}

pub struct EntryStore<K, V, S = RandomState> {
    id: u64,
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
    order: Vec<DefaultKey>,
    next_sequence: u64,
    // Bumped by `clear`; cursors from an older epoch restart at 0.
    epoch: u64,
    pins: TraversalPins,
    reentrancy: DebugReentrancy,
}

impl<K, V> EntryStore<K, V>
where
    K: SameValueZero,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V> Default for EntryStore<K, V>
where
    K: SameValueZero,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Live entries in insertion order.
pub struct Iter<'a, K, V> {
    order: core::slice::Iter<'a, DefaultKey>,
    slots: &'a SlotMap<DefaultKey, Entry<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for &k in self.order.by_ref() {
            if let Some(e) = self.slots.get(k) {
                self.remaining -= 1;
                return Some((&e.key, &e.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V, S> EntryStore<K, V, S>
where
    K: SameValueZero,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            hasher,
            index: HashTable::with_capacity(capacity),
            slots: SlotMap::with_capacity_and_key(capacity),
            order: Vec::with_capacity(capacity),
            next_sequence: 0,
            epoch: 0,
            pins: TraversalPins::new(),
            reentrancy: DebugReentrancy::new(),
        }
    }

    fn make_hash(&self, key: &K) -> u64 {
        let mut h = self.hasher.build_hasher();
        key.hash_zero(&mut h);
        h.finish()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Deleted entries still recorded in the order list.
    pub fn tombstones(&self) -> usize {
        self.order.len() - self.slots.len()
    }

    pub fn find(&self, key: &K) -> Option<Handle> {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(key);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|e| e.key.same_value_zero(key))
                    .unwrap_or(false)
            })
            .map(|&k| Handle(k))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let h = self.find(key)?;
        self.slots.get(h.0).map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let h = self.find(key)?;
        self.slots.get_mut(h.0).map(|e| &mut e.value)
    }

    /// Insertion sequence token of the live entry for `key`.
    pub fn sequence_of(&self, key: &K) -> Option<u64> {
        let h = self.find(key)?;
        self.slots.get(h.0).map(|e| e.sequence)
    }

    /// Overwrite the value of an existing equal key, keeping its position,
    /// or append a new entry at the end of the order.
    pub fn set(&mut self, key: K, value: V) -> Handle {
        self.upsert(key, value).0
    }

    /// Like `set`, but hands back the overwritten value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.upsert(key, value).1
    }

    fn upsert(&mut self, key: K, value: V) -> (Handle, Option<V>) {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(&key);
        match self.index.entry(
            hash,
            |&kk| {
                self.slots
                    .get(kk)
                    .map(|e| e.key.same_value_zero(&key))
                    .unwrap_or(false)
            },
            |&kk| self.slots.get(kk).map(|e| e.hash).unwrap_or(0),
        ) {
            TableEntry::Occupied(o) => {
                let k = *o.get();
                let entry = self
                    .slots
                    .get_mut(k)
                    .expect("index refers to a live slot");
                (Handle(k), Some(core::mem::replace(&mut entry.value, value)))
            }
            TableEntry::Vacant(v) => {
                let sequence = self.next_sequence;
                self.next_sequence += 1;
                let k = self.slots.insert(Entry {
                    key,
                    value,
                    hash,
                    sequence,
                });
                let _ = v.insert(k);
                self.order.push(k);
                (Handle(k), None)
            }
        }
    }

    /// Remove the live entry for `key`, returning its owned key and value.
    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let entry = {
            let _g = self.reentrancy.enter();
            let hash = self.make_hash(key);
            let slot = match self.index.find_entry(hash, |&kk| {
                self.slots
                    .get(kk)
                    .map(|e| e.key.same_value_zero(key))
                    .unwrap_or(false)
            }) {
                Ok(occupied) => occupied.remove().0,
                Err(_) => return None,
            };
            self.slots
                .remove(slot)
                .expect("index refers to a live slot")
        };
        self.maybe_compact();
        Some((entry.key, entry.value))
    }

    pub fn delete(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    /// Drop every entry. Open cursors restart from the beginning of the
    /// (now empty) order on their next advance.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.index.clear();
        self.slots.clear();
        self.order.clear();
        self.epoch += 1;
        log::debug!("entry store cleared, epoch {}", self.epoch);
    }

    /// Remove every entry and return them in insertion order. Open cursors
    /// restart as after `clear`.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        let _g = self.reentrancy.enter();
        self.index.clear();
        let slots = &mut self.slots;
        let drained: Vec<(K, V)> = self
            .order
            .drain(..)
            .filter_map(|k| slots.remove(k))
            .map(|e| (e.key, e.value))
            .collect();
        debug_assert!(self.slots.is_empty());
        self.epoch += 1;
        log::debug!("entry store drained {} entries, epoch {}", drained.len(), self.epoch);
        drained
    }

    fn maybe_compact(&mut self) {
        let tombstones = self.tombstones();
        if tombstones < COMPACT_MIN_TOMBSTONES
            || tombstones <= self.slots.len()
            || self.pins.is_pinned()
        {
            return;
        }
        let slots = &self.slots;
        self.order.retain(|&k| slots.contains_key(k));
        log::debug!(
            "compacted {} tombstones, {} live entries remain",
            tombstones,
            self.order.len()
        );
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            order: self.order.iter(),
            slots: &self.slots,
            remaining: self.slots.len(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Start a traversal that tolerates mutation between steps.
    pub fn open_cursor(&self) -> Cursor {
        self.pins.pin();
        Cursor {
            store: self.id,
            position: 0,
            epoch: self.epoch,
        }
    }

    /// Next live entry at or after the cursor, skipping tombstones.
    ///
    /// Entries appended since the cursor was opened are reached in order;
    /// a `clear` since the last step restarts the cursor at the new front.
    pub fn advance(&self, cursor: &mut Cursor) -> Option<(&K, &V)> {
        debug_assert_eq!(cursor.store, self.id, "cursor belongs to another store");
        if cursor.epoch != self.epoch {
            cursor.epoch = self.epoch;
            cursor.position = 0;
        }
        while let Some(&k) = self.order.get(cursor.position) {
            cursor.position += 1;
            if let Some(e) = self.slots.get(k) {
                return Some((&e.key, &e.value));
            }
        }
        None
    }

    pub fn close_cursor(&self, cursor: Cursor) {
        debug_assert_eq!(cursor.store, self.id, "cursor belongs to another store");
        self.pins.unpin();
    }

    pub fn open_cursors(&self) -> usize {
        self.pins.count()
    }
}

impl<K, V, S> Extend<(K, V)> for EntryStore<K, V, S>
where
    K: SameValueZero,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for EntryStore<K, V>
where
    K: SameValueZero,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        store.extend(iter);
        store
    }
}

impl<K, V, S> fmt::Debug for EntryStore<K, V, S>
where
    K: SameValueZero + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Object, Value};

    fn v(n: i32) -> Value {
        Value::from(n)
    }

    fn keys_of(store: &EntryStore<f64, i32>) -> Vec<f64> {
        store.keys().copied().collect()
    }

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            // force all keys into the same hash bucket
            0
        }
    }

    /// Invariant: Setting an existing key overwrites its value and keeps its
    /// handle, sequence and position.
    #[test]
    fn set_existing_key_overwrites_in_place() {
        let mut m: EntryStore<f64, i32> = EntryStore::new();
        let h1 = m.set(1.0, 10);
        m.set(2.0, 20);
        let seq = m.sequence_of(&1.0);
        let h2 = m.set(1.0, 11);
        assert_eq!(h1, h2);
        assert_eq!(m.get(&1.0), Some(&11));
        assert_eq!(m.sequence_of(&1.0), seq);
        assert_eq!(keys_of(&m), vec![1.0, 2.0]);
        assert_eq!(m.len(), 2);
    }

    /// Invariant: `+0` and `-0` share one entry; the first insertion's key is kept.
    #[test]
    fn signed_zero_keys_collapse() {
        let mut m: EntryStore<f64, i32> = EntryStore::new();
        m.set(0.0, 0);
        m.set(-0.0, 1);
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&0.0), Some(&1));
        assert_eq!(m.get(&-0.0), Some(&1));
        assert!(m.keys().next().unwrap().is_sign_positive());
    }

    /// Invariant: NaN is a usable key, found by any NaN bit pattern.
    #[test]
    fn nan_is_a_key() {
        let mut m: EntryStore<f64, i32> = EntryStore::new();
        m.set(f64::NAN, 7);
        assert!(m.contains_key(&f64::NAN));
        assert_eq!(m.get(&-f64::NAN), Some(&7));
        m.set(f64::NAN, 8);
        assert_eq!(m.len(), 1);
        assert!(m.delete(&f64::NAN));
        assert!(m.is_empty());
    }

    /// Invariant: `find(k).is_some() == contains_key(k)` for present/absent keys.
    #[test]
    fn find_contains_parity() {
        let mut m: EntryStore<Value, i32> = EntryStore::new();
        let present = ["a", "b", "c"];
        for (i, k) in present.iter().enumerate() {
            m.set(Value::from(*k), i as i32);
        }
        for k in present {
            let k = Value::from(k);
            assert!(m.find(&k).is_some());
            assert!(m.contains_key(&k));
        }
        for k in ["x", "y", "z"] {
            let k = Value::from(k);
            assert!(m.find(&k).is_none());
            assert!(!m.contains_key(&k));
        }
    }

    /// Invariant: Handle access works while the entry lives; a deleted entry's
    /// handle never aliases a later entry that reuses the slot.
    #[test]
    fn stale_handle_does_not_alias_new_entry() {
        let mut m: EntryStore<Value, i32> = EntryStore::new();
        let h1 = m.set(Value::from("old"), 1);
        assert_eq!(h1.value(&m), Some(&1));
        *h1.value_mut(&mut m).unwrap() += 1;
        assert_eq!(m.get(&Value::from("old")), Some(&2));

        assert!(m.delete(&Value::from("old")));
        let h2 = m.set(Value::from("new"), 2);
        assert_ne!(h1, h2, "handles must differ across generations");
        assert!(h1.value(&m).is_none(), "stale handle must not resolve");
        assert!(h1.key(&m).is_none());
        assert!(h2.key(&m).is_some());
    }

    /// Invariant: Deleting then setting a key appends it with a fresh sequence.
    #[test]
    fn delete_then_set_moves_to_end() {
        let mut m: EntryStore<f64, i32> = EntryStore::new();
        for k in [1.0, 2.0, 3.0] {
            m.set(k, k as i32);
        }
        let seq = m.sequence_of(&1.0).unwrap();
        assert!(m.delete(&1.0));
        assert!(!m.delete(&1.0));
        assert_eq!(m.sequence_of(&1.0), None);
        m.set(1.0, 100);
        assert!(m.sequence_of(&1.0).unwrap() > seq);
        assert_eq!(keys_of(&m), vec![2.0, 3.0, 1.0]);
        assert_eq!(m.get(&1.0), Some(&100));
    }

    /// Invariant: Lookups resolve by SameValueZero even when every key collides.
    #[test]
    fn collision_handling_with_const_hasher() {
        let mut m: EntryStore<Value, i32, ConstBuildHasher> =
            EntryStore::with_hasher(ConstBuildHasher);
        m.set(Value::from("a"), 1);
        m.set(Value::from(0), 2);
        m.set(Value::from("0"), 3);
        m.set(Value::from(-0.0), 4);
        assert_eq!(m.len(), 3);
        assert_eq!(m.get(&Value::from("a")), Some(&1));
        assert_eq!(m.get(&Value::from(0)), Some(&4));
        assert_eq!(m.get(&Value::from("0")), Some(&3));
        assert!(m.delete(&Value::from(0)));
        assert_eq!(m.get(&Value::from("0")), Some(&3));
    }

    /// Invariant: Objects are keyed by identity.
    #[test]
    fn object_keys_by_identity() {
        let mut m: EntryStore<Value, i32> = EntryStore::new();
        let a = Value::from(Object::plain());
        m.set(a.clone(), 1);
        m.set(Value::from(Object::plain()), 2);
        assert_eq!(m.len(), 2);
        assert_eq!(m.get(&a), Some(&1));
        assert!(!m.contains_key(&Value::from(Object::plain())));
    }

    /// Invariant: `len()`/`is_empty()` track live entries through overwrite,
    /// delete and clear.
    #[test]
    fn len_and_is_empty_behaviors() {
        let mut m: EntryStore<Value, i32> = EntryStore::new();
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());
        m.set(v(1), 1);
        m.set(v(1), 2);
        assert_eq!(m.len(), 1);
        m.set(v(2), 2);
        assert_eq!(m.len(), 2);
        assert!(m.delete(&v(1)));
        assert_eq!(m.len(), 1);
        assert!(!m.delete(&v(1)));
        assert_eq!(m.len(), 1);
        m.clear();
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());
        assert_eq!(m.iter().count(), 0);
    }

    /// Invariant: `clear` does not reset sequence tokens and leaves the store usable.
    #[test]
    fn clear_then_reuse() {
        let mut m: EntryStore<f64, i32> = EntryStore::new();
        m.set(1.0, 1);
        let h = m.set(2.0, 2);
        let before = m.sequence_of(&2.0).unwrap();
        m.clear();
        assert!(h.value(&m).is_none());
        m.set(2.0, 3);
        assert!(m.sequence_of(&2.0).unwrap() > before);
        assert_eq!(keys_of(&m), vec![2.0]);
    }

    /// Invariant: `insert` returns the overwritten value; `drain` empties the
    /// store in insertion order and invalidates handles.
    #[test]
    fn insert_and_drain() {
        let mut m: EntryStore<f64, i32> = EntryStore::new();
        assert_eq!(m.insert(2.0, 1), None);
        let h = m.set(1.0, 2);
        assert_eq!(m.insert(2.0, 3), Some(1));
        m.delete(&1.0);
        m.set(1.0, 4);
        let mut c = m.open_cursor();
        assert!(m.advance(&mut c).is_some());
        assert_eq!(m.drain(), vec![(2.0, 3), (1.0, 4)]);
        assert!(m.is_empty());
        assert_eq!(m.tombstones(), 0);
        assert!(h.value(&m).is_none());
        m.set(7.0, 7);
        assert_eq!(m.advance(&mut c).map(|(k, _)| *k), Some(7.0));
        m.close_cursor(c);
    }

    /// Invariant: Compaction removes tombstones without changing visible order.
    #[test]
    fn compaction_preserves_order() {
        let mut m: EntryStore<f64, i32> = EntryStore::new();
        for i in 0..40 {
            m.set(f64::from(i), i);
        }
        for i in (0..40).filter(|i| i % 4 != 0) {
            assert!(m.delete(&f64::from(i)));
        }
        assert!(m.tombstones() <= m.len().max(COMPACT_MIN_TOMBSTONES));
        let expected: Vec<f64> = (0..40).filter(|i| i % 4 == 0).map(f64::from).collect();
        assert_eq!(keys_of(&m), expected);
    }

    /// Invariant: An open cursor blocks compaction; closing it lets the next
    /// delete compact.
    #[test]
    fn open_cursor_blocks_compaction() {
        let mut m: EntryStore<f64, i32> = EntryStore::new();
        for i in 0..20 {
            m.set(f64::from(i), i);
        }
        let c = m.open_cursor();
        for i in 0..18 {
            m.delete(&f64::from(i));
        }
        assert_eq!(m.tombstones(), 18);
        m.close_cursor(c);
        assert_eq!(m.open_cursors(), 0);
        m.delete(&18.0);
        assert_eq!(m.tombstones(), 0);
        assert_eq!(keys_of(&m), vec![19.0]);
    }

    /// Invariant: A cursor skips entries deleted before it reaches them and sees
    /// entries appended while it is open.
    #[test]
    fn cursor_tolerates_mutation() {
        let mut m: EntryStore<f64, i32> = EntryStore::new();
        m.set(1.0, 1);
        m.set(2.0, 2);
        m.set(3.0, 3);
        let mut c = m.open_cursor();
        assert_eq!(m.advance(&mut c).map(|(k, _)| *k), Some(1.0));
        m.delete(&2.0);
        m.set(4.0, 4);
        m.set(1.0, 10);
        assert_eq!(m.advance(&mut c).map(|(k, _)| *k), Some(3.0));
        assert_eq!(m.advance(&mut c).map(|(k, v)| (*k, *v)), Some((4.0, 4)));
        assert!(m.advance(&mut c).is_none());
        // exhausted cursors observe later appends
        m.set(5.0, 5);
        assert_eq!(m.advance(&mut c).map(|(k, _)| *k), Some(5.0));
        m.close_cursor(c);
    }

    /// Invariant: After `clear`, an open cursor restarts at the new front.
    #[test]
    fn cursor_restarts_after_clear() {
        let mut m: EntryStore<f64, i32> = EntryStore::new();
        for i in 0..5 {
            m.set(f64::from(i), i);
        }
        let mut c = m.open_cursor();
        m.advance(&mut c);
        m.advance(&mut c);
        m.clear();
        m.set(9.0, 9);
        assert_eq!(m.advance(&mut c).map(|(k, _)| *k), Some(9.0));
        assert!(m.advance(&mut c).is_none());
        m.close_cursor(c);
    }

    #[test]
    fn iter_is_exact_size() {
        let mut m: EntryStore<f64, i32> = (0..6).map(|i| (f64::from(i), i)).collect();
        m.delete(&2.0);
        let it = m.iter();
        assert_eq!(it.len(), 5);
        assert_eq!(it.count(), 5);
        assert_eq!(format!("{:?}", m.iter().next()), "Some((0.0, 0))");
    }

    /// Invariant (debug-only): A cursor is only accepted by the store that
    /// opened it; the other store's pins stay untouched.
    #[cfg(debug_assertions)]
    #[test]
    fn foreign_cursor_is_rejected() {
        let a: EntryStore<f64, i32> = (0..3).map(|i| (f64::from(i), i)).collect();
        let b: EntryStore<f64, i32> = (0..3).map(|i| (f64::from(i), i)).collect();
        let mut from_b = b.open_cursor();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = a.advance(&mut from_b);
        }));
        assert!(res.is_err(), "advance must reject a foreign cursor");
        let from_a = a.open_cursor();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            b.close_cursor(from_a);
        }));
        assert!(res.is_err(), "close_cursor must reject a foreign cursor");
        assert_eq!(b.open_cursors(), 1);
        b.close_cursor(from_b);
        assert_eq!(b.open_cursors(), 0);
    }

    /// Invariant (debug-only): Re-entering the store from `same_value_zero`
    /// during a probe panics due to the reentrancy guard.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_same_value_zero_during_find() {
        struct ReentryKey {
            id: u32,
            store: *const EntryStore<ReentryKey, i32, ConstBuildHasher>,
            trigger: bool,
        }
        impl SameValueZero for ReentryKey {
            fn same_value_zero(&self, other: &Self) -> bool {
                if self.id == other.id {
                    return true;
                }
                if self.trigger || other.trigger {
                    let probe = ReentryKey {
                        id: 99,
                        store: core::ptr::null(),
                        trigger: false,
                    };
                    // Attempt to re-enter the same store during probing.
                    let s = if self.trigger { self.store } else { other.store };
                    unsafe {
                        let _ = (*s).contains_key(&probe);
                    }
                }
                false
            }
            fn hash_zero<H: Hasher>(&self, state: &mut H) {
                state.write_u32(self.id);
            }
        }

        let mut m: EntryStore<ReentryKey, i32, ConstBuildHasher> =
            EntryStore::with_hasher(ConstBuildHasher);
        m.set(
            ReentryKey {
                id: 1,
                store: core::ptr::null(),
                trigger: false,
            },
            1,
        );
        let query = ReentryKey {
            id: 2,
            store: &m as *const _,
            trigger: true,
        };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = m.find(&query);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }
}
