//! `Map`: the shared, mutable collection handed to script code.
//!
//! A `Map` is a cheap-to-clone handle to one `EntryStore<Value, Value>`.
//! Every method takes `&self`; borrows of the store are confined to the
//! method body and never held while user code runs, so callbacks, adders
//! and producers may mutate the map they are working on. Values that leave
//! the store (overwritten, deleted, cleared) are dropped after the borrow
//! is released.

use crate::construct::MapBuilder;
use crate::entry_store::{Cursor, EntryStore};
use crate::error::{ConstructError, Fault};
use crate::value::Value;
use core::cell::RefCell;
use core::fmt;
use std::rc::Rc;

#[derive(Clone, Default)]
pub struct Map {
    store: Rc<RefCell<EntryStore<Value, Value>>>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: Rc::new(RefCell::new(EntryStore::with_capacity(capacity))),
        }
    }

    /// Build a map from an optional source with the intrinsic adder.
    ///
    /// `None` and `undefined` give an empty map; anything else must be
    /// iterable and produce entry-like values.
    pub fn construct(source: Option<&Value>) -> Result<Map, ConstructError> {
        MapBuilder::new().construct(source)
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.store.borrow().get(key).cloned()
    }

    pub fn has(&self, key: &Value) -> bool {
        self.store.borrow().contains_key(key)
    }

    pub fn set(&self, key: Value, value: Value) -> &Self {
        let previous = self.store.borrow_mut().insert(key, value);
        drop(previous);
        self
    }

    pub fn delete(&self, key: &Value) -> bool {
        let removed = self.store.borrow_mut().remove(key);
        removed.is_some()
    }

    pub fn clear(&self) {
        let drained = self.store.borrow_mut().drain();
        drop(drained);
    }

    pub fn size(&self) -> usize {
        self.store.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.borrow().is_empty()
    }

    /// Lazy `(key, value)` traversal in insertion order. Each call starts
    /// from the front.
    pub fn entries(&self) -> Entries {
        let cursor = self.store.borrow().open_cursor();
        Entries {
            map: self.clone(),
            cursor: Some(cursor),
        }
    }

    pub fn keys(&self) -> Keys {
        Keys(self.entries())
    }

    pub fn values(&self) -> Values {
        Values(self.entries())
    }

    /// Call `f(value, key, map)` for every live entry in insertion order.
    ///
    /// `f` may mutate this map: deleted entries not yet visited are skipped,
    /// appended entries are visited. The first fault stops the walk.
    pub fn for_each<F>(&self, mut f: F) -> Result<(), Fault>
    where
        F: FnMut(&Value, &Value, &Map) -> Result<(), Fault>,
    {
        for (key, value) in self.entries() {
            f(&value, &key, self)?;
        }
        Ok(())
    }

    /// Whether both handles refer to the same map.
    pub fn ptr_eq(&self, other: &Map) -> bool {
        Rc::ptr_eq(&self.store, &other.store)
    }

    /// Address of the shared store; the identity of this map as a key.
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.store) as *const () as usize
    }
}

impl FromIterator<(Value, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let map = Map::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}

impl fmt::Debug for Map {
    // Entries are left out: a map may contain itself.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.store.try_borrow() {
            Ok(store) => f.debug_struct("Map").field("size", &store.len()).finish(),
            Err(_) => f.write_str("Map { <borrowed> }"),
        }
    }
}

/// Traversal of a map's live entries. Holds its own handle to the map, so
/// the map may be mutated freely between steps.
pub struct Entries {
    map: Map,
    cursor: Option<Cursor>,
}

impl Entries {
    fn finish(&mut self) {
        let Some(cursor) = self.cursor.take() else {
            return;
        };
        match self.map.store.try_borrow() {
            Ok(store) => store.close_cursor(cursor),
            Err(_) => log::warn!("map traversal dropped while the map was mutably borrowed"),
        }
    }
}

impl Iterator for Entries {
    type Item = (Value, Value);

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        let next = self
            .map
            .store
            .borrow()
            .advance(cursor)
            .map(|(k, v)| (k.clone(), v.clone()));
        if next.is_none() {
            // Exhausted traversals stay exhausted.
            self.finish();
        }
        next
    }
}

impl Drop for Entries {
    fn drop(&mut self) {
        self.finish();
    }
}

pub struct Keys(Entries);

impl Iterator for Keys {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        self.0.next().map(|(k, _)| k)
    }
}

pub struct Values(Entries);

impl Iterator for Values {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        self.0.next().map(|(_, v)| v)
    }
}
