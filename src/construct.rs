//! Building a map from an iterable source.
//!
//! The source is drained through its production capability; every element
//! is read at positions 0 and 1 and the pair is handed to the add
//! capability, which is resolved once before the first element is pulled.
//! The producer is released on every early exit. Entries added before a
//! failure stay in the target map.

use crate::capability::{IndexedRead, ProducerGuard};
use crate::error::{ConstructError, Fault};
use crate::map::Map;
use crate::value::{NativeFn, ObjectKind, Value};
use core::fmt;
use std::rc::Rc;

/// Add capability invoked with the map under construction and one pair.
pub type Adder = Rc<dyn Fn(&Map, Value, Value) -> Result<(), Fault>>;

/// Where the add capability comes from.
#[derive(Clone)]
pub enum AddCapability {
    /// The map's own `set`.
    Intrinsic,
    /// A Rust callback substituted for `set`.
    Native(Adder),
    /// A script value that must turn out to be a function object.
    Resolved(Value),
    /// Nothing to call.
    Missing,
}

enum ResolvedAdder {
    Intrinsic,
    Native(Adder),
    Function(NativeFn),
}

impl ResolvedAdder {
    fn add(&self, map: &Map, key: Value, value: Value) -> Result<(), Fault> {
        match self {
            ResolvedAdder::Intrinsic => {
                map.set(key, value);
                Ok(())
            }
            ResolvedAdder::Native(f) => f(map, key, value),
            ResolvedAdder::Function(f) => f(&[key, value][..]).map(drop),
        }
    }
}

/// Configuration for constructing maps.
#[derive(Clone)]
pub struct MapBuilder {
    adder: AddCapability,
    capacity: usize,
}

impl Default for MapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MapBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let adder = match &self.adder {
            AddCapability::Intrinsic => "intrinsic",
            AddCapability::Native(_) => "native",
            AddCapability::Resolved(_) => "resolved",
            AddCapability::Missing => "missing",
        };
        f.debug_struct("MapBuilder")
            .field("adder", &adder)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl MapBuilder {
    pub fn new() -> Self {
        Self {
            adder: AddCapability::Intrinsic,
            capacity: 0,
        }
    }

    pub fn add_capability(mut self, adder: AddCapability) -> Self {
        self.adder = adder;
        self
    }

    /// Substitute a Rust callback for the intrinsic `set`.
    pub fn adder<F>(self, f: F) -> Self
    where
        F: Fn(&Map, Value, Value) -> Result<(), Fault> + 'static,
    {
        self.add_capability(AddCapability::Native(Rc::new(f)))
    }

    /// Use a script value as the adder; it must be a function object.
    pub fn adder_value(self, value: Value) -> Self {
        self.add_capability(AddCapability::Resolved(value))
    }

    pub fn without_adder(self) -> Self {
        self.add_capability(AddCapability::Missing)
    }

    /// Capacity the new map starts with.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    fn resolve_adder(&self) -> Result<ResolvedAdder, ConstructError> {
        match &self.adder {
            AddCapability::Intrinsic => Ok(ResolvedAdder::Intrinsic),
            AddCapability::Native(f) => Ok(ResolvedAdder::Native(f.clone())),
            AddCapability::Resolved(v) => match v.as_object().map(|o| o.kind()) {
                Some(ObjectKind::Function(f)) => Ok(ResolvedAdder::Function(f.clone())),
                _ => Err(ConstructError::AdderUnavailable {
                    found: v.type_name(),
                }),
            },
            AddCapability::Missing => Err(ConstructError::AdderUnavailable {
                found: "undefined",
            }),
        }
    }

    /// Build a new map from `source`.
    pub fn construct(&self, source: Option<&Value>) -> Result<Map, ConstructError> {
        let map = Map::with_capacity(self.capacity);
        self.populate(&map, source)?;
        Ok(map)
    }

    /// Add every entry of `source` to `map`.
    ///
    /// On error, entries added so far remain in `map`.
    pub fn populate(&self, map: &Map, source: Option<&Value>) -> Result<(), ConstructError> {
        let source = match source {
            None | Some(Value::Undefined) => return Ok(()),
            Some(source) => source,
        };
        log::trace!("populating map from {} source", source.type_name());

        let producer = source
            .producer()?
            .ok_or(ConstructError::InvalidSource {
                found: source.type_name(),
            })?;
        let mut guard = ProducerGuard::new(producer);

        let adder = match self.resolve_adder() {
            Ok(adder) => adder,
            Err(e) => return abandon(guard, e),
        };

        let mut index = 0;
        loop {
            let element = match guard.next_element() {
                Ok(Some(element)) => element,
                Ok(None) => break,
                Err(fault) => return abandon(guard, fault.into()),
            };
            let Some(view) = element.indexed() else {
                let e = ConstructError::InvalidEntry {
                    index,
                    found: element.type_name(),
                };
                return abandon(guard, e);
            };
            let key = view.read_at(0).unwrap_or_default();
            let value = view.read_at(1).unwrap_or_default();
            if let Err(fault) = adder.add(map, key, value) {
                return abandon(guard, fault.into());
            }
            index += 1;
        }

        log::trace!("populated map with {} elements, size {}", index, map.size());
        Ok(())
    }
}

fn abandon(guard: ProducerGuard, e: ConstructError) -> Result<(), ConstructError> {
    log::debug!("map construction stopped early: {}", e);
    guard.abandon(&e);
    Err(e)
}
