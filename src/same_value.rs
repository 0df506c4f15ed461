//! SameValueZero: the key equality used by the map.
//!
//! Strict type-and-value equality with two deviations: `+0` and `-0` are
//! the same key, and NaN is equal to itself. Hashing goes through
//! `NormalizedKey` so that equal keys always land in the same bucket.

use crate::value::Value;
use core::hash::{Hash, Hasher};

const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

/// Key equality relation the entry store is parameterized over.
///
/// Implementations must keep `hash_zero` consistent with
/// `same_value_zero`: equal keys feed identical data to the hasher.
pub trait SameValueZero {
    fn same_value_zero(&self, other: &Self) -> bool;
    fn hash_zero<H: Hasher>(&self, state: &mut H);
}

/// Canonical lookup form of a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NormalizedKey<'a> {
    Undefined,
    Null,
    Boolean(bool),
    /// Bit pattern after collapsing `-0` onto `+0` and every NaN onto one NaN.
    Number(u64),
    String(&'a str),
    /// Allocation address of the object.
    Object(usize),
}

/// Bit pattern a number normalizes to.
pub fn normalize_number(n: f64) -> u64 {
    if n == 0.0 {
        0
    } else if n.is_nan() {
        CANONICAL_NAN
    } else {
        n.to_bits()
    }
}

fn numbers_same_value_zero(a: f64, b: f64) -> bool {
    if a == 0.0 && b == 0.0 {
        return true;
    }
    if a.is_nan() || b.is_nan() {
        return a.is_nan() && b.is_nan();
    }
    a == b
}

impl Value {
    pub fn normalized(&self) -> NormalizedKey<'_> {
        match self {
            Value::Undefined => NormalizedKey::Undefined,
            Value::Null => NormalizedKey::Null,
            Value::Boolean(b) => NormalizedKey::Boolean(*b),
            Value::Number(n) => NormalizedKey::Number(normalize_number(*n)),
            Value::String(s) => NormalizedKey::String(s),
            Value::Object(o) => NormalizedKey::Object(o.addr()),
        }
    }
}

impl SameValueZero for Value {
    fn same_value_zero(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => numbers_same_value_zero(*a, *b),
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    fn hash_zero<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl SameValueZero for f64 {
    fn same_value_zero(&self, other: &Self) -> bool {
        numbers_same_value_zero(*self, *other)
    }

    fn hash_zero<H: Hasher>(&self, state: &mut H) {
        normalize_number(*self).hash(state);
    }
}

/// Free-function form of the relation.
pub fn same_value_zero(a: &Value, b: &Value) -> bool {
    a.same_value_zero(b)
}
