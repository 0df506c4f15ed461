//! Runtime values stored in and fed to a `Map`.
//!
//! Only the slice of a script runtime's value model that the map touches
//! lives here: primitives, identity-bearing objects, and the object kinds
//! that carry the production and indexed-read capabilities.

use crate::capability::{CharProducer, MapEntriesProducer, Producer, SequenceProducer};
use crate::error::Fault;
use crate::map::Map;
use core::fmt;
use std::rc::Rc;

/// Native callable stored in a function object.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, Fault>>;

/// Factory invoked each time an iterable object is asked for a producer.
pub type IterableFn = Rc<dyn Fn() -> Result<Box<dyn Producer>, Fault>>;

/// A script value. Cloning is cheap: strings and objects are reference counted.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
    Object(Object),
}

/// Reference to a heap object. Equality is identity.
#[derive(Clone)]
pub struct Object(Rc<ObjectKind>);

pub enum ObjectKind {
    /// Ordinary object without indexed data.
    Plain,
    Array(Vec<Value>),
    /// Wrapper object around a primitive (`new Number(0)`, `new String("st")`).
    Boxed(Value),
    Function(NativeFn),
    Iterable(IterableFn),
    Map(Map),
}

impl Object {
    pub fn new(kind: ObjectKind) -> Self {
        Object(Rc::new(kind))
    }

    pub fn plain() -> Self {
        Self::new(ObjectKind::Plain)
    }

    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self::new(ObjectKind::Array(items.into_iter().map(Into::into).collect()))
    }

    pub fn boxed(primitive: impl Into<Value>) -> Self {
        Self::new(ObjectKind::Boxed(primitive.into()))
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, Fault> + 'static,
    {
        Self::new(ObjectKind::Function(Rc::new(f)))
    }

    pub fn iterable<F>(f: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Producer>, Fault> + 'static,
    {
        Self::new(ObjectKind::Iterable(Rc::new(f)))
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.0
    }

    /// Identity comparison. Every wrapping of one `Map` is the same object.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        self.addr() == other.addr()
    }

    /// Stable address used as the normalized identity of this object.
    pub(crate) fn addr(&self) -> usize {
        match self.kind() {
            ObjectKind::Map(m) => m.addr(),
            _ => Rc::as_ptr(&self.0) as *const () as usize,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self.kind() {
            ObjectKind::Plain => "object",
            ObjectKind::Array(_) => "array",
            ObjectKind::Boxed(_) => "boxed primitive",
            ObjectKind::Function(_) => "function",
            ObjectKind::Iterable(_) => "iterable",
            ObjectKind::Map(_) => "map",
        }
    }
}

impl Value {
    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    /// Array object holding `items`.
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Value::Object(Object::array(items))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Runtime type tag, as reported in construction errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(o) => o.kind_name(),
        }
    }

    /// Open the sequential production capability of this value.
    ///
    /// `Ok(None)` means the value cannot produce a sequence at all. Iterable
    /// objects run their factory here, which may fault.
    pub fn producer(&self) -> Result<Option<Box<dyn Producer>>, Fault> {
        let producer: Box<dyn Producer> = match self {
            Value::String(s) => Box::new(CharProducer::new(s.clone())),
            Value::Object(o) => match o.kind() {
                ObjectKind::Array(_) => Box::new(SequenceProducer::new(o.clone())),
                ObjectKind::Boxed(Value::String(s)) => Box::new(CharProducer::new(s.clone())),
                ObjectKind::Iterable(factory) => factory()?,
                ObjectKind::Map(m) => Box::new(MapEntriesProducer::new(m)),
                ObjectKind::Plain | ObjectKind::Boxed(_) | ObjectKind::Function(_) => {
                    return Ok(None)
                }
            },
            Value::Undefined | Value::Null | Value::Boolean(_) | Value::Number(_) => {
                return Ok(None)
            }
        };
        Ok(Some(producer))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Object(Object::new(ObjectKind::Map(m)))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => fmt::Debug::fmt(b, f),
            Value::Number(n) => fmt::Debug::fmt(n, f),
            Value::String(s) => fmt::Debug::fmt(s, f),
            Value::Object(o) => fmt::Debug::fmt(o, f),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ObjectKind::Array(items) => f.debug_list().entries(items).finish(),
            ObjectKind::Boxed(v) => f.debug_tuple("Boxed").field(v).finish(),
            ObjectKind::Map(m) => fmt::Debug::fmt(m, f),
            _ => write!(f, "[{} @{:#x}]", self.kind_name(), self.addr()),
        }
    }
}
