//! Capabilities the map constructor depends on.
//!
//! - `IndexedRead`: read position 0 and 1 of an entry-like value. Defined
//!   uniformly for arrays, character sequences and scalars; scalars and
//!   objects without indexed data always read as absent.
//! - `Producer`: a lazy, possibly infinite sequence with an explicit
//!   early-release hook. `ProducerGuard` scopes one producer so that
//!   `release` runs on every exit path that stops before exhaustion.

use crate::error::Fault;
use crate::map::{Entries, Map};
use crate::value::{Object, ObjectKind, Value};
use core::fmt;
use std::rc::Rc;

/// Read access by small non-negative position; `None` is the absent marker.
pub trait IndexedRead {
    fn read_at(&self, position: usize) -> Option<Value>;
}

impl IndexedRead for [Value] {
    fn read_at(&self, position: usize) -> Option<Value> {
        self.get(position).cloned()
    }
}

/// Text read one character at a time. Positions count Unicode scalar values,
/// not UTF-16 code units: a character outside the BMP is one position here,
/// where a UTF-16 runtime would read its two surrogate halves.
#[derive(Copy, Clone, Debug)]
pub struct CharSequence<'a>(pub &'a str);

impl IndexedRead for CharSequence<'_> {
    fn read_at(&self, position: usize) -> Option<Value> {
        self.0
            .chars()
            .nth(position)
            .map(|c| Value::from(c.to_string()))
    }
}

/// Primitive wrapped for property access; it has no indexed positions.
#[derive(Copy, Clone, Debug)]
pub struct BoxedScalar;

impl IndexedRead for BoxedScalar {
    fn read_at(&self, _position: usize) -> Option<Value> {
        None
    }
}

/// Indexed-read adapter selected for a value.
#[derive(Clone, Debug)]
pub enum IndexedView<'a> {
    Sequence(&'a [Value]),
    Chars(CharSequence<'a>),
    Scalar(BoxedScalar),
}

impl IndexedRead for IndexedView<'_> {
    fn read_at(&self, position: usize) -> Option<Value> {
        match self {
            IndexedView::Sequence(items) => items.read_at(position),
            IndexedView::Chars(chars) => chars.read_at(position),
            IndexedView::Scalar(scalar) => scalar.read_at(position),
        }
    }
}

impl Value {
    /// The indexed-read capability of this value; `None` for `undefined`
    /// and `null`, which cannot be converted to an object.
    pub fn indexed(&self) -> Option<IndexedView<'_>> {
        let view = match self {
            Value::Undefined | Value::Null => return None,
            Value::Boolean(_) | Value::Number(_) => IndexedView::Scalar(BoxedScalar),
            Value::String(s) => IndexedView::Chars(CharSequence(s)),
            Value::Object(o) => match o.kind() {
                ObjectKind::Array(items) => IndexedView::Sequence(items),
                ObjectKind::Boxed(Value::String(s)) => IndexedView::Chars(CharSequence(s)),
                ObjectKind::Boxed(_)
                | ObjectKind::Plain
                | ObjectKind::Function(_)
                | ObjectKind::Iterable(_)
                | ObjectKind::Map(_) => IndexedView::Scalar(BoxedScalar),
            },
        };
        Some(view)
    }
}

/// A sequence of values produced one at a time.
pub trait Producer {
    /// Next element, `Ok(None)` once exhausted.
    fn next_element(&mut self) -> Result<Option<Value>, Fault>;

    /// Give up any held resource when consumption stops early.
    fn release(&mut self) -> Result<(), Fault> {
        Ok(())
    }
}

/// Elements of an array object.
pub struct SequenceProducer {
    array: Object,
    next: usize,
}

impl SequenceProducer {
    pub fn new(array: Object) -> Self {
        Self { array, next: 0 }
    }
}

impl Producer for SequenceProducer {
    fn next_element(&mut self) -> Result<Option<Value>, Fault> {
        let item = match self.array.kind() {
            ObjectKind::Array(items) => items.get(self.next).cloned(),
            _ => None,
        };
        if item.is_some() {
            self.next += 1;
        }
        Ok(item)
    }
}

/// Characters of a string, each as a one-character string. Steps by Unicode
/// scalar value, like `CharSequence`.
pub struct CharProducer {
    text: Rc<str>,
    offset: usize,
}

impl CharProducer {
    pub fn new(text: Rc<str>) -> Self {
        Self { text, offset: 0 }
    }
}

impl Producer for CharProducer {
    fn next_element(&mut self) -> Result<Option<Value>, Fault> {
        let Some(c) = self.text[self.offset..].chars().next() else {
            return Ok(None);
        };
        self.offset += c.len_utf8();
        Ok(Some(Value::from(c.to_string())))
    }
}

/// `[key, value]` arrays of a map, following its live traversal order.
pub struct MapEntriesProducer {
    entries: Option<Entries>,
}

impl MapEntriesProducer {
    pub fn new(map: &Map) -> Self {
        Self {
            entries: Some(map.entries()),
        }
    }
}

impl Producer for MapEntriesProducer {
    fn next_element(&mut self) -> Result<Option<Value>, Fault> {
        Ok(self
            .entries
            .as_mut()
            .and_then(|entries| entries.next())
            .map(|(k, v)| Value::array([k, v])))
    }

    fn release(&mut self) -> Result<(), Fault> {
        // Dropping the traversal unpins its cursor.
        self.entries = None;
        Ok(())
    }
}

/// Any Rust iterator of values. Infinite iterators are fine.
pub struct IterProducer<I>(pub I);

impl<I> Producer for IterProducer<I>
where
    I: Iterator<Item = Value>,
{
    fn next_element(&mut self) -> Result<Option<Value>, Fault> {
        Ok(self.0.next())
    }
}

type NextFn = Box<dyn FnMut() -> Result<Option<Value>, Fault>>;
type ReleaseFn = Box<dyn FnMut() -> Result<(), Fault>>;

/// Producer assembled from closures, for iterable objects defined by callers.
pub struct FnProducer {
    next: NextFn,
    release: Option<ReleaseFn>,
}

impl FnProducer {
    pub fn new<F>(next: F) -> Self
    where
        F: FnMut() -> Result<Option<Value>, Fault> + 'static,
    {
        Self {
            next: Box::new(next),
            release: None,
        }
    }

    pub fn on_release<F>(mut self, release: F) -> Self
    where
        F: FnMut() -> Result<(), Fault> + 'static,
    {
        self.release = Some(Box::new(release));
        self
    }
}

impl Producer for FnProducer {
    fn next_element(&mut self) -> Result<Option<Value>, Fault> {
        (self.next)()
    }

    fn release(&mut self) -> Result<(), Fault> {
        match self.release.as_mut() {
            Some(release) => release(),
            None => Ok(()),
        }
    }
}

/// Scoped ownership of a producer.
///
/// Exhaustion ends the scope without a release. Any other exit, including
/// a fault from the producer itself and unwinding, releases exactly once.
pub struct ProducerGuard {
    producer: Box<dyn Producer>,
    done: bool,
}

impl ProducerGuard {
    pub fn new(producer: Box<dyn Producer>) -> Self {
        Self {
            producer,
            done: false,
        }
    }

    pub fn next_element(&mut self) -> Result<Option<Value>, Fault> {
        let next = self.producer.next_element()?;
        if next.is_none() {
            self.done = true;
        }
        Ok(next)
    }

    pub fn is_exhausted(&self) -> bool {
        self.done
    }

    fn release_once(&mut self) -> Result<(), Fault> {
        if self.done {
            return Ok(());
        }
        self.done = true;
        self.producer.release()
    }

    /// Stop early because of `cause`. A fault from the release step is
    /// logged and dropped so that `cause` stays the reported error.
    pub fn abandon(mut self, cause: &dyn fmt::Display) {
        if let Err(secondary) = self.release_once() {
            log::warn!("releasing producer after `{}` failed: {}", cause, secondary);
        }
    }
}

impl Drop for ProducerGuard {
    fn drop(&mut self) {
        if let Err(secondary) = self.release_once() {
            log::warn!("releasing abandoned producer failed: {}", secondary);
        }
    }
}
