//! Error taxonomy for map construction.
//!
//! Store operations never fail; only building a map from a source can.

use std::rc::Rc;
use thiserror::Error;

/// A fault raised by external code: a producer, a release hook, an adder or
/// a traversal callback.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct Fault {
    message: Rc<str>,
}

impl Fault {
    pub fn new(message: impl AsRef<str>) -> Self {
        Self {
            message: Rc::from(message.as_ref()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error)]
pub enum ConstructError {
    /// The source is neither absent nor able to produce a sequence.
    #[error("map source of type {found} is not iterable")]
    InvalidSource { found: &'static str },
    /// The add capability is missing or is not callable.
    #[error("map adder is not callable (found {found})")]
    AdderUnavailable { found: &'static str },
    /// A produced element cannot be read by index.
    #[error("iterator value #{index} of type {found} is not an entry object")]
    InvalidEntry { index: usize, found: &'static str },
    /// Fault raised by the producer or the adder, propagated unchanged.
    #[error(transparent)]
    Fault(#[from] Fault),
}
