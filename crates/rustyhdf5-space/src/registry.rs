//! Reference-counted handle registry.
//!
//! Callers that cannot hold Rust references (an FFI layer, a handle-based
//! API) register a value and pass the returned [`Handle`] around instead.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::dataspace::Dataspace;
use crate::error::{Result, SpaceError};

/// Opaque identifier. Zero is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    /// The raw handle value; never 0.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    refs: u32,
}

/// Maps handles to owned values with a reference count each.
#[derive(Debug)]
pub struct Registry<T> {
    entries: HashMap<u64, Entry<T>>,
    next: u64,
}

/// Registry of dataspaces.
pub type SpaceRegistry = Registry<Dataspace>;

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            entries: HashMap::new(),
            next: 1,
        }
    }
}

impl<T> Registry<T> {
    /// An empty registry; the first handle issued is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `value`; the handle starts with one reference.
    pub fn register(&mut self, value: T) -> Handle {
        let id = self.next;
        self.next += 1;
        self.entries.insert(id, Entry { value, refs: 1 });
        trace!(handle = id, "registered");
        Handle(id)
    }

    /// Borrow the object behind `handle`, if still registered.
    pub fn resolve(&self, handle: Handle) -> Option<&T> {
        self.entries.get(&handle.0).map(|e| &e.value)
    }

    /// Mutably borrow the object behind `handle`.
    pub fn resolve_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.entries.get_mut(&handle.0).map(|e| &mut e.value)
    }

    /// Add a reference; returns the new count.
    pub fn inc_ref(&mut self, handle: Handle) -> Result<u32> {
        let entry = self
            .entries
            .get_mut(&handle.0)
            .ok_or_else(|| unknown(handle))?;
        entry.refs += 1;
        Ok(entry.refs)
    }

    /// Drop a reference. The value is removed and returned once the count
    /// reaches zero.
    pub fn release(&mut self, handle: Handle) -> Result<Option<T>> {
        let entry = self
            .entries
            .get_mut(&handle.0)
            .ok_or_else(|| unknown(handle))?;
        entry.refs -= 1;
        if entry.refs > 0 {
            return Ok(None);
        }
        trace!(handle = handle.0, "released");
        Ok(self.entries.remove(&handle.0).map(|e| e.value))
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn unknown(handle: Handle) -> SpaceError {
    SpaceError::argument(format!("unknown handle {handle}"))
}
