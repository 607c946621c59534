//! # Heap-Scoped Cache
//!
//! A single-entry cache tied to the identity of the heap being queried.
//!
//! Some details depend on the heap rather than on the instance (the path
//! separator of the machine the dump was taken on, for example). Providers
//! derive such values once per heap and keep them here. Asking with a
//! different [`HeapId`] drops the old value and computes a new one.
//!
//! ## Thread Safety
//!
//! The `(HeapId, value)` pair lives behind one mutex and is always replaced
//! as a unit, so a reader can never observe a value paired with the wrong
//! identity. Two threads working on different heaps may recompute each
//! other's value; that costs a property lookup and nothing else.

use std::sync::{Mutex, PoisonError};

use tracing::trace;

use crate::heap::HeapId;

/// Single-entry `(HeapId, T)` cache
#[derive(Debug, Default)]
pub struct HeapScopedCache<T>
{
    slot: Mutex<Option<(HeapId, T)>>,
}

impl<T: Clone> HeapScopedCache<T>
{
    /// Create an empty cache.
    #[must_use]
    pub const fn new() -> Self
    {
        HeapScopedCache { slot: Mutex::new(None) }
    }

    /// The value cached for `heap`, computing it with `compute` on a miss.
    pub fn get_or_compute<F>(&self, heap: HeapId, compute: F) -> T
    where
        F: FnOnce() -> T,
    {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached, value)) = slot.as_ref() {
            if *cached == heap {
                return value.clone();
            }
        }

        trace!(%heap, previous = ?slot.as_ref().map(|(id, _)| *id), "Heap-scoped cache miss");
        let value = compute();
        *slot = Some((heap, value.clone()));
        value
    }

    /// Identity of the heap the cached value belongs to, if any.
    pub fn cached_heap(&self) -> Option<HeapId>
    {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(heap, _)| *heap)
    }

    /// Forget the cached value, whatever heap it belongs to.
    pub fn invalidate(&self)
    {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Forget the cached value if it belongs to `heap`.
    ///
    /// Returns whether a value was dropped. A value cached for another heap
    /// is left alone.
    pub fn invalidate_for(&self, heap: HeapId) -> bool
    {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|(cached, _)| *cached == heap) {
            *slot = None;
            return true;
        }
        false
    }
}
