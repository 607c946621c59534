//! Heap, instance, array and class identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HEAP_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one loaded heap dump
///
/// A `HeapId` is handed out every time a heap is loaded. It stays the same for
/// as long as that dump is open and is never reused for another dump within
/// the same process, even if the same file is loaded twice. Caches keyed by
/// `HeapId` therefore never confuse two loads of the same snapshot.
///
/// ## Example
///
/// ```rust
/// use heapwalk_core::heap::HeapId;
///
/// let first = HeapId::allocate();
/// let second = HeapId::allocate();
/// assert_ne!(first, second);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeapId(u64);

impl HeapId
{
    /// Allocate a fresh identity for a newly loaded heap.
    #[must_use]
    pub fn allocate() -> Self
    {
        HeapId(NEXT_HEAP_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value, for logging.
    #[must_use]
    pub const fn value(self) -> u64
    {
        self.0
    }
}

impl fmt::Display for HeapId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "heap#{}", self.0)
    }
}

/// Index of an instance inside its heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u32);

/// Index of a primitive array inside its heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArrayId(pub u32);

/// Index of a class inside its heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub u32);

impl fmt::Display for ClassId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "class#{}", self.0)
    }
}

/// Handle to an instance
///
/// The handle remembers which heap it came from. Every accessor checks that
/// before touching its tables, so a handle that outlived its dump fails loudly
/// instead of silently describing some unrelated object of the next dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceRef
{
    /// Heap the instance belongs to
    pub heap: HeapId,
    /// Index of the instance in that heap
    pub id: InstanceId,
}

impl InstanceRef
{
    /// Create a handle for instance `id` of `heap`.
    #[must_use]
    pub const fn new(heap: HeapId, id: InstanceId) -> Self
    {
        InstanceRef { heap, id }
    }
}

impl fmt::Display for InstanceRef
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}/instance#{}", self.heap, self.id.0)
    }
}

/// Handle to a primitive array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayRef
{
    /// Heap the array belongs to
    pub heap: HeapId,
    /// Index of the array in that heap
    pub id: ArrayId,
}

impl ArrayRef
{
    /// Create a handle for array `id` of `heap`.
    #[must_use]
    pub const fn new(heap: HeapId, id: ArrayId) -> Self
    {
        ArrayRef { heap, id }
    }
}

impl fmt::Display for ArrayRef
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}/array#{}", self.heap, self.id.0)
    }
}
