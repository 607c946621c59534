//! # Error Types
//!
//! Error handling for heap access and detail resolution.
//!
//! We use `thiserror` to generate `Error` trait implementations and
//! readable messages.
//!
//! Most of what can go "wrong" while describing an instance is not an error
//! at all: a missing field, a null reference or a class nobody knows how to
//! describe are normal in a heap dump and are reported as `Ok(None)`. The
//! variants below are reserved for collaborator bugs (handles used against the
//! wrong heap, ids that never existed) and must be surfaced to the caller.

use thiserror::Error;

use crate::heap::{ArrayRef, ClassId, HeapId, InstanceRef};

/// Main error type for heap access and detail resolution
///
/// ## Error Categories
///
/// 1. **Handle errors**: ForeignInstance, ForeignArray, UnknownInstance, UnknownArray, UnknownClass
/// 2. **Load errors**: DanglingReference, TableOverflow (raised while building a heap)
/// 3. **Setup errors**: GlobalRegistryInitialized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeapwalkError
{
    /// An instance handle was used against a heap it does not belong to
    ///
    /// This happens when a view keeps a handle after its heap dump was closed
    /// and another one was opened, or when two dumps are mixed up by the host.
    #[error("Instance {instance} does not belong to the loaded heap {loaded}")]
    ForeignInstance
    {
        /// The offending handle
        instance: InstanceRef,
        /// Identity of the heap that was asked
        loaded: HeapId,
    },

    /// An array handle was used against a heap it does not belong to
    #[error("Array {array} does not belong to the loaded heap {loaded}")]
    ForeignArray
    {
        /// The offending handle
        array: ArrayRef,
        /// Identity of the heap that was asked
        loaded: HeapId,
    },

    /// The handle names the right heap but no such instance exists in it
    #[error("Unknown instance {0}")]
    UnknownInstance(InstanceRef),

    /// The handle names the right heap but no such array exists in it
    #[error("Unknown array {0}")]
    UnknownArray(ArrayRef),

    /// An instance refers to a class id missing from the class table
    #[error("Unknown class id {0}")]
    UnknownClass(ClassId),

    /// A field of an instance points outside of the heap being built
    #[error("Field '{field}' of instance {instance} points outside of its heap")]
    DanglingReference
    {
        /// Instance holding the reference
        instance: InstanceRef,
        /// Name of the field holding the reference
        field: String,
    },

    /// A heap table grew past what a `u32` id can address
    #[error("Heap {table} table has more entries than u32 ids can address")]
    TableOverflow
    {
        /// Which table overflowed: `class`, `instance` or `array`
        table: &'static str,
    },

    /// The process-wide detail registry was already installed
    ///
    /// ## Solution
    ///
    /// Call `install_global()` once during startup, before the first call to
    /// `global()`.
    #[error("Global detail registry is already initialized")]
    GlobalRegistryInitialized,
}

/// Convenience type alias for `Result<T, HeapwalkError>`
///
/// ```rust
/// use heapwalk_core::error::HeapwalkResult;
/// fn foo() -> HeapwalkResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type HeapwalkResult<T> = std::result::Result<T, HeapwalkError>;
