//! # Instance Details
//!
//! Turns an opaque heap instance into a short human-readable summary: the
//! path of a file object, the URL of a classpath entry, the identifier an
//! indexable delegates to.
//!
//! ## How resolution works
//!
//! 1. The [`DetailRegistry`] reads the instance's class name
//! 2. It looks up the providers that declared exactly that class name
//! 3. It asks them in registration order until one returns a non-empty string
//!
//! Providers read fields through a [`DetailContext`]. A field whose value is
//! another instance is described by recursing through the registry, which is
//! how a `delegate` or `url` field ends up as readable text.
//!
//! ## Absence is not an error
//!
//! "No provider for this class", "provider declined" and "field missing" all
//! come back as `Ok(None)`. Only invalid handles produce an `Err`.

pub mod cache;
pub mod java;
pub mod jdk;
pub mod registry;
pub mod table;

use tracing::debug;

pub use cache::HeapScopedCache;
pub use registry::{global, install_global, DetailRegistry, DetailRegistryBuilder, NO_DETAILS};
pub use table::{DetailRule, FieldTableProvider, Separator};

use crate::error::HeapwalkResult;
use crate::heap::{FieldValue, HeapAccessor, HeapId, InstanceRef};

/// How deep nested field references are followed before giving up.
///
/// Cycles are cut earlier, as soon as an instance already being described
/// shows up again; the limit bounds long acyclic chains.
pub const MAX_DETAIL_DEPTH: usize = 8;

/// A pluggable strategy describing instances of a family of classes
///
/// ## Contract
///
/// - `supported_classes()` lists the exact, fully qualified class names the
///   provider handles. The registry only dispatches instances of those classes.
/// - `details()` returns `Ok(None)` when it has nothing to say (missing or
///   null fields, unexpected value types). Errors are reserved for invalid
///   handles and are normally just propagated with `?`.
/// - Providers never mutate the heap. Any state they keep must be scoped to a
///   heap identity, see [`HeapScopedCache`], and dropped by `release_heap()`.
pub trait DetailsProvider: Send + Sync
{
    /// Short name, used in logs.
    fn name(&self) -> &str;

    /// Class names this provider can describe, in declaration order.
    fn supported_classes(&self) -> &[&str];

    /// Describe `instance`, whose class is `class_name`.
    ///
    /// ## Errors
    ///
    /// Only handle-validity errors from the heap accessor.
    fn details(&self, class_name: &str, instance: InstanceRef, cx: &DetailContext<'_>) -> HeapwalkResult<Option<String>>;

    /// Drop anything cached for `heap`; the host is done with it.
    fn release_heap(&self, _heap: HeapId) {}
}

/// What a provider sees while describing an instance
///
/// Bundles the heap being read, the registry (for describing referenced
/// instances), the instance being described and the chain of instances that
/// led to it.
#[derive(Clone, Copy)]
pub struct DetailContext<'a>
{
    heap: &'a dyn HeapAccessor,
    registry: &'a DetailRegistry,
    instance: InstanceRef,
    depth: usize,
    parent: Option<&'a DetailContext<'a>>,
}

impl<'a> DetailContext<'a>
{
    pub(crate) fn new(heap: &'a dyn HeapAccessor, registry: &'a DetailRegistry, instance: InstanceRef) -> Self
    {
        DetailContext {
            heap,
            registry,
            instance,
            depth: 0,
            parent: None,
        }
    }

    /// The heap being read.
    #[must_use]
    pub fn heap(&self) -> &'a dyn HeapAccessor
    {
        self.heap
    }

    /// Identity of the heap being read.
    #[must_use]
    pub fn heap_id(&self) -> HeapId
    {
        self.heap.heap_id()
    }

    /// The instance this context describes.
    #[must_use]
    pub fn instance(&self) -> InstanceRef
    {
        self.instance
    }

    /// Nesting depth: 0 for the instance the host asked about.
    #[must_use]
    pub fn depth(&self) -> usize
    {
        self.depth
    }

    /// Text of the field `name` of `instance`
    ///
    /// - missing field, null, primitive or array value: `None`
    /// - a `java.lang.String`: its decoded text
    /// - any other instance: its details, resolved through the registry
    ///
    /// ## Errors
    ///
    /// Only handle-validity errors.
    pub fn field_string(&self, instance: InstanceRef, name: &str) -> HeapwalkResult<Option<String>>
    {
        let target = match self.heap.field(instance, name)? {
            Some(FieldValue::Object(target)) => *target,
            Some(_) | None => return Ok(None),
        };
        if let Some(text) = self.heap.read_string(target)? {
            return Ok(Some(text));
        }
        self.describe_nested(target)
    }

    /// Details of an instance referenced from the one being described.
    ///
    /// `None` when `instance` is already being described further up the
    /// chain, or when the chain is [`MAX_DETAIL_DEPTH`] long.
    ///
    /// ## Errors
    ///
    /// Only handle-validity errors.
    pub fn describe_nested(&self, instance: InstanceRef) -> HeapwalkResult<Option<String>>
    {
        if self.depth >= MAX_DETAIL_DEPTH {
            debug!(%instance, depth = self.depth, "Detail recursion limit reached");
            return Ok(None);
        }
        if self.is_describing(instance) {
            debug!(%instance, depth = self.depth, "Detail cycle cut");
            return Ok(None);
        }
        let nested = DetailContext {
            heap: self.heap,
            registry: self.registry,
            instance,
            depth: self.depth + 1,
            parent: Some(self),
        };
        self.registry.resolve_in(instance, &nested)
    }

    /// Whether `instance` is this context's instance or one of its ancestors.
    fn is_describing(&self, instance: InstanceRef) -> bool
    {
        let mut cx = Some(self);
        while let Some(current) = cx {
            if current.instance == instance {
                return true;
            }
            cx = current.parent;
        }
        false
    }
}
