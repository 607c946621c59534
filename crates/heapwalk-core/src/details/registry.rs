//! # Detail Registry
//!
//! Ordered collection of [`DetailsProvider`]s with an exact class-name index.
//!
//! The registry is assembled once at startup with [`DetailRegistryBuilder`]
//! and is immutable afterwards, so it can be shared between any number of
//! analysis views without locking.
//!
//! ## Usage
//!
//! ```rust
//! use heapwalk_core::details::DetailRegistry;
//! use heapwalk_core::heap::{FieldValue, HeapDumpBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>>
//! {
//!     let mut builder = HeapDumpBuilder::new();
//!     let url = builder.string("file:/opt/app/lib/rt.jar");
//!     let entry_class = builder.class("org.netbeans.api.java.classpath.ClassPath$Entry");
//!     let entry = builder.instance(entry_class, vec![("url", FieldValue::Object(url))]);
//!     let heap = builder.build()?;
//!
//!     let registry = DetailRegistry::with_defaults();
//!     assert_eq!(registry.resolve(&heap, entry)?.as_deref(), Some("file:/opt/app/lib/rt.jar"));
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::{java, jdk, DetailContext, DetailsProvider};
use crate::error::{HeapwalkError, HeapwalkResult};
use crate::heap::{HeapAccessor, HeapId, InstanceRef};

/// Text shown by hosts for instances without details.
pub const NO_DETAILS: &str = "—";

static GLOBAL: OnceCell<DetailRegistry> = OnceCell::new();

/// Install the process-wide registry
///
/// Call this once during startup if the built-in providers need to be
/// extended. Without it, [`global()`] falls back to
/// [`DetailRegistry::with_defaults`].
///
/// ## Errors
///
/// `GlobalRegistryInitialized` if a registry was already installed, or if
/// [`global()`] already ran and installed the defaults.
pub fn install_global(registry: DetailRegistry) -> HeapwalkResult<()>
{
    GLOBAL.set(registry).map_err(|_| HeapwalkError::GlobalRegistryInitialized)
}

/// The process-wide registry.
pub fn global() -> &'static DetailRegistry
{
    GLOBAL.get_or_init(DetailRegistry::with_defaults)
}

/// Ordered, immutable set of detail providers
pub struct DetailRegistry
{
    providers: Vec<Arc<dyn DetailsProvider>>,
    /// Class name to provider indices, in registration order
    by_class: HashMap<String, SmallVec<[usize; 2]>>,
}

impl DetailRegistry
{
    /// Start assembling a registry.
    #[must_use]
    pub fn builder() -> DetailRegistryBuilder
    {
        DetailRegistryBuilder::new()
    }

    /// A registry holding only the built-in providers.
    #[must_use]
    pub fn with_defaults() -> Self
    {
        Self::builder().with_defaults().build()
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.providers.is_empty()
    }

    /// Providers declaring `class_name`, in the order they will be asked.
    pub fn providers_for<'a>(&'a self, class_name: &str) -> impl Iterator<Item = &'a dyn DetailsProvider> + 'a
    {
        self.by_class
            .get(class_name)
            .into_iter()
            .flatten()
            .filter_map(|index| self.providers.get(*index))
            .map(|provider| -> &'a dyn DetailsProvider { provider.as_ref() })
    }

    /// Describe `instance` of `heap`
    ///
    /// Asks every provider declaring the instance's exact class name, in
    /// registration order. The first non-empty answer wins; a provider that
    /// declines lets the next one try.
    ///
    /// ## Returns
    ///
    /// - `Ok(Some(details))`: a provider described the instance
    /// - `Ok(None)`: no provider handles the class, or all of them declined
    ///
    /// ## Errors
    ///
    /// - `ForeignInstance`: the handle belongs to another heap
    /// - `UnknownInstance`: the handle does not exist in `heap`
    pub fn resolve(&self, heap: &dyn HeapAccessor, instance: InstanceRef) -> HeapwalkResult<Option<String>>
    {
        self.resolve_in(instance, &DetailContext::new(heap, self, instance))
    }

    /// Like [`DetailRegistry::resolve`], with [`NO_DETAILS`] standing in for absence.
    ///
    /// ## Errors
    ///
    /// Same as [`DetailRegistry::resolve`].
    pub fn describe(&self, heap: &dyn HeapAccessor, instance: InstanceRef) -> HeapwalkResult<String>
    {
        Ok(self
            .resolve(heap, instance)?
            .unwrap_or_else(|| NO_DETAILS.to_owned()))
    }

    /// Tell every provider the host closed `heap`, so values cached for it
    /// are dropped instead of lingering until another heap evicts them.
    pub fn release_heap(&self, heap: HeapId)
    {
        debug!(%heap, providers = self.providers.len(), "Releasing heap");
        for provider in &self.providers {
            provider.release_heap(heap);
        }
    }

    pub(crate) fn resolve_in(&self, instance: InstanceRef, cx: &DetailContext<'_>) -> HeapwalkResult<Option<String>>
    {
        let class_name = cx.heap().class_name_of(instance)?;
        let mut candidates = self.providers_for(class_name).peekable();
        if candidates.peek().is_none() {
            trace!(%instance, class_name, "No details provider");
            return Ok(None);
        }

        for provider in candidates {
            match provider.details(class_name, instance, cx)? {
                Some(details) if !details.is_empty() => {
                    trace!(%instance, class_name, provider = provider.name(), depth = cx.depth(), "Resolved details");
                    return Ok(Some(details));
                }
                _ => trace!(%instance, class_name, provider = provider.name(), "Provider declined"),
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for DetailRegistry
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("DetailRegistry")
            .field("providers", &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("classes", &self.by_class.len())
            .finish()
    }
}

/// Builder for [`DetailRegistry`]
///
/// Providers are asked in the order they are registered.
#[derive(Default)]
pub struct DetailRegistryBuilder
{
    providers: Vec<Arc<dyn DetailsProvider>>,
}

impl DetailRegistryBuilder
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Append a provider.
    #[must_use]
    pub fn register<P>(self, provider: P) -> Self
    where
        P: DetailsProvider + 'static,
    {
        self.register_shared(Arc::new(provider))
    }

    /// Append a provider that is also held elsewhere.
    #[must_use]
    pub fn register_shared(mut self, provider: Arc<dyn DetailsProvider>) -> Self
    {
        self.providers.push(provider);
        self
    }

    /// Append the built-in providers: JDK platform types, then the
    /// NetBeans indexing and classpath types.
    #[must_use]
    pub fn with_defaults(self) -> Self
    {
        self.register(jdk::provider()).register(java::provider())
    }

    /// Freeze the provider list and index it by class name.
    #[must_use]
    pub fn build(self) -> DetailRegistry
    {
        let mut by_class: HashMap<String, SmallVec<[usize; 2]>> = HashMap::new();
        for (index, provider) in self.providers.iter().enumerate() {
            for class_name in provider.supported_classes() {
                let indices = by_class.entry((*class_name).to_owned()).or_default();
                if !indices.contains(&index) {
                    indices.push(index);
                }
            }
        }

        debug!(providers = self.providers.len(), classes = by_class.len(), "Detail registry built");
        DetailRegistry {
            providers: self.providers,
            by_class,
        }
    }
}
