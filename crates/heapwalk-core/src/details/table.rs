//! # Table-Driven Providers
//!
//! Most detail providers boil down to "read these fields, glue them together".
//! [`FieldTableProvider`] expresses that as a table from class name to
//! [`DetailRule`], so adding a class family is a matter of configuration.
//!
//! ## Example
//!
//! ```rust
//! use heapwalk_core::details::{DetailRule, FieldTableProvider, Separator};
//!
//! let provider = FieldTableProvider::new("example")
//!     .rule("com.example.Resource", DetailRule::field("name"))
//!     .rule(
//!         "com.example.FileRef",
//!         DetailRule::join("dir", "name", Separator::heap_property("file.separator", "/")),
//!     );
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::trace;

use super::{DetailContext, DetailsProvider, HeapScopedCache};
use crate::error::HeapwalkResult;
use crate::heap::{HeapId, InstanceRef};

/// Extraction function for rules that do not fit the field/join shapes.
pub type CustomRule = fn(InstanceRef, &DetailContext<'_>) -> HeapwalkResult<Option<String>>;

/// How one class is turned into text
#[derive(Debug)]
pub enum DetailRule
{
    /// The text of a single field
    Field(&'static str),
    /// `head + separator + tail`, only if both fields have text
    Join
    {
        head: &'static str,
        tail: &'static str,
        separator: Separator,
    },
    /// Arbitrary extraction
    Custom(CustomRule),
}

impl DetailRule
{
    #[must_use]
    pub const fn field(name: &'static str) -> Self
    {
        DetailRule::Field(name)
    }

    #[must_use]
    pub const fn join(head: &'static str, tail: &'static str, separator: Separator) -> Self
    {
        DetailRule::Join { head, tail, separator }
    }

    #[must_use]
    pub const fn custom(extract: CustomRule) -> Self
    {
        DetailRule::Custom(extract)
    }

    fn apply(&self, instance: InstanceRef, cx: &DetailContext<'_>) -> HeapwalkResult<Option<String>>
    {
        match self {
            DetailRule::Field(name) => cx.field_string(instance, name),
            DetailRule::Join { head, tail, separator } => {
                let Some(head) = cx.field_string(instance, head)? else {
                    return Ok(None);
                };
                let Some(tail) = cx.field_string(instance, tail)? else {
                    return Ok(None);
                };
                Ok(Some(format!("{head}{}{tail}", separator.value(cx))))
            }
            DetailRule::Custom(extract) => extract(instance, cx),
        }
    }

    fn release_heap(&self, heap: HeapId)
    {
        if let DetailRule::Join { separator, .. } = self {
            separator.release_heap(heap);
        }
    }
}

/// Separator placed between the two halves of a [`DetailRule::Join`]
#[derive(Debug)]
pub enum Separator
{
    /// Always the same text
    Literal(&'static str),
    /// A system property captured with the heap, read once per heap
    HeapProperty
    {
        name: &'static str,
        default: &'static str,
        cache: HeapScopedCache<Arc<str>>,
    },
}

impl Separator
{
    #[must_use]
    pub const fn literal(text: &'static str) -> Self
    {
        Separator::Literal(text)
    }

    /// Separator taken from the heap's system property `name`, or `default`
    /// when the heap did not record it.
    #[must_use]
    pub const fn heap_property(name: &'static str, default: &'static str) -> Self
    {
        Separator::HeapProperty {
            name,
            default,
            cache: HeapScopedCache::new(),
        }
    }

    fn value(&self, cx: &DetailContext<'_>) -> Cow<'static, str>
    {
        match self {
            Separator::Literal(text) => Cow::Borrowed(*text),
            Separator::HeapProperty { name, default, cache } => {
                let value = cache.get_or_compute(cx.heap_id(), || Arc::from(cx.heap().read_property(name, default)));
                Cow::Owned(value.to_string())
            }
        }
    }

    fn release_heap(&self, heap: HeapId)
    {
        if let Separator::HeapProperty { name, cache, .. } = self {
            if cache.invalidate_for(heap) {
                trace!(%heap, property = *name, "Released cached heap property");
            }
        }
    }
}

/// A [`DetailsProvider`] driven by a class-name → [`DetailRule`] table
#[derive(Debug)]
pub struct FieldTableProvider
{
    name: &'static str,
    classes: SmallVec<[&'static str; 4]>,
    rules: Vec<(&'static str, DetailRule)>,
}

impl FieldTableProvider
{
    #[must_use]
    pub fn new(name: &'static str) -> Self
    {
        FieldTableProvider {
            name,
            classes: SmallVec::new(),
            rules: Vec::new(),
        }
    }

    /// Describe instances of `class_name` with `rule`.
    ///
    /// A class listed twice keeps its first rule.
    #[must_use]
    pub fn rule(mut self, class_name: &'static str, rule: DetailRule) -> Self
    {
        if !self.classes.contains(&class_name) {
            self.classes.push(class_name);
            self.rules.push((class_name, rule));
        }
        self
    }
}

impl DetailsProvider for FieldTableProvider
{
    fn name(&self) -> &str
    {
        self.name
    }

    fn supported_classes(&self) -> &[&str]
    {
        &self.classes
    }

    fn details(&self, class_name: &str, instance: InstanceRef, cx: &DetailContext<'_>) -> HeapwalkResult<Option<String>>
    {
        match self.rules.iter().find(|(class, _)| *class == class_name) {
            Some((_, rule)) => rule.apply(instance, cx),
            None => Ok(None),
        }
    }

    fn release_heap(&self, heap: HeapId)
    {
        for (_, rule) in &self.rules {
            rule.release_heap(heap);
        }
    }
}
