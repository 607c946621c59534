//! In-memory heap dump.
//!
//! `HeapDump` is the reference [`HeapAccessor`]: a fully materialized object
//! graph built through [`HeapDumpBuilder`]. Binary dump parsers produce one of
//! these (or implement [`HeapAccessor`] over their own paged storage).
//!
//! ## Usage
//!
//! ```rust
//! use heapwalk_core::heap::{FieldValue, HeapAccessor, HeapDumpBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>>
//! {
//!     let mut builder = HeapDumpBuilder::new();
//!     let path = builder.string("/tmp/a.txt");
//!     let file_class = builder.class("java.io.File");
//!     let file = builder.instance(file_class, vec![("path", FieldValue::Object(path))]);
//!     let heap = builder.build()?;
//!
//!     assert_eq!(heap.class_name_of(file)?, "java.io.File");
//!     assert_eq!(heap.read_string_field(file, "path")?.as_deref(), Some("/tmp/a.txt"));
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;

use tracing::debug;

use super::accessor::STRING_CLASS;
use super::{ArrayId, ArrayRef, ClassId, FieldValue, HeapAccessor, HeapId, InstanceId, InstanceRef, Primitive, PrimitiveArray};
use crate::error::{HeapwalkError, HeapwalkResult};

/// One instance: its class and its fields, most derived class first.
#[derive(Debug, Clone)]
struct InstanceData
{
    class: ClassId,
    fields: Vec<(String, FieldValue)>,
}

/// A loaded, immutable heap snapshot
#[derive(Debug)]
pub struct HeapDump
{
    id: HeapId,
    classes: Vec<String>,
    instances: Vec<InstanceData>,
    arrays: Vec<PrimitiveArray>,
    properties: HashMap<String, String>,
}

impl HeapDump
{
    /// Number of instances in the dump.
    #[must_use]
    pub fn instance_count(&self) -> usize
    {
        self.instances.len()
    }

    /// Handles to every instance, in load order.
    pub fn instances(&self) -> impl Iterator<Item = InstanceRef> + '_
    {
        (0..=u32::MAX)
            .take(self.instances.len())
            .map(|index| InstanceRef::new(self.id, InstanceId(index)))
    }

    /// Handles to every instance of the class named `class_name`.
    pub fn instances_of<'a>(&'a self, class_name: &'a str) -> impl Iterator<Item = InstanceRef> + 'a
    {
        self.instances()
            .filter(move |instance| self.class_name_of(*instance).is_ok_and(|name| name == class_name))
    }

    fn instance_data(&self, instance: InstanceRef) -> HeapwalkResult<&InstanceData>
    {
        if instance.heap != self.id {
            return Err(HeapwalkError::ForeignInstance {
                instance,
                loaded: self.id,
            });
        }
        self.instances
            .get(instance.id.0 as usize)
            .ok_or(HeapwalkError::UnknownInstance(instance))
    }
}

impl HeapAccessor for HeapDump
{
    fn heap_id(&self) -> HeapId
    {
        self.id
    }

    fn class_name_of(&self, instance: InstanceRef) -> HeapwalkResult<&str>
    {
        let data = self.instance_data(instance)?;
        self.classes
            .get(data.class.0 as usize)
            .map(String::as_str)
            .ok_or(HeapwalkError::UnknownClass(data.class))
    }

    fn field(&self, instance: InstanceRef, name: &str) -> HeapwalkResult<Option<&FieldValue>>
    {
        let data = self.instance_data(instance)?;
        Ok(data
            .fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value))
    }

    fn array(&self, array: ArrayRef) -> HeapwalkResult<&PrimitiveArray>
    {
        if array.heap != self.id {
            return Err(HeapwalkError::ForeignArray { array, loaded: self.id });
        }
        self.arrays
            .get(array.id.0 as usize)
            .ok_or(HeapwalkError::UnknownArray(array))
    }

    fn system_property(&self, name: &str) -> HeapwalkResult<Option<String>>
    {
        Ok(self.properties.get(name).cloned())
    }
}

/// Incremental builder for a [`HeapDump`]
///
/// The heap identity is allocated when the builder is created, so handles
/// returned while building are already valid for the finished dump and can be
/// stored in fields of instances added later.
#[derive(Debug)]
pub struct HeapDumpBuilder
{
    id: HeapId,
    classes: Vec<String>,
    class_ids: HashMap<String, ClassId>,
    instances: Vec<InstanceData>,
    arrays: Vec<PrimitiveArray>,
    properties: HashMap<String, String>,
    /// First table overflow, reported by `build()`
    overflow: Option<HeapwalkError>,
}

impl Default for HeapDumpBuilder
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl HeapDumpBuilder
{
    /// Start a new heap with a fresh identity.
    #[must_use]
    pub fn new() -> Self
    {
        HeapDumpBuilder {
            id: HeapId::allocate(),
            classes: Vec::new(),
            class_ids: HashMap::new(),
            instances: Vec::new(),
            arrays: Vec::new(),
            properties: HashMap::new(),
            overflow: None,
        }
    }

    /// Identity the finished heap will carry.
    #[must_use]
    pub fn heap_id(&self) -> HeapId
    {
        self.id
    }

    /// Register a class by fully qualified name, returning the existing id
    /// if it was already registered.
    pub fn class(&mut self, name: &str) -> ClassId
    {
        if let Some(id) = self.class_ids.get(name) {
            return *id;
        }
        let id = ClassId(self.next_index(self.classes.len(), "class"));
        self.classes.push(name.to_owned());
        self.class_ids.insert(name.to_owned(), id);
        id
    }

    /// Add an instance of `class` with the given fields, most derived first.
    pub fn instance<N>(&mut self, class: ClassId, fields: Vec<(N, FieldValue)>) -> InstanceRef
    where
        N: Into<String>,
    {
        let id = InstanceId(self.next_index(self.instances.len(), "instance"));
        self.instances.push(InstanceData {
            class,
            fields: fields.into_iter().map(|(name, value)| (name.into(), value)).collect(),
        });
        InstanceRef::new(self.id, id)
    }

    /// Add a primitive array.
    pub fn array(&mut self, contents: PrimitiveArray) -> ArrayRef
    {
        let id = ArrayId(self.next_index(self.arrays.len(), "array"));
        self.arrays.push(contents);
        ArrayRef::new(self.id, id)
    }

    /// Add a `java.lang.String` holding `text` in the compact layout.
    ///
    /// Text that fits in Latin-1 is stored one byte per character with
    /// `coder = 0`, anything else as little-endian UTF-16 with `coder = 1`.
    pub fn string(&mut self, text: &str) -> InstanceRef
    {
        let latin1: Option<Vec<u8>> = text.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect();
        let (bytes, coder) = match latin1 {
            Some(bytes) => (bytes, 0),
            None => (text.encode_utf16().flat_map(u16::to_le_bytes).collect(), 1),
        };
        let value = self.array(PrimitiveArray::Byte(bytes));
        let class = self.class(STRING_CLASS);
        self.instance(
            class,
            vec![
                ("value", FieldValue::Array(value)),
                ("coder", FieldValue::Primitive(Primitive::Byte(coder))),
                ("hash", FieldValue::Primitive(Primitive::Int(0))),
            ],
        )
    }

    /// Record a captured system property.
    pub fn property(&mut self, name: &str, value: &str) -> &mut Self
    {
        self.properties.insert(name.to_owned(), value.to_owned());
        self
    }

    /// Finish the heap
    ///
    /// ## Errors
    ///
    /// - `TableOverflow`: more entries were added than a `u32` id can address
    /// - `UnknownClass`: an instance was created with a class id this builder never handed out
    /// - `DanglingReference`: a field refers to an instance or array outside of this heap
    pub fn build(self) -> HeapwalkResult<HeapDump>
    {
        if let Some(overflow) = self.overflow {
            return Err(overflow);
        }
        for (data, index) in self.instances.iter().zip(0..=u32::MAX) {
            let instance = InstanceRef::new(self.id, InstanceId(index));
            if data.class.0 as usize >= self.classes.len() {
                return Err(HeapwalkError::UnknownClass(data.class));
            }
            for (field, value) in &data.fields {
                let resolvable = match value {
                    FieldValue::Object(target) => {
                        target.heap == self.id && (target.id.0 as usize) < self.instances.len()
                    }
                    FieldValue::Array(target) => target.heap == self.id && (target.id.0 as usize) < self.arrays.len(),
                    FieldValue::Primitive(_) | FieldValue::Null => true,
                };
                if !resolvable {
                    return Err(HeapwalkError::DanglingReference {
                        instance,
                        field: field.clone(),
                    });
                }
            }
        }

        debug!(
            heap = %self.id,
            classes = self.classes.len(),
            instances = self.instances.len(),
            arrays = self.arrays.len(),
            "Heap dump loaded"
        );

        Ok(HeapDump {
            id: self.id,
            classes: self.classes,
            instances: self.instances,
            arrays: self.arrays,
            properties: self.properties,
        })
    }

    /// Id for the next entry of a table currently holding `len` entries.
    ///
    /// On overflow the builder remembers the error for `build()` and hands out
    /// a placeholder id; the heap can never be finished with it.
    fn next_index(&mut self, len: usize, table: &'static str) -> u32
    {
        match table_index(len, table) {
            Ok(index) => index,
            Err(err) => {
                self.overflow.get_or_insert(err);
                u32::MAX
            }
        }
    }
}

fn table_index(len: usize, table: &'static str) -> HeapwalkResult<u32>
{
    u32::try_from(len).map_err(|_| HeapwalkError::TableOverflow { table })
}
