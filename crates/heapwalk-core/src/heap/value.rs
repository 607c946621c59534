//! Field values as recorded in a heap dump.

use super::{ArrayRef, InstanceRef};

/// Value of a primitive field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive
{
    Boolean(bool),
    Byte(i8),
    /// UTF-16 code unit
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Primitive
{
    /// Widen any integral value to `i64`.
    ///
    /// Returns `None` for booleans and floating point values.
    #[must_use]
    pub fn as_i64(self) -> Option<i64>
    {
        match self {
            Primitive::Byte(v) => Some(i64::from(v)),
            Primitive::Char(v) => Some(i64::from(v)),
            Primitive::Short(v) => Some(i64::from(v)),
            Primitive::Int(v) => Some(i64::from(v)),
            Primitive::Long(v) => Some(v),
            Primitive::Boolean(_) | Primitive::Float(_) | Primitive::Double(_) => None,
        }
    }
}

/// Value of an instance field
///
/// Heap dumps are dynamically typed: a field name alone says nothing about
/// what is stored under it. Callers match on the variant and treat anything
/// unexpected as "value unavailable".
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue
{
    /// A primitive scalar
    Primitive(Primitive),
    /// A reference to another instance
    Object(InstanceRef),
    /// A reference to a primitive array
    Array(ArrayRef),
    /// A null reference
    Null,
}

impl FieldValue
{
    /// The referenced instance, if this is a non-null object reference.
    #[must_use]
    pub fn as_object(&self) -> Option<InstanceRef>
    {
        match self {
            FieldValue::Object(instance) => Some(*instance),
            _ => None,
        }
    }

    /// The referenced array, if this is a non-null array reference.
    #[must_use]
    pub fn as_array(&self) -> Option<ArrayRef>
    {
        match self {
            FieldValue::Array(array) => Some(*array),
            _ => None,
        }
    }

    /// The primitive value, if this is a primitive field.
    #[must_use]
    pub fn as_primitive(&self) -> Option<Primitive>
    {
        match self {
            FieldValue::Primitive(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool
    {
        matches!(self, FieldValue::Null)
    }
}

/// Contents of a primitive array
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveArray
{
    Boolean(Vec<bool>),
    /// Raw bytes, as stored in the dump
    Byte(Vec<u8>),
    /// UTF-16 code units
    Char(Vec<u16>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl PrimitiveArray
{
    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize
    {
        match self {
            PrimitiveArray::Boolean(v) => v.len(),
            PrimitiveArray::Byte(v) => v.len(),
            PrimitiveArray::Char(v) => v.len(),
            PrimitiveArray::Short(v) => v.len(),
            PrimitiveArray::Int(v) => v.len(),
            PrimitiveArray::Long(v) => v.len(),
            PrimitiveArray::Float(v) => v.len(),
            PrimitiveArray::Double(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }
}
