//! # Heap Accessor
//!
//! The read-only query surface detail providers use to look into a heap.
//!
//! Loaders implement the handful of required methods (class name, field
//! lookup, array lookup, captured system properties). Everything built on top
//! of them (string decoding, integer fields, property defaults) comes for free
//! as provided methods, so every loader decodes `java.lang.String` the same way.
//!
//! ## Handle validity
//!
//! Implementations must reject handles from another heap with
//! [`HeapwalkError::ForeignInstance`] / [`HeapwalkError::ForeignArray`] and
//! ids past their tables with [`HeapwalkError::UnknownInstance`] /
//! [`HeapwalkError::UnknownArray`]. Absence of data is never an error.

use tracing::{trace, warn};

use super::{ArrayRef, FieldValue, HeapId, InstanceRef, Primitive, PrimitiveArray};
use crate::error::HeapwalkResult;

/// Fully qualified name of the string class.
pub const STRING_CLASS: &str = "java.lang.String";

/// `coder` value of a compact string holding Latin-1 bytes
const CODER_LATIN1: i64 = 0;
/// `coder` value of a compact string holding UTF-16 code units
const CODER_UTF16: i64 = 1;

/// Read-only access to one loaded heap dump
///
/// ## Thread Safety
///
/// Heap dumps are immutable once loaded, so implementations are required to
/// be `Send + Sync` and can be shared between analysis views without locking.
pub trait HeapAccessor: Send + Sync
{
    /// Identity of this heap, stable while it stays loaded.
    fn heap_id(&self) -> HeapId;

    /// Fully qualified class name of `instance`, as recorded at capture time.
    ///
    /// ## Errors
    ///
    /// Fails if the handle does not belong to this heap or does not exist.
    fn class_name_of(&self, instance: InstanceRef) -> HeapwalkResult<&str>;

    /// Value of the field `name` of `instance`
    ///
    /// Returns `Ok(None)` when the instance has no such field. When several
    /// fields share the name (a subclass shadowing a superclass field), the
    /// most derived one is returned.
    ///
    /// ## Errors
    ///
    /// Fails if the handle does not belong to this heap or does not exist.
    fn field(&self, instance: InstanceRef, name: &str) -> HeapwalkResult<Option<&FieldValue>>;

    /// Contents of a primitive array.
    ///
    /// ## Errors
    ///
    /// Fails if the handle does not belong to this heap or does not exist.
    fn array(&self, array: ArrayRef) -> HeapwalkResult<&PrimitiveArray>;

    /// A system property captured with the dump, if recorded.
    ///
    /// ## Errors
    ///
    /// Loaders may fail while reconstructing the property table. Callers that
    /// only need cosmetic metadata should use [`HeapAccessor::read_property`].
    fn system_property(&self, name: &str) -> HeapwalkResult<Option<String>>;

    /// A captured system property, or `default` if it is missing or cannot be read.
    fn read_property(&self, name: &str, default: &str) -> String
    {
        match self.system_property(name) {
            Ok(Some(value)) => value,
            Ok(None) => default.to_owned(),
            Err(err) => {
                warn!(heap = %self.heap_id(), property = name, error = %err, "Failed to read heap property, using default");
                default.to_owned()
            }
        }
    }

    /// Integer value of the field `name`, if it is present and an `int`.
    ///
    /// ## Errors
    ///
    /// Only handle-validity errors are returned.
    fn read_int_field(&self, instance: InstanceRef, name: &str) -> HeapwalkResult<Option<i32>>
    {
        Ok(match self.field(instance, name)?.and_then(FieldValue::as_primitive) {
            Some(Primitive::Int(value)) => Some(value),
            _ => None,
        })
    }

    /// Decoded text of the `java.lang.String` referenced by field `name`
    ///
    /// Returns `Ok(None)` if the field is missing, null, not an object
    /// reference, or refers to something other than a string.
    ///
    /// ## Errors
    ///
    /// Only handle-validity errors are returned.
    fn read_string_field(&self, instance: InstanceRef, name: &str) -> HeapwalkResult<Option<String>>
    {
        match self.field(instance, name)?.and_then(FieldValue::as_object) {
            Some(target) => self.read_string(target),
            None => Ok(None),
        }
    }

    /// Decoded text of a `java.lang.String` instance
    ///
    /// Understands the three layouts found in the wild:
    ///
    /// - compact strings: `byte[] value` plus `coder` (0 = Latin-1, 1 = UTF-16)
    /// - legacy strings: `char[] value` windowed by `offset` and `count`
    /// - plain `char[] value`
    ///
    /// UTF-16 byte pairs of compact strings are read little-endian. Returns
    /// `Ok(None)` for instances of other classes or strings without a usable
    /// `value` array.
    ///
    /// ## Errors
    ///
    /// Only handle-validity errors are returned.
    fn read_string(&self, instance: InstanceRef) -> HeapwalkResult<Option<String>>
    {
        if self.class_name_of(instance)? != STRING_CLASS {
            return Ok(None);
        }
        let Some(value) = self.field(instance, "value")?.and_then(FieldValue::as_array) else {
            trace!(%instance, "String without a value array");
            return Ok(None);
        };
        let coder = self
            .field(instance, "coder")?
            .and_then(FieldValue::as_primitive)
            .and_then(Primitive::as_i64);

        let text = match self.array(value)? {
            PrimitiveArray::Byte(bytes) => match coder {
                Some(CODER_UTF16) => decode_utf16_le(bytes),
                Some(CODER_LATIN1) | None => decode_latin1(bytes),
                Some(other) => {
                    trace!(%instance, coder = other, "Unknown string coder");
                    return Ok(None);
                }
            },
            PrimitiveArray::Char(units) => {
                let offset = self.read_int_field(instance, "offset")?;
                let count = self.read_int_field(instance, "count")?;
                String::from_utf16_lossy(char_window(units, offset, count))
            }
            _ => {
                trace!(%instance, "String value is not a byte or char array");
                return Ok(None);
            }
        };
        Ok(Some(text))
    }
}

fn decode_latin1(bytes: &[u8]) -> String
{
    bytes.iter().copied().map(char::from).collect()
}

fn decode_utf16_le(bytes: &[u8]) -> String
{
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Clamp the `offset`/`count` window of a legacy string to its array.
fn char_window(units: &[u16], offset: Option<i32>, count: Option<i32>) -> &[u16]
{
    let start = offset
        .and_then(|offset| usize::try_from(offset).ok())
        .unwrap_or(0)
        .min(units.len());
    let end = count
        .and_then(|count| usize::try_from(count).ok())
        .map_or(units.len(), |count| start.saturating_add(count).min(units.len()));
    &units[start..end]
}
