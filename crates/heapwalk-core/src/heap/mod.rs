//! Heap snapshot model: identities, field values, the read-only accessor
//! contract and the in-memory dump.

pub mod accessor;
pub mod dump;
pub mod ids;
pub mod value;

pub use accessor::{HeapAccessor, STRING_CLASS};
pub use dump::{HeapDump, HeapDumpBuilder};
pub use ids::{ArrayId, ArrayRef, ClassId, HeapId, InstanceId, InstanceRef};
pub use value::{FieldValue, Primitive, PrimitiveArray};
