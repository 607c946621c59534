//! Common module for library exports

pub use crate::catalog::{QueryCategory, QueryDefinition, QueryRepository, StaticQueryRepository};
pub use crate::details::{
    DetailContext, DetailRegistry, DetailRegistryBuilder, DetailRule, DetailsProvider, FieldTableProvider,
    HeapScopedCache, Separator, NO_DETAILS,
};
pub use crate::error::{HeapwalkError, HeapwalkResult};
pub use crate::heap::{
    ArrayRef, FieldValue, HeapAccessor, HeapDump, HeapDumpBuilder, HeapId, InstanceRef, Primitive, PrimitiveArray,
};
