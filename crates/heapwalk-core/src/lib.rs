//! # heapwalk-core
//!
//! Instance detail resolution for captured heap dumps.
//!
//! Given a loaded heap and an instance in it, this crate produces a short
//! human-readable summary of what the instance stands for (a file path, a
//! URL, a delegated identifier) without the caller knowing anything about the
//! instance's field layout.
//!
//! This crate provides:
//! - The read-only heap accessor contract and an in-memory heap dump
//! - Pluggable, class-name keyed detail providers
//! - An ordered provider registry with a process-wide default
//! - Heap-scoped caching for metadata that belongs to a dump, not an instance
//! - Value types for browsing a catalog of canned queries
//!
//! ## Quick Start
//!
//! ```rust
//! use heapwalk_core::details;
//! use heapwalk_core::heap::{FieldValue, HeapDumpBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>>
//! {
//!     let mut builder = HeapDumpBuilder::new();
//!     builder.property("file.separator", "/");
//!     let root = builder.string("/home/me/project");
//!     let relative = builder.string("src/Main.java");
//!     let class = builder.class("org.netbeans.modules.parsing.impl.indexing.FileObjectIndexable");
//!     let indexable = builder.instance(
//!         class,
//!         vec![("root", FieldValue::Object(root)), ("relativePath", FieldValue::Object(relative))],
//!     );
//!     let heap = builder.build()?;
//!
//!     let text = details::global().describe(&heap, indexable)?;
//!     assert_eq!(text, "/home/me/project/src/Main.java");
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod details;
pub mod error;
pub mod heap;
pub mod prelude;

pub use details::{DetailRegistry, DetailsProvider};
// Re-export commonly used types
pub use error::{HeapwalkError, HeapwalkResult};
pub use heap::{HeapAccessor, HeapDump, HeapId, InstanceRef};
