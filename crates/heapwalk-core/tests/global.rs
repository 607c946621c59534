//! Tests for the process-wide registry
//!
//! Kept in their own test binary (and a single test) because the global
//! registry and the tracing subscriber can only be installed once per process.

use heapwalk_core::details::{self, DetailContext, DetailRegistry, DetailsProvider};
use heapwalk_core::error::{HeapwalkError, HeapwalkResult};
use heapwalk_core::heap::{FieldValue, HeapDumpBuilder, InstanceRef};
use heapwalk_utils::{init_logging_with_level, LogFormat, LogLevel};

struct ThreadNameProvider;

impl DetailsProvider for ThreadNameProvider
{
    fn name(&self) -> &str
    {
        "thread"
    }

    fn supported_classes(&self) -> &[&str]
    {
        &["java.lang.Thread"]
    }

    fn details(&self, _class_name: &str, instance: InstanceRef, cx: &DetailContext<'_>) -> HeapwalkResult<Option<String>>
    {
        cx.field_string(instance, "name")
    }
}

#[test]
fn test_install_global_once_at_startup()
{
    init_logging_with_level(LogLevel::Trace, LogFormat::Pretty).expect("Failed to initialize logging");

    let registry = DetailRegistry::builder()
        .with_defaults()
        .register(ThreadNameProvider)
        .build();
    details::install_global(registry).expect("first install succeeds");

    let mut builder = HeapDumpBuilder::new();
    let name = builder.string("main");
    let class = builder.class("java.lang.Thread");
    let thread = builder.instance(class, vec![("name", FieldValue::Object(name))]);
    let heap = builder.build().unwrap();

    assert_eq!(details::global().len(), 3);
    assert_eq!(details::global().describe(&heap, thread).unwrap(), "main");

    let err = details::install_global(DetailRegistry::with_defaults()).unwrap_err();
    assert_eq!(err, HeapwalkError::GlobalRegistryInitialized);
}
