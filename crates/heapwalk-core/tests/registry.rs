//! Tests for detail resolution through the registry

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use heapwalk_core::details::java::{CLASSPATH_ENTRY, FO_INDEXABLE, INDEXABLE};
use heapwalk_core::details::jdk::URL;
use heapwalk_core::details::{DetailContext, DetailRegistry, DetailsProvider, NO_DETAILS};
use heapwalk_core::error::{HeapwalkError, HeapwalkResult};
use heapwalk_core::heap::{
    ArrayRef, ClassId, FieldValue, HeapAccessor, HeapDump, HeapDumpBuilder, HeapId, InstanceId, InstanceRef, Primitive,
    PrimitiveArray,
};

/// Heap wrapper counting how often captured properties are read
struct CountingHeap
{
    inner: HeapDump,
    property_reads: AtomicUsize,
}

impl CountingHeap
{
    fn new(inner: HeapDump) -> Self
    {
        CountingHeap {
            inner,
            property_reads: AtomicUsize::new(0),
        }
    }

    fn property_reads(&self) -> usize
    {
        self.property_reads.load(Ordering::SeqCst)
    }
}

impl HeapAccessor for CountingHeap
{
    fn heap_id(&self) -> HeapId
    {
        self.inner.heap_id()
    }

    fn class_name_of(&self, instance: InstanceRef) -> HeapwalkResult<&str>
    {
        self.inner.class_name_of(instance)
    }

    fn field(&self, instance: InstanceRef, name: &str) -> HeapwalkResult<Option<&FieldValue>>
    {
        self.inner.field(instance, name)
    }

    fn array(&self, array: ArrayRef) -> HeapwalkResult<&PrimitiveArray>
    {
        self.inner.array(array)
    }

    fn system_property(&self, name: &str) -> HeapwalkResult<Option<String>>
    {
        self.property_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.system_property(name)
    }
}

/// Heap whose captured properties cannot be read
struct FailingProperties
{
    inner: HeapDump,
}

impl HeapAccessor for FailingProperties
{
    fn heap_id(&self) -> HeapId
    {
        self.inner.heap_id()
    }

    fn class_name_of(&self, instance: InstanceRef) -> HeapwalkResult<&str>
    {
        self.inner.class_name_of(instance)
    }

    fn field(&self, instance: InstanceRef, name: &str) -> HeapwalkResult<Option<&FieldValue>>
    {
        self.inner.field(instance, name)
    }

    fn array(&self, array: ArrayRef) -> HeapwalkResult<&PrimitiveArray>
    {
        self.inner.array(array)
    }

    fn system_property(&self, _name: &str) -> HeapwalkResult<Option<String>>
    {
        Err(HeapwalkError::UnknownClass(ClassId(0)))
    }
}

/// Provider answering a fixed string for the classes it declares
struct FixedProvider
{
    name: &'static str,
    classes: Vec<&'static str>,
    answer: Option<&'static str>,
    calls: AtomicUsize,
}

impl FixedProvider
{
    fn new(name: &'static str, classes: Vec<&'static str>, answer: Option<&'static str>) -> Self
    {
        FixedProvider {
            name,
            classes,
            answer,
            calls: AtomicUsize::new(0),
        }
    }
}

impl DetailsProvider for FixedProvider
{
    fn name(&self) -> &str
    {
        self.name
    }

    fn supported_classes(&self) -> &[&str]
    {
        &self.classes
    }

    fn details(&self, _class_name: &str, _instance: InstanceRef, _cx: &DetailContext<'_>) -> HeapwalkResult<Option<String>>
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer.map(str::to_string))
    }
}

/// A `FileObjectIndexable` with the given fields, in a heap with the given separator
fn indexable_heap(root: Option<&str>, relative_path: Option<&str>, separator: Option<&str>) -> (HeapDump, InstanceRef)
{
    let mut builder = HeapDumpBuilder::new();
    if let Some(separator) = separator {
        builder.property("file.separator", separator);
    }
    let mut fields = Vec::new();
    if let Some(root) = root {
        fields.push(("root", FieldValue::Object(builder.string(root))));
    }
    if let Some(relative_path) = relative_path {
        fields.push(("relativePath", FieldValue::Object(builder.string(relative_path))));
    }
    let class = builder.class(FO_INDEXABLE);
    let instance = builder.instance(class, fields);
    (builder.build().unwrap(), instance)
}

#[test]
fn test_unknown_class_resolves_to_absence()
{
    let mut builder = HeapDumpBuilder::new();
    let name = builder.string("not described");
    let class = builder.class("com.example.Unknown");
    let instance = builder.instance(class, vec![("url", FieldValue::Object(name))]);
    let heap = builder.build().unwrap();

    let registry = DetailRegistry::with_defaults();
    assert_eq!(registry.resolve(&heap, instance).unwrap(), None);
    assert_eq!(registry.describe(&heap, instance).unwrap(), NO_DETAILS);
}

#[test]
fn test_class_names_match_exactly()
{
    // A subclass of a described class is not described
    let mut builder = HeapDumpBuilder::new();
    let url = builder.string("file:/a.jar");
    let class = builder.class("org.netbeans.api.java.classpath.ClassPath$Entry$Sub");
    let instance = builder.instance(class, vec![("url", FieldValue::Object(url))]);
    let heap = builder.build().unwrap();

    assert_eq!(DetailRegistry::with_defaults().resolve(&heap, instance).unwrap(), None);
}

#[test]
fn test_file_object_indexable_joins_root_and_relative_path()
{
    let (heap, instance) = indexable_heap(Some("/a/b"), Some("c.txt"), Some("/"));
    let registry = DetailRegistry::with_defaults();
    assert_eq!(registry.resolve(&heap, instance).unwrap().as_deref(), Some("/a/b/c.txt"));
}

#[test]
fn test_file_object_indexable_uses_heap_separator()
{
    let (heap, instance) = indexable_heap(Some("C:\\work"), Some("Main.java"), Some("\\"));
    let registry = DetailRegistry::with_defaults();
    assert_eq!(registry.resolve(&heap, instance).unwrap().as_deref(), Some("C:\\work\\Main.java"));
}

#[test]
fn test_file_object_indexable_defaults_to_slash()
{
    let (heap, instance) = indexable_heap(Some("/src"), Some("lib.rs"), None);
    let registry = DetailRegistry::with_defaults();
    assert_eq!(registry.resolve(&heap, instance).unwrap().as_deref(), Some("/src/lib.rs"));
}

#[test]
fn test_file_object_indexable_missing_relative_path_is_absent()
{
    let (heap, instance) = indexable_heap(Some("/a/b"), None, Some("/"));
    let registry = DetailRegistry::with_defaults();
    assert_eq!(registry.resolve(&heap, instance).unwrap(), None);
}

#[test]
fn test_file_object_indexable_null_root_is_absent()
{
    let mut builder = HeapDumpBuilder::new();
    let relative = builder.string("c.txt");
    let class = builder.class(FO_INDEXABLE);
    let instance = builder.instance(
        class,
        vec![("root", FieldValue::Null), ("relativePath", FieldValue::Object(relative))],
    );
    let heap = builder.build().unwrap();

    assert_eq!(DetailRegistry::with_defaults().resolve(&heap, instance).unwrap(), None);
}

#[test]
fn test_indexable_returns_delegate_string()
{
    let mut builder = HeapDumpBuilder::new();
    let delegate = builder.string("x");
    let class = builder.class(INDEXABLE);
    let instance = builder.instance(class, vec![("delegate", FieldValue::Object(delegate))]);
    let heap = builder.build().unwrap();

    assert_eq!(
        DetailRegistry::with_defaults().resolve(&heap, instance).unwrap().as_deref(),
        Some("x")
    );
}

#[test]
fn test_indexable_null_delegate_is_absent()
{
    let mut builder = HeapDumpBuilder::new();
    let class = builder.class(INDEXABLE);
    let instance = builder.instance(class, vec![("delegate", FieldValue::Null)]);
    let heap = builder.build().unwrap();

    assert_eq!(DetailRegistry::with_defaults().resolve(&heap, instance).unwrap(), None);
}

#[test]
fn test_indexable_primitive_delegate_is_absent()
{
    let mut builder = HeapDumpBuilder::new();
    let class = builder.class(INDEXABLE);
    let instance = builder.instance(class, vec![("delegate", FieldValue::Primitive(Primitive::Int(42)))]);
    let heap = builder.build().unwrap();

    assert_eq!(DetailRegistry::with_defaults().resolve(&heap, instance).unwrap(), None);
}

#[test]
fn test_indexable_describes_nested_delegate()
{
    let mut builder = HeapDumpBuilder::new();
    let root = builder.string("/project");
    let relative = builder.string("Main.java");
    let fo_class = builder.class(FO_INDEXABLE);
    let file_object = builder.instance(
        fo_class,
        vec![("root", FieldValue::Object(root)), ("relativePath", FieldValue::Object(relative))],
    );
    let class = builder.class(INDEXABLE);
    let instance = builder.instance(class, vec![("delegate", FieldValue::Object(file_object))]);
    let heap = builder.build().unwrap();

    assert_eq!(
        DetailRegistry::with_defaults().resolve(&heap, instance).unwrap().as_deref(),
        Some("/project/Main.java")
    );
}

#[test]
fn test_self_referencing_delegate_terminates()
{
    let mut builder = HeapDumpBuilder::new();
    let class = builder.class(INDEXABLE);
    let heap_id = builder.heap_id();
    // The first instance of a fresh heap gets index 0
    let itself = InstanceRef::new(heap_id, InstanceId(0));
    let instance = builder.instance(class, vec![("delegate", FieldValue::Object(itself))]);
    assert_eq!(instance, itself);
    let heap = builder.build().unwrap();

    assert_eq!(DetailRegistry::with_defaults().resolve(&heap, instance).unwrap(), None);
}

#[test]
fn test_indexable_delegate_cycle_is_absent()
{
    let mut builder = HeapDumpBuilder::new();
    let class = builder.class(INDEXABLE);
    let heap_id = builder.heap_id();
    let second = InstanceRef::new(heap_id, InstanceId(1));
    let first = builder.instance(class, vec![("delegate", FieldValue::Object(second))]);
    let instance = builder.instance(class, vec![("delegate", FieldValue::Object(first))]);
    assert_eq!(instance, second);
    let heap = builder.build().unwrap();

    let registry = DetailRegistry::with_defaults();
    assert_eq!(registry.resolve(&heap, first).unwrap(), None);
    assert_eq!(registry.resolve(&heap, second).unwrap(), None);
}

#[test]
fn test_self_referencing_url_fields_are_skipped()
{
    // Every optional part of the URL points back at the URL itself
    let mut builder = HeapDumpBuilder::new();
    let protocol = builder.string("http");
    let heap_id = builder.heap_id();
    let class = builder.class(URL);
    let itself = InstanceRef::new(heap_id, InstanceId(1));
    let url = builder.instance(
        class,
        vec![
            ("protocol", FieldValue::Object(protocol)),
            ("authority", FieldValue::Object(itself)),
            ("host", FieldValue::Object(itself)),
            ("file", FieldValue::Object(itself)),
            ("ref", FieldValue::Object(itself)),
        ],
    );
    assert_eq!(url, itself);
    let heap = builder.build().unwrap();

    assert_eq!(DetailRegistry::with_defaults().resolve(&heap, url).unwrap().as_deref(), Some("http:"));
}

#[test]
fn test_classpath_entry_returns_url_string()
{
    let mut builder = HeapDumpBuilder::new();
    let url = builder.string("jar:file:/opt/lib/a.jar!/");
    let class = builder.class(CLASSPATH_ENTRY);
    let instance = builder.instance(class, vec![("url", FieldValue::Object(url))]);
    let heap = builder.build().unwrap();

    assert_eq!(
        DetailRegistry::with_defaults().resolve(&heap, instance).unwrap().as_deref(),
        Some("jar:file:/opt/lib/a.jar!/")
    );
}

#[test]
fn test_classpath_entry_describes_url_object()
{
    let mut builder = HeapDumpBuilder::new();
    let protocol = builder.string("http");
    let host = builder.string("example.com");
    let file = builder.string("/index.html");
    let reference = builder.string("top");
    let url_class = builder.class(URL);
    let url = builder.instance(
        url_class,
        vec![
            ("protocol", FieldValue::Object(protocol)),
            ("host", FieldValue::Object(host)),
            ("port", FieldValue::Primitive(Primitive::Int(8080))),
            ("file", FieldValue::Object(file)),
            ("ref", FieldValue::Object(reference)),
            ("authority", FieldValue::Null),
        ],
    );
    let class = builder.class(CLASSPATH_ENTRY);
    let instance = builder.instance(class, vec![("url", FieldValue::Object(url))]);
    let heap = builder.build().unwrap();

    assert_eq!(
        DetailRegistry::with_defaults().resolve(&heap, instance).unwrap().as_deref(),
        Some("http://example.com:8080/index.html#top")
    );
}

#[test]
fn test_url_without_authority()
{
    let mut builder = HeapDumpBuilder::new();
    let protocol = builder.string("file");
    let file = builder.string("/opt/lib/a.jar");
    let url_class = builder.class(URL);
    let url = builder.instance(
        url_class,
        vec![
            ("protocol", FieldValue::Object(protocol)),
            ("host", FieldValue::Null),
            ("port", FieldValue::Primitive(Primitive::Int(-1))),
            ("file", FieldValue::Object(file)),
            ("ref", FieldValue::Null),
        ],
    );
    let heap = builder.build().unwrap();

    assert_eq!(
        DetailRegistry::with_defaults().resolve(&heap, url).unwrap().as_deref(),
        Some("file:/opt/lib/a.jar")
    );
}

#[test]
fn test_separator_is_read_once_per_heap()
{
    let (heap, instance) = indexable_heap(Some("/a/b"), Some("c.txt"), Some("/"));
    let heap = CountingHeap::new(heap);
    let registry = DetailRegistry::with_defaults();

    let first = registry.resolve(&heap, instance).unwrap();
    let second = registry.resolve(&heap, instance).unwrap();

    assert_eq!(first.as_deref(), Some("/a/b/c.txt"));
    assert_eq!(first, second);
    assert_eq!(heap.property_reads(), 1);
}

#[test]
fn test_separator_is_reread_for_another_heap()
{
    let (unix_heap, unix_instance) = indexable_heap(Some("/a"), Some("b"), Some("/"));
    let (windows_heap, windows_instance) = indexable_heap(Some("C:"), Some("b"), Some("\\"));
    let unix_heap = CountingHeap::new(unix_heap);
    let windows_heap = CountingHeap::new(windows_heap);
    let registry = DetailRegistry::with_defaults();

    assert_eq!(registry.resolve(&unix_heap, unix_instance).unwrap().as_deref(), Some("/a/b"));
    assert_eq!(registry.resolve(&windows_heap, windows_instance).unwrap().as_deref(), Some("C:\\b"));
    assert_eq!(registry.resolve(&unix_heap, unix_instance).unwrap().as_deref(), Some("/a/b"));

    assert_eq!(unix_heap.property_reads(), 2);
    assert_eq!(windows_heap.property_reads(), 1);
}

#[test]
fn test_separator_not_read_when_fields_missing()
{
    let (heap, instance) = indexable_heap(Some("/a/b"), None, Some("/"));
    let heap = CountingHeap::new(heap);
    assert_eq!(DetailRegistry::with_defaults().resolve(&heap, instance).unwrap(), None);
    assert_eq!(heap.property_reads(), 0);
}

#[test]
fn test_unreadable_separator_falls_back_to_default()
{
    let (heap, instance) = indexable_heap(Some("/a/b"), Some("c.txt"), Some("\\"));
    let heap = FailingProperties { inner: heap };

    assert_eq!(
        DetailRegistry::with_defaults().resolve(&heap, instance).unwrap().as_deref(),
        Some("/a/b/c.txt")
    );
}

#[test]
fn test_released_heap_rereads_separator()
{
    let (heap, instance) = indexable_heap(Some("/a/b"), Some("c.txt"), Some("/"));
    let heap = CountingHeap::new(heap);
    let registry = DetailRegistry::with_defaults();

    assert_eq!(registry.resolve(&heap, instance).unwrap().as_deref(), Some("/a/b/c.txt"));
    registry.release_heap(HeapId::allocate());
    assert_eq!(registry.resolve(&heap, instance).unwrap().as_deref(), Some("/a/b/c.txt"));
    assert_eq!(heap.property_reads(), 1);

    registry.release_heap(heap.heap_id());
    assert_eq!(registry.resolve(&heap, instance).unwrap().as_deref(), Some("/a/b/c.txt"));
    assert_eq!(heap.property_reads(), 2);
}

#[test]
fn test_resolve_is_idempotent()
{
    let (heap, instance) = indexable_heap(Some("/a/b"), Some("c.txt"), Some("/"));
    let registry = DetailRegistry::with_defaults();
    let results: Vec<_> = (0..5).map(|_| registry.resolve(&heap, instance).unwrap()).collect();
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_first_registered_provider_wins()
{
    let first = Arc::new(FixedProvider::new("first", vec!["x.Y"], Some("first")));
    let second = Arc::new(FixedProvider::new("second", vec!["x.Y"], Some("second")));
    let registry = DetailRegistry::builder()
        .register_shared(first.clone())
        .register_shared(second.clone())
        .build();

    let mut builder = HeapDumpBuilder::new();
    let class = builder.class("x.Y");
    let instance = builder.instance(class, Vec::<(&str, FieldValue)>::new());
    let heap = builder.build().unwrap();

    for _ in 0..3 {
        assert_eq!(registry.resolve(&heap, instance).unwrap().as_deref(), Some("first"));
    }
    assert_eq!(first.calls.load(Ordering::SeqCst), 3);
    assert_eq!(second.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_declining_provider_falls_through()
{
    let declines = Arc::new(FixedProvider::new("declines", vec!["x.Y"], None));
    let empty = Arc::new(FixedProvider::new("empty", vec!["x.Y"], Some("")));
    let answers = Arc::new(FixedProvider::new("answers", vec!["x.Y"], Some("answer")));
    let registry = DetailRegistry::builder()
        .register_shared(declines.clone())
        .register_shared(empty.clone())
        .register_shared(answers.clone())
        .build();

    let mut builder = HeapDumpBuilder::new();
    let class = builder.class("x.Y");
    let instance = builder.instance(class, Vec::<(&str, FieldValue)>::new());
    let heap = builder.build().unwrap();

    assert_eq!(registry.resolve(&heap, instance).unwrap().as_deref(), Some("answer"));
    assert_eq!(declines.calls.load(Ordering::SeqCst), 1);
    assert_eq!(empty.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_provider_only_sees_declared_classes()
{
    let picky = Arc::new(FixedProvider::new("picky", vec!["x.Declared"], Some("seen")));
    let registry = DetailRegistry::builder().register_shared(picky.clone()).build();

    let mut builder = HeapDumpBuilder::new();
    let class = builder.class("x.Other");
    let instance = builder.instance(class, Vec::<(&str, FieldValue)>::new());
    let heap = builder.build().unwrap();

    assert_eq!(registry.resolve(&heap, instance).unwrap(), None);
    assert_eq!(picky.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_custom_provider_added_at_startup()
{
    let registry = DetailRegistry::builder()
        .with_defaults()
        .register(FixedProvider::new("extra", vec!["com.example.Thing"], Some("thing")))
        .build();
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.providers_for("com.example.Thing").count(), 1);
    assert_eq!(
        registry.providers_for(INDEXABLE).map(|p| p.name().to_string()).collect::<Vec<_>>(),
        vec!["java"]
    );
}

#[test]
fn test_foreign_instance_fails_loudly()
{
    let (first_heap, first_instance) = indexable_heap(Some("/a"), Some("b"), None);
    let (second_heap, _) = indexable_heap(Some("/c"), Some("d"), None);
    let registry = DetailRegistry::with_defaults();

    assert_eq!(registry.resolve(&first_heap, first_instance).unwrap().as_deref(), Some("/a/b"));
    let err = registry.resolve(&second_heap, first_instance).unwrap_err();
    assert_eq!(
        err,
        HeapwalkError::ForeignInstance {
            instance: first_instance,
            loaded: second_heap.heap_id(),
        }
    );
}

#[test]
fn test_registry_is_shared_across_threads()
{
    let registry = Arc::new(DetailRegistry::with_defaults());
    let heaps: Vec<_> = ["/", "\\", ":"]
        .into_iter()
        .map(|separator| Arc::new(indexable_heap(Some("r"), Some("p"), Some(separator))))
        .collect();

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let heap = Arc::clone(&heaps[i % heaps.len()]);
            std::thread::spawn(move || {
                let (dump, instance) = &*heap;
                let expected = format!("r{}p", dump.read_property("file.separator", "/"));
                for _ in 0..100 {
                    assert_eq!(registry.resolve(dump, *instance).unwrap(), Some(expected.clone()));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
