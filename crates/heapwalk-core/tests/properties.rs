//! Property-based tests for detail resolution

use heapwalk_core::details::java::{DEFAULT_FILE_SEPARATOR, FO_INDEXABLE};
use heapwalk_core::details::DetailRegistry;
use heapwalk_core::heap::{FieldValue, HeapDumpBuilder};
use proptest::prelude::*;

/// Class names no built-in provider declares
fn undescribed_class_name() -> impl Strategy<Value = String>
{
    "[a-z]{1,8}(\\.[a-z]{1,8}){0,3}\\.[A-Z][A-Za-z$]{0,12}"
        .prop_filter("must not be a described class", |name| {
            DetailRegistry::with_defaults().providers_for(name).next().is_none()
        })
}

proptest! {
    /// Property: instances of classes nobody declared never get details
    #[test]
    fn prop_undescribed_classes_are_absent(class_name in undescribed_class_name(), text in ".{0,20}") {
        let mut builder = HeapDumpBuilder::new();
        let value = builder.string(&text);
        let class = builder.class(&class_name);
        let instance = builder.instance(
            class,
            vec![
                ("delegate", FieldValue::Object(value)),
                ("url", FieldValue::Object(value)),
                ("path", FieldValue::Object(value)),
            ],
        );
        let heap = builder.build().unwrap();

        prop_assert_eq!(DetailRegistry::with_defaults().resolve(&heap, instance).unwrap(), None);
    }

    /// Property: file object indexables join root and relative path, and
    /// resolving again gives the same text
    #[test]
    fn prop_indexable_join_is_stable(root in "[^\\x00]{1,16}", relative in "[^\\x00]{1,16}") {
        let mut builder = HeapDumpBuilder::new();
        let root_ref = builder.string(&root);
        let relative_ref = builder.string(&relative);
        let class = builder.class(FO_INDEXABLE);
        let instance = builder.instance(
            class,
            vec![("root", FieldValue::Object(root_ref)), ("relativePath", FieldValue::Object(relative_ref))],
        );
        let heap = builder.build().unwrap();
        let registry = DetailRegistry::with_defaults();

        let first = registry.resolve(&heap, instance).unwrap();
        let second = registry.resolve(&heap, instance).unwrap();
        prop_assert_eq!(first.clone(), Some(format!("{root}{DEFAULT_FILE_SEPARATOR}{relative}")));
        prop_assert_eq!(first, second);
    }
}
