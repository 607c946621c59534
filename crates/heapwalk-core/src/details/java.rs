//! Details for the NetBeans indexing and classpath types.
//!
//! | Class | Details |
//! |---|---|
//! | `FileObjectIndexable` | `root` + heap `file.separator` + `relativePath` |
//! | `Indexable` | whatever its `delegate` describes to |
//! | `ClassPath$Entry` | its `url` |

use super::{DetailRule, FieldTableProvider, Separator};

pub const FO_INDEXABLE: &str = "org.netbeans.modules.parsing.impl.indexing.FileObjectIndexable";
pub const INDEXABLE: &str = "org.netbeans.modules.parsing.spi.indexing.Indexable";
pub const CLASSPATH_ENTRY: &str = "org.netbeans.api.java.classpath.ClassPath$Entry";

/// System property holding the path separator of the dumped process.
pub const FILE_SEPARATOR_PROPERTY: &str = "file.separator";
/// Separator assumed when the heap did not record one.
pub const DEFAULT_FILE_SEPARATOR: &str = "/";

/// Provider for the indexing/classpath family.
///
/// The separator is read from the heap once per heap identity and cached
/// inside the returned provider.
#[must_use]
pub fn provider() -> FieldTableProvider
{
    FieldTableProvider::new("java")
        .rule(
            FO_INDEXABLE,
            DetailRule::join(
                "root",
                "relativePath",
                Separator::heap_property(FILE_SEPARATOR_PROPERTY, DEFAULT_FILE_SEPARATOR),
            ),
        )
        .rule(INDEXABLE, DetailRule::field("delegate"))
        .rule(CLASSPATH_ENTRY, DetailRule::field("url"))
}
