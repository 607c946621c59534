//! Details for JDK platform types that other providers delegate to.
//!
//! A classpath entry's `url` field holds a `java.net.URL`, not a string; these
//! rules are what make such fields readable.

use super::{DetailContext, DetailRule, FieldTableProvider};
use crate::error::HeapwalkResult;
use crate::heap::InstanceRef;

pub const FILE: &str = "java.io.File";
pub const URI: &str = "java.net.URI";
pub const URL: &str = "java.net.URL";

/// `port` of a URL that does not name one
const NO_PORT: i32 = -1;

/// Provider for `java.io.File`, `java.net.URI` and `java.net.URL`.
#[must_use]
pub fn provider() -> FieldTableProvider
{
    FieldTableProvider::new("jdk")
        .rule(FILE, DetailRule::field("path"))
        .rule(URI, DetailRule::field("string"))
        .rule(URL, DetailRule::custom(url_external_form))
}

/// `protocol:[//authority]file[#ref]`, the same text `URL.toExternalForm()` gives.
fn url_external_form(instance: InstanceRef, cx: &DetailContext<'_>) -> HeapwalkResult<Option<String>>
{
    let Some(protocol) = cx.field_string(instance, "protocol")? else {
        return Ok(None);
    };

    let mut text = format!("{protocol}:");
    let authority = match cx.field_string(instance, "authority")? {
        Some(authority) if !authority.is_empty() => Some(authority),
        _ => match cx.field_string(instance, "host")? {
            Some(host) if !host.is_empty() => match cx.heap().read_int_field(instance, "port")? {
                Some(port) if port != NO_PORT => Some(format!("{host}:{port}")),
                _ => Some(host),
            },
            _ => None,
        },
    };
    if let Some(authority) = authority {
        text.push_str("//");
        text.push_str(&authority);
    }
    if let Some(file) = cx.field_string(instance, "file")? {
        text.push_str(&file);
    }
    if let Some(reference) = cx.field_string(instance, "ref")? {
        text.push('#');
        text.push_str(&reference);
    }
    Ok(Some(text))
}
