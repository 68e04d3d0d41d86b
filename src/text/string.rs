use std::borrow::Cow;

use memchr::memchr_iter;

use crate::constants::{is_array_name, ARRAY_SUFFIX};
use crate::decode::chars::is_name_char;

/// Escapes every `"` as `\"`, the only escape the grammar knows.
pub fn mask_value(value: &str) -> Cow<'_, str> {
    if memchr::memchr(b'"', value.as_bytes()).is_none() {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 4);
    mask_value_into(&mut out, value);
    Cow::Owned(out)
}

pub fn mask_value_into(out: &mut String, value: &str) {
    let mut start = 0;
    for idx in memchr_iter(b'"', value.as_bytes()) {
        out.push_str(&value[start..idx]);
        out.push_str("\\\"");
        start = idx + 1;
    }
    out.push_str(&value[start..]);
}

/// Attribute names: one or more name characters, no brackets.
pub fn is_valid_attr_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|ch| is_name_char(ch) && ch != '[' && ch != ']')
}

/// Node names: an attribute-style name, optionally followed by `[]`.
pub fn is_valid_node_name(name: &str) -> bool {
    let base = if is_array_name(name) {
        &name[..name.len() - ARRAY_SUFFIX.len()]
    } else {
        name
    };
    is_valid_attr_name(base)
}
