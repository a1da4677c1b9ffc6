// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of tracing-journalhook.
//
// tracing-journalhook is free software: you can redistribute it and/or modify it under the terms
// of the GNU General Public License as published by the Free Software Foundation, either version 3
// of the License, or (at your option) any later version.
//
// tracing-journalhook is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// tracing-journalhook.  If not, see <http://www.gnu.org/licenses/>.

//! Field name normalization.
//!
//! The journal only accepts field names made-up of upper case ASCII letters, digits & the
//! underscore, and reserves names beginning with an underscore for "trusted" fields that it fills
//! in itself. Application field names are therefore upper-cased, anything outside that alphabet
//! is replaced with `_`, and *all* leading underscores are stripped (so that normalization is
//! idempotent).

use crate::entry::Value;

/// Normalize `raw` to a journal field name.
///
/// An empty result (from an empty or all-underscore input) is returned as-is; the transport
/// decides what to do with it.
///
/// ```
/// use tracing_journalhook::normalize::normalize_key;
/// assert_eq!(normalize_key("test-id"), "TEST_ID");
/// assert_eq!(normalize_key("__internal"), "INTERNAL");
/// assert_eq!(normalize_key("___"), "");
/// ```
pub fn normalize_key(raw: &str) -> String {
    let mapped: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    mapped.trim_start_matches('_').to_string()
}

/// Render any field value as text; strings pass through untouched.
pub fn stringify_value(v: &Value) -> String {
    match v {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Normalize every key in `fields` & stringify every value, preserving iteration order.
///
/// Distinct raw keys may collide after normalization (`test-id` & `test_id`, say); both pairs are
/// kept, since the journal permits a field to appear more than once in an entry.
pub fn normalize_fields<'a, I>(fields: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    fields
        .into_iter()
        .map(|(k, v)| (normalize_key(k), stringify_value(v)))
        .collect()
}
