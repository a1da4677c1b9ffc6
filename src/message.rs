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

//! Choosing the text of the journal's `MESSAGE` field.
//!
//! By default `journalctl` shows only the contents of `MESSAGE`. If an entry carries no message
//! but does carry an `error` field, the error becomes the message (and is removed from the
//! fields, so it isn't recorded twice). This makes it possible to write
//!
//! ```ignore
//! tracing::error!(error = %err);
//! ```
//!
//! without providing an additional message & still have something to look at.

use crate::{
    entry::{Fields, LogEntry},
    normalize::stringify_value,
};

/// The field consulted when an entry has no message
pub const ERROR_FIELD: &str = "error";

/// Return the message to send for `entry` along with the fields that remain to be sent.
///
/// `entry` is not modified; the returned fields are a copy.
pub fn resolve_message(entry: &LogEntry) -> (String, Fields) {
    let mut fields = entry.fields.clone();
    if entry.message.is_empty() {
        if let Some(err) = fields.remove(ERROR_FIELD) {
            return (stringify_value(&err), fields);
        }
    }
    (entry.message.clone(), fields)
}
