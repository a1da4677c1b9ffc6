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

//! Flattening a [`LogEntry`] into a single line of text.
//!
//! # Introduction
//!
//! The translation from a [`LogEntry`] to a journal entry normally keeps the entry's fields as
//! journal fields. Some consumers (anything reading the journal through a syslog-style view, for
//! instance) only ever see `MESSAGE`, though. For them, a [`JournalHook`] may be given an
//! [`EntryFormatter`]; whatever bytes it produces become the message.
//!
//! [`JournalHook`]: crate::hook::JournalHook
//!
//! [`TextFormatter`] is the provided implementation. It renders an entry as
//!
//! ```text
//! [prefix] key1=value1 key2="value two" msg="the message"
//! ```
//!
//! with keys sorted (by default lexically), values quoted when they contain anything outside
//! `[A-Za-z0-9-._/@^+]`, and a trailing newline.
//!
//! # Configuration
//!
//! [`TextFormatter`] is immutable once built; use [`TextFormatter::builder`]:
//!
//! ```rust
//! use tracing_journalhook::formatter::{EntryFormatter, TextFormatter};
//! use tracing_journalhook::entry::{Level, LogEntry};
//!
//! let fmtr = TextFormatter::builder().force_quote(true).build();
//! let line = fmtr.format(&LogEntry::new(Level::Info, "hello").with_field("n", 1i64));
//! assert_eq!(line, b"n=\"1\" msg=\"hello\"\n");
//! ```

use crate::{
    entry::{Caller, LogEntry},
    normalize::stringify_value,
};

use std::{collections::BTreeMap, fmt::Write};

/// Reserved for the timestamp; never rendered
pub const FIELD_KEY_TIME: &str = "time";
/// Reserved for the level; never rendered
pub const FIELD_KEY_LEVEL: &str = "level";
/// Rendered as a bracketed prefix at the start of the line
pub const FIELD_KEY_PREFIX: &str = "prefix";
pub const FIELD_KEY_MSG: &str = "msg";
pub const FIELD_KEY_FUNC: &str = "func";
pub const FIELD_KEY_FILE: &str = "file";

/// Operations all entry formatters must support.
///
/// Formatting may not fail: an implementation that runs into trouble shall return whatever it has
/// managed to produce (possibly nothing) rather than hold up delivery of the entry.
pub trait EntryFormatter: Send + Sync {
    fn format(&self, entry: &LogEntry) -> Vec<u8>;
}

/// Orders the keys to be rendered
pub type SortFn = Box<dyn Fn(&mut [String]) + Send + Sync>;

/// Produces the (function, file) values for an entry's call site; an empty string suppresses the
/// corresponding key
pub type CallerPrettyfierFn = Box<dyn Fn(&Caller) -> (String, String) + Send + Sync>;

fn default_sort(keys: &mut [String]) {
    keys.sort();
}

fn default_caller_prettyfier(caller: &Caller) -> (String, String) {
    (
        caller.function.clone().unwrap_or_default(),
        format!("{}:{}", caller.file, caller.line),
    )
}

/// True if `text` contains anything beyond `[A-Za-z0-9-._/@^+]`
fn has_special_character(text: &str) -> bool {
    !text
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '/' | '@' | '^' | '+'))
}

/// An [`EntryFormatter`] producing `key=value` lines.
pub struct TextFormatter {
    force_quote: bool,
    disable_quote: bool,
    quote_empty_fields: bool,
    sorting: SortFn,
    caller_prettyfier: CallerPrettyfierFn,
}

impl std::default::Default for TextFormatter {
    fn default() -> Self {
        TextFormatter {
            force_quote: false,
            disable_quote: false,
            quote_empty_fields: false,
            sorting: Box::new(default_sort),
            caller_prettyfier: Box::new(default_caller_prettyfier),
        }
    }
}

pub struct TextFormatterBuilder {
    imp: TextFormatter,
}

impl TextFormatterBuilder {
    /// Quote every value. Takes precedence over [`disable_quote`](Self::disable_quote).
    pub fn force_quote(mut self, force_quote: bool) -> Self {
        self.imp.force_quote = force_quote;
        self
    }
    /// Don't quote values merely because they contain special characters.
    pub fn disable_quote(mut self, disable_quote: bool) -> Self {
        self.imp.disable_quote = disable_quote;
        self
    }
    /// Render empty values as `""`.
    pub fn quote_empty_fields(mut self, quote_empty_fields: bool) -> Self {
        self.imp.quote_empty_fields = quote_empty_fields;
        self
    }
    /// Replace the default (lexical, ascending) key ordering.
    pub fn sorting<F>(mut self, sorting: F) -> Self
    where
        F: Fn(&mut [String]) + Send + Sync + 'static,
    {
        self.imp.sorting = Box::new(sorting);
        self
    }
    /// Replace the default call site rendering (the function name, and `file:line`).
    pub fn caller_prettyfier<F>(mut self, prettyfier: F) -> Self
    where
        F: Fn(&Caller) -> (String, String) + Send + Sync + 'static,
    {
        self.imp.caller_prettyfier = Box::new(prettyfier);
        self
    }
    pub fn build(self) -> TextFormatter {
        self.imp
    }
}

impl TextFormatter {
    pub fn builder() -> TextFormatterBuilder {
        TextFormatterBuilder {
            imp: TextFormatter::default(),
        }
    }

    fn needs_quoting(&self, text: &str) -> bool {
        if self.force_quote {
            return true;
        }
        if self.quote_empty_fields && text.is_empty() {
            return true;
        }
        if self.disable_quote {
            return false;
        }
        has_special_character(text)
    }

    fn append_key_value(&self, buf: &mut String, key: &str, value: &str) {
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(key);
        buf.push('=');
        if self.needs_quoting(value) {
            // Errors are swallowed; see `EntryFormatter`.
            let _ = write!(buf, "{:?}", value);
        } else {
            buf.push_str(value);
        }
    }
}

impl EntryFormatter for TextFormatter {
    fn format(&self, entry: &LogEntry) -> Vec<u8> {
        let mut prefix = String::new();
        let mut data: BTreeMap<String, String> = BTreeMap::new();
        for (k, v) in &entry.fields {
            match k.as_str() {
                FIELD_KEY_TIME | FIELD_KEY_LEVEL => (),
                FIELD_KEY_PREFIX => prefix = stringify_value(v),
                _ => {
                    data.insert(k.clone(), stringify_value(v));
                }
            }
        }

        // Call site keys are sorted along with everything else.
        if let Some(caller) = &entry.caller {
            let (func, file) = (self.caller_prettyfier)(caller);
            if !func.is_empty() {
                data.insert(FIELD_KEY_FUNC.to_string(), func);
            }
            if !file.is_empty() {
                data.insert(FIELD_KEY_FILE.to_string(), file);
            }
        }

        let mut keys: Vec<String> = data.keys().cloned().collect();
        (self.sorting)(&mut keys);

        let mut buf = String::new();
        if !prefix.is_empty() {
            let _ = write!(buf, "[{}]", prefix);
        }
        for key in &keys {
            if let Some(value) = data.get(key) {
                self.append_key_value(&mut buf, key, value);
            }
        }
        if !entry.message.is_empty() {
            self.append_key_value(&mut buf, FIELD_KEY_MSG, &entry.message);
        }
        buf.push('\n');
        buf.into_bytes()
    }
}
