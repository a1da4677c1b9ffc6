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

//! Primitives for mapping [`tracing`] entities to [`LogEntry`]s.
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//!
//! Every field recorded on an [`Event`] becomes a typed [`Value`], with the exception of the
//! "message" field, which becomes the entry's message. Values [`tracing`] can only show us through
//! their [`Debug`] implementations are recorded as strings.
//!
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
//! [`Debug`]: std::fmt::Debug

use crate::entry::{Caller, Fields, Level, LogEntry, Value};

use chrono::prelude::*;
use tracing_core::field::{Field, Visit};

struct EntryVisitor {
    message: Option<String>,
    fields: Fields,
}

impl EntryVisitor {
    fn record(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for EntryVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            // Regrettably, we have only a `Debug` implementation available to us; but the tracing
            // macros `info!()`, `event!()` & the like all take care to "pre-format" the `mesage`
            // field so that `value` actually refers to a `std::fmt::Arguments` instance, which will
            // print to a debug format without enclosing double-quotes.
            self.message = Some(format!("{:?}", value));
        } else {
            self.record(field, Value::Str(format!("{:?}", value)));
        }
    }
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.record(field, Value::from(value));
        }
    }
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record(field, Value::Int(value));
    }
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record(field, Value::UInt(value));
    }
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record(field, Value::Float(value));
    }
    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record(field, Value::Bool(value));
    }
    fn record_bytes(&mut self, field: &Field, value: &[u8]) {
        self.record(field, Value::Bytes(value.to_vec()));
    }
    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record(field, Value::Str(value.to_string()));
    }
}

/// Capture `event` as a [`LogEntry`], stamped with the current time.
///
/// `metadata` is normally the event's own; it is taken separately so that callers can substitute
/// metadata recovered from a [`log`] record (see [`tracing-log`]).
///
/// [`log`]: https://docs.rs/log
/// [`tracing-log`]: https://docs.rs/tracing-log
pub fn entry_from_event(event: &tracing::Event<'_>, metadata: &tracing::Metadata<'_>) -> LogEntry {
    let mut visitor = EntryVisitor {
        message: None,
        fields: Fields::new(),
    };
    event.record(&mut visitor);

    let caller = metadata.file().map(|file| Caller {
        function: metadata.module_path().map(|m| m.to_string()),
        file: file.to_string(),
        line: metadata.line().unwrap_or(0),
    });

    LogEntry {
        level: Level::from(metadata.level()),
        message: visitor.message.unwrap_or_default(),
        fields: visitor.fields,
        caller,
        timestamp: Some(Utc::now()),
    }
}
