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

//! Log entries, as seen by a [`JournalHook`].
//!
//! [`JournalHook`]: crate::hook::JournalHook
//!
//! A [`LogEntry`] is one discrete log event: a [`Level`], a (possibly empty) message, a set of
//! named [`Value`]s, and optionally the location of the call site & a timestamp. The
//! [`tracing`](crate::tracing) module knows how to produce these from [`tracing`] [`Event`]s, but
//! nothing prevents callers from building them by hand.
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html

use chrono::prelude::*;

use std::collections::BTreeMap;

type StdResult<T, E> = std::result::Result<T, E>;

/// Severity of a [`LogEntry`], ordered from most to least severe.
///
/// The ordinals (0 for [`Level::Panic`] through 6 for [`Level::Trace`]) are those of the host
/// pipeline; anything outside that range is carried as [`Level::Other`] rather than rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    Panic,
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Other(u32),
}

impl Level {
    /// Every named level, most severe first.
    pub const ALL: [Level; 7] = [
        Level::Panic,
        Level::Fatal,
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
        Level::Trace,
    ];
}

impl std::convert::From<u32> for Level {
    fn from(x: u32) -> Self {
        match x {
            0 => Level::Panic,
            1 => Level::Fatal,
            2 => Level::Error,
            3 => Level::Warn,
            4 => Level::Info,
            5 => Level::Debug,
            6 => Level::Trace,
            n => Level::Other(n),
        }
    }
}

impl std::convert::From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        match self {
            Level::Panic => write!(f, "panic"),
            Level::Fatal => write!(f, "fatal"),
            Level::Error => write!(f, "error"),
            Level::Warn => write!(f, "warning"),
            Level::Info => write!(f, "info"),
            Level::Debug => write!(f, "debug"),
            Level::Trace => write!(f, "trace"),
            Level::Other(n) => write!(f, "level({})", n),
        }
    }
}

/// A field value.
///
/// Each variant has exactly one textual rendering (its [`Display`] implementation), which is what
/// ends up in the journal:
///
/// - strings verbatim (never re-quoted)
/// - numbers in their shortest decimal form, booleans as `true`/`false`
/// - byte sequences as a bracketed list of decimal octets, e.g. `[10 222 173]`
/// - maps as `{key=value key=value}`, ordered by key
///
/// [`Display`]: std::fmt::Display
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Map(BTreeMap<String, Value>),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::UInt(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Bytes(bytes) => {
                f.write_str("[")?;
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", b)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl std::convert::From<&str> for Value {
    fn from(x: &str) -> Self {
        Value::Str(x.to_string())
    }
}

impl std::convert::From<String> for Value {
    fn from(x: String) -> Self {
        Value::Str(x)
    }
}

impl std::convert::From<i64> for Value {
    fn from(x: i64) -> Self {
        Value::Int(x)
    }
}

impl std::convert::From<i32> for Value {
    fn from(x: i32) -> Self {
        Value::Int(x as i64)
    }
}

impl std::convert::From<u64> for Value {
    fn from(x: u64) -> Self {
        Value::UInt(x)
    }
}

impl std::convert::From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl std::convert::From<bool> for Value {
    fn from(x: bool) -> Self {
        Value::Bool(x)
    }
}

impl std::convert::From<Vec<u8>> for Value {
    fn from(x: Vec<u8>) -> Self {
        Value::Bytes(x)
    }
}

impl std::convert::From<BTreeMap<String, Value>> for Value {
    fn from(x: BTreeMap<String, Value>) -> Self {
        Value::Map(x)
    }
}

/// Named values attached to a [`LogEntry`]; a key is either present or not (there is no "null").
pub type Fields = BTreeMap<String, Value>;

/// Where a [`LogEntry`] was emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    /// The enclosing function (or, for [`tracing`] events, module path), if known
    ///
    /// [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
    pub function: Option<String>,
    pub file: String,
    pub line: u32,
}

/// One discrete log event.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
    pub fields: Fields,
    pub caller: Option<Caller>,
    /// When the entry was captured. The hook doesn't send this (the journal stamps each entry
    /// with its own `__REALTIME_TIMESTAMP` on receipt); it is carried for callers & custom
    /// [`EntryFormatter`](crate::formatter::EntryFormatter)s.
    pub timestamp: Option<DateTime<Utc>>,
}

impl LogEntry {
    pub fn new<S: Into<String>>(level: Level, message: S) -> LogEntry {
        LogEntry {
            level,
            message: message.into(),
            fields: Fields::new(),
            caller: None,
            timestamp: None,
        }
    }
    pub fn with_field<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
