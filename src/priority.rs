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

//! Journal priorities.
//!
//! [`Priority`] replicates the severity levels defined in `<syslog.h>`, which is what the journal's
//! `PRIORITY` field carries.

use crate::entry::Level;

type StdResult<T, E> = std::result::Result<T, E>;

/// The eight severity levels defined by RFC [5424] & the `syslog()` manual [page]. The
/// enumeration values duplicate the constants defined in `<syslog.h>`.
///
/// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
/// [page]: https://man7.org/linux/man-pages/man3/syslog.3.html
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Priority {
    /// system is unusable
    Emergency = 0,
    /// action must be taken immediately
    Alert = 1,
    /// critical conditions
    Critical = 2,
    /// error conditions
    Error = 3,
    /// warning conditions
    Warning = 4,
    /// normal, but significant condition
    Notice = 5,
    /// informational message
    Info = 6,
    /// debug-level message
    Debug = 7,
}

impl Priority {
    /// The value of the journal's `PRIORITY` field: a single decimal digit
    pub fn as_field_value(self) -> &'static str {
        match self {
            Priority::Emergency => "0",
            Priority::Alert => "1",
            Priority::Critical => "2",
            Priority::Error => "3",
            Priority::Warning => "4",
            Priority::Notice => "5",
            Priority::Info => "6",
            Priority::Debug => "7",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Priority::Emergency => "LOG_EMERG",
                Priority::Alert => "LOG_ALERT",
                Priority::Critical => "LOG_CRIT",
                Priority::Error => "LOG_ERR",
                Priority::Warning => "LOG_WARNING",
                Priority::Notice => "LOG_NOTICE",
                Priority::Info => "LOG_INFO",
                Priority::Debug => "LOG_DEBUG",
            }
        )
    }
}

/// Map an entry [`Level`] to a journal [`Priority`].
///
/// Total; levels without a natural counterpart land on [`Priority::Notice`].
pub fn priority_for(level: Level) -> Priority {
    match level {
        Level::Trace | Level::Debug => Priority::Debug,
        Level::Info => Priority::Info,
        Level::Warn => Priority::Warning,
        Level::Error => Priority::Error,
        Level::Fatal => Priority::Critical,
        Level::Panic => Priority::Emergency,
        Level::Other(_) => Priority::Notice,
    }
}
