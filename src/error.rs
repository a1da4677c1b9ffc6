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

//! [tracing-journalhook](crate) errors

use backtrace::Backtrace;

/// [tracing-journalhook](crate) error type
///
/// Like its sibling [syslog-tracing], this crate eschews libraries like [thiserror] & [anyhow] in
/// favor of a straightforward enumeration with a few match arms chosen on the basis of what the
/// caller will need to respond.
///
/// [syslog-tracing]: https://github.com/sp1ff/syslog-tracing
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
#[non_exhaustive]
pub enum Error {
    /// The journal daemon is not present on this host; raised at hook construction only
    DaemonUnavailable { back: Backtrace },
    /// Failed to set up the client side of the journal connection
    Connect {
        source: std::io::Error,
        back: Backtrace,
    },
    /// A single entry could not be handed to the daemon
    SendFailed {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// A send was attempted after the connection was shut down
    Closed { back: Backtrace },
}

impl Error {
    /// True for per-entry delivery failures, [`Error::Closed`] included.
    pub fn is_send_failure(&self) -> bool {
        matches!(self, Error::SendFailed { .. } | Error::Closed { .. })
    }
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::DaemonUnavailable { .. } => {
                write!(f, "The systemd journal does not appear to be running on this host")
            }
            Error::Connect { source, .. } => {
                write!(f, "While opening a journal socket, got {}", source)
            }
            Error::SendFailed { source, .. } => {
                write!(f, "While sending an entry to the journal, got {}", source)
            }
            Error::Closed { .. } => write!(f, "The journal connection has already been closed"),
            _ => write!(f, "Other tracing-journalhook error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::DaemonUnavailable { back } => write!(f, "{}\n{:#?}", self, back),
            Error::Connect { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::SendFailed { source: _, back } => write!(f, "{}\n{:#?}", self, back),
            Error::Closed { back } => write!(f, "{}\n{:#?}", self, back),
            err => write!(f, "tracing-journalhook error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    #[allow(unreachable_patterns)]
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connect { source, .. } => Some(source),
            Error::SendFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
