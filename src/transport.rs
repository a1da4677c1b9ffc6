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

//! The journal transport layer.
//!
//! This module defines the [`Transport`] trait that all implementations must support, as well
//! as [`JournalSocket`], which speaks the journal's [native protocol] over the Unix datagram socket
//! that `systemd-journald` listens on.
//!
//! [native protocol]: https://systemd.io/JOURNAL_NATIVE_PROTOCOL/
//!
//! # Examples
//!
//! To talk to the journal at its usual location:
//!
//! ```rust
//! # #[cfg(target_os = "linux")]
//! # {
//! use tracing_journalhook::transport::{JournalSocket, Transport};
//! let transpo = JournalSocket::try_default().unwrap();
//! // `is_available()` tells us whether there's anyone listening
//! let _ = transpo.is_available();
//! # }
//! ```
//!
//! At some other location:
//!
//! ```rust
//! # #[cfg(target_os = "linux")]
//! # {
//! use tracing_journalhook::transport::{JournalSocket, Transport};
//! let transpo = JournalSocket::new("/i/am/not/there.s").unwrap();
//! assert!(!transpo.is_available()); // no such socket, after all
//! # }
//! ```

use crate::{
    error::{Error, Result},
    priority::Priority,
};

use backtrace::Backtrace;
use bytes::BufMut;

#[cfg(target_os = "linux")]
use std::{
    os::unix::net::UnixDatagram,
    path::{Path, PathBuf},
    sync::RwLock,
};

/// Where `systemd-journald` listens for native protocol datagrams
pub const JOURNALD_SOCKET: &str = "/run/systemd/journal/socket";

/// Field carrying the entry's [`Priority`]; always written by [`encode`]
pub const PRIORITY: &str = "PRIORITY";
/// Field carrying the entry's message; always written by [`encode`]
pub const MESSAGE: &str = "MESSAGE";

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
///
/// Implementations will be shared between threads by the host pipeline, so [`send`] must be safe
/// to call concurrently.
///
/// [`send`]: Transport::send
pub trait Transport: Send + Sync {
    /// Is the daemon on the other end present on this host?
    fn is_available(&self) -> bool;
    /// Deliver a single entry. Field names are expected to have been normalized already;
    /// implementations may drop any their daemon would reject.
    fn send(&self, message: &str, priority: Priority, fields: &[(String, String)]) -> Result<()>;
    /// Release the connection; any subsequent [`send`] shall fail with [`Error::Closed`].
    ///
    /// [`send`]: Transport::send
    fn close(&self) -> Result<()>;
}

/// True if the journal will accept `name` as the name of a (non-trusted) field.
///
/// The journal wants upper case ASCII letters, digits & underscores, at most sixty-four of them,
/// not beginning with a digit, and not beginning with an underscore (those are reserved for
/// fields the journal adds itself).
pub fn is_valid_field_name(name: &str) -> bool {
    match name.as_bytes().first() {
        None => false,
        Some(b) if b.is_ascii_digit() || *b == b'_' => false,
        Some(_) => {
            name.len() <= 64
                && name
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
        }
    }
}

fn put_field(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.put_slice(name.as_bytes());
    if value.contains('\n') {
        // Values with embedded newlines must be sent length-prefixed
        buf.put_u8(b'\n');
        buf.put_u64_le(value.len() as u64);
    } else {
        buf.put_u8(b'=');
    }
    buf.put_slice(value.as_bytes());
    buf.put_u8(b'\n');
}

/// Serialize an entry in the journal's native protocol.
///
/// `PRIORITY` & `MESSAGE` come first, followed by `fields` in order; fields whose names fail
/// [`is_valid_field_name`] are skipped.
pub fn encode(message: &str, priority: Priority, fields: &[(String, String)]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(
        message.len()
            + 32
            + fields
                .iter()
                .map(|(k, v)| k.len() + v.len() + 10)
                .sum::<usize>(),
    );
    put_field(&mut buf, PRIORITY, priority.as_field_value());
    put_field(&mut buf, MESSAGE, message);
    fields
        .iter()
        .filter(|(name, _)| is_valid_field_name(name))
        .for_each(|(name, value)| put_field(&mut buf, name, value));
    buf
}

/// Sending entries to the journal via its Unix datagram socket.
///
/// The socket is unbound & unconnected; each entry is addressed to the journal's path, so a
/// journal restart doesn't strand us.
#[cfg(target_os = "linux")]
pub struct JournalSocket {
    path: PathBuf,
    socket: RwLock<Option<UnixDatagram>>,
}

#[cfg(target_os = "linux")]
impl JournalSocket {
    /// Construct a [`Transport`] implementation that will send to the socket at `path`.
    ///
    /// This will only fail if we can't create a socket of our own; whether anyone is listening
    /// at `path` is a question for [`Transport::is_available`].
    pub fn new<P: AsRef<Path>>(path: P) -> Result<JournalSocket> {
        let sock = UnixDatagram::unbound().map_err(|err| Error::Connect {
            source: err,
            back: Backtrace::new(),
        })?;
        Ok(JournalSocket {
            path: path.as_ref().to_path_buf(),
            socket: RwLock::new(Some(sock)),
        })
    }
    /// Construct a [`Transport`] implementation that will send to `/run/systemd/journal/socket`
    pub fn try_default() -> Result<JournalSocket> {
        JournalSocket::new(JOURNALD_SOCKET)
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(target_os = "linux")]
impl Transport for JournalSocket {
    fn is_available(&self) -> bool {
        self.path.exists()
    }
    fn send(&self, message: &str, priority: Priority, fields: &[(String, String)]) -> Result<()> {
        let buf = encode(message, priority, fields);
        // Poisoning can't leave the `Option` half-written
        let guard = self
            .socket
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.as_ref() {
            Some(sock) => {
                sock.send_to(&buf, &self.path)
                    .map_err(|err| Error::SendFailed {
                        source: Box::new(err),
                        back: Backtrace::new(),
                    })?;
                Ok(())
            }
            None => Err(Error::Closed {
                back: Backtrace::new(),
            }),
        }
    }
    fn close(&self) -> Result<()> {
        // Dropping the socket closes it
        self.socket
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        Ok(())
    }
}
