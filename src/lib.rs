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

//! A [`tracing-subscriber`] [`Layer`] implementation for sending [`tracing`] [`Event`]s to the
//! [systemd journal]
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`tracing`]: https://docs.rs/tracing/0.1.35/tracing/index.html
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
//! [systemd journal]: https://www.freedesktop.org/software/systemd/man/systemd-journald.service.html
//!
//! # Introduction
//!
//! Unlike a classic syslog daemon, the journal stores *structured* entries: a `MESSAGE`, a
//! `PRIORITY`, and any number of further `NAME=value` fields. That's a natural fit for
//! [`tracing`] events, which carry named fields of their own. This crate's job is to translate
//! between the two:
//!
//! - event levels become journal [priorities](crate::priority)
//! - field names are [normalized](crate::normalize) into the journal's alphabet (`test-id`
//!   becomes `TEST_ID`)
//! - an event with no message but an `error` field gets the error as its
//!   [message](crate::message), so that `journalctl` shows something useful by default
//! - optionally, the whole event may be [flattened](crate::formatter) to a single
//!   `key=value ... msg=...` line
//!
//! The translation itself lives in [`JournalHook`](crate::hook::JournalHook), which deals in
//! plain [`LogEntry`](crate::entry::LogEntry)s & knows nothing of [`tracing`]; the
//! [`Layer`](crate::layer::Layer) adapts it to a [`tracing-subscriber`] stack. The journal is
//! reached through the [`Transport`](crate::transport::Transport) trait, whose
//! [`JournalSocket`](crate::transport::JournalSocket) implementation speaks the journal's
//! native protocol.
//!
//! # Usage
//!
//! ```no_run
//! # #[cfg(target_os = "linux")]
//! # {
//! use tracing::{error, info};
//! use tracing_journalhook::layer::Layer;
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//!
//! // Fails if there's no journal on this host
//! let layer = Layer::try_default().unwrap();
//! // Hang on to this; it's how we'll close the journal connection at exit
//! let handle = layer.shutdown_handle();
//! let subscriber = Registry::default().with(layer);
//! tracing::subscriber::set_global_default(subscriber).unwrap();
//!
//! info!(test_id = "42", "Hello, world!");
//! error!(error = "disk full"); // MESSAGE=disk full
//!
//! handle.exit(0);
//! # }
//! ```
//!
//! Will produce journal entries that look something like this (with `journalctl -o verbose`):
//!
//! ```text
//!     PRIORITY=6
//!     MESSAGE=Hello, world!
//!     TEST_ID=42
//! ```
//!
//! The levels the hook fires for, the text formatting & the transport are configurable:
//!
//! ```no_run
//! # #[cfg(target_os = "linux")]
//! # {
//! use tracing_journalhook::{
//!     entry::Level,
//!     formatter::TextFormatter,
//!     hook::JournalHook,
//!     layer::Layer,
//!     transport::JournalSocket,
//! };
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt;
//!
//! let hook = JournalHook::builder(JournalSocket::new("/run/systemd/journal/socket").unwrap())
//!     .levels([Level::Error, Level::Warn, Level::Info])
//!     .formatter(TextFormatter::builder().quote_empty_fields(true).build())
//!     .syslog_identifier_from_exe()
//!     .build()
//!     .unwrap();
//! let subscriber = Registry::default().with(Layer::new(hook));
//! # }
//! ```

pub mod entry;
pub mod error;
pub mod formatter;
pub mod hook;
pub mod layer;
pub mod message;
pub mod normalize;
pub mod priority;
pub mod tracing;
pub mod transport;
