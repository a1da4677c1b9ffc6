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

//! Test writing text-formatted entries to the systemd journal on the local host.

use tracing::{error, info, warn};
use tracing_journalhook::{
    entry::Level, formatter::TextFormatter, hook::JournalHook, layer::Layer,
    transport::JournalSocket,
};
use tracing_subscriber::{
    layer::SubscriberExt, // Needed to get `with()`
    registry::Registry,
};

pub fn main() {
    let hook = JournalHook::builder(JournalSocket::try_default().unwrap())
        .levels([Level::Error, Level::Warn, Level::Info])
        .formatter(TextFormatter::builder().quote_empty_fields(true).build())
        .syslog_identifier("journal-text-test")
        .with_caller_fields(true)
        .build()
        .unwrap();
    let handle = hook.shutdown_handle();
    let subscriber = Registry::default().with(Layer::new(hook));
    tracing::subscriber::set_global_default(subscriber).unwrap();

    info!(prefix = "main", empty = "", "你好, journal.");
    warn!(path = "/tmp/some file", "你好, journal.");
    error!(error = "disk full");

    handle.exit(0);
}
