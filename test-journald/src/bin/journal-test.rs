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

//! Test writing to the systemd journal on the local host.
//!
//! Check the results with `journalctl -o verbose SYSLOG_IDENTIFIER=journal-test`.

use tracing::{debug, error, info, trace, warn};
use tracing_journalhook::{hook::JournalHook, layer::Layer, transport::JournalSocket};
use tracing_subscriber::{
    layer::SubscriberExt, // Needed to get `with()`
    registry::Registry,
};

pub fn main() {
    let hook = match JournalSocket::try_default().and_then(|transpo| {
        JournalHook::builder(transpo)
            .syslog_identifier("journal-test")
            .build()
    }) {
        Ok(hook) => hook,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };
    let handle = hook.shutdown_handle();
    let subscriber = Registry::default().with(Layer::new(hook));
    tracing::subscriber::set_global_default(subscriber).unwrap();

    trace!("你好, journal.");
    debug!("你好, journal.");
    info!(
        executable = std::env::args().next().unwrap_or_default(),
        n_threads = 1u64,
        "你好, journal."
    );
    warn!(test_id = "42", "你好, journal.");
    error!(error = "no message, so this becomes MESSAGE");

    // Close the journal connection before exiting so nothing is lost
    handle.exit(0);
}
