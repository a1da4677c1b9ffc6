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

//! [tracing-journalhook](crate) [`Layer`] implementation.
//!
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//!
//! [`Layer`] plugs a [`JournalHook`] into a [`tracing-subscriber`] stack: each [`Event`] at one of
//! the hook's [levels](JournalHook::levels) is captured as a [`LogEntry`](crate::entry::LogEntry)
//! & fired. Failures are handed to an error handler; the default reports them through [`tracing`]
//! itself. Events raised on a thread while the layer is firing on it are ignored by the layer.
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html

use crate::{
    entry::Level,
    error::{Error, Result},
    hook::{JournalHook, ShutdownHandle},
    tracing::entry_from_event,
    transport::Transport,
};

#[cfg(target_os = "linux")]
use crate::transport::JournalSocket;

use tracing::Event;
use tracing_subscriber::layer::Context;

// When the tracing-log feature is enabled, use NormalizeEvent to extract file/line metadata
// from events that originated from the `log` crate. This follows the same pattern used by
// tracing-subscriber's fmt layer.
// See: https://github.com/tokio-rs/tracing/blob/master/tracing-subscriber/src/fmt/fmt_layer.rs
#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;

use std::cell::Cell;

thread_local! {
    static FIRING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as firing until dropped
struct FiringGuard;

impl FiringGuard {
    /// `None` if this thread is already firing
    fn enter() -> Option<FiringGuard> {
        if FIRING.with(|f| f.replace(true)) {
            None
        } else {
            Some(FiringGuard)
        }
    }
}

impl Drop for FiringGuard {
    fn drop(&mut self) {
        FIRING.with(|f| f.set(false));
    }
}

type ErrorHandler = Box<dyn Fn(Error) + Send + Sync>;

fn default_error_handler(err: Error) {
    ::tracing::error!("tracing-journalhook failed to send an event: {}", err);
}

/// A [`tracing-subscriber`]-compliant [`Layer`] implementation that will send [`Event`]s to the
/// systemd journal.
///
/// [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
/// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
pub struct Layer<S, T: Transport>
where
    S: tracing::Subscriber,
{
    hook: JournalHook<T>,
    on_error: ErrorHandler,
    // 👇 gets the compiler to shut-up about unused type parameters.
    subscriber_type: std::marker::PhantomData<fn(S)>,
}

/// A [`Layer`] that sends every event to the systemd journal at its usual location.
#[cfg(target_os = "linux")]
impl<S> Layer<S, JournalSocket>
where
    S: tracing::Subscriber,
{
    /// Attempt to construct a [`Layer`]; fails with [`Error::DaemonUnavailable`] if there's no
    /// journal on this host.
    pub fn try_default() -> Result<Self> {
        Ok(Layer::new(JournalHook::try_default()?))
    }
}

impl<S, T: Transport> Layer<S, T>
where
    S: tracing::Subscriber,
{
    /// Construct a [`Layer`] around an existing hook
    pub fn new(hook: JournalHook<T>) -> Self {
        Layer {
            hook,
            on_error: Box::new(default_error_handler),
            subscriber_type: std::marker::PhantomData,
        }
    }
    /// Construct a [`Layer`] around a new [`JournalHook`] on `transport`, firing for all levels
    pub fn with_transport(transport: T) -> Result<Self> {
        Ok(Layer::new(JournalHook::with_transport(transport)?))
    }
    /// Replace the default error handler (which reports via [`tracing::error!`])
    pub fn on_error<F: Fn(Error) + Send + Sync + 'static>(mut self, handler: F) -> Self {
        self.on_error = Box::new(handler);
        self
    }
    pub fn hook(&self) -> &JournalHook<T> {
        &self.hook
    }
    pub fn shutdown_handle(&self) -> ShutdownHandle
    where
        T: 'static,
    {
        self.hook.shutdown_handle()
    }
}

/// This is the Big Tuna-- the [`Layer`] implementation.
///
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
impl<S, T> tracing_subscriber::layer::Layer<S> for Layer<S, T>
where
    S: tracing::Subscriber,
    T: Transport + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // When the tracing-log feature is enabled, use normalized_metadata() to get
        // file/line info for events that originated from the `log` crate.
        // For native tracing events, normalized_metadata() returns None and we use
        // the event's own metadata.
        #[cfg(feature = "tracing-log")]
        let normalized_meta = event.normalized_metadata();
        #[cfg(feature = "tracing-log")]
        let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
        #[cfg(not(feature = "tracing-log"))]
        let meta = event.metadata();

        if !self.hook.fires_for(Level::from(meta.level())) {
            return;
        }

        // The handler runs under the guard, too: anything it logs reaches the other layers in the
        // stack, but not the journal.
        let _guard = match FiringGuard::enter() {
            Some(guard) => guard,
            None => return,
        };
        if let Err(err) = self.hook.fire(&entry_from_event(event, meta)) {
            (self.on_error)(err)
        }
    }
}

#[cfg(test)]
mod smoke {

    use super::*;

    use crate::{
        entry::Level,
        hook::test::Recorder,
        priority::Priority,
    };

    use std::sync::{Arc, Mutex};
    use tracing::{debug, error, info, trace, warn};
    use tracing_subscriber::{
        layer::SubscriberExt, // Needed to get `with()`
        registry::Registry,
    };

    #[test]
    fn events_reach_the_transport() {
        let recorder = Recorder::new();
        let layer = Layer::with_transport(recorder.clone()).unwrap();
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            trace!("Hello, 世界!");
            debug!("Hello, 世界!");
            info!(test_id = "42", "Hello, 世界!");
            warn!("Hello, 世界!");
            error!(error = "disk full");
        });

        let sent = recorder.sent();
        assert_eq!(sent.len(), 5);
        let priorities: Vec<Priority> = sent.iter().map(|s| s.priority).collect();
        assert_eq!(
            priorities,
            vec![
                Priority::Debug,
                Priority::Debug,
                Priority::Info,
                Priority::Warning,
                Priority::Error
            ]
        );
        assert_eq!(sent[2].message, "Hello, 世界!");
        assert_eq!(
            sent[2].fields,
            vec![("TEST_ID".to_string(), "42".to_string())]
        );
        assert_eq!(sent[4].message, "disk full");
        assert!(sent[4].fields.is_empty());
    }

    #[test]
    fn levels_filter_events() {
        let recorder = Recorder::new();
        let hook = JournalHook::builder(recorder.clone())
            .levels([Level::Warn, Level::Error])
            .build()
            .unwrap();
        let subscriber = Registry::default().with(Layer::new(hook));

        tracing::subscriber::with_default(subscriber, || {
            debug!("dropped");
            info!("dropped");
            warn!("kept");
            error!("kept");
        });

        let sent = recorder.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|s| s.message == "kept"));
    }

    #[test]
    fn errors_go_to_the_handler() {
        let recorder = Recorder::new();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let errs = errors.clone();
        let layer = Layer::with_transport(recorder.clone())
            .unwrap()
            .on_error(move |err| errs.lock().unwrap().push(err.to_string()));
        let handle = layer.shutdown_handle();
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            info!("delivered");
            handle.shutdown().unwrap();
            info!("too late");
        });

        assert_eq!(recorder.sent().len(), 1);
        assert_eq!(
            *errors.lock().unwrap(),
            vec!["The journal connection has already been closed".to_string()]
        );
    }

    #[test]
    fn default_handler_does_not_loop() {
        let recorder = Recorder::new();
        recorder.state.lock().unwrap().fail = true;
        let subscriber =
            Registry::default().with(Layer::with_transport(recorder.clone()).unwrap());

        // The failure is reported via `tracing::error!`, which lands back in `on_event` while
        // the guard is held & so is ignored.
        tracing::subscriber::with_default(subscriber, || {
            info!("nobody home");
        });
        assert!(recorder.sent().is_empty());
    }
}
