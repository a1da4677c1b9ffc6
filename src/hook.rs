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

//! The [`JournalHook`]: one [`LogEntry`] in, one journal entry out.
//!
//! # Introduction
//!
//! The translation from a [`LogEntry`] to a journal entry happens in four steps:
//!
//! 1. choosing the message (see [`resolve_message`]); if the entry has none but carries an `error`
//!    field, that error becomes the message
//!
//! 2. optionally flattening the whole entry to a single line of text via an [`EntryFormatter`]; if
//!    one is configured, its output replaces the message
//!
//! 3. mapping the entry's [`Level`] to a journal [`Priority`] & normalizing the remaining field
//!    names to something the journal will accept
//!
//! 4. handing the lot to the [`Transport`] in one blocking call
//!
//! Nothing is retried, buffered or dropped: whatever the [`Transport`] reports is returned from
//! [`JournalHook::fire`], and it is up to the caller to decide what to do about it.
//!
//! # Lifecycle
//!
//! A [`JournalHook`] owns its connection to the journal from construction until
//! [`JournalHook::shutdown`] (or [`ShutdownHandle::shutdown`]) is called, at which point the
//! connection is closed; exactly once, no matter how many times shutdown is requested. Entries
//! fired after that fail with [`Error::Closed`]. Since the hook itself usually disappears into a
//! [`Layer`](crate::layer::Layer), grab a [`ShutdownHandle`] first & hand it to whatever manages
//! the process' lifecycle:
//!
//! ```no_run
//! # #[cfg(target_os = "linux")]
//! # {
//! use tracing_journalhook::hook::JournalHook;
//!
//! let hook = JournalHook::try_default().unwrap();
//! let handle = hook.shutdown_handle();
//! // ... install the hook, run the application ...
//! handle.exit(0);
//! # }
//! ```

use crate::{
    entry::{Level, LogEntry},
    error::{Error, Result},
    formatter::EntryFormatter,
    message::resolve_message,
    normalize::normalize_fields,
    priority::{priority_for, Priority},
    transport::{Transport, MESSAGE, PRIORITY},
};

#[cfg(target_os = "linux")]
use crate::transport::JournalSocket;

use backtrace::Backtrace;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         the connection                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

struct Connection<T: Transport> {
    transport: T,
    closed: AtomicBool,
}

impl<T: Transport> Connection<T> {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Type-erased access to a [`Connection`], so that [`ShutdownHandle`] needn't carry the
/// [`Transport`] type around.
trait Close: Send + Sync {
    fn close_once(&self) -> Result<()>;
}

impl<T: Transport> Close for Connection<T> {
    fn close_once(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.transport.close()
    }
}

/// A cloneable means of shutting down a [`JournalHook`]'s connection from elsewhere.
#[derive(Clone)]
pub struct ShutdownHandle {
    connection: Arc<dyn Close>,
}

impl ShutdownHandle {
    /// Close the journal connection; only the first call (across all handles & the hook itself)
    /// has any effect.
    pub fn shutdown(&self) -> Result<()> {
        self.connection.close_once()
    }
    /// Close the journal connection & exit the process with `code`.
    pub fn exit(self, code: i32) -> ! {
        if let Err(err) = self.shutdown() {
            ::tracing::error!("While closing the journal connection, got {}", err);
        }
        std::process::exit(code)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        struct JournalHook                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Field carrying the application's name
pub const SYSLOG_IDENTIFIER: &str = "SYSLOG_IDENTIFIER";
/// Fields carrying the call site
pub const CODE_FILE: &str = "CODE_FILE";
pub const CODE_LINE: &str = "CODE_LINE";
pub const CODE_FUNC: &str = "CODE_FUNC";
/// Prepended to entry fields whose names collide with a field the hook writes itself
pub const USER_FIELD_PREFIX: &str = "USER_";

/// Forwards [`LogEntry`]s to the systemd journal (or anything else implementing [`Transport`]).
pub struct JournalHook<T: Transport> {
    connection: Arc<Connection<T>>,
    levels: Vec<Level>,
    formatter: Option<Box<dyn EntryFormatter>>,
    syslog_identifier: Option<String>,
    caller_fields: bool,
}

pub struct JournalHookBuilder<T: Transport> {
    transport: T,
    levels: Vec<Level>,
    formatter: Option<Box<dyn EntryFormatter>>,
    syslog_identifier: Option<String>,
    caller_fields: bool,
}

impl<T: Transport> JournalHookBuilder<T> {
    /// The levels for which the hook should be fired (all of them, by default).
    pub fn levels<I: IntoIterator<Item = Level>>(mut self, levels: I) -> Self {
        self.levels = levels.into_iter().collect();
        self
    }
    /// Send each entry flattened to a single line by `formatter`, rather than just its message.
    pub fn formatter<F: EntryFormatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }
    /// Attach `SYSLOG_IDENTIFIER=identifier` to every entry.
    pub fn syslog_identifier<S: Into<String>>(mut self, identifier: S) -> Self {
        self.syslog_identifier = Some(identifier.into());
        self
    }
    /// Attach `SYSLOG_IDENTIFIER` naming the current executable (if it can be determined).
    pub fn syslog_identifier_from_exe(mut self) -> Self {
        self.syslog_identifier = std::env::current_exe().ok().and_then(|pbuf| {
            pbuf.file_name()
                .map(|os_str| os_str.to_string_lossy().into_owned())
        });
        self
    }
    /// Attach `CODE_FILE`, `CODE_LINE` & `CODE_FUNC` to entries that know their call site.
    pub fn with_caller_fields(mut self, caller_fields: bool) -> Self {
        self.caller_fields = caller_fields;
        self
    }
    /// Fails with [`Error::DaemonUnavailable`] if there is no journal to talk to.
    pub fn build(self) -> Result<JournalHook<T>> {
        if !self.transport.is_available() {
            return Err(Error::DaemonUnavailable {
                back: Backtrace::new(),
            });
        }
        Ok(JournalHook {
            connection: Arc::new(Connection {
                transport: self.transport,
                closed: AtomicBool::new(false),
            }),
            levels: self.levels,
            formatter: self.formatter,
            syslog_identifier: self.syslog_identifier,
            caller_fields: self.caller_fields,
        })
    }
}

#[cfg(target_os = "linux")]
impl JournalHook<JournalSocket> {
    /// Attempt to construct a [`JournalHook`] that will send every entry, whatever its level, to
    /// the systemd journal at its usual location.
    pub fn try_default() -> Result<Self> {
        JournalHook::builder(JournalSocket::try_default()?).build()
    }
    /// Attempt to construct a [`JournalHook`] that will send entries at `levels` to the systemd
    /// journal at its usual location.
    pub fn with_levels<I: IntoIterator<Item = Level>>(levels: I) -> Result<Self> {
        JournalHook::builder(JournalSocket::try_default()?)
            .levels(levels)
            .build()
    }
}

impl<T: Transport> JournalHook<T> {
    pub fn builder(transport: T) -> JournalHookBuilder<T> {
        JournalHookBuilder {
            transport,
            levels: Level::ALL.to_vec(),
            formatter: None,
            syslog_identifier: None,
            caller_fields: false,
        }
    }
    /// Attempt to construct a [`JournalHook`] on `transport` firing for all levels.
    pub fn with_transport(transport: T) -> Result<Self> {
        JournalHook::builder(transport).build()
    }
    /// The levels for which this hook wants to be fired.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }
    /// Convenience: is `level` among [`levels`](Self::levels)?
    pub fn fires_for(&self, level: Level) -> bool {
        self.levels.contains(&level)
    }
    /// Send `entry` to the journal.
    ///
    /// `entry` is not modified: when the `error` field is promoted to the message, it is removed
    /// from a copy of the fields, not from `entry`. Returns whatever the [`Transport`] reports, or
    /// [`Error::Closed`] if the hook has been shut down.
    ///
    /// Entry fields that normalize to `PRIORITY` or `MESSAGE` (or to `SYSLOG_IDENTIFIER` &
    /// `CODE_*` when the hook is configured to write those) are sent under [`USER_FIELD_PREFIX`]
    /// instead, so a field named `priority` is delivered as `USER_PRIORITY` & the journal
    /// priority always follows the entry's level.
    pub fn fire(&self, entry: &LogEntry) -> Result<()> {
        if self.connection.is_closed() {
            return Err(Error::Closed {
                back: Backtrace::new(),
            });
        }

        let (message, fields) = resolve_message(entry);
        let resolved = LogEntry {
            level: entry.level,
            message,
            fields,
            caller: entry.caller.clone(),
            timestamp: entry.timestamp,
        };

        let message = match &self.formatter {
            Some(fmtr) => String::from_utf8_lossy(&fmtr.format(&resolved)).into_owned(),
            None => resolved.message,
        };

        let mut fields: Vec<(String, String)> = normalize_fields(&resolved.fields)
            .into_iter()
            .map(|(key, value)| {
                if self.writes_field(&key) {
                    (format!("{}{}", USER_FIELD_PREFIX, key), value)
                } else {
                    (key, value)
                }
            })
            .collect();
        if self.caller_fields {
            if let Some(caller) = &resolved.caller {
                fields.push((CODE_FILE.to_string(), caller.file.clone()));
                fields.push((CODE_LINE.to_string(), caller.line.to_string()));
                if let Some(function) = &caller.function {
                    fields.push((CODE_FUNC.to_string(), function.clone()));
                }
            }
        }
        if let Some(identifier) = &self.syslog_identifier {
            fields.push((SYSLOG_IDENTIFIER.to_string(), identifier.clone()));
        }

        self.connection
            .transport
            .send(&message, self.priority(entry), &fields)
    }
    /// True if `key` names a field this hook writes on its own account
    fn writes_field(&self, key: &str) -> bool {
        match key {
            PRIORITY | MESSAGE => true,
            SYSLOG_IDENTIFIER => self.syslog_identifier.is_some(),
            CODE_FILE | CODE_LINE | CODE_FUNC => self.caller_fields,
            _ => false,
        }
    }
    /// The journal [`Priority`] `entry` will be sent at
    pub fn priority(&self, entry: &LogEntry) -> Priority {
        priority_for(entry.level)
    }
    /// Close the journal connection; see [`ShutdownHandle::shutdown`].
    pub fn shutdown(&self) -> Result<()> {
        self.connection.close_once()
    }
    pub fn shutdown_handle(&self) -> ShutdownHandle
    where
        T: 'static,
    {
        ShutdownHandle {
            connection: self.connection.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    use crate::{
        entry::{Caller, Value},
        formatter::TextFormatter,
    };

    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq)]
    pub(crate) struct Sent {
        pub message: String,
        pub priority: Priority,
        pub fields: Vec<(String, String)>,
    }

    #[derive(Default)]
    pub(crate) struct State {
        pub sent: Vec<Sent>,
        pub closes: usize,
        pub closed: bool,
        pub fail: bool,
    }

    /// A [`Transport`] that just remembers what it was asked to do
    #[derive(Clone)]
    pub(crate) struct Recorder {
        pub available: bool,
        pub state: Arc<Mutex<State>>,
    }

    impl Recorder {
        pub fn new() -> Recorder {
            Recorder {
                available: true,
                state: Arc::new(Mutex::new(State::default())),
            }
        }
        pub fn sent(&self) -> Vec<Sent> {
            self.state.lock().unwrap().sent.clone()
        }
    }

    impl Transport for Recorder {
        fn is_available(&self) -> bool {
            self.available
        }
        fn send(
            &self,
            message: &str,
            priority: Priority,
            fields: &[(String, String)],
        ) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.closed {
                return Err(Error::Closed {
                    back: Backtrace::new(),
                });
            }
            if state.fail {
                return Err(Error::SendFailed {
                    source: Box::new(std::io::Error::from(std::io::ErrorKind::WouldBlock)),
                    back: Backtrace::new(),
                });
            }
            state.sent.push(Sent {
                message: message.to_string(),
                priority,
                fields: fields.to_vec(),
            });
            Ok(())
        }
        fn close(&self) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            state.closes += 1;
            state.closed = true;
            Ok(())
        }
    }

    fn pairs(x: &[(&str, &str)]) -> Vec<(String, String)> {
        x.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn error_becomes_message() {
        let recorder = Recorder::new();
        let hook = JournalHook::with_transport(recorder.clone()).unwrap();

        let entry = LogEntry::new(Level::Error, "")
            .with_field("error", "disk full")
            .with_field("test_id", "42");
        hook.fire(&entry).unwrap();

        assert_eq!(
            recorder.sent(),
            vec![Sent {
                message: "disk full".to_string(),
                priority: Priority::Error,
                fields: pairs(&[("TEST_ID", "42")]),
            }]
        );
        // The caller's entry still has its error
        assert_eq!(entry.fields["error"], Value::from("disk full"));
    }

    #[test]
    fn message_and_error() {
        let recorder = Recorder::new();
        let hook = JournalHook::with_transport(recorder.clone()).unwrap();
        hook.fire(
            &LogEntry::new(Level::Error, "are we there yet")
                .with_field("error", "something something dark side"),
        )
        .unwrap();
        let sent = recorder.sent();
        assert_eq!(sent[0].message, "are we there yet");
        assert_eq!(
            sent[0].fields,
            pairs(&[("ERROR", "something something dark side")])
        );
    }

    #[test]
    fn reserved_fields_are_renamed() {
        let recorder = Recorder::new();
        let hook = JournalHook::with_transport(recorder.clone()).unwrap();
        hook.fire(
            &LogEntry::new(Level::Debug, "routine")
                .with_field("priority", "0")
                .with_field("message", "spoofed"),
        )
        .unwrap();
        let sent = recorder.sent();
        assert_eq!(sent[0].priority, Priority::Debug);
        assert_eq!(sent[0].message, "routine");
        assert_eq!(
            sent[0].fields,
            pairs(&[("USER_MESSAGE", "spoofed"), ("USER_PRIORITY", "0")])
        );
        assert_eq!(
            crate::transport::encode(&sent[0].message, sent[0].priority, &sent[0].fields),
            b"PRIORITY=7\nMESSAGE=routine\nUSER_MESSAGE=spoofed\nUSER_PRIORITY=0\n".to_vec()
        );

        // Left alone unless the hook writes them itself...
        let recorder = Recorder::new();
        let hook = JournalHook::with_transport(recorder.clone()).unwrap();
        hook.fire(
            &LogEntry::new(Level::Info, "hi")
                .with_field("syslog_identifier", "me")
                .with_field("code_line", 3i64),
        )
        .unwrap();
        assert_eq!(
            recorder.sent()[0].fields,
            pairs(&[("CODE_LINE", "3"), ("SYSLOG_IDENTIFIER", "me")])
        );

        // ...but renamed when it does
        let recorder = Recorder::new();
        let hook = JournalHook::builder(recorder.clone())
            .syslog_identifier("journalhook")
            .with_caller_fields(true)
            .build()
            .unwrap();
        hook.fire(
            &LogEntry::new(Level::Info, "hi")
                .with_field("syslog_identifier", "me")
                .with_field("code_line", 3i64)
                .with_caller(Caller {
                    function: None,
                    file: "main.rs".to_string(),
                    line: 12,
                }),
        )
        .unwrap();
        assert_eq!(
            recorder.sent()[0].fields,
            pairs(&[
                ("USER_CODE_LINE", "3"),
                ("USER_SYSLOG_IDENTIFIER", "me"),
                ("CODE_FILE", "main.rs"),
                ("CODE_LINE", "12"),
                ("SYSLOG_IDENTIFIER", "journalhook"),
            ])
        );
    }

    #[test]
    fn timestamp_is_not_sent() {
        let recorder = Recorder::new();
        let hook = JournalHook::with_transport(recorder.clone()).unwrap();
        let entry = LogEntry::new(Level::Info, "stamped")
            .with_timestamp(chrono::Utc::now())
            .with_field("k", "v");
        hook.fire(&entry).unwrap();
        assert_eq!(recorder.sent()[0].fields, pairs(&[("K", "v")]));
    }

    #[test]
    fn no_daemon() {
        let mut recorder = Recorder::new();
        recorder.available = false;
        assert!(matches!(
            JournalHook::with_transport(recorder.clone()),
            Err(Error::DaemonUnavailable { .. })
        ));
        assert!(recorder.sent().is_empty());
    }

    #[test]
    fn levels() {
        let hook = JournalHook::with_transport(Recorder::new()).unwrap();
        assert_eq!(hook.levels(), &Level::ALL[..]);

        let hook = JournalHook::builder(Recorder::new())
            .levels([Level::Error, Level::Fatal, Level::Panic])
            .build()
            .unwrap();
        assert!(hook.fires_for(Level::Error));
        assert!(!hook.fires_for(Level::Info));
        assert_eq!(hook.levels().len(), 3);
    }

    #[test]
    fn structured_values() {
        let recorder = Recorder::new();
        let hook = JournalHook::with_transport(recorder.clone()).unwrap();
        hook.fire(
            &LogEntry::new(Level::Info, "SmallMessage")
                .with_field("bytes", vec![b'\n', 0xde, 0xad, 0xbe, 0xef])
                .with_field("n_goroutine", 7i64)
                .with_field("ratio", 0.5),
        )
        .unwrap();
        let sent = recorder.sent();
        assert_eq!(sent[0].priority, Priority::Info);
        assert_eq!(
            sent[0].fields,
            pairs(&[
                ("BYTES", "[10 222 173 190 239]"),
                ("N_GOROUTINE", "7"),
                ("RATIO", "0.5")
            ])
        );
    }

    #[test]
    fn with_formatter() {
        let recorder = Recorder::new();
        let hook = JournalHook::builder(recorder.clone())
            .formatter(TextFormatter::default())
            .build()
            .unwrap();
        hook.fire(
            &LogEntry::new(Level::Warn, "")
                .with_field("error", "disk full")
                .with_field("prefix", "storage")
                .with_field("test_id", "42"),
        )
        .unwrap();
        let sent = recorder.sent();
        assert_eq!(
            sent[0].message,
            "[storage] test_id=42 msg=\"disk full\"\n"
        );
        assert_eq!(sent[0].priority, Priority::Warning);
        assert_eq!(
            sent[0].fields,
            pairs(&[("PREFIX", "storage"), ("TEST_ID", "42")])
        );
    }

    #[test]
    fn identifier_and_caller() {
        let recorder = Recorder::new();
        let hook = JournalHook::builder(recorder.clone())
            .syslog_identifier("unit-tests")
            .with_caller_fields(true)
            .build()
            .unwrap();
        hook.fire(&LogEntry::new(Level::Other(17), "where am I").with_caller(Caller {
            function: Some("hook::test".to_string()),
            file: "src/hook.rs".to_string(),
            line: 99,
        }))
        .unwrap();
        let sent = recorder.sent();
        assert_eq!(sent[0].priority, Priority::Notice);
        assert_eq!(
            sent[0].fields,
            pairs(&[
                ("CODE_FILE", "src/hook.rs"),
                ("CODE_LINE", "99"),
                ("CODE_FUNC", "hook::test"),
                ("SYSLOG_IDENTIFIER", "unit-tests")
            ])
        );

        let hook = JournalHook::builder(Recorder::new())
            .syslog_identifier_from_exe()
            .build()
            .unwrap();
        assert!(hook.syslog_identifier.is_some());
    }

    #[test]
    fn send_errors_are_returned() {
        let recorder = Recorder::new();
        let hook = JournalHook::with_transport(recorder.clone()).unwrap();
        recorder.state.lock().unwrap().fail = true;
        let err = hook.fire(&LogEntry::new(Level::Info, "x")).unwrap_err();
        assert!(matches!(err, Error::SendFailed { .. }));
        assert!(recorder.sent().is_empty());
    }

    #[test]
    fn shutdown_once() {
        let recorder = Recorder::new();
        let hook = JournalHook::with_transport(recorder.clone()).unwrap();
        let handle = hook.shutdown_handle();
        let other = handle.clone();

        hook.fire(&LogEntry::new(Level::Info, "before")).unwrap();
        handle.shutdown().unwrap();
        other.shutdown().unwrap();
        hook.shutdown().unwrap();
        assert_eq!(recorder.state.lock().unwrap().closes, 1);

        let err = hook.fire(&LogEntry::new(Level::Info, "after")).unwrap_err();
        assert!(matches!(err, Error::Closed { .. }));
        assert!(err.is_send_failure());
        assert_eq!(recorder.sent().len(), 1);
    }

    #[test]
    fn concurrent_fire() {
        let recorder = Recorder::new();
        let hook = Arc::new(JournalHook::with_transport(recorder.clone()).unwrap());
        let threads: Vec<_> = (0..8)
            .map(|i| {
                let hook = hook.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        hook.fire(
                            &LogEntry::new(Level::Debug, format!("{}-{}", i, j))
                                .with_field("thread", i as i64),
                        )
                        .unwrap();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(recorder.sent().len(), 400);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn through_a_socket() {
        use std::os::unix::net::UnixDatagram;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.socket");
        let journal = UnixDatagram::bind(&path).unwrap();

        let hook = JournalHook::with_transport(JournalSocket::new(&path).unwrap()).unwrap();
        hook.fire(
            &LogEntry::new(Level::Fatal, "")
                .with_field("error", "two\nlines")
                .with_field("test-id", "42"),
        )
        .unwrap();

        let mut buf = [0u8; 1024];
        let n = journal.recv(&mut buf).unwrap();
        let mut golden = b"PRIORITY=2\nMESSAGE\n".to_vec();
        golden.extend_from_slice(&9u64.to_le_bytes());
        golden.extend_from_slice(b"two\nlines\nTEST_ID=42\n");
        assert_eq!(&buf[..n], &golden[..]);

        hook.shutdown().unwrap();
        assert!(hook.fire(&LogEntry::new(Level::Info, "gone")).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn socket_without_journal() {
        let transpo = JournalSocket::new("/i/am/not/there.s").unwrap();
        assert!(matches!(
            JournalHook::with_transport(transpo),
            Err(Error::DaemonUnavailable { .. })
        ));
    }

    #[test]
    #[cfg(all(feature = "journald", target_os = "linux"))]
    fn live_journal() {
        let hook = JournalHook::builder(JournalSocket::try_default().unwrap())
            .syslog_identifier_from_exe()
            .build()
            .unwrap();
        hook.fire(
            &LogEntry::new(Level::Error, "")
                .with_field("error", "something something dark side")
                .with_field("test_id", "hook-live"),
        )
        .unwrap();
        hook.shutdown().unwrap();
    }
}
