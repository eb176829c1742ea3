//! Key-value log records and the sinks that receive them.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::Level;

use crate::context::Context;
use crate::dtx;
use crate::keyer::Keyer;

/// Key under which a context-bound correlation ID is logged.
pub const CORRELATION_ID_KEY: &str = "correlation_id";

/// A single log line: an ordered list of key-value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogEntry {
    fields: Vec<(String, String)>,
}

impl LogEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    /// Value of the last pair with this key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Renders as logfmt: `key=value`, quoting values that contain spaces,
/// quotes, or `=`.
impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let needs_quotes = value.is_empty()
                || value
                    .chars()
                    .any(|c| c.is_whitespace() || c == '"' || c == '=');
            if needs_quotes {
                write!(f, "{}={:?}", key, value)?;
            } else {
                write!(f, "{}={}", key, value)?;
            }
        }
        Ok(())
    }
}

/// Destination for log entries.
///
/// Implementations must be safe to call from concurrent requests and must
/// not panic; a sink that cannot deliver an entry drops it.
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, entry: LogEntry);
}

/// Forwards entries to the installed `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, entry: LogEntry) {
        let method = entry.get("method").unwrap_or_default();
        match level {
            Level::ERROR => tracing::error!(target: "service_mw", method, "{}", entry),
            Level::WARN => tracing::warn!(target: "service_mw", method, "{}", entry),
            Level::INFO => tracing::info!(target: "service_mw", method, "{}", entry),
            Level::DEBUG => tracing::debug!(target: "service_mw", method, "{}", entry),
            _ => tracing::trace!(target: "service_mw", method, "{}", entry),
        }
    }
}

/// Keeps entries in memory. Used to assert on log output in tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(Level, LogEntry)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<(Level, LogEntry)> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for RecordingSink {
    fn log(&self, level: Level, entry: LogEntry) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((level, entry));
    }
}

/// Handle that writes entries to a sink at a fixed level, prefixing each
/// entry with its bound fields.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    level: Level,
    fields: Vec<(String, String)>,
}

impl Logger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            level: Level::INFO,
            fields: Vec::new(),
        }
    }

    pub fn debug(sink: Arc<dyn LogSink>) -> Self {
        Self::new(sink).at(Level::DEBUG)
    }

    pub fn at(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn with_keyer(mut self, keyer: &dyn Keyer) -> Self {
        self.fields.extend(keyer.spread());
        self
    }

    /// Bind request-scoped values carried by `ctx`.
    pub fn with_context(self, ctx: &Context) -> Self {
        match dtx::correlation_id(ctx) {
            Some(id) => self.with(CORRELATION_ID_KEY, id),
            None => self,
        }
    }

    pub fn log<I, K, V>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut entry = LogEntry {
            fields: self.fields.clone(),
        };
        for (key, value) in pairs {
            entry.push(key, value);
        }
        self.sink.log(self.level, entry);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}
