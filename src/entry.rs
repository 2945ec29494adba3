//! Timestamped records flowing from sources to the sink.

use std::fmt;

use crate::timestamp::Timestamp;

/// Immutable record produced by a source: an instant plus an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry<P> {
    ts: Timestamp,
    payload: P,
}

impl<P> Entry<P> {
    /// Build an entry stamped at `ts`.
    pub fn new(ts: Timestamp, payload: P) -> Self {
        Self { ts, payload }
    }

    /// Build an entry stamped `millis` milliseconds after the Unix epoch.
    pub fn at(millis: u64, payload: P) -> Self {
        Self::new(Timestamp::from_unix_millis(millis), payload)
    }

    /// Instant used as the merge key.
    #[inline]
    pub fn ts(&self) -> Timestamp {
        self.ts
    }

    /// Borrow the payload.
    #[inline]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Split into timestamp and payload.
    pub fn into_parts(self) -> (Timestamp, P) {
        (self.ts, self.payload)
    }

    /// Transform the payload, keeping the timestamp.
    pub fn map<G>(self, f: impl FnOnce(P) -> G) -> Entry<G> {
        Entry {
            ts: self.ts,
            payload: f(self.payload),
        }
    }
}

impl<P> fmt::Display for Entry<P>
where
    P: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ts, self.payload)
    }
}

/// Severity of a [`LogRecord`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Fine-grained diagnostics.
    Debug,
    /// Regular operational messages.
    #[default]
    Info,
    /// Something unexpected that did not stop the producer.
    Warn,
    /// A failure reported by the producer.
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ready-made payload for plain log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogRecord {
    /// Severity reported by the producer.
    pub level: Level,
    /// Free-form message text.
    pub message: String,
}

impl LogRecord {
    /// Build a record at `level`.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// Build an [`Level::Info`] record.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}
