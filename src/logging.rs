//! Logging collaborator used by the `context.log` trigger.
//!
//! The core never decides where log lines go. It forwards `(level, message,
//! fields)` to a [`LogSink`]; the surrounding application picks the sink.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity accepted by [`LogSink::log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lenient parse; `warning` is accepted for `warn`. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

/// Destination for log entries forwarded by the orchestrator.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, fields: &Map<String, Value>);
}

/// Render fields as `k=v` pairs in key order.
pub fn render_fields(fields: &Map<String, Value>) -> String {
    fields
        .iter()
        .map(|(k, v)| match v {
            Value::String(s) => format!("{k}={s}"),
            other => format!("{k}={other}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Forwards to the `log` facade under the `ctxmatrix::context` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn log(&self, level: LogLevel, message: &str, fields: &Map<String, Value>) {
        if fields.is_empty() {
            log::log!(target: "ctxmatrix::context", log::Level::from(level), "{}", message);
        } else {
            log::log!(
                target: "ctxmatrix::context",
                log::Level::from(level),
                "{} [{}]",
                message,
                render_fields(fields)
            );
        }
    }
}

/// Forwards to `tracing` with the rendered fields attached as one field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str, fields: &Map<String, Value>) {
        let fields = render_fields(fields);
        match level {
            LogLevel::Trace => tracing::trace!(fields = %fields, "{}", message),
            LogLevel::Debug => tracing::debug!(fields = %fields, "{}", message),
            LogLevel::Info => tracing::info!(fields = %fields, "{}", message),
            LogLevel::Warn => tracing::warn!(fields = %fields, "{}", message),
            LogLevel::Error => tracing::error!(fields = %fields, "{}", message),
        }
    }
}

/// One captured entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub fields: Map<String, Value>,
}

/// Keeps every entry in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: LogLevel, message: &str, fields: &Map<String, Value>) {
        self.entries.lock().push(LogEntry {
            level,
            message: message.to_string(),
            fields: fields.clone(),
        });
    }
}
