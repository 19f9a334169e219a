//! Operator-facing transfer log.
//!
//! A run emits an ordered stream of [`LogEvent`]s (one or more per batch plus
//! a summary). Sinks decide where they go; every sink here also forwards to
//! `tracing` so diagnostics and the operator log never disagree.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

/// Severity of an operator log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// One timestamped operator log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub level: LogLevel,
}

impl LogEvent {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
            level,
        }
    }
}

/// Destination for operator log events.
pub trait LogSink: Send + Sync {
    fn emit(&self, event: LogEvent);

    fn info(&self, message: String) {
        self.emit(LogEvent::new(LogLevel::Info, message));
    }

    fn success(&self, message: String) {
        self.emit(LogEvent::new(LogLevel::Success, message));
    }

    fn warning(&self, message: String) {
        self.emit(LogEvent::new(LogLevel::Warning, message));
    }

    fn error(&self, message: String) {
        self.emit(LogEvent::new(LogLevel::Error, message));
    }
}

fn trace_event(event: &LogEvent) {
    match event.level {
        LogLevel::Info | LogLevel::Success => tracing::info!(kind = %event.level, "{}", event.message),
        LogLevel::Warning => tracing::warn!("{}", event.message),
        LogLevel::Error => tracing::error!("{}", event.message),
    }
}

/// Sends events to `tracing` only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, event: LogEvent) {
        trace_event(&event);
    }
}

/// Keeps every event in order (and traces it) for later reporting.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn into_events(self) -> Vec<LogEvent> {
        self.events.into_inner().unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl LogSink for MemorySink {
    fn emit(&self, event: LogEvent) {
        trace_event(&event);
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Render events as a plain-text log file, one `[timestamp] LEVEL: message` per line.
pub fn render_log_file(events: &[LogEvent]) -> String {
    events
        .iter()
        .map(|e| {
            format!(
                "[{}] {}: {}",
                e.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                e.level.to_string().to_uppercase(),
                e.message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Suggested file name for a log export on the given day.
pub fn log_file_name(now: DateTime<Utc>) -> String {
    format!("disperse-logs-{}.txt", now.format("%Y-%m-%d"))
}
