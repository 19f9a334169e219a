//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Transfer run produces:
//!     → events.rs (operator log: ordered LogEvents into a LogSink)
//!     → logging.rs (structured tracing output)
//!     → metrics.rs (batch/transfer counters, latency histogram)
//!
//! Consumers:
//!     → CLI summary and log-file export
//!     → HTTP API response body
//!     → Prometheus scrape (optional)
//! ```

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{LogEvent, LogLevel, LogSink, MemorySink, TracingSink};
