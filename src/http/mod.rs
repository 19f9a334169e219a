//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, body limit, trace span)
//!     → request.rs (request ID set and echoed)
//!     → handlers.rs (validate body, get or reconnect the session,
//!                    take run lock, run transfer)
//!     → JSON result with the run's log events
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{build_router, connector, AppState, Connector, HttpServer};
