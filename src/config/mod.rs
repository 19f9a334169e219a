//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), optional
//!     → loader.rs (parse & deserialize, DISPERSE_SIGNER_URL override)
//!     → validation.rs (semantic checks, all errors at once)
//!     → DisperseConfig (validated, immutable)
//!     → TransferSettings::to_transfer_config → transfer core
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{default_config, load_config, ConfigError};
pub use schema::{DisperseConfig, LogFormat, ObservabilityConfig, ServerConfig, SignerConfig, TransferSettings};
pub use validation::{validate_config, ValidationError};
