//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config.toml (first found in ., ./config/, ../)
//!     → loader.rs (parse TOML, overlay KIOSK_* environment)
//!     → validation.rs (normalize, then semantic checks)
//!     → Config (validated, immutable)
//!     → handed to reload::ConfigStore
//!
//! Per request:
//!     overrides.rs applies query parameters to a copy of the snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod overrides;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, EnvSource, FileLoader};
pub use schema::{Config, KioskSettings, WeatherLocation};
