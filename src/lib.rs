//! Hot-reloadable kiosk configuration library

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod reload;

pub use config::{Config, FileLoader};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use reload::{ConfigStore, Loader, ReloadCoordinator, Snapshot};
