//! Configuration hot-reload subsystem.
//!
//! # Data Flow
//! ```text
//! coordinator.rs ticks every poll interval (default 5s)
//!     → detector.rs: mtime advanced?            yes → reload
//!     → every Nth quiet tick: content hash changed? yes → reload
//!     → Loader::load() builds a brand-new config
//!     → store.rs: atomic swap of Arc<Snapshot>
//!     → readers see either the old or the new snapshot, never a mix
//!
//! watcher.rs (optional) and SIGHUP feed the coordinator early triggers.
//! ```
//!
//! # Design Decisions
//! - One coordinator task is the only writer; reloads never overlap
//! - Readers never lock: `ConfigStore::get` loads an `Arc` snapshot
//! - A failed reload is logged and the previous snapshot stays authoritative
//! - Watch bookkeeping is owned by the coordinator task and needs no lock

pub mod coordinator;
pub mod detector;
pub mod store;
pub mod watcher;

pub use coordinator::{ReloadCoordinator, ReloadHandle, ReloadOptions, ReloadTrigger, TickOutcome};
pub use detector::{ChangeDetector, ChangeReason, FileFingerprint};
pub use store::{ConfigStore, Snapshot};

use crate::config::loader::ConfigError;

/// Builds a complete, validated configuration from scratch.
///
/// Implementations must not touch watch bookkeeping; the coordinator owns it.
pub trait Loader: Send + Sync + 'static {
    type Config: Send + Sync + 'static;

    fn load(&self) -> Result<Self::Config, ConfigError>;
}

impl<F, T> Loader for F
where
    F: Fn() -> Result<T, ConfigError> + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    type Config = T;

    fn load(&self) -> Result<T, ConfigError> {
        self()
    }
}
