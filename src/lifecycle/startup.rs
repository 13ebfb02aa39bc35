//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate the initial configuration
//! - Seed watch bookkeeping from the loaded file
//! - Start the reload task and optional native file events
//!
//! # Design Decisions
//! - Fail fast: an initial load error is fatal
//! - A watcher that cannot start is logged; the process keeps its config

use std::io;
use std::path::Path;
use std::sync::Arc;

use notify::RecommendedWatcher;
use tokio::task::JoinHandle;

use crate::config::loader::ConfigError;
use crate::lifecycle::Shutdown;
use crate::reload::watcher::ConfigWatcher;
use crate::reload::{
    ChangeDetector, ConfigStore, FileFingerprint, Loader, ReloadCoordinator, ReloadHandle,
    ReloadOptions,
};

/// Load the initial configuration into a new store.
///
/// This is the only load whose failure propagates to the caller.
pub fn load_initial<L: Loader>(
    loader: &L,
    path: Option<&Path>,
) -> Result<Arc<ConfigStore<L::Config>>, ConfigError> {
    let fingerprint = path.and_then(|p| match FileFingerprint::capture(p) {
        Ok(fingerprint) => Some(fingerprint),
        Err(e) => {
            tracing::warn!(path = %p.display(), error = %e, "Getting initial file state");
            None
        }
    });

    let config = loader.load()?;
    Ok(Arc::new(ConfigStore::new(config, fingerprint)))
}

/// A running reload task.
pub struct Watching {
    task: JoinHandle<()>,
    handle: ReloadHandle,
    _events: Option<RecommendedWatcher>,
}

impl Watching {
    /// Handle for requesting reloads.
    pub fn handle(&self) -> ReloadHandle {
        self.handle.clone()
    }

    /// Wait for the reload task to exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Config watcher task failed");
        }
    }
}

/// Spawn the reload coordinator for `path`.
///
/// With `native_events`, filesystem notifications wake the coordinator
/// between ticks.
pub fn spawn_watcher<L: Loader>(
    loader: L,
    store: Arc<ConfigStore<L::Config>>,
    path: &Path,
    options: ReloadOptions,
    native_events: bool,
    shutdown: &Shutdown,
) -> io::Result<Watching> {
    if path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Config file is a directory: {}", path.display()),
        ));
    }

    let detector = match store.get().source() {
        Some(fingerprint) => {
            ChangeDetector::from_fingerprint(path, fingerprint, options.hash_check_interval)
        }
        None => ChangeDetector::new(path, options.hash_check_interval)?,
    };

    let coordinator = ReloadCoordinator::new(loader, store, detector, options.poll_interval);
    let handle = coordinator.handle();

    let events = if native_events {
        match ConfigWatcher::new(path, handle.clone()).run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "File events unavailable, polling only");
                None
            }
        }
    } else {
        None
    };

    let task = tokio::spawn(coordinator.run(shutdown.subscribe()));

    Ok(Watching {
        task,
        handle,
        _events: events,
    })
}
