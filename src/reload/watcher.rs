//! Native filesystem events for the watched config file.
//!
//! Events only wake the coordinator early; the detector still decides
//! whether anything changed, so polling semantics are unchanged.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::reload::coordinator::{ReloadHandle, ReloadTrigger};

/// Forwards filesystem activity on one file to the reload coordinator.
pub struct ConfigWatcher {
    path: PathBuf,
    handle: ReloadHandle,
}

impl ConfigWatcher {
    pub fn new(path: &Path, handle: ReloadHandle) -> Self {
        Self {
            path: path.to_path_buf(),
            handle,
        }
    }

    /// Start watching. The returned watcher must be kept alive.
    ///
    /// The parent directory is watched because editors often replace the
    /// file rather than writing it in place.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let file_name = self.path.file_name().map(OsString::from);
        let directory = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let handle = self.handle;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if is_config_change(&event, file_name.as_deref()) {
                        tracing::debug!(kind = ?event.kind, "Config file event");
                        handle.send(ReloadTrigger::FileEvent);
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config file events enabled");
        Ok(watcher)
    }
}

/// Check if an event is a create or modify of the config file.
fn is_config_change(event: &Event, file_name: Option<&std::ffi::OsStr>) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| file_name.is_some() && p.file_name() == file_name)
}
