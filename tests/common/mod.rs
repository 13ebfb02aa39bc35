//! Shared utilities for integration tests.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use kiosk_config::config::{EnvSource, FileLoader};
use tempfile::TempDir;

/// A config file in a temporary directory with an explicitly managed mtime.
pub struct ConfigFile {
    _dir: TempDir,
    pub path: PathBuf,
    mtime: SystemTime,
}

impl ConfigFile {
    pub fn new(content: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mtime = SystemTime::now() - Duration::from_secs(3600);
        write_with_mtime(&path, content, mtime);
        Self {
            _dir: dir,
            path,
            mtime,
        }
    }

    /// Rewrite the file and advance its mtime.
    pub fn edit(&mut self, content: &str) {
        self.mtime += Duration::from_secs(10);
        write_with_mtime(&self.path, content, self.mtime);
    }

    /// Rewrite the file but keep the previous mtime.
    pub fn edit_keep_mtime(&self, content: &str) {
        write_with_mtime(&self.path, content, self.mtime);
    }

    pub fn remove(&self) {
        fs::remove_file(&self.path).unwrap();
    }

    /// Loader reading this file with an empty environment.
    pub fn loader(&self) -> FileLoader {
        FileLoader::new(Some(self.path.clone())).with_env(EnvSource::Fixed(Default::default()))
    }
}

pub fn write_with_mtime(path: &Path, content: &str, mtime: SystemTime) {
    fs::write(path, content).unwrap();
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}

/// A valid config with the given refresh interval.
pub fn kiosk_toml(refresh: u32) -> String {
    format!(
        r#"
immich_url = "photos.local:2283"
immich_api_key = "test-key"
refresh = {refresh}

[kiosk]
watch_config = true
"#
    )
}
