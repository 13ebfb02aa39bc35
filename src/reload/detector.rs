//! Change detection for the watched config file.
//!
//! # Policy
//! ```text
//! every tick:        stat the file; mtime newer?  → reload, counter = 0
//! otherwise:         counter += 1
//! counter == N:      hash the file; hash differs? → reload
//!                    counter = 0 either way
//! ```
//!
//! # Design Decisions
//! - mtime is the cheap primary signal and always wins
//! - Hashing reads the whole file, so it is rate-limited to every Nth tick
//! - Stat and read failures are logged and count as "no change"

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sha2::{Digest, Sha256};

use crate::observability::metrics;

/// Default number of quiet ticks between content hash checks.
pub const DEFAULT_HASH_CHECK_INTERVAL: u32 = 12;

/// Why a reload was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    /// The file's modification time advanced.
    ModTime,
    /// The file's content hash changed without an mtime change.
    ContentHash,
    /// A reload was explicitly requested (signal or API).
    Requested,
}

impl ChangeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeReason::ModTime => "mtime changed",
            ChangeReason::ContentHash => "hash changed",
            ChangeReason::Requested => "reload requested",
        }
    }
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modification time and SHA-256 digest of a file at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFingerprint {
    pub modified: SystemTime,
    pub hash: String,
}

impl FileFingerprint {
    /// Stat and hash `path`.
    pub fn capture(path: &Path) -> io::Result<Self> {
        Ok(Self {
            modified: modified_time(path)?,
            hash: content_hash(path)?,
        })
    }
}

/// Last modification time reported by the filesystem.
pub fn modified_time(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// Hex-encoded SHA-256 digest of the file contents.
pub fn content_hash(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Bookkeeping owned by the detector.
#[derive(Debug, Clone)]
pub struct WatchState {
    pub last_mod_time: SystemTime,
    pub last_content_hash: String,
    pub ticks_since_hash_check: u32,
}

/// Decides, once per tick, whether the config file warrants a reload.
#[derive(Debug)]
pub struct ChangeDetector {
    path: PathBuf,
    hash_check_interval: u32,
    state: WatchState,
}

impl ChangeDetector {
    /// Create a detector seeded with the file's current fingerprint.
    pub fn new(path: impl Into<PathBuf>, hash_check_interval: u32) -> io::Result<Self> {
        let path = path.into();
        let fingerprint = FileFingerprint::capture(&path)?;
        Ok(Self::from_fingerprint(path, &fingerprint, hash_check_interval))
    }

    /// Create a detector from a fingerprint captured elsewhere.
    pub fn from_fingerprint(
        path: impl Into<PathBuf>,
        fingerprint: &FileFingerprint,
        hash_check_interval: u32,
    ) -> Self {
        Self {
            path: path.into(),
            hash_check_interval: hash_check_interval.max(1),
            state: WatchState {
                last_mod_time: fingerprint.modified,
                last_content_hash: fingerprint.hash.clone(),
                ticks_since_hash_check: 0,
            },
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    /// Compare the file's mtime against the last observed one.
    ///
    /// A newer mtime is recorded immediately, so one edit is reported once.
    pub fn check_mod_time(&mut self) -> bool {
        let modified = match modified_time(&self.path) {
            Ok(modified) => modified,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Checking config file");
                return false;
            }
        };

        if modified > self.state.last_mod_time {
            self.state.last_mod_time = modified;
            true
        } else {
            false
        }
    }

    /// Compare the file's content hash against the last accepted one.
    pub fn check_content_hash(&self) -> bool {
        metrics::record_hash_check();
        match content_hash(&self.path) {
            Ok(hash) => hash != self.state.last_content_hash,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Hashing config file");
                false
            }
        }
    }

    /// Run one tick of the detection policy.
    pub fn poll(&mut self) -> Option<ChangeReason> {
        if self.check_mod_time() {
            self.reset_hash_counter();
            return Some(ChangeReason::ModTime);
        }

        self.state.ticks_since_hash_check += 1;
        if self.state.ticks_since_hash_check < self.hash_check_interval {
            return None;
        }

        self.reset_hash_counter();
        self.check_content_hash().then_some(ChangeReason::ContentHash)
    }

    /// Handle a filesystem event: check mtime only, without counting a tick.
    pub fn poll_event(&mut self) -> Option<ChangeReason> {
        if self.check_mod_time() {
            self.reset_hash_counter();
            Some(ChangeReason::ModTime)
        } else {
            None
        }
    }

    /// Restart the count of quiet ticks before the next hash check.
    pub fn reset_hash_counter(&mut self) {
        self.state.ticks_since_hash_check = 0;
    }

    /// Record the fingerprint of a successfully loaded file.
    pub fn record(&mut self, fingerprint: &FileFingerprint) {
        if fingerprint.modified > self.state.last_mod_time {
            self.state.last_mod_time = fingerprint.modified;
        }
        self.state.last_content_hash = fingerprint.hash.clone();
    }
}
