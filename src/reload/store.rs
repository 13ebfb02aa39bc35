//! The live configuration and its atomic replacement.

use std::ops::Deref;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use chrono::{DateTime, SecondsFormat, SubsecRound, TimeDelta, Utc};
use tokio::sync::watch;

use crate::reload::detector::FileFingerprint;

/// An immutable configuration plus the metadata of the reload that produced it.
#[derive(Debug)]
pub struct Snapshot<T> {
    config: T,
    reloaded_at: DateTime<Utc>,
    generation: u64,
    source: Option<FileFingerprint>,
}

impl<T> Snapshot<T> {
    pub fn config(&self) -> &T {
        &self.config
    }

    pub fn reloaded_at(&self) -> DateTime<Utc> {
        self.reloaded_at
    }

    /// ISO-8601 reload timestamp, suitable for client cache-busting.
    pub fn reload_timestamp(&self) -> String {
        self.reloaded_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Number of successful replacements before this snapshot (0 = initial load).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fingerprint of the file this snapshot was loaded from.
    pub fn source(&self) -> Option<&FileFingerprint> {
        self.source.as_ref()
    }
}

impl<T> Deref for Snapshot<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.config
    }
}

/// Holds the current configuration snapshot.
///
/// Readers load an `Arc` without locking. `replace` is the only mutator and
/// serializes writers on a single mutex; it installs a wholly new snapshot,
/// so no reader can observe fields from two different loads.
pub struct ConfigStore<T> {
    current: ArcSwap<Snapshot<T>>,
    write_lock: Mutex<()>,
    generation_tx: watch::Sender<u64>,
}

impl<T> ConfigStore<T> {
    /// Create a store holding the initial configuration.
    pub fn new(config: T, source: Option<FileFingerprint>) -> Self {
        let snapshot = Snapshot {
            config,
            reloaded_at: now(),
            generation: 0,
            source,
        };
        let (generation_tx, _) = watch::channel(0);

        Self {
            current: ArcSwap::from_pointee(snapshot),
            write_lock: Mutex::new(()),
            generation_tx,
        }
    }

    /// The current snapshot.
    pub fn get(&self) -> Arc<Snapshot<T>> {
        self.current.load_full()
    }

    /// Install `config` as the current configuration.
    ///
    /// The new snapshot's reload timestamp is strictly later than the previous one.
    pub fn replace(&self, config: T, source: Option<FileFingerprint>) -> Arc<Snapshot<T>> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let previous = self.current.load();
        let mut reloaded_at = now();
        if reloaded_at <= previous.reloaded_at {
            reloaded_at = previous.reloaded_at + TimeDelta::microseconds(1);
        }

        let snapshot = Arc::new(Snapshot {
            config,
            reloaded_at,
            generation: previous.generation + 1,
            source,
        });
        self.current.store(Arc::clone(&snapshot));
        self.generation_tx.send_replace(snapshot.generation);

        snapshot
    }

    /// ISO-8601 timestamp of the last successful swap.
    pub fn reload_timestamp(&self) -> String {
        self.current.load().reload_timestamp()
    }

    /// Receive the generation number after every successful swap.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation_tx.subscribe()
    }
}

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
