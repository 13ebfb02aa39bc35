//! The background reload loop.
//!
//! # States
//! ```text
//! Idle → CheckingMtime → (CheckingHash | skip) → Reloading → Idle
//! ```
//!
//! # State Transitions
//! ```text
//! Idle → CheckingMtime:          every poll interval
//! CheckingMtime → Reloading:     mtime advanced
//! CheckingMtime → CheckingHash:  mtime unchanged and hash interval elapsed
//! CheckingHash → Reloading:      hash differs, otherwise → Idle
//! Reloading → Idle:              always, whether the load succeeded or not
//! ```
//!
//! The loop exits when the shutdown broadcast fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};

use crate::observability::metrics;
use crate::reload::detector::{
    ChangeDetector, ChangeReason, FileFingerprint, DEFAULT_HASH_CHECK_INTERVAL,
};
use crate::reload::store::ConfigStore;
use crate::reload::Loader;

/// Default time between ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

const TRIGGER_CAPACITY: usize = 8;

/// Timing knobs for the reload loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadOptions {
    pub poll_interval: Duration,
    pub hash_check_interval: u32,
}

impl Default for ReloadOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            hash_check_interval: DEFAULT_HASH_CHECK_INTERVAL,
        }
    }
}

/// Result of one pass through the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No change detected.
    Unchanged,
    /// A new configuration was installed.
    Reloaded(ChangeReason),
    /// A change was detected but the loader failed; the old config remains.
    Failed(ChangeReason),
}

/// Out-of-band requests delivered to the coordinator between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadTrigger {
    /// The filesystem reported activity on the config file.
    FileEvent,
    /// Reload unconditionally.
    Requested,
}

/// Cloneable sender for reload triggers.
#[derive(Debug, Clone)]
pub struct ReloadHandle {
    tx: mpsc::Sender<ReloadTrigger>,
    requested: Arc<AtomicBool>,
}

impl ReloadHandle {
    /// Queue a trigger. Returns false if the coordinator is gone.
    ///
    /// A full queue already wakes the loop, so the trigger is dropped.
    pub fn send(&self, trigger: ReloadTrigger) -> bool {
        match self.tx.try_send(trigger) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Ask for an unconditional reload.
    ///
    /// The request is flagged before queueing, so it runs on the next trigger
    /// or tick even when the queue is full.
    pub fn request_reload(&self) -> bool {
        self.requested.store(true, Ordering::SeqCst);
        self.send(ReloadTrigger::Requested)
    }
}

/// Drives change detection, loading and swapping.
pub struct ReloadCoordinator<L: Loader> {
    loader: L,
    store: Arc<ConfigStore<L::Config>>,
    detector: ChangeDetector,
    poll_interval: Duration,
    triggers_tx: mpsc::Sender<ReloadTrigger>,
    triggers_rx: mpsc::Receiver<ReloadTrigger>,
    requested: Arc<AtomicBool>,
}

impl<L: Loader> ReloadCoordinator<L> {
    pub fn new(
        loader: L,
        store: Arc<ConfigStore<L::Config>>,
        detector: ChangeDetector,
        poll_interval: Duration,
    ) -> Self {
        let (triggers_tx, triggers_rx) = mpsc::channel(TRIGGER_CAPACITY);
        Self {
            loader,
            store,
            detector,
            poll_interval,
            triggers_tx,
            triggers_rx,
            requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for feeding triggers into the running loop.
    pub fn handle(&self) -> ReloadHandle {
        ReloadHandle {
            tx: self.triggers_tx.clone(),
            requested: Arc::clone(&self.requested),
        }
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    /// Run one scheduled tick.
    pub fn tick(&mut self) -> TickOutcome {
        if self.take_request() {
            return self.reload(ChangeReason::Requested);
        }

        match self.detector.poll() {
            Some(reason) => self.reload(reason),
            None => TickOutcome::Unchanged,
        }
    }

    /// React to an out-of-band trigger.
    pub fn handle_trigger(&mut self, trigger: ReloadTrigger) -> TickOutcome {
        if self.take_request() {
            return self.reload(ChangeReason::Requested);
        }

        match trigger {
            ReloadTrigger::FileEvent => match self.detector.poll_event() {
                Some(reason) => self.reload(reason),
                None => TickOutcome::Unchanged,
            },
            ReloadTrigger::Requested => self.reload(ChangeReason::Requested),
        }
    }

    /// Clear and return the pending forced-reload flag.
    fn take_request(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }

    fn reload(&mut self, reason: ChangeReason) -> TickOutcome {
        tracing::info!(
            path = %self.detector.path().display(),
            reason = %reason,
            "Reloading config"
        );

        // Every reload attempt restarts the hash cadence.
        self.detector.reset_hash_counter();

        // Fingerprint before loading so an edit racing the load is seen next tick.
        let fingerprint = match FileFingerprint::capture(self.detector.path()) {
            Ok(fingerprint) => Some(fingerprint),
            Err(e) => {
                tracing::warn!(error = %e, "Could not fingerprint config file");
                None
            }
        };

        let config = match self.loader.load() {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to reload config. Keeping current configuration."
                );
                metrics::record_reload("failure");
                return TickOutcome::Failed(reason);
            }
        };

        if let Some(fingerprint) = &fingerprint {
            self.detector.record(fingerprint);
        }

        let snapshot = self.store.replace(config, fingerprint);
        metrics::record_reload("success");
        metrics::set_generation(snapshot.generation());
        tracing::info!(
            generation = snapshot.generation(),
            reload_timestamp = %snapshot.reload_timestamp(),
            "Configuration reloaded"
        );

        TickOutcome::Reloaded(reason)
    }

    /// Tick until `shutdown` fires.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            path = %self.detector.path().display(),
            interval_secs = self.poll_interval.as_secs_f64(),
            "Config watcher started"
        );

        let mut ticker = time::interval_at(
            time::Instant::now() + self.poll_interval,
            self.poll_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                }
                Some(trigger) = self.triggers_rx.recv() => {
                    self.handle_trigger(trigger);
                }
                _ = shutdown.recv() => {
                    tracing::info!("Config watcher received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
