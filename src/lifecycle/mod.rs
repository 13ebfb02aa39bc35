//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config path → Initial load (fatal on error) → Store → Spawn watcher
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Watcher and HTTP server exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Trigger config reload
//! ```
//!
//! # Design Decisions
//! - Only the initial load may fail the process; background reloads never do
//! - Ordered startup: config first, then watcher, then listeners

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
