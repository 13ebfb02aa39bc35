//! HTTP admin surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace layer, graceful shutdown)
//!     → handlers.rs (read the current snapshot, apply overrides)
//!     → response.rs (errors to status codes)
//!     → Send to client
//! ```

pub mod handlers;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};
