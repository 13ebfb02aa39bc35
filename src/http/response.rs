//! Error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::config::ConfigError;

/// Errors returned by the admin handlers.
#[derive(Debug)]
pub enum ApiError {
    /// A request override could not be applied.
    BadOverride(ConfigError),
    /// The config file is not being watched.
    NotWatching,
    /// The reload task has exited.
    WatcherStopped,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadOverride(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::NotWatching => (
                StatusCode::SERVICE_UNAVAILABLE,
                "config file is not being watched".to_string(),
            ),
            ApiError::WatcherStopped => (
                StatusCode::SERVICE_UNAVAILABLE,
                "config watcher has stopped".to_string(),
            ),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
