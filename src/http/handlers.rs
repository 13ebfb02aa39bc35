//! Admin API handlers.
//!
//! Every handler reads one snapshot from the store, so a response never mixes
//! fields from two reloads.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::config::Config;
use crate::http::response::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct ReloadStatus {
    pub reload_timestamp: String,
    pub generation: u64,
    pub watching: bool,
}

pub async fn get_health() -> &'static str {
    "ok"
}

/// Current configuration with any query overrides applied. Credentials are masked.
pub async fn get_config(
    State(state): State<AppState>,
    Query(overrides): Query<Vec<(String, String)>>,
) -> Result<Json<Config>, ApiError> {
    let snapshot = state.store.get();
    let config = snapshot
        .with_overrides(&overrides)
        .map_err(ApiError::BadOverride)?;
    Ok(Json(config.redacted()))
}

pub async fn get_reload_timestamp(State(state): State<AppState>) -> Json<ReloadStatus> {
    let snapshot = state.store.get();
    Json(ReloadStatus {
        reload_timestamp: snapshot.reload_timestamp(),
        generation: snapshot.generation(),
        watching: state.reload.is_some(),
    })
}

pub async fn post_reload(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let handle = state.reload.as_ref().ok_or(ApiError::NotWatching)?;
    if handle.request_reload() {
        tracing::info!("Config reload requested over HTTP");
        Ok(StatusCode::ACCEPTED)
    } else {
        Err(ApiError::WatcherStopped)
    }
}
