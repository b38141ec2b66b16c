use std::{path::Path, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::Config;
use crate::player::{PlaybackError, Player, Status};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub player: Arc<dyn Player>,
}

#[derive(Deserialize)]
struct PlayFileReq {
    filename: String,
}

// --- Response envelopes ------------------------------------------------------
//
// Mutating endpoints answer `{"success":"true"}` (a string, which existing
// clients expect) or `{"error":"..."}` with a non-2xx status.

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<PlaybackError> for ApiError {
    fn from(e: PlaybackError) -> Self {
        let status = match e {
            PlaybackError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            PlaybackError::NotFound(_) => StatusCode::NOT_FOUND,
            PlaybackError::Launch(_) | PlaybackError::ProcessTermination(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn success() -> Json<serde_json::Value> {
    Json(json!({ "success": "true" }))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/channel", get(channel))
        .route("/files", get(files))
        .route("/status", get(status))
        .route("/playfile", post(play_file))
        .route("/stopfile", post(stop_file))
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn channel(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "channel": state.config.channel }))
}

async fn files(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    list_files(&state.config.data_dir).await.map(Json).map_err(|e| {
        warn!("file listing failed: {e}");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

async fn status(State(state): State<AppState>) -> Json<Status> {
    Json(state.player.status())
}

async fn play_file(
    State(state): State<AppState>,
    body: Result<Json<PlayFileReq>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;
    state.player.play_file(&req.filename).await.map_err(|e| {
        warn!("playfile {:?} failed: {e}", req.filename);
        ApiError::from(e)
    })?;
    Ok(success())
}

async fn stop_file(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    state.player.stop_file().await.map_err(|e| {
        warn!("stopfile failed: {e}");
        ApiError::from(e)
    })?;
    Ok(success())
}

/// Names of every entry in the data directory, sorted by name.
async fn list_files(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut rd = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read_dir({}): {e}", dir.display()))?;

    let mut out = Vec::new();
    while let Some(ent) = rd.next_entry().await? {
        // Non-UTF8 names are still listed rather than dropped.
        out.push(ent.file_name().to_string_lossy().to_string());
    }
    out.sort();
    Ok(out)
}
