// REST handlers: version, load history, device telemetry, backup trigger

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::AppState;
use crate::backup::BackupError;
use crate::models::{DeviceTelemetry, HubMessage};

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GET /version: service name and version from Cargo.toml at build time.
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/stats/history: recent load values, oldest first.
pub(super) async fn history_handler(State(state): State<AppState>) -> Response {
    match state
        .history
        .recent_loads(state.config.monitoring.history_limit)
        .await
    {
        Ok(loads) => Json(loads).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, operation = "recent_loads", "History query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "history unavailable" })),
            )
                .into_response()
        }
    }
}

/// POST /api/telemetry: rebroadcast the device payload to dashboard subscribers.
pub(super) async fn telemetry_handler(
    State(state): State<AppState>,
    Json(telemetry): Json<DeviceTelemetry>,
) -> StatusCode {
    tracing::debug!(device_id = %telemetry.device_id, "Telemetry received");
    let _ = state.hub_tx.send(HubMessage::Telemetry(telemetry));
    StatusCode::OK
}

/// POST /api/backup/trigger: start the document export without waiting for it.
pub(super) async fn backup_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, BackupError> {
    state.backup.start()?;
    Ok(Json(serde_json::json!({
        "message": "Backup iniciado no Docker.",
    })))
}

impl IntoResponse for BackupError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, operation = "backup_trigger", "Backup could not be started");
        let details = match &self {
            BackupError::Spawn { source, .. } => source.to_string(),
        };
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": "Falha ao executar comando",
                "details": details,
            })),
        )
            .into_response()
    }
}
