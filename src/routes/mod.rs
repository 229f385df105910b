// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::backup::BackupTrigger;
use crate::config::AppConfig;
use crate::history_repo::MetricStore;
use crate::models::HubMessage;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) hub_tx: broadcast::Sender<HubMessage>,
    pub(crate) history: Arc<dyn MetricStore>,
    pub(crate) backup: Arc<BackupTrigger>,
    pub(crate) ws_connections: Arc<AtomicUsize>,
    pub(crate) config: AppConfig,
}

pub fn app(
    hub_tx: broadcast::Sender<HubMessage>,
    history: Arc<dyn MetricStore>,
    backup: Arc<BackupTrigger>,
    ws_connections: Arc<AtomicUsize>,
    config: AppConfig,
) -> Router {
    let static_files = ServeDir::new(&config.server.static_dir);
    let state = AppState {
        hub_tx,
        history,
        backup,
        ws_connections,
        config,
    };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/stats/history", get(http::history_handler)) // GET /api/stats/history
        .route("/api/telemetry", post(http::telemetry_handler)) // POST /api/telemetry
        .route("/api/backup/trigger", post(http::backup_handler)) // POST /api/backup/trigger
        .route("/ws/dashboard", get(ws::ws_dashboard)) // WS /ws/dashboard
        .fallback_service(static_files)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
