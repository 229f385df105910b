// WebSocket dashboard hub: forwards every broadcast message and serves update requests

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::models::HubMessage;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Client request that asks every dashboard to refresh.
pub(super) const REQUEST_UPDATE: &str = "requestUpdate";
pub(super) const MANUAL_UPDATE_LOG: &str = "Dashboard Requested Manual Update.";

/// Decrements the dashboard connection count on drop (connect = +1, drop = -1).
struct WsConnectionGuard(Arc<AtomicUsize>);

impl Drop for WsConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

pub(super) async fn ws_dashboard(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let tx = state.hub_tx.clone();
    let conn_count = state.ws_connections.clone();
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = stream_dashboard(socket, tx, conn_count).await {
            tracing::info!("Dashboard stream error: {}", e);
        }
    })
}

/// `requestUpdate` as a bare string or as `{"event": "requestUpdate"}`.
fn is_update_request(text: &str) -> bool {
    let text = text.trim();
    if text == REQUEST_UPDATE {
        return true;
    }
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| {
            v.get("event")
                .and_then(|e| e.as_str())
                .map(|e| e == REQUEST_UPDATE)
        })
        .unwrap_or(false)
}

async fn stream_dashboard(
    socket: WebSocket,
    tx: broadcast::Sender<HubMessage>,
    conn_count: Arc<AtomicUsize>,
) -> anyhow::Result<()> {
    let mut rx = tx.subscribe();
    conn_count.fetch_add(1, Ordering::Relaxed);
    let _guard = WsConnectionGuard(conn_count);
    tracing::info!("Client connected to dashboard stream");

    let (mut sink, mut stream) = socket.split();
    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(msg) => {
                        let json = serde_json::to_string(&msg)?;
                        let r = timeout(WS_SEND_TIMEOUT, sink.send(Message::Text(json.into()))).await;
                        if !matches!(r, Ok(Ok(()))) {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/dashboard client lagged, skipped {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if is_update_request(text.as_str()) {
                            tracing::info!("{}", MANUAL_UPDATE_LOG);
                            let _ = tx.send(HubMessage::Log(MANUAL_UPDATE_LOG.to_string()));
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "Dashboard socket read failed");
                        break;
                    }
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, sink.send(Message::Ping(Bytes::new()))).await;
                if !matches!(r, Ok(Ok(()))) {
                    break;
                }
            }
        }
    }
    tracing::info!("Client disconnected from dashboard stream");
    Ok(())
}
