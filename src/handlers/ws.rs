use axum::extract::State;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::state::AppState;

/// Outbound queue depth per subscriber. A subscriber that stays this far
/// behind starts eating into the broadcast send timeout.
const OUTBOUND_BUFFER: usize = 64;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);

    // Registered only after the upgrade handshake has completed.
    let subscriber_id = state.registry.register(tx.clone());

    // Single writer: broadcasts and direct replies funnel through one queue,
    // so the socket sink has exactly one writer.
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sink
                .send(Message::Text(Utf8Bytes::from(payload)))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => {
                let reply = if text.as_str() == "get_all_products" {
                    full_listing(&state).await
                } else {
                    format!("Message text was: {}", text.as_str())
                };
                if tx.send(reply).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    tracing::debug!(subscriber_id, "subscriber disconnected");
    state.registry.unregister(subscriber_id);
    drop(tx);
    let _ = writer.await;
}

async fn full_listing(state: &AppState) -> String {
    match state.store.list(0, 100).await {
        Ok(products) => {
            serde_json::to_string(&products).unwrap_or_else(|_| "[]".to_string())
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to load product listing for subscriber");
            "[]".to_string()
        }
    }
}
