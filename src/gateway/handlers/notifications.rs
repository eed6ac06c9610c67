//! Websocket notification endpoint
//!
//! Handles the upgrade, connection lifecycle and forwarding of queued
//! notifications to the client.

use axum::extract::ws::{Message, WebSocket};
use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::gateway::response::ApiError;
use crate::gateway::state::AppState;
use crate::gateway::types::WsAuthQuery;
use crate::notify::{ConnectionRegistry, Notification};

/// Websocket upgrade handler
///
/// Endpoint: GET /ws/notifications?token=<jwt>
pub async fn ws_notifications(
    ws: WebSocketUpgrade,
    Query(params): Query<WsAuthQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let claims = match state.auth.verify_token(&params.token) {
        Ok(claims) => claims,
        Err(_) => return ApiError::unauthorized("Invalid or expired token").into_response(),
    };
    let user_id: i64 = match claims.sub.parse() {
        Ok(id) => id,
        Err(_) => return ApiError::unauthorized("Invalid token subject").into_response(),
    };

    let registry = state.connections.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, registry))
}

async fn handle_socket(socket: WebSocket, user_id: i64, registry: Arc<ConnectionRegistry>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

    let conn_id = registry.add(user_id, tx);

    // Forward queued notifications to the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&notification) {
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Drain incoming frames until the client closes.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    registry.remove(user_id, conn_id);
}
