use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::middleware::auth::{resolve_session, SESSION_COOKIE};
use crate::models::AuthUser;
use crate::routes::member_of;
use crate::ws::events::ClientEvent;
use crate::ws::gateway::ClientId;
use crate::AppState;

/// GET /gateway — WebSocket upgrade. The session token arrives as a
/// `token` query param, Bearer header, or the session cookie;
/// unauthenticated sockets are dropped after the upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    query: axum::extract::Query<std::collections::HashMap<String, String>>,
    headers: axum::http::HeaderMap,
) -> impl IntoResponse {
    let auth_user = extract_session(&state, &headers, &query).await;
    ws.on_upgrade(move |socket| handle_socket(socket, state, auth_user))
}

async fn extract_session(
    state: &AppState,
    headers: &axum::http::HeaderMap,
    query: &std::collections::HashMap<String, String>,
) -> Option<AuthUser> {
    let from_query = query.get("token").cloned();

    let from_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string());

    let from_cookie = headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .split(';')
        .filter_map(|c| {
            let c = c.trim();
            c.strip_prefix(&format!("{}=", SESSION_COOKIE))
                .map(|t| t.to_string())
        })
        .next();

    let token = from_query.or(from_header).or(from_cookie)?;
    if token.is_empty() {
        return None;
    }

    resolve_session(&state.db, &token).await.ok().flatten()
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, auth_user: Option<AuthUser>) {
    let user = match auth_user {
        Some(u) => u,
        None => return,
    };

    let client_id = state.gateway.next_client_id().await;
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    state.gateway.register(client_id, user.id.clone(), tx).await;

    // Forward queued events to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_tx.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Receive loop
    let state_clone = state.clone();
    let user_clone = user.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            match msg {
                Message::Text(text) => {
                    let text_str: &str = &text;
                    if let Ok(event) = serde_json::from_str::<ClientEvent>(text_str) {
                        handle_client_event(&state_clone, client_id, &user_clone, event).await;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.gateway.unregister(client_id).await;
}

async fn handle_client_event(
    state: &AppState,
    client_id: ClientId,
    user: &AuthUser,
    event: ClientEvent,
) {
    match event {
        ClientEvent::SubscribeWorkspace { workspace_id } => {
            // Only members may listen in on a workspace
            if let Ok(Some(_)) = member_of(&state.db, &workspace_id, &user.id).await {
                state
                    .gateway
                    .subscribe_workspace(client_id, &workspace_id)
                    .await;
            }
        }
        ClientEvent::UnsubscribeWorkspace { workspace_id } => {
            state
                .gateway
                .unsubscribe_workspace(client_id, &workspace_id)
                .await;
        }
        ClientEvent::Ping => {}
    }
}
