//! # Chat Websocket Handler
//!
//! Upgrades the connection, then runs two tasks per client: a writer pump
//! draining the registry channel into the socket, and a read loop feeding
//! inbound frames to the chat service. Either side ending tears the
//! connection down and unregisters it.

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::auth::CurrentAccount;
use crate::server::AppState;

/// Websocket endpoint for the chat protocol
#[utoipa::path(
    get,
    path = "/ws",
    responses(
        (status = 101, description = "Switching protocols"),
        (status = 403, description = "Unknown account")
    ),
    tag = "chat"
)]
pub async fn ws_upgrade(
    State(state): State<AppState>,
    caller: CurrentAccount,
    upgrade: WebSocketUpgrade,
) -> Response {
    let account_id = caller.id();
    upgrade.on_upgrade(move |socket| handle_socket(state, account_id, socket))
}

async fn handle_socket(state: AppState, account_id: i64, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let connection_id = match state.chat.connect(account_id, tx).await {
        Ok(id) => id,
        Err(err) => {
            tracing::warn!(account_id, error = %err.message, "Connection rejected");
            let _ = sink
                .send(Message::Text(
                    serde_json::json!({ "error": err.message }).to_string().into(),
                ))
                .await;
            return;
        }
    };

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(raw)) => {
                state.chat.handle_frame(account_id, connection_id, &raw).await;
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    state.chat.disconnect(connection_id);
    writer.abort();
    tracing::debug!(account_id, connection_id = %connection_id, "Connection closed");
}
