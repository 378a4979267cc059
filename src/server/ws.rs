//! WebSocket transport for the simulation stream
//!
//! Each socket is split in two: the read half feeds a `ConnectionController`,
//! the write half is drained by a writer task from an unbounded channel. When
//! the writer fails the channel closes, which the tick loop reports as a
//! transport failure on its next tick.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::ConnectionController;
use crate::protocol::ServerMessage;
use crate::server::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection = state.next_connection_id();
    info!(connection, "New WebSocket connection established");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    warn!(connection, error = %e, "Failed to encode update");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text.into())).await {
                warn!(connection, error = %e, "Error sending WebSocket message");
                break;
            }
        }
    });

    let mut controller =
        ConnectionController::new(connection, state.catalog.clone(), state.settings.clone(), tx);

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => controller.on_message(text.as_str()).await,
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => controller.on_message(text).await,
                Err(e) => warn!(connection, error = %e, "Dropping non-UTF-8 frame"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(connection, error = %e, "WebSocket error");
                break;
            }
        }
    }

    let outcome = controller.on_close().await;
    drop(controller);
    writer.abort();
    debug!(connection, ?outcome, "Session state at disconnect");
    info!(connection, "WebSocket connection closed");
}
