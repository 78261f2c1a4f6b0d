//! WebSocket transport
//!
//! One task per socket. Inbound frames are parsed into `ClientMessage`s and
//! handed to the session; outbound envelopes from the shared channel are
//! forwarded when they are broadcasts or addressed to this socket. Closing
//! the socket is reported to the session as a disconnect.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::dispatch::Inbound;
use crate::hub::AppState;
use crate::protocol::{ClientMessage, ServerMessage};

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Parse one text frame from a client
pub fn parse_client_message(text: &str) -> Result<ClientMessage, ServerMessage> {
    serde_json::from_str::<ClientMessage>(text).map_err(|e| ServerMessage::GameError {
        code: "PARSE_ERROR".to_string(),
        message: format!("Invalid message format: {}", e),
    })
}

async fn send_json<S>(sender: &mut S, msg: &ServerMessage) -> bool
where
    S: SinkExt<Message> + Unpin,
{
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize message: {}", e);
            true
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let connection = state.next_connection_id();

    // Subscribe before the welcome so nothing published in between is lost
    let mut outbound_rx = state.subscribe();

    tracing::info!("WebSocket connected: {}", connection);

    let welcome = state.welcome(&connection).await;
    if !send_json(&mut sender, &welcome).await {
        tracing::error!("Failed to send welcome message");
        state.handle(&connection, Inbound::Disconnected).await;
        return;
    }

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                match outbound {
                    Ok(envelope) => {
                        if let Some(msg) = envelope.for_connection(&connection) {
                            if !send_json(&mut sender, msg).await {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Connection {} lagged, skipped {} messages", connection, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received from {}: {}", connection, text.as_str());

                        match parse_client_message(text.as_str()) {
                            Ok(client_msg) => {
                                // Replies arrive through the outbound channel
                                state.handle(&connection, client_msg.into()).await;
                            }
                            Err(error) => {
                                tracing::warn!("Unparseable message from {}", connection);
                                if !send_json(&mut sender, &error).await {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed: {}", connection);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error on {}: {}", connection, e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    state.handle(&connection, Inbound::Disconnected).await;
    tracing::info!("WebSocket connection closed: {}", connection);
}
