use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};
use warp::ws::{Message, WebSocket};

use crate::invite::Invite;
use crate::service::GameService;
use game_types::{ClientMessage, ErrorCode, ServerMessage};

pub mod connection;
pub mod handlers;
pub mod rate_limiter;


use connection::Connection;
use handlers::MessageHandler;
use rate_limiter::RateLimiter;

/// Drive one player's socket for the lifetime of the connection.
///
/// The invite has already been checked; joining can still fail if the room
/// changed in between, in which case the error is sent and the socket closed.
pub async fn handle_connection(websocket: WebSocket, service: Arc<dyn GameService>, invite: Invite) {
    let Invite {
        player, room_id, ..
    } = invite;
    let (connection, mut outgoing) = Connection::new();
    let connection_id = connection.id();
    info!(%room_id, player = %player.username, "New live connection {}", connection_id);

    let (mut ws_sender, mut ws_receiver) = websocket.split();

    if let Err(e) = service.join(room_id, &player, connection.clone()).await {
        warn!(%room_id, player = %player.username, "Join failed: {}", e);
        let message = ServerMessage::Error {
            code: e.code(),
            message: e.to_string(),
        };
        if let Ok(json) = serde_json::to_string(&message) {
            let _ = ws_sender.send(Message::text(json)).await;
        }
        let _ = ws_sender.close().await;
        return;
    }

    let watchdog = connection.clone();
    let message_handler = MessageHandler::new(room_id, player.clone(), connection, service.clone());

    // Handle incoming messages
    let incoming_handler = {
        let message_handler = message_handler.clone();
        let mut rate_limiter = RateLimiter::new();

        async move {
            while let Some(result) = ws_receiver.next().await {
                match result {
                    Ok(msg) if msg.is_close() => break,
                    Ok(msg) => handle_message(msg, &mut rate_limiter, &message_handler).await,
                    Err(e) => {
                        warn!("WebSocket error for {}: {}", connection_id, e);
                        break;
                    }
                }
            }
        }
    };

    // Handle outgoing messages
    let outgoing_handler = async move {
        loop {
            let message = tokio::select! {
                message = outgoing.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
                _ = watchdog.lagged() => {
                    warn!("Connection {} fell behind, closing", connection_id);
                    let _ = ws_sender.close().await;
                    break;
                }
            };

            let closing = matches!(message, ServerMessage::ConnectionClosed { .. });
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize message: {:?}", e);
                    continue;
                }
            };

            if let Err(e) = ws_sender.send(Message::text(json)).await {
                warn!("Failed to send message to {}: {:?}", connection_id, e);
                break;
            }
            if closing {
                let _ = ws_sender.close().await;
                break;
            }
        }
    };

    // Run both handlers concurrently
    tokio::select! {
        _ = incoming_handler => {},
        _ = outgoing_handler => {},
    }

    info!(%room_id, player = %player.username, "Connection {} disconnected", connection_id);
    service.leave(room_id, &player.username, connection_id).await;
}

async fn handle_message(msg: Message, rate_limiter: &mut RateLimiter, message_handler: &MessageHandler) {
    // Only handle text messages
    let Ok(text) = msg.to_str() else {
        return;
    };

    if !rate_limiter.check_rate_limit() {
        warn!("Rate limit exceeded for {}", message_handler.player().username);
        message_handler.send_error(ErrorCode::RateLimited, "Too many messages, slow down");
        return;
    }

    match serde_json::from_str::<ClientMessage>(text) {
        Ok(client_message) => message_handler.handle_message(client_message).await,
        Err(e) => message_handler.send_error(ErrorCode::InvalidMessage, format!("Invalid JSON message: {e}")),
    }
}
