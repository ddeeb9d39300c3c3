// src/api/ws/mod.rs
// WebSocket endpoint: one accepted connection runs an indefinite loop of
// strictly sequential turns over a fresh SessionContext.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use axum::{
    extract::{ConnectInfo, State, WebSocketUpgrade},
    response::IntoResponse,
};
use bytes::Bytes;
use futures_util::SinkExt;
use futures_util::stream::{SplitSink, StreamExt};
use tracing::{debug, info, warn};

pub mod message;
pub mod turn;

pub use message::WsServerMessage;
pub use turn::{STATUS_NOT_UNDERSTOOD, TurnAbort, TurnOutcome, TurnPipeline, TurnSink};

use crate::config::CONFIG;
use crate::state::AppState;

pub async fn ws_talk_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
) -> impl IntoResponse {
    info!("WebSocket upgrade request from {}", addr);
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, addr))
}

/// Production turn sink: writes audio as binary frames and notices as JSON
/// text frames on the connection.
struct WsTurnSink {
    sender: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl TurnSink for WsTurnSink {
    async fn send_audio(&mut self, audio: Bytes) -> Result<()> {
        self.sender.send(Message::Binary(audio)).await?;
        self.sender.flush().await?;
        Ok(())
    }

    async fn send_status(&mut self, status: &str) -> Result<()> {
        let json = serde_json::to_string(&WsServerMessage::Status {
            message: status.to_string(),
        })?;
        self.sender.send(Message::Text(Utf8Bytes::from(json))).await?;
        self.sender.flush().await?;
        Ok(())
    }
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, addr: std::net::SocketAddr) {
    let (sender, mut receiver) = socket.split();
    let mut sink = WsTurnSink { sender };

    let mut session = crate::session::SessionContext::new(CONFIG.session.history_max_messages);
    info!(
        "[{}] WebSocket connection accepted from {}",
        session.session_id(),
        addr
    );

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Binary(frame)) => {
                match app_state
                    .pipeline
                    .run_turn(&frame, &mut session, &mut sink)
                    .await
                {
                    Ok(TurnOutcome::Aborted(abort)) => {
                        debug!("[{}] Turn aborted: {}", session.session_id(), abort);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // Send failure: the client is gone.
                        warn!(
                            "[{}] Transport failure, terminating connection: {}",
                            session.session_id(),
                            e
                        );
                        break;
                    }
                }
            }
            Ok(Message::Ping(data)) => {
                if let Err(e) = sink.sender.send(Message::Pong(data)).await {
                    warn!("[{}] Failed to send pong: {}", session.session_id(), e);
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("[{}] Client initiated close", session.session_id());
                break;
            }
            Ok(Message::Text(text)) => {
                debug!(
                    "[{}] Ignoring unexpected text frame ({} bytes)",
                    session.session_id(),
                    text.len()
                );
            }
            Ok(Message::Pong(_)) => {}
            Err(e) => {
                info!(
                    "[{}] Client {} disconnected: {}",
                    session.session_id(),
                    addr,
                    e
                );
                break;
            }
        }
    }

    // SessionContext drops here; no state survives the connection.
    info!(
        "[{}] Closing WebSocket connection for {}",
        session.session_id(),
        addr
    );
}
