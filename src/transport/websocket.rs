//! WebSocket transport
//!
//! This file implements a minimal WebSocket server that translates protocol
//! JSON messages into broker operations. Responsibilities:
//! - Accept TCP/WebSocket connections, up to `broker.max_connections` at once.
//!   A slot is taken as soon as the TCP connection is accepted, so peers that
//!   are still handshaking count toward the limit; the handshake itself is
//!   bounded by `broker.handshake_timeout_ms`
//! - Issue publisher/subscriber identities on request
//! - Decode each text frame into a `ClientMessage`, run it against the
//!   `Broker`, and answer with exactly one `ServerMessage`
//!
//! Identities are not tied to connections: any connection may act for any
//! `pid`/`sid`, which lets a client reconnect and keep pulling its queue.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_tungstenite::{WebSocketStream, accept_async};
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::broker::Broker;
use crate::config::Settings;
use crate::transport::identity::IdentityIssuer;
use crate::transport::message::{ClientMessage, ServerMessage};
use crate::utils::Result;

/// State shared by every connection of one server.
#[derive(Debug)]
pub struct ServerState {
    pub broker: Arc<Broker>,
    pub issuer: IdentityIssuer,
    pub started_at: DateTime<Utc>,
    connections: Arc<Semaphore>,
    handshake_timeout: Duration,
}

impl ServerState {
    pub fn new(broker: Arc<Broker>, settings: &Settings) -> Self {
        Self {
            broker,
            issuer: IdentityIssuer::new(),
            started_at: Utc::now(),
            connections: Arc::new(Semaphore::new(settings.broker.max_connections)),
            handshake_timeout: Duration::from_millis(settings.broker.handshake_timeout_ms),
        }
    }
}

/// Bind `addr` and serve forever; returns only if binding fails.
pub async fn start_websocket_server(
    addr: String,
    broker: Arc<Broker>,
    settings: Settings,
) -> Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    serve(listener, broker, settings).await;
    Ok(())
}

/// Accept connections on an already bound listener, forever.
pub async fn serve(listener: TcpListener, broker: Arc<Broker>, settings: Settings) {
    let state = Arc::new(ServerState::new(broker, &settings));

    match listener.local_addr() {
        Ok(addr) => info!("WebSocket server listening on ws://{addr}"),
        Err(e) => warn!("WebSocket server listening on unknown address: {e}"),
    }

    let mut failures = 0u32;
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => {
                failures = 0;
                accepted
            }
            Err(e) => {
                // Errors such as EMFILE persist until a descriptor is freed.
                failures = failures.saturating_add(1);
                let delay = accept_backoff(failures);
                warn!("Failed to accept connection: {e}; retrying in {delay:?}");
                tokio::time::sleep(delay).await;
                continue;
            }
        };
        let permit = state.connections.clone().try_acquire_owned().ok();
        let state = state.clone();
        tokio::spawn(async move {
            handle_connection(stream, peer, permit, state).await;
        });
    }
}

const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(10);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Delay after the `failures`-th consecutive accept error: doubles from
/// `ACCEPT_BACKOFF_MIN` up to `ACCEPT_BACKOFF_MAX`.
pub(crate) fn accept_backoff(failures: u32) -> Duration {
    let factor = 1u32
        .checked_shl(failures.saturating_sub(1))
        .unwrap_or(u32::MAX);
    ACCEPT_BACKOFF_MIN
        .saturating_mul(factor)
        .min(ACCEPT_BACKOFF_MAX)
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    permit: Option<OwnedSemaphorePermit>,
    state: Arc<ServerState>,
) {
    let conn_id = format!("conn-{}", Uuid::new_v4());
    let timeout = state.handshake_timeout;

    let mut ws_stream = match tokio::time::timeout(timeout, accept_async(stream)).await {
        Ok(Ok(ws)) => ws,
        Ok(Err(e)) => {
            warn!("WebSocket handshake error from {peer}: {e}");
            return;
        }
        Err(_) => {
            warn!("WebSocket handshake from {peer} timed out after {timeout:?}");
            return;
        }
    };

    // Held until the connection ends.
    let Some(_permit) = permit else {
        warn!("Rejecting {peer}: connection limit reached");
        let reply = ServerMessage::Error {
            message: "connection limit reached".to_string(),
        };
        let _ = tokio::time::timeout(timeout, async {
            let _ = send_reply(&mut ws_stream, &reply).await;
            let _ = ws_stream.close(None).await;
        })
        .await;
        return;
    };

    info!("{conn_id} connected from {peer}");

    if let Err(e) = serve_connection(&mut ws_stream, &state, &conn_id).await {
        warn!("{conn_id} closed with error: {e}");
    }

    info!("{conn_id} disconnected");
}

async fn serve_connection(
    ws_stream: &mut WebSocketStream<TcpStream>,
    state: &ServerState,
    conn_id: &str,
) -> Result<()> {
    while let Some(frame) = ws_stream.next().await {
        let reply = match frame? {
            WsMessage::Text(text) => handle_text(state, text.as_str()),
            WsMessage::Binary(_) => ServerMessage::Error {
                message: "binary frames are not supported".to_string(),
            },
            WsMessage::Close(_) => break,
            _ => continue,
        };
        debug!("{conn_id} -> {}", reply.kind());
        send_reply(ws_stream, &reply).await?;
    }
    Ok(())
}

async fn send_reply(
    ws_stream: &mut WebSocketStream<TcpStream>,
    reply: &ServerMessage,
) -> Result<()> {
    let json = serde_json::to_string(reply)?;
    ws_stream.send(WsMessage::text(json)).await?;
    Ok(())
}

/// Decode one text frame and run it. Undecodable input yields an `error`
/// reply rather than closing the connection.
pub fn handle_text(state: &ServerState, text: &str) -> ServerMessage {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(request) => handle_request(state, request),
        Err(err) => {
            warn!("Invalid client message: {err} | {text}");
            ServerMessage::Error {
                message: format!("invalid request: {err}"),
            }
        }
    }
}

pub fn handle_request(state: &ServerState, request: ClientMessage) -> ServerMessage {
    let broker = &state.broker;

    match request {
        ClientMessage::RegisterPublisher => {
            let pid = state.issuer.publisher();
            info!("Registered publisher {pid}");
            ServerMessage::RegisteredPublisher { pid }
        }

        ClientMessage::RegisterSubscriber => {
            let sid = state.issuer.subscriber();
            info!("Registered subscriber {sid}");
            ServerMessage::RegisteredSubscriber { sid }
        }

        ClientMessage::CreateTopic { pid, topic } => {
            broker.create_topic(&topic);
            info!("Publisher {pid} created topic {topic}");
            ServerMessage::Ack {
                message: format!("Topic {topic} created by Publisher {pid}"),
            }
        }

        ClientMessage::DeleteTopic { pid, topic } => {
            broker.delete_topic(&topic);
            info!("Publisher {pid} deleted topic {topic}");
            ServerMessage::Ack {
                message: format!("Topic {topic} deleted by Publisher {pid}"),
            }
        }

        ClientMessage::SendMessage {
            pid,
            topic,
            message,
        } => {
            let delivered = broker.publish(&topic, &message);
            debug!("Publisher {pid} sent message '{message}' to topic {topic} ({delivered} queues)");
            ServerMessage::Ack {
                message: format!("Message sent to topic {topic} by Publisher {pid}"),
            }
        }

        ClientMessage::Subscribe { sid, topic } => {
            broker.subscribe(&sid, &topic);
            debug!("Subscriber {sid} asked to subscribe to topic {topic}");
            ServerMessage::Ack {
                message: format!("Subscriber {sid} subscribed to topic {topic}"),
            }
        }

        ClientMessage::PullMessages { sid, topic } => {
            let messages = broker.drain(&sid, &topic);
            debug!("Subscriber {sid} pulled {} messages from {topic}", messages.len());
            ServerMessage::Messages { messages }
        }

        ClientMessage::Stats => ServerMessage::Stats {
            stats: broker.stats(),
            uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        },
    }
}
