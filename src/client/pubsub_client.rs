//! Client wrapper
//!
//! `PubSubClient` holds one WebSocket connection to a pullsub server and
//! exposes one async method per protocol request. Each call sends a single
//! frame and waits for the matching reply, so calls on one client are
//! strictly sequential.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use tungstenite::protocol::Message as WsMessage;

use crate::broker::BrokerStats;
use crate::transport::message::{ClientMessage, ServerMessage};
use crate::utils::{PubSubError, Result};

pub struct PubSubClient {
    ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl PubSubClient {
    /// Connect to a server, e.g. `ws://127.0.0.1:5000`.
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws_stream, _response) = connect_async(url).await?;
        debug!("Connected to {url}");
        Ok(Self { ws_stream })
    }

    async fn request(&mut self, request: &ClientMessage) -> Result<ServerMessage> {
        let json = serde_json::to_string(request)?;
        self.ws_stream.send(WsMessage::text(json)).await?;

        while let Some(frame) = self.ws_stream.next().await {
            match frame? {
                WsMessage::Text(text) => {
                    return match serde_json::from_str::<ServerMessage>(text.as_str())? {
                        ServerMessage::Error { message } => Err(PubSubError::Server(message)),
                        reply => Ok(reply),
                    };
                }
                WsMessage::Close(_) => break,
                _ => continue,
            }
        }
        Err(PubSubError::ConnectionClosed)
    }

    async fn expect_ack(&mut self, request: ClientMessage) -> Result<String> {
        match self.request(&request).await? {
            ServerMessage::Ack { message } => Ok(message),
            other => Err(unexpected("ack", &other)),
        }
    }

    pub async fn register_publisher(&mut self) -> Result<String> {
        match self.request(&ClientMessage::RegisterPublisher).await? {
            ServerMessage::RegisteredPublisher { pid } => Ok(pid),
            other => Err(unexpected("registered_publisher", &other)),
        }
    }

    pub async fn register_subscriber(&mut self) -> Result<String> {
        match self.request(&ClientMessage::RegisterSubscriber).await? {
            ServerMessage::RegisteredSubscriber { sid } => Ok(sid),
            other => Err(unexpected("registered_subscriber", &other)),
        }
    }

    pub async fn create_topic(&mut self, pid: &str, topic: &str) -> Result<String> {
        self.expect_ack(ClientMessage::CreateTopic {
            pid: pid.to_string(),
            topic: topic.to_string(),
        })
        .await
    }

    pub async fn delete_topic(&mut self, pid: &str, topic: &str) -> Result<String> {
        self.expect_ack(ClientMessage::DeleteTopic {
            pid: pid.to_string(),
            topic: topic.to_string(),
        })
        .await
    }

    pub async fn send_message(&mut self, pid: &str, topic: &str, message: &str) -> Result<String> {
        self.expect_ack(ClientMessage::SendMessage {
            pid: pid.to_string(),
            topic: topic.to_string(),
            message: message.to_string(),
        })
        .await
    }

    pub async fn subscribe(&mut self, sid: &str, topic: &str) -> Result<String> {
        self.expect_ack(ClientMessage::Subscribe {
            sid: sid.to_string(),
            topic: topic.to_string(),
        })
        .await
    }

    /// Drain everything queued for `sid` on `topic`.
    pub async fn pull_messages(&mut self, sid: &str, topic: &str) -> Result<Vec<String>> {
        let request = ClientMessage::PullMessages {
            sid: sid.to_string(),
            topic: topic.to_string(),
        };
        match self.request(&request).await? {
            ServerMessage::Messages { messages } => Ok(messages),
            other => Err(unexpected("messages", &other)),
        }
    }

    pub async fn stats(&mut self) -> Result<BrokerStats> {
        match self.request(&ClientMessage::Stats).await? {
            ServerMessage::Stats { stats, .. } => Ok(stats),
            other => Err(unexpected("stats", &other)),
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws_stream.close(None).await?;
        Ok(())
    }
}

fn unexpected(expected: &'static str, got: &ServerMessage) -> PubSubError {
    PubSubError::UnexpectedReply {
        expected,
        got: got.kind().to_string(),
    }
}
