use serde::{Deserialize, Serialize};

use crate::broker::BrokerStats;

/// Requests accepted by the server, one JSON text frame each.
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "register_publisher")]
    RegisterPublisher,
    #[serde(rename = "register_subscriber")]
    RegisterSubscriber,
    #[serde(rename = "create_topic")]
    CreateTopic { pid: String, topic: String },
    #[serde(rename = "delete_topic")]
    DeleteTopic { pid: String, topic: String },
    #[serde(rename = "send_message")]
    SendMessage {
        pid: String,
        topic: String,
        message: String,
    },
    #[serde(rename = "subscribe")]
    Subscribe { sid: String, topic: String },
    #[serde(rename = "pull_messages")]
    PullMessages { sid: String, topic: String },
    #[serde(rename = "stats")]
    Stats,
}

/// Replies sent back on the connection that issued the request.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "registered_publisher")]
    RegisteredPublisher { pid: String },
    #[serde(rename = "registered_subscriber")]
    RegisteredSubscriber { sid: String },
    #[serde(rename = "ack")]
    Ack { message: String },
    #[serde(rename = "messages")]
    Messages { messages: Vec<String> },
    #[serde(rename = "stats")]
    Stats {
        #[serde(flatten)]
        stats: BrokerStats,
        uptime_secs: i64,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMessage {
    /// Name of the `type` tag, used in error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::RegisteredPublisher { .. } => "registered_publisher",
            ServerMessage::RegisteredSubscriber { .. } => "registered_subscriber",
            ServerMessage::Ack { .. } => "ack",
            ServerMessage::Messages { .. } => "messages",
            ServerMessage::Stats { .. } => "stats",
            ServerMessage::Error { .. } => "error",
        }
    }
}
