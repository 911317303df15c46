//! The `client` module provides `PubSubClient`, an async wrapper around the
//! WebSocket protocol spoken by the pullsub server.

pub mod pubsub_client;
pub use pubsub_client::PubSubClient;

#[cfg(test)]
mod tests;
