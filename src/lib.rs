//! # pullsub
//!
//! `pullsub` is a minimal, in-memory publish/subscribe broker. Publishers
//! create named topics and post messages; subscribers attach to a topic and
//! later pull (drain) whatever has been queued for them since their last pull.
//!
//! ## Core Modules
//!
//! - `broker`: the thread-safe state machine holding topics, subscriptions and
//!   per-subscriber delivery queues.
//! - `transport`: the WebSocket server, its JSON protocol and the identity
//!   issuer.
//! - `client`: an async client wrapper for the protocol.
//! - `config`: layered configuration loading.
//! - `utils`: error type and logging setup.

pub mod broker;
pub mod client;
pub mod config;
pub mod transport;
pub mod utils;
