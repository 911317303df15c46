//! pullsub broker
//!
//! The broker module holds the in-memory state machine of the system: the
//! topic registry, the subscription table, and the per-(topic, subscriber)
//! delivery queues, together with the fan-out and drain operations on them.
//!
//! Public types:
//! - `Broker`: thread-safe core exposing create/delete topic, subscribe,
//!   publish and drain.
//! - `BrokerStats`: diagnostic snapshot of the state.

pub mod engine;
pub mod stats;
pub mod topic;

pub use engine::Broker;
pub use stats::BrokerStats;
