use serde::{Deserialize, Serialize};

/// Point-in-time counters describing the broker state.
///
/// Taken under the broker lock, so the three numbers are mutually consistent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerStats {
    pub topics: usize,
    pub subscriptions: usize,
    pub pending_messages: usize,
}
