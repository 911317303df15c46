//! Broker engine
//!
//! This module contains the in-memory broker responsible for:
//! - keeping the registry of live topics
//! - recording subscriptions and their per-subscriber delivery queues
//! - fanning published messages out to every current subscriber
//! - draining a subscriber's queue in one atomic take-and-clear
//!
//! Concurrency and usage notes:
//! - The whole state sits behind one `Mutex`, and every public operation runs
//!   inside a single critical section. Operations are therefore linearizable:
//!   a publish sees either all or none of a concurrent subscribe, and a
//!   message appended during a drain lands in this drain or the next one.
//! - Methods take `&self`; share the broker as `Arc<Broker>`. The lock is
//!   never held across I/O, so the transport can call in from any task.
//! - References to unknown topics or absent subscriptions are absorbed as
//!   no-ops or empty results. No operation here can fail.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::broker::stats::BrokerStats;
use crate::broker::topic::Topic;

#[derive(Debug, Default)]
struct BrokerState {
    topics: HashMap<String, Topic>,
}

#[derive(Debug, Default)]
pub struct Broker {
    state: Mutex<BrokerState>,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation leaves the maps consistent before anything that could
    // panic, so a poisoned lock still guards a valid state.
    fn state(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ensure `topic` exists. Creating an existing topic changes nothing.
    pub fn create_topic(&self, topic: &str) {
        let mut state = self.state();
        if state.topics.contains_key(topic) {
            trace!("Topic '{topic}' already exists");
            return;
        }
        state.topics.insert(topic.to_string(), Topic::new(topic));
        debug!("Created topic '{topic}'");
    }

    /// Remove `topic` together with all its subscriptions and queued messages.
    pub fn delete_topic(&self, topic: &str) {
        let removed = self.state().topics.remove(topic);
        match removed {
            Some(t) => debug!(
                "Deleted topic '{topic}' ({} subscribers, {} pending messages dropped)",
                t.queues.len(),
                t.pending_total()
            ),
            None => trace!("Delete of unknown topic '{topic}' ignored"),
        }
    }

    /// Subscribe `subscriber` to `topic` if the topic exists.
    ///
    /// Subscribing to a topic that has not been created yet is a no-op: no
    /// pending subscription is remembered for a later `create_topic`.
    pub fn subscribe(&self, subscriber: &str, topic: &str) {
        let mut state = self.state();
        let Some(t) = state.topics.get_mut(topic) else {
            debug!("Subscribe of {subscriber} to unknown topic '{topic}' ignored");
            return;
        };
        if t.subscribe(subscriber) {
            debug!("{subscriber} subscribed to '{topic}'");
        } else {
            trace!("{subscriber} already subscribed to '{topic}'");
        }
    }

    /// Append `message` to the queue of every current subscriber of `topic`.
    ///
    /// Returns how many queues received the message; `0` when the topic does
    /// not exist, in which case the message is dropped.
    pub fn publish(&self, topic: &str, message: &str) -> usize {
        let mut state = self.state();
        match state.topics.get_mut(topic) {
            Some(t) => {
                let delivered = t.fan_out(message);
                trace!("Published to '{topic}', fanned out to {delivered} subscribers");
                delivered
            }
            None => {
                debug!("Publish to unknown topic '{topic}' dropped");
                0
            }
        }
    }

    /// Take every message queued for `subscriber` on `topic`, oldest first,
    /// and clear the queue. Empty when the subscriber holds no subscription.
    pub fn drain(&self, subscriber: &str, topic: &str) -> Vec<String> {
        let mut state = self.state();
        state
            .topics
            .get_mut(topic)
            .and_then(|t| t.take(subscriber))
            .unwrap_or_default()
    }

    pub fn topic_exists(&self, topic: &str) -> bool {
        self.state().topics.contains_key(topic)
    }

    pub fn is_subscribed(&self, subscriber: &str, topic: &str) -> bool {
        self.state()
            .topics
            .get(topic)
            .is_some_and(|t| t.is_subscribed(subscriber))
    }

    /// Number of messages currently queued for `subscriber` on `topic`.
    pub fn pending(&self, subscriber: &str, topic: &str) -> usize {
        self.state()
            .topics
            .get(topic)
            .map_or(0, |t| t.pending(subscriber))
    }

    pub fn stats(&self) -> BrokerStats {
        let state = self.state();
        state
            .topics
            .values()
            .fold(BrokerStats::default(), |mut stats, t| {
                stats.topics += 1;
                stats.subscriptions += t.queues.len();
                stats.pending_messages += t.pending_total();
                stats
            })
    }
}
