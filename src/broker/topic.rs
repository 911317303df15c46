//! Topic management
//!
//! A `Topic` anchors the subscriptions registered on it together with one
//! delivery queue per subscriber. The subscriber set and the queue set are the
//! same map: a subscriber is subscribed exactly when it owns a queue, so
//! duplicate subscriptions are a no-op and dropping the topic drops every
//! queue keyed to it.
//!
//! Concurrency note: callers must synchronize access to `Topic` (the broker
//! holds every topic behind its state lock).

use std::collections::{HashMap, VecDeque};

pub type SubscriberId = String;

/// Pending messages for one (topic, subscriber) pair, oldest first.
pub type DeliveryQueue = VecDeque<String>;

#[derive(Debug, Default)]
pub struct Topic {
    pub name: String,
    pub queues: HashMap<SubscriberId, DeliveryQueue>,
}

impl Topic {
    /// Create a new topic with the given name and no subscribers.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            queues: HashMap::new(),
        }
    }

    /// Add a subscriber with an empty queue. Returns `false` if the
    /// subscriber was already present, in which case its queue is untouched.
    pub fn subscribe(&mut self, id: &str) -> bool {
        if self.queues.contains_key(id) {
            return false;
        }
        self.queues.insert(id.to_string(), DeliveryQueue::new());
        true
    }

    pub fn is_subscribed(&self, id: &str) -> bool {
        self.queues.contains_key(id)
    }

    /// Append `message` to every subscriber queue. Returns the fan-out width.
    pub fn fan_out(&mut self, message: &str) -> usize {
        for queue in self.queues.values_mut() {
            queue.push_back(message.to_string());
        }
        self.queues.len()
    }

    /// Take the whole queue of `id`, leaving it empty. `None` when `id` is
    /// not subscribed.
    pub fn take(&mut self, id: &str) -> Option<Vec<String>> {
        self.queues
            .get_mut(id)
            .map(|queue| std::mem::take(queue).into())
    }

    /// Number of messages waiting for `id`.
    pub fn pending(&self, id: &str) -> usize {
        self.queues.get(id).map_or(0, VecDeque::len)
    }

    /// Total number of messages waiting across all subscribers.
    pub fn pending_total(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }
}
