// src/notify/broadcast.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;

use super::Publisher;
use crate::model::Joke;

/// In-process topic hub: one broadcast channel per topic, created on first
/// subscribe. Each subscriber sees jokes in publish order; a subscriber that
/// falls more than `capacity` behind loses the oldest ones (`RecvError::Lagged`).
pub struct BroadcastHub {
    capacity: usize,
    topics: Mutex<HashMap<String, broadcast::Sender<Arc<Joke>>>>,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<Arc<Joke>> {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        let topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        topics.get(topic).map_or(0, |tx| tx.receiver_count())
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Publisher for BroadcastHub {
    fn publish(&self, topic: &str, joke: &Joke) {
        let tx = {
            let topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
            topics.get(topic).cloned()
        };
        let Some(tx) = tx else {
            tracing::trace!(topic, "no subscribers yet");
            return;
        };
        // Err only means nobody is listening right now.
        match tx.send(Arc::new(joke.clone())) {
            Ok(n) => tracing::debug!(topic, subscribers = n, joke_id = %joke.id, "published"),
            Err(_) => tracing::trace!(topic, "published to empty topic"),
        }
    }
}
