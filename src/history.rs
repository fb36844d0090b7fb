//! history.rs — in-memory joke history keyed by id.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use metrics::gauge;

use crate::model::Joke;

/// Thread-safe id → joke map. Callers need no extra locking.
#[derive(Debug, Default)]
pub struct HistoryStore {
    inner: RwLock<HashMap<String, Joke>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert by id. Returns the joke it replaced, if any.
    pub fn put(&self, joke: Joke) -> Option<Joke> {
        let mut map = self.write();
        let prev = map.insert(joke.id.clone(), joke);
        gauge!("joke_history_size").set(map.len() as f64);
        prev
    }

    pub fn get(&self, id: &str) -> Option<Joke> {
        self.read().get(id).cloned()
    }

    /// Owned snapshot; later writes do not show up in it. Order is unspecified.
    pub fn list(&self) -> Vec<Joke> {
        self.read().values().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    pub fn clear(&self) {
        let mut map = self.write();
        map.clear();
        gauge!("joke_history_size").set(0.0);
    }

    // A panic while holding the lock cannot leave the map half-written
    // (every mutation is a single HashMap call), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Joke>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Joke>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
