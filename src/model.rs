// src/model.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fetched joke. Never mutated once it is in the history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Joke {
    pub id: String,
    pub joke: String,
    /// Provider-reported outcome tag; informational only.
    #[serde(default)]
    pub status: String,
    /// Set by the scheduler at ingestion, not by the provider.
    #[serde(default, rename = "timestamp")]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Joke {
    pub fn new(id: impl Into<String>, joke: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            joke: joke.into(),
            status: status.into(),
            fetched_at: None,
        }
    }

    /// Returns a copy stamped with the ingestion time.
    pub fn stamped(mut self, at: DateTime<Utc>) -> Self {
        self.fetched_at = Some(at);
        self
    }

    /// First 50 chars of the text, for log lines.
    pub fn preview(&self) -> String {
        let mut out: String = self.joke.chars().take(50).collect();
        out.push_str("...");
        out
    }
}
