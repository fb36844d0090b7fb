// src/fetch/providers/icanhazdadjoke.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;

use crate::config::RefresherConfig;
use crate::fetch::types::JokeSource;
use crate::model::Joke;

/// Wire shape of `GET https://icanhazdadjoke.com/` with `Accept: application/json`.
/// `status` comes back as a number (HTTP code), so it is taken loosely.
#[derive(Debug, Deserialize)]
struct WireJoke {
    id: String,
    joke: String,
    #[serde(default)]
    status: serde_json::Value,
}

impl From<WireJoke> for Joke {
    fn from(w: WireJoke) -> Self {
        let status = match w.status {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        Joke::new(w.id, w.joke, status)
    }
}

pub struct HttpJokeSource {
    url: String,
    client: Client,
}

impl HttpJokeSource {
    /// Both timeouts are enforced on every call so a hung provider cannot
    /// hold a tick forever.
    pub fn from_config(cfg: &RefresherConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let client = Client::builder()
            .default_headers(headers)
            .user_agent(cfg.user_agent.clone())
            .connect_timeout(cfg.connect_timeout())
            .timeout(cfg.connect_timeout() + cfg.read_timeout())
            .build()
            .context("building joke http client")?;
        Ok(Self {
            url: cfg.api_url.clone(),
            client,
        })
    }

    fn parse_body(body: &str) -> Result<Option<Joke>> {
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }
        let wire: WireJoke = serde_json::from_str(trimmed)
            .with_context(|| format!("parse joke JSON failed, body: {trimmed}"))?;
        Ok(Some(wire.into()))
    }
}

#[async_trait]
impl JokeSource for HttpJokeSource {
    async fn fetch_joke(&self) -> Result<Option<Joke>> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("joke http get()")?
            .error_for_status()
            .context("joke provider non-2xx")?;
        let body = resp.text().await.context("joke http .text()")?;
        Self::parse_body(&body)
    }

    fn name(&self) -> &'static str {
        "icanhazdadjoke"
    }
}
