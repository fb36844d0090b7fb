// src/config/refresher.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::scheduler::{MAX_INTERVAL_MS, MIN_INTERVAL_MS};

const ENV_PATH: &str = "REFRESHER_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/refresher.toml";

fn default_api_url() -> String {
    "https://icanhazdadjoke.com/".to_string()
}
fn default_user_agent() -> String {
    "JokeGeneratorApp/1.0".to_string()
}
fn default_timeout_ms() -> u64 {
    5_000
}
fn default_refresh_rate_ms() -> u64 {
    2_000
}
fn default_true() -> bool {
    true
}
fn default_topic() -> String {
    "/topic/jokes".to_string()
}
fn default_broadcast_capacity() -> usize {
    256
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefresherConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_refresh_rate_ms")]
    pub refresh_rate_ms: u64,
    #[serde(default = "default_true")]
    pub auto_refresh_enabled: bool,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub metrics_enabled: bool,
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            connect_timeout_ms: default_timeout_ms(),
            read_timeout_ms: default_timeout_ms(),
            refresh_rate_ms: default_refresh_rate_ms(),
            auto_refresh_enabled: true,
            topic: default_topic(),
            broadcast_capacity: default_broadcast_capacity(),
            host: default_host(),
            port: default_port(),
            metrics_enabled: false,
        }
    }
}

impl RefresherConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: RefresherConfig = toml::from_str(s).context("parsing refresher config toml")?;
        cfg.validated()
    }

    pub fn server_addr(&self) -> Result<SocketAddr> {
        let ip = IpAddr::from_str(&self.host)
            .map_err(|e| anyhow!("Invalid host address '{}': {e}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Apply `JOKE_API_URL`, `REFRESH_RATE_MS`, `AUTO_REFRESH_ENABLED`,
    /// `HOST`, `PORT` and `METRICS_ENABLED` on top of the file values.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(v) = std::env::var("JOKE_API_URL") {
            self.api_url = v;
        }
        if let Ok(v) = std::env::var("REFRESH_RATE_MS") {
            self.refresh_rate_ms = v
                .trim()
                .parse()
                .map_err(|e| anyhow!("Invalid REFRESH_RATE_MS '{v}': {e}"))?;
        }
        if let Ok(v) = std::env::var("AUTO_REFRESH_ENABLED") {
            self.auto_refresh_enabled = parse_flag(&v)?;
        }
        if let Ok(v) = std::env::var("HOST") {
            self.host = v;
        }
        if let Ok(v) = std::env::var("PORT") {
            self.port = v
                .trim()
                .parse()
                .map_err(|e| anyhow!("Invalid port '{v}': {e}"))?;
        }
        if let Ok(v) = std::env::var("METRICS_ENABLED") {
            self.metrics_enabled = parse_flag(&v)?;
        }
        self.validated()
    }

    fn validated(self) -> Result<Self> {
        if !(MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&self.refresh_rate_ms) {
            bail!(
                "refresh_rate_ms must be within {MIN_INTERVAL_MS}..={MAX_INTERVAL_MS}, got {}",
                self.refresh_rate_ms
            );
        }
        if self.broadcast_capacity == 0 {
            bail!("broadcast_capacity must be positive");
        }
        Ok(self)
    }
}

fn parse_flag(v: &str) -> Result<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("Invalid boolean flag '{other}'")),
    }
}

/// Load config from an explicit TOML path, then apply env overrides.
pub fn load_from(path: &Path) -> Result<RefresherConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading refresher config from {}", path.display()))?;
    RefresherConfig::from_toml_str(&content)?.with_env_overrides()
}

/// Load config using env var + fallbacks:
/// 1) $REFRESHER_CONFIG_PATH
/// 2) config/refresher.toml
/// 3) built-in defaults
///
/// Env overrides are applied in every case.
pub fn load_default() -> Result<RefresherConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        } else {
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_PATH);
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    RefresherConfig::default().with_env_overrides()
}
