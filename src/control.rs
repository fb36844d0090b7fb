// src/control.rs
//! Operations the HTTP layer calls. Everything delegates to the [`Scheduler`],
//! which owns the history and the schedule state.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RefreshError, Result};
use crate::model::Joke;
use crate::scheduler::Scheduler;

/// Raw refresh-rate input: a JSON number, or a string such as `"2500"`,
/// `"2500ms"` or `"2.5s"`. Plain values are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RateSpec {
    Number(serde_json::Number),
    Text(String),
}

impl From<u64> for RateSpec {
    fn from(ms: u64) -> Self {
        RateSpec::Number(ms.into())
    }
}

impl From<&str> for RateSpec {
    fn from(s: &str) -> Self {
        RateSpec::Text(s.to_string())
    }
}

impl RateSpec {
    /// Milliseconds, before range validation.
    pub fn to_millis(&self) -> Result<u64> {
        match self {
            RateSpec::Number(n) => {
                if let Some(ms) = n.as_u64() {
                    return Ok(ms);
                }
                let v = n.as_f64().unwrap_or(f64::NAN);
                finite_millis(v, 1.0, &n.to_string())
            }
            RateSpec::Text(raw) => parse_rate_str(raw),
        }
    }
}

fn parse_rate_str(raw: &str) -> Result<u64> {
    static RE_RATE: OnceCell<Regex> = OnceCell::new();
    let re = RE_RATE.get_or_init(|| {
        Regex::new(r"(?i)^\s*([0-9]+(?:\.[0-9]+)?)\s*(ms|s)?\s*$").expect("static rate regex")
    });

    if raw.trim().is_empty() {
        return Err(RefreshError::invalid("Refresh rate must not be empty"));
    }
    let caps = re.captures(raw).ok_or_else(|| {
        RefreshError::invalid(format!(
            "Invalid refresh rate format: '{raw}' (expected milliseconds, or seconds with an 's' suffix)"
        ))
    })?;
    let unit = caps
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default();
    let factor = if unit == "s" { 1000.0 } else { 1.0 };

    let num = &caps[1];
    if factor == 1.0 {
        if let Ok(ms) = num.parse::<u64>() {
            return Ok(ms);
        }
    }
    let v: f64 = num
        .parse()
        .map_err(|_| RefreshError::invalid(format!("Invalid refresh rate number: '{num}'")))?;
    finite_millis(v, factor, raw)
}

fn finite_millis(v: f64, factor: f64, raw: &str) -> Result<u64> {
    let ms = v * factor;
    if !ms.is_finite() || ms < 0.0 {
        return Err(RefreshError::invalid(format!(
            "Invalid refresh rate: '{raw}' must be a non-negative number"
        )));
    }
    // Truncates; saturates at u64::MAX, which range validation then rejects.
    Ok(ms as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntervalView {
    pub interval_ms: u64,
    pub interval_seconds: f64,
}

impl IntervalView {
    fn of(ms: u64) -> Self {
        Self {
            interval_ms: ms,
            interval_seconds: ms as f64 / 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub count: usize,
    pub auto_refresh_enabled: bool,
    pub interval_ms: u64,
}

#[derive(Clone)]
pub struct RefreshControl {
    scheduler: Arc<Scheduler>,
}

impl RefreshControl {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn count(&self) -> usize {
        self.scheduler.history().count()
    }

    pub fn list_all(&self) -> Vec<Joke> {
        self.scheduler.history().list()
    }

    pub fn get_by_id(&self, id: &str) -> Option<Joke> {
        self.scheduler.history().get(id)
    }

    pub fn clear(&self) {
        self.scheduler.history().clear();
        tracing::info!(target: "control", "joke history cleared");
    }

    pub fn is_enabled(&self) -> bool {
        self.scheduler.is_enabled()
    }

    pub fn set_enabled(&self, enabled: bool) -> bool {
        self.scheduler.set_enabled(enabled)
    }

    pub fn toggle(&self) -> bool {
        self.scheduler.toggle()
    }

    pub fn interval(&self) -> IntervalView {
        IntervalView::of(self.scheduler.interval_ms())
    }

    pub fn set_interval(&self, raw: &RateSpec) -> Result<IntervalView> {
        let ms = raw.to_millis()?;
        let ms = self.scheduler.set_interval_ms(ms)?;
        Ok(IntervalView::of(ms))
    }

    pub async fn fetch_now(&self) -> Option<Joke> {
        self.scheduler.fetch_now().await
    }

    pub fn stats(&self) -> Stats {
        Stats {
            count: self.count(),
            auto_refresh_enabled: self.is_enabled(),
            interval_ms: self.scheduler.interval_ms(),
        }
    }
}
