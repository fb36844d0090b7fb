use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::control::{RateSpec, RefreshControl};
use crate::error::RefreshError;
use crate::model::Joke;

#[derive(Clone)]
pub struct AppState {
    pub control: RefreshControl,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/jokes", get(list_jokes).delete(clear_history))
        .route("/api/jokes/refresh", post(refresh_joke))
        .route("/api/jokes/{id}", get(get_joke))
        .route("/api/stats", get(stats))
        .route("/api/autorefresh/status", get(autorefresh_status))
        .route("/api/autorefresh/toggle", post(autorefresh_toggle))
        .route("/api/autorefresh/enable", post(autorefresh_enable))
        .route("/api/autorefresh/disable", post(autorefresh_disable))
        .route("/api/refresh-rate", get(get_refresh_rate).post(set_refresh_rate))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn list_jokes(State(state): State<AppState>) -> Json<Vec<Joke>> {
    Json(state.control.list_all())
}

async fn get_joke(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.control.get_by_id(&id) {
        Some(joke) => Json(joke).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn clear_history(State(state): State<AppState>) -> Json<Value> {
    state.control.clear();
    Json(json!({ "message": "Joke history cleared successfully" }))
}

async fn refresh_joke(State(state): State<AppState>) -> Json<Value> {
    match state.control.fetch_now().await {
        Some(joke) => Json(json!({
            "message": "Joke refreshed successfully",
            "jokeId": joke.id,
        })),
        None => Json(json!({ "message": "Failed to refresh joke" })),
    }
}

async fn stats(State(state): State<AppState>) -> Json<Value> {
    let s = state.control.stats();
    Json(json!({
        "totalJokes": s.count,
        "lastUpdated": chrono::Utc::now().timestamp_millis(),
        "autoRefreshEnabled": s.auto_refresh_enabled,
        "refreshRate": s.interval_ms,
    }))
}

async fn autorefresh_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "enabled": state.control.is_enabled() }))
}

fn enabled_reply(enabled: bool) -> Json<Value> {
    Json(json!({
        "enabled": enabled,
        "message": format!("Auto-refresh {}", if enabled { "enabled" } else { "disabled" }),
    }))
}

async fn autorefresh_toggle(State(state): State<AppState>) -> Json<Value> {
    enabled_reply(state.control.toggle())
}

async fn autorefresh_enable(State(state): State<AppState>) -> Json<Value> {
    enabled_reply(state.control.set_enabled(true))
}

async fn autorefresh_disable(State(state): State<AppState>) -> Json<Value> {
    enabled_reply(state.control.set_enabled(false))
}

async fn get_refresh_rate(State(state): State<AppState>) -> Json<Value> {
    let v = state.control.interval();
    Json(json!({
        "refreshRate": v.interval_ms,
        "refreshRateSeconds": v.interval_seconds,
    }))
}

#[derive(serde::Deserialize)]
struct RefreshRateReq {
    #[serde(rename = "refreshRate")]
    refresh_rate: Option<Value>,
}

async fn set_refresh_rate(
    State(state): State<AppState>,
    Json(body): Json<RefreshRateReq>,
) -> Result<Json<Value>, RefreshError> {
    let raw: RateSpec = body
        .refresh_rate
        .and_then(|v| serde_json::from_value(v).ok())
        .ok_or_else(|| RefreshError::invalid("Invalid refresh rate format"))?;
    let v = state.control.set_interval(&raw).inspect_err(|e| {
        tracing::warn!(target: "api", error = %e, "rejected refresh rate");
    })?;
    Ok(Json(json!({
        "success": true,
        "refreshRate": v.interval_ms,
        "refreshRateSeconds": v.interval_seconds,
        "message": "Refresh rate updated successfully",
    })))
}
