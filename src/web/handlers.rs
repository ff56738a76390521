//! HTTP request handlers.

use super::AppState;
use crate::state::TargetUpdate;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// History entries returned when the caller does not ask for a limit.
const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Site not found".to_string(),
        }),
    )
        .into_response()
}

/// Interpret a user-supplied interval.
///
/// Numbers and numeric strings are accepted; anything else yields `None`.
pub fn parse_interval(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

// ============================================================================
// API: Sites
// ============================================================================

pub async fn handle_get_sites(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.monitor.list_targets())
}

#[derive(Debug, Default, Deserialize)]
pub struct SiteRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub check_interval: Option<Value>,
}

pub async fn handle_create_site(
    State(state): State<AppState>,
    Json(req): Json<SiteRequest>,
) -> Response {
    let url = match req.url {
        Some(url) if !url.trim().is_empty() => url,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "URL is required".to_string(),
                }),
            )
                .into_response()
        }
    };

    let interval = req.check_interval.as_ref().and_then(parse_interval);
    let target = state.monitor.add_target(url, req.name, interval).await;
    (StatusCode::CREATED, Json(target)).into_response()
}

pub async fn handle_get_site(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.monitor.get_target(id) {
        Some(target) => Json(target).into_response(),
        None => not_found(),
    }
}

pub async fn handle_update_site(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<SiteRequest>,
) -> Response {
    let update = TargetUpdate {
        address: req.url,
        name: req.name,
        check_interval: req.check_interval.as_ref().and_then(parse_interval),
    };

    match state.monitor.update_target(id, update).await {
        Some(target) => Json(target).into_response(),
        None => not_found(),
    }
}

pub async fn handle_delete_site(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    if state.monitor.delete_target(id).await {
        Json(serde_json::json!({ "message": "Site deleted successfully" })).into_response()
    } else {
        not_found()
    }
}

pub async fn handle_check_site(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.monitor.trigger_check(id).await {
        Some(target) => Json(target).into_response(),
        None => not_found(),
    }
}

// ============================================================================
// API: History
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn handle_get_history(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    if state.monitor.get_target(id).is_none() {
        return not_found();
    }
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Json(state.monitor.get_history(id, limit)).into_response()
}

#[derive(Debug, Serialize)]
pub struct UptimeResponse {
    pub id: u64,
    pub uptime: f64,
}

pub async fn handle_get_uptime(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.monitor.get_uptime(id) {
        Some(uptime) => Json(UptimeResponse { id, uptime }).into_response(),
        None => not_found(),
    }
}

// ============================================================================
// Health & Metrics
// ============================================================================

pub async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

pub async fn handle_metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to render metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
