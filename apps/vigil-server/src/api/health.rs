use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

pub async fn alive() -> &'static str {
    "✅"
}

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "uptime_secs": state.uptime_secs(),
        "active_targets": state.engine().active_count(),
        "endpoints": state.endpoints().len(),
    }))
}
