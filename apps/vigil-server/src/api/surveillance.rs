use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::info;

use vigil_core::{inspect, DebugError, StartError, StopError};

use super::resolve_world;
use crate::{responses, AppState};

pub async fn list_active(State(state): State<AppState>) -> impl IntoResponse {
    let targets = state.engine().list_active();
    Json(json!({
        "count": targets.len(),
        "max": state.engine().registry().max_targets(),
        "targets": targets,
    }))
}

pub async fn start(
    State(state): State<AppState>,
    Path((world, territory)): Path<(String, String)>,
) -> Response {
    let world = match resolve_world(&world) {
        Ok(world) => world,
        Err(resp) => return resp,
    };
    match state.engine().start(world, &territory) {
        Ok(()) => {
            info!(target: "vigil::http", world, territory = %territory, "surveillance requested");
            (
                StatusCode::CREATED,
                Json(json!({ "world": world, "territory": territory, "status": "started" })),
            )
                .into_response()
        }
        Err(err @ StartError::AlreadyActive) => {
            responses::problem(StatusCode::CONFLICT, "already_active", err.to_string())
        }
        Err(err @ StartError::AtCapacity { .. }) => {
            responses::problem(StatusCode::SERVICE_UNAVAILABLE, "at_capacity", err.to_string())
        }
    }
}

pub async fn stop(
    State(state): State<AppState>,
    Path((world, territory)): Path<(String, String)>,
) -> Response {
    let world = match resolve_world(&world) {
        Ok(world) => world,
        Err(resp) => return resp,
    };
    match state.engine().stop(world, &territory) {
        Ok(()) => {
            info!(target: "vigil::http", world, territory = %territory, "surveillance stop requested");
            Json(json!({ "world": world, "territory": territory, "status": "stopped" }))
                .into_response()
        }
        Err(err @ StopError::NotFound) => {
            responses::problem(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
    }
}

pub async fn debug(
    State(state): State<AppState>,
    Path((world, territory)): Path<(String, String)>,
) -> Response {
    let world = match resolve_world(&world) {
        Ok(world) => world,
        Err(resp) => return resp,
    };
    match inspect::target_debug(state.engine(), world, &territory).await {
        Ok(view) => Json(view).into_response(),
        Err(err @ DebugError::NotWatched) => {
            responses::problem(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        Err(err @ DebugError::RosterUnavailable) => {
            responses::problem(StatusCode::BAD_GATEWAY, "roster_unavailable", err.to_string())
        }
    }
}
