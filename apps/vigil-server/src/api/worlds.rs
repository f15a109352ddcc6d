use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use vigil_core::{inspect, world::WORLDS};

use super::resolve_world;
use crate::{responses, AppState};

pub async fn list_worlds() -> impl IntoResponse {
    Json(json!({ "worlds": WORLDS }))
}

pub async fn online(State(state): State<AppState>, Path(world): Path<String>) -> Response {
    let world = match resolve_world(&world) {
        Ok(world) => world,
        Err(resp) => return resp,
    };
    match state.client().presence(world).await {
        Some(players) => Json(json!({
            "world": world,
            "count": players.len(),
            "players": players,
        }))
        .into_response(),
        None => responses::problem(
            StatusCode::BAD_GATEWAY,
            "presence_unavailable",
            format!("online players of {world} are unknown right now"),
        ),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn territories(
    State(state): State<AppState>,
    Path(world): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let world = match resolve_world(&world) {
        Ok(world) => world,
        Err(resp) => return resp,
    };
    let matches = inspect::search_territories(state.client(), world, &query.q).await;
    Json(json!({ "world": world, "territories": matches })).into_response()
}

pub async fn members(
    State(state): State<AppState>,
    Path((world, territory)): Path<(String, String)>,
) -> Response {
    let world = match resolve_world(&world) {
        Ok(world) => world,
        Err(resp) => return resp,
    };
    match state.client().roster(world, &territory).await {
        Some(roster) => Json(json!({
            "world": world,
            "territory": territory,
            "display_name": roster.display_name,
            "count": roster.members.len(),
            "members": roster.members,
        }))
        .into_response(),
        None => responses::territory_not_found(world, &territory),
    }
}

pub async fn spread(
    State(state): State<AppState>,
    Path((world, territory)): Path<(String, String)>,
) -> Response {
    let world = match resolve_world(&world) {
        Ok(world) => world,
        Err(resp) => return resp,
    };
    match inspect::spread(state.client(), world, &territory).await {
        Some(spread) => Json(spread).into_response(),
        None => responses::territory_not_found(world, &territory),
    }
}
