pub mod health;
pub mod surveillance;
pub mod worlds;

use axum::response::Response;
use vigil_core::world;

use crate::responses;

/// Resolve a path segment to a catalogue world name.
pub(crate) fn resolve_world(raw: &str) -> Result<&'static str, Response> {
    world::lookup(raw)
        .map(|found| found.name)
        .ok_or_else(|| responses::unknown_world(raw))
}
