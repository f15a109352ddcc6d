use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// RFC 7807 problem body. `code` is a stable machine-readable slug.
pub fn problem(status: StatusCode, code: &str, detail: impl Into<String>) -> Response {
    let title = status.canonical_reason().unwrap_or("Error");
    let body = json!({
        "type": "about:blank",
        "title": title,
        "status": status.as_u16(),
        "code": code,
        "detail": detail.into(),
    });
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/problem+json"),
    );
    response
}

pub fn unknown_world(world: &str) -> Response {
    problem(
        StatusCode::BAD_REQUEST,
        "unknown_world",
        format!("unknown world {world:?}"),
    )
}

pub fn territory_not_found(world: &str, territory: &str) -> Response {
    problem(
        StatusCode::NOT_FOUND,
        "territory_not_found",
        format!("territory {territory} not found on {world}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_carries_status_and_media_type() {
        let response = problem(StatusCode::CONFLICT, "already_active", "busy");
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).map(|v| v.as_bytes()),
            Some(&b"application/problem+json"[..])
        );
    }
}
