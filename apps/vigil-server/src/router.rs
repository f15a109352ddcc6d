use std::mem;

use axum::{
    handler::Handler,
    routing::{get, post},
    Router,
};

use crate::{api, AppState};

pub(crate) struct RouterBuilder {
    router: Router<AppState>,
    endpoints: Vec<String>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            endpoints: Vec::new(),
        }
    }

    fn record(&mut self, method: &str, path: &'static str) {
        self.endpoints.push(format!("{method} {path}"));
    }

    pub fn route_get<H, T>(&mut self, path: &'static str, handler: H) -> &mut Self
    where
        H: Handler<T, AppState> + Clone + 'static,
        T: 'static,
    {
        self.record("GET", path);
        let router = mem::take(&mut self.router);
        self.router = router.route(path, get(handler));
        self
    }

    /// POST and DELETE share one path in this API, so they are registered
    /// together.
    pub fn route_post_delete<P, TP, D, TD>(
        &mut self,
        path: &'static str,
        on_post: P,
        on_delete: D,
    ) -> &mut Self
    where
        P: Handler<TP, AppState> + Clone + 'static,
        TP: 'static,
        D: Handler<TD, AppState> + Clone + 'static,
        TD: 'static,
    {
        self.record("POST", path);
        self.record("DELETE", path);
        let router = mem::take(&mut self.router);
        self.router = router.route(path, post(on_post).delete(on_delete));
        self
    }

    pub fn build(self) -> (Router<AppState>, Vec<String>) {
        (self.router, self.endpoints)
    }
}

pub(crate) mod paths {
    pub const ROOT: &str = "/";
    pub const HEALTH: &str = "/health";
    pub const HEALTHZ: &str = "/healthz";
    pub const WORLDS: &str = "/worlds";
    pub const WORLD_ONLINE: &str = "/worlds/{world}/online";
    pub const WORLD_TERRITORIES: &str = "/worlds/{world}/territories";
    pub const TERRITORY_MEMBERS: &str = "/worlds/{world}/territories/{territory}/members";
    pub const TERRITORY_SPREAD: &str = "/worlds/{world}/territories/{territory}/spread";
    pub const SURVEILLANCE: &str = "/surveillance";
    pub const SURVEILLANCE_TARGET: &str = "/surveillance/{world}/{territory}";
    pub const SURVEILLANCE_DEBUG: &str = "/surveillance/{world}/{territory}/debug";
}

pub(crate) fn build() -> (Router<AppState>, Vec<String>) {
    let mut builder = RouterBuilder::new();
    builder
        .route_get(paths::ROOT, api::health::alive)
        .route_get(paths::HEALTH, api::health::alive)
        .route_get(paths::HEALTHZ, api::health::healthz)
        .route_get(paths::WORLDS, api::worlds::list_worlds)
        .route_get(paths::WORLD_ONLINE, api::worlds::online)
        .route_get(paths::WORLD_TERRITORIES, api::worlds::territories)
        .route_get(paths::TERRITORY_MEMBERS, api::worlds::members)
        .route_get(paths::TERRITORY_SPREAD, api::worlds::spread)
        .route_get(paths::SURVEILLANCE, api::surveillance::list_active)
        .route_post_delete(
            paths::SURVEILLANCE_TARGET,
            api::surveillance::start,
            api::surveillance::stop,
        )
        .route_get(paths::SURVEILLANCE_DEBUG, api::surveillance::debug);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{state, StaticApi};
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn app(state: AppState) -> Router {
        let (routes, _) = build();
        routes.with_state(state)
    }

    async fn call(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        let resp = app.clone().oneshot(req).await.expect("response");
        let status = resp.status();
        let bytes = resp.into_body().collect().await.expect("body").to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn nippon() -> StaticApi {
        StaticApi::default()
            .with_territory("lime", "nippon", "Nippon", &["*Alpha", "+Bravo", "Charlie"])
            .with_territory("lime", "chile", "Chile", &["Delta"])
            .with_online("lime", &["Alpha", "Zulu"])
            .with_online("jade", &["Bravo"])
    }

    #[tokio::test]
    async fn liveness_answers_on_root() {
        let app = app(state(StaticApi::default(), 4));
        let req = Request::builder()
            .uri(paths::ROOT)
            .body(Body::empty())
            .expect("request");
        let resp = app.clone().oneshot(req).await.expect("response");
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.expect("body").to_bytes();
        assert_eq!(&bytes[..], "✅".as_bytes());

        let (status, body) = call(&app, Method::GET, paths::HEALTHZ).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["active_targets"], 0);
    }

    #[tokio::test]
    async fn world_lookups() {
        let app = app(state(nippon(), 4));

        let (status, body) = call(&app, Method::GET, paths::WORLDS).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["worlds"].as_array().map(Vec::len), Some(11));

        let (status, body) = call(&app, Method::GET, "/worlds/LIME/online").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["world"], "lime");
        assert_eq!(body["count"], 2);

        let (status, body) = call(&app, Method::GET, "/worlds/red/online").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "presence_unavailable");

        let (status, body) = call(&app, Method::GET, "/worlds/atlantis/online").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "unknown_world");

        let (status, body) = call(&app, Method::GET, "/worlds/lime/territories?q=NIP").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["territories"], serde_json::json!(["nippon"]));
    }

    #[tokio::test]
    async fn members_and_spread() {
        let app = app(state(nippon(), 4));

        let (status, body) =
            call(&app, Method::GET, "/worlds/lime/territories/nippon/members").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["display_name"], "Nippon");
        assert_eq!(body["members"], serde_json::json!(["Alpha", "Bravo", "Charlie"]));

        let (status, body) =
            call(&app, Method::GET, "/worlds/lime/territories/atlantis/members").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "territory_not_found");

        let (status, body) =
            call(&app, Method::GET, "/worlds/lime/territories/nippon/spread").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["elsewhere"]["jade"], serde_json::json!(["Bravo"]));
        assert!(body["elsewhere"].get("lime").is_none());
    }

    #[tokio::test]
    async fn surveillance_lifecycle() {
        let state = state(nippon(), 1);
        let engine = state.engine().clone();
        let app = app(state);

        let (status, _) = call(&app, Method::POST, "/surveillance/lime/nippon").await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(&app, Method::POST, "/surveillance/lime/nippon").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "already_active");

        let (status, body) = call(&app, Method::POST, "/surveillance/lime/chile").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "at_capacity");

        let (status, _) = call(&app, Method::POST, "/surveillance/atlantis/chile").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, Method::GET, paths::SURVEILLANCE).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["max"], 1);
        assert_eq!(body["targets"][0]["territory"], "nippon");

        let (status, body) = call(&app, Method::GET, "/surveillance/lime/nippon/debug").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["connected"], serde_json::json!(["Alpha"]));
        assert!(body.get("verified").is_none());

        let (status, _) = call(&app, Method::DELETE, "/surveillance/lime/nippon").await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = call(&app, Method::DELETE, "/surveillance/lime/nippon").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");

        let (status, _) = call(&app, Method::GET, "/surveillance/lime/nippon/debug").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        engine.shutdown(Duration::from_secs(3)).await;
    }

    #[test]
    fn every_route_is_recorded() {
        let (_, endpoints) = build();
        assert!(endpoints.contains(&"GET /healthz".to_string()));
        assert!(endpoints.contains(&"POST /surveillance/{world}/{territory}".to_string()));
        assert!(endpoints.contains(&"DELETE /surveillance/{world}/{territory}".to_string()));
        assert_eq!(endpoints.len(), 12);
    }
}
