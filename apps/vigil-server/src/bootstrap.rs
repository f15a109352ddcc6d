use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use vigil_core::notify::LogNotifier;
use vigil_core::{
    Cooldowns, EnemyTracker, GameClient, Notifier, SurveillanceEngine, TrackerOptions,
    WatchConfig, WatchContext,
};

use crate::config::ServerConfig;
use crate::game_api::HttpGameApi;
use crate::keepalive::KeepAlive;
use crate::notifier::WebhookNotifier;
use crate::tasks::{spawn_supervised, TaskManager};
use crate::{http_client, router, AppState};

pub(crate) struct BootstrapOutput {
    pub app: Router,
    pub engine: Arc<SurveillanceEngine>,
    pub cancel: CancellationToken,
    pub background_tasks: TaskManager,
}

/// Wire the engine and its collaborators. Must run inside the tokio runtime
/// since background tasks are spawned here.
pub(crate) fn build(server: &ServerConfig, watch: &WatchConfig) -> anyhow::Result<BootstrapOutput> {
    let http = http_client::client()?;
    let api = HttpGameApi::new(
        http.clone(),
        &server.api_base,
        server.presence_url.clone(),
        server.api_key.clone(),
    )
    .context("building game api transport")?;
    if server.api_key.is_none() {
        info!(target: "vigil::api", "NG_API_KEY not set; requests are sent unauthenticated");
    }

    let notifier: Arc<dyn Notifier> = match &server.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(http.clone(), url.clone())),
        None => {
            info!(target: "vigil::notify", "VIGIL_WEBHOOK_URL not set; notices are logged only");
            Arc::new(LogNotifier)
        }
    };

    let ctx = Arc::new(WatchContext {
        client: GameClient::new(Arc::new(api), watch.territory_ttl(), watch.rank_ttl()),
        notifier,
        cooldowns: Cooldowns::new(watch.notify_cooldown()),
        options: watch.supervisor_options(),
    });
    let engine = Arc::new(SurveillanceEngine::new(ctx, watch.max_targets));
    let cancel = CancellationToken::new();
    let mut background_tasks = TaskManager::new();

    if watch.enemy_tracking {
        let options = TrackerOptions::from_config(watch);
        info!(
            target: "vigil::enemies",
            world = %options.home_world,
            territory = %options.home_territory,
            "enemy tracking enabled"
        );
        let engine = engine.clone();
        let cancel = cancel.clone();
        background_tasks.push(spawn_supervised("enemy_tracker", move || {
            EnemyTracker::new(engine.clone(), options.clone()).run(cancel.clone())
        }));
    }

    if let Some(url) = &server.keepalive_url {
        let keepalive = KeepAlive::new(url);
        background_tasks.push_handle(
            "keepalive",
            tokio::spawn(keepalive.run(http, cancel.clone())),
        );
    }

    let (routes, endpoints) = router::build();
    info!(target: "vigil::http", endpoints = endpoints.len(), "routes registered");
    let state = AppState::new(engine.clone()).with_endpoints(endpoints);
    let app = routes.with_state(state).layer(TraceLayer::new_for_http());

    Ok(BootstrapOutput {
        app,
        engine,
        cancel,
        background_tasks,
    })
}
