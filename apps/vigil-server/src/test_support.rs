//! Fixed-data game API for router tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use vigil_core::notify::LogNotifier;
use vigil_core::{
    ApiError, Cooldowns, GameApi, GameClient, PresenceUnknown, Rank, SurveillanceEngine,
    SupervisorOptions, TerritoryInfo, WatchContext,
};

use crate::AppState;

#[derive(Default)]
pub(crate) struct StaticApi {
    pub lists: HashMap<String, Vec<String>>,
    pub territories: HashMap<(String, String), TerritoryInfo>,
    pub online: HashMap<String, Vec<String>>,
}

impl StaticApi {
    pub fn with_territory(
        mut self,
        world: &str,
        territory: &str,
        name: &str,
        members: &[&str],
    ) -> Self {
        let info = TerritoryInfo {
            name: Some(name.to_string()),
            members: members.iter().map(|m| m.to_string()).collect(),
            ..TerritoryInfo::default()
        };
        self.territories
            .insert((world.to_string(), territory.to_string()), info);
        self.lists
            .entry(world.to_string())
            .or_default()
            .push(territory.to_string());
        self
    }

    pub fn with_online(mut self, world: &str, players: &[&str]) -> Self {
        self.online.insert(
            world.to_string(),
            players.iter().map(|p| p.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl GameApi for StaticApi {
    async fn territories(&self, world: &str) -> Result<Vec<String>, ApiError> {
        Ok(self.lists.get(world).cloned().unwrap_or_default())
    }

    async fn territory(&self, world: &str, territory: &str) -> Result<TerritoryInfo, ApiError> {
        self.territories
            .get(&(world.to_string(), territory.to_string()))
            .cloned()
            .ok_or(ApiError::Status(404))
    }

    async fn online_players(&self, world: &str) -> Result<Vec<String>, ApiError> {
        self.online
            .get(world)
            .cloned()
            .ok_or(ApiError::Status(503))
    }

    async fn player_rank(&self, _player: &str, _world: &str) -> Result<Option<Rank>, ApiError> {
        Ok(Some(Rank::Member))
    }
}

pub(crate) fn options() -> SupervisorOptions {
    SupervisorOptions {
        roster_refresh: Duration::from_millis(50),
        presence_interval: Duration::from_millis(10),
        error_backoff: Duration::from_millis(10),
        max_consecutive_errors: 1_000,
        missing_roster_limit: 1_000,
        verify_roster: true,
        presence_unknown: PresenceUnknown::Skip,
    }
}

pub(crate) fn state(api: StaticApi, max_targets: usize) -> AppState {
    let ctx = Arc::new(WatchContext {
        client: GameClient::new(Arc::new(api), Duration::from_secs(900), Duration::from_secs(60)),
        notifier: Arc::new(LogNotifier),
        cooldowns: Cooldowns::new(Duration::from_secs(300)),
        options: options(),
    });
    AppState::new(Arc::new(SurveillanceEngine::new(ctx, max_targets)))
}
