use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header::ACCEPT, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use vigil_core::{ApiError, GameApi, Rank, TerritoryInfo};

/// Per-endpoint request timeouts.
#[derive(Clone, Copy, Debug)]
pub struct Timeouts {
    pub territory: Duration,
    pub presence: Duration,
    pub rank: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            territory: Duration::from_secs(10),
            presence: Duration::from_secs(5),
            rank: Duration::from_secs(5),
        }
    }
}

#[derive(Deserialize)]
struct TerritoryList {
    #[serde(default)]
    claimed: Vec<ClaimedTerritory>,
}

#[derive(Deserialize)]
struct ClaimedTerritory {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct WorldMap {
    #[serde(default)]
    players: Vec<MapPlayer>,
}

#[derive(Deserialize)]
struct MapPlayer {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct PlayerProfile {
    #[serde(default)]
    servers: HashMap<String, PlayerServer>,
}

#[derive(Deserialize)]
struct PlayerServer {
    #[serde(default)]
    country_rank: Option<String>,
}

fn map_err(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Transport(err.to_string())
    }
}

/// reqwest-backed transport for the public game API and the per-world live
/// map feeds.
pub struct HttpGameApi {
    http: reqwest::Client,
    base: Url,
    presence_url: String,
    api_key: Option<String>,
    timeouts: Timeouts,
}

impl HttpGameApi {
    pub fn new(
        http: reqwest::Client,
        base: &str,
        presence_url: impl Into<String>,
        api_key: Option<String>,
    ) -> anyhow::Result<Self> {
        let base = Url::parse(base).with_context(|| format!("invalid api base {base:?}"))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("api base {base} cannot carry a path");
        }
        Ok(Self {
            http,
            base,
            presence_url: presence_url.into(),
            api_key,
            timeouts: Timeouts::default(),
        })
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("invalid api base {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `url` and decode its JSON body. The game endpoints answer 500 with
    /// a valid body on success, so 500 is accepted when the body decodes.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        timeout: Duration,
        authorized: bool,
    ) -> Result<T, ApiError> {
        let mut request = self
            .http
            .get(url)
            .timeout(timeout)
            .header(ACCEPT, "application/json");
        if authorized {
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }
        }
        let response = request.send().await.map_err(map_err)?;
        let status = response.status();
        if !status.is_success() && status != StatusCode::INTERNAL_SERVER_ERROR {
            return Err(ApiError::Status(status.as_u16()));
        }
        let body = response.bytes().await.map_err(map_err)?;
        serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn territories(&self, world: &str) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint(&["country", "list", world])?;
        let list: TerritoryList = self.get_json(url, self.timeouts.territory, true).await?;
        Ok(list
            .claimed
            .into_iter()
            .filter_map(|entry| entry.name)
            .filter(|name| !name.is_empty())
            .collect())
    }

    async fn territory(&self, world: &str, territory: &str) -> Result<TerritoryInfo, ApiError> {
        let url = self.endpoint(&["country", world, territory])?;
        self.get_json(url, self.timeouts.territory, true).await
    }

    async fn online_players(&self, world: &str) -> Result<Vec<String>, ApiError> {
        if !vigil_core::world::is_known(world) {
            return Err(ApiError::UnknownWorld(world.to_string()));
        }
        let raw = self.presence_url.replace("{world}", world);
        let url = Url::parse(&raw).map_err(|err| ApiError::Transport(err.to_string()))?;
        let map: WorldMap = self.get_json(url, self.timeouts.presence, false).await?;
        Ok(map.players.into_iter().filter_map(|p| p.name).collect())
    }

    async fn player_rank(&self, player: &str, world: &str) -> Result<Option<Rank>, ApiError> {
        let url = self.endpoint(&["user", player])?;
        let profile: PlayerProfile = self.get_json(url, self.timeouts.rank, true).await?;
        Ok(profile
            .servers
            .get(world)
            .and_then(|server| server.country_rank.as_deref())
            .map(Rank::from_slug))
    }
}
