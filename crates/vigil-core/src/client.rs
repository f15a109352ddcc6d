use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::api::GameApi;
use crate::cache::TtlCache;
use crate::rank::Rank;
use crate::territory::{Diplomacy, Roster};

/// Failure-tolerant facade over a [`GameApi`].
///
/// Every operation logs its own failures and degrades to an "unknown" value,
/// so callers never see transport errors. Territory lists and player ranks are
/// served through TTL caches shared by every supervisor.
pub struct GameClient {
    api: Arc<dyn GameApi>,
    territories: TtlCache<String, Vec<String>>,
    ranks: TtlCache<(String, String), Option<Rank>>,
}

impl GameClient {
    pub fn new(api: Arc<dyn GameApi>, territory_ttl: Duration, rank_ttl: Duration) -> Self {
        Self {
            api,
            territories: TtlCache::new(territory_ttl),
            ranks: TtlCache::new(rank_ttl),
        }
    }

    /// Claimed territory keys of `world`; empty on any failure.
    pub async fn list_territories(&self, world: &str) -> Vec<String> {
        let api = &self.api;
        match self
            .territories
            .get_or_try_fetch(world.to_string(), || api.territories(world))
            .await
        {
            Ok(list) => list,
            Err(err) => {
                warn!(
                    target: "vigil::api",
                    world,
                    error = %err,
                    "territory list fetch failed"
                );
                Vec::new()
            }
        }
    }

    /// Current roster, or `None` when the territory could not be resolved.
    pub async fn roster(&self, world: &str, territory: &str) -> Option<Roster> {
        match self.api.territory(world, territory).await {
            Ok(info) => {
                let roster = Roster::from_info(territory, &info);
                if roster.is_none() {
                    debug!(target: "vigil::api", world, territory, "territory payload has no members");
                }
                roster
            }
            Err(err) => {
                warn!(
                    target: "vigil::api",
                    world,
                    territory,
                    error = %err,
                    "roster fetch failed"
                );
                None
            }
        }
    }

    pub async fn diplomacy(&self, world: &str, territory: &str) -> Option<Diplomacy> {
        match self.api.territory(world, territory).await {
            Ok(info) => Some(Diplomacy::from(&info)),
            Err(err) => {
                warn!(
                    target: "vigil::api",
                    world,
                    territory,
                    error = %err,
                    "diplomacy fetch failed"
                );
                None
            }
        }
    }

    /// Players connected to `world`. `None` means the presence feed could not
    /// be read, which is distinct from nobody being online.
    pub async fn presence(&self, world: &str) -> Option<Vec<String>> {
        match self.api.online_players(world).await {
            Ok(players) => Some(players),
            Err(err) => {
                warn!(
                    target: "vigil::api",
                    world,
                    error = %err,
                    "presence fetch failed"
                );
                None
            }
        }
    }

    /// Rank of `player` on `world`, `None` when unknown or unreachable.
    pub async fn rank(&self, player: &str, world: &str) -> Option<Rank> {
        let api = &self.api;
        let key = (player.to_string(), world.to_string());
        match self
            .ranks
            .get_or_try_fetch(key, || api.player_rank(player, world))
            .await
        {
            Ok(rank) => rank,
            Err(err) => {
                debug!(
                    target: "vigil::api",
                    world,
                    player,
                    error = %err,
                    "rank lookup failed"
                );
                None
            }
        }
    }
}
