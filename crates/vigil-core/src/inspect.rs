//! Read-only lookups backing the operator commands.

use std::collections::BTreeMap;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::debug;

use crate::assault::{connected_members, MIN_CONNECTED};
use crate::client::GameClient;
use crate::engine::SurveillanceEngine;
use crate::world::WORLDS;

/// Most suggestions returned by [`search_territories`].
pub const SEARCH_LIMIT: usize = 25;

/// Roster members currently connected to other worlds.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Spread {
    pub world: String,
    pub territory: String,
    pub display_name: String,
    pub members: usize,
    pub elsewhere: BTreeMap<String, Vec<String>>,
}

/// Where the members of `territory` are playing right now, excluding its own
/// world. `None` when the roster is unknown. Worlds whose presence feed fails
/// are left out.
pub async fn spread(client: &GameClient, world: &str, territory: &str) -> Option<Spread> {
    let roster = client.roster(world, territory).await?;
    let lookups = WORLDS
        .iter()
        .filter(|other| other.name != world)
        .map(move |other| async move { (other.name, client.presence(other.name).await) });

    let mut elsewhere = BTreeMap::new();
    for (name, online) in join_all(lookups).await {
        let Some(online) = online else {
            debug!(target: "vigil::inspect", world = name, "presence unavailable; skipped");
            continue;
        };
        let found = connected_members(&roster.members, &online);
        if !found.is_empty() {
            elsewhere.insert(name.to_string(), found);
        }
    }
    Some(Spread {
        world: world.to_string(),
        territory: territory.to_string(),
        display_name: roster.display_name,
        members: roster.members.len(),
        elsewhere,
    })
}

/// Territory keys of `world` containing `query`, case-insensitively.
pub async fn search_territories(client: &GameClient, world: &str, query: &str) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    client
        .list_territories(world)
        .await
        .into_iter()
        .filter(|key| key.to_lowercase().contains(&needle))
        .take(SEARCH_LIMIT)
        .collect()
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DebugError {
    #[error("no active surveillance")]
    NotWatched,
    #[error("territory data unavailable")]
    RosterUnavailable,
}

/// Live view of what a supervisor would evaluate right now.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TargetDebug {
    pub world: String,
    pub territory: String,
    pub display_name: String,
    pub assault_possible: bool,
    pub members: Vec<String>,
    /// Players on the world, `None` when the presence feed is down.
    pub online: Option<usize>,
    pub connected: Vec<String>,
    /// Present only when enough members are connected to matter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<Vec<String>>,
}

pub async fn target_debug(
    engine: &SurveillanceEngine,
    world: &str,
    territory: &str,
) -> Result<TargetDebug, DebugError> {
    let status = engine
        .list_active()
        .into_iter()
        .find(|target| target.world == world && target.territory == territory)
        .ok_or(DebugError::NotWatched)?;
    let client = &engine.context().client;
    let roster = client
        .roster(world, territory)
        .await
        .ok_or(DebugError::RosterUnavailable)?;
    let presence = client.presence(world).await;
    let connected = presence
        .as_deref()
        .map(|online| connected_members(&roster.members, online))
        .unwrap_or_default();

    let verified = if connected.len() >= MIN_CONNECTED {
        let fresh = client.roster(world, territory).await;
        Some(match fresh {
            Some(fresh) => connected
                .iter()
                .filter(|player| fresh.contains(player))
                .cloned()
                .collect(),
            None => Vec::new(),
        })
    } else {
        None
    };

    Ok(TargetDebug {
        world: world.to_string(),
        territory: territory.to_string(),
        display_name: roster.display_name,
        assault_possible: status.assault_possible,
        members: roster.members,
        online: presence.map(|online| online.len()),
        connected,
        verified,
    })
}
