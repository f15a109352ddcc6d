use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assault::{assault_possible, connected_members, AssaultState, Transition, MIN_CONNECTED};
use crate::config::{PresenceUnknown, WatchConfig};
use crate::engine::WatchContext;
use crate::notify::{deliver, Notice};
use crate::registry::Registration;
use crate::territory::Roster;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupervisorOptions {
    pub roster_refresh: Duration,
    pub presence_interval: Duration,
    pub error_backoff: Duration,
    pub max_consecutive_errors: u32,
    /// Failed roster lookups tolerated before a never-resolved territory is
    /// declared missing.
    pub missing_roster_limit: u32,
    /// Re-fetch the roster before alerting and drop connected players who
    /// are no longer members.
    pub verify_roster: bool,
    pub presence_unknown: PresenceUnknown,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        WatchConfig::default().supervisor_options()
    }
}

/// Why a supervisor exited.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Cancelled,
    TerritoryNotFound,
    TooManyErrors,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Cancelled => "cancelled",
            StopReason::TerritoryNotFound => "territory_not_found",
            StopReason::TooManyErrors => "too_many_errors",
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CycleError {
    #[error("presence feed unavailable")]
    PresenceUnknown,
    #[error("territory could not be resolved after {0} attempts")]
    TerritoryNotFound(u32),
}

enum Cycle {
    Evaluated,
    AwaitingRoster,
}

/// Per-target state; only the owning supervisor touches it.
struct Watch {
    world: String,
    territory: String,
    display_name: String,
    roster: Vec<String>,
    last_refresh: Option<Instant>,
    assault: AssaultState,
    consecutive_errors: u32,
    missing_rosters: u32,
    roster_misses: u64,
}

impl Watch {
    fn new(registration: &Registration) -> Self {
        let key = registration.key();
        Self {
            world: key.world.clone(),
            territory: key.territory.clone(),
            display_name: key.territory.clone(),
            roster: Vec::new(),
            last_refresh: None,
            assault: AssaultState::default(),
            consecutive_errors: 0,
            missing_rosters: 0,
            roster_misses: 0,
        }
    }

    fn refresh_due(&self, options: &SupervisorOptions, now: Instant) -> bool {
        self.roster.is_empty()
            || self
                .last_refresh
                .is_none_or(|at| now.saturating_duration_since(at) >= options.roster_refresh)
    }

    async fn refresh_roster(
        &mut self,
        ctx: &WatchContext,
        registration: &Registration,
    ) -> Result<(), CycleError> {
        let now = Instant::now();
        match ctx.client.roster(&self.world, &self.territory).await {
            Some(roster) => {
                self.adopt(roster, registration);
                self.missing_rosters = 0;
                self.last_refresh = Some(now);
                Ok(())
            }
            None if !self.roster.is_empty() => {
                self.roster_misses += 1;
                self.last_refresh = Some(now);
                warn!(
                    target: "vigil::watch",
                    world = %self.world,
                    territory = %self.territory,
                    misses = self.roster_misses,
                    "roster refresh failed; keeping previous roster"
                );
                Ok(())
            }
            None => {
                self.missing_rosters += 1;
                if self.missing_rosters >= ctx.options.missing_roster_limit {
                    return Err(CycleError::TerritoryNotFound(self.missing_rosters));
                }
                debug!(
                    target: "vigil::watch",
                    world = %self.world,
                    territory = %self.territory,
                    attempt = self.missing_rosters,
                    "roster not available yet"
                );
                Ok(())
            }
        }
    }

    fn adopt(&mut self, roster: Roster, registration: &Registration) {
        if self.roster.is_empty() {
            info!(
                target: "vigil::watch",
                world = %self.world,
                territory = %self.territory,
                name = %roster.display_name,
                members = roster.len(),
                "roster loaded"
            );
        } else {
            let previous: HashSet<&str> = self.roster.iter().map(String::as_str).collect();
            let current: HashSet<&str> = roster.members.iter().map(String::as_str).collect();
            let added: Vec<&str> = current.difference(&previous).copied().collect();
            let removed: Vec<&str> = previous.difference(&current).copied().collect();
            if !added.is_empty() || !removed.is_empty() {
                info!(
                    target: "vigil::watch",
                    world = %self.world,
                    territory = %self.territory,
                    added = ?added,
                    removed = ?removed,
                    members = roster.len(),
                    "roster changed"
                );
            }
        }
        registration.set_roster(&roster.display_name, roster.len());
        self.display_name = roster.display_name;
        self.roster = roster.members;
    }

    /// Drop connected players missing from a fresh roster. Fails closed: an
    /// unavailable roster verifies nobody.
    async fn verify(&self, ctx: &WatchContext, connected: Vec<String>) -> Vec<String> {
        match ctx.client.roster(&self.world, &self.territory).await {
            Some(fresh) => {
                let verified: Vec<String> = connected
                    .iter()
                    .filter(|player| fresh.contains(player))
                    .cloned()
                    .collect();
                if verified.len() != connected.len() {
                    debug!(
                        target: "vigil::watch",
                        world = %self.world,
                        territory = %self.territory,
                        connected = connected.len(),
                        verified = verified.len(),
                        "connected members dropped by verification"
                    );
                }
                verified
            }
            None => {
                warn!(
                    target: "vigil::watch",
                    world = %self.world,
                    territory = %self.territory,
                    "roster verification unavailable; suppressing evaluation"
                );
                Vec::new()
            }
        }
    }

    async fn cycle(
        &mut self,
        ctx: &WatchContext,
        registration: &Registration,
    ) -> Result<Cycle, CycleError> {
        if self.refresh_due(&ctx.options, Instant::now()) {
            self.refresh_roster(ctx, registration).await?;
        }
        if self.roster.is_empty() {
            return Ok(Cycle::AwaitingRoster);
        }

        let online = match ctx.client.presence(&self.world).await {
            Some(online) => online,
            None => match ctx.options.presence_unknown {
                PresenceUnknown::Skip => return Err(CycleError::PresenceUnknown),
                PresenceUnknown::TreatAsEmpty => Vec::new(),
            },
        };
        let mut connected = connected_members(&self.roster, &online);
        if ctx.options.verify_roster && connected.len() >= MIN_CONNECTED {
            connected = self.verify(ctx, connected).await;
        }

        let possible = if connected.len() >= MIN_CONNECTED {
            let world = self.world.as_str();
            let lookups = connected.iter().map(move |player| async move {
                (player.clone(), ctx.client.rank(player, world).await)
            });
            let ranks = join_all(lookups).await;
            assault_possible(&connected, &ranks)
        } else {
            false
        };

        registration.set_assault_possible(possible);
        match self.assault.advance(possible) {
            Transition::Began => {
                if ctx.cooldowns.try_acquire(registration.key(), Instant::now()) {
                    info!(
                        target: "vigil::watch",
                        world = %self.world,
                        territory = %self.territory,
                        connected = ?connected,
                        "assault possible"
                    );
                    deliver(
                        ctx.notifier.as_ref(),
                        Notice::assault_possible(
                            &self.world,
                            &self.territory,
                            &self.display_name,
                            &connected,
                        ),
                    )
                    .await;
                } else {
                    debug!(
                        target: "vigil::watch",
                        world = %self.world,
                        territory = %self.territory,
                        "assault possible again inside cooldown; not re-alerting"
                    );
                }
            }
            Transition::Ended => {
                info!(
                    target: "vigil::watch",
                    world = %self.world,
                    territory = %self.territory,
                    "assault no longer possible"
                );
                deliver(
                    ctx.notifier.as_ref(),
                    Notice::assault_ended(&self.world, &self.territory, &self.display_name),
                )
                .await;
            }
            Transition::Unchanged => {}
        }
        Ok(Cycle::Evaluated)
    }
}

/// Drive one target until it is cancelled, disappears, or keeps failing.
///
/// Owns `registration`; the registry entry goes away when this returns,
/// whatever the reason.
pub async fn run(ctx: Arc<WatchContext>, registration: Registration) -> StopReason {
    let cancel = registration.cancel_token().clone();
    let options = ctx.options.clone();
    let mut watch = Watch::new(&registration);
    info!(
        target: "vigil::watch",
        world = %watch.world,
        territory = %watch.territory,
        "surveillance started"
    );

    let reason = loop {
        let outcome = tokio::select! {
            _ = cancel.cancelled() => break StopReason::Cancelled,
            outcome = watch.cycle(&ctx, &registration) => outcome,
        };
        let pause = match outcome {
            Ok(Cycle::Evaluated) => {
                watch.consecutive_errors = 0;
                options.presence_interval
            }
            Ok(Cycle::AwaitingRoster) => options.error_backoff,
            Err(CycleError::TerritoryNotFound(attempts)) => {
                warn!(
                    target: "vigil::watch",
                    world = %watch.world,
                    territory = %watch.territory,
                    attempts,
                    "territory not found; stopping surveillance"
                );
                break StopReason::TerritoryNotFound;
            }
            Err(err) => {
                watch.consecutive_errors += 1;
                warn!(
                    target: "vigil::watch",
                    world = %watch.world,
                    territory = %watch.territory,
                    failures = watch.consecutive_errors,
                    error = %err,
                    "surveillance cycle failed"
                );
                if watch.consecutive_errors >= options.max_consecutive_errors {
                    break StopReason::TooManyErrors;
                }
                options.error_backoff
            }
        };
        tokio::select! {
            _ = cancel.cancelled() => break StopReason::Cancelled,
            _ = tokio::time::sleep(pause) => {}
        }
    };

    let key = registration.key().clone();
    drop(registration);
    info!(
        target: "vigil::watch",
        world = %key.world,
        territory = %key.territory,
        reason = reason.as_str(),
        "surveillance stopped"
    );
    match reason {
        StopReason::TerritoryNotFound => {
            deliver(
                ctx.notifier.as_ref(),
                Notice::territory_lost(&key.world, &key.territory),
            )
            .await;
        }
        StopReason::TooManyErrors => {
            deliver(
                ctx.notifier.as_ref(),
                Notice::surveillance_failed(
                    &key.world,
                    &key.territory,
                    &watch.display_name,
                    watch.consecutive_errors,
                ),
            )
            .await;
        }
        StopReason::Cancelled => {}
    }
    reason
}
