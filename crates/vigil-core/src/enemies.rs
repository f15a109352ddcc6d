use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::WatchConfig;
use crate::engine::SurveillanceEngine;
use crate::notify::{deliver, Notice};
use crate::registry::StartError;

#[derive(Clone, Debug)]
pub struct TrackerOptions {
    pub home_world: String,
    pub home_territory: String,
    pub interval: Duration,
    pub initial_delay: Duration,
    pub startup_attempts: u32,
    pub startup_retry: Duration,
}

impl TrackerOptions {
    pub fn from_config(cfg: &WatchConfig) -> Self {
        Self {
            home_world: cfg.home_world.clone(),
            home_territory: cfg.home_territory.clone(),
            interval: cfg.auto_update_interval(),
            initial_delay: cfg.enemy_initial_delay(),
            startup_attempts: cfg.startup_roster_attempts.max(1),
            startup_retry: Duration::from_secs(1),
        }
    }
}

/// What one reconcile pass changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub started: Vec<String>,
    pub stopped: Vec<String>,
}

/// Keeps the watched set aligned with the home territory's enemy list.
pub struct EnemyTracker {
    engine: Arc<SurveillanceEngine>,
    options: TrackerOptions,
    known: BTreeSet<String>,
}

impl EnemyTracker {
    pub fn new(engine: Arc<SurveillanceEngine>, options: TrackerOptions) -> Self {
        Self {
            engine,
            options,
            known: BTreeSet::new(),
        }
    }

    pub fn known(&self) -> &BTreeSet<String> {
        &self.known
    }

    /// Initial pass: watch every current enemy, waiting briefly for rosters,
    /// and post a summary. Returns `false` when diplomacy could not be read.
    pub async fn bootstrap(&mut self) -> bool {
        let ctx = self.engine.context().clone();
        let world = self.options.home_world.as_str();
        let home = self.options.home_territory.as_str();
        let Some(diplomacy) = ctx.client.diplomacy(world, home).await else {
            warn!(
                target: "vigil::enemies",
                world,
                territory = home,
                "enemy tracking could not start; periodic reconcile will retry"
            );
            deliver(ctx.notifier.as_ref(), Notice::tracking_unavailable(world, home)).await;
            return false;
        };

        let mut watched = Vec::new();
        for enemy in &diplomacy.enemies {
            let mut name = None;
            for attempt in 1..=self.options.startup_attempts {
                if let Some(roster) = ctx.client.roster(world, enemy).await {
                    name = Some(roster.display_name);
                    break;
                }
                if attempt < self.options.startup_attempts {
                    tokio::time::sleep(self.options.startup_retry).await;
                }
            }
            if name.is_none() {
                debug!(
                    target: "vigil::enemies",
                    world,
                    territory = %enemy,
                    "no roster yet; supervisor will keep trying"
                );
            }
            match self.engine.start(world, enemy) {
                Ok(()) | Err(StartError::AlreadyActive) => {
                    watched.push(name.unwrap_or_else(|| enemy.clone()));
                }
                Err(err) => warn!(
                    target: "vigil::enemies",
                    world,
                    territory = %enemy,
                    error = %err,
                    "could not watch enemy"
                ),
            }
        }
        info!(
            target: "vigil::enemies",
            world,
            enemies = diplomacy.enemies.len(),
            watched = watched.len(),
            "enemy tracking started"
        );
        self.known = diplomacy.enemies;
        deliver(ctx.notifier.as_ref(), Notice::tracking_started(world, &watched)).await;
        true
    }

    /// One poll of the home territory's diplomacy. `None` when it could not be
    /// read; the known set is then left as is.
    pub async fn reconcile(&mut self) -> Option<Reconciliation> {
        let ctx = self.engine.context().clone();
        let world = self.options.home_world.as_str();
        let diplomacy = ctx
            .client
            .diplomacy(world, &self.options.home_territory)
            .await?;
        let current = diplomacy.enemies;
        let mut outcome = Reconciliation::default();

        for enemy in current.difference(&self.known) {
            if self.engine.is_watching(world, enemy) {
                continue;
            }
            let Some(roster) = ctx.client.roster(world, enemy).await else {
                debug!(target: "vigil::enemies", world, territory = %enemy, "new enemy has no roster; not watching");
                continue;
            };
            match self.engine.start(world, enemy) {
                Ok(()) => {
                    info!(target: "vigil::enemies", world, territory = %enemy, "war detected");
                    deliver(
                        ctx.notifier.as_ref(),
                        Notice::war_detected(world, enemy, &roster.display_name),
                    )
                    .await;
                    outcome.started.push(enemy.clone());
                }
                Err(err) => warn!(
                    target: "vigil::enemies",
                    world,
                    territory = %enemy,
                    error = %err,
                    "could not watch new enemy"
                ),
            }
        }

        for enemy in self.known.difference(&current) {
            if self.engine.stop(world, enemy).is_ok() {
                info!(target: "vigil::enemies", world, territory = %enemy, "peace signed");
                deliver(ctx.notifier.as_ref(), Notice::peace_signed(world, enemy)).await;
                outcome.stopped.push(enemy.clone());
            }
        }

        self.known = current;
        Some(outcome)
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = self.bootstrap() => {}
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(self.options.initial_delay) => {}
        }
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.reconcile() => {
                    if outcome.is_none() {
                        debug!(target: "vigil::enemies", "diplomacy unavailable; skipping cycle");
                    }
                }
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.options.interval) => {}
            }
        }
        debug!(target: "vigil::enemies", "enemy tracker stopped");
    }
}
