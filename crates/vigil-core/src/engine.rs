use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::GameClient;
use crate::cooldown::Cooldowns;
use crate::notify::Notifier;
use crate::registry::{Registry, StartError, StopError, TargetKey, TargetSnapshot};
use crate::supervisor::{self, StopReason, SupervisorOptions};

/// Shared collaborators handed to every supervisor.
pub struct WatchContext {
    pub client: GameClient,
    pub notifier: Arc<dyn Notifier>,
    pub cooldowns: Cooldowns,
    pub options: SupervisorOptions,
}

/// Start/stop/list surface over the registry, owning every supervisor task.
pub struct SurveillanceEngine {
    ctx: Arc<WatchContext>,
    registry: Registry,
    root: CancellationToken,
    tasks: Mutex<JoinSet<(TargetKey, StopReason)>>,
}

impl SurveillanceEngine {
    pub fn new(ctx: Arc<WatchContext>, max_targets: usize) -> Self {
        let root = CancellationToken::new();
        Self {
            ctx,
            registry: Registry::with_parent(max_targets, root.clone()),
            root,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn context(&self) -> &Arc<WatchContext> {
        &self.ctx
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Reserve the target and spawn its supervisor. Must be called from
    /// within a tokio runtime.
    pub fn start(&self, world: &str, territory: &str) -> Result<(), StartError> {
        let registration = self.registry.start(world, territory)?;
        let key = registration.key().clone();
        let ctx = self.ctx.clone();
        let mut tasks = self.tasks.lock();
        reap(&mut tasks);
        tasks.spawn(async move {
            let reason = supervisor::run(ctx, registration).await;
            (key, reason)
        });
        Ok(())
    }

    pub fn stop(&self, world: &str, territory: &str) -> Result<(), StopError> {
        self.registry.stop(world, territory)
    }

    pub fn is_watching(&self, world: &str, territory: &str) -> bool {
        self.registry.contains(world, territory)
    }

    pub fn list_active(&self) -> Vec<TargetSnapshot> {
        self.registry.snapshot()
    }

    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    /// Cancel every supervisor and wait up to `grace` for them to clean up;
    /// stragglers are aborted.
    pub async fn shutdown(&self, grace: Duration) {
        self.root.cancel();
        let mut tasks = std::mem::take(&mut *self.tasks.lock());
        let pending = tasks.len();
        let drained = tokio::time::timeout(grace, async {
            while let Some(result) = tasks.join_next().await {
                log_exit(result);
            }
        })
        .await;
        if drained.is_err() {
            warn!(
                target: "vigil::watch",
                remaining = tasks.len(),
                "supervisors did not stop within grace; aborting"
            );
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }
        info!(target: "vigil::watch", supervisors = pending, "surveillance engine stopped");
    }
}

fn reap(tasks: &mut JoinSet<(TargetKey, StopReason)>) {
    while let Some(result) = tasks.try_join_next() {
        log_exit(result);
    }
}

fn log_exit(result: Result<(TargetKey, StopReason), tokio::task::JoinError>) {
    match result {
        Ok((key, reason)) => {
            debug!(target: "vigil::watch", key = %key, reason = reason.as_str(), "supervisor reaped")
        }
        Err(err) if err.is_cancelled() => {}
        Err(err) => error!(target: "vigil::watch", error = %err, "supervisor task panicked"),
    }
}
