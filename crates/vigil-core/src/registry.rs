use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// (world, territory) identity of a surveillance target.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TargetKey {
    pub world: String,
    pub territory: String,
}

impl TargetKey {
    pub fn new(world: impl Into<String>, territory: impl Into<String>) -> Self {
        Self {
            world: world.into(),
            territory: territory.into(),
        }
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.world, self.territory)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StartError {
    #[error("surveillance already active")]
    AlreadyActive,
    #[error("surveillance capacity of {max} targets reached")]
    AtCapacity { max: usize },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StopError {
    #[error("no active surveillance")]
    NotFound,
}

/// Read-only view of one live target.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TargetSnapshot {
    pub world: String,
    pub territory: String,
    pub display_name: String,
    pub member_count: usize,
    pub assault_possible: bool,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluated_at: Option<DateTime<Utc>>,
}

struct TargetEntry {
    generation: u64,
    cancel: CancellationToken,
    stopping: bool,
    display_name: String,
    member_count: usize,
    assault_possible: bool,
    started_at: DateTime<Utc>,
    evaluated_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct RegistryStore {
    worlds: HashMap<String, HashMap<String, TargetEntry>>,
    next_generation: u64,
}

impl RegistryStore {
    fn get(&self, key: &TargetKey) -> Option<&TargetEntry> {
        self.worlds.get(&key.world)?.get(&key.territory)
    }

    fn get_mut(&mut self, key: &TargetKey) -> Option<&mut TargetEntry> {
        self.worlds.get_mut(&key.world)?.get_mut(&key.territory)
    }

    fn live_count(&self) -> usize {
        self.worlds
            .values()
            .flat_map(|targets| targets.values())
            .filter(|entry| !entry.stopping)
            .count()
    }
}

/// Process-wide map of watched targets; the single source of truth for
/// whether a (world, territory) pair is under surveillance.
///
/// Every map operation takes the same lock. An entry is reserved by
/// [`Registry::start`] and removed only when the returned [`Registration`] is
/// dropped by the supervisor that owns it.
#[derive(Clone)]
pub struct Registry {
    state: Arc<Mutex<RegistryStore>>,
    max_targets: usize,
    root: CancellationToken,
}

impl Registry {
    pub fn new(max_targets: usize) -> Self {
        Self::with_parent(max_targets, CancellationToken::new())
    }

    /// Registry whose target tokens are children of `root`, so cancelling
    /// `root` stops every supervisor.
    pub fn with_parent(max_targets: usize, root: CancellationToken) -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryStore::default())),
            max_targets,
            root,
        }
    }

    pub fn max_targets(&self) -> usize {
        self.max_targets
    }

    /// Reserve a slot for `world`/`territory`. The caller launches the
    /// supervisor with the returned registration.
    ///
    /// Capacity counts live entries only. A stopped entry whose supervisor has
    /// not cleaned up yet stays in the map without holding a slot, so the map
    /// can briefly hold more than `max_targets` entries.
    pub fn start(&self, world: &str, territory: &str) -> Result<Registration, StartError> {
        let key = TargetKey::new(world, territory);
        let mut guard = self.state.lock();
        if guard.get(&key).is_some_and(|entry| !entry.stopping) {
            return Err(StartError::AlreadyActive);
        }
        if guard.live_count() >= self.max_targets {
            return Err(StartError::AtCapacity {
                max: self.max_targets,
            });
        }
        guard.next_generation += 1;
        let generation = guard.next_generation;
        let cancel = self.root.child_token();
        let superseded = guard.worlds.entry(key.world.clone()).or_default().insert(
            key.territory.clone(),
            TargetEntry {
                generation,
                cancel: cancel.clone(),
                stopping: false,
                display_name: key.territory.clone(),
                member_count: 0,
                assault_possible: false,
                started_at: Utc::now(),
                evaluated_at: None,
            },
        );
        drop(guard);
        if superseded.is_some() {
            debug!(target: "vigil::registry", key = %key, "stopping entry superseded by new start");
        }
        Ok(Registration {
            registry: self.clone(),
            key,
            generation,
            cancel,
        })
    }

    /// Signal the owning supervisor to stop. Removal happens in the
    /// supervisor's own cleanup.
    pub fn stop(&self, world: &str, territory: &str) -> Result<(), StopError> {
        let key = TargetKey::new(world, territory);
        let mut guard = self.state.lock();
        match guard.get_mut(&key) {
            Some(entry) if !entry.stopping => {
                entry.stopping = true;
                entry.cancel.cancel();
                Ok(())
            }
            _ => Err(StopError::NotFound),
        }
    }

    pub fn contains(&self, world: &str, territory: &str) -> bool {
        let key = TargetKey::new(world, territory);
        self.state
            .lock()
            .get(&key)
            .is_some_and(|entry| !entry.stopping)
    }

    pub fn len(&self) -> usize {
        self.state.lock().live_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<TargetSnapshot> {
        let guard = self.state.lock();
        let mut targets: Vec<TargetSnapshot> = guard
            .worlds
            .iter()
            .flat_map(|(world, targets)| {
                targets
                    .iter()
                    .filter(|(_, entry)| !entry.stopping)
                    .map(move |(territory, entry)| TargetSnapshot {
                        world: world.clone(),
                        territory: territory.clone(),
                        display_name: entry.display_name.clone(),
                        member_count: entry.member_count,
                        assault_possible: entry.assault_possible,
                        started_at: entry.started_at,
                        evaluated_at: entry.evaluated_at,
                    })
            })
            .collect();
        targets.sort_by(|a, b| (&a.world, &a.territory).cmp(&(&b.world, &b.territory)));
        targets
    }

    /// Cancel every target at once.
    pub fn cancel_all(&self) {
        self.root.cancel();
    }

    fn release(&self, key: &TargetKey, generation: u64) -> bool {
        let mut guard = self.state.lock();
        let Some(targets) = guard.worlds.get_mut(&key.world) else {
            return false;
        };
        let owned = targets
            .get(&key.territory)
            .is_some_and(|entry| entry.generation == generation);
        if owned {
            targets.remove(&key.territory);
            if targets.is_empty() {
                guard.worlds.remove(&key.world);
            }
        }
        owned
    }

    fn update<F>(&self, key: &TargetKey, generation: u64, apply: F)
    where
        F: FnOnce(&mut TargetEntry),
    {
        let mut guard = self.state.lock();
        if let Some(entry) = guard.get_mut(key) {
            if entry.generation == generation {
                apply(entry);
            }
        }
    }
}

/// A reserved registry slot, held by the supervisor that owns the target.
///
/// Dropping it removes the entry, exactly once, whatever made the supervisor
/// exit.
pub struct Registration {
    registry: Registry,
    key: TargetKey,
    generation: u64,
    cancel: CancellationToken,
}

impl Registration {
    pub fn key(&self) -> &TargetKey {
        &self.key
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn set_roster(&self, display_name: &str, member_count: usize) {
        self.registry.update(&self.key, self.generation, |entry| {
            entry.display_name = display_name.to_string();
            entry.member_count = member_count;
        });
    }

    pub fn set_assault_possible(&self, possible: bool) {
        self.registry.update(&self.key, self.generation, |entry| {
            entry.assault_possible = possible;
            entry.evaluated_at = Some(Utc::now());
        });
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.registry.release(&self.key, self.generation) {
            debug!(target: "vigil::registry", key = %self.key, "registry entry released");
        }
    }
}
