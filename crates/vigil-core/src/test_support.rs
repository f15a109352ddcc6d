//! In-memory fakes shared by the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::api::{ApiError, GameApi};
use crate::config::PresenceUnknown;
use crate::cooldown::Cooldowns;
use crate::engine::WatchContext;
use crate::notify::{Notice, NoticeKind, Notifier, NotifyError};
use crate::rank::Rank;
use crate::supervisor::SupervisorOptions;
use crate::territory::TerritoryInfo;
use crate::GameClient;

type Key = (String, String);

#[derive(Default)]
pub(crate) struct FakeApi {
    territory_lists: Mutex<HashMap<String, Result<Vec<String>, ApiError>>>,
    territories: Mutex<HashMap<Key, TerritoryInfo>>,
    failing_territories: Mutex<HashSet<Key>>,
    online: Mutex<HashMap<String, Vec<String>>>,
    failing_presence: Mutex<HashSet<String>>,
    presence_script: Mutex<HashMap<String, VecDeque<bool>>>,
    ranks: Mutex<HashMap<String, Rank>>,
    ranks_fail: AtomicBool,
    territory_list_calls: AtomicUsize,
    territory_calls: Mutex<HashMap<Key, usize>>,
    presence_calls: AtomicUsize,
    rank_calls: AtomicUsize,
}

fn key(world: &str, territory: &str) -> Key {
    (world.to_string(), territory.to_string())
}

impl FakeApi {
    pub fn set_territory_list(&self, world: &str, list: Result<Vec<String>, ApiError>) {
        self.territory_lists.lock().insert(world.to_string(), list);
    }

    pub fn set_members(&self, world: &str, territory: &str, members: &[&str]) {
        let mut guard = self.territories.lock();
        let info = guard.entry(key(world, territory)).or_default();
        info.members = members.iter().map(|m| m.to_string()).collect();
    }

    pub fn set_enemies(&self, world: &str, territory: &str, enemies: &[&str]) {
        let mut guard = self.territories.lock();
        let info = guard.entry(key(world, territory)).or_default();
        info.enemies = enemies.iter().map(|m| m.to_string()).collect();
    }

    pub fn remove_territory(&self, world: &str, territory: &str) {
        self.territories.lock().remove(&key(world, territory));
    }

    pub fn fail_territory(&self, world: &str, territory: &str, fail: bool) {
        let mut guard = self.failing_territories.lock();
        if fail {
            guard.insert(key(world, territory));
        } else {
            guard.remove(&key(world, territory));
        }
    }

    pub fn set_online(&self, world: &str, players: &[&str]) {
        self.online.lock().insert(
            world.to_string(),
            players.iter().map(|p| p.to_string()).collect(),
        );
    }

    pub fn fail_presence(&self, world: &str, fail: bool) {
        let mut guard = self.failing_presence.lock();
        if fail {
            guard.insert(world.to_string());
        } else {
            guard.remove(world);
        }
    }

    /// Queue per-call presence outcomes for `world` (`true` fails the call).
    /// Once drained, presence falls back to the regular behaviour.
    pub fn script_presence(&self, world: &str, failures: &[bool]) {
        self.presence_script
            .lock()
            .entry(world.to_string())
            .or_default()
            .extend(failures.iter().copied());
    }

    pub fn set_rank(&self, player: &str, rank: Rank) {
        self.ranks.lock().insert(player.to_string(), rank);
    }

    pub fn fail_ranks(&self, fail: bool) {
        self.ranks_fail.store(fail, Ordering::SeqCst);
    }

    pub fn territory_list_calls(&self) -> usize {
        self.territory_list_calls.load(Ordering::SeqCst)
    }

    pub fn territory_calls(&self, world: &str, territory: &str) -> usize {
        self.territory_calls
            .lock()
            .get(&key(world, territory))
            .copied()
            .unwrap_or(0)
    }

    pub fn presence_calls(&self) -> usize {
        self.presence_calls.load(Ordering::SeqCst)
    }

    pub fn rank_calls(&self) -> usize {
        self.rank_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GameApi for FakeApi {
    async fn territories(&self, world: &str) -> Result<Vec<String>, ApiError> {
        self.territory_list_calls.fetch_add(1, Ordering::SeqCst);
        self.territory_lists
            .lock()
            .get(world)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn territory(&self, world: &str, territory: &str) -> Result<TerritoryInfo, ApiError> {
        let k = key(world, territory);
        *self.territory_calls.lock().entry(k.clone()).or_default() += 1;
        if self.failing_territories.lock().contains(&k) {
            return Err(ApiError::Timeout);
        }
        self.territories
            .lock()
            .get(&k)
            .cloned()
            .ok_or(ApiError::Status(404))
    }

    async fn online_players(&self, world: &str) -> Result<Vec<String>, ApiError> {
        self.presence_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .presence_script
            .lock()
            .get_mut(world)
            .and_then(VecDeque::pop_front);
        if scripted.unwrap_or_else(|| self.failing_presence.lock().contains(world)) {
            return Err(ApiError::Transport("connection reset".into()));
        }
        Ok(self.online.lock().get(world).cloned().unwrap_or_default())
    }

    async fn player_rank(&self, player: &str, _world: &str) -> Result<Option<Rank>, ApiError> {
        self.rank_calls.fetch_add(1, Ordering::SeqCst);
        if self.ranks_fail.load(Ordering::SeqCst) {
            return Err(ApiError::Timeout);
        }
        Ok(self.ranks.lock().get(player).copied())
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    sent: Mutex<Vec<Notice>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.sent.lock().clone()
    }

    pub fn count(&self, kind: NoticeKind) -> usize {
        self.sent.lock().iter().filter(|n| n.kind == kind).count()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notice: &Notice) -> Result<(), NotifyError> {
        self.sent.lock().push(notice.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Rejected(502));
        }
        Ok(())
    }
}

/// Supervisor options scaled down to milliseconds.
pub(crate) fn fast_options() -> SupervisorOptions {
    SupervisorOptions {
        roster_refresh: Duration::from_millis(200),
        presence_interval: Duration::from_millis(10),
        error_backoff: Duration::from_millis(20),
        max_consecutive_errors: 5,
        missing_roster_limit: 3,
        verify_roster: true,
        presence_unknown: PresenceUnknown::Skip,
    }
}

pub(crate) fn context(
    api: Arc<FakeApi>,
    notifier: Arc<RecordingNotifier>,
    options: SupervisorOptions,
    cooldown: Duration,
) -> Arc<WatchContext> {
    Arc::new(WatchContext {
        client: GameClient::new(api, Duration::from_secs(900), Duration::from_millis(50)),
        notifier,
        cooldowns: Cooldowns::new(cooldown),
        options,
    })
}

/// Poll `check` until it holds or the deadline passes.
pub(crate) async fn wait_until<F>(deadline: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let result = tokio::time::timeout(deadline, async {
        loop {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    result.is_ok()
}
