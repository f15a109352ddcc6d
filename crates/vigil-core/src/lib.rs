//! Surveillance engine for territory assaults.
//!
//! The crate polls roster, presence and rank data through a [`GameApi`]
//! transport, keeps one supervisor task per watched territory, and reports
//! state transitions to a [`Notifier`]. The enemy tracker keeps the watched
//! set aligned with the home territory's diplomatic state.

pub mod api;
pub mod assault;
pub mod cache;
pub mod client;
pub mod config;
pub mod cooldown;
pub mod enemies;
pub mod engine;
pub mod inspect;
pub mod notify;
pub mod rank;
pub mod registry;
pub mod supervisor;
pub mod territory;
pub mod world;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiError, GameApi};
pub use assault::{AssaultState, Transition};
pub use cache::TtlCache;
pub use client::GameClient;
pub use config::{ConfigError, PresenceUnknown, WatchConfig};
pub use cooldown::Cooldowns;
pub use enemies::{EnemyTracker, Reconciliation, TrackerOptions};
pub use engine::{SurveillanceEngine, WatchContext};
pub use inspect::{DebugError, Spread, TargetDebug};
pub use notify::{Notice, NoticeKind, Notifier, NotifyError};
pub use rank::Rank;
pub use registry::{Registration, Registry, StartError, StopError, TargetKey, TargetSnapshot};
pub use supervisor::{StopReason, SupervisorOptions};
pub use territory::{Diplomacy, Roster, TerritoryInfo};
pub use world::World;
