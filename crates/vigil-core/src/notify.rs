use serde::Serialize;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    AssaultPossible,
    AssaultEnded,
    TerritoryLost,
    SurveillanceFailed,
    WarDetected,
    PeaceSigned,
    TrackingStarted,
    TrackingUnavailable,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::AssaultPossible => "assault_possible",
            NoticeKind::AssaultEnded => "assault_ended",
            NoticeKind::TerritoryLost => "territory_lost",
            NoticeKind::SurveillanceFailed => "surveillance_failed",
            NoticeKind::WarDetected => "war_detected",
            NoticeKind::PeaceSigned => "peace_signed",
            NoticeKind::TrackingStarted => "tracking_started",
            NoticeKind::TrackingUnavailable => "tracking_unavailable",
        }
    }
}

/// One message for the alert channel.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub world: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub territory: Option<String>,
    /// Broadcast notices should reach everyone in the channel.
    pub broadcast: bool,
    pub text: String,
}

impl Notice {
    fn new(kind: NoticeKind, world: &str, territory: Option<&str>, text: String) -> Self {
        Self {
            kind,
            world: world.to_string(),
            territory: territory.map(str::to_string),
            broadcast: false,
            text,
        }
    }

    pub fn assault_possible(world: &str, territory: &str, name: &str, online: &[String]) -> Self {
        let mut notice = Self::new(
            NoticeKind::AssaultPossible,
            world,
            Some(territory),
            format!(
                "⚔️ ASSAULT POSSIBLE on {name} ({})\n👥 Online: {}",
                world.to_uppercase(),
                online.join(", ")
            ),
        );
        notice.broadcast = true;
        notice
    }

    pub fn assault_ended(world: &str, territory: &str, name: &str) -> Self {
        Self::new(
            NoticeKind::AssaultEnded,
            world,
            Some(territory),
            format!("ℹ️ Assault no longer possible on {name} ({})", world.to_uppercase()),
        )
    }

    pub fn territory_lost(world: &str, territory: &str) -> Self {
        Self::new(
            NoticeKind::TerritoryLost,
            world,
            Some(territory),
            format!(
                "❌ Surveillance stopped: {territory} ({}) could not be found",
                world.to_uppercase()
            ),
        )
    }

    pub fn surveillance_failed(world: &str, territory: &str, name: &str, failures: u32) -> Self {
        Self::new(
            NoticeKind::SurveillanceFailed,
            world,
            Some(territory),
            format!(
                "❌ Surveillance stopped on {name} ({}) after {failures} consecutive failures",
                world.to_uppercase()
            ),
        )
    }

    pub fn war_detected(world: &str, territory: &str, name: &str) -> Self {
        Self::new(
            NoticeKind::WarDetected,
            world,
            Some(territory),
            format!("➕ War detected! Watching **{name}**"),
        )
    }

    pub fn peace_signed(world: &str, territory: &str) -> Self {
        Self::new(
            NoticeKind::PeaceSigned,
            world,
            Some(territory),
            format!("🕊️ Peace signed with **{territory}**"),
        )
    }

    pub fn tracking_started(world: &str, watched: &[String]) -> Self {
        let text = if watched.is_empty() {
            "🤖 Started, no active wars".to_string()
        } else {
            format!(
                "🤖 Started, {} surveillance(s)\n📍 {}",
                watched.len(),
                watched.join(", ")
            )
        };
        Self::new(NoticeKind::TrackingStarted, world, None, text)
    }

    pub fn tracking_unavailable(world: &str, territory: &str) -> Self {
        Self::new(
            NoticeKind::TrackingUnavailable,
            world,
            Some(territory),
            format!(
                "❌ Enemy tracking could not read diplomacy of {territory} ({}); retrying in background",
                world.to_uppercase()
            ),
        )
    }
}

#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    #[error("notification channel unavailable: {0}")]
    Unavailable(String),
    #[error("notification rejected with status {0}")]
    Rejected(u16),
}

/// Fire-and-forget sink for alert-channel messages.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notice: &Notice) -> Result<(), NotifyError>;
}

/// Send `notice`, logging (never retrying) a delivery failure.
pub async fn deliver(notifier: &dyn Notifier, notice: Notice) {
    if let Err(err) = notifier.send(&notice).await {
        warn!(
            target: "vigil::notify",
            kind = notice.kind.as_str(),
            world = %notice.world,
            territory = notice.territory.as_deref().unwrap_or("-"),
            error = %err,
            "notification delivery failed"
        );
    }
}

/// Sink that only writes notices to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notice: &Notice) -> Result<(), NotifyError> {
        info!(
            target: "vigil::notify",
            kind = notice.kind.as_str(),
            world = %notice.world,
            broadcast = notice.broadcast,
            "{}",
            notice.text
        );
        Ok(())
    }
}
