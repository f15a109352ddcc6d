use crate::rank::Rank;
use crate::territory::TerritoryInfo;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("unknown world `{0}`")]
    UnknownWorld(String),
}

/// Raw read operations against the game service.
///
/// Implementations report every failure as an [`ApiError`]; softening those
/// failures into "unknown" results is the job of [`crate::GameClient`].
#[async_trait::async_trait]
pub trait GameApi: Send + Sync {
    /// Keys of every claimed territory on `world`.
    async fn territories(&self, world: &str) -> Result<Vec<String>, ApiError>;

    /// Roster and diplomatic payload of one territory.
    async fn territory(&self, world: &str, territory: &str) -> Result<TerritoryInfo, ApiError>;

    /// Names of the players currently connected to `world`.
    async fn online_players(&self, world: &str) -> Result<Vec<String>, ApiError>;

    /// Rank of `player` inside their territory on `world`; `Ok(None)` when the
    /// player has no territory there.
    async fn player_rank(&self, player: &str, world: &str) -> Result<Option<Rank>, ApiError>;
}
