use serde::{Deserialize, Serialize};

/// A player's privilege tier inside their territory.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Recruit,
    Member,
    Officer,
    Leader,
    #[default]
    Unknown,
}

impl Rank {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Recruit => "recruit",
            Rank::Member => "member",
            Rank::Officer => "officer",
            Rank::Leader => "leader",
            Rank::Unknown => "unknown",
        }
    }

    pub fn from_slug(value: &str) -> Self {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "recruit" => Rank::Recruit,
            "member" => Rank::Member,
            "officer" => Rank::Officer,
            "leader" => Rank::Leader,
            _ => Rank::Unknown,
        }
    }

    /// Ranks that count as an organised defender.
    pub fn is_established(&self) -> bool {
        matches!(self, Rank::Member | Rank::Officer | Rank::Leader)
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slug_is_case_insensitive() {
        assert_eq!(Rank::from_slug("LEADER"), Rank::Leader);
        assert_eq!(Rank::from_slug(" officer "), Rank::Officer);
        assert_eq!(Rank::from_slug("recruit"), Rank::Recruit);
        assert_eq!(Rank::from_slug("emperor"), Rank::Unknown);
    }

    #[test]
    fn only_non_recruit_ranks_are_established() {
        assert!(!Rank::Recruit.is_established());
        assert!(!Rank::Unknown.is_established());
        assert!(Rank::Member.is_established());
        assert!(Rank::Officer.is_established());
        assert!(Rank::Leader.is_established());
    }
}
