use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Characters the game prefixes to member names to mark their rank.
const RANK_MARKERS: [char; 3] = ['*', '+', '-'];

/// Raw territory payload as returned by the game's country endpoint.
///
/// Roster and diplomacy are two readings of this same object.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TerritoryInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub members: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub enemies: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub allies: Vec<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub balance: Option<f64>,
    #[serde(default)]
    pub leader: Option<String>,
}

/// Current member list of a territory with rank markers stripped.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Roster {
    pub display_name: String,
    pub members: Vec<String>,
}

impl Roster {
    /// Build a roster from a territory payload, or `None` when the payload has
    /// no members. Callers treat `None` as "unknown", never as "empty".
    pub fn from_info(territory: &str, info: &TerritoryInfo) -> Option<Self> {
        let members = normalize_members(&info.members);
        if members.is_empty() {
            return None;
        }
        let display_name = info
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(territory)
            .to_string();
        Some(Self {
            display_name,
            members,
        })
    }

    pub fn contains(&self, player: &str) -> bool {
        self.members.iter().any(|member| member == player)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Diplomatic reading of a territory payload.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Diplomacy {
    pub enemies: BTreeSet<String>,
    pub allies: BTreeSet<String>,
    pub balance: Option<f64>,
    pub leader: Option<String>,
}

impl From<&TerritoryInfo> for Diplomacy {
    fn from(info: &TerritoryInfo) -> Self {
        let clean = |values: &[String]| {
            values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect::<BTreeSet<_>>()
        };
        Self {
            enemies: clean(&info.enemies),
            allies: clean(&info.allies),
            balance: info.balance,
            leader: info.leader.clone(),
        }
    }
}

/// Strip leading rank markers from a member name.
pub fn normalize_member(raw: &str) -> &str {
    raw.trim().trim_start_matches(RANK_MARKERS)
}

/// Normalise a raw member list: markers stripped, blanks and duplicates
/// dropped, first-seen order kept.
pub fn normalize_members<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(raw.len());
    raw.iter()
        .map(|name| normalize_member(name.as_ref()))
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_string)
        .collect()
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
