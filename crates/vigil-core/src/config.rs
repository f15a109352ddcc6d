use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::supervisor::SupervisorOptions;
use crate::world;

/// What a supervisor does when the presence feed cannot be read.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PresenceUnknown {
    /// Skip evaluation and count the cycle as failed.
    #[default]
    Skip,
    /// Evaluate as if nobody were online.
    TreatAsEmpty,
}

impl PresenceUnknown {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceUnknown::Skip => "skip",
            PresenceUnknown::TreatAsEmpty => "treat_as_empty",
        }
    }
}

impl fmt::Display for PresenceUnknown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresenceUnknown {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(PresenceUnknown::Skip),
            "treat_as_empty" | "empty" => Ok(PresenceUnknown::TreatAsEmpty),
            _ => Err(()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Engine tunables. Layered as defaults, then an optional TOML file, then
/// `VIGIL_*` environment variables.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    pub home_world: String,
    pub home_territory: String,
    pub enemy_tracking: bool,
    pub max_targets: usize,
    pub roster_refresh_secs: u64,
    pub presence_interval_secs: u64,
    pub error_backoff_secs: u64,
    pub max_consecutive_errors: u32,
    pub missing_roster_limit: u32,
    pub notify_cooldown_secs: u64,
    pub auto_update_secs: u64,
    pub enemy_initial_delay_secs: u64,
    pub startup_roster_attempts: u32,
    pub territory_ttl_secs: u64,
    pub rank_ttl_secs: u64,
    pub verify_roster: bool,
    pub presence_unknown: PresenceUnknown,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            home_world: "lime".into(),
            home_territory: "tasmanie".into(),
            enemy_tracking: true,
            max_targets: 25,
            roster_refresh_secs: 60,
            presence_interval_secs: 2,
            error_backoff_secs: 5,
            max_consecutive_errors: 5,
            missing_roster_limit: 5,
            notify_cooldown_secs: 300,
            auto_update_secs: 5,
            enemy_initial_delay_secs: 10,
            startup_roster_attempts: 3,
            territory_ttl_secs: 900,
            rank_ttl_secs: 60,
            verify_roster: true,
            presence_unknown: PresenceUnknown::Skip,
        }
    }
}

fn secs(value: u64) -> Duration {
    Duration::from_secs(value.max(1))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_field<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

impl WatchConfig {
    /// Defaults, overlaid with `VIGIL_CONFIG` (when set) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var("VIGIL_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        cfg.apply_env_with(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Overlay values returned by `lookup` for each recognised `VIGIL_*` key.
    /// Blank values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get("VIGIL_HOME_WORLD") {
            self.home_world = value.trim().to_ascii_lowercase();
        }
        if let Some(value) = get("VIGIL_HOME_TERRITORY") {
            self.home_territory = value.trim().to_string();
        }
        if let Some(value) = get("VIGIL_ENEMY_TRACKING") {
            self.enemy_tracking = parse_bool(&value).ok_or(ConfigError::Invalid {
                key: "VIGIL_ENEMY_TRACKING",
                value,
            })?;
        }
        if let Some(value) = get("VIGIL_VERIFY_ROSTER") {
            self.verify_roster = parse_bool(&value).ok_or(ConfigError::Invalid {
                key: "VIGIL_VERIFY_ROSTER",
                value,
            })?;
        }
        if let Some(value) = get("VIGIL_PRESENCE_UNKNOWN") {
            self.presence_unknown = value.parse().map_err(|_| ConfigError::Invalid {
                key: "VIGIL_PRESENCE_UNKNOWN",
                value,
            })?;
        }
        if let Some(value) = get("VIGIL_MAX_TARGETS") {
            self.max_targets = parse_field("VIGIL_MAX_TARGETS", &value)?;
        }
        if let Some(value) = get("VIGIL_MAX_CONSECUTIVE_ERRORS") {
            self.max_consecutive_errors = parse_field("VIGIL_MAX_CONSECUTIVE_ERRORS", &value)?;
        }
        if let Some(value) = get("VIGIL_MISSING_ROSTER_LIMIT") {
            self.missing_roster_limit = parse_field("VIGIL_MISSING_ROSTER_LIMIT", &value)?;
        }

        let seconds: [(&'static str, &mut u64); 8] = [
            ("VIGIL_ROSTER_REFRESH_SECS", &mut self.roster_refresh_secs),
            ("VIGIL_PRESENCE_INTERVAL_SECS", &mut self.presence_interval_secs),
            ("VIGIL_ERROR_BACKOFF_SECS", &mut self.error_backoff_secs),
            ("VIGIL_NOTIFY_COOLDOWN_SECS", &mut self.notify_cooldown_secs),
            ("VIGIL_AUTO_UPDATE_SECS", &mut self.auto_update_secs),
            ("VIGIL_ENEMY_INITIAL_DELAY_SECS", &mut self.enemy_initial_delay_secs),
            ("VIGIL_TERRITORY_TTL_SECS", &mut self.territory_ttl_secs),
            ("VIGIL_RANK_TTL_SECS", &mut self.rank_ttl_secs),
        ];
        for (key, slot) in seconds {
            if let Some(value) = get(key) {
                *slot = parse_field(key, &value)?;
            }
        }
        if let Some(value) = get("VIGIL_STARTUP_ROSTER_ATTEMPTS") {
            self.startup_roster_attempts = parse_field("VIGIL_STARTUP_ROSTER_ATTEMPTS", &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !world::is_known(&self.home_world) {
            return Err(ConfigError::Invalid {
                key: "home_world",
                value: self.home_world.clone(),
            });
        }
        if self.home_territory.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "home_territory",
                value: self.home_territory.clone(),
            });
        }
        if self.max_targets == 0 {
            return Err(ConfigError::Invalid {
                key: "max_targets",
                value: "0".into(),
            });
        }
        Ok(())
    }

    pub fn supervisor_options(&self) -> SupervisorOptions {
        SupervisorOptions {
            roster_refresh: secs(self.roster_refresh_secs),
            presence_interval: secs(self.presence_interval_secs),
            error_backoff: secs(self.error_backoff_secs),
            max_consecutive_errors: self.max_consecutive_errors.max(1),
            missing_roster_limit: self.missing_roster_limit.max(1),
            verify_roster: self.verify_roster,
            presence_unknown: self.presence_unknown,
        }
    }

    pub fn notify_cooldown(&self) -> Duration {
        Duration::from_secs(self.notify_cooldown_secs)
    }

    pub fn auto_update_interval(&self) -> Duration {
        secs(self.auto_update_secs)
    }

    pub fn enemy_initial_delay(&self) -> Duration {
        Duration::from_secs(self.enemy_initial_delay_secs)
    }

    pub fn territory_ttl(&self) -> Duration {
        Duration::from_secs(self.territory_ttl_secs)
    }

    pub fn rank_ttl(&self) -> Duration {
        Duration::from_secs(self.rank_ttl_secs)
    }
}
