use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_API_BASE: &str = "https://publicapi.nationsglory.fr";
pub const DEFAULT_PRESENCE_URL: &str =
    "https://{world}.nationsglory.fr/standalone/dynmap_world.json";

/// Process-level settings read from the environment.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub api_key: Option<String>,
    pub api_base: String,
    /// URL template; `{world}` is replaced with the world name.
    pub presence_url: String,
    pub webhook_url: Option<String>,
    pub keepalive_url: Option<String>,
    pub shutdown_grace: Duration,
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let port = match non_empty("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?,
            None => 10_000,
        };
        let bind = match non_empty("VIGIL_BIND") {
            Some(raw) => raw
                .parse::<IpAddr>()
                .with_context(|| format!("VIGIL_BIND must be an IP address, got {raw:?}"))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let shutdown_grace = match non_empty("VIGIL_SHUTDOWN_GRACE_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .with_context(|| format!("VIGIL_SHUTDOWN_GRACE_SECS invalid: {raw:?}"))?,
            ),
            None => Duration::from_secs(5),
        };
        let presence_url =
            non_empty("VIGIL_PRESENCE_URL").unwrap_or_else(|| DEFAULT_PRESENCE_URL.to_string());
        if !presence_url.contains("{world}") {
            anyhow::bail!("VIGIL_PRESENCE_URL must contain a {{world}} placeholder");
        }
        Ok(Self {
            addr: SocketAddr::new(bind, port),
            api_key: non_empty("NG_API_KEY"),
            api_base: non_empty("VIGIL_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            presence_url,
            webhook_url: non_empty("VIGIL_WEBHOOK_URL"),
            keepalive_url: non_empty("RENDER_EXTERNAL_URL"),
            shutdown_grace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "PORT",
        "VIGIL_BIND",
        "NG_API_KEY",
        "VIGIL_API_BASE",
        "VIGIL_PRESENCE_URL",
        "VIGIL_WEBHOOK_URL",
        "RENDER_EXTERNAL_URL",
        "VIGIL_SHUTDOWN_GRACE_SECS",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_without_env() {
        clear_env();
        let cfg = ServerConfig::from_env().expect("defaults");
        assert_eq!(cfg.addr, "0.0.0.0:10000".parse::<SocketAddr>().expect("addr"));
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.presence_url, DEFAULT_PRESENCE_URL);
        assert!(cfg.api_key.is_none());
        assert!(cfg.webhook_url.is_none());
        assert!(cfg.keepalive_url.is_none());
        assert_eq!(cfg.shutdown_grace, Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn env_overrides_are_applied() {
        clear_env();
        std::env::set_var("PORT", "8080");
        std::env::set_var("VIGIL_BIND", "127.0.0.1");
        std::env::set_var("NG_API_KEY", " secret ");
        std::env::set_var("VIGIL_API_BASE", "http://localhost:9000/");
        std::env::set_var("RENDER_EXTERNAL_URL", "vigil.example.org");
        let cfg = ServerConfig::from_env().expect("config");
        assert_eq!(cfg.addr, "127.0.0.1:8080".parse::<SocketAddr>().expect("addr"));
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.api_base, "http://localhost:9000");
        assert_eq!(cfg.keepalive_url.as_deref(), Some("vigil.example.org"));
        clear_env();
    }

    #[test]
    #[serial]
    fn rejects_bad_values() {
        clear_env();
        std::env::set_var("PORT", "http");
        assert!(ServerConfig::from_env().is_err());
        clear_env();
        std::env::set_var("VIGIL_PRESENCE_URL", "https://static.example.org/players.json");
        assert!(ServerConfig::from_env().is_err());
        clear_env();
    }
}
