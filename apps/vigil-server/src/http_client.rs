use std::time::Duration;

use anyhow::{Context, Result};

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn connect_timeout() -> Duration {
    Duration::from_secs(env_u64("VIGIL_HTTP_CONNECT_TIMEOUT_SECS", 3).max(1))
}

fn pool_idle() -> Duration {
    Duration::from_secs(env_u64("VIGIL_HTTP_POOL_IDLE_SECS", 90).max(1))
}

fn user_agent() -> String {
    format!("vigil-server/{}", env!("CARGO_PKG_VERSION"))
}

/// Base client builder with shared defaults. Request timeouts are applied
/// per call.
pub fn builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(user_agent())
        .connect_timeout(connect_timeout())
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(pool_idle())
}

pub fn client() -> Result<reqwest::Client> {
    builder().build().context("building http client")
}
