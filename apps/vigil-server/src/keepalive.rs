use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct KeepAlive {
    pub url: String,
    pub initial_delay: Duration,
    pub interval: Duration,
    pub timeout: Duration,
}

impl KeepAlive {
    pub fn new(raw_url: &str) -> Self {
        Self {
            url: normalize_url(raw_url),
            initial_delay: Duration::from_secs(60),
            interval: Duration::from_secs(600),
            timeout: Duration::from_secs(10),
        }
    }

    /// Periodically GET the public URL so the hosting platform keeps the
    /// process awake. Failures are only logged.
    pub async fn run(self, http: reqwest::Client, cancel: CancellationToken) {
        info!(target: "vigil::keepalive", url = %self.url, "keep-alive enabled");
        let mut delay = self.initial_delay;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            delay = self.interval;
            match http.get(&self.url).timeout(self.timeout).send().await {
                Ok(response) => {
                    debug!(target: "vigil::keepalive", status = response.status().as_u16(), "ping sent")
                }
                Err(err) => debug!(target: "vigil::keepalive", error = %err, "ping failed"),
            }
        }
    }
}

/// Prefix `https://` when the URL carries no scheme.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn scheme_defaults_to_https() {
        assert_eq!(normalize_url("vigil.example.org"), "https://vigil.example.org");
        assert_eq!(normalize_url(" http://localhost:1 "), "http://localhost:1");
        assert_eq!(normalize_url("https://a.b/"), "https://a.b/");
    }

    #[tokio::test]
    async fn pings_until_cancelled() {
        let server = MockServer::start_async().await;
        let ping = server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).body("ok");
            })
            .await;

        let keepalive = KeepAlive {
            url: server.url("/"),
            initial_delay: Duration::ZERO,
            interval: Duration::from_millis(20),
            timeout: Duration::from_secs(1),
        };
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(keepalive.run(reqwest::Client::new(), cancel.clone()));

        let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
        while ping.hits_async().await < 2 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(ping.hits_async().await >= 2);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(3), handle)
            .await
            .expect("keep-alive exits")
            .expect("join");
    }
}
