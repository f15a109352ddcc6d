use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use vigil_core::{Notice, Notifier, NotifyError};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts notices to a chat webhook as `{"content": ...}`.
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

/// Broadcast notices mention everyone and allow that mention; everything else
/// is posted with mentions disabled.
pub(crate) fn payload(notice: &Notice) -> Value {
    if notice.broadcast {
        json!({
            "content": format!("@everyone {}", notice.text),
            "allowed_mentions": { "parse": ["everyone"] },
        })
    } else {
        json!({
            "content": notice.text,
            "allowed_mentions": { "parse": [] },
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notice: &Notice) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(&self.url)
            .timeout(SEND_TIMEOUT)
            .json(&payload(notice))
            .send()
            .await
            .map_err(|err| NotifyError::Unavailable(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected(status.as_u16()))
        }
    }
}
