//! Delivery of password-reset tokens to account holders.

use async_trait::async_trait;
use std::sync::Mutex;

#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn send_reset_token(&self, identifier: &str, token: &str) -> Result<(), anyhow::Error>;
}

/// Writes an event to the log instead of sending anything. The token itself
/// is only included when `reveal_token` is set (local development).
pub struct LogNotifier {
    reveal_token: bool,
}

impl LogNotifier {
    pub fn new(reveal_token: bool) -> Self {
        Self { reveal_token }
    }
}

#[async_trait]
impl ResetNotifier for LogNotifier {
    async fn send_reset_token(&self, identifier: &str, token: &str) -> Result<(), anyhow::Error> {
        if self.reveal_token {
            tracing::info!(identifier = %identifier, reset_token = %token, "Password reset requested");
        } else {
            tracing::info!(identifier = %identifier, "Password reset requested");
        }
        Ok(())
    }
}

/// Records every notification; optionally fails on demand.
#[derive(Default)]
pub struct MockNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Token from the most recent notification for `identifier`.
    pub fn last_token_for(&self, identifier: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|(id, _)| id == identifier)
            .map(|(_, token)| token)
    }
}

#[async_trait]
impl ResetNotifier for MockNotifier {
    async fn send_reset_token(&self, identifier: &str, token: &str) -> Result<(), anyhow::Error> {
        self.sent
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock notifier mutex poisoned: {}", e))?
            .push((identifier.to_string(), token.to_string()));

        if self.fail {
            return Err(anyhow::anyhow!("Notification channel unavailable"));
        }
        Ok(())
    }
}
