//! Outbound notifications.
//!
//! Delivery is best effort: callers run `send` off the request path and log
//! a failure.

use async_trait::async_trait;
use chrono::Duration;
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration as StdDuration;

use crate::error::AppError;

/// A rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &Message) -> Result<(), AppError>;
}

const WEBHOOK_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Posts each message as JSON to a fixed URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// Each request is abandoned after ten seconds.
    pub fn new(url: impl Into<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, message: &Message) -> Result<(), AppError> {
        self.client
            .post(&self.url)
            .json(message)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Keeps messages in memory instead of sending them.
#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Message>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Yields to the runtime until at least `count` messages have arrived, or
    /// one second has passed. Returns whatever has been recorded by then.
    pub async fn wait_for(&self, count: usize) -> Vec<Message> {
        let deadline = tokio::time::Instant::now() + StdDuration::from_secs(1);
        loop {
            let sent = self.sent();
            if sent.len() >= count || tokio::time::Instant::now() >= deadline {
                return sent;
            }
            tokio::time::sleep(StdDuration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, message: &Message) -> Result<(), AppError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }
}

/// Builds the password reset email.
///
/// With a frontend URL the secret is embedded in a link to the reset page,
/// otherwise the raw code is included.
pub fn reset_message(
    to: &str,
    name: &str,
    secret: &str,
    valid_for: Duration,
    frontend_url: Option<&str>,
) -> Message {
    let action = match frontend_url {
        Some(base) => format!(
            "Open the following link to choose a new password:\n\n{}/reset-password/{}",
            base, secret
        ),
        None => format!("Use this code to choose a new password:\n\n{}", secret),
    };

    Message {
        to: to.to_string(),
        subject: "Password reset request".to_string(),
        body: format!(
            "Hi {},\n\nWe received a request to reset your password. {}\n\n\
             This expires in {} minutes. If you did not ask for a reset you can ignore this email.",
            name,
            action,
            valid_for.num_minutes()
        ),
    }
}
