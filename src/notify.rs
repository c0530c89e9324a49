//! Push-notification gateway.
//!
//! Formats the customer-facing level message and hands it to the push
//! provider. Delivery is best-effort: a single POST with a bounded timeout
//! and no retry. Callers log and discard any [`NotifyError`].

use async_trait::async_trait;
use serde::Serialize;

use crate::config::NotifyConfig;

// ---

pub const ALERT_HEADING: &str = "Kezpo Gas Level Alert";

/// Audience segment every notification is broadcast to.
const SUBSCRIBED_SEGMENT: &str = "Subscribed Users";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Network, DNS, TLS or timeout failure.
    #[error("push request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("push provider returned HTTP {0}")]
    HttpStatus(u16),
}

/// What happened to a notification handed to a [`Notifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted by the push provider.
    Sent,
    /// No credentials configured; the message was logged and dropped.
    Disabled,
}

/// Something that can deliver a heading/body pair to customers.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, heading: &str, body: &str) -> Result<Delivery, NotifyError>;
}

/// Emoji shown next to a level percentage.
pub fn level_emoji(percentage: f64) -> &'static str {
    // ---
    if percentage >= 75.0 {
        "💯"
    } else if percentage >= 40.0 {
        "🙂"
    } else if percentage >= 20.0 {
        "😟"
    } else {
        "😣"
    }
}

/// Message body for a tank at `percentage` of capacity.
pub fn level_message(percentage: f64) -> String {
    format!(
        "Your propane level is now {:.2}% {}",
        percentage,
        level_emoji(percentage)
    )
}

#[derive(Debug, Serialize)]
struct Localized<'a> {
    en: &'a str,
}

/// Request body accepted by the provider's notifications endpoint.
#[derive(Debug, Serialize)]
struct PushPayload<'a> {
    app_id: &'a str,
    headings: Localized<'a>,
    contents: Localized<'a>,
    included_segments: [&'a str; 1],
}

/// [`Notifier`] that posts to the configured push provider.
///
/// Without an app id and API key the gateway stays disabled and only logs
/// what it would have sent.
pub struct PushGateway {
    client: reqwest::Client,
    config: NotifyConfig,
}

impl PushGateway {
    // ---
    pub fn new(config: NotifyConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Notifier for PushGateway {
    async fn send(&self, heading: &str, body: &str) -> Result<Delivery, NotifyError> {
        // ---
        let (Some(app_id), Some(api_key)) = (&self.config.app_id, &self.config.api_key) else {
            tracing::debug!(heading, body, "Push gateway not configured, dropping notification");
            return Ok(Delivery::Disabled);
        };

        let payload = PushPayload {
            app_id,
            headings: Localized { en: heading },
            contents: Localized { en: body },
            included_segments: [SUBSCRIBED_SEGMENT],
        };

        let response = self
            .client
            .post(&self.config.url)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {api_key}"))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::HttpStatus(response.status().as_u16()));
        }

        tracing::debug!(url = %self.config.url, "Push notification accepted");
        Ok(Delivery::Sent)
    }
}
