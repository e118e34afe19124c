//! Discord-compatible webhook sink.

use async_trait::async_trait;
use reqwest::StatusCode;

use super::sink::Sink;
use super::DeliveryError;
use crate::formats::Payload;

/// Base of webhook URLs built from an id and token.
pub const WEBHOOK_BASE: &str = "https://discord.com/api/webhooks";

/// Longest error body kept in a [`DeliveryError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 256;

/// Webhook URL for `id` and `token`.
pub fn webhook_url(id: &str, token: &str) -> String {
    format!("{WEBHOOK_BASE}/{id}/{token}")
}

/// Posts payloads to a webhook URL.
#[derive(Clone)]
pub struct WebhookSink {
    url: String,
    username: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for WebhookSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The URL embeds the webhook token.
        f.debug_struct("WebhookSink")
            .field("url", &"[REDACTED]")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl WebhookSink {
    /// Sink posting to `url` through a shared `client`.
    pub fn new(url: String, username: Option<String>, client: reqwest::Client) -> Self {
        Self {
            url,
            username,
            client,
        }
    }
}

/// Map a webhook response onto a delivery result.
///
/// # Errors
///
/// `429` becomes [`DeliveryError::RateLimited`] (with the `Retry-After` header
/// when present); any other non-2xx becomes [`DeliveryError::Status`].
pub async fn check_webhook_response(response: reqwest::Response) -> Result<(), DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .map(|secs| secs.ceil())
            .and_then(|secs| format!("{secs:.0}").parse::<u64>().ok());
        return Err(DeliveryError::RateLimited { retry_after_secs });
    }
    let body = response
        .text()
        .await
        .map_err(|e| DeliveryError::Http(e.without_url().to_string()))?;
    Err(DeliveryError::Status {
        status: status.as_u16(),
        body: shorten(&body),
    })
}

fn shorten(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_ERROR_BODY_CHARS {
        let short: String = collapsed.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{short}...")
    } else {
        collapsed
    }
}

#[async_trait]
impl Sink for WebhookSink {
    async fn send(&self, payload: &Payload) -> Result<(), DeliveryError> {
        let response = match (&self.username, &payload.username) {
            (Some(username), None) => {
                let mut named = payload.clone();
                named.username = Some(username.clone());
                self.client.post(&self.url).json(&named).send().await
            }
            _ => self.client.post(&self.url).json(payload).send().await,
        }
        .map_err(|e| DeliveryError::Http(e.without_url().to_string()))?;

        check_webhook_response(response).await
    }
}
