//! Transports: a formatter plus a sink, built per destination.
//!
//! Three kinds exist:
//! - `discord`: render and post immediately to a webhook
//! - `newusers`: queue registrations and post them after a delay
//! - `stdout`: render and print JSON lines, for dry runs

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{ConfigError, TransportConfig};
use crate::diagnostics::DiagnosticSink;
use crate::event::Event;
use crate::formats::{FormatRegistry, Formatter, Payload, RenderContext};

pub mod delayed;
pub mod sink;
pub mod webhook;

pub use delayed::DelayedTransport;
pub use sink::{Sink, StdoutSink};
pub use webhook::WebhookSink;

/// Kind of transport, as written in `[transports.<name>] kind = "..."`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Immediate webhook delivery.
    Discord,
    /// Delayed webhook delivery of registrations.
    NewUsers,
    /// JSON lines on stdout.
    Stdout,
}

impl TransportKind {
    /// Configuration name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discord => "discord",
            Self::NewUsers => "newusers",
            Self::Stdout => "stdout",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a payload did not reach its destination.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// Request could not be sent or the response could not be read.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Endpoint answered with a non-success status.
    #[error("endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Shortened response body.
        body: String,
    },

    /// Endpoint asked us to slow down. Not retried.
    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited {
        /// Seconds the endpoint asked us to wait, when given.
        retry_after_secs: Option<u64>,
    },

    /// Payload could not be serialized.
    #[error("payload serialization failed: {0}")]
    Serialize(String),

    /// Output is gone.
    #[error("destination closed")]
    Closed,
}

/// What happened to an event handed to a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Sent to the sink.
    Sent,
    /// Formatter had nothing to render.
    Skipped,
    /// Queued for later delivery.
    Queued,
}

/// A destination: renders events and hands them to its sink.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Destination name from configuration.
    fn name(&self) -> &str;

    /// Kind of transport.
    fn kind(&self) -> TransportKind;

    /// Render `event` and deliver (or queue) it.
    async fn deliver(
        &self,
        ctx: &RenderContext,
        event: Arc<Event>,
    ) -> Result<Delivery, DeliveryError>;

    /// Deliver everything queued, ignoring any delay. Returns the number of
    /// payloads sent.
    async fn flush(&self) -> usize {
        0
    }

    /// Start the transport's own background task, if it has one.
    fn spawn_background(
        self: Arc<Self>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Option<JoinHandle<()>> {
        drop(shutdown_rx);
        None
    }
}

/// Renders and sends immediately.
pub struct DirectTransport {
    name: String,
    kind: TransportKind,
    formatter: Arc<dyn Formatter>,
    sink: Arc<dyn Sink>,
}

impl fmt::Debug for DirectTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectTransport")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl DirectTransport {
    /// Transport named `name` rendering with `formatter` into `sink`.
    pub fn new(
        name: impl Into<String>,
        kind: TransportKind,
        formatter: Arc<dyn Formatter>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            formatter,
            sink,
        }
    }

    /// Render `event` and send the result, if any.
    ///
    /// # Errors
    ///
    /// Returns whatever the sink reports.
    pub async fn send_now(
        &self,
        ctx: &RenderContext,
        event: &Event,
    ) -> Result<Delivery, DeliveryError> {
        match self.render(ctx, event) {
            Some(payload) => {
                self.send_payload(&payload).await?;
                Ok(Delivery::Sent)
            }
            None => Ok(Delivery::Skipped),
        }
    }

    /// Render `event` with this transport's format. `None` when the format has
    /// nothing to say about it.
    pub fn render(&self, ctx: &RenderContext, event: &Event) -> Option<Payload> {
        self.formatter
            .render(ctx, event)
            .filter(|payload| !payload.is_empty())
    }

    /// Hand an already rendered payload to the sink.
    pub async fn send_payload(&self, payload: &Payload) -> Result<(), DeliveryError> {
        self.sink.send(payload).await
    }
}

#[async_trait]
impl Transport for DirectTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn deliver(
        &self,
        ctx: &RenderContext,
        event: Arc<Event>,
    ) -> Result<Delivery, DeliveryError> {
        self.send_now(ctx, &event).await
    }
}

/// Resolve the webhook URL of a transport section.
///
/// An explicit `url` wins; otherwise `id` plus `token` (or the variable named
/// by `token_env`) build one.
///
/// # Errors
///
/// Returns [`ConfigError::MissingSecret`] when no usable combination is set.
pub fn resolve_webhook_url(
    name: &str,
    config: &TransportConfig,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    if let Some(url) = &config.url {
        return Ok(url.clone());
    }
    let token = config
        .token
        .clone()
        .or_else(|| config.token_env.as_deref().and_then(env));
    match (&config.id, token) {
        (Some(id), Some(token)) => Ok(webhook::webhook_url(id, &token)),
        _ => Err(ConfigError::MissingSecret {
            destination: name.to_owned(),
        }),
    }
}

/// Everything a transport factory needs besides its own section.
pub struct BuildContext<'a> {
    /// Format lookup.
    pub formats: &'a FormatRegistry,
    /// Shared HTTP client.
    pub client: reqwest::Client,
    /// Where background transports report failures.
    pub diagnostics: Arc<dyn DiagnosticSink>,
    /// Environment lookup for `token_env`.
    pub env: &'a dyn Fn(&str) -> Option<String>,
}

/// Build the transport configured as `name`.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the format is unknown or incompatible, or
/// the webhook secret is missing.
pub fn build_transport(
    name: &str,
    config: &TransportConfig,
    cx: &BuildContext<'_>,
) -> Result<Arc<dyn Transport>, ConfigError> {
    let formatter = cx.formats.build(name, &config.format, config.kind)?;

    match config.kind {
        TransportKind::Stdout => Ok(Arc::new(DirectTransport::new(
            name,
            config.kind,
            formatter,
            Arc::new(StdoutSink::new(name)),
        ))),
        TransportKind::Discord => {
            let url = resolve_webhook_url(name, config, cx.env)?;
            let sink = WebhookSink::new(url, config.username.clone(), cx.client.clone());
            Ok(Arc::new(DirectTransport::new(
                name,
                config.kind,
                formatter,
                Arc::new(sink),
            )))
        }
        TransportKind::NewUsers => {
            if config.flush_interval_secs == 0 {
                return Err(ConfigError::InvalidOption {
                    component: "transport",
                    detail: format!("{name:?}: flush_interval_secs must be positive"),
                });
            }
            let url = resolve_webhook_url(name, config, cx.env)?;
            let sink = WebhookSink::new(url, config.username.clone(), cx.client.clone());
            let direct = DirectTransport::new(name, config.kind, formatter, Arc::new(sink));
            Ok(Arc::new(DelayedTransport::new(
                direct,
                std::time::Duration::from_secs(config.delay_secs),
                std::time::Duration::from_secs(config.flush_interval_secs),
                Arc::clone(&cx.diagnostics),
            )))
        }
    }
}
