//! The relay: classifier plus dispatcher, built once from [`Config`].
//!
//! Broken filters, transports and routes are reported to the diagnostic sink
//! and left out; the relay still starts with whatever remains.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::classifier::{Classification, Classifier};
use crate::config::{Config, ConfigError};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::dispatch::{DeliveryReport, Dispatcher, Route};
use crate::event::{Event, EventKind};
use crate::filters::{Filter, FilterRegistry};
use crate::formats::FormatRegistry;
use crate::transports::{build_transport, BuildContext, Transport};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// One line from the source, with the channel it was seen in when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// Line text.
    pub text: String,
    /// Channel the line arrived on.
    pub channel: Option<String>,
}

impl RawLine {
    /// A line with no channel context.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            channel: None,
        }
    }

    /// A line seen in `channel`.
    pub fn in_channel(text: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            channel: Some(channel.into()),
        }
    }

    /// Parse one input line. `#channel<TAB>text` carries channel context;
    /// anything else is taken as bare text.
    pub fn parse_tagged(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        match line.split_once('\t') {
            Some((channel, text)) if channel.starts_with('#') && !channel.contains(' ') => {
                Self::in_channel(text, channel)
            }
            _ => Self::new(line),
        }
    }
}

/// What the relay did with a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Came from another channel.
    Ignored,
    /// Not classified; nothing dispatched.
    Unknown,
    /// Classified but never routed.
    Dropped(EventKind),
    /// Handed to `deliveries` destinations.
    Dispatched {
        /// Event type.
        kind: EventKind,
        /// Number of (route, destination) deliveries.
        deliveries: usize,
    },
}

/// Routes built from configuration, plus whatever could not be built.
pub struct RouteTable {
    /// Usable routes.
    pub routes: Vec<Route>,
    /// Components and routes that were skipped.
    pub errors: Vec<ConfigError>,
}

/// Resolve `[filters]`, `[transports]` and `[routes]` against the registries.
///
/// Never fails: every problem ends up in [`RouteTable::errors`].
pub fn build_routes(
    config: &Config,
    filters: &FilterRegistry,
    cx: &BuildContext<'_>,
) -> RouteTable {
    let mut errors = Vec::new();

    let mut built_filters: BTreeMap<&str, Arc<dyn Filter>> = BTreeMap::new();
    for (name, section) in &config.filters {
        match filters.build(name, section) {
            Ok(filter) => {
                built_filters.insert(name.as_str(), filter);
            }
            Err(e) => errors.push(e),
        }
    }

    let mut built_transports: BTreeMap<&str, Arc<dyn Transport>> = BTreeMap::new();
    for (name, section) in &config.transports {
        match build_transport(name, section, cx) {
            Ok(transport) => {
                built_transports.insert(name.as_str(), transport);
            }
            Err(e) => errors.push(e),
        }
    }

    let mut routes = Vec::new();
    for (filter_name, targets) in &config.routes {
        let Some(filter) = built_filters.get(filter_name.as_str()) else {
            errors.push(ConfigError::UnknownFilter {
                filter: filter_name.clone(),
            });
            continue;
        };

        let mut destinations = Vec::new();
        for destination in targets.names() {
            match built_transports.get(destination) {
                Some(transport) => destinations.push(Arc::clone(transport)),
                None => errors.push(ConfigError::UnknownDestination {
                    filter: filter_name.clone(),
                    destination: destination.to_owned(),
                }),
            }
        }
        if destinations.is_empty() {
            continue;
        }

        routes.push(Route {
            filter_name: filter_name.clone(),
            filter: Arc::clone(filter),
            destinations,
        });
    }

    RouteTable { routes, errors }
}

/// Classifies lines and dispatches the resulting events.
pub struct Relay {
    classifier: Classifier,
    dispatcher: Dispatcher,
    channel: Option<String>,
    shutdown_grace: Duration,
    config_errors: Vec<ConfigError>,
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("channel", &self.channel)
            .field("dispatcher", &self.dispatcher)
            .field("config_errors", &self.config_errors.len())
            .finish_non_exhaustive()
    }
}

impl Relay {
    /// Relay from already-built parts.
    pub fn new(classifier: Classifier, dispatcher: Dispatcher, channel: Option<String>) -> Self {
        Self {
            classifier,
            dispatcher,
            channel,
            shutdown_grace: Duration::from_secs(10),
            config_errors: Vec::new(),
        }
    }

    /// Build the relay described by `config`.
    ///
    /// `env` resolves `token_env` references. Configuration problems are
    /// reported to `diagnostics` and kept in [`Relay::config_errors`].
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in catalog is invalid or the HTTP client
    /// cannot be created.
    pub fn from_config(
        config: &Config,
        diagnostics: Arc<dyn DiagnosticSink>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let classifier =
            Classifier::builtin(Arc::clone(&diagnostics)).context("invalid pattern catalog")?;

        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        let formats = FormatRegistry::with_builtins();
        let cx = BuildContext {
            formats: &formats,
            client,
            diagnostics: Arc::clone(&diagnostics),
            env,
        };

        let RouteTable { routes, errors } =
            build_routes(config, &FilterRegistry::with_builtins(), &cx);
        for error in &errors {
            diagnostics.emit(Diagnostic::Configuration(error.to_string()));
        }
        info!(
            routes = routes.len(),
            skipped = errors.len(),
            channel = ?config.source.channel,
            "relay configured"
        );

        Ok(Self {
            classifier,
            dispatcher: Dispatcher::new(routes, diagnostics),
            channel: config.source.channel.clone(),
            shutdown_grace: Duration::from_secs(config.runtime.shutdown_grace_secs),
            config_errors: errors,
        })
    }

    /// Problems found while building from configuration.
    pub fn config_errors(&self) -> &[ConfigError] {
        &self.config_errors
    }

    /// The dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The classifier.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Whether a line seen in `channel` should be classified.
    ///
    /// Lines without channel context always pass. Channel names compare
    /// case-insensitively.
    pub fn accepts_channel(&self, channel: Option<&str>) -> bool {
        match (&self.channel, channel) {
            (Some(wanted), Some(seen)) => wanted.eq_ignore_ascii_case(seen),
            _ => true,
        }
    }

    /// Classify `line` unless channel gating rejects it.
    pub fn classify(&self, line: &RawLine) -> Option<Classification> {
        if !self.accepts_channel(line.channel.as_deref()) {
            debug!(channel = ?line.channel, "ignoring line from other channel");
            return None;
        }
        Some(self.classifier.classify(&line.text))
    }

    fn routable(&self, line: &RawLine) -> Result<Event, LineOutcome> {
        match self.classify(line) {
            None => Err(LineOutcome::Ignored),
            Some(Classification::Unknown(_)) => Err(LineOutcome::Unknown),
            Some(Classification::Event(Event::ListAbsence)) => {
                debug!("list absence notice is not routed");
                Err(LineOutcome::Dropped(EventKind::ListAbsence))
            }
            Some(Classification::Event(event)) => Ok(event),
        }
    }

    /// Classify and dispatch without waiting for delivery.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn handle_line(&self, line: &RawLine) -> LineOutcome {
        match self.routable(line) {
            Ok(event) => {
                let kind = event.kind();
                let deliveries = self.dispatcher.dispatch(Arc::new(event));
                LineOutcome::Dispatched { kind, deliveries }
            }
            Err(outcome) => outcome,
        }
    }

    /// Classify and deliver, waiting for every destination.
    pub async fn deliver_line(&self, line: &RawLine) -> (LineOutcome, Vec<DeliveryReport>) {
        match self.routable(line) {
            Ok(event) => {
                let kind = event.kind();
                let reports = self.dispatcher.deliver_all(Arc::new(event)).await;
                let outcome = LineOutcome::Dispatched {
                    kind,
                    deliveries: reports.len(),
                };
                (outcome, reports)
            }
            Err(outcome) => (outcome, Vec::new()),
        }
    }

    /// Drain in-flight deliveries and queued destinations within the
    /// configured grace period. Returns `true` when everything finished.
    pub async fn shutdown(&self) -> bool {
        self.dispatcher.drain(self.shutdown_grace).await
    }
}
