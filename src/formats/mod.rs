//! Per-destination rendering of events into webhook payloads.
//!
//! A [`Formatter`] returns `None` when it has nothing to say about an event
//! (wrong family, or a transport it was not written for). Formats are looked
//! up by name in a [`FormatRegistry`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ConfigError;
use crate::event::Event;
use crate::transports::TransportKind;

pub mod activity;
pub mod discussions;
pub mod markup;
pub mod newusers;
pub mod payload;
pub mod plain_discussions;
pub mod spam;

pub use payload::{AllowedMentions, Embed, EmbedAuthor, EmbedField, Payload};

/// What a formatter knows about the destination it renders for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    /// Destination name from configuration.
    pub destination: String,
    /// Kind of transport that will carry the payload.
    pub transport: TransportKind,
    /// Set when the route's filter flagged the event as urgent.
    pub urgent: bool,
}

impl RenderContext {
    /// Non-urgent context for `destination`.
    pub fn new(destination: impl Into<String>, transport: TransportKind) -> Self {
        Self {
            destination: destination.into(),
            transport,
            urgent: false,
        }
    }

    /// Same context with the urgency flag set.
    pub fn urgent(mut self, urgent: bool) -> Self {
        self.urgent = urgent;
        self
    }
}

/// Renders events for one kind of destination.
pub trait Formatter: Send + Sync {
    /// Transport kinds this format was written for.
    fn supports(&self, transport: TransportKind) -> bool;

    /// Render the payload, or `None` when inapplicable.
    fn render(&self, ctx: &RenderContext, event: &Event) -> Option<Payload>;
}

/// Builds a formatter.
pub type FormatFactory = fn() -> Arc<dyn Formatter>;

/// Format name to factory.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    factories: HashMap<String, FormatFactory>,
}

impl FormatRegistry {
    /// Registry with no formats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in format.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("activity", || Arc::new(activity::ActivityFormat));
        registry.register("discussions", || {
            Arc::new(discussions::DiscussionsFormat)
        });
        registry.register("plain-discussions", || {
            Arc::new(plain_discussions::PlainDiscussionsFormat)
        });
        registry.register("spam", || Arc::new(spam::SpamFormat));
        registry.register("newusers", || Arc::new(newusers::NewUsersFormat));
        registry
    }

    /// Register (or replace) a format.
    pub fn register(&mut self, name: &str, factory: FormatFactory) {
        self.factories.insert(name.to_owned(), factory);
    }

    /// Build `format` for a transport of kind `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownFormat`] for an unregistered name and
    /// [`ConfigError::IncompatibleFormat`] when the format was not written for
    /// that transport kind.
    pub fn build(
        &self,
        destination: &str,
        format: &str,
        transport: TransportKind,
    ) -> Result<Arc<dyn Formatter>, ConfigError> {
        let factory = self
            .factories
            .get(format)
            .ok_or_else(|| ConfigError::UnknownFormat {
                destination: destination.to_owned(),
                format: format.to_owned(),
            })?;
        let formatter = factory();
        if !formatter.supports(transport) {
            return Err(ConfigError::IncompatibleFormat {
                destination: destination.to_owned(),
                format: format.to_owned(),
                transport,
            });
        }
        Ok(formatter)
    }
}
