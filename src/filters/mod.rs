//! Route filters.
//!
//! A filter decides whether a route wants an event. Filters are built once at
//! startup from `[filters.<name>]` sections through a [`FilterRegistry`] that
//! maps a `kind` to a factory.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ConfigError, FilterConfig};
use crate::event::Event;

pub mod builtin;
pub mod spam;

/// Outcome of evaluating a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Route does not want the event.
    Reject,
    /// Route wants the event.
    Accept,
    /// Route wants the event and it should be flagged as urgent.
    Urgent,
}

impl Verdict {
    /// Whether the route should receive the event.
    pub fn accepted(self) -> bool {
        !matches!(self, Self::Reject)
    }
}

/// Predicate over events. Filters never mutate the event.
pub trait Filter: Send + Sync {
    /// Evaluate `event`. May update small bounded internal state.
    fn evaluate(&self, event: &Event) -> Verdict;

    /// Convenience: whether `event` is accepted at all.
    fn accepts(&self, event: &Event) -> bool {
        self.evaluate(event).accepted()
    }
}

/// Builds a filter from its configuration section.
pub type FilterFactory = fn(&FilterConfig) -> Result<Arc<dyn Filter>, ConfigError>;

/// Filter kind name to factory.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    factories: HashMap<String, FilterFactory>,
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("FilterRegistry").field("kinds", &kinds).finish()
    }
}

impl FilterRegistry {
    /// Registry with no kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `all`, `discussions`, `newusers`, `spam` and `custom`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("all", builtin::AllFilter::build);
        registry.register("discussions", builtin::DiscussionsFilter::build);
        registry.register("newusers", builtin::NewUsersFilter::build);
        registry.register("spam", spam::SpamFilter::build);
        registry.register("custom", builtin::CustomFilter::build);
        registry
    }

    /// Register (or replace) a kind.
    pub fn register(&mut self, kind: &str, factory: FilterFactory) {
        self.factories.insert(kind.to_owned(), factory);
    }

    /// Whether `kind` is known.
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Build the filter configured as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKind`] for an unregistered kind, or
    /// whatever the factory rejects.
    pub fn build(&self, name: &str, config: &FilterConfig) -> Result<Arc<dyn Filter>, ConfigError> {
        let factory = self
            .factories
            .get(&config.kind)
            .ok_or_else(|| ConfigError::UnknownKind {
                component: "filter",
                name: name.to_owned(),
                kind: config.kind.clone(),
            })?;
        factory(config)
    }
}
