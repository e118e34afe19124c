//! Stateless built-in filters.

use std::sync::Arc;

use super::{Filter, Verdict};
use crate::config::{ConfigError, FilterConfig};
use crate::event::{ActorClass, Event, EventKind};

fn verdict(accept: bool) -> Verdict {
    if accept {
        Verdict::Accept
    } else {
        Verdict::Reject
    }
}

/// Accepts every actionable event. List-absence replies are never routed.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllFilter;

impl AllFilter {
    /// Factory for the `all` kind.
    pub fn build(_config: &FilterConfig) -> Result<Arc<dyn Filter>, ConfigError> {
        Ok(Arc::new(Self))
    }
}

impl Filter for AllFilter {
    fn evaluate(&self, event: &Event) -> Verdict {
        verdict(!matches!(event, Event::ListAbsence))
    }
}

/// Accepts Discussions activity.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscussionsFilter;

impl DiscussionsFilter {
    /// Factory for the `discussions` kind.
    pub fn build(_config: &FilterConfig) -> Result<Arc<dyn Filter>, ConfigError> {
        Ok(Arc::new(Self))
    }
}

impl Filter for DiscussionsFilter {
    fn evaluate(&self, event: &Event) -> Verdict {
        verdict(event.kind() == EventKind::DiscussionAction)
    }
}

/// Accepts account registrations.
#[derive(Debug, Default, Clone, Copy)]
pub struct NewUsersFilter;

impl NewUsersFilter {
    /// Factory for the `newusers` kind.
    pub fn build(_config: &FilterConfig) -> Result<Arc<dyn Filter>, ConfigError> {
        Ok(Arc::new(Self))
    }
}

impl Filter for NewUsersFilter {
    fn evaluate(&self, event: &Event) -> Verdict {
        verdict(event.kind() == EventKind::NewUserRegistration)
    }
}

/// Allow-list filter over event type, wiki and actor class.
///
/// Every non-empty list must match. A wiki entry matches either the bare
/// subdomain or `lang.subdomain`. Events without a wiki (or actor class) fail a
/// non-empty wiki (or actor class) list.
#[derive(Debug, Default, Clone)]
pub struct CustomFilter {
    types: Vec<EventKind>,
    wikis: Vec<String>,
    user_types: Vec<ActorClass>,
}

impl CustomFilter {
    /// Filter from already-parsed allow-lists.
    pub fn new(types: Vec<EventKind>, wikis: Vec<String>, user_types: Vec<ActorClass>) -> Self {
        Self {
            types,
            wikis,
            user_types,
        }
    }

    /// Factory for the `custom` kind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for an unknown type tag or
    /// actor class.
    pub fn build(config: &FilterConfig) -> Result<Arc<dyn Filter>, ConfigError> {
        let types = config
            .types
            .iter()
            .map(|tag| {
                EventKind::parse(tag).ok_or_else(|| ConfigError::InvalidOption {
                    component: "filter",
                    detail: format!("unknown event type {tag:?}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let user_types = config
            .user_types
            .iter()
            .map(|token| {
                ActorClass::from_token(token).ok_or_else(|| ConfigError::InvalidOption {
                    component: "filter",
                    detail: format!("unknown actor class {token:?}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Arc::new(Self::new(types, config.wikis.clone(), user_types)))
    }

    fn type_matches(&self, event: &Event) -> bool {
        self.types.is_empty() || self.types.contains(&event.kind())
    }

    fn wiki_matches(&self, event: &Event) -> bool {
        if self.wikis.is_empty() {
            return true;
        }
        event.wiki().is_some_and(|wiki| {
            let qualified = wiki.qualified_name();
            self.wikis
                .iter()
                .any(|w| *w == wiki.subdomain || *w == qualified)
        })
    }

    fn actor_matches(&self, event: &Event) -> bool {
        self.user_types.is_empty()
            || event
                .actor_class()
                .is_some_and(|class| self.user_types.contains(&class))
    }
}

impl Filter for CustomFilter {
    fn evaluate(&self, event: &Event) -> Verdict {
        verdict(
            !matches!(event, Event::ListAbsence)
                && self.type_matches(event)
                && self.wiki_matches(event)
                && self.actor_matches(event),
        )
    }
}
