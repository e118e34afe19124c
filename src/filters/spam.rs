//! Spam report filter with repeat-offender tracking.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use super::{Filter, Verdict};
use crate::config::{ConfigError, FilterConfig};
use crate::event::Event;

/// Users remembered when the configuration does not say.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Accepts spam reports; a user already reported before is flagged urgent.
///
/// Remembers, per user, the wikis they were reported on. The memory is an LRU
/// bounded by `capacity` users, so long-running relays do not grow without
/// limit.
pub struct SpamFilter {
    seen: Mutex<LruCache<String, BTreeSet<String>>>,
}

impl std::fmt::Debug for SpamFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpamFilter")
            .field("tracked", &self.tracked())
            .finish()
    }
}

impl SpamFilter {
    /// Filter remembering at most `capacity` users.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            seen: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Factory for the `spam` kind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] when `capacity` is zero.
    pub fn build(config: &FilterConfig) -> Result<Arc<dyn Filter>, ConfigError> {
        let capacity = config.capacity.unwrap_or(DEFAULT_CAPACITY);
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| ConfigError::InvalidOption {
            component: "filter",
            detail: "spam filter capacity must be positive".to_owned(),
        })?;
        Ok(Arc::new(Self::new(capacity)))
    }

    /// Number of users currently remembered.
    pub fn tracked(&self) -> usize {
        match self.seen.lock() {
            Ok(seen) => seen.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Wikis `user` has been reported on, sorted by name.
    pub fn wikis_for(&self, user: &str) -> Vec<String> {
        let read = |seen: &LruCache<String, BTreeSet<String>>| -> Vec<String> {
            seen.peek(user)
                .map(|wikis| wikis.iter().cloned().collect())
                .unwrap_or_default()
        };
        match self.seen.lock() {
            Ok(seen) => read(&*seen),
            Err(poisoned) => read(&*poisoned.into_inner()),
        }
    }

    fn record(&self, user: &str, wiki: String) -> bool {
        let mut seen = match self.seen.lock() {
            Ok(seen) => seen,
            Err(poisoned) => poisoned.into_inner(),
        };
        match seen.get_mut(user) {
            Some(wikis) => {
                wikis.insert(wiki);
                true
            }
            None => {
                seen.put(user.to_owned(), BTreeSet::from([wiki]));
                false
            }
        }
    }
}

impl Filter for SpamFilter {
    fn evaluate(&self, event: &Event) -> Verdict {
        let Event::SpamReport(report) = event else {
            return Verdict::Reject;
        };
        if self.record(&report.user, report.wiki.qualified_name()) {
            Verdict::Urgent
        } else {
            Verdict::Accept
        }
    }
}
