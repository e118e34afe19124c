//! Wiki host parsing and URL building.
//!
//! Signs link to wikis by full host name (`community.wikia.com`,
//! `de.harrypotter.wikia.com`, `harrypotter.fandom.com/de/...`). Hosts are
//! split into a subdomain, an optional language prefix and the registered
//! domain. Wikis on the commercial `fandom.com` network carry the language as
//! the first path segment instead of a host prefix.

use serde::{Deserialize, Serialize};

/// Registered domain of the commercial network.
pub const FANDOM_DOMAIN: &str = "fandom.com";

/// Domain used when a host has no registered domain part.
pub const DEFAULT_DOMAIN: &str = "wikia.com";

/// A wiki, as identified by its host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiRef {
    /// Wiki subdomain (`community`, `harrypotter`).
    pub subdomain: String,
    /// Language prefix, when not the default language.
    pub lang: Option<String>,
    /// Registered domain (`wikia.com`, `fandom.com`).
    pub domain: String,
    /// Whether the wiki lives on the commercial network.
    pub fandom: bool,
}

impl WikiRef {
    /// Wiki on the default domain with no language prefix.
    pub fn new(subdomain: &str) -> Self {
        Self {
            subdomain: subdomain.to_owned(),
            lang: None,
            domain: DEFAULT_DOMAIN.to_owned(),
            fandom: false,
        }
    }

    /// Parse a host name into a wiki reference.
    ///
    /// The last two labels form the domain. Of what remains, the last label is
    /// the subdomain and a preceding label is the language prefix.
    pub fn from_host(host: &str) -> Self {
        let host = host.trim_end_matches('.').to_lowercase();
        let labels: Vec<&str> = host.split('.').collect();

        let (prefix, domain) = match labels.len() {
            0..=2 => (Vec::new(), host.clone()),
            n => {
                let split = n.saturating_sub(2);
                (labels[..split].to_vec(), labels[split..].join("."))
            }
        };

        if prefix.is_empty() {
            // Bare domain: the host itself names the wiki.
            return Self {
                subdomain: labels.first().copied().unwrap_or_default().to_owned(),
                lang: None,
                fandom: false,
                domain: DEFAULT_DOMAIN.to_owned(),
            };
        }

        let subdomain = prefix.last().copied().unwrap_or_default().to_owned();
        let lang = if prefix.len() > 1 {
            Some(prefix[..prefix.len().saturating_sub(1)].join("."))
        } else {
            None
        };

        Self {
            subdomain,
            lang,
            fandom: domain == FANDOM_DOMAIN,
            domain,
        }
    }

    /// Parse a host plus the language segment some URLs carry in their path.
    ///
    /// A language already present as a host prefix wins over the path segment.
    pub fn from_parts(host: &str, path_lang: Option<&str>) -> Self {
        let mut wiki = Self::from_host(host);
        if wiki.lang.is_none() {
            wiki.lang = path_lang.filter(|l| !l.is_empty()).map(str::to_owned);
        }
        wiki
    }

    /// Base URL of the wiki, without a trailing slash.
    pub fn base_url(&self) -> String {
        match (&self.lang, self.fandom) {
            (Some(lang), true) => format!("https://{}.{}/{lang}", self.subdomain, self.domain),
            (Some(lang), false) => format!("https://{lang}.{}.{}", self.subdomain, self.domain),
            (None, _) => format!("https://{}.{}", self.subdomain, self.domain),
        }
    }

    /// `lang.subdomain` or just `subdomain`, as written in report commands.
    pub fn qualified_name(&self) -> String {
        match &self.lang {
            Some(lang) => format!("{lang}.{}", self.subdomain),
            None => self.subdomain.clone(),
        }
    }
}

/// Encode a page or user name for use in a wiki URL path.
///
/// Spaces become underscores, everything outside the URL-safe set is
/// percent-encoded.
pub fn encode_title(title: &str) -> String {
    url::form_urlencoded::byte_serialize(title.replace(' ', "_").as_bytes()).collect()
}
