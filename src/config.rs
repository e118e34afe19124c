//! Configuration loading and validation.
//!
//! Loads `~/.signwatch/config.toml` (or `--config`, or `$SIGNWATCH_CONFIG`).
//! Environment variables override file values; file values override defaults.
//!
//! ```toml
//! [source]
//! channel = "#cvn-wikia"
//!
//! [filters.everything]
//! kind = "all"
//!
//! [transports.main]
//! kind = "discord"
//! format = "activity"
//! id = "123"
//! token_env = "SIGNWATCH_MAIN_TOKEN"
//!
//! [routes]
//! everything = ["main"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::logging::LogSettings;
use crate::transports::TransportKind;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where lines come from.
    pub source: SourceConfig,
    /// Process settings.
    pub runtime: RuntimeConfig,
    /// Named filters (`[filters.<name>]`).
    pub filters: BTreeMap<String, FilterConfig>,
    /// Named destinations (`[transports.<name>]`).
    pub transports: BTreeMap<String, TransportConfig>,
    /// Filter name to destination name(s).
    pub routes: BTreeMap<String, RouteTargets>,
}

/// `[source]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Only lines from this channel are classified. `None` accepts every line.
    pub channel: Option<String>,
}

/// `[runtime]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// How long shutdown waits for in-flight deliveries and queue flushes.
    pub shutdown_grace_secs: u64,
    /// Log directory. Defaults to `~/.signwatch/logs`.
    pub log_dir: Option<PathBuf>,
    /// Rotated log file prefix.
    pub log_file: String,
    /// Log filter directive when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: default_shutdown_grace_secs(),
            log_dir: None,
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

/// One `[filters.<name>]` section. Which options apply depends on `kind`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Registered filter kind (`all`, `discussions`, `newusers`, `spam`, `custom`).
    pub kind: String,
    /// `custom`: accepted event type tags.
    pub types: Vec<String>,
    /// `custom`: accepted wiki subdomains.
    pub wikis: Vec<String>,
    /// `custom`: accepted actor classes.
    pub user_types: Vec<String>,
    /// `spam`: how many users to remember.
    pub capacity: Option<usize>,
}

/// One `[transports.<name>]` section.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Transport kind.
    pub kind: TransportKind,
    /// Registered format name.
    pub format: String,
    /// Full webhook URL. Wins over `id` and `token`.
    pub url: Option<String>,
    /// Webhook id.
    pub id: Option<String>,
    /// Webhook token. Prefer `token_env`.
    pub token: Option<String>,
    /// Name of the environment variable holding the webhook token.
    pub token_env: Option<String>,
    /// Username override sent with each payload.
    pub username: Option<String>,
    /// `newusers`: how long registrations are held.
    pub delay_secs: u64,
    /// `newusers`: how often the queue is checked.
    pub flush_interval_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Discord,
            format: String::new(),
            url: None,
            id: None,
            token: None,
            token_env: None,
            username: None,
            delay_secs: default_delay_secs(),
            flush_interval_secs: default_flush_interval_secs(),
        }
    }
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConfig")
            .field("kind", &self.kind)
            .field("format", &self.format)
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("id", &self.id)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_env", &self.token_env)
            .field("username", &self.username)
            .field("delay_secs", &self.delay_secs)
            .field("flush_interval_secs", &self.flush_interval_secs)
            .finish()
    }
}

/// Destinations of a route: one name or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RouteTargets {
    /// `filter = "dest"`
    One(String),
    /// `filter = ["a", "b"]`
    Many(Vec<String>),
}

impl RouteTargets {
    /// Destination names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::One(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// A component or route that could not be built. Reported and skipped; never
/// fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `kind` names nothing registered.
    #[error("{component} {name:?}: unknown kind {kind:?}")]
    UnknownKind {
        /// `filter` or `transport`.
        component: &'static str,
        /// Section name.
        name: String,
        /// The unknown kind.
        kind: String,
    },

    /// An option value was rejected by the component's factory.
    #[error("{component} option rejected: {detail}")]
    InvalidOption {
        /// `filter` or `transport`.
        component: &'static str,
        /// What was wrong.
        detail: String,
    },

    /// `format` names nothing registered.
    #[error("transport {destination:?}: unknown format {format:?}")]
    UnknownFormat {
        /// Transport name.
        destination: String,
        /// The unknown format.
        format: String,
    },

    /// The format cannot render for this transport kind.
    #[error("transport {destination:?}: format {format:?} does not support {transport} transports")]
    IncompatibleFormat {
        /// Transport name.
        destination: String,
        /// Format name.
        format: String,
        /// Transport kind.
        transport: TransportKind,
    },

    /// No webhook URL could be assembled.
    #[error("transport {destination:?}: no webhook url, or id with token/token_env")]
    MissingSecret {
        /// Transport name.
        destination: String,
    },

    /// A route names a filter that is not configured or failed to build.
    #[error("route {filter:?}: no such filter")]
    UnknownFilter {
        /// Filter name.
        filter: String,
    },

    /// A route names a destination that is not configured or failed to build.
    #[error("route {filter:?}: no such destination {destination:?}")]
    UnknownDestination {
        /// Filter name.
        filter: String,
        /// Destination name.
        destination: String,
    },
}

// Default value functions for serde

fn default_shutdown_grace_secs() -> u64 {
    10
}
fn default_log_file() -> String {
    "signwatch.log".to_owned()
}
fn default_log_level() -> String {
    "info".to_owned()
}
fn default_delay_secs() -> u64 {
    30 * 60
}
fn default_flush_interval_secs() -> u64 {
    5
}

impl Config {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails
    /// [`Config::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::load_from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
                    .with_context(|| format!("failed to parse config at {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config at {}: {e}",
                path.display()
            )),
        }
    }

    /// Resolve the config file path: `cli` wins, then `$SIGNWATCH_CONFIG`,
    /// then `~/.signwatch/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn config_path_with(
        cli: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<PathBuf> {
        if let Some(path) = cli {
            return Ok(path.to_path_buf());
        }
        if let Some(p) = env("SIGNWATCH_CONFIG") {
            return Ok(PathBuf::from(p));
        }
        Ok(config_dir()?.join("config.toml"))
    }

    /// Apply environment variable overrides.
    ///
    /// Takes a resolver function for testability.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("SIGNWATCH_CHANNEL") {
            self.source.channel = Some(v);
        }
        if let Some(v) = env("SIGNWATCH_SHUTDOWN_GRACE_SECS") {
            match v.parse() {
                Ok(n) => self.runtime.shutdown_grace_secs = n,
                Err(_) => tracing::warn!(
                    var = "SIGNWATCH_SHUTDOWN_GRACE_SECS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("SIGNWATCH_LOG_DIR") {
            self.runtime.log_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = env("SIGNWATCH_LOG_LEVEL") {
            self.runtime.log_level = v;
        }
    }

    /// Reject settings no component could run with.
    ///
    /// Broken filters, transports and routes are not checked here; they are
    /// reported and skipped when the relay is built.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.runtime.shutdown_grace_secs > 0,
            "runtime.shutdown_grace_secs must be positive"
        );
        ensure!(
            !self.runtime.log_file.trim().is_empty()
                && !self.runtime.log_file.contains(['/', '\\']),
            "runtime.log_file must be a plain file name"
        );
        if let Some(channel) = &self.source.channel {
            ensure!(
                !channel.trim().is_empty(),
                "source.channel must not be empty when set"
            );
        }
        Ok(())
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or has wrongly typed values.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }

    /// Log directory, falling back to `~/.signwatch/logs`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn log_dir(&self) -> Result<PathBuf> {
        match &self.runtime.log_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(config_dir()?.join("logs")),
        }
    }

    /// Everything [`crate::logging::init_production`] needs.
    ///
    /// # Errors
    ///
    /// Returns an error if the default log directory cannot be resolved.
    pub fn log_settings(&self) -> Result<LogSettings> {
        Ok(LogSettings {
            dir: self.log_dir()?,
            file_prefix: self.runtime.log_file.clone(),
            level: self.runtime.log_level.clone(),
        })
    }
}

/// Resolve the default config directory (`~/.signwatch/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".signwatch"))
}
