//! Diagnostic channel between the relay core and its host.
//!
//! The core never returns errors across the event boundary. Anything worth
//! reporting (unmatched lines, partially extracted signs, failed deliveries,
//! bad routes) is handed to an injected [`DiagnosticSink`] instead.

use std::sync::Mutex;

use tracing::{debug, error, warn};

use crate::classifier::Family;
use crate::transports::DeliveryError;

/// How loud a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Expected noise.
    Debug,
    /// Data problem that degraded an event.
    Warn,
    /// Delivery or configuration failure.
    Error,
}

/// Something the core wants the host to know about.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Diagnostic {
    /// No catalog entry matched the line.
    #[error("unrecognized line: {line}")]
    UnrecognizedLine {
        /// Raw line text.
        line: String,
    },

    /// A pattern matched but a sub-case could not be resolved.
    #[error("partial extraction in {family} sign: {detail}")]
    PartialExtraction {
        /// Family whose extractor degraded.
        family: Family,
        /// What could not be resolved.
        detail: String,
    },

    /// A sink rejected or failed a payload.
    #[error("delivery to {destination} failed: {source}")]
    DestinationDelivery {
        /// Destination name from configuration.
        destination: String,
        /// Underlying failure.
        source: DeliveryError,
    },

    /// Configuration referenced something the registry cannot provide.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Free-form note.
    #[error("{0}")]
    Note(String),
}

impl Diagnostic {
    /// Severity this diagnostic is normally reported at.
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::UnrecognizedLine { .. } | Self::Note(_) => Severity::Debug,
            Self::PartialExtraction { .. } => Severity::Warn,
            Self::DestinationDelivery { .. } | Self::Configuration(_) => Severity::Error,
        }
    }
}

/// Receiver for diagnostics. Implementations must not panic.
pub trait DiagnosticSink: Send + Sync {
    /// Record one diagnostic.
    fn report(&self, severity: Severity, diagnostic: Diagnostic);

    /// Record a diagnostic at its default severity.
    fn emit(&self, diagnostic: Diagnostic) {
        let severity = diagnostic.default_severity();
        self.report(severity, diagnostic);
    }
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, severity: Severity, diagnostic: Diagnostic) {
        match severity {
            Severity::Debug => debug!(diagnostic = %diagnostic, "relay diagnostic"),
            Severity::Warn => warn!(diagnostic = %diagnostic, "relay diagnostic"),
            Severity::Error => error!(diagnostic = %diagnostic, "relay diagnostic"),
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<(Severity, Diagnostic)>>,
}

impl CollectingSink {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<(Severity, Diagnostic)> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<(Severity, Diagnostic)> {
        match self.entries.lock() {
            Ok(mut entries) => std::mem::take(&mut *entries),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    /// Number of entries at `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.entries()
            .iter()
            .filter(|(s, _)| *s == severity)
            .count()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, severity: Severity, diagnostic: Diagnostic) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push((severity, diagnostic)),
            Err(poisoned) => poisoned.into_inner().push((severity, diagnostic)),
        }
    }
}
