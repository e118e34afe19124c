//! Sign classification: match a raw line against the pattern catalog and
//! extract a typed [`Event`].
//!
//! The [`PatternCatalog`] is compiled and validated once. [`Classifier`] is a
//! pure function of (line, catalog); anything it wants to report goes to the
//! injected [`DiagnosticSink`].

pub mod catalog;
pub mod extract;
pub mod wiki;

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use regex::Regex;
use serde::Serialize;

use crate::diagnostics::{Diagnostic, DiagnosticSink, Severity};
use crate::event::{Event, EventKind};
use extract::{ExtractContext, ExtractFn};

/// Sign family, one per catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Family {
    /// Discussions post activity.
    Discussions,
    /// Spam detector report.
    Spam,
    /// Account registration.
    NewUser,
    /// Edit, creation or log action.
    Edit,
    /// Text replacement.
    Replace,
    /// File upload.
    Upload,
    /// Block or unblock.
    Block,
    /// List add, update or info.
    ListAction,
    /// List removal.
    ListRemoval,
    /// Not-on-list reply.
    ListAbsence,
}

impl Family {
    /// Event kind this family produces.
    pub fn kind(self) -> EventKind {
        match self {
            Self::Discussions => EventKind::DiscussionAction,
            Self::Spam => EventKind::SpamReport,
            Self::NewUser => EventKind::NewUserRegistration,
            Self::Edit | Self::Replace => EventKind::Edit,
            Self::Upload => EventKind::Upload,
            Self::Block => EventKind::Block,
            Self::ListAction => EventKind::ListAction,
            Self::ListRemoval => EventKind::ListRemoval,
            Self::ListAbsence => EventKind::ListAbsence,
        }
    }

    /// Short name used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discussions => "discussions",
            Self::Spam => "spam",
            Self::NewUser => "new-user",
            Self::Edit => "edit",
            Self::Replace => "replace",
            Self::Upload => "upload",
            Self::Block => "block",
            Self::ListAction => "list-action",
            Self::ListRemoval => "list-removal",
            Self::ListAbsence => "list-absence",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative catalog entry: a template and the extractor for its captures.
#[derive(Clone, Copy)]
pub struct CatalogEntry {
    /// Family the template belongs to.
    pub family: Family,
    /// Regex with named groups, anchored at line start.
    pub pattern: &'static str,
    /// Named groups the extractor reads.
    pub fields: &'static [&'static str],
    /// Capture-to-event conversion.
    pub extract: ExtractFn,
}

impl fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("family", &self.family)
            .field("pattern", &self.pattern)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Catalog construction failure.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Pattern does not compile.
    #[error("pattern for {family} does not compile: {source}")]
    InvalidPattern {
        /// Offending family.
        family: Family,
        /// Regex compiler error.
        source: regex::Error,
    },

    /// Declared field has no named group in the pattern.
    #[error("pattern for {family} has no group named {field:?}")]
    MissingGroup {
        /// Offending family.
        family: Family,
        /// Missing group name.
        field: &'static str,
    },

    /// Pattern not anchored at line start.
    #[error("pattern for {family} must start with '^'")]
    Unanchored {
        /// Offending family.
        family: Family,
    },
}

#[derive(Debug)]
struct CompiledEntry {
    entry: CatalogEntry,
    regex: Regex,
}

/// Ordered, compiled set of templates.
#[derive(Debug)]
pub struct PatternCatalog {
    entries: Vec<CompiledEntry>,
}

impl PatternCatalog {
    /// Compile and validate `entries`, keeping their order as match priority.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        let entries = entries
            .into_iter()
            .map(|entry| {
                let regex =
                    Regex::new(entry.pattern).map_err(|source| CatalogError::InvalidPattern {
                        family: entry.family,
                        source,
                    })?;
                Ok(CompiledEntry { entry, regex })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        let catalog = Self { entries };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The built-in sign templates.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(catalog::builtin_entries())
    }

    /// Check every entry is anchored and declares only groups its pattern has.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for CompiledEntry { entry, regex } in &self.entries {
            if !entry.pattern.starts_with('^') {
                return Err(CatalogError::Unanchored {
                    family: entry.family,
                });
            }
            let groups: Vec<&str> = regex.capture_names().flatten().collect();
            if let Some(field) = entry.fields.iter().copied().find(|f| !groups.contains(f)) {
                return Err(CatalogError::MissingGroup {
                    family: entry.family,
                    field,
                });
            }
        }
        Ok(())
    }

    /// Families in priority order.
    pub fn families(&self) -> Vec<Family> {
        self.entries.iter().map(|c| c.entry.family).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Why a line produced no event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "family", rename_all = "kebab-case")]
pub enum UnknownReason {
    /// No template matched.
    NoMatch,
    /// A template matched but neither its extractor nor the empty fallback
    /// for its family could build an event.
    ExtractorFailed(Family),
}

/// A line that did not become an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownLine {
    /// Line text as received, minus the line terminator.
    pub raw: String,
    /// Why it was not classified.
    pub reason: UnknownReason,
}

/// Outcome of classifying one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Matched and extracted.
    Event(Event),
    /// Not routable.
    Unknown(UnknownLine),
}

impl Classification {
    /// Type tag of the outcome.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Event(event) => event.kind(),
            Self::Unknown(_) => EventKind::Unknown,
        }
    }

    /// The event, if one was produced.
    pub fn into_event(self) -> Option<Event> {
        match self {
            Self::Event(event) => Some(event),
            Self::Unknown(_) => None,
        }
    }
}

/// Turns raw sign lines into events.
pub struct Classifier {
    catalog: PatternCatalog,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("catalog", &self.catalog.families())
            .finish_non_exhaustive()
    }
}

impl Classifier {
    /// Classifier over `catalog`, reporting to `diagnostics`.
    pub fn new(catalog: PatternCatalog, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            catalog,
            diagnostics,
        }
    }

    /// Classifier over the built-in catalog.
    pub fn builtin(diagnostics: Arc<dyn DiagnosticSink>) -> Result<Self, CatalogError> {
        Ok(Self::new(PatternCatalog::builtin()?, diagnostics))
    }

    /// The catalog in use.
    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Classify one line. The first matching template wins.
    pub fn classify(&self, line: &str) -> Classification {
        let line = line.trim_end_matches(['\r', '\n']);

        for CompiledEntry { entry, regex } in &self.catalog.entries {
            let Some(caps) = regex.captures(line) else {
                continue;
            };

            let mut ctx = ExtractContext::new(entry.family);
            let extracted = catch_unwind(AssertUnwindSafe(|| (entry.extract)(&caps, &mut ctx)));

            for (severity, diagnostic) in ctx.into_issues() {
                self.diagnostics.report(severity, diagnostic);
            }

            let event = match extracted {
                Ok(event) => event,
                Err(_) => match catch_unwind(AssertUnwindSafe(|| {
                    extract::fallback(entry.family, &caps)
                })) {
                    Ok(event) => {
                        self.diagnostics.report(
                            Severity::Warn,
                            Diagnostic::PartialExtraction {
                                family: entry.family,
                                detail: "extractor panicked, fields left empty".to_owned(),
                            },
                        );
                        event
                    }
                    Err(_) => {
                        self.diagnostics.report(
                            Severity::Error,
                            Diagnostic::PartialExtraction {
                                family: entry.family,
                                detail: "extractor panicked".to_owned(),
                            },
                        );
                        return Classification::Unknown(UnknownLine {
                            raw: line.to_owned(),
                            reason: UnknownReason::ExtractorFailed(entry.family),
                        });
                    }
                },
            };
            return Classification::Event(event);
        }

        self.diagnostics.emit(Diagnostic::UnrecognizedLine {
            line: line.to_owned(),
        });
        Classification::Unknown(UnknownLine {
            raw: line.to_owned(),
            reason: UnknownReason::NoMatch,
        })
    }
}
