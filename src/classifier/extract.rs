//! Per-family extractors and the field conversions they share.
//!
//! Every extractor receives the named captures of its catalog pattern and
//! returns a complete [`Event`]. Sub-cases that cannot be resolved leave the
//! affected field empty and record a diagnostic on the [`ExtractContext`];
//! extractors never fail outright.

use std::collections::BTreeMap;

use regex::Captures;

use super::wiki::WikiRef;
use super::Family;
use crate::diagnostics::{Diagnostic, Severity};
use crate::event::{
    ActorClass, BlockAction, BlockEvent, DiscussionAction, DiscussionEvent, DiscussionTarget,
    EditAction, EditEvent, Event, ListAction, ListCode, ListEvent, NewUserEvent, SpamAction,
    SpamEvent, SpamType, UploadEvent,
};

/// Signature shared by all extractors.
pub type ExtractFn = fn(&Captures<'_>, &mut ExtractContext) -> Event;

/// Diagnostics collected while extracting one line.
#[derive(Debug)]
pub struct ExtractContext {
    family: Family,
    issues: Vec<(Severity, Diagnostic)>,
}

impl ExtractContext {
    /// Fresh context for one extraction.
    pub fn new(family: Family) -> Self {
        Self {
            family,
            issues: Vec::new(),
        }
    }

    /// Record an unresolved sub-case (warn).
    pub fn partial(&mut self, detail: impl Into<String>) {
        self.issues.push((
            Severity::Warn,
            Diagnostic::PartialExtraction {
                family: self.family,
                detail: detail.into(),
            },
        ));
    }

    /// Record a low-severity note about legacy input.
    pub fn note(&mut self, detail: impl Into<String>) {
        self.issues.push((
            Severity::Debug,
            Diagnostic::PartialExtraction {
                family: self.family,
                detail: detail.into(),
            },
        ));
    }

    /// Everything recorded, in order.
    pub fn into_issues(self) -> Vec<(Severity, Diagnostic)> {
        self.issues
    }
}

// ---------------------------------------------------------------------------
// Capture access
// ---------------------------------------------------------------------------

/// Non-empty capture text.
fn text<'h>(caps: &Captures<'h>, name: &str) -> Option<&'h str> {
    caps.name(name).map(|m| m.as_str()).filter(|s| !s.is_empty())
}

fn owned(caps: &Captures<'_>, name: &str) -> Option<String> {
    text(caps, name).map(str::to_owned)
}

/// Capture that the pattern always produces.
fn required(caps: &Captures<'_>, name: &str) -> String {
    caps.name(name)
        .map(|m| m.as_str().to_owned())
        .unwrap_or_default()
}

fn wiki(caps: &Captures<'_>) -> WikiRef {
    WikiRef::from_parts(
        caps.name("host").map(|m| m.as_str()).unwrap_or_default(),
        text(caps, "lang"),
    )
}

fn actor(caps: &Captures<'_>, ctx: &mut ExtractContext) -> ActorClass {
    let token = required(caps, "class");
    ActorClass::from_token(&token).unwrap_or_else(|| {
        ctx.partial(format!("unknown actor class {token:?}"));
        ActorClass::User
    })
}

/// Event of `family` with every resolvable field left empty.
///
/// Used when the family's extractor panics. Only plain capture text is read
/// back: user, wiki, actor class, page title, thread id and spam type.
pub fn fallback(family: Family, caps: &Captures<'_>) -> Event {
    let user = required(caps, "user");
    let list = |action, user| ListEvent {
        action,
        user,
        list: None,
        added_by: None,
        length: None,
        reason: None,
    };

    match family {
        Family::Edit | Family::Replace => Event::Edit(EditEvent {
            user_type: ActorClass::from_token(&required(caps, "class")).unwrap_or(ActorClass::User),
            user,
            action: None,
            title: required(caps, "title"),
            diff_size: None,
            watchlist: false,
            watched: None,
            blank: false,
            replace: None,
            wiki: wiki(caps),
            url_params: BTreeMap::new(),
            log: None,
            summary: None,
        }),
        Family::Discussions => Event::DiscussionAction(DiscussionEvent {
            user,
            action: None,
            target: None,
            title: None,
            reply_count: None,
            wiki: wiki(caps),
            thread_id: required(caps, "thread"),
            reply_id: None,
            summary: String::new(),
        }),
        Family::Spam => Event::SpamReport(SpamEvent {
            spam_type: if text(caps, "coi").is_some() {
                SpamType::Coi
            } else {
                SpamType::Hit
            },
            coi: None,
            percent: None,
            user,
            action: None,
            wiki: wiki(caps),
            oldid: None,
            title: None,
            url: None,
            filter: None,
        }),
        Family::NewUser => Event::NewUserRegistration(NewUserEvent {
            user,
            wiki: wiki(caps),
        }),
        Family::Upload => Event::Upload(UploadEvent {
            user_type: ActorClass::from_token(&required(caps, "class")).unwrap_or(ActorClass::User),
            user,
            reupload: false,
            namespace: String::new(),
            title: String::new(),
            wiki: wiki(caps),
        }),
        Family::Block => Event::Block(BlockEvent {
            action: BlockAction::Block,
            target: String::new(),
            user,
            length: None,
            reason: String::new(),
        }),
        Family::ListAction => Event::ListAction(list(ListAction::Info, user)),
        Family::ListRemoval => Event::ListRemoval(list(ListAction::Delete, user)),
        Family::ListAbsence => Event::ListAbsence,
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Parse a detector confidence token.
///
/// `direct` and `!` mean a certain match (1.0). Otherwise the token must be
/// plain digits with at most two decimals; `NaN`, `inf` and exponents are
/// rejected.
pub fn parse_percent(token: &str) -> Option<f64> {
    match token {
        "direct" | "!" => Some(1.0),
        other => {
            let (whole, fraction) = other.split_once('.').unwrap_or((other, "1"));
            let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
            if digits(whole) && digits(fraction) && fraction.len() <= 2 {
                other.parse::<f64>().ok()
            } else {
                None
            }
        }
    }
}

/// Parse a signed byte delta such as `+120`, `-5` or `0`.
pub fn parse_diff_size(token: &str) -> Option<i64> {
    token.strip_prefix('+').unwrap_or(token).parse().ok()
}

/// Result of interpreting the trailing path of a diff URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlTail {
    /// `key=value&...` query string.
    Params(BTreeMap<String, String>),
    /// Bare path; the last segment names a log action.
    Log(String),
}

/// Split the tail of a diff URL into query params or a log action tag.
pub fn parse_url_tail(tail: &str) -> UrlTail {
    if tail.contains('=') {
        let params = tail
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (key.to_owned(), value.to_owned()),
                None => (pair.to_owned(), String::new()),
            })
            .collect();
        UrlTail::Params(params)
    } else {
        let segment = tail.rsplit('/').next().unwrap_or(tail);
        UrlTail::Log(segment.to_owned())
    }
}

/// Action phrase of an edit sign, with its auxiliary captures.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionPhrase<'a> {
    /// Whole phrase.
    pub phrase: &'a str,
    /// Watched edit summary, for `used edit summary "..."`.
    pub summary: Option<&'a str>,
    /// Whether ` in creating` followed the watched summary.
    pub creating: bool,
    /// Watch word, for `create containing watch word "..."`.
    pub watch_word: Option<&'a str>,
}

/// Resolved action phrase.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedAction {
    /// Edit or create; absent when unrecognized.
    pub action: Option<EditAction>,
    /// Watched summary or watch word.
    pub watched: Option<String>,
    /// Blanked flag.
    pub blank: bool,
}

/// Map an edit action phrase to an action and auxiliary fields.
///
/// `blanked` always yields an edit with the blank flag. Create-family phrases
/// always yield a creation. A watched summary yields a creation only when the
/// sign says it was used in creating; a watch word is by definition attached
/// to a creation.
pub fn resolve_action(phrase: ActionPhrase<'_>) -> ResolvedAction {
    match phrase.phrase {
        "blanked" => ResolvedAction {
            action: Some(EditAction::Edit),
            watched: None,
            blank: true,
        },
        "edited" | "Copyvio?" | "Possible gibberish?" | "Large removal" => ResolvedAction {
            action: Some(EditAction::Edit),
            ..ResolvedAction::default()
        },
        "created" | "Tiny create" => ResolvedAction {
            action: Some(EditAction::Create),
            ..ResolvedAction::default()
        },
        _ => {
            if let Some(summary) = phrase.summary {
                ResolvedAction {
                    action: Some(if phrase.creating {
                        EditAction::Create
                    } else {
                        EditAction::Edit
                    }),
                    watched: Some(summary.to_owned()),
                    blank: false,
                }
            } else if let Some(word) = phrase.watch_word {
                ResolvedAction {
                    action: Some(EditAction::Create),
                    watched: Some(word.to_owned()),
                    blank: false,
                }
            } else {
                ResolvedAction::default()
            }
        }
    }
}

/// Map a Discussions action phrase to (action, target).
///
/// `replied` and `reported post` are fixed phrases; everything else is a verb
/// and a noun. Unknown combinations resolve to `(None, None)`.
pub fn resolve_discussion(
    phrase: &str,
    verb: Option<&str>,
    noun: Option<&str>,
) -> (Option<DiscussionAction>, Option<DiscussionTarget>) {
    match phrase {
        "replied" => return (Some(DiscussionAction::Create), Some(DiscussionTarget::Reply)),
        "reported post" => return (Some(DiscussionAction::Create), Some(DiscussionTarget::Report)),
        _ => {}
    }

    let action = match verb {
        Some("created") => DiscussionAction::Create,
        Some("deleted") => DiscussionAction::Delete,
        Some("undeleted") => DiscussionAction::Undelete,
        Some("moved") => DiscussionAction::Move,
        Some("edited") => DiscussionAction::Edit,
        _ => return (None, None),
    };
    let target = match noun {
        Some("thread") => DiscussionTarget::Thread,
        Some("reply") => DiscussionTarget::Reply,
        Some("report") => DiscussionTarget::Report,
        _ => return (None, None),
    };
    (Some(action), Some(target))
}

fn list_code(name: &str, ctx: &mut ExtractContext) -> Option<ListCode> {
    let code = ListCode::from_long_name(name);
    if code.is_none() {
        ctx.partial(format!("unknown list {name:?}"));
    }
    code
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// `[[User:X]] <action> [[Title]] (n) https://wiki/d/p/<thread>[/r/<reply>] : snippet`
pub fn discussions(caps: &Captures<'_>, ctx: &mut ExtractContext) -> Event {
    let phrase = required(caps, "phrase");
    let (action, target) = resolve_discussion(&phrase, text(caps, "verb"), text(caps, "noun"));
    if action.is_none() {
        ctx.partial(format!("unrecognized discussions action {phrase:?}"));
    }

    let reply_count = text(caps, "count").and_then(|c| c.parse().ok());

    Event::DiscussionAction(DiscussionEvent {
        user: required(caps, "user"),
        action,
        target,
        title: owned(caps, "title"),
        reply_count,
        wiki: wiki(caps),
        thread_id: required(caps, "thread"),
        reply_id: owned(caps, "reply"),
        summary: required(caps, "summary"),
    })
}

/// `COI<n>|HIT (<percent>) [[User:X]] <action> https://wiki/[index.php?oldid=N] ...`
pub fn spam(caps: &Captures<'_>, ctx: &mut ExtractContext) -> Event {
    let spam_type = if text(caps, "coi").is_some() {
        SpamType::Coi
    } else {
        SpamType::Hit
    };
    let coi = text(caps, "coi").and_then(|n| n.parse().ok());

    let percent_token = required(caps, "percent");
    let percent = parse_percent(&percent_token);
    if percent.is_none() {
        ctx.partial(format!("unparseable percent {percent_token:?}"));
    }

    let action = match text(caps, "action") {
        Some("created") => Some(SpamAction::Page),
        Some("created wiki") => Some(SpamAction::Wiki),
        Some("edited") => Some(SpamAction::Edit),
        other => {
            ctx.partial(format!("unknown spam action {other:?}"));
            None
        }
    };

    let (mut title, mut url, mut filter) = (None, None, None);
    let detail = owned(caps, "detail");
    match text(caps, "kind") {
        Some("with title") => title = detail,
        Some("with URL") => url = detail,
        Some("matching filter") => {
            filter = detail.map(|d| d.strip_prefix('#').map(str::to_owned).unwrap_or(d));
        }
        _ => {}
    }
    if filter.is_none() {
        filter = owned(caps, "filter");
    }

    Event::SpamReport(SpamEvent {
        spam_type,
        coi,
        percent,
        user: required(caps, "user"),
        action,
        wiki: wiki(caps),
        oldid: text(caps, "oldid").and_then(|n| n.parse().ok()),
        title,
        url,
        filter,
    })
}

/// `<user> New user registration https://wiki/wiki/Special:Log/newusers - ...`
pub fn new_user(caps: &Captures<'_>, _ctx: &mut ExtractContext) -> Event {
    Event::NewUserRegistration(NewUserEvent {
        user: required(caps, "user"),
        wiki: wiki(caps),
    })
}

fn apply_url_tail(
    caps: &Captures<'_>,
    action: &mut Option<EditAction>,
) -> (BTreeMap<String, String>, Option<String>) {
    match parse_url_tail(caps.name("path").map(|m| m.as_str()).unwrap_or_default()) {
        UrlTail::Params(params) => (params, None),
        UrlTail::Log(tag) => {
            *action = Some(EditAction::Log);
            (BTreeMap::new(), Some(tag))
        }
    }
}

fn diff_size(caps: &Captures<'_>, ctx: &mut ExtractContext) -> Option<i64> {
    let token = required(caps, "size");
    let size = parse_diff_size(&token);
    if size.is_none() {
        ctx.partial(format!("unparseable diff size {token:?}"));
    }
    size
}

/// `<Class> [[User:X]] <action phrase>[ watched] [[Title]] (±n) URL|Diff: https://wiki/<tail>[ summary]`
pub fn edit(caps: &Captures<'_>, ctx: &mut ExtractContext) -> Event {
    let user_type = actor(caps, ctx);
    let phrase = ActionPhrase {
        phrase: caps.name("phrase").map(|m| m.as_str()).unwrap_or_default(),
        summary: text(caps, "watch_summary"),
        creating: text(caps, "creating").is_some(),
        watch_word: text(caps, "watch_word"),
    };
    let resolved = resolve_action(phrase);
    if resolved.action.is_none() {
        ctx.note(format!("no action recognized in phrase {:?}", phrase.phrase));
    }

    let mut action = resolved.action;
    // A `URL:` link instead of `Diff:` means the page has no previous revision.
    if text(caps, "marker") == Some("URL") && !resolved.blank {
        action = Some(EditAction::Create);
    }
    let (url_params, log) = apply_url_tail(caps, &mut action);

    Event::Edit(EditEvent {
        user_type,
        user: required(caps, "user"),
        action,
        title: required(caps, "title"),
        diff_size: diff_size(caps, ctx),
        watchlist: text(caps, "watchlist").is_some(),
        watched: resolved.watched,
        blank: resolved.blank,
        replace: None,
        wiki: wiki(caps),
        url_params,
        log,
        summary: owned(caps, "summary"),
    })
}

/// `<Class> [[User:X]] replaced [[Title]] with "text" (±n) Diff: https://wiki/?<query>`
pub fn replace(caps: &Captures<'_>, ctx: &mut ExtractContext) -> Event {
    let user_type = actor(caps, ctx);
    let mut action = None;
    let (url_params, log) = apply_url_tail(caps, &mut action);
    if action.is_none() {
        ctx.note("replace sign carries no edit action");
    }

    Event::Edit(EditEvent {
        user_type,
        user: required(caps, "user"),
        action,
        title: required(caps, "title"),
        diff_size: diff_size(caps, ctx),
        watchlist: false,
        watched: None,
        blank: false,
        replace: Some(required(caps, "replacement")),
        wiki: wiki(caps),
        url_params,
        log,
        summary: None,
    })
}

/// `<Class> [[User:X]] uploaded|reuploaded [[File:Name]] URL: https://wiki/...`
pub fn upload(caps: &Captures<'_>, ctx: &mut ExtractContext) -> Event {
    Event::Upload(UploadEvent {
        user_type: actor(caps, ctx),
        user: required(caps, "user"),
        reupload: text(caps, "verb").is_some_and(|v| v != "uploaded"),
        namespace: required(caps, "namespace"),
        title: required(caps, "title"),
        wiki: wiki(caps),
    })
}

/// `Block|Unblock editor [[User:T]] blocked by admin [[User:A]] [Length: L ]"reason"`
pub fn block(caps: &Captures<'_>, _ctx: &mut ExtractContext) -> Event {
    let action = if text(caps, "action") == Some("Block") {
        BlockAction::Block
    } else {
        BlockAction::Unblock
    };
    Event::Block(BlockEvent {
        action,
        target: required(caps, "target"),
        user: required(caps, "user"),
        length: owned(caps, "length"),
        reason: required(caps, "reason"),
    })
}

/// `[Added: |Updated: ]<user> is on <list>, added by <admin> until <expiry> ("reason")`
pub fn list_action(caps: &Captures<'_>, ctx: &mut ExtractContext) -> Event {
    let action = match text(caps, "action") {
        Some("Added") => ListAction::Add,
        Some("Updated") => ListAction::Update,
        _ => ListAction::Info,
    };
    Event::ListAction(ListEvent {
        action,
        user: required(caps, "user"),
        list: list_code(&required(caps, "list"), ctx),
        added_by: owned(caps, "added_by"),
        length: owned(caps, "length"),
        reason: owned(caps, "reason"),
    })
}

/// `Deleted <user> from <list>`
pub fn list_removal(caps: &Captures<'_>, ctx: &mut ExtractContext) -> Event {
    Event::ListRemoval(ListEvent {
        action: ListAction::Delete,
        user: required(caps, "user"),
        list: list_code(&required(caps, "list"), ctx),
        added_by: None,
        length: None,
        reason: None,
    })
}

/// `<user> is not on <list>`; nothing to act on.
pub fn list_absence(_caps: &Captures<'_>, _ctx: &mut ExtractContext) -> Event {
    Event::ListAbsence
}
