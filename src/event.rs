//! Typed events produced by the classifier.
//!
//! One [`Event`] variant per notification family. Each variant carries its own
//! payload struct so consumers get a guaranteed field shape per type. The serde
//! representation is internally tagged (`"type": "edit"`) with camelCase
//! fields, which keeps the JSON output flat.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classifier::wiki::WikiRef;

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

/// Closed set of event type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// Page edit, creation, replacement or log action.
    Edit,
    /// User block or unblock.
    Block,
    /// User added to, updated on, or reported as present on a list.
    ListAction,
    /// User removed from a list.
    ListRemoval,
    /// User reported as absent from a list.
    ListAbsence,
    /// Discussions post activity.
    DiscussionAction,
    /// Spam detector report.
    SpamReport,
    /// Account registration.
    NewUserRegistration,
    /// File upload.
    Upload,
    /// Line that matched no template.
    Unknown,
}

impl EventKind {
    /// Every kind, in catalog-independent declaration order.
    pub const ALL: [EventKind; 10] = [
        Self::Edit,
        Self::Block,
        Self::ListAction,
        Self::ListRemoval,
        Self::ListAbsence,
        Self::DiscussionAction,
        Self::SpamReport,
        Self::NewUserRegistration,
        Self::Upload,
        Self::Unknown,
    ];

    /// Kebab-case tag used in configuration and JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Block => "block",
            Self::ListAction => "list-action",
            Self::ListRemoval => "list-removal",
            Self::ListAbsence => "list-absence",
            Self::DiscussionAction => "discussion-action",
            Self::SpamReport => "spam-report",
            Self::NewUserRegistration => "new-user-registration",
            Self::Upload => "upload",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a kebab-case tag.
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class of the account that performed an edit or upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorClass {
    /// Registered user with no special status.
    User,
    /// Anonymous editor.
    Ip,
    /// Wiki administrator.
    Admin,
    /// Bot account.
    Bot,
    /// Trusted user on the global whitelist.
    Whitelist,
    /// User on the global blacklist.
    Blacklist,
    /// User on the global greylist.
    Greylist,
}

impl ActorClass {
    /// Map a sign token (`User`, `IP`, `Admin`, ...) to its class.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_lowercase().as_str() {
            "user" => Some(Self::User),
            "ip" => Some(Self::Ip),
            "admin" => Some(Self::Admin),
            "bot" => Some(Self::Bot),
            "whitelist" => Some(Self::Whitelist),
            "blacklist" => Some(Self::Blacklist),
            "greylist" => Some(Self::Greylist),
            _ => None,
        }
    }

    /// Lower-cased tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ip => "ip",
            Self::Admin => "admin",
            Self::Bot => "bot",
            Self::Whitelist => "whitelist",
            Self::Blacklist => "blacklist",
            Self::Greylist => "greylist",
        }
    }
}

// ---------------------------------------------------------------------------
// Family payloads
// ---------------------------------------------------------------------------

/// What happened to the page in an edit sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditAction {
    /// Existing page changed.
    Edit,
    /// New page.
    Create,
    /// Log entry rather than a revision.
    Log,
}

/// Edit, creation, replacement or log action on a wiki page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditEvent {
    /// Class of the editing account.
    pub user_type: ActorClass,
    /// Editing account name.
    pub user: String,
    /// Resolved action; absent when the sign did not say.
    pub action: Option<EditAction>,
    /// Page title.
    pub title: String,
    /// Byte delta of the revision.
    pub diff_size: Option<i64>,
    /// Whether the page is on the monitoring watchlist.
    pub watchlist: bool,
    /// Watched summary or watch word that triggered the sign.
    pub watched: Option<String>,
    /// Whether the page was blanked.
    pub blank: bool,
    /// Replacement text, for replace signs.
    pub replace: Option<String>,
    /// Wiki the edit happened on.
    pub wiki: WikiRef,
    /// Query parameters of the diff URL.
    pub url_params: BTreeMap<String, String>,
    /// Log action tag when `action` is `log`.
    pub log: Option<String>,
    /// Edit summary.
    pub summary: Option<String>,
}

/// Block or unblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockAction {
    /// User blocked.
    Block,
    /// User unblocked.
    Unblock,
}

/// A user block sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockEvent {
    /// Block or unblock.
    pub action: BlockAction,
    /// Blocked account.
    pub target: String,
    /// Admin who performed the action.
    pub user: String,
    /// Block length, when given.
    pub length: Option<String>,
    /// Block reason.
    pub reason: String,
}

/// Short code for one of the monitoring lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListCode {
    /// Bad edit summary list.
    Bes,
    /// Bad new articles list.
    Bna,
    /// Bad new usernames list.
    Bnu,
    /// Global blacklist.
    Bl,
    /// Global greylist.
    Gl,
    /// Global whitelist.
    Wl,
    /// Admin list.
    Al,
    /// Bot list.
    Bot,
}

impl ListCode {
    /// Long list names as they appear in signs, with their short codes.
    pub const TABLE: [(&'static str, ListCode); 8] = [
        ("bad edit summary list", Self::Bes),
        ("bad new articles list", Self::Bna),
        ("bad new usernames list", Self::Bnu),
        ("global blacklist", Self::Bl),
        ("global greylist", Self::Gl),
        ("global whitelist", Self::Wl),
        ("rc admin list", Self::Al),
        ("rc bot list", Self::Bot),
    ];

    /// Look up a long list name.
    pub fn from_long_name(name: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(long, _)| *long == name)
            .map(|(_, code)| *code)
    }

    /// Short code string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bes => "bes",
            Self::Bna => "bna",
            Self::Bnu => "bnu",
            Self::Bl => "bl",
            Self::Gl => "gl",
            Self::Wl => "wl",
            Self::Al => "al",
            Self::Bot => "bot",
        }
    }
}

/// Change applied to a list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListAction {
    /// Newly added.
    Add,
    /// Entry updated.
    Update,
    /// Entry reported as currently present.
    Info,
    /// Entry removed.
    Delete,
}

/// List membership change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEvent {
    /// Kind of change.
    pub action: ListAction,
    /// Listed user.
    pub user: String,
    /// List code; absent when the sign named a list we do not know.
    pub list: Option<ListCode>,
    /// Who added the entry.
    pub added_by: Option<String>,
    /// Expiry of the entry.
    pub length: Option<String>,
    /// Reason given for the entry.
    pub reason: Option<String>,
}

/// Discussions action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscussionAction {
    /// Post created.
    Create,
    /// Post deleted.
    Delete,
    /// Post restored.
    Undelete,
    /// Thread moved.
    Move,
    /// Post edited.
    Edit,
}

/// Object a Discussions action applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscussionTarget {
    /// Thread opener.
    Thread,
    /// Reply in a thread.
    Reply,
    /// Moderation report.
    Report,
}

impl DiscussionTarget {
    /// Lower-case noun.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thread => "thread",
            Self::Reply => "reply",
            Self::Report => "report",
        }
    }
}

/// Discussions post activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionEvent {
    /// Acting user.
    pub user: String,
    /// Resolved action; absent for unrecognized phrases.
    pub action: Option<DiscussionAction>,
    /// Resolved target; absent for unrecognized phrases.
    pub target: Option<DiscussionTarget>,
    /// Thread title, when present.
    pub title: Option<String>,
    /// Number in parentheses after the title.
    pub reply_count: Option<u64>,
    /// Wiki of the post.
    pub wiki: WikiRef,
    /// 19-digit thread id.
    pub thread_id: String,
    /// 19-digit reply id, for replies.
    pub reply_id: Option<String>,
    /// Content snippet.
    pub summary: String,
}

/// Kind of spam report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpamType {
    /// Generic spam filter hit.
    Hit,
    /// Conflict-of-interest heuristic.
    Coi,
}

/// What the reported user did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpamAction {
    /// Created a page.
    Page,
    /// Created a wiki.
    Wiki,
    /// Edited a page.
    Edit,
}

/// Spam detector report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpamEvent {
    /// Hit or COI.
    pub spam_type: SpamType,
    /// COI subtype number.
    pub coi: Option<u32>,
    /// Detector confidence, 1.0 for direct matches.
    pub percent: Option<f64>,
    /// Reported user.
    pub user: String,
    /// What the user did.
    pub action: Option<SpamAction>,
    /// Wiki of the activity.
    pub wiki: WikiRef,
    /// Revision id.
    pub oldid: Option<u64>,
    /// Matched title.
    pub title: Option<String>,
    /// Matched URL.
    pub url: Option<String>,
    /// Matched filter id or name.
    pub filter: Option<String>,
}

/// Account registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserEvent {
    /// New account name.
    pub user: String,
    /// Wiki the account registered on.
    pub wiki: WikiRef,
}

/// File upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadEvent {
    /// Class of the uploading account.
    pub user_type: ActorClass,
    /// Uploader.
    pub user: String,
    /// Whether this replaced an existing file.
    pub reupload: bool,
    /// File namespace as written in the sign.
    pub namespace: String,
    /// File title without namespace.
    pub title: String,
    /// Wiki of the upload.
    pub wiki: WikiRef,
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A parsed notification line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    /// Page edit.
    Edit(EditEvent),
    /// Block.
    Block(BlockEvent),
    /// List add/update/info.
    ListAction(ListEvent),
    /// List removal.
    ListRemoval(ListEvent),
    /// User not on a list. Carries nothing actionable.
    ListAbsence,
    /// Discussions activity.
    DiscussionAction(DiscussionEvent),
    /// Spam report.
    SpamReport(SpamEvent),
    /// New account.
    NewUserRegistration(NewUserEvent),
    /// Upload.
    Upload(UploadEvent),
}

impl Event {
    /// Type tag of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Edit(_) => EventKind::Edit,
            Self::Block(_) => EventKind::Block,
            Self::ListAction(_) => EventKind::ListAction,
            Self::ListRemoval(_) => EventKind::ListRemoval,
            Self::ListAbsence => EventKind::ListAbsence,
            Self::DiscussionAction(_) => EventKind::DiscussionAction,
            Self::SpamReport(_) => EventKind::SpamReport,
            Self::NewUserRegistration(_) => EventKind::NewUserRegistration,
            Self::Upload(_) => EventKind::Upload,
        }
    }

    /// Acting or subject user, when the variant has one.
    pub fn user(&self) -> Option<&str> {
        match self {
            Self::Edit(e) => Some(&e.user),
            Self::Block(e) => Some(&e.user),
            Self::ListAction(e) | Self::ListRemoval(e) => Some(&e.user),
            Self::ListAbsence => None,
            Self::DiscussionAction(e) => Some(&e.user),
            Self::SpamReport(e) => Some(&e.user),
            Self::NewUserRegistration(e) => Some(&e.user),
            Self::Upload(e) => Some(&e.user),
        }
    }

    /// Wiki the event happened on, when known.
    pub fn wiki(&self) -> Option<&WikiRef> {
        match self {
            Self::Edit(e) => Some(&e.wiki),
            Self::DiscussionAction(e) => Some(&e.wiki),
            Self::SpamReport(e) => Some(&e.wiki),
            Self::NewUserRegistration(e) => Some(&e.wiki),
            Self::Upload(e) => Some(&e.wiki),
            Self::Block(_) | Self::ListAction(_) | Self::ListRemoval(_) | Self::ListAbsence => {
                None
            }
        }
    }

    /// Actor class, for the families that report one.
    pub fn actor_class(&self) -> Option<ActorClass> {
        match self {
            Self::Edit(e) => Some(e.user_type),
            Self::Upload(e) => Some(e.user_type),
            _ => None,
        }
    }
}
