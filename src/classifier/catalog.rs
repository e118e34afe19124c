//! Built-in sign templates, in match priority order.
//!
//! Each template is a regex with named groups plus the list of groups its
//! extractor reads. Order matters: the first matching entry wins, so the more
//! specific templates (Discussions, spam reports) come before the generic
//! edit sign.

use super::extract;
use super::{CatalogEntry, Family};

/// Shared tail for wiki links: host, then an optional language path segment.
macro_rules! wiki_url {
    () => {
        r"https?://(?P<host>[^\s/]+)/(?:(?P<lang>[a-z]{2,3}(?:-[a-z]{2,4})?)/)?"
    };
}

/// Actor class tokens that open edit, replace and upload signs.
macro_rules! actor {
    () => {
        r"(?P<class>User|IP|Whitelist|Blacklist|Admin|Greylist) \[\[User:(?P<user>[^\]]+)\]\]"
    };
}

/// List names. Intentionally wider than the known table so that unknown lists
/// still match and get reported instead of falling through.
macro_rules! list_name {
    () => {
        r"(?P<list>(?:global|rc|bad) [a-z ]+)"
    };
}

const DISCUSSIONS: &str = concat!(
    r"^\[\[User:(?P<user>[^\]]+)\]\] ",
    r"(?P<phrase>replied|reported post|(?P<verb>\w+) (?P<noun>\w+))",
    r"(?: \[\[(?P<title>.*)\]\])?(?: \((?P<count>\d+)\))? ",
    wiki_url!(),
    r"d/p/(?P<thread>\d{19})(?:/r/(?P<reply>\d{19}))? : (?P<summary>.*)",
);

const SPAM: &str = concat!(
    r"^(?:COI(?P<coi>\d+)|HIT) \((?P<percent>[\w.!]+)\) ",
    r"\[\[User:(?P<user>[^\]]+)\]\] (?P<action>created wiki|created|edited) ",
    wiki_url!(),
    r"(?:index\.php\?oldid=(?P<oldid>\d+))?",
    r"(?: (?P<kind>with title|with URL|matching filter) (?P<detail>[^,]+)",
    r"(?:, filter (?P<filter>.+)$)?)?",
);

const NEW_USER: &str = concat!(
    r"^(?P<user>.*) New user registration ",
    wiki_url!(),
    r"wiki/Special:Log/newusers - https?://\S+/wiki/Special:Contributions/.*",
);

const EDIT: &str = concat!(
    "^",
    actor!(),
    r" (?P<phrase>edited|created",
    r#"|used edit summary "(?P<watch_summary>[^"]+)"(?P<creating> in creating)?"#,
    r"|Copyvio\?|Tiny create|Possible gibberish\?|Large removal",
    r#"|create containing watch word "(?P<watch_word>[^"]+)"|blanked)"#,
    r"(?P<watchlist> watched)? \[\[(?P<title>[^\]]+)\]\] \((?P<size>[+\-\d]+)\) ",
    r"(?P<marker>URL|Diff): ",
    wiki_url!(),
    r"(?:index\.php\?|\?|wiki/)*(?P<path>\S+)(?: (?P<summary>.*))?",
);

const REPLACE: &str = concat!(
    "^",
    actor!(),
    r#" replaced \[\[(?P<title>[^\]]+)\]\] with "(?P<replacement>.*)" "#,
    r"\((?P<size>[+\-\d]+)\) Diff: ",
    wiki_url!(),
    r"\?(?P<path>\S+)",
);

const UPLOAD: &str = concat!(
    "^",
    actor!(),
    r" (?P<verb>uploaded|reuploaded|re-uploaded) ",
    r"\[\[(?P<namespace>[^:\]]+):(?P<title>[^\]]+)\]\](?: \([+\-\d]+\))? ",
    r"(?:URL|Diff): ",
    wiki_url!(),
);

const BLOCK: &str = concat!(
    r"^(?P<action>Block|Unblock) [eE]ditor \[\[User:(?P<target>[^\]]+)\]\] ",
    r"(?:blocked|unblocked) by admin \[\[User:(?P<user>[^\]]+)\]\] ",
    r#"(?:Length: (?P<length>.*) )?"(?P<reason>[^"]+)""#,
);

const LIST_ACTION: &str = concat!(
    r"^(?:(?P<action>Added|Updated): )?(?P<user>.*) is on ",
    list_name!(),
    r#", added by (?P<added_by>.*) until (?P<length>.*) \("(?P<reason>.*)"\)$"#,
);

const LIST_REMOVAL: &str = concat!(r"^Deleted (?P<user>.*) from ", list_name!(), "$");

const LIST_ABSENCE: &str = concat!(r"^(?P<user>.*) is not on ", list_name!(), "$");

/// The built-in catalog, highest priority first.
pub fn builtin_entries() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            family: Family::Discussions,
            pattern: DISCUSSIONS,
            fields: &[
                "user", "phrase", "verb", "noun", "title", "count", "host", "lang", "thread",
                "reply", "summary",
            ],
            extract: extract::discussions,
        },
        CatalogEntry {
            family: Family::Spam,
            pattern: SPAM,
            fields: &[
                "coi", "percent", "user", "action", "host", "lang", "oldid", "kind", "detail",
                "filter",
            ],
            extract: extract::spam,
        },
        CatalogEntry {
            family: Family::NewUser,
            pattern: NEW_USER,
            fields: &["user", "host", "lang"],
            extract: extract::new_user,
        },
        CatalogEntry {
            family: Family::Edit,
            pattern: EDIT,
            fields: &[
                "class",
                "user",
                "phrase",
                "watch_summary",
                "creating",
                "watch_word",
                "watchlist",
                "title",
                "size",
                "marker",
                "host",
                "lang",
                "path",
                "summary",
            ],
            extract: extract::edit,
        },
        CatalogEntry {
            family: Family::Replace,
            pattern: REPLACE,
            fields: &[
                "class",
                "user",
                "title",
                "replacement",
                "size",
                "host",
                "lang",
                "path",
            ],
            extract: extract::replace,
        },
        CatalogEntry {
            family: Family::Upload,
            pattern: UPLOAD,
            fields: &["class", "user", "verb", "namespace", "title", "host", "lang"],
            extract: extract::upload,
        },
        CatalogEntry {
            family: Family::Block,
            pattern: BLOCK,
            fields: &["action", "target", "user", "length", "reason"],
            extract: extract::block,
        },
        CatalogEntry {
            family: Family::ListAction,
            pattern: LIST_ACTION,
            fields: &["action", "user", "list", "added_by", "length", "reason"],
            extract: extract::list_action,
        },
        CatalogEntry {
            family: Family::ListRemoval,
            pattern: LIST_REMOVAL,
            fields: &["user", "list"],
            extract: extract::list_removal,
        },
        CatalogEntry {
            family: Family::ListAbsence,
            pattern: LIST_ABSENCE,
            fields: &[],
            extract: extract::list_absence,
        },
    ]
}
