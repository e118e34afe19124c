//! Markdown helpers shared by the formats.

use crate::classifier::wiki::{encode_title, WikiRef};

/// Zero-width space, used to break mentions and links.
pub const ZWS: char = '\u{200B}';

/// Markdown control characters that relayed text must not carry unescaped.
const MARKDOWN: [char; 9] = ['\\', '*', '_', '~', '`', '[', ']', '(', ')'];

/// Backslash-escape markdown links, emphasis and code spans.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Defuse markdown, mentions, invite links and bare URLs in relayed text.
pub fn escape(text: &str) -> String {
    escape_markdown(text)
        .replace("discord.gg", &format!("discord{ZWS}.gg"))
        .replace('@', &format!("@{ZWS}"))
        .replace("http://", &format!("http:/{ZWS}/"))
        .replace("https://", &format!("https:/{ZWS}/"))
}

/// Remove markdown emphasis and code markers.
pub fn strip_emphasis(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '*' | '`')).collect()
}

/// `[text](url)`.
pub fn link(text: &str, url: &str) -> String {
    format!("[{text}]({url})")
}

/// `[text](<url>)`, a link that does not unfurl.
pub fn quiet_link(text: &str, url: &str) -> String {
    format!("[{text}](<{url}>)")
}

/// Contributions page of `user` on `wiki`.
pub fn contribs_url(wiki: &WikiRef, user: &str) -> String {
    format!(
        "{}/wiki/Special:Contribs/{}",
        wiki.base_url(),
        encode_title(user)
    )
}

/// Article URL.
pub fn page_url(wiki: &WikiRef, title: &str) -> String {
    format!("{}/wiki/{}", wiki.base_url(), encode_title(title))
}

/// Discussions post URL.
pub fn post_url(wiki: &WikiRef, thread_id: &str, reply_id: Option<&str>) -> String {
    match reply_id {
        Some(reply) => format!("{}/d/p/{thread_id}/r/{reply}", wiki.base_url()),
        None => format!("{}/d/p/{thread_id}", wiki.base_url()),
    }
}

/// `(*summary*)`, or nothing for a blank or `""` summary.
pub fn summary(text: Option<&str>) -> String {
    match text.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() && trimmed != "\"\"" => {
            format!("(*{}*)", escape(trimmed))
        }
        _ => String::new(),
    }
}

/// Join non-empty parts with single spaces.
pub fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First letter upper-cased.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
