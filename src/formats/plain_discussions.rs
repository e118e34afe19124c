//! One-line plain text rendering of Discussions activity.

use super::discussions::past_tense;
use super::markup::{contribs_url, escape, post_url, quiet_link, strip_emphasis};
use super::{Formatter, Payload, RenderContext};
use crate::event::{DiscussionAction, DiscussionEvent, DiscussionTarget, Event};
use crate::transports::TransportKind;

fn verb(post: &DiscussionEvent) -> &'static str {
    match (post.target, post.action) {
        (Some(DiscussionTarget::Report), Some(DiscussionAction::Create)) => "reported",
        (Some(DiscussionTarget::Report), Some(_)) => "unreported",
        (_, Some(action)) => past_tense(action),
        (_, None) => "did something to",
    }
}

/// Render `[user](<contribs>) verb [target](<post>) (*snippet*)`.
pub fn line(post: &DiscussionEvent) -> String {
    let user = quiet_link(&escape(&post.user), &contribs_url(&post.wiki, &post.user));
    let target_text = match (&post.title, post.target) {
        (Some(title), _) => escape(title),
        (None, Some(target)) => target.as_str().to_owned(),
        (None, None) => "post".to_owned(),
    };
    let target = quiet_link(
        &target_text,
        &post_url(&post.wiki, &post.thread_id, post.reply_id.as_deref()),
    );
    let snippet = escape(&strip_emphasis(post.summary.trim()));
    format!("{user} {} {target} (*{snippet}*)", verb(post))
}

/// The `plain-discussions` format.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainDiscussionsFormat;

impl Formatter for PlainDiscussionsFormat {
    fn supports(&self, transport: TransportKind) -> bool {
        matches!(transport, TransportKind::Discord | TransportKind::Stdout)
    }

    fn render(&self, ctx: &RenderContext, event: &Event) -> Option<Payload> {
        let Event::DiscussionAction(post) = event else {
            return None;
        };
        if !self.supports(ctx.transport) {
            return None;
        }
        Some(Payload::text(line(post)))
    }
}
