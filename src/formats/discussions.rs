//! Embeds for Discussions activity.

use super::markup::{capitalize, contribs_url, escape, post_url};
use super::{Embed, EmbedAuthor, Formatter, Payload, RenderContext};
use crate::event::{DiscussionAction, DiscussionEvent, DiscussionTarget, Event};
use crate::transports::TransportKind;

/// Past tense of a Discussions action.
pub fn past_tense(action: DiscussionAction) -> &'static str {
    match action {
        DiscussionAction::Create => "created",
        DiscussionAction::Delete => "deleted",
        DiscussionAction::Undelete => "undeleted",
        DiscussionAction::Move => "moved",
        DiscussionAction::Edit => "edited",
    }
}

/// `Thread created`, `Reply deleted`, ...
pub fn action_label(post: &DiscussionEvent) -> String {
    match (post.target, post.action) {
        (Some(target), Some(action)) => {
            format!("{} {}", capitalize(target.as_str()), past_tense(action))
        }
        _ => "Unknown action".to_owned(),
    }
}

fn colour(target: Option<DiscussionTarget>) -> Option<u32> {
    match target? {
        DiscussionTarget::Reply => Some(0x00FF00),
        DiscussionTarget::Report => Some(0xFF0000),
        DiscussionTarget::Thread => Some(0xFFFF00),
    }
}

/// The `discussions` format.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscussionsFormat;

impl Formatter for DiscussionsFormat {
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

        let label = action_label(post);
        let title = match &post.title {
            Some(title) => format!("{} [{label}]", escape(title)),
            None => label,
        };

        Some(Payload::embed(Embed {
            title: Some(title),
            description: Some(escape(&post.summary)),
            url: Some(post_url(&post.wiki, &post.thread_id, post.reply_id.as_deref())),
            colour: colour(post.target),
            author: Some(EmbedAuthor {
                name: format!("{} [{}]", post.user, post.wiki.qualified_name()),
                url: Some(contribs_url(&post.wiki, &post.user)),
            }),
            ..Embed::default()
        }))
    }
}
