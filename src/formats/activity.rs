//! Embeds for wiki activity: edits, list changes, blocks and uploads.

use super::markup::{contribs_url, escape, join, link, page_url, summary};
use super::{Embed, EmbedAuthor, Formatter, Payload, RenderContext};
use crate::classifier::wiki::WikiRef;
use crate::event::{
    ActorClass, BlockAction, BlockEvent, EditAction, EditEvent, Event, ListAction, ListCode,
    ListEvent, UploadEvent,
};
use crate::transports::TransportKind;

/// Diff sizes outside this range colour the embed red.
const LARGE_REMOVAL: i64 = -1500;
const LARGE_ADDITION: i64 = 10_000;
/// Diff sizes beyond this magnitude are italicised.
const NOTABLE_SIZE: i64 = 1000;

const RED: u32 = 0xFF0000;
const YELLOW: u32 = 0xFFFF00;

/// Wiki used for links when the sign carries no wiki (lists, blocks).
const CENTRAL_WIKI: &str = "community";

fn actor_colour(class: ActorClass) -> Option<u32> {
    match class {
        ActorClass::Admin => Some(0xBADA55),
        ActorClass::Blacklist => Some(0xFF0000),
        ActorClass::Greylist => Some(0xFFFF00),
        ActorClass::Ip => Some(0x00FF00),
        ActorClass::User => Some(0xFF00FF),
        ActorClass::Whitelist => Some(0x0080FF),
        ActorClass::Bot => None,
    }
}

fn list_colour(code: ListCode) -> u32 {
    match code {
        ListCode::Al => 0x00FF00,
        ListCode::Bes => 0xFF5500,
        ListCode::Bl => 0x000000,
        ListCode::Bna => 0xFF1188,
        ListCode::Bnu => 0xFF44AA,
        ListCode::Bot => 0xDDDDDD,
        ListCode::Gl => 0xAAAAAA,
        ListCode::Wl => 0xFFFFFF,
    }
}

fn list_label(code: ListCode) -> &'static str {
    match code {
        ListCode::Al => "admin list",
        ListCode::Bes => "bad edit summary list",
        ListCode::Bl => "blacklist",
        ListCode::Bna => "bad new article list",
        ListCode::Bnu => "bad new username list",
        ListCode::Bot => "bot list",
        ListCode::Gl => "greylist",
        ListCode::Wl => "whitelist",
    }
}

fn list_verb(action: ListAction) -> &'static str {
    match action {
        ListAction::Add => "Added to",
        ListAction::Delete => "Removed from",
        ListAction::Info => "Is currently on",
        ListAction::Update => "Updated on",
    }
}

/// `+120`, `-5`, with `*...*` around large deltas.
pub fn diff_size(size: Option<i64>) -> String {
    let Some(size) = size else {
        return "?".to_owned();
    };
    let text = if size > 0 {
        format!("+{size}")
    } else {
        size.to_string()
    };
    if size > NOTABLE_SIZE || size < NOTABLE_SIZE.saturating_neg() {
        format!("*{text}*")
    } else {
        text
    }
}

/// Embed colour for an edit: red for huge changes, yellow for watched
/// summaries, otherwise the actor class colour.
pub fn edit_colour(edit: &EditEvent) -> Option<u32> {
    if edit.action == Some(EditAction::Log) {
        return actor_colour(edit.user_type);
    }
    match edit.diff_size {
        Some(size) if !(LARGE_REMOVAL..=LARGE_ADDITION).contains(&size) => Some(RED),
        _ if edit.watched.is_some() => Some(YELLOW),
        _ => actor_colour(edit.user_type),
    }
}

fn notices(edit: &EditEvent) -> String {
    if let Some(watched) = &edit.watched {
        format!("**watched edit summary** \"{}\"", escape(watched))
    } else if edit.blank {
        "**page blanked**".to_owned()
    } else if let Some(replacement) = &edit.replace {
        format!("**replaced with** \"{}\"", escape(replacement))
    } else {
        String::new()
    }
}

fn edit_description(edit: &EditEvent) -> String {
    let page = link(&escape(&edit.title), &page_url(&edit.wiki, &edit.title));
    let size = format!("({})", diff_size(edit.diff_size));
    let notices = notices(edit);
    let summary = summary(edit.summary.as_deref());

    match edit.action {
        Some(EditAction::Edit) => {
            let diff = edit
                .url_params
                .get("diff")
                .map(|id| {
                    let url = format!("{}/?diff={id}", edit.wiki.base_url());
                    format!("{{{}}}", link("diff", &url))
                })
                .unwrap_or_default();
            join(&["Edited", &page, &size, &diff, &notices, &summary])
        }
        Some(EditAction::Create) => join(&["Created", &page, &size, &notices, &summary]),
        Some(EditAction::Log) => {
            let tag = format!("`{}`", edit.log.as_deref().unwrap_or("unknown"));
            join(&["Log action", &tag, &notices, &summary])
        }
        None => join(&["Changed", &page, &size, &notices, &summary]),
    }
}

fn edit_embed(edit: &EditEvent) -> Embed {
    Embed {
        title: Some(edit.user_type.as_str().to_owned()),
        description: Some(edit_description(edit)),
        colour: edit_colour(edit),
        author: Some(EmbedAuthor {
            name: format!("{} [{}]", edit.user, edit.wiki.qualified_name()),
            url: Some(contribs_url(&edit.wiki, &edit.user)),
        }),
        ..Embed::default()
    }
}

fn list_embed(list: &ListEvent) -> Embed {
    let central = WikiRef::new(CENTRAL_WIKI);
    let label = list.list.map_or("unknown list", list_label);

    let description = match (&list.added_by, &list.length, &list.reason) {
        (Some(by), Some(until), Some(reason)) => Some(join(&[
            "By",
            &escape(by),
            "until",
            until,
            &summary(Some(reason.as_str())),
        ])),
        _ => None,
    };

    Embed {
        title: Some(format!("{} {label}", list_verb(list.action))),
        description,
        colour: list.list.map(list_colour),
        author: Some(EmbedAuthor {
            name: list.user.clone(),
            url: Some(contribs_url(&central, &list.user)),
        }),
        ..Embed::default()
    }
}

fn block_embed(block: &BlockEvent) -> Embed {
    let central = WikiRef::new(CENTRAL_WIKI);
    let reason = summary(Some(block.reason.as_str()));
    let (verb, description) = match block.action {
        BlockAction::Block => {
            let length = block.length.as_deref().unwrap_or("an unknown time");
            ("Blocked", join(&["For", length, &reason]))
        }
        BlockAction::Unblock => ("Unblocked", reason),
    };

    Embed {
        title: Some(format!("{verb} by {}", block.user)),
        description: Some(description),
        url: Some(contribs_url(&central, &block.user)),
        author: Some(EmbedAuthor {
            name: block.target.clone(),
            url: Some(contribs_url(&central, &block.target)),
        }),
        ..Embed::default()
    }
}

fn upload_embed(upload: &UploadEvent) -> Embed {
    let file = format!("{}:{}", upload.namespace, upload.title);
    let verb = if upload.reupload {
        "Reuploaded"
    } else {
        "Uploaded"
    };
    let log = link(
        "log",
        &format!("{}/wiki/Special:Log/upload", upload.wiki.base_url()),
    );

    Embed {
        description: Some(format!(
            "{verb} {} ({log})",
            link(&escape(&upload.title), &page_url(&upload.wiki, &file))
        )),
        colour: actor_colour(upload.user_type),
        author: Some(EmbedAuthor {
            name: format!("{} [{}]", upload.user, upload.wiki.qualified_name()),
            url: Some(contribs_url(&upload.wiki, &upload.user)),
        }),
        ..Embed::default()
    }
}

/// The `activity` format.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActivityFormat;

impl Formatter for ActivityFormat {
    fn supports(&self, transport: TransportKind) -> bool {
        matches!(transport, TransportKind::Discord | TransportKind::Stdout)
    }

    fn render(&self, ctx: &RenderContext, event: &Event) -> Option<Payload> {
        if !self.supports(ctx.transport) {
            return None;
        }
        let embed = match event {
            Event::Edit(edit) => edit_embed(edit),
            Event::ListAction(list) | Event::ListRemoval(list) => list_embed(list),
            Event::Block(block) => block_embed(block),
            Event::Upload(upload) => upload_embed(upload),
            _ => return None,
        };
        Some(Payload::embed(embed))
    }
}
