//! Registration embeds for the delayed new-user transport.

use super::markup::{contribs_url, escape, link};
use super::{Embed, EmbedField, Formatter, Payload, RenderContext};
use crate::classifier::wiki::WikiRef;
use crate::event::Event;
use crate::transports::TransportKind;

/// `www` registrations happen on the central wiki.
fn home_wiki(wiki: &WikiRef) -> WikiRef {
    if wiki.subdomain == "www" {
        WikiRef {
            subdomain: "community".to_owned(),
            ..wiki.clone()
        }
    } else {
        wiki.clone()
    }
}

/// The `newusers` format.
#[derive(Debug, Default, Clone, Copy)]
pub struct NewUsersFormat;

impl Formatter for NewUsersFormat {
    fn supports(&self, transport: TransportKind) -> bool {
        matches!(transport, TransportKind::NewUsers | TransportKind::Stdout)
    }

    fn render(&self, ctx: &RenderContext, event: &Event) -> Option<Payload> {
        let Event::NewUserRegistration(registration) = event else {
            return None;
        };
        if !self.supports(ctx.transport) {
            return None;
        }

        let wiki = home_wiki(&registration.wiki);
        Some(Payload::embed(Embed {
            title: Some(escape(&registration.user)),
            url: Some(contribs_url(&wiki, &registration.user)),
            fields: vec![EmbedField {
                name: "Registered on".to_owned(),
                value: link(&wiki.qualified_name(), &wiki.base_url()),
                inline: true,
            }],
            ..Embed::default()
        }))
    }
}
