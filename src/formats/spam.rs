//! Embeds for spam reports, with the moderator `!report` command.

use super::markup::{contribs_url, escape, link};
use super::{Embed, EmbedAuthor, Formatter, Payload, RenderContext};
use crate::event::{Event, SpamEvent, SpamType};
use crate::transports::TransportKind;

const COLOURS: [u32; 7] = [
    0xFF0000, 0xFFFF00, 0x00FF00, 0x0000FF, 0xFF00FF, 0x00FFFF, 0xFFFFFF,
];
const WHITE: u32 = 0xFFFFFF;

/// Heading describing what the detector saw.
pub fn title(report: &SpamEvent) -> String {
    if report.spam_type == SpamType::Hit {
        return "Spam filter hit".to_owned();
    }
    match report.coi {
        Some(1) => "Inserted link matches username".to_owned(),
        Some(2) => "Wiki URL similar to founder".to_owned(),
        Some(3) => "Wiki name similar to founder".to_owned(),
        Some(4) => "Inserted a link to a new wiki too soon".to_owned(),
        Some(5) => {
            let subject = if report.title.is_some() {
                "Title"
            } else if report.url.is_some() {
                "URL"
            } else {
                "Content"
            };
            format!("{subject} matches spam filter")
        }
        Some(6) => "Answers spam".to_owned(),
        _ => "Unknown spam type".to_owned(),
    }
}

fn percent(report: &SpamEvent) -> String {
    match report.percent {
        Some(p) => format!("**{:.0}%**", p * 100.0),
        None => "**?%**".to_owned(),
    }
}

fn external(url: &str) -> String {
    link(&escape(url), &format!("http://{url}"))
}

/// Body: confidence plus whatever the detector matched.
pub fn description(report: &SpamEvent) -> String {
    let p = percent(report);
    let matched = report.title.as_deref().or(report.url.as_deref());
    let filter = report.filter.as_deref();

    match (report.spam_type, report.coi) {
        (SpamType::Coi, Some(1)) => match &report.url {
            Some(url) => format!("{p}: {}", external(url)),
            None => p,
        },
        (SpamType::Coi, Some(3)) => match &report.title {
            Some(title) => format!("{p}: {}", escape(title)),
            None => p,
        },
        (SpamType::Coi, Some(4 | 6)) => report.url.as_deref().map(external).unwrap_or(p),
        (_, _) => match (matched, filter) {
            (Some(content), Some(id)) => format!("{p}: \"{}\" (#{id})", escape(content)),
            (None, Some(id)) => format!("{p}: #{id}"),
            (Some(content), None) => format!("{p}: {}", escape(content)),
            (None, None) => p,
        },
    }
}

/// The moderator command that files a report for this sign.
///
/// Wiki-level COI types report the wiki; everything else reports the user.
/// Wikis on the commercial network get the `:f` suffix and, outside English,
/// a language prefix.
pub fn report_command(report: &SpamEvent) -> String {
    let wiki = &report.wiki;
    if matches!(report.coi, Some(2..=4)) {
        return if wiki.fandom {
            match wiki.lang.as_deref() {
                Some(lang) if lang != "en" => format!("!report w {lang}.{}:f", wiki.subdomain),
                _ => format!("!report w {}:f", wiki.subdomain),
            }
        } else {
            format!("!report w {}", wiki.qualified_name())
        };
    }
    let name = wiki.qualified_name();
    let name = if name == "community" { "c" } else { name.as_str() };
    format!("!report s {name} {}", report.user)
}

fn colour(report: &SpamEvent) -> u32 {
    report
        .coi
        .and_then(|n| usize::try_from(n).ok())
        .and_then(|n| COLOURS.get(n).copied())
        .unwrap_or(WHITE)
}

/// The `spam` format.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpamFormat;

impl Formatter for SpamFormat {
    fn supports(&self, transport: TransportKind) -> bool {
        matches!(transport, TransportKind::Discord | TransportKind::Stdout)
    }

    fn render(&self, ctx: &RenderContext, event: &Event) -> Option<Payload> {
        let Event::SpamReport(report) = event else {
            return None;
        };
        if !self.supports(ctx.transport) {
            return None;
        }

        let base = report.wiki.base_url();
        let url = match report.oldid {
            Some(oldid) => format!("{base}/?oldid={oldid}"),
            None => base,
        };
        let mut author = format!("{} [{}]", report.user, report.wiki.qualified_name());
        if ctx.urgent {
            author.push_str(" !URGENT!");
        }

        Some(Payload::embed(Embed {
            title: Some(title(report)),
            description: Some(format!(
                "{}\n\n`{}`",
                description(report),
                report_command(report)
            )),
            url: Some(url),
            colour: Some(colour(report)),
            author: Some(EmbedAuthor {
                name: author,
                url: Some(contribs_url(&report.wiki, &report.user)),
            }),
            ..Embed::default()
        }))
    }
}
