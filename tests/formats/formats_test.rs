//! Rendering classified signs through the registered formats.

use std::sync::Arc;

use signwatch::classifier::Classifier;
use signwatch::config::ConfigError;
use signwatch::diagnostics::CollectingSink;
use signwatch::event::Event;
use signwatch::formats::markup::ZWS;
use signwatch::formats::{FormatRegistry, Payload, RenderContext};
use signwatch::transports::TransportKind;

fn event(line: &str) -> Event {
    let classifier = match Classifier::builtin(Arc::new(CollectingSink::new())) {
        Ok(classifier) => classifier,
        Err(err) => panic!("builtin catalog should compile: {err}"),
    };
    match classifier.classify(line).into_event() {
        Some(event) => event,
        None => panic!("line should classify: {line}"),
    }
}

fn render(format: &str, transport: TransportKind, event: &Event, urgent: bool) -> Option<Payload> {
    let formatter = match FormatRegistry::with_builtins().build("dest", format, transport) {
        Ok(formatter) => formatter,
        Err(err) => panic!("format should build: {err}"),
    };
    formatter.render(&RenderContext::new("dest", transport).urgent(urgent), event)
}

#[test]
fn activity_edit_links_the_diff() {
    let edit = event(
        "User [[User:Alice]] edited [[Main Page]] (+120) Diff: https://community.wikia.com/?diff=123 tidy up",
    );
    let Some(payload) = render("activity", TransportKind::Discord, &edit, false) else {
        panic!("edit should render");
    };
    let embed = &payload.embeds[0];
    let description = embed.description.as_deref().unwrap_or_default();
    assert!(description.starts_with("Edited [Main Page](https://community.wikia.com/wiki/Main_Page)"));
    assert!(description.contains("https://community.wikia.com/?diff=123"));
    assert!(description.contains("(*tidy up*)"));
    assert_eq!(embed.title.as_deref(), Some("user"));
}

#[test]
fn relayed_text_cannot_ping() {
    let edit = event(
        "User [[User:Alice]] edited [[Main Page]] (+1) Diff: https://c.wikia.com/?diff=1 @everyone join discord.gg/x",
    );
    let Some(payload) = render("activity", TransportKind::Discord, &edit, false) else {
        panic!("edit should render");
    };
    let description = payload.embeds[0].description.clone().unwrap_or_default();
    assert!(description.contains(&format!("@{ZWS}everyone")));
    assert!(description.contains(&format!("discord{ZWS}.gg")));
    assert!(payload.allowed_mentions.parse.is_empty());
}

#[test]
fn activity_ignores_discussions() {
    let post = event(
        "[[User:Alice]] created thread [[Hello]] https://community.fandom.com/d/p/3100000000000000001 : hi",
    );
    assert!(render("activity", TransportKind::Discord, &post, false).is_none());
    assert!(render("discussions", TransportKind::Discord, &post, false).is_some());
}

#[test]
fn plain_discussions_is_text() {
    let post = event(
        "[[User:Alice]] created thread [[Hello]] https://community.fandom.com/d/p/3100000000000000001 : hi",
    );
    let Some(payload) = render("plain-discussions", TransportKind::Stdout, &post, false) else {
        panic!("post should render");
    };
    assert!(payload.embeds.is_empty());
    let content = payload.content.unwrap_or_default();
    assert!(content.contains("Hello"));
    assert!(content.ends_with("(*hi*)"));
}

#[test]
fn hostile_thread_title_stays_inside_its_link() {
    let post = event(
        "[[User:Alice]] created thread [[x](https://evil.example) **boom**]] https://c.wikia.com/d/p/3100000000000000001 : hi",
    );
    let Some(payload) = render("plain-discussions", TransportKind::Stdout, &post, false) else {
        panic!("post should render");
    };
    let content = payload.content.unwrap_or_default();
    assert!(
        content.contains(&format!(
            "[x\\]\\(https:/{ZWS}/evil.example\\) \\*\\*boom\\*\\*](<https://c.wikia.com/d/p/3100000000000000001>)"
        )),
        "{content}"
    );
    assert!(!content.contains("**boom**"));
}

#[test]
fn spam_embed_carries_report_command_and_urgency() {
    let report = event("HIT (!) [[User:Bob]] edited https://c.wikia.com/index.php?oldid=42");
    let Some(calm) = render("spam", TransportKind::Discord, &report, false) else {
        panic!("report should render");
    };
    let Some(urgent) = render("spam", TransportKind::Discord, &report, true) else {
        panic!("report should render");
    };

    let description = calm.embeds[0].description.clone().unwrap_or_default();
    assert!(description.contains("`!report s c Bob`"));
    assert_eq!(calm.embeds[0].title.as_deref(), Some("Spam filter hit"));

    let author = |p: &Payload| p.embeds[0].author.as_ref().map(|a| a.name.clone());
    assert_eq!(author(&calm).as_deref(), Some("Bob [c]"));
    assert_eq!(author(&urgent).as_deref(), Some("Bob [c] !URGENT!"));
}

#[test]
fn newusers_format_needs_a_registration_transport() {
    let registry = FormatRegistry::with_builtins();
    assert!(matches!(
        registry.build("main", "newusers", TransportKind::Discord),
        Err(ConfigError::IncompatibleFormat { .. })
    ));
    assert!(registry
        .build("fresh", "newusers", TransportKind::NewUsers)
        .is_ok());
    assert!(matches!(
        registry.build("main", "rainbow", TransportKind::Discord),
        Err(ConfigError::UnknownFormat { .. })
    ));
}

#[test]
fn payload_serializes_as_webhook_body() {
    let block = event(
        "Block editor [[User:Troll]] blocked by admin [[User:Mod]] Length: 2 weeks \"vandalism\"",
    );
    let Some(payload) = render("activity", TransportKind::Discord, &block, false) else {
        panic!("block should render");
    };
    let value = match serde_json::to_value(&payload) {
        Ok(value) => value,
        Err(err) => panic!("payload should serialize: {err}"),
    };
    assert_eq!(value["embeds"][0]["title"], "Blocked by Mod");
    assert!(value.get("content").is_none());
    assert!(value["allowed_mentions"]["parse"].is_array());
}
