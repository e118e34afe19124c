//! End-to-end: configuration in, lines through the relay, deliveries out.

use std::sync::Arc;

use signwatch::config::{Config, ConfigError};
use signwatch::diagnostics::{CollectingSink, Diagnostic, Severity};
use signwatch::event::EventKind;
use signwatch::relay::{LineOutcome, RawLine, Relay};
use signwatch::transports::Delivery;

const CONFIG: &str = r##"
[source]
channel = "#cvn-wikia"

[filters.everything]
kind = "all"

[filters.spam]
kind = "spam"

[transports.log]
kind = "stdout"
format = "activity"

[transports.reports]
kind = "stdout"
format = "spam"

[routes]
everything = "log"
spam = ["reports", "log"]
"##;

const EDIT: &str =
    "User [[User:Alice]] edited [[Main Page]] (+120) Diff: https://community.wikia.com/?diff=123";
const SPAM: &str = "HIT (!) [[User:Bob]] edited https://c.wikia.com/index.php?oldid=42";

fn relay(toml: &str) -> (Relay, Arc<CollectingSink>) {
    let config = match Config::from_toml(toml) {
        Ok(config) => config,
        Err(err) => panic!("config should parse: {err}"),
    };
    let sink = Arc::new(CollectingSink::new());
    match Relay::from_config(&config, sink.clone(), &|_| None) {
        Ok(relay) => (relay, sink),
        Err(err) => panic!("relay should build: {err}"),
    }
}

#[tokio::test]
async fn edit_reaches_the_catch_all_route() {
    let (relay, diagnostics) = relay(CONFIG);
    assert!(relay.config_errors().is_empty());

    let (outcome, reports) = relay
        .deliver_line(&RawLine::in_channel(EDIT, "#cvn-wikia"))
        .await;

    assert_eq!(
        outcome,
        LineOutcome::Dispatched {
            kind: EventKind::Edit,
            deliveries: 1,
        }
    );
    assert_eq!(reports[0].filter, "everything");
    assert_eq!(reports[0].destination, "log");
    assert_eq!(reports[0].outcome, Ok(Delivery::Sent));
    assert_eq!(diagnostics.count(Severity::Warn), 0);
    assert_eq!(diagnostics.count(Severity::Error), 0);
}

#[tokio::test]
async fn spam_fans_out_to_every_destination() {
    let (relay, _) = relay(CONFIG);

    let (outcome, reports) = relay.deliver_line(&RawLine::new(SPAM)).await;

    // everything -> log, spam -> reports + log
    assert_eq!(
        outcome,
        LineOutcome::Dispatched {
            kind: EventKind::SpamReport,
            deliveries: 3,
        }
    );
    let sent = reports
        .iter()
        .filter(|r| r.outcome == Ok(Delivery::Sent))
        .count();
    let skipped = reports
        .iter()
        .filter(|r| r.outcome == Ok(Delivery::Skipped))
        .count();
    // The activity format has nothing to say about spam reports.
    assert_eq!(sent, 1);
    assert_eq!(skipped, 2);
}

#[tokio::test]
async fn list_absence_is_dropped() {
    let (relay, _) = relay(CONFIG);
    let (outcome, reports) = relay
        .deliver_line(&RawLine::new("Bob is not on global blacklist"))
        .await;
    assert_eq!(outcome, LineOutcome::Dropped(EventKind::ListAbsence));
    assert!(reports.is_empty());
}

#[tokio::test]
async fn other_channels_are_ignored() {
    let (relay, _) = relay(CONFIG);
    let (outcome, reports) = relay
        .deliver_line(&RawLine::in_channel(EDIT, "#wikia-chatter"))
        .await;
    assert_eq!(outcome, LineOutcome::Ignored);
    assert!(reports.is_empty());

    let (outcome, _) = relay
        .deliver_line(&RawLine::parse_tagged(&format!("#CVN-Wikia\t{EDIT}")))
        .await;
    assert!(matches!(outcome, LineOutcome::Dispatched { .. }));
}

#[tokio::test]
async fn unknown_lines_dispatch_nothing() {
    let (relay, _) = relay(CONFIG);
    let (outcome, reports) = relay
        .deliver_line(&RawLine::new("<Alice> anyone around?"))
        .await;
    assert_eq!(outcome, LineOutcome::Unknown);
    assert!(reports.is_empty());
}

#[tokio::test]
async fn handle_line_then_shutdown_drains() {
    let (relay, _) = relay(CONFIG);
    let outcome = relay.handle_line(&RawLine::new(EDIT));
    assert_eq!(
        outcome,
        LineOutcome::Dispatched {
            kind: EventKind::Edit,
            deliveries: 1,
        }
    );
    assert!(relay.shutdown().await);
    assert_eq!(relay.dispatcher().in_flight(), 0);
}

#[test]
fn missing_secret_is_reported_not_fatal() {
    let toml = r#"
[filters.everything]
kind = "all"

[transports.main]
kind = "discord"
format = "activity"
id = "1"
token_env = "SIGNWATCH_TEST_TOKEN"

[routes]
everything = "main"
"#;
    let (relay, diagnostics) = relay(toml);

    assert!(relay.dispatcher().routes().is_empty());
    assert_eq!(
        relay.config_errors()[0],
        ConfigError::MissingSecret {
            destination: "main".to_owned(),
        }
    );
    assert!(diagnostics
        .entries()
        .iter()
        .any(|(_, d)| matches!(d, Diagnostic::Configuration(_))));
}

#[test]
fn token_env_resolves_the_webhook() {
    let toml = r#"
[filters.everything]
kind = "all"

[transports.main]
format = "activity"
id = "1"
token_env = "SIGNWATCH_TEST_TOKEN"

[routes]
everything = "main"
"#;
    let config = match Config::from_toml(toml) {
        Ok(config) => config,
        Err(err) => panic!("config should parse: {err}"),
    };
    let env = |key: &str| (key == "SIGNWATCH_TEST_TOKEN").then(|| "secret".to_owned());
    let relay = match Relay::from_config(&config, Arc::new(CollectingSink::new()), &env) {
        Ok(relay) => relay,
        Err(err) => panic!("relay should build: {err}"),
    };
    assert!(relay.config_errors().is_empty());
    assert_eq!(relay.dispatcher().routes().len(), 1);
}
