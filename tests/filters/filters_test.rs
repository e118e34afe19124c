//! Filter registry and built-in filter behaviour.

use signwatch::classifier::wiki::WikiRef;
use signwatch::config::{ConfigError, FilterConfig};
use signwatch::event::{
    ActorClass, Event, NewUserEvent, SpamAction, SpamEvent, SpamType, UploadEvent,
};
use signwatch::filters::{FilterRegistry, Verdict};

fn config(kind: &str) -> FilterConfig {
    FilterConfig {
        kind: kind.to_owned(),
        ..FilterConfig::default()
    }
}

fn spam(user: &str, wiki: &str) -> Event {
    Event::SpamReport(SpamEvent {
        spam_type: SpamType::Hit,
        coi: None,
        percent: Some(1.0),
        user: user.to_owned(),
        action: Some(SpamAction::Edit),
        wiki: WikiRef::new(wiki),
        oldid: None,
        title: None,
        url: None,
        filter: None,
    })
}

fn upload(user_type: ActorClass, wiki: &str) -> Event {
    Event::Upload(UploadEvent {
        user_type,
        user: "Ann".to_owned(),
        reupload: false,
        namespace: "File".to_owned(),
        title: "Cat.png".to_owned(),
        wiki: WikiRef::new(wiki),
    })
}

fn registration() -> Event {
    Event::NewUserRegistration(NewUserEvent {
        user: "Newbie".to_owned(),
        wiki: WikiRef::new("dev"),
    })
}

#[test]
fn builtin_kinds_are_registered() {
    let registry = FilterRegistry::with_builtins();
    for kind in ["all", "discussions", "newusers", "spam", "custom"] {
        assert!(registry.contains(kind), "missing {kind}");
    }
}

#[test]
fn unknown_kind_names_the_section() {
    let registry = FilterRegistry::with_builtins();
    let Err(err) = registry.build("mine", &config("fancy")) else {
        panic!("unknown kind should not build");
    };
    assert_eq!(
        err,
        ConfigError::UnknownKind {
            component: "filter",
            name: "mine".to_owned(),
            kind: "fancy".to_owned(),
        }
    );
}

#[test]
fn all_filter_skips_list_absence() {
    let registry = FilterRegistry::with_builtins();
    let Ok(all) = registry.build("all", &config("all")) else {
        panic!("all filter should build");
    };
    assert_eq!(all.evaluate(&registration()), Verdict::Accept);
    assert_eq!(all.evaluate(&Event::ListAbsence), Verdict::Reject);
}

#[test]
fn newusers_filter_accepts_only_registrations() {
    let registry = FilterRegistry::with_builtins();
    let Ok(filter) = registry.build("fresh", &config("newusers")) else {
        panic!("newusers filter should build");
    };
    assert!(filter.accepts(&registration()));
    assert!(!filter.accepts(&spam("Bob", "c")));
}

#[test]
fn repeat_spammer_is_urgent_across_wikis() {
    let registry = FilterRegistry::with_builtins();
    let Ok(filter) = registry.build("spam", &config("spam")) else {
        panic!("spam filter should build");
    };
    assert_eq!(filter.evaluate(&spam("Bob", "one")), Verdict::Accept);
    assert_eq!(filter.evaluate(&spam("Bob", "two")), Verdict::Urgent);
    assert_eq!(filter.evaluate(&spam("Carol", "one")), Verdict::Accept);
    assert_eq!(filter.evaluate(&registration()), Verdict::Reject);
}

#[test]
fn spam_capacity_must_be_positive() {
    let registry = FilterRegistry::with_builtins();
    let section = FilterConfig {
        capacity: Some(0),
        ..config("spam")
    };
    assert!(matches!(
        registry.build("spam", &section),
        Err(ConfigError::InvalidOption { .. })
    ));
}

#[test]
fn custom_filter_combines_allow_lists() {
    let registry = FilterRegistry::with_builtins();
    let section = FilterConfig {
        types: vec!["upload".to_owned()],
        wikis: vec!["pets".to_owned()],
        user_types: vec!["ip".to_owned(), "user".to_owned()],
        ..config("custom")
    };
    let Ok(filter) = registry.build("mine", &section) else {
        panic!("custom filter should build");
    };
    assert!(filter.accepts(&upload(ActorClass::User, "pets")));
    assert!(!filter.accepts(&upload(ActorClass::Admin, "pets")));
    assert!(!filter.accepts(&upload(ActorClass::User, "cars")));
    assert!(!filter.accepts(&spam("Bob", "pets")));
}

#[test]
fn custom_filter_rejects_unknown_tags() {
    let registry = FilterRegistry::with_builtins();
    let section = FilterConfig {
        types: vec!["carrier-pigeon".to_owned()],
        ..config("custom")
    };
    assert!(matches!(
        registry.build("mine", &section),
        Err(ConfigError::InvalidOption { .. })
    ));
}
