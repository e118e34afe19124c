//! Classifier-level properties: examples, idempotence, first-match order,
//! unknown handling.

use std::sync::Arc;

use signwatch::classifier::{Classification, Classifier, UnknownReason};
use signwatch::diagnostics::{CollectingSink, Diagnostic, Severity};
use signwatch::event::{ActorClass, EditAction, Event, EventKind, ListAction, ListCode};

fn classifier() -> (Classifier, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let classifier = match Classifier::builtin(sink.clone()) {
        Ok(classifier) => classifier,
        Err(err) => panic!("builtin catalog should compile: {err}"),
    };
    (classifier, sink)
}

/// One line per family, with the type each must classify as.
const SAMPLES: &[(&str, EventKind)] = &[
    (
        "[[User:Alice]] created thread [[Hello]] https://community.fandom.com/d/p/3100000000000000001 : hi there",
        EventKind::DiscussionAction,
    ),
    (
        "COI5 (0.75) [[User:Spammer]] created https://shop.wikia.com/ with title Buy now",
        EventKind::SpamReport,
    ),
    (
        "Newbie New user registration https://dev.fandom.com/wiki/Special:Log/newusers - https://dev.fandom.com/wiki/Special:Contributions/Newbie",
        EventKind::NewUserRegistration,
    ),
    (
        "User [[User:Alice]] edited [[Main Page]] (+120) Diff: http://en.example.com/?diff=123",
        EventKind::Edit,
    ),
    (
        "User [[User:Ann]] replaced [[Page]] with \"spam\" (-100) Diff: https://x.wikia.com/?diff=5&oldid=4",
        EventKind::Edit,
    ),
    (
        "User [[User:Ann]] uploaded [[File:Cat.png]] URL: https://pets.wikia.com/wiki/File:Cat.png",
        EventKind::Upload,
    ),
    (
        "Block editor [[User:Troll]] blocked by admin [[User:Mod]] Length: 2 weeks \"vandalism\"",
        EventKind::Block,
    ),
    (
        "Added: Bob is on global blacklist, added by Mod until 2026-12-01 (\"spam\")",
        EventKind::ListAction,
    ),
    ("Deleted Bob from global blacklist", EventKind::ListRemoval),
    ("Bob is not on global blacklist", EventKind::ListAbsence),
    ("some random chatter", EventKind::Unknown),
];

#[test]
fn example_a_edit() {
    let (classifier, _) = classifier();
    let event = classifier
        .classify(
            "User [[User:Alice]] edited [[Main Page]] (+120) Diff: http://en.example.com/?diff=123",
        )
        .into_event();
    let Some(Event::Edit(edit)) = event else {
        panic!("expected an edit, got {event:?}");
    };
    assert_eq!(edit.user_type, ActorClass::User);
    assert_eq!(edit.user, "Alice");
    assert_eq!(edit.action, Some(EditAction::Edit));
    assert_eq!(edit.title, "Main Page");
    assert_eq!(edit.diff_size, Some(120));
    assert_eq!(edit.url_params.len(), 1);
    assert_eq!(edit.url_params.get("diff").map(String::as_str), Some("123"));
    assert!(edit.log.is_none());
}

#[test]
fn example_b_list_removal() {
    let (classifier, _) = classifier();
    let event = classifier
        .classify("Deleted Bob from global blacklist")
        .into_event();
    let Some(Event::ListRemoval(list)) = event else {
        panic!("expected a list removal, got {event:?}");
    };
    assert_eq!(list.action, ListAction::Delete);
    assert_eq!(list.user, "Bob");
    assert_eq!(list.list, Some(ListCode::Bl));
}

#[test]
fn example_c_unknown_keeps_raw_text() {
    let (classifier, sink) = classifier();
    match classifier.classify("some random chatter\r\n") {
        Classification::Unknown(unknown) => {
            assert_eq!(unknown.raw, "some random chatter");
            assert_eq!(unknown.reason, UnknownReason::NoMatch);
        }
        Classification::Event(event) => panic!("expected unknown, got {event:?}"),
    }
    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, Severity::Debug);
    assert!(matches!(entries[0].1, Diagnostic::UnrecognizedLine { .. }));
}

#[test]
fn every_sample_classifies_as_its_family() {
    let (classifier, _) = classifier();
    for (line, kind) in SAMPLES {
        assert_eq!(classifier.classify(line).kind(), *kind, "line: {line}");
    }
}

#[test]
fn classification_is_idempotent() {
    let (classifier, _) = classifier();
    for (line, _) in SAMPLES {
        assert_eq!(classifier.classify(line), classifier.classify(line), "line: {line}");
    }
}

#[test]
fn discussions_template_wins_over_edit() {
    // Starts like an edit sign would after the actor class, but the
    // Discussions template is tried first and owns it.
    let (classifier, _) = classifier();
    let line = "[[User:Alice]] edited reply https://c.wikia.com/d/p/3100000000000000001/r/3100000000000000002 : fixed";
    assert_eq!(classifier.classify(line).kind(), EventKind::DiscussionAction);
}

#[test]
fn well_formed_lines_raise_no_warnings() {
    let (classifier, sink) = classifier();
    for (line, kind) in SAMPLES {
        if *kind != EventKind::Unknown && !line.contains("replaced") {
            classifier.classify(line);
        }
    }
    assert_eq!(sink.count(Severity::Warn), 0);
    assert_eq!(sink.count(Severity::Error), 0);
}
