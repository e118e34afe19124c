//! Per-family extraction through the public classifier.

use std::sync::Arc;

use signwatch::classifier::{Classifier, Family};
use signwatch::diagnostics::{CollectingSink, Diagnostic, Severity};
use signwatch::event::{
    BlockAction, DiscussionAction, DiscussionTarget, EditAction, Event, ListAction, ListCode,
    SpamAction, SpamType,
};

fn classify(line: &str) -> (Option<Event>, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let classifier = match Classifier::builtin(sink.clone()) {
        Ok(classifier) => classifier,
        Err(err) => panic!("builtin catalog should compile: {err}"),
    };
    (classifier.classify(line).into_event(), sink)
}

#[test]
fn percent_literal_law() {
    for (token, expected) in [("direct", 1.0), ("!", 1.0), ("0.75", 0.75), ("1", 1.0)] {
        let line = format!("HIT ({token}) [[User:Bob]] edited https://c.wikia.com/index.php?oldid=42");
        let (event, _) = classify(&line);
        let Some(Event::SpamReport(report)) = event else {
            panic!("expected a spam report for {token}");
        };
        assert_eq!(report.percent, Some(expected), "token {token}");
    }
}

#[test]
fn unparseable_percent_is_partial() {
    let (event, sink) =
        classify("HIT (lots) [[User:Bob]] edited https://c.wikia.com/index.php?oldid=42");
    let Some(Event::SpamReport(report)) = event else {
        panic!("expected a spam report");
    };
    assert_eq!(report.percent, None);
    assert_eq!(sink.count(Severity::Warn), 1);
}

#[test]
fn exotic_float_percent_is_partial_and_stable() {
    for token in ["NaN", "inf", "1e5", "0.123"] {
        let line = format!(
            "COI5 ({token}) [[User:S]] created https://shop.wikia.com/ with title Buy"
        );
        let (first, sink) = classify(&line);
        let (second, _) = classify(&line);
        let Some(Event::SpamReport(report)) = &first else {
            panic!("expected a spam report for {token}");
        };
        assert_eq!(report.percent, None, "token {token}");
        assert_eq!(sink.count(Severity::Warn), 1, "token {token}");
        assert_eq!(first, second, "token {token}");
    }
}

#[test]
fn spam_hit_with_filter() {
    let (event, _) = classify(
        "HIT (!) [[User:Bob]] edited https://c.wikia.com/index.php?oldid=42 matching filter #17",
    );
    let Some(Event::SpamReport(report)) = event else {
        panic!("expected a spam report");
    };
    assert_eq!(report.spam_type, SpamType::Hit);
    assert_eq!(report.coi, None);
    assert_eq!(report.action, Some(SpamAction::Edit));
    assert_eq!(report.oldid, Some(42));
    assert_eq!(report.filter.as_deref(), Some("17"));
    assert_eq!(report.wiki.subdomain, "c");
}

#[test]
fn spam_coi_with_title_on_language_wiki() {
    let (event, _) = classify(
        "COI5 (0.75) [[User:Spammer]] created wiki https://shop.fandom.com/de/ with title Buy now",
    );
    let Some(Event::SpamReport(report)) = event else {
        panic!("expected a spam report");
    };
    assert_eq!(report.spam_type, SpamType::Coi);
    assert_eq!(report.coi, Some(5));
    assert_eq!(report.action, Some(SpamAction::Wiki));
    assert_eq!(report.title.as_deref(), Some("Buy now"));
    assert!(report.wiki.fandom);
    assert_eq!(report.wiki.lang.as_deref(), Some("de"));
}

#[test]
fn list_abbreviation_round_trip() {
    for (long, code) in ListCode::TABLE {
        let (event, sink) = classify(&format!("Deleted Someone from {long}"));
        let Some(Event::ListRemoval(list)) = event else {
            panic!("expected a list removal for {long}");
        };
        assert_eq!(list.list, Some(code), "list {long}");
        assert_eq!(sink.count(Severity::Warn), 0);
    }
}

#[test]
fn unknown_list_is_partial_but_still_emitted() {
    let (event, sink) = classify("Deleted Bob from global purplelist");
    let Some(Event::ListRemoval(list)) = event else {
        panic!("expected a list removal");
    };
    assert_eq!(list.list, None);
    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, Severity::Warn);
    assert!(matches!(
        entries[0].1,
        Diagnostic::PartialExtraction {
            family: Family::ListRemoval,
            ..
        }
    ));
}

#[test]
fn list_info_without_prefix() {
    let (event, _) =
        classify("Bob is on rc bot list, added by Mod until forever (\"approved bot\")");
    let Some(Event::ListAction(list)) = event else {
        panic!("expected a list action");
    };
    assert_eq!(list.action, ListAction::Info);
    assert_eq!(list.list, Some(ListCode::Bot));
    assert_eq!(list.added_by.as_deref(), Some("Mod"));
    assert_eq!(list.length.as_deref(), Some("forever"));
    assert_eq!(list.reason.as_deref(), Some("approved bot"));
}

#[test]
fn discussions_reply_with_count() {
    let (event, _) = classify(
        "[[User:Alice]] replied [[Hello there]] (4) https://community.fandom.com/d/p/3100000000000000001/r/3100000000000000009 : agreed",
    );
    let Some(Event::DiscussionAction(post)) = event else {
        panic!("expected a discussions event");
    };
    assert_eq!(post.action, Some(DiscussionAction::Create));
    assert_eq!(post.target, Some(DiscussionTarget::Reply));
    assert_eq!(post.title.as_deref(), Some("Hello there"));
    assert_eq!(post.reply_count, Some(4));
    assert_eq!(post.thread_id, "3100000000000000001");
    assert_eq!(post.reply_id.as_deref(), Some("3100000000000000009"));
    assert_eq!(post.summary, "agreed");
}

#[test]
fn discussions_unknown_verb_is_partial() {
    let (event, sink) = classify(
        "[[User:Alice]] locked thread https://c.wikia.com/d/p/3100000000000000001 : closed",
    );
    let Some(Event::DiscussionAction(post)) = event else {
        panic!("expected a discussions event");
    };
    assert_eq!(post.action, None);
    assert_eq!(sink.count(Severity::Warn), 1);
}

#[test]
fn url_marker_means_creation() {
    let (event, _) = classify(
        "IP [[User:10.0.0.1]] edited watched [[New Page]] (+300) URL: https://c.wikia.com/index.php?oldid=77 first!",
    );
    let Some(Event::Edit(edit)) = event else {
        panic!("expected an edit");
    };
    assert_eq!(edit.action, Some(EditAction::Create));
    assert!(edit.watchlist);
    assert_eq!(edit.url_params.get("oldid").map(String::as_str), Some("77"));
    assert_eq!(edit.summary.as_deref(), Some("first!"));
}

#[test]
fn log_tail_overrides_action() {
    let (event, _) = classify(
        "Admin [[User:Mod]] edited [[Special:Log]] (0) URL: https://c.wikia.com/wiki/Special:Log/delete",
    );
    let Some(Event::Edit(edit)) = event else {
        panic!("expected an edit");
    };
    assert_eq!(edit.action, Some(EditAction::Log));
    assert_eq!(edit.log.as_deref(), Some("delete"));
    assert!(edit.url_params.is_empty());
}

#[test]
fn blanked_page_is_an_edit() {
    let (event, _) = classify(
        "User [[User:Vandal]] blanked [[Main Page]] (-2000) URL: https://c.wikia.com/?diff=9",
    );
    let Some(Event::Edit(edit)) = event else {
        panic!("expected an edit");
    };
    assert_eq!(edit.action, Some(EditAction::Edit));
    assert!(edit.blank);
    assert_eq!(edit.diff_size, Some(-2000));
}

#[test]
fn replace_has_no_action() {
    let (event, sink) = classify(
        "User [[User:Ann]] replaced [[Page]] with \"spam\" (-100) Diff: https://x.wikia.com/?diff=5&oldid=4",
    );
    let Some(Event::Edit(edit)) = event else {
        panic!("expected an edit");
    };
    assert_eq!(edit.action, None);
    assert_eq!(edit.replace.as_deref(), Some("spam"));
    assert_eq!(edit.url_params.get("oldid").map(String::as_str), Some("4"));
    assert_eq!(sink.count(Severity::Warn), 0);
    assert_eq!(sink.count(Severity::Debug), 1);
}

#[test]
fn reupload_is_flagged() {
    let (event, _) = classify(
        "Whitelist [[User:Ann]] reuploaded [[File:Cat.png]] (+10) URL: https://pets.wikia.com/wiki/File:Cat.png",
    );
    let Some(Event::Upload(upload)) = event else {
        panic!("expected an upload");
    };
    assert!(upload.reupload);
    assert_eq!(upload.namespace, "File");
    assert_eq!(upload.title, "Cat.png");
}

#[test]
fn unblock_without_length() {
    let (event, _) = classify(
        "Unblock editor [[User:Troll]] unblocked by admin [[User:Mod]] \"appeal accepted\"",
    );
    let Some(Event::Block(block)) = event else {
        panic!("expected a block");
    };
    assert_eq!(block.action, BlockAction::Unblock);
    assert_eq!(block.target, "Troll");
    assert_eq!(block.user, "Mod");
    assert_eq!(block.length, None);
    assert_eq!(block.reason, "appeal accepted");
}
