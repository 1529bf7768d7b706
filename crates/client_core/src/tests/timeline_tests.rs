use super::*;
use shared::domain::Orientation;

fn local() -> Identity {
    Identity("user-local".to_string())
}

fn record(sender: &str, message: &str) -> ChatRecord {
    ChatRecord {
        sender: sender.to_string(),
        message: message.to_string(),
    }
}

#[test]
fn history_entries_precede_later_arrivals() {
    let mut timeline = Timeline::new(local());
    timeline.apply_history(vec![record("user-abc", "hi"), record("user-def", "hey")]);

    assert!(timeline.apply_live(vec![record("user-abc", "yo")]));
    assert!(timeline.apply_local("hello".to_string()));

    let snapshot = timeline.snapshot();
    let texts: Vec<&str> = snapshot.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["hi", "hey", "yo", "hello"]);
    assert_eq!(snapshot[0].origin, Origin::History);
    assert_eq!(snapshot[2].origin, Origin::Live);
    assert_eq!(snapshot[3].origin, Origin::Optimistic);
}

#[test]
fn arrivals_before_history_are_deferred_in_arrival_order() {
    let mut timeline = Timeline::new(local());

    assert!(!timeline.apply_local("hello".to_string()));
    assert!(!timeline.apply_live(vec![record("user-abc", "yo")]));
    assert!(timeline.is_empty());

    timeline.apply_history(vec![record("user-abc", "hi")]);

    let snapshot = timeline.snapshot();
    let texts: Vec<&str> = snapshot.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["hi", "hello", "yo"]);
}

#[test]
fn live_self_echo_is_dropped_before_insertion() {
    let mut timeline = Timeline::new(local());
    timeline.apply_history(Vec::new());

    assert!(timeline.apply_local("hello".to_string()));
    let changed = timeline.apply_live(vec![
        record("user-local", "hello"),
        record("user-abc", "yo"),
    ]);
    assert!(changed);

    let snapshot = timeline.snapshot();
    let hellos: Vec<&Message> = snapshot.iter().filter(|m| m.text == "hello").collect();
    assert_eq!(hellos.len(), 1);
    assert_eq!(hellos[0].origin, Origin::Optimistic);
    assert_eq!(snapshot.last().expect("entry").text, "yo");
}

#[test]
fn a_batch_of_only_self_echoes_changes_nothing() {
    let mut timeline = Timeline::new(local());
    timeline.apply_history(Vec::new());

    assert!(!timeline.apply_live(vec![record("user-local", "hello")]));
    assert!(timeline.is_empty());
}

#[test]
fn history_keeps_the_local_users_prior_messages() {
    let mut timeline = Timeline::new(local());
    timeline.apply_history(vec![record("user-local", "earlier")]);

    let snapshot = timeline.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].origin, Origin::History);
    assert_eq!(snapshot[0].orientation(&local()), Orientation::Own);
}

#[test]
fn blank_text_is_rejected_on_every_path() {
    let mut timeline = Timeline::new(local());
    timeline.apply_history(vec![record("user-abc", "   ")]);
    assert!(timeline.is_empty());

    assert!(!timeline.apply_live(vec![record("user-abc", "")]));
    assert!(!timeline.apply_local("  ".to_string()));
    assert!(timeline.is_empty());
}

#[test]
fn history_resolves_at_most_once() {
    let mut timeline = Timeline::new(local());
    timeline.apply_history(vec![record("user-abc", "hi")]);
    timeline.apply_history(vec![record("user-abc", "again")]);

    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.snapshot()[0].text, "hi");
}
