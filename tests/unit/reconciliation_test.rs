//! Unit tests for the reconciled bookmark list.

use chrono::{DateTime, Utc};
use rstest::rstest;

use smartmarks::managers::reconciliation::{ApplyOutcome, BookmarkList, ListState};
use smartmarks::types::bookmark::Bookmark;
use smartmarks::types::change::ChangeEvent;

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn bookmark(id: &str, created: i64) -> Bookmark {
    Bookmark {
        id: id.to_string(),
        title: format!("Title {}", id),
        url: format!("https://{}.example", id),
        created_at: at(created),
        owner: "user-1".to_string(),
    }
}

fn ids(list: &BookmarkList) -> Vec<&str> {
    list.snapshot().iter().map(|b| b.id.as_str()).collect()
}

fn delete(id: &str) -> ChangeEvent {
    ChangeEvent::Delete { id: id.to_string() }
}

fn seeded(records: Vec<Bookmark>) -> BookmarkList {
    let mut list = BookmarkList::new();
    list.seed(records);
    list
}

#[test]
fn test_new_list_is_uninitialized_and_empty() {
    let list = BookmarkList::new();
    assert_eq!(list.state(), ListState::Uninitialized);
    assert!(list.is_empty());
}

#[test]
fn test_seed_delete_leaves_remaining_record() {
    let mut list = seeded(vec![bookmark("a", 2), bookmark("b", 1)]);

    assert_eq!(list.apply(delete("a")), ApplyOutcome::Removed(1));

    assert_eq!(ids(&list), vec!["b"]);
}

#[test]
fn test_insert_into_empty_seed() {
    let mut list = seeded(vec![]);
    let record = Bookmark {
        id: "x".to_string(),
        title: "G".to_string(),
        url: "https://g.com".to_string(),
        created_at: at(9),
        owner: "user-1".to_string(),
    };

    assert_eq!(list.apply(ChangeEvent::Insert(record.clone())), ApplyOutcome::Inserted);

    assert_eq!(list.snapshot(), &[record]);
}

#[test]
fn test_insert_goes_to_head_even_when_older() {
    let mut list = seeded(vec![bookmark("new", 100), bookmark("mid", 50)]);

    list.apply(ChangeEvent::Insert(bookmark("ancient", 1)));

    assert_eq!(ids(&list), vec!["ancient", "new", "mid"]);
}

#[test]
fn test_redelivered_insert_appends_duplicate() {
    let mut list = seeded(vec![]);
    list.apply(ChangeEvent::Insert(bookmark("x", 1)));
    list.apply(ChangeEvent::Insert(bookmark("x", 1)));
    assert_eq!(ids(&list), vec!["x", "x"]);
}

#[test]
fn test_double_delete_of_absent_id_leaves_list_unchanged() {
    let mut list = seeded(vec![bookmark("a", 2), bookmark("b", 1)]);
    let before = list.snapshot().to_vec();

    assert_eq!(list.apply(delete("x")), ApplyOutcome::Unchanged);
    assert_eq!(list.snapshot(), before.as_slice());

    assert_eq!(list.apply(delete("x")), ApplyOutcome::Unchanged);
    assert_eq!(list.snapshot(), before.as_slice());
}

#[test]
fn test_update_replaces_in_place() {
    let mut list = seeded(vec![bookmark("a", 3), bookmark("b", 2), bookmark("c", 1)]);
    let mut renamed = bookmark("b", 2);
    renamed.title = "Renamed".to_string();

    let outcome = list.apply(ChangeEvent::Update {
        old_id: None,
        record: renamed.clone(),
    });

    assert_eq!(outcome, ApplyOutcome::Updated(1));
    assert_eq!(ids(&list), vec!["a", "b", "c"]);
    assert_eq!(list.get("b"), Some(&renamed));
}

#[test]
fn test_update_matches_on_new_record_id_not_old_id() {
    let mut list = seeded(vec![bookmark("a", 2), bookmark("b", 1)]);
    let mut record = bookmark("b", 1);
    record.title = "from b".to_string();

    list.apply(ChangeEvent::Update {
        old_id: Some("a".to_string()),
        record,
    });

    assert_eq!(list.get("a").unwrap().title, "Title a");
    assert_eq!(list.get("b").unwrap().title, "from b");
}

#[test]
fn test_update_of_absent_record_is_noop() {
    let mut list = seeded(vec![bookmark("a", 2), bookmark("b", 1)]);
    let before = list.snapshot().to_vec();

    let outcome = list.apply(ChangeEvent::Update {
        old_id: None,
        record: bookmark("zzz", 5),
    });

    assert_eq!(outcome, ApplyOutcome::Unchanged);
    assert_eq!(list.snapshot(), before.as_slice());
}

#[rstest]
#[case::insert(ChangeEvent::Insert(bookmark("a", 1)))]
#[case::delete(ChangeEvent::Delete { id: "a".to_string() })]
#[case::update(ChangeEvent::Update { old_id: None, record: bookmark("a", 1) })]
fn test_events_before_seed_are_ignored(#[case] event: ChangeEvent) {
    let mut list = BookmarkList::new();

    assert_eq!(list.apply(event), ApplyOutcome::Ignored);
    assert!(list.is_empty());
    assert_eq!(list.state(), ListState::Uninitialized);
}

#[test]
fn test_seed_fully_replaces_previous_state() {
    let mut list = seeded(vec![bookmark("a", 2)]);
    list.apply(ChangeEvent::Insert(bookmark("live", 3)));

    list.seed(vec![bookmark("c", 9), bookmark("d", 8)]);

    assert_eq!(ids(&list), vec!["c", "d"]);
    assert_eq!(list.state(), ListState::Seeded);
}

#[rstest]
#[case(ApplyOutcome::Inserted, true)]
#[case(ApplyOutcome::Updated(1), true)]
#[case(ApplyOutcome::Removed(2), true)]
#[case(ApplyOutcome::Unchanged, false)]
#[case(ApplyOutcome::Ignored, false)]
fn test_outcome_changed(#[case] outcome: ApplyOutcome, #[case] expected: bool) {
    assert_eq!(outcome.changed(), expected);
}
