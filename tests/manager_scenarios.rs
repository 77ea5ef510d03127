//! End-to-end scenarios for the monthly manager against a real data
//! directory: legacy data in, structured files out.

use chrono::{NaiveDate, NaiveDateTime};
use monthly_todo::io::recovery::{RecoveryCategory, read_recovery_entries};
use monthly_todo::io::{FileStore, MonthStore};
use monthly_todo::model::{Kind, Level, TodoItem, TodoKey, ViewMode};
use monthly_todo::ops::{MigrationOutcome, MonthlyManager};
use monthly_todo::parse::{parse_month, serialize_month};
use monthly_todo::util::DateKey;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

fn names(items: &[TodoItem]) -> Vec<String> {
    items.iter().map(|t| t.name.clone()).collect()
}

/// Two March records as the old application wrote them
const LEGACY_MARCH: &str = "\
2
1
Dentist
1
health
3
2025 3 15 10 0
1
Clinic
2
bring insurance card
arrive early
false 0 30
1
Groceries
0
0
2025 3 2 18 30
0
0
true 1 0
";

#[test]
fn legacy_month_is_read_then_migrated() {
    let tmp = TempDir::new().unwrap();
    let march = DateKey::new(2025, 3).unwrap();
    let store = FileStore::new(tmp.path());
    fs::write(store.legacy_path(march), LEGACY_MARCH).unwrap();

    let mgr = MonthlyManager::new(tmp.path());
    let before = mgr.get_todos_for_month(2025, 3).unwrap();
    assert_eq!(names(&before), vec!["Dentist", "Groceries"]);

    let dentist = &before[0];
    assert_eq!(dentist.label, "health");
    assert_eq!(dentist.level, Level::Urgent);
    assert_eq!(dentist.kind, Kind::Event);
    assert_eq!(dentist.place, "Clinic");
    assert_eq!(dentist.content, "bring insurance card\narrive early");
    assert_eq!(dentist.warn_time, 30);
    assert!(before[1].done);
    assert_eq!(before[1].kind, Kind::Task);

    let report = mgr.migrate_all_to_yaml().unwrap();
    assert_eq!(report.months, vec![(march, MigrationOutcome::Migrated(2))]);

    // The structured file now answers, and holds the same items
    let text = fs::read_to_string(store.structured_path(march)).unwrap();
    assert!(text.starts_with("version: 1\n"));
    assert_eq!(parse_month(&text).unwrap(), before);
    assert_eq!(mgr.get_todos_for_month(2025, 3).unwrap(), before);
}

#[test]
fn a_month_of_edits_survives_restart() {
    let tmp = TempDir::new().unwrap();
    {
        let mgr = MonthlyManager::new(tmp.path());
        let mut review = TodoItem::new("Review", at(2025, 3, 10, 14, 0));
        review.kind = Kind::Task;
        review.set_level(2);
        mgr.add_todo(review.clone()).unwrap();
        mgr.add_todo(TodoItem::new("Standup", at(2025, 3, 10, 9, 0)))
            .unwrap();
        mgr.add_todo(TodoItem::new("Trip", at(2025, 3, 31, 7, 0)))
            .unwrap();

        review.done = true;
        mgr.update_todo(review, at(2025, 3, 10, 14, 0)).unwrap();

        let mut trip = mgr.get_todo_by_time(at(2025, 3, 31, 7, 0)).unwrap();
        trip.todo_time = at(2025, 4, 1, 7, 0);
        mgr.update_todo(trip, at(2025, 3, 31, 7, 0)).unwrap();
    }

    let mgr = MonthlyManager::new(tmp.path());
    let march = mgr.get_todos_for_month(2025, 3).unwrap();
    assert_eq!(names(&march), vec!["Review", "Standup"]);
    assert!(march[0].done);
    assert_eq!(march[0].level, Level::High);
    assert_eq!(names(&mgr.get_todos_for_month(2025, 4).unwrap()), vec!["Trip"]);
    assert_eq!(
        mgr.get_all_months().unwrap(),
        vec![DateKey::new(2025, 3).unwrap(), DateKey::new(2025, 4).unwrap()]
    );
}

#[test]
fn reorder_gesture_then_view_filter() {
    let tmp = TempDir::new().unwrap();
    let mgr = MonthlyManager::new(tmp.path());
    let day = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
    for (name, h) in [("A", 12), ("B", 11), ("C", 10), ("D", 9)] {
        mgr.add_todo(TodoItem::new(name, at(2025, 3, 15, h, 0))).unwrap();
    }
    let mut done = mgr.get_todo_by_time(at(2025, 3, 15, 9, 0)).unwrap();
    done.done = true;
    mgr.update_todo(done, at(2025, 3, 15, 9, 0)).unwrap();

    // Drag D to the top one step at a time, then commit once
    let d = TodoKey::new(at(2025, 3, 15, 9, 0), "D");
    for _ in 0..3 {
        assert!(mgr.reorder_in_day(day, &d, -1).unwrap());
    }
    mgr.commit_month(2025, 3).unwrap();

    mgr.clear_cache();
    let full = mgr.todos_for_day(day).unwrap();
    assert_eq!(names(&full), vec!["D", "A", "B", "C"]);

    let incomplete: Vec<&str> = ViewMode::Incomplete
        .filter(&full)
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(incomplete, vec!["A", "B", "C"]);

    // Moving a hidden item still counts positions over the whole day
    let b = TodoKey::new(at(2025, 3, 15, 11, 0), "B");
    assert!(mgr.reorder_in_day(day, &b, -2).unwrap());
    assert_eq!(names(&mgr.todos_for_day(day).unwrap()), vec!["B", "D", "A", "C"]);
}

#[test]
fn bulk_delete_across_months() {
    let tmp = TempDir::new().unwrap();
    let mgr = MonthlyManager::new(tmp.path());
    let doomed = [at(2025, 1, 5, 8, 0), at(2025, 2, 5, 8, 0), at(2025, 2, 6, 8, 0)];
    for (i, t) in doomed.iter().enumerate() {
        mgr.add_todo(TodoItem::new(format!("gone {i}"), *t)).unwrap();
    }
    mgr.add_todo(TodoItem::new("kept", at(2025, 2, 7, 8, 0))).unwrap();

    mgr.remove_todos(&doomed).unwrap();
    mgr.clear_cache();

    assert!(mgr.get_todos_for_month(2025, 1).unwrap().is_empty());
    assert_eq!(names(&mgr.get_todos_for_month(2025, 2).unwrap()), vec!["kept"]);
    // Emptied months keep their (empty) file
    assert_eq!(mgr.get_all_months().unwrap().len(), 2);
}

#[test]
fn corrupt_month_is_logged_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let store = FileStore::new(tmp.path());
    let june = DateKey::new(2025, 6).unwrap();
    fs::write(store.structured_path(june), "version: 1\ntodos: [oops").unwrap();

    let mgr = MonthlyManager::new(tmp.path());
    assert!(mgr.get_todos_for_month(2025, 6).unwrap().is_empty());

    let entries = read_recovery_entries(tmp.path(), None);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, RecoveryCategory::Parser);
    assert!(entries[0].body.contains("todos: [oops"));
}

#[test]
fn bare_list_documents_are_accepted() {
    let tmp = TempDir::new().unwrap();
    let store = FileStore::new(tmp.path());
    let may = DateKey::new(2025, 5).unwrap();
    fs::write(
        store.structured_path(may),
        "- name: Bare\n  todotime: 2025-05-04T08:00:00Z\n  warntime: 10\n  level: 9\n  kind: 4\n",
    )
    .unwrap();

    let todos = store.load_todos(may).unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].todo_time, at(2025, 5, 4, 8, 0));
    assert_eq!(todos[0].warn_time, 10);
    assert_eq!(todos[0].level, Level::Low);
    assert_eq!(todos[0].kind, Kind::Task);

    // Rewritten in the wrapped shape on the next save
    store.save_todos(may, &todos).unwrap();
    let text = fs::read_to_string(store.structured_path(may)).unwrap();
    assert_eq!(text, serialize_month(&todos).unwrap());
    assert!(text.contains("todoTime:"));
    assert!(text.contains("2025-05-04T08:00:00"));
    assert!(!text.contains("todotime"));
}
