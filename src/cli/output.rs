use chrono::NaiveDate;
use serde::Serialize;

use crate::io::recovery::RecoveryEntry;
use crate::model::todo::{Kind, TodoItem};
use crate::model::view::ViewMode;
use crate::ops::manager::{MigrationOutcome, MigrationReport};
use crate::util::DateKey;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TodoJson {
    pub name: String,
    pub time: String,
    pub kind: &'static str,
    pub level: u8,
    pub done: bool,
    pub starred: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub place: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub warn_time: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub order: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

#[derive(Serialize)]
pub struct DayJson {
    pub date: String,
    pub view: ViewMode,
    pub todos: Vec<TodoJson>,
}

#[derive(Serialize)]
pub struct MonthJson {
    pub month: String,
    pub view: ViewMode,
    pub todos: Vec<TodoJson>,
}

#[derive(Serialize)]
pub struct MigrationJson {
    pub month: String,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct RecoveryEntryJson {
    pub timestamp: String,
    pub category: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<(String, String)>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn todo_to_json(item: &TodoItem) -> TodoJson {
    TodoJson {
        name: item.name.clone(),
        time: item.todo_time.format(TIME_FORMAT).to_string(),
        kind: match item.kind {
            Kind::Event => "event",
            Kind::Task => "task",
        },
        level: item.level.index(),
        done: item.done,
        starred: item.starred,
        label: item.label.clone(),
        place: item.place.clone(),
        content: item.content.clone(),
        warn_time: item.warn_time,
        order: item.order,
    }
}

pub fn migration_to_json(report: &MigrationReport) -> Vec<MigrationJson> {
    report
        .months
        .iter()
        .map(|(key, outcome)| {
            let (name, count, error) = match outcome {
                MigrationOutcome::Migrated(n) => ("migrated", Some(*n), None),
                MigrationOutcome::AlreadyStructured => ("already_structured", None, None),
                MigrationOutcome::Empty => ("empty", None, None),
                MigrationOutcome::Unreadable(e) => ("unreadable", None, Some(e.clone())),
            };
            MigrationJson {
                month: key.to_string(),
                outcome: name,
                count,
                error,
            }
        })
        .collect()
}

pub fn recovery_to_json(entry: &RecoveryEntry) -> RecoveryEntryJson {
    RecoveryEntryJson {
        timestamp: entry.timestamp.to_rfc3339(),
        category: entry.category.to_string(),
        description: entry.description.clone(),
        fields: entry.fields.clone(),
        body: entry.body.clone(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// One-line summary: `[x] * 09:30 Name (Task, Urgent) @place #label`
pub fn format_todo_line(item: &TodoItem) -> String {
    let check = if item.done { 'x' } else { ' ' };
    let star = if item.starred { "* " } else { "" };
    let mut line = format!(
        "[{}] {}{} {} ({}, {})",
        check,
        star,
        item.todo_time.format("%H:%M"),
        item.name,
        item.kind.label(),
        item.level.short_label(),
    );
    if !item.place.is_empty() {
        line.push_str(&format!(" @{}", item.place));
    }
    if !item.label.is_empty() {
        line.push_str(&format!(" #{}", item.label));
    }
    line
}

pub fn format_day_header(date: NaiveDate, view: ViewMode) -> String {
    format!("== {} [{}] ==", date.format("%a %Y-%m-%d"), view.label())
}

/// A month grouped by day, newest day first
pub fn format_month_listing(key: DateKey, view: ViewMode, items: &[&TodoItem]) -> Vec<String> {
    let mut lines = vec![format!("== {} [{}] ==", key, view.label())];
    let mut current_day = None;
    for item in items {
        let day = item.todo_time.date();
        if current_day != Some(day) {
            lines.push(String::new());
            lines.push(format!("-- {} --", day.format("%a %Y-%m-%d")));
            current_day = Some(day);
        }
        lines.push(format_todo_line(item));
    }
    lines
}

pub fn format_migration(report: &MigrationReport) -> Vec<String> {
    if report.months.is_empty() {
        return vec!["no month files found".to_string()];
    }
    report
        .months
        .iter()
        .map(|(key, outcome)| format!("{}: {}", key, outcome))
        .collect()
}

pub fn format_recovery_entry(entry: &RecoveryEntry) -> Vec<String> {
    let mut lines = vec![format!(
        "{} [{}] {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.category,
        entry.description
    )];
    for (key, value) in &entry.fields {
        lines.push(format!("  {}: {}", key, value));
    }
    for body_line in entry.body.lines() {
        lines.push(format!("  | {}", body_line));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::todo::Level;

    fn sample() -> TodoItem {
        let time = NaiveDate::from_ymd_opt(2025, 3, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let mut item = TodoItem::new("Dentist", time);
        item.kind = Kind::Task;
        item.level = Level::Urgent;
        item.place = "Clinic".into();
        item
    }

    #[test]
    fn test_format_todo_line() {
        let mut item = sample();
        assert_eq!(
            format_todo_line(&item),
            format!("[ ] 09:30 Dentist (Task, {}) @Clinic", Level::Urgent.short_label())
        );
        item.done = true;
        item.starred = true;
        assert!(format_todo_line(&item).starts_with("[x] * 09:30"));
    }

    #[test]
    fn test_todo_json_omits_empty_fields() {
        let json = serde_json::to_value(todo_to_json(&sample())).unwrap();
        assert_eq!(json["time"], "2025-03-15 09:30");
        assert_eq!(json["kind"], "task");
        assert_eq!(json["level"], 3);
        assert!(json.get("label").is_none());
        assert!(json.get("order").is_none());
    }

    #[test]
    fn test_month_listing_groups_days() {
        let a = sample();
        let mut b = sample();
        b.todo_time = b.todo_time - chrono::Duration::days(1);
        let lines = format_month_listing(DateKey::new(2025, 3).unwrap(), ViewMode::All, &[&a, &b]);
        let headers: Vec<_> = lines.iter().filter(|l| l.starts_with("--")).collect();
        assert_eq!(headers.len(), 2);
        assert_eq!(lines[0], format!("== 202503 [{}] ==", ViewMode::All.label()));
    }
}
