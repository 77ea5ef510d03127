use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Whether an entry is a scheduled event or a task to complete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub enum Kind {
    #[default]
    Event,
    Task,
}

impl Kind {
    pub fn label(self) -> &'static str {
        match self {
            Kind::Event => "Event",
            Kind::Task => "Task",
        }
    }
}

/// Stored as an integer; anything other than 0 reads as a task.
impl From<i64> for Kind {
    fn from(n: i64) -> Self {
        if n == 0 { Kind::Event } else { Kind::Task }
    }
}

impl From<Kind> for u8 {
    fn from(kind: Kind) -> u8 {
        match kind {
            Kind::Event => 0,
            Kind::Task => 1,
        }
    }
}

/// Priority on the importance/urgency grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub enum Level {
    #[default]
    Low,
    Medium,
    High,
    Urgent,
}

impl Level {
    pub fn from_index(n: i64) -> Option<Level> {
        match n {
            0 => Some(Level::Low),
            1 => Some(Level::Medium),
            2 => Some(Level::High),
            3 => Some(Level::Urgent),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Low => "Not Important - Not Urgent",
            Level::Medium => "Not Important - Urgent",
            Level::High => "Important - Not Urgent",
            Level::Urgent => "Important - Urgent",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Level::Low => "Low",
            Level::Medium => "Medium",
            Level::High => "High",
            Level::Urgent => "Urgent",
        }
    }
}

/// Out-of-range values read as `Low`.
impl From<i64> for Level {
    fn from(n: i64) -> Self {
        Level::from_index(n).unwrap_or_default()
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> u8 {
        match level {
            Level::Low => 0,
            Level::Medium => 1,
            Level::High => 2,
            Level::Urgent => 3,
        }
    }
}

/// A single todo entry as stored in a month file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub place: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub kind: Kind,
    #[serde(default)]
    pub level: Level,
    /// When the entry is due. Also its identity within a month.
    #[serde(with = "todo_time_format", alias = "todotime")]
    pub todo_time: NaiveDateTime,
    #[serde(default)]
    pub done: bool,
    /// Minutes before `todo_time` to remind; 0 disables the reminder.
    #[serde(default, alias = "warntime")]
    pub warn_time: u32,
    #[serde(default)]
    pub starred: bool,
    /// Position within its day, 1-based. 0 = never reordered.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub order: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl TodoItem {
    /// Create an event at `todo_time` with every other field defaulted
    pub fn new(name: impl Into<String>, todo_time: NaiveDateTime) -> Self {
        TodoItem {
            name: name.into(),
            content: String::new(),
            place: String::new(),
            label: String::new(),
            kind: Kind::Event,
            level: Level::Low,
            todo_time,
            done: false,
            warn_time: 0,
            starred: false,
            order: 0,
        }
    }

    /// Set the priority from its numeric index. Values above 3 are ignored.
    pub fn set_level(&mut self, level: u8) {
        if let Some(level) = Level::from_index(level.into()) {
            self.level = level;
        }
    }

    pub fn is_before(&self, other: &TodoItem) -> bool {
        self.todo_time < other.todo_time
    }

    /// True while `now` lies inside the warning window before the due time.
    pub fn should_remind(&self, now: NaiveDateTime) -> bool {
        if self.warn_time == 0 || self.done {
            return false;
        }
        let remind_at = self.todo_time - Duration::minutes(i64::from(self.warn_time));
        now > remind_at && now < self.todo_time
    }

    pub fn key(&self) -> TodoKey {
        TodoKey {
            time: self.todo_time,
            name: self.name.clone(),
        }
    }
}

/// The `(todo_time, name)` pair used to find an item when editing or reordering
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TodoKey {
    pub time: NaiveDateTime,
    pub name: String,
}

impl TodoKey {
    pub fn new(time: NaiveDateTime, name: impl Into<String>) -> Self {
        TodoKey {
            time,
            name: name.into(),
        }
    }

    pub fn matches(&self, item: &TodoItem) -> bool {
        item.todo_time == self.time && item.name == self.name
    }
}

/// Accepted spellings of a due time, tried in order after RFC 3339.
const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a due time. Offsets are dropped, keeping the wall-clock time they
/// were written with.
pub fn parse_todo_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

mod todo_time_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_todo_time(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid todoTime: {:?}", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_new_item_defaults() {
        let item = TodoItem::new("Dentist", at(10, 0));
        assert_eq!(item.kind, Kind::Event);
        assert_eq!(item.level, Level::Low);
        assert!(!item.done);
        assert!(!item.starred);
        assert_eq!(item.warn_time, 0);
        assert_eq!(item.order, 0);
    }

    #[test]
    fn test_set_level_rejects_out_of_range() {
        let mut item = TodoItem::new("x", at(10, 0));
        item.set_level(2);
        assert_eq!(item.level, Level::High);
        item.set_level(5);
        assert_eq!(item.level, Level::High);
        item.set_level(3);
        assert_eq!(item.level, Level::Urgent);
    }

    #[test]
    fn test_kind_from_integer() {
        assert_eq!(Kind::from(0), Kind::Event);
        assert_eq!(Kind::from(1), Kind::Task);
        assert_eq!(Kind::from(7), Kind::Task);
        assert_eq!(Kind::Task.label(), "Task");
    }

    #[test]
    fn test_level_labels() {
        assert_eq!(Level::Low.label(), "Not Important - Not Urgent");
        assert_eq!(Level::Urgent.label(), "Important - Urgent");
        assert_eq!(Level::High.short_label(), "High");
        assert_eq!(Level::from(9), Level::Low);
        assert_eq!(Level::Medium.index(), 1);
    }

    #[test]
    fn test_should_remind_inside_window_only() {
        let mut item = TodoItem::new("Call", at(10, 0));
        assert!(!item.should_remind(at(9, 55)), "no warn time set");

        item.warn_time = 15;
        assert!(item.should_remind(at(9, 50)));
        assert!(!item.should_remind(at(9, 45)), "window start is exclusive");
        assert!(!item.should_remind(at(9, 30)));
        assert!(!item.should_remind(at(10, 0)));

        item.done = true;
        assert!(!item.should_remind(at(9, 50)));
    }

    #[test]
    fn test_is_before() {
        let a = TodoItem::new("a", at(9, 0));
        let b = TodoItem::new("b", at(10, 0));
        assert!(a.is_before(&b));
        assert!(!b.is_before(&a));
    }

    #[test]
    fn test_key_matches_time_and_name() {
        let item = TodoItem::new("Gym", at(18, 0));
        assert!(item.key().matches(&item));
        assert!(!TodoKey::new(at(18, 0), "Pool").matches(&item));
        assert!(!TodoKey::new(at(18, 1), "Gym").matches(&item));
    }

    #[test]
    fn test_parse_todo_time_variants() {
        let expected = at(10, 0);
        assert_eq!(parse_todo_time("2025-03-15T10:00:00"), Some(expected));
        assert_eq!(parse_todo_time("2025-03-15T10:00:00+08:00"), Some(expected));
        assert_eq!(parse_todo_time("2025-03-15T10:00:00Z"), Some(expected));
        assert_eq!(parse_todo_time("2025-03-15 10:00"), Some(expected));
        assert_eq!(parse_todo_time("yesterday"), None);
    }
}
