use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;

use crate::io::store::{FileStore, MonthStore, StoreError};
use crate::model::todo::{TodoItem, TodoKey};
use crate::ops::ordering::{in_day, reorder, sort_display, sort_storage};
use crate::util::DateKey;

/// Error type for manager operations
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("todo not found: {0}")]
    NotFound(String),
    #[error("todo name must not be empty")]
    EmptyName,
    #[error("invalid month: {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

type Cache = HashMap<DateKey, Vec<TodoItem>>;

/// Cached, month-partitioned access to todos.
///
/// Every month that has been read is kept in memory and is authoritative
/// from then on; saves write through to the store and then replace the
/// cached list. The cache lock is held across each read-modify-write, so
/// a manager can be shared between threads without losing updates.
pub struct MonthlyManager<S = FileStore> {
    store: S,
    cache: Mutex<Cache>,
}

impl MonthlyManager<FileStore> {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_store(FileStore::new(data_dir))
    }

    pub fn data_dir(&self) -> &Path {
        self.store.data_dir()
    }
}

impl<S: MonthStore> MonthlyManager<S> {
    pub fn with_store(store: S) -> Self {
        MonthlyManager {
            store,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Month access
    // -----------------------------------------------------------------------

    /// A month's todos, newest first.
    pub fn get_todos_for_month(&self, year: i32, month: u32) -> Result<Vec<TodoItem>, TodoError> {
        let key = month_key(year, month)?;
        let mut cache = self.lock();
        Ok(self.load_month(&mut cache, key)?.clone())
    }

    /// Replace a month's todos exactly as given.
    pub fn save_todos_for_month(
        &self,
        year: i32,
        month: u32,
        todos: Vec<TodoItem>,
    ) -> Result<(), TodoError> {
        let key = month_key(year, month)?;
        let mut cache = self.lock();
        self.persist(&mut cache, key, todos)
    }

    /// Every month with stored data, ascending.
    pub fn get_all_months(&self) -> Result<Vec<DateKey>, TodoError> {
        Ok(self.store.all_monthly_files()?)
    }

    pub fn clear_cache(&self) {
        self.lock().clear();
    }

    pub fn cache_len(&self) -> usize {
        self.lock().len()
    }

    // -----------------------------------------------------------------------
    // Item operations
    // -----------------------------------------------------------------------

    pub fn add_todo(&self, item: TodoItem) -> Result<(), TodoError> {
        check_name(&item)?;
        item_month(&item)?;
        let mut cache = self.lock();
        self.add_locked(&mut cache, item)
    }

    /// Replace the item at `original_time` that has the same name as `item`.
    ///
    /// If `item` now falls in another month it is moved there: added to
    /// the new month first, then removed from the old one. Nothing is
    /// written if no item with that name is at `original_time`.
    pub fn update_todo(&self, item: TodoItem, original_time: NaiveDateTime) -> Result<(), TodoError> {
        let original = TodoKey::new(original_time, item.name.clone());
        self.replace_todo(&original, item)
    }

    /// Like `update_todo`, but the item to replace is named by `original`,
    /// so the edit may also rename it.
    pub fn replace_todo(&self, original: &TodoKey, item: TodoItem) -> Result<(), TodoError> {
        check_name(&item)?;
        let old_key = DateKey::of(&original.time);
        let new_key = item_month(&item)?;
        let mut cache = self.lock();

        let mut todos = self.load_month(&mut cache, old_key)?.clone();
        let idx = todos
            .iter()
            .position(|t| original.matches(t))
            .ok_or_else(|| not_found(original))?;

        if old_key != new_key {
            // The add only touches the new month, so `idx` still holds
            self.add_locked(&mut cache, item)?;
            todos.remove(idx);
            return self.persist(&mut cache, old_key, todos);
        }

        todos[idx] = item;
        sort_storage(&mut todos);
        self.persist(&mut cache, old_key, todos)
    }

    /// Remove the first item at `todo_time`. The month is rewritten even if
    /// nothing matched.
    pub fn remove_todo(&self, todo_time: NaiveDateTime) -> Result<(), TodoError> {
        let mut cache = self.lock();
        self.remove_locked(&mut cache, todo_time)
    }

    /// Remove every item at any of `todo_times`, loading and saving each
    /// affected month once.
    pub fn remove_todos(&self, todo_times: &[NaiveDateTime]) -> Result<(), TodoError> {
        let mut by_month: IndexMap<DateKey, HashSet<NaiveDateTime>> = IndexMap::new();
        for time in todo_times {
            by_month.entry(DateKey::of(time)).or_default().insert(*time);
        }

        let mut cache = self.lock();
        for (key, times) in by_month {
            let mut todos = self.load_month(&mut cache, key)?.clone();
            todos.retain(|t| !times.contains(&t.todo_time));
            self.persist(&mut cache, key, todos)?;
        }
        Ok(())
    }

    pub fn get_todo_by_time(&self, todo_time: NaiveDateTime) -> Result<TodoItem, TodoError> {
        let mut cache = self.lock();
        self.load_month(&mut cache, DateKey::of(&todo_time))?
            .iter()
            .find(|t| t.todo_time == todo_time)
            .cloned()
            .ok_or_else(|| TodoError::NotFound(format!("nothing at {}", todo_time)))
    }

    // -----------------------------------------------------------------------
    // Day view and reordering
    // -----------------------------------------------------------------------

    /// Every item of one day in display order.
    pub fn todos_for_day(&self, day: NaiveDate) -> Result<Vec<TodoItem>, TodoError> {
        let mut cache = self.lock();
        let mut todos: Vec<TodoItem> = self
            .load_month(&mut cache, DateKey::of_date(day))?
            .iter()
            .filter(|t| in_day(t, day))
            .cloned()
            .collect();
        sort_display(&mut todos);
        Ok(todos)
    }

    /// Move an item within its day and renumber the day, in memory only.
    /// Call `commit_month` once the gesture is over to write it out.
    pub fn reorder_in_day(
        &self,
        day: NaiveDate,
        target: &TodoKey,
        delta: isize,
    ) -> Result<bool, TodoError> {
        let mut cache = self.lock();
        let todos = self.load_month(&mut cache, DateKey::of_date(day))?;
        let mut day_items: Vec<&mut TodoItem> =
            todos.iter_mut().filter(|t| in_day(t, day)).collect();
        Ok(reorder(&mut day_items, target, delta))
    }

    /// Write a month's cached list to the store.
    pub fn commit_month(&self, year: i32, month: u32) -> Result<(), TodoError> {
        let key = month_key(year, month)?;
        let mut cache = self.lock();
        let todos = self.load_month(&mut cache, key)?.clone();
        self.persist(&mut cache, key, todos)
    }

    // -----------------------------------------------------------------------
    // Migration
    // -----------------------------------------------------------------------

    /// Convert every legacy-only month to the structured format.
    ///
    /// Months that already have a structured file are left alone. A month
    /// whose legacy file cannot be read is skipped; a failed save stops
    /// the run. The cache is cleared afterwards either way.
    pub fn migrate_all_to_yaml(&self) -> Result<MigrationReport, TodoError> {
        let months = self.store.all_monthly_files()?;
        let mut cache = self.lock();
        let mut report = MigrationReport::default();

        for key in months {
            match self.migrate_month(key) {
                Ok(outcome) => report.months.push((key, outcome)),
                Err(e) => {
                    cache.clear();
                    return Err(e);
                }
            }
        }
        cache.clear();
        Ok(report)
    }

    fn migrate_month(&self, key: DateKey) -> Result<MigrationOutcome, TodoError> {
        if self.store.has_structured(key) {
            return Ok(MigrationOutcome::AlreadyStructured);
        }
        let todos = match self.store.load_legacy(key) {
            Ok(todos) => todos,
            Err(e) => {
                self.store.note_skipped(key, &e);
                return Ok(MigrationOutcome::Unreadable(e.to_string()));
            }
        };
        if todos.is_empty() {
            return Ok(MigrationOutcome::Empty);
        }
        self.store.save_todos(key, &todos)?;
        Ok(MigrationOutcome::Migrated(todos.len()))
    }

    // -----------------------------------------------------------------------
    // Helpers (caller holds the cache lock)
    // -----------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_month<'c>(
        &self,
        cache: &'c mut Cache,
        key: DateKey,
    ) -> Result<&'c mut Vec<TodoItem>, TodoError> {
        match cache.entry(key) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let mut todos = self.store.load_todos(key)?;
                sort_storage(&mut todos);
                Ok(e.insert(todos))
            }
        }
    }

    fn persist(&self, cache: &mut Cache, key: DateKey, todos: Vec<TodoItem>) -> Result<(), TodoError> {
        self.store.save_todos(key, &todos)?;
        cache.insert(key, todos);
        Ok(())
    }

    fn add_locked(&self, cache: &mut Cache, item: TodoItem) -> Result<(), TodoError> {
        let key = DateKey::of(&item.todo_time);
        let mut todos = self.load_month(cache, key)?.clone();
        todos.push(item);
        sort_storage(&mut todos);
        self.persist(cache, key, todos)
    }

    fn remove_locked(&self, cache: &mut Cache, todo_time: NaiveDateTime) -> Result<(), TodoError> {
        let key = DateKey::of(&todo_time);
        let mut todos = self.load_month(cache, key)?.clone();
        if let Some(idx) = todos.iter().position(|t| t.todo_time == todo_time) {
            todos.remove(idx);
        }
        self.persist(cache, key, todos)
    }
}

fn month_key(year: i32, month: u32) -> Result<DateKey, TodoError> {
    DateKey::new(year, month).ok_or(TodoError::InvalidMonth { year, month })
}

/// The month `item` is filed under, if its year can be written as a key.
fn item_month(item: &TodoItem) -> Result<DateKey, TodoError> {
    let time = item.todo_time;
    month_key(time.year(), time.month())
}

fn not_found(key: &TodoKey) -> TodoError {
    TodoError::NotFound(format!("{:?} at {}", key.name, key.time))
}

fn check_name(item: &TodoItem) -> Result<(), TodoError> {
    if item.name.trim().is_empty() {
        Err(TodoError::EmptyName)
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Migration report
// ---------------------------------------------------------------------------

/// What happened to one month during migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Written to the structured format with this many items
    Migrated(usize),
    AlreadyStructured,
    /// Legacy file held no recoverable items
    Empty,
    /// Legacy file could not be read
    Unreadable(String),
}

impl fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationOutcome::Migrated(n) => write!(f, "migrated {} item(s)", n),
            MigrationOutcome::AlreadyStructured => write!(f, "already migrated"),
            MigrationOutcome::Empty => write!(f, "nothing to migrate"),
            MigrationOutcome::Unreadable(e) => write!(f, "skipped: {}", e),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub months: Vec<(DateKey, MigrationOutcome)>,
}

impl MigrationReport {
    pub fn migrated(&self) -> impl Iterator<Item = (DateKey, usize)> + '_ {
        self.months.iter().filter_map(|(key, outcome)| match outcome {
            MigrationOutcome::Migrated(n) => Some((*key, *n)),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &(DateKey, MigrationOutcome)> {
        self.months
            .iter()
            .filter(|(_, outcome)| !matches!(outcome, MigrationOutcome::Migrated(_)))
    }
}
