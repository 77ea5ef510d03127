use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::model::todo::{TodoItem, TodoKey};

// ---------------------------------------------------------------------------
// Storage order
// ---------------------------------------------------------------------------

/// Newest first. Month lists are kept in this order in memory and on disk.
pub fn storage_cmp(a: &TodoItem, b: &TodoItem) -> Ordering {
    b.todo_time.cmp(&a.todo_time)
}

pub fn sort_storage(items: &mut [TodoItem]) {
    items.sort_by(storage_cmp);
}

// ---------------------------------------------------------------------------
// Display order
// ---------------------------------------------------------------------------

/// Order within a day as the user sees it.
///
/// Items with an explicit `order` come first, ascending. Items without one
/// (`order == 0`) follow. Ties fall back to newest first, then name.
pub fn display_cmp(a: &TodoItem, b: &TodoItem) -> Ordering {
    match (a.order, b.order) {
        (0, 0) => time_then_name(a, b),
        (0, _) => Ordering::Greater,
        (_, 0) => Ordering::Less,
        (x, y) => x.cmp(&y).then_with(|| time_then_name(a, b)),
    }
}

fn time_then_name(a: &TodoItem, b: &TodoItem) -> Ordering {
    b.todo_time
        .cmp(&a.todo_time)
        .then_with(|| a.name.cmp(&b.name))
}

/// Stable sort into display order.
pub fn sort_display(items: &mut [TodoItem]) {
    items.sort_by(display_cmp);
}

pub fn in_day(item: &TodoItem, day: NaiveDate) -> bool {
    item.todo_time.date() == day
}

// ---------------------------------------------------------------------------
// Interactive reorder
// ---------------------------------------------------------------------------

/// Move `target` by `delta` positions among a whole day's items.
///
/// `day` must hold every item of the day, not just the visible ones. It is
/// left in the new display order and every item gets `order = position + 1`.
/// Returns false (and changes nothing but the slice order) when the target
/// is missing or the clamped move lands where it started.
pub fn reorder(day: &mut [&mut TodoItem], target: &TodoKey, delta: isize) -> bool {
    if delta == 0 || day.is_empty() {
        return false;
    }
    day.sort_by(|a, b| display_cmp(a, b));

    let Some(from) = day.iter().position(|item| target.matches(item)) else {
        return false;
    };
    let to = from.saturating_add_signed(delta).min(day.len() - 1);
    if to == from {
        return false;
    }

    if to > from {
        day[from..=to].rotate_left(1);
    } else {
        day[to..=from].rotate_right(1);
    }
    for (pos, item) in day.iter_mut().enumerate() {
        item.order = pos as u32 + 1;
    }
    true
}

/// `reorder` over an owned list that holds exactly one day.
pub fn reorder_items(items: &mut [TodoItem], target: &TodoKey, delta: isize) -> bool {
    let mut refs: Vec<&mut TodoItem> = items.iter_mut().collect();
    reorder(&mut refs, target, delta)
}
