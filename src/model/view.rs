use serde::{Deserialize, Serialize};

use crate::model::todo::TodoItem;

/// Which entries a day listing shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    All,
    #[default]
    Incomplete,
    Complete,
    Starred,
}

impl ViewMode {
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::All => "All",
            ViewMode::Incomplete => "Incomplete",
            ViewMode::Complete => "Complete",
            ViewMode::Starred => "Important",
        }
    }

    /// The mode after this one when cycling through them
    pub fn next(self) -> ViewMode {
        match self {
            ViewMode::All => ViewMode::Incomplete,
            ViewMode::Incomplete => ViewMode::Complete,
            ViewMode::Complete => ViewMode::Starred,
            ViewMode::Starred => ViewMode::All,
        }
    }

    pub fn accepts(self, item: &TodoItem) -> bool {
        match self {
            ViewMode::All => true,
            ViewMode::Incomplete => !item.done,
            ViewMode::Complete => item.done,
            ViewMode::Starred => item.starred,
        }
    }

    /// Keep the entries this mode shows, preserving their order.
    pub fn filter<'a>(self, items: &'a [TodoItem]) -> Vec<&'a TodoItem> {
        items.iter().filter(|item| self.accepts(item)).collect()
    }

    pub fn parse_mode(s: &str) -> Option<ViewMode> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Some(ViewMode::All),
            "incomplete" => Some(ViewMode::Incomplete),
            "complete" => Some(ViewMode::Complete),
            "starred" | "important" => Some(ViewMode::Starred),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::All => "all",
            ViewMode::Incomplete => "incomplete",
            ViewMode::Complete => "complete",
            ViewMode::Starred => "starred",
        }
    }
}
