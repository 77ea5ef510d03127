use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, de::Error};

use crate::model::todo::parse_todo_time;
use crate::model::view::ViewMode;

/// Application settings from config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Interface state carried between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfig {
    /// "light" or "dark"
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub view_mode: ViewMode,
    /// Last viewed day. Older configs stored a full timestamp here.
    #[serde(default = "today", deserialize_with = "date_or_timestamp")]
    pub current_date: NaiveDate,
    #[serde(default = "default_window_width")]
    pub window_width: f32,
    #[serde(default = "default_window_height")]
    pub window_height: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            version: default_version(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            theme: default_theme(),
            view_mode: ViewMode::default(),
            current_date: today(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_theme() -> String {
    "light".to_string()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn default_window_width() -> f32 {
    420.0
}

fn default_window_height() -> f32 {
    800.0
}

fn date_or_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(d)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_todo_time(&raw).map(|t| t.date()))
        .ok_or_else(|| D::Error::custom(format!("invalid currentDate: {:?}", raw)))
}
