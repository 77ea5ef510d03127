use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::todo::TodoItem;
use crate::parse::{parse_legacy, parse_month, serialize_month};
use crate::util::DateKey;

const STRUCTURED_EXT: &str = "yaml";
const LEGACY_EXT: &str = "txt";

/// Error type for month file I/O
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not create data directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("could not delete {path}: {source}")]
    Delete { path: PathBuf, source: io::Error },
    #[error("could not encode todos for {key}: {source}")]
    Encode {
        key: DateKey,
        source: serde_yaml::Error,
    },
}

/// Month-granular storage the manager works against.
pub trait MonthStore {
    /// Write a month in the structured format, replacing what was there.
    fn save_todos(&self, key: DateKey, todos: &[TodoItem]) -> Result<(), StoreError>;
    /// Read a month, structured file first, then legacy.
    fn load_todos(&self, key: DateKey) -> Result<Vec<TodoItem>, StoreError>;
    /// Read only the legacy file for a month.
    fn load_legacy(&self, key: DateKey) -> Result<Vec<TodoItem>, StoreError>;
    fn has_structured(&self, key: DateKey) -> bool;
    /// Every month with a data file in either format, ascending.
    fn all_monthly_files(&self) -> Result<Vec<DateKey>, StoreError>;
    /// Called when migration has to skip a month it could not read.
    fn note_skipped(&self, _key: DateKey, _err: &StoreError) {}
}

/// Month files in a single data directory.
///
/// Each month lives in `YYYYMM.yaml`, or in a legacy `YYYYMM.txt` that
/// was never migrated. The structured file always wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        FileStore {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn ensure_data_directory(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::CreateDir {
            path: self.data_dir.clone(),
            source,
        })
    }

    pub fn structured_path(&self, key: DateKey) -> PathBuf {
        self.data_dir.join(format!("{}.{}", key, STRUCTURED_EXT))
    }

    pub fn legacy_path(&self, key: DateKey) -> PathBuf {
        self.data_dir.join(format!("{}.{}", key, LEGACY_EXT))
    }

    pub fn file_exists(&self, key: DateKey) -> bool {
        self.structured_path(key).exists() || self.legacy_path(key).exists()
    }

    /// Remove both files for a month. Succeeds if either removal did, or if
    /// neither file existed.
    pub fn delete_file(&self, key: DateKey) -> Result<(), StoreError> {
        let mut removed = false;
        let mut first_err = None;

        for path in [self.structured_path(key), self.legacy_path(key)] {
            let content = fs::read_to_string(&path).ok();
            match fs::remove_file(&path) {
                Ok(()) => {
                    removed = true;
                    recovery::log_recovery(
                        &self.data_dir,
                        RecoveryEntry::new(RecoveryCategory::Delete, "month file deleted")
                            .field("Month", key)
                            .field("File", path.display())
                            .body(content.unwrap_or_default()),
                    );
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    first_err.get_or_insert(StoreError::Delete { path, source });
                }
            }
        }

        match first_err {
            Some(err) if !removed => Err(err),
            _ => Ok(()),
        }
    }

    fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl MonthStore for FileStore {
    fn save_todos(&self, key: DateKey, todos: &[TodoItem]) -> Result<(), StoreError> {
        self.ensure_data_directory()?;
        let content =
            serialize_month(todos).map_err(|source| StoreError::Encode { key, source })?;

        let path = self.structured_path(key);
        if let Err(source) = recovery::atomic_write(&path, content.as_bytes()) {
            recovery::log_recovery(
                &self.data_dir,
                RecoveryEntry::new(RecoveryCategory::Write, "month write failed")
                    .field("Month", key)
                    .field("Error", &source)
                    .body(content),
            );
            return Err(StoreError::Write { path, source });
        }
        Ok(())
    }

    fn load_todos(&self, key: DateKey) -> Result<Vec<TodoItem>, StoreError> {
        let path = self.structured_path(key);
        let Some(text) = Self::read_optional(&path)? else {
            return self.load_legacy(key);
        };

        // Once a structured file exists the legacy one is never consulted.
        match parse_month(&text) {
            Ok(todos) => Ok(todos),
            Err(e) => {
                if !text.trim().is_empty() {
                    recovery::log_recovery(
                        &self.data_dir,
                        RecoveryEntry::new(RecoveryCategory::Parser, "unreadable month file")
                            .field("Month", key)
                            .field("Error", e)
                            .body(text),
                    );
                }
                Ok(Vec::new())
            }
        }
    }

    fn load_legacy(&self, key: DateKey) -> Result<Vec<TodoItem>, StoreError> {
        let path = self.legacy_path(key);
        let Some(text) = Self::read_optional(&path)? else {
            return Ok(Vec::new());
        };

        let parsed = parse_legacy(&text);
        if let Some(err) = &parsed.error {
            recovery::log_recovery(
                &self.data_dir,
                RecoveryEntry::new(RecoveryCategory::Parser, "dropped legacy lines")
                    .field("Month", key)
                    .field("Recovered", format!("{} of {}", parsed.todos.len(), parsed.declared))
                    .field("Error", err)
                    .body(parsed.dropped.join("\n")),
            );
        }
        Ok(parsed.todos)
    }

    fn has_structured(&self, key: DateKey) -> bool {
        self.structured_path(key).is_file()
    }

    fn all_monthly_files(&self) -> Result<Vec<DateKey>, StoreError> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.data_dir.clone(),
                    source,
                });
            }
        };

        let mut months = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Read {
                path: self.data_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let ext = path.extension().and_then(|e| e.to_str());
            if !matches!(ext, Some(STRUCTURED_EXT) | Some(LEGACY_EXT)) {
                continue;
            }
            if let Some(key) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<DateKey>().ok())
            {
                months.insert(key);
            }
        }
        Ok(months.into_iter().collect())
    }

    fn note_skipped(&self, key: DateKey, err: &StoreError) {
        recovery::log_recovery(
            &self.data_dir,
            RecoveryEntry::new(RecoveryCategory::Migration, "month skipped")
                .field("Month", key)
                .field("Error", err),
        );
    }
}
