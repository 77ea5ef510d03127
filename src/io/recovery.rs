use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Log size above which old entries are trimmed before appending (1 MB).
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Entries older than this many days are dropped by an inline trim.
pub const PRUNE_AGE_DAYS: i64 = 30;

const FILE_HEADER: &str = "\
<!-- monthly-todo recovery log
     Data that could not be saved or read normally ends up here:
     dropped legacy lines, unreadable month files, failed writes and
     deleted months. View with: mtodo recovery
     Safe to delete once you have checked it. -->

---
";

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    Parser,
    Write,
    Delete,
    Migration,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecoveryCategory::Parser => "parser",
            RecoveryCategory::Write => "write",
            RecoveryCategory::Delete => "delete",
            RecoveryCategory::Migration => "migration",
        })
    }
}

impl RecoveryCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "parser" => Some(RecoveryCategory::Parser),
            "write" => Some(RecoveryCategory::Write),
            "delete" => Some(RecoveryCategory::Delete),
            "migration" => Some(RecoveryCategory::Migration),
            _ => None,
        }
    }
}

/// One logged incident with the data it concerns
#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, description: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: String::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.fields.push((key.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} [{}] {}\n\n",
            self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.description,
        );
        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        if !self.body.is_empty() {
            out.push_str("\n```text\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }
        out.push_str("\n---\n");
        out
    }
}

pub fn recovery_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".recovery.log")
}

// ---------------------------------------------------------------------------
// Atomic file write
// ---------------------------------------------------------------------------

/// Sibling path a write is staged in before the rename: `<name>.tmp`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `content` to `path` through `<path>.tmp` and a rename.
///
/// The target is untouched unless the rename happens. If anything fails
/// after the temp file is created it is removed again.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;

    // Left over from an interrupted write.
    match fs::remove_file(temp_path(path)) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let mut tmp = tempfile::Builder::new()
        .prefix(name)
        .suffix(".tmp")
        .rand_bytes(0)
        .tempfile_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Append an entry to the recovery log. Failures only print a warning.
pub fn log_recovery(data_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(data_dir, &entry) {
        eprintln!("warning: could not write to recovery log: {}", e);
    }
}

fn append_entry(data_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(data_dir);

    if fs::metadata(&path).is_ok_and(|m| m.len() > MAX_LOG_SIZE) {
        let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
        prune_recovery(data_dir, Some(cutoff), false)?;
    }

    let needs_header = fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())
}

// ---------------------------------------------------------------------------
// Reading and pruning
// ---------------------------------------------------------------------------

/// Entries from the log, most recent first.
pub fn read_recovery_entries(data_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let content = match fs::read_to_string(recovery_log_path(data_dir)) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };
    let mut entries = parse_entries(&content);
    entries.reverse();
    if let Some(n) = limit {
        entries.truncate(n);
    }
    entries
}

/// Remove entries older than `before`, or every entry when `all` is set.
/// Returns how many were removed.
pub fn prune_recovery(
    data_dir: &Path,
    before: Option<DateTime<Utc>>,
    all: bool,
) -> io::Result<usize> {
    let path = recovery_log_path(data_dir);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let entries = parse_entries(&content);
    let (kept, removed): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|e| !all && before.is_none_or(|cutoff| e.timestamp >= cutoff));
    if removed.is_empty() {
        return Ok(0);
    }

    let mut out = String::from(FILE_HEADER);
    for entry in &kept {
        out.push_str(&entry.to_markdown());
    }
    atomic_write(&path, out.as_bytes())?;
    Ok(removed.len())
}

fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let Some((timestamp, category, description)) =
            line.strip_prefix("## ").and_then(parse_entry_header)
        else {
            continue;
        };

        let mut entry = RecoveryEntry {
            timestamp,
            category,
            description,
            fields: Vec::new(),
            body: String::new(),
        };
        let mut in_body = false;
        for line in lines.by_ref() {
            if in_body {
                if line == "```" {
                    in_body = false;
                } else {
                    if !entry.body.is_empty() {
                        entry.body.push('\n');
                    }
                    entry.body.push_str(line);
                }
                continue;
            }
            if line == "---" {
                break;
            }
            if line.starts_with("```") {
                in_body = true;
            } else if let Some((key, value)) = line.split_once(": ") {
                entry.fields.push((key.to_string(), value.to_string()));
            }
        }
        entries.push(entry);
    }

    entries
}

/// `<rfc3339> [<category>] <description>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (stamp, rest) = header.split_once(' ')?;
    let timestamp = DateTime::parse_from_rfc3339(stamp).ok()?.with_timezone(&Utc);
    let rest = rest.strip_prefix('[')?;
    let (category, description) = rest.split_once("] ")?;
    let category = RecoveryCategory::parse_category(category)?;
    Some((timestamp, category, description.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_replaces_and_cleans_temp() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("202503.yaml");
        fs::write(&target, "old").unwrap();

        atomic_write(&target, b"new").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        assert!(!temp_path(&target).exists());
    }

    #[test]
    fn test_atomic_write_clears_stale_temp() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("202503.yaml");
        fs::write(temp_path(&target), "half written").unwrap();

        atomic_write(&target, b"complete").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "complete");
        assert!(!temp_path(&target).exists());
    }

    #[test]
    fn test_atomic_write_into_missing_dir_fails_cleanly() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("nope").join("202503.yaml");
        assert!(atomic_write(&target, b"x").is_err());
        assert!(!target.exists());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let p = Path::new("/data/202503.yaml");
        assert_eq!(temp_path(p), PathBuf::from("/data/202503.yaml.tmp"));
    }

    #[test]
    fn test_log_and_read_entries() {
        let tmp = TempDir::new().unwrap();
        log_recovery(
            tmp.path(),
            RecoveryEntry::new(RecoveryCategory::Parser, "dropped legacy lines")
                .field("Month", "202503")
                .body("1\nbroken"),
        );
        log_recovery(
            tmp.path(),
            RecoveryEntry::new(RecoveryCategory::Write, "save failed").field("Error", "disk full"),
        );

        let content = fs::read_to_string(recovery_log_path(tmp.path())).unwrap();
        assert!(content.starts_with("<!-- monthly-todo recovery log"));

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].category, RecoveryCategory::Write);
        assert_eq!(entries[1].description, "dropped legacy lines");
        assert_eq!(
            entries[1].fields,
            vec![("Month".to_string(), "202503".to_string())]
        );
        assert_eq!(entries[1].body, "1\nbroken");

        assert_eq!(read_recovery_entries(tmp.path(), Some(1)).len(), 1);
    }

    #[test]
    fn test_read_missing_log_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(read_recovery_entries(tmp.path(), None).is_empty());
    }

    #[test]
    fn test_prune_by_age_and_all() {
        let tmp = TempDir::new().unwrap();
        let mut old = RecoveryEntry::new(RecoveryCategory::Delete, "old month removed");
        old.timestamp = Utc::now() - chrono::Duration::days(90);
        log_recovery(tmp.path(), old);
        log_recovery(
            tmp.path(),
            RecoveryEntry::new(RecoveryCategory::Migration, "skipped month"),
        );

        let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
        assert_eq!(prune_recovery(tmp.path(), Some(cutoff), false).unwrap(), 1);
        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, RecoveryCategory::Migration);

        assert_eq!(prune_recovery(tmp.path(), None, true).unwrap(), 1);
        assert!(read_recovery_entries(tmp.path(), None).is_empty());
    }
}
