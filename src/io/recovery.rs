use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

/// Self-documenting header written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- taskdeck recovery log: append-only copies of stored data that could not be loaded
     If a task, group or note went missing, check here.
     Safe to delete once its contents have been restored or are no longer wanted. -->

---
";

/// Why data was set aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// A collection file was not valid JSON and was moved aside
    Parse,
    /// Stored values that could not be read as records
    Record,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Parse => write!(f, "parse"),
            RecoveryCategory::Record => write!(f, "record"),
        }
    }
}

/// A single entry in the recovery log.
#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

pub fn recovery_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".recovery.log")
}

/// Name a corrupt collection file is moved to: `<file>.corrupt-<timestamp>`
pub fn corrupt_copy_path(path: &Path, at: DateTime<Utc>) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".corrupt-{}", at.format("%Y%m%dT%H%M%SZ")));
    path.with_file_name(name)
}

impl RecoveryEntry {
    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} {}: {}\n\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.category,
            self.description,
        );
        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        if !self.body.is_empty() {
            out.push_str("\n```json\n");
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

/// Append an entry to the recovery log in `data_dir`.
pub fn log_recovery(data_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(data_dir);
    let needs_header = fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())?;
    file.sync_data()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn entry(body: &str) -> RecoveryEntry {
        RecoveryEntry {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
            category: RecoveryCategory::Record,
            description: "1 unreadable record in tasks".into(),
            fields: vec![("collection".into(), "tasks".into())],
            body: body.into(),
        }
    }

    #[test]
    fn test_header_written_once() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), &entry("42")).unwrap();
        log_recovery(tmp.path(), &entry("\"stray\"")).unwrap();

        let log = fs::read_to_string(recovery_log_path(tmp.path())).unwrap();
        assert_eq!(log.matches("taskdeck recovery log").count(), 1);
        assert_eq!(log.matches("## 2025-06-01T08:00:00Z record:").count(), 2);
        assert!(log.contains("collection: tasks\n"));
        assert!(log.contains("```json\n\"stray\"\n```\n"));
    }

    #[test]
    fn test_corrupt_copy_sits_next_to_original() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let path = Path::new("/data/notes.json");
        assert_eq!(
            corrupt_copy_path(path, at),
            PathBuf::from("/data/notes.json.corrupt-20250601T080000Z")
        );
    }
}
