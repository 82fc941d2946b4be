//! history.rs: durable, bounded log of previously produced reports.
//!
//! One file per report, named `report_YYYYMMDD_HHMMSS_ffffff.md` (UTC). Older stores
//! wrote `report_YYYYMMDD_HHMMSS.md`; those are read as microsecond zero and age out
//! through normal retention. Order comes from the names alone, never file contents.
//! Writes go to a dot-prefixed temp file first and are renamed into place.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, SubsecRound, Utc};
use std::fs;
use std::path::{Path, PathBuf};

const PREFIX: &str = "report_";
const SUFFIX: &str = ".md";

pub const DEFAULT_RETENTION: usize = 5;
pub const DEFAULT_RECENT_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRecord {
    pub created_at: DateTime<Utc>,
    pub content: String,
}

#[derive(Debug)]
pub struct HistoryStore {
    dir: PathBuf,
    retention: usize,
}

impl HistoryStore {
    /// Open (and create) the store directory, enforcing retention once.
    pub fn open<P: AsRef<Path>>(dir: P, retention: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating history dir {}", dir.display()))?;
        let store = Self {
            dir,
            retention: retention.max(1),
        };
        store.enforce_retention()?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Append a report stamped with the current time.
    pub fn save(&self, content: &str) -> Result<ReportRecord> {
        self.save_at(content, Utc::now())
    }

    /// Append a report using `now` as the clock reading. The stored timestamp is
    /// bumped past the newest existing record so creation order is never ambiguous.
    pub fn save_at(&self, content: &str, now: DateTime<Utc>) -> Result<ReportRecord> {
        let mut created_at = now.trunc_subsecs(6);
        if let Some((newest, _)) = self.list_entries()?.pop() {
            if created_at <= newest {
                created_at = newest + Duration::microseconds(1);
            }
        }

        let name = file_name_for(created_at);
        let path = self.dir.join(&name);
        let tmp = self.dir.join(format!(".{name}.tmp"));
        fs::write(&tmp, content)
            .with_context(|| format!("writing history temp file {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("committing history file {}", path.display()))?;
        tracing::info!(target: "history", file = %path.display(), bytes = content.len(), "report saved");

        self.enforce_retention()?;

        Ok(ReportRecord {
            created_at,
            content: content.to_string(),
        })
    }

    /// Up to `limit` most recent records, newest first. Empty store -> empty vec.
    pub fn get_recent(&self, limit: usize) -> Result<Vec<ReportRecord>> {
        let mut entries = self.list_entries()?;
        entries.reverse();
        entries
            .into_iter()
            .take(limit)
            .map(|(ts, name)| self.read_record(ts, &name))
            .collect()
    }

    pub fn latest(&self) -> Result<Option<ReportRecord>> {
        Ok(self.get_recent(1)?.into_iter().next())
    }

    /// Number of records currently on disk.
    pub fn len(&self) -> Result<usize> {
        Ok(self.list_entries()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Creation timestamps of all records, oldest first.
    pub fn list_stamps(&self) -> Result<Vec<DateTime<Utc>>> {
        Ok(self.list_entries()?.into_iter().map(|(ts, _)| ts).collect())
    }

    /// `(created_at, file name)` for every record, oldest first. The on-disk name is
    /// kept because legacy names do not round-trip through `file_name_for`.
    fn list_entries(&self) -> Result<Vec<(DateTime<Utc>, String)>> {
        let dir = fs::read_dir(&self.dir)
            .with_context(|| format!("listing history dir {}", self.dir.display()))?;
        let mut entries = Vec::new();
        for entry in dir {
            let entry = entry.context("reading history dir entry")?;
            if let Some(name) = entry.file_name().to_str() {
                if let Some(ts) = parse_file_name(name) {
                    entries.push((ts, name.to_string()));
                }
            }
        }
        entries.sort();
        Ok(entries)
    }

    fn read_record(&self, created_at: DateTime<Utc>, name: &str) -> Result<ReportRecord> {
        let path = self.dir.join(name);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading history file {}", path.display()))?;
        Ok(ReportRecord {
            created_at,
            content,
        })
    }

    /// FIFO eviction of everything beyond the retention bound.
    fn enforce_retention(&self) -> Result<()> {
        let entries = self.list_entries()?;
        if entries.len() <= self.retention {
            return Ok(());
        }
        let excess = entries.len() - self.retention;
        for (_, name) in &entries[..excess] {
            let path = self.dir.join(name);
            fs::remove_file(&path)
                .with_context(|| format!("removing old history file {}", path.display()))?;
            tracing::info!(target: "history", file = %path.display(), "old report removed");
        }
        Ok(())
    }
}

fn file_name_for(ts: DateTime<Utc>) -> String {
    format!(
        "{PREFIX}{}_{:06}{SUFFIX}",
        ts.format("%Y%m%d_%H%M%S"),
        ts.timestamp_subsec_micros()
    )
}

/// Accepts `YYYYMMDD_HHMMSS_ffffff` and the legacy `YYYYMMDD_HHMMSS` stem.
fn parse_file_name(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    let (date_time, micros) = match stem.len() {
        15 => (stem, "000000"),
        22 => stem.rsplit_once('_')?,
        _ => return None,
    };
    if micros.len() != 6 || !micros.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let micros: i64 = micros.parse().ok()?;
    let naive = NaiveDateTime::parse_from_str(date_time, "%Y%m%d_%H%M%S").ok()?;
    Some(naive.and_utc() + Duration::microseconds(micros))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name_round_trips_and_sorts() {
        let a = Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap() + Duration::microseconds(42);
        let b = a + Duration::microseconds(1);
        let na = file_name_for(a);
        assert_eq!(na, "report_20261017_090000_000042.md");
        assert_eq!(parse_file_name(&na), Some(a));
        assert!(na < file_name_for(b));
    }

    #[test]
    fn foreign_files_are_ignored() {
        assert!(parse_file_name("notes.md").is_none());
        assert!(parse_file_name(".report_20261017_090000_000042.md.tmp").is_none());
        assert!(parse_file_name("report_20261017_0900.md").is_none());
        assert!(parse_file_name("report_20261017_090000_42.md").is_none());
    }

    #[test]
    fn second_resolution_names_are_read_as_whole_seconds() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap();
        assert_eq!(parse_file_name("report_20261017_090000.md"), Some(ts));
    }

    #[test]
    fn legacy_record_is_read_from_its_own_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("report_20261017_090000.md"), "legacy").unwrap();
        let store = HistoryStore::open(dir.path(), 5).unwrap();
        let latest = store.latest().unwrap().unwrap();
        assert_eq!(latest.content, "legacy");
        assert_eq!(
            latest.created_at,
            Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn same_instant_saves_keep_creation_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path(), 5).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap();
        store.save_at("first", now).unwrap();
        store.save_at("second", now).unwrap();
        let recent = store.get_recent(2).unwrap();
        assert_eq!(recent[0].content, "second");
        assert_eq!(recent[1].content, "first");
        assert!(recent[0].created_at > recent[1].created_at);
    }
}
