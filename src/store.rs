//! Flat-file snapshots: merge a fresh fetch into the records already on disk.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::fetch::Keyed;

/// Append every fetched record whose key is not yet present.
///
/// Existing order is kept, followed by fetch order. Duplicates inside
/// `fetched` collapse to their first occurrence.
pub fn merge<R: Keyed>(existing: Vec<R>, fetched: Vec<R>) -> Vec<R> {
    let mut seen: HashSet<String> = existing.iter().map(Keyed::key).collect();
    let mut merged = existing;
    for record in fetched {
        if seen.insert(record.key()) {
            merged.push(record);
        }
    }
    merged
}

/// Snapshot key used by `transactions sync`.
pub fn transactions_key(principal: &str) -> String {
    format!("{principal}_transactions")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub existing: usize,
    pub added: usize,
    pub total: usize,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json.lock"))
    }

    /// A missing snapshot is an empty one.
    pub fn load<R: DeserializeOwned>(&self, key: &str) -> Result<Vec<R>> {
        let path = self.path_for(key);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(path, e)),
        };
        serde_json::from_str(&contents).map_err(|source| Error::Corrupt { path, source })
    }

    /// Write through a temp file in the same directory, then rename over the target.
    pub fn save<R: Serialize>(&self, key: &str, records: &[R]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let path = self.path_for(key);

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        serde_json::to_writer_pretty(&mut tmp, records).map_err(Error::Encode)?;
        tmp.write_all(b"\n").map_err(|e| Error::io(tmp.path(), e))?;
        tmp.persist(&path).map_err(|e| Error::io(&path, e.error))?;

        debug!(path = %path.display(), records = records.len(), "snapshot written");
        Ok(path)
    }

    pub fn sync<R>(&self, key: &str, fetched: Vec<R>) -> Result<SyncReport>
    where
        R: Keyed + Serialize + DeserializeOwned,
    {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let _lock = SyncLock::acquire(self.lock_path(key), key)?;

        let existing: Vec<R> = self.load(key)?;
        let before = existing.len();
        let merged = merge(existing, fetched);
        let path = self.save(key, &merged)?;

        let report = SyncReport {
            existing: before,
            added: merged.len() - before,
            total: merged.len(),
            path,
        };
        info!(
            key,
            existing = report.existing,
            added = report.added,
            "snapshot synced"
        );
        Ok(report)
    }
}

/// Held for the duration of a sync; the file is removed on drop.
struct SyncLock {
    path: PathBuf,
}

impl SyncLock {
    fn acquire(path: PathBuf, key: &str) -> Result<Self> {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(Error::validation(format!(
                "another sync of {key} is in progress ({})",
                path.display()
            ))),
            Err(e) => Err(Error::io(path, e)),
        }
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
