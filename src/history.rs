//! On-disk metric history store
//!
//! Keeps a bounded, append-only log of snapshots per (device, metric
//! family) under `<data_dir>/analytics/<udid>/<family>_history.json`.
//! The whole log is rewritten on every append, via a temp file renamed
//! over the target so readers never see a partial write. Unreadable or
//! corrupt history is recovered as an empty log with a warning; write
//! failures surface as `StorageFailure`.
//!
//! Concurrent appends from independent processes are not coordinated.
//! Usage is one process at a time; last writer wins on the file.

use crate::error::{DevitalsError, DevitalsResult};
use crate::snapshot::{MetricFamily, MetricSnapshot};
use chrono::{Duration, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum snapshots retained per (device, family) log
pub const HISTORY_CAP: usize = 1000;

/// Durable, bounded snapshot log keyed by (udid, metric family)
#[derive(Debug, Clone)]
pub struct HistoryStore {
    root: PathBuf,
}

impl HistoryStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        HistoryStore { root: root.into() }
    }

    /// Create a store at the default location, `~/.devitals/analytics`
    pub fn open_default() -> DevitalsResult<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            DevitalsError::storage_failure(
                Path::new("~"),
                "home directory could not be determined",
            )
        })?;
        Ok(Self::new(home.join(".devitals").join("analytics")))
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn history_path(&self, udid: &str, family: MetricFamily) -> PathBuf {
        self.root
            .join(udid)
            .join(format!("{}_history.json", family.as_str()))
    }

    /// Append a snapshot to the log for (udid, family)
    ///
    /// Creates the log on first use. When the log exceeds [`HISTORY_CAP`]
    /// the oldest entries are discarded first. The updated log is
    /// persisted before returning.
    pub fn append(
        &self,
        udid: &str,
        family: MetricFamily,
        snapshot: MetricSnapshot,
    ) -> DevitalsResult<()> {
        let mut history = self.load(udid, family)?;
        history.push(snapshot);

        if history.len() > HISTORY_CAP {
            let excess = history.len() - HISTORY_CAP;
            history.drain(..excess);
        }

        self.persist(udid, family, &history)
    }

    /// Ordered snapshots for (udid, family) newer than `now - since`
    ///
    /// A missing log, or one whose entries are all older than the
    /// cutoff, yields an empty vector rather than an error.
    pub fn window(
        &self,
        udid: &str,
        family: MetricFamily,
        since: Duration,
    ) -> DevitalsResult<Vec<MetricSnapshot>> {
        let cutoff = Utc::now() - since;
        let history = self.load(udid, family)?;
        Ok(history
            .into_iter()
            .filter(|snap| snap.timestamp >= cutoff)
            .collect())
    }

    /// Full log for (udid, family); empty when none exists
    ///
    /// Corrupt content is treated as an empty log so a bad file cannot
    /// wedge future appends. Genuine read failures (permissions) are
    /// storage errors.
    pub fn load(&self, udid: &str, family: MetricFamily) -> DevitalsResult<Vec<MetricSnapshot>> {
        let path = self.history_path(udid, family);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(DevitalsError::storage_failure(&path, &e.to_string()));
            }
        };

        match serde_json::from_str(&raw) {
            Ok(history) => Ok(history),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "discarding corrupt history file"
                );
                Ok(Vec::new())
            }
        }
    }

    fn persist(
        &self,
        udid: &str,
        family: MetricFamily,
        history: &[MetricSnapshot],
    ) -> DevitalsResult<()> {
        let path = self.history_path(udid, family);
        let dir = path
            .parent()
            .ok_or_else(|| DevitalsError::storage_failure(&path, "path has no parent directory"))?;

        fs::create_dir_all(dir).map_err(|e| DevitalsError::storage_failure(dir, &e.to_string()))?;

        let body = serde_json::to_vec_pretty(history)
            .map_err(|e| DevitalsError::storage_failure(&path, &e.to_string()))?;

        // Temp file in the same directory so the rename cannot cross filesystems
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|e| DevitalsError::storage_failure(&tmp, &e.to_string()))?;
        fs::rename(&tmp, &path)
            .map_err(|e| DevitalsError::storage_failure(&path, &e.to_string()))?;

        Ok(())
    }
}
