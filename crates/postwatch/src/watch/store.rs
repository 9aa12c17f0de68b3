use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::record::Snapshot;

/// Persistence seam so the poll service can be exercised in isolation.
pub trait SnapshotStore: Send + Sync {
    /// Load the persisted snapshot. Missing or unreadable state is never an
    /// error: callers get an empty snapshot seeded with one sub-map per
    /// known source.
    fn load(&self, known_sources: &[String]) -> Snapshot;

    /// Persist the whole snapshot in a single write.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// An empty snapshot with a sub-map for every known source.
pub fn empty_snapshot(known_sources: &[String]) -> Snapshot {
    known_sources
        .iter()
        .map(|source| (source.clone(), BTreeMap::new()))
        .collect()
}

/// Whole-file JSON store. The on-disk shape is `{source: {key: posting}}`.
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self, known_sources: &[String]) -> Snapshot {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => {
                // First run: no state yet.
                debug!(path = %self.path.display(), "no snapshot file, starting empty");
                return empty_snapshot(known_sources);
            }
        };

        match serde_json::from_str::<Snapshot>(&raw) {
            Ok(mut snapshot) => {
                for source in known_sources {
                    snapshot.entry(source.clone()).or_default();
                }
                snapshot
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    %err,
                    "snapshot file is corrupt, resetting to empty state"
                );
                empty_snapshot(known_sources)
            }
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let encoded = serde_json::to_string_pretty(snapshot)?;
        // Write beside the target and rename so a crash mid-write never
        // leaves a torn snapshot.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
