use crate::libgeometas::dataset::Dataset;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use std::{fs, io};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// The dataset as pretty-printed JSON on disk.
#[derive(Debug, Clone)]
pub struct Snapshot {
    path: PathBuf,
}

impl Snapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// `Ok(None)` when there is no snapshot yet.
    pub fn read(&self) -> Result<Option<Dataset>, SnapshotError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(Dataset::from_json(&text)?))
    }

    /// Replaces the snapshot. Written to a sibling file first and renamed over the old one.
    pub fn write(&self, data: &Dataset) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = data.to_pretty_json()?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!("[Store] Wrote {} countries to {:?}", data.len(), self.path);
        Ok(())
    }

    pub fn remove(&self) -> Result<(), SnapshotError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Loads the dataset from its snapshot, rebuilding when the snapshot is missing, unreadable or
/// holds no metas at all. The loaded dataset is memoized for `memo_ttl`.
pub struct DatasetStore {
    snapshot: Snapshot,
    memo: Option<(Instant, Dataset)>,
    memo_ttl: Duration,
}

impl DatasetStore {
    pub fn new(snapshot: Snapshot, memo_ttl: Duration) -> Self {
        Self {
            snapshot,
            memo: None,
            memo_ttl,
        }
    }

    pub fn load<B>(&mut self, rebuild: B) -> Result<Dataset, SnapshotError>
    where
        B: FnOnce(&Snapshot) -> Result<Dataset, SnapshotError>,
    {
        if let Some((loaded_at, data)) = &self.memo {
            if loaded_at.elapsed() < self.memo_ttl {
                debug!("[Store] Using memoized dataset");
                return Ok(data.clone());
            }
        }

        let data = match self.snapshot.read() {
            Ok(Some(data)) if data.has_metas() => {
                info!(
                    "[Store] Loaded {} countries from {:?}",
                    data.len(),
                    self.snapshot.path()
                );
                data
            }
            Ok(Some(_)) => {
                warn!("[Store] Cached data empty, refetching.");
                rebuild(&self.snapshot)?
            }
            Ok(None) => {
                info!("[Store] No snapshot at {:?}, scraping.", self.snapshot.path());
                rebuild(&self.snapshot)?
            }
            Err(err) => {
                warn!("[Store] Corrupted cache ({}), refetching.", err);
                rebuild(&self.snapshot)?
            }
        };

        self.memo = Some((Instant::now(), data.clone()));
        Ok(data)
    }

    /// Deletes the snapshot and forgets the memo, so the next [`load`](Self::load) rebuilds.
    pub fn invalidate(&mut self) -> Result<(), SnapshotError> {
        info!("[Store] Invalidating {:?}", self.snapshot.path());
        self.memo = None;
        self.snapshot.remove()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libgeometas::dataset::Meta;
    use std::cell::Cell;

    fn tmp(name: &str) -> PathBuf {
        let p = std::env::temp_dir().join(name);
        let _ = fs::remove_file(&p);
        p
    }

    fn populated() -> Dataset {
        let mut data = Dataset::new();
        data.insert("Chile", vec![Meta::new("Bollards", "https://x/c.jpg")]);
        data.insert("Togo", vec![]);
        data
    }

    const DAY: Duration = Duration::from_secs(60 * 60 * 24);

    #[test]
    fn missing_snapshot_reads_as_none() {
        let snapshot = Snapshot::new(tmp("geometas_missing.json"));
        assert!(snapshot.read().unwrap().is_none());
        snapshot.remove().unwrap();
    }

    #[test]
    fn valid_snapshot_is_returned_without_rebuild() {
        let snapshot = Snapshot::new(tmp("geometas_valid.json"));
        snapshot.write(&populated()).unwrap();
        let mut store = DatasetStore::new(snapshot.clone(), DAY);

        let data = store.load(|_| panic!("should not rebuild")).unwrap();
        assert_eq!(data, populated());
        snapshot.remove().unwrap();
    }

    #[test]
    fn missing_snapshot_triggers_rebuild() {
        let mut store = DatasetStore::new(Snapshot::new(tmp("geometas_absent.json")), DAY);
        let data = store.load(|_| Ok(populated())).unwrap();
        assert_eq!(data, populated());
    }

    #[test]
    fn corrupted_snapshot_triggers_rebuild() {
        let path = tmp("geometas_corrupt.json");
        fs::write(&path, "{ not json").unwrap();
        let mut store = DatasetStore::new(Snapshot::new(&path), DAY);

        let rebuilt = Cell::new(false);
        store
            .load(|_| {
                rebuilt.set(true);
                Ok(populated())
            })
            .unwrap();
        assert!(rebuilt.get());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn all_empty_snapshot_triggers_rebuild() {
        let snapshot = Snapshot::new(tmp("geometas_all_empty.json"));
        let mut empty = Dataset::new();
        empty.insert("Togo", vec![]);
        snapshot.write(&empty).unwrap();
        let mut store = DatasetStore::new(snapshot.clone(), DAY);

        let rebuilt = Cell::new(false);
        store
            .load(|_| {
                rebuilt.set(true);
                Ok(populated())
            })
            .unwrap();
        assert!(rebuilt.get());
        snapshot.remove().unwrap();
    }

    #[test]
    fn load_is_memoized_until_invalidated() {
        let snapshot = Snapshot::new(tmp("geometas_memo.json"));
        let mut store = DatasetStore::new(snapshot.clone(), DAY);
        let builds = Cell::new(0);
        let rebuild = |s: &Snapshot| -> Result<Dataset, SnapshotError> {
            builds.set(builds.get() + 1);
            s.write(&populated())?;
            Ok(populated())
        };

        store.load(rebuild).unwrap();
        store.load(rebuild).unwrap();
        assert_eq!(builds.get(), 1);

        store.invalidate().unwrap();
        assert!(!snapshot.exists());
        store.load(rebuild).unwrap();
        assert_eq!(builds.get(), 2);
        snapshot.remove().unwrap();
    }

    #[test]
    fn invalidate_without_snapshot_is_fine() {
        let mut store = DatasetStore::new(Snapshot::new(tmp("geometas_never.json")), DAY);
        store.invalidate().unwrap();
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = std::env::temp_dir().join("geometas_nested_dir");
        let _ = fs::remove_dir_all(&dir);
        let snapshot = Snapshot::new(dir.join("data.json"));
        snapshot.write(&populated()).unwrap();
        assert_eq!(snapshot.read().unwrap(), Some(populated()));
        let _ = fs::remove_dir_all(&dir);
    }
}
