//! Read-through plan cache.
//!
//! Memoizes loaded plan files by canonical path, plus the result of one full
//! directory scan so id and slug lookups do not re-read every file. Nothing
//! expires on its own; callers that need a fresh read call
//! [`PlanCache::clear`] first.
//!
//! The lock is never held across I/O. Two loaders racing on the same path
//! both read the file and the last insert wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use plankit_store::{PlanRecord, PlanStore, StoreError};

#[derive(Debug, Default)]
pub struct PlanCache {
    state: RwLock<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    plans: HashMap<PathBuf, Arc<PlanRecord>>,
    /// Store paths seen by the last complete scan, in store order.
    scanned: Option<Vec<PathBuf>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every memoized plan and the directory scan.
    pub fn clear(&self) {
        let mut state = self.write();
        let dropped = state.plans.len();
        state.plans.clear();
        state.scanned = None;
        tracing::debug!(dropped, "cleared plan cache");
    }

    /// Number of memoized plans.
    pub fn len(&self) -> usize {
        self.read().plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().plans.is_empty()
    }

    /// Whether a complete directory scan is memoized.
    pub fn is_scanned(&self) -> bool {
        self.read().scanned.is_some()
    }

    pub fn get(&self, path: &Path) -> Option<Arc<PlanRecord>> {
        self.read().plans.get(path).cloned()
    }

    /// Load the plan at `path` (which should be canonical), reading through
    /// to `store` on a miss.
    pub async fn load(
        &self,
        store: &dyn PlanStore,
        path: &Path,
    ) -> Result<Arc<PlanRecord>, StoreError> {
        if let Some(hit) = self.get(path) {
            return Ok(hit);
        }

        let plan = Arc::new(store.load(path).await?);
        self.write()
            .plans
            .insert(path.to_path_buf(), Arc::clone(&plan));
        Ok(plan)
    }

    /// Every loadable plan in `store`, in path order.
    ///
    /// Files that fail to parse are skipped with a warning so that one bad
    /// file does not hide every other plan; `plankit plan validate` reports
    /// them. Listing and read failures still propagate.
    pub async fn all(
        &self,
        store: &dyn PlanStore,
    ) -> Result<Vec<(PathBuf, Arc<PlanRecord>)>, StoreError> {
        if let Some(hit) = self.scanned_snapshot() {
            return Ok(hit);
        }

        let paths = store.list_paths().await?;
        let mut loaded = Vec::with_capacity(paths.len());
        for path in paths {
            match self.load(store, &path).await {
                Ok(plan) => loaded.push((path, plan)),
                Err(StoreError::Parse { path, source }) => {
                    tracing::warn!(path = %path.display(), error = %source, "skipping invalid plan file");
                }
                Err(e) => return Err(e),
            }
        }

        self.write().scanned = Some(loaded.iter().map(|(p, _)| p.clone()).collect());
        tracing::debug!(count = loaded.len(), "scanned plans directory");
        Ok(loaded)
    }

    /// The memoized scan, or `None` if there is none or a sibling cleared
    /// part of it while we were not looking.
    fn scanned_snapshot(&self) -> Option<Vec<(PathBuf, Arc<PlanRecord>)>> {
        let state = self.read();
        let paths = state.scanned.as_ref()?;
        paths
            .iter()
            .map(|p| state.plans.get(p).map(|plan| (p.clone(), Arc::clone(plan))))
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plankit_store::FsPlanStore;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path.canonicalize().unwrap()
    }

    #[tokio::test]
    async fn load_memoizes_until_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "1.toml", "id = 1\ntitle = \"before\"\n");
        let store = FsPlanStore::new(dir.path());
        let cache = PlanCache::new();

        let first = cache.load(&store, &path).await.unwrap();
        assert_eq!(first.title.as_deref(), Some("before"));
        assert_eq!(cache.len(), 1);

        std::fs::write(&path, "id = 1\ntitle = \"after\"\n").unwrap();
        let stale = cache.load(&store, &path).await.unwrap();
        assert_eq!(stale.title.as_deref(), Some("before"));

        cache.clear();
        assert!(cache.is_empty());
        let fresh = cache.load(&store, &path).await.unwrap();
        assert_eq!(fresh.title.as_deref(), Some("after"));
    }

    #[tokio::test]
    async fn all_scans_once_and_skips_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "1.toml", "id = 1\n");
        write(dir.path(), "2.toml", "id = 2\n");
        write(dir.path(), "broken.toml", "status = \"nope\"\n");
        let store = FsPlanStore::new(dir.path());
        let cache = PlanCache::new();

        let plans = cache.all(&store).await.unwrap();
        assert_eq!(plans.len(), 2);
        assert!(cache.is_scanned());

        // A new file is invisible until the scan is cleared.
        write(dir.path(), "3.toml", "id = 3\n");
        assert_eq!(cache.all(&store).await.unwrap().len(), 2);

        cache.clear();
        assert!(!cache.is_scanned());
        assert_eq!(cache.all(&store).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn all_ignores_plans_loaded_from_outside_the_store() {
        let plans_dir = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        write(plans_dir.path(), "1.toml", "id = 1\n");
        let outside = write(elsewhere.path(), "loose.toml", "id = 99\n");

        let store = FsPlanStore::new(plans_dir.path());
        let cache = PlanCache::new();
        cache.load(&store, &outside).await.unwrap();

        let plans = cache.all(&store).await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].1.id, Some(1));
        assert_eq!(cache.len(), 2);
    }
}
