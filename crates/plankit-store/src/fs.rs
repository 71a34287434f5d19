//! File-backed plan store.
//!
//! A plans directory holds one `*.toml` file per plan. Only the top level is
//! scanned; subdirectories are ignored.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;
use crate::models::PlanRecord;
use crate::parser::parse_plan_toml;

/// Storage backend for plan files.
///
/// Paths returned by [`list_paths`](PlanStore::list_paths) and
/// [`create`](PlanStore::create) are canonical, so they can be used as cache
/// keys alongside canonicalized user input.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Directory the store reads from.
    fn root(&self) -> &Path;

    /// Every plan file in the store, sorted by path. A missing plans
    /// directory yields an empty list.
    async fn list_paths(&self) -> Result<Vec<PathBuf>, StoreError>;

    /// Raw contents of a plan file.
    async fn read(&self, path: &Path) -> Result<String, StoreError>;

    /// Overwrite an existing plan file.
    async fn write(&self, path: &Path, content: &str) -> Result<(), StoreError>;

    /// Create a new plan file named `file_name` in the store root. Never
    /// overwrites an existing file.
    async fn create(&self, file_name: &str, content: &str) -> Result<PathBuf, StoreError>;

    /// Read and validate a plan file.
    async fn load(&self, path: &Path) -> Result<PlanRecord, StoreError> {
        let content = self.read(path).await?;
        parse_plan_toml(&content).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// [`PlanStore`] over a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsPlanStore {
    root: PathBuf,
}

impl FsPlanStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn canonical_root(&self) -> Result<Option<PathBuf>, StoreError> {
        match tokio::fs::canonicalize(&self.root).await {
            Ok(root) => Ok(Some(root)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::List {
                path: self.root.clone(),
                source,
            }),
        }
    }
}

#[async_trait]
impl PlanStore for FsPlanStore {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn list_paths(&self) -> Result<Vec<PathBuf>, StoreError> {
        let Some(root) = self.canonical_root().await? else {
            tracing::debug!(root = %self.root.display(), "plans directory does not exist");
            return Ok(Vec::new());
        };

        let list_err = |source| StoreError::List {
            path: root.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&root).await.map_err(list_err)?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "toml") {
                continue;
            }
            // Follows symlinks; a dangling link is skipped.
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => paths.push(path),
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(list_err(source)),
            }
        }
        paths.sort();

        tracing::debug!(root = %root.display(), count = paths.len(), "listed plan files");
        Ok(paths)
    }

    async fn read(&self, path: &Path) -> Result<String, StoreError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn write(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        tokio::fs::write(path, content)
            .await
            .map_err(|source| StoreError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn create(&self, file_name: &str, content: &str) -> Result<PathBuf, StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::Write {
                path: self.root.clone(),
                source,
            })?;

        let root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|source| StoreError::Write {
                path: self.root.clone(),
                source,
            })?;
        let path = root.join(file_name);

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(path));
            }
            Err(source) => return Err(StoreError::Write { path, source }),
        };

        let write_err = |source| StoreError::Write {
            path: path.clone(),
            source,
        };
        file.write_all(content.as_bytes()).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)?;

        tracing::info!(path = %path.display(), "created plan file");
        Ok(path)
    }
}

// -----------------------------------------------------------------------
// File naming
// -----------------------------------------------------------------------

const MAX_SLUG_LEN: usize = 50;

/// Lowercase `title`, collapse runs of non-alphanumerics to `-`, trim
/// dashes, and cap the result at 50 characters.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// File name for a new plan: `<id>-<slug>.toml`, or `<id>.toml` when the
/// title has no usable characters.
pub fn plan_file_name(id: u64, title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{id}.toml")
    } else {
        format!("{id}-{slug}.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Add user authentication"), "add-user-authentication");
        assert_eq!(slugify("  Fix: the (big) bug!! "), "fix-the-big-bug");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn slugify_truncates_long_titles() {
        let title = "word ".repeat(30);
        let slug = slugify(&title);
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn plan_file_name_formats() {
        assert_eq!(plan_file_name(7, "Ship it"), "7-ship-it.toml");
        assert_eq!(plan_file_name(8, "!!!"), "8.toml");
    }

    #[tokio::test]
    async fn missing_root_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPlanStore::new(dir.path().join("does-not-exist"));
        let paths = store.list_paths().await.unwrap();
        assert!(paths.is_empty());
    }

    #[tokio::test]
    async fn lists_only_top_level_toml_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2-b.toml"), "title = \"b\"\n").unwrap();
        std::fs::write(dir.path().join("1-a.toml"), "title = \"a\"\n").unwrap();
        std::fs::write(dir.path().join("notes.md"), "# notes\n").unwrap();
        std::fs::create_dir(dir.path().join("archive.toml")).unwrap();

        let store = FsPlanStore::new(dir.path());
        let paths = store.list_paths().await.unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["1-a.toml", "2-b.toml"]);
        assert!(paths.iter().all(|p| p.is_absolute()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn lists_symlinked_plan_files() {
        let dir = tempfile::tempdir().unwrap();
        let shared = tempfile::tempdir().unwrap();
        std::fs::write(shared.path().join("7-shared.toml"), "id = 7\n").unwrap();
        std::os::unix::fs::symlink(
            shared.path().join("7-shared.toml"),
            dir.path().join("7-shared.toml"),
        )
        .unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("gone.toml.target"),
            dir.path().join("8-dangling.toml"),
        )
        .unwrap();

        let store = FsPlanStore::new(dir.path());
        let paths = store.list_paths().await.unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["7-shared.toml"]);
        assert_eq!(store.load(&paths[0]).await.unwrap().id, Some(7));
    }

    #[tokio::test]
    async fn create_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPlanStore::new(dir.path().join("plans"));

        let path = store.create("1-a.toml", "id = 1\n").await.unwrap();
        assert!(path.ends_with("plans/1-a.toml"));

        let err = store.create("1-a.toml", "id = 2\n").await.unwrap_err();
        assert!(
            matches!(err, StoreError::AlreadyExists(_)),
            "expected AlreadyExists, got: {err}"
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id = 1\n");
    }

    #[tokio::test]
    async fn load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "status = \"nope\"\n").unwrap();

        let store = FsPlanStore::new(dir.path());
        let err = store.load(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }
}
