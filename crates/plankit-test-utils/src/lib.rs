//! Shared test utilities for plankit integration tests.
//!
//! Provides a throwaway working directory with a `tasks/` plans directory
//! inside it. Each test gets its own directory, removed on drop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use plankit_store::FsPlanStore;

/// A temporary working directory containing a plans directory.
pub struct PlanDir {
    dir: TempDir,
    plans: PathBuf,
}

impl PlanDir {
    /// Create an empty working directory with an empty `tasks/` inside.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let plans = dir.path().join("tasks");
        std::fs::create_dir_all(&plans).expect("failed to create plans dir");
        // Canonical paths keep assertions stable on platforms where the temp
        // dir sits behind a symlink (macOS /var -> /private/var).
        let plans = plans
            .canonicalize()
            .expect("failed to canonicalize plans dir");
        Self { dir, plans }
    }

    /// The working directory (parent of the plans directory).
    pub fn workdir(&self) -> PathBuf {
        self.dir
            .path()
            .canonicalize()
            .expect("failed to canonicalize workdir")
    }

    /// The plans directory.
    pub fn plans_dir(&self) -> &Path {
        &self.plans
    }

    /// A store rooted at the plans directory.
    pub fn store(&self) -> Arc<FsPlanStore> {
        Arc::new(FsPlanStore::new(self.plans.clone()))
    }

    /// Write `content` to `file_name` inside the plans directory and return
    /// the full path.
    pub fn write_plan(&self, file_name: &str, content: &str) -> PathBuf {
        let path = self.plans.join(file_name);
        std::fs::write(&path, content)
            .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
        path
    }

    /// Write `content` to a path relative to the working directory, creating
    /// parent directories as needed.
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.workdir().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("failed to create {}: {e}", parent.display()));
        }
        std::fs::write(&path, content)
            .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
        path
    }
}

impl Default for PlanDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a plan file with an id, a title and pending tasks.
pub fn plan_toml(id: u64, title: &str, tasks: &[&str]) -> String {
    let mut out = format!("id = {id}\ntitle = {}\n", toml_string(title));
    for task in tasks {
        out.push_str(&format!("\n[[tasks]]\ntitle = {}\n", toml_string(task)));
    }
    out
}

fn toml_string(s: &str) -> String {
    toml::Value::String(s.to_owned()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_toml_escapes_any_title() {
        let title = "Café \"quoted\" \u{1f680}\ttab\u{7}bell";
        let content = plan_toml(3, title, &["back\\slash", "naïve"]);

        let plan = plankit_store::parse_plan_toml(&content).unwrap();
        assert_eq!(plan.id, Some(3));
        assert_eq!(plan.title.as_deref(), Some(title));
        assert_eq!(plan.tasks[0].title, "back\\slash");
        assert_eq!(plan.tasks[1].title, "naïve");
    }
}
