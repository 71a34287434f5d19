use std::env;
use std::path::PathBuf;

use crate::fs::FsPlanStore;

/// Plan store configuration.
///
/// Reads from the `PLANKIT_PLANS_DIR` environment variable, falling back to
/// a caller-supplied directory (usually [`StoreConfig::DEFAULT_DIR`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding one `*.toml` file per plan.
    pub plans_dir: PathBuf,
}

impl StoreConfig {
    /// The default plans directory used when nothing else is configured.
    pub const DEFAULT_DIR: &str = "tasks";

    /// Environment variable that overrides the plans directory.
    pub const ENV_VAR: &str = "PLANKIT_PLANS_DIR";

    /// Build a config from the environment.
    ///
    /// Priority: `PLANKIT_PLANS_DIR` env var, then `fallback`.
    pub fn from_env_or(fallback: impl Into<PathBuf>) -> Self {
        match env::var_os(Self::ENV_VAR) {
            Some(dir) => Self::new(dir),
            None => Self::new(fallback),
        }
    }

    /// Build a config from an explicit directory (useful for tests and CLI flags).
    pub fn new(plans_dir: impl Into<PathBuf>) -> Self {
        Self {
            plans_dir: plans_dir.into(),
        }
    }

    /// Open a file-backed store rooted at the configured directory.
    pub fn open(&self) -> FsPlanStore {
        FsPlanStore::new(self.plans_dir.clone())
    }
}
