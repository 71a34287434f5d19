use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::edit::EditError;
use crate::parser::PlanParseError;

/// Errors raised by a [`PlanStore`](crate::PlanStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to list plans in {}: {source}", .path.display())]
    List { path: PathBuf, source: io::Error },

    #[error("invalid plan file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: PlanParseError,
    },

    #[error("cannot edit {}: {source}", .path.display())]
    Edit { path: PathBuf, source: EditError },

    #[error("plan file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("failed to serialize plan: {0}")]
    Serialize(#[from] toml::ser::Error),
}
