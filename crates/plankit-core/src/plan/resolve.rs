//! Plan resolution.
//!
//! Maps a [`PlanRef`] to exactly one loaded plan and the path it came from.
//!
//! - [`PlanRef::Id`] matches a numeric `id` first, then file slugs (`add-auth`
//!   matches `add-auth.toml` and `42-add-auth.toml`).
//! - [`PlanRef::Path`] loads a file directly, relative to the working
//!   directory first and the plans directory second.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use plankit_store::{PlanRecord, StoreError};

use super::PlanContext;

/// How a caller names a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlanRef {
    /// Numeric plan id, or a plan file slug.
    #[serde(deserialize_with = "id_text")]
    #[schemars(with = "IdText")]
    Id(String),
    /// Path to a plan file, relative to the working directory or the plans
    /// directory.
    Path(String),
}

/// An id as it may arrive in JSON: `"42"`, `"add-auth"` or `42`.
#[derive(Deserialize, JsonSchema)]
#[serde(untagged)]
enum IdText {
    Text(String),
    Number(u64),
}

fn id_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match IdText::deserialize(deserializer)? {
        IdText::Text(text) => text,
        IdText::Number(n) => n.to_string(),
    })
}

impl PlanRef {
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }
}

impl fmt::Display for PlanRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Path(path) => write!(f, "{path}"),
        }
    }
}

/// Errors from [`resolve_plan`].
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no plan matches {reference:?}")]
    NotFound { reference: String },

    #[error("plan identifier {identifier:?} is ambiguous; it matches {}", join_paths(.candidates))]
    Ambiguous {
        identifier: String,
        candidates: Vec<PathBuf>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse classification of a [`ResolveError`], for callers that map errors
/// onto status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveErrorKind {
    NotFound,
    Ambiguous,
    Store,
}

impl ResolveError {
    pub fn kind(&self) -> ResolveErrorKind {
        match self {
            Self::NotFound { .. } => ResolveErrorKind::NotFound,
            Self::Ambiguous { .. } => ResolveErrorKind::Ambiguous,
            Self::Store(_) => ResolveErrorKind::Store,
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A plan together with the file it was loaded from.
#[derive(Debug, Clone)]
pub struct ResolvedPlan {
    pub plan: Arc<PlanRecord>,
    pub path: PathBuf,
}

/// Resolve `reference` to exactly one plan.
///
/// Reads go through `ctx.cache`; callers that must not see a stale plan
/// clear the cache first.
pub async fn resolve_plan(
    reference: &PlanRef,
    ctx: &PlanContext,
) -> Result<ResolvedPlan, ResolveError> {
    let resolved = match reference {
        PlanRef::Id(identifier) => resolve_by_id(identifier.trim(), ctx).await?,
        PlanRef::Path(path) => resolve_by_path(Path::new(path), ctx).await?,
    };
    tracing::debug!(
        reference = %reference,
        path = %resolved.path.display(),
        "resolved plan"
    );
    Ok(resolved)
}

async fn resolve_by_id(identifier: &str, ctx: &PlanContext) -> Result<ResolvedPlan, ResolveError> {
    if identifier.is_empty() {
        return Err(ResolveError::NotFound {
            reference: String::new(),
        });
    }

    let plans = ctx.cache.all(ctx.store.as_ref()).await?;

    if let Ok(id) = identifier.parse::<u64>() {
        let exact: Vec<_> = plans.iter().filter(|(_, p)| p.id == Some(id)).collect();
        if !exact.is_empty() {
            return pick_one(identifier, exact);
        }
    }

    let by_slug: Vec<_> = plans
        .iter()
        .filter(|(path, _)| slug_matches(path, identifier))
        .collect();
    pick_one(identifier, by_slug)
}

fn pick_one(
    identifier: &str,
    mut matches: Vec<&(PathBuf, Arc<PlanRecord>)>,
) -> Result<ResolvedPlan, ResolveError> {
    match matches.len() {
        0 => Err(ResolveError::NotFound {
            reference: identifier.to_owned(),
        }),
        1 => {
            let (path, plan) = matches.remove(0);
            Ok(ResolvedPlan {
                plan: Arc::clone(plan),
                path: path.clone(),
            })
        }
        _ => Err(ResolveError::Ambiguous {
            identifier: identifier.to_owned(),
            candidates: matches.into_iter().map(|(p, _)| p.clone()).collect(),
        }),
    }
}

/// A file stem matches `identifier` exactly, or after stripping a numeric
/// `<id>-` prefix.
fn slug_matches(path: &Path, identifier: &str) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    if stem == identifier {
        return true;
    }
    stem.split_once('-')
        .is_some_and(|(head, tail)| tail == identifier && head.parse::<u64>().is_ok())
}

/// Canonical path of `candidate` if it names an existing regular file.
///
/// A missing path or a directory yields `None`; any other I/O failure is an
/// error.
async fn locate_plan_file(candidate: PathBuf) -> Result<Option<PathBuf>, StoreError> {
    let canonical = match tokio::fs::canonicalize(&candidate).await {
        Ok(p) => p,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Read {
                path: candidate,
                source,
            });
        }
    };
    match tokio::fs::metadata(&canonical).await {
        Ok(meta) if meta.is_file() => Ok(Some(canonical)),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Read {
            path: canonical,
            source,
        }),
    }
}

async fn resolve_by_path(path: &Path, ctx: &PlanContext) -> Result<ResolvedPlan, ResolveError> {
    let candidates = if path.is_absolute() {
        vec![path.to_path_buf()]
    } else {
        vec![ctx.cwd.join(path), ctx.plans_dir().join(path)]
    };

    for candidate in candidates {
        let Some(canonical) = locate_plan_file(candidate).await? else {
            continue;
        };
        let plan = ctx.cache.load(ctx.store.as_ref(), &canonical).await?;
        return Ok(ResolvedPlan {
            plan,
            path: canonical,
        });
    }

    Err(ResolveError::NotFound {
        reference: path.display().to_string(),
    })
}
