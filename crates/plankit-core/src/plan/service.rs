//! Plan service layer.
//!
//! Listing, creating and editing plans on top of the store. Every operation
//! clears the cache before it reads, and mutating operations clear it again
//! after writing so the next reader in the process sees the new file.

use std::path::PathBuf;

use chrono::{SubsecRound, Utc};
use serde::Serialize;
use thiserror::Error;

use plankit_store::{
    EditError, PlanRecord, PlanStatus, Priority, StoreError, TaskEntry, append_task,
    plan_file_name, set_task_done,
};

use super::graph::validate_plan_graph;
use super::resolve::{PlanRef, ResolveError, ResolvedPlan, resolve_plan};
use super::PlanContext;

/// Errors from the mutating plan services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("plan title must not be empty")]
    EmptyTitle,

    #[error("task title must not be empty")]
    EmptyTaskTitle,

    #[error("plan {0} does not exist")]
    UnknownPlan(u64),

    #[error("task {number} does not exist (plan has {count} tasks)")]
    TaskOutOfRange { number: usize, count: usize },
}

// -----------------------------------------------------------------------
// Listing
// -----------------------------------------------------------------------

/// One row of `list_plans`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub status: PlanStatus,
    pub priority: Option<Priority>,
    pub tasks_done: usize,
    pub tasks_total: usize,
    pub path: PathBuf,
}

/// Which plans `list_plans` returns.
#[derive(Debug, Clone, Default)]
pub struct PlanFilter {
    /// Only plans with exactly this status.
    pub status: Option<PlanStatus>,
    /// Include done and cancelled plans when no status is given.
    pub include_finished: bool,
}

impl PlanFilter {
    fn matches(&self, plan: &PlanRecord) -> bool {
        match self.status {
            Some(status) => plan.status == status,
            None => self.include_finished || !plan.status.is_finished(),
        }
    }
}

/// Summaries of every plan matching `filter`, ordered by id (plans without
/// an id last) and then by path.
pub async fn list_plans(ctx: &PlanContext, filter: &PlanFilter) -> Result<Vec<PlanSummary>, StoreError> {
    ctx.cache.clear();
    let plans = ctx.cache.all(ctx.store.as_ref()).await?;

    let mut summaries: Vec<PlanSummary> = plans
        .iter()
        .filter(|(_, plan)| filter.matches(plan))
        .map(|(path, plan)| PlanSummary {
            id: plan.id,
            title: plan.title.clone(),
            status: plan.status,
            priority: plan.priority,
            tasks_done: plan.done_task_count(),
            tasks_total: plan.tasks.len(),
            path: path.clone(),
        })
        .collect();
    summaries.sort_by(|a, b| {
        (a.id.is_none(), a.id, &a.path).cmp(&(b.id.is_none(), b.id, &b.path))
    });
    Ok(summaries)
}

// -----------------------------------------------------------------------
// Creating
// -----------------------------------------------------------------------

/// Fields for a new plan. The id, status and timestamps are assigned by
/// [`create_plan`].
#[derive(Debug, Clone, Default)]
pub struct NewPlan {
    pub title: String,
    pub goal: Option<String>,
    pub details: Option<String>,
    pub priority: Option<Priority>,
    pub parent: Option<u64>,
    pub dependencies: Vec<u64>,
    pub tasks: Vec<TaskEntry>,
}

/// Write a new plan file with the next free id (`max + 1`, or 1 for an
/// empty store).
///
/// `parent` and `dependencies` must name existing plans.
pub async fn create_plan(ctx: &PlanContext, new: NewPlan) -> Result<ResolvedPlan, ServiceError> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(ServiceError::EmptyTitle);
    }
    if new.tasks.iter().any(|t| t.title.trim().is_empty()) {
        return Err(ServiceError::EmptyTaskTitle);
    }

    ctx.cache.clear();
    let existing = ctx.cache.all(ctx.store.as_ref()).await?;
    let known = |id: u64| existing.iter().any(|(_, p)| p.id == Some(id));
    if let Some(missing) = new
        .parent
        .iter()
        .chain(new.dependencies.iter())
        .copied()
        .find(|id| !known(*id))
    {
        return Err(ServiceError::UnknownPlan(missing));
    }

    let id = existing
        .iter()
        .filter_map(|(_, p)| p.id)
        .max()
        .map_or(1, |max| max + 1);
    let now = Utc::now().trunc_subsecs(0);

    let record = PlanRecord {
        id: Some(id),
        title: Some(title.to_owned()),
        goal: new.goal.filter(|g| !g.trim().is_empty()),
        details: new.details.filter(|d| !d.trim().is_empty()),
        status: PlanStatus::Pending,
        priority: new.priority,
        parent: new.parent,
        dependencies: new.dependencies,
        issue: Vec::new(),
        created_at: Some(now),
        updated_at: Some(now),
        tasks: new.tasks,
    };

    let content = toml::to_string(&record).map_err(StoreError::from)?;
    let path = ctx
        .store
        .create(&plan_file_name(id, title), &content)
        .await?;
    ctx.cache.clear();

    tracing::info!(id, path = %path.display(), "created plan");
    reload(ctx, path).await
}

// -----------------------------------------------------------------------
// Editing
// -----------------------------------------------------------------------

/// Append `task` to the referenced plan.
pub async fn add_task(
    ctx: &PlanContext,
    reference: &PlanRef,
    task: TaskEntry,
) -> Result<ResolvedPlan, ServiceError> {
    if task.title.trim().is_empty() {
        return Err(ServiceError::EmptyTaskTitle);
    }

    ctx.cache.clear();
    let resolved = resolve_plan(reference, ctx).await?;
    let content = ctx.store.read(&resolved.path).await?;
    let edited = append_task(&content, &task, Utc::now()).map_err(|source| StoreError::Edit {
        path: resolved.path.clone(),
        source,
    })?;
    ctx.store.write(&resolved.path, &edited).await?;
    ctx.cache.clear();

    tracing::info!(path = %resolved.path.display(), task = %task.title, "added task");
    reload(ctx, resolved.path).await
}

/// Mark task `number` (1-based) of the referenced plan as done.
///
/// Returns the updated plan and whether this finished the plan (every task
/// done, status set to `done`).
pub async fn mark_task_done(
    ctx: &PlanContext,
    reference: &PlanRef,
    number: usize,
) -> Result<(ResolvedPlan, bool), ServiceError> {
    ctx.cache.clear();
    let resolved = resolve_plan(reference, ctx).await?;
    let content = ctx.store.read(&resolved.path).await?;
    let (edited, finished) = match set_task_done(&content, number, Utc::now()) {
        Ok(out) => out,
        Err(EditError::TaskOutOfRange { index, count }) => {
            return Err(ServiceError::TaskOutOfRange {
                number: index,
                count,
            });
        }
        Err(source) => {
            return Err(StoreError::Edit {
                path: resolved.path.clone(),
                source,
            }
            .into());
        }
    };
    ctx.store.write(&resolved.path, &edited).await?;
    ctx.cache.clear();

    tracing::info!(path = %resolved.path.display(), number, finished, "marked task done");
    Ok((reload(ctx, resolved.path).await?, finished))
}

async fn reload(ctx: &PlanContext, path: PathBuf) -> Result<ResolvedPlan, ServiceError> {
    let plan = ctx.cache.load(ctx.store.as_ref(), &path).await?;
    Ok(ResolvedPlan { plan, path })
}

// -----------------------------------------------------------------------
// Validation
// -----------------------------------------------------------------------

/// Outcome of [`validate_store`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreReport {
    /// Plan files that loaded successfully.
    pub valid_files: usize,
    /// Human-readable problems; empty means the store is consistent.
    pub problems: Vec<String>,
}

/// Load every plan file and check the store as a whole.
///
/// Unlike resolution, which skips unparsable files, this reports them.
pub async fn validate_store(ctx: &PlanContext) -> Result<StoreReport, StoreError> {
    ctx.cache.clear();
    let mut report = StoreReport::default();
    let mut loaded = Vec::new();

    for path in ctx.store.list_paths().await? {
        match ctx.cache.load(ctx.store.as_ref(), &path).await {
            Ok(plan) => loaded.push((path, plan)),
            Err(e @ StoreError::Parse { .. }) => report.problems.push(e.to_string()),
            Err(e) => return Err(e),
        }
    }
    report.valid_files = loaded.len();

    report
        .problems
        .extend(validate_plan_graph(&loaded).iter().map(ToString::to_string));
    Ok(report)
}
