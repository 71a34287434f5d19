//! Plan lookup and rendering: cache, resolver, context builder, store-wide
//! validation, and the mutating plan services.

pub mod cache;
pub mod context;
pub mod graph;
pub mod resolve;
pub mod service;

use std::path::PathBuf;
use std::sync::Arc;

use plankit_store::PlanStore;

pub use cache::PlanCache;
pub use context::build_plan_context;
pub use graph::{GraphError, validate_plan_graph};
pub use resolve::{PlanRef, ResolveError, ResolveErrorKind, ResolvedPlan, resolve_plan};
pub use service::{
    NewPlan, PlanFilter, PlanSummary, ServiceError, StoreReport, add_task, create_plan,
    list_plans, mark_task_done, validate_store,
};

/// Ambient inputs for plan resolution and the plan services.
///
/// The cache is shared by reference so that every caller in a process sees
/// the same memoized plans, while tests can build an isolated one each.
#[derive(Clone)]
pub struct PlanContext {
    pub store: Arc<dyn PlanStore>,
    pub cache: Arc<PlanCache>,
    /// Directory relative paths are resolved against and displayed from.
    pub cwd: PathBuf,
}

impl PlanContext {
    pub fn new(store: Arc<dyn PlanStore>, cache: Arc<PlanCache>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            store,
            cache,
            cwd: cwd.into(),
        }
    }

    /// The plans directory as seen from [`cwd`](Self::cwd).
    pub fn plans_dir(&self) -> PathBuf {
        self.cwd.join(self.store.root())
    }
}
