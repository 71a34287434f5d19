//! Tool catalog.
//!
//! Each tool lives in its own module with its argument type, a
//! `*_parameters()` schema function and a typed `*_tool()` entry point. The
//! [`ToolRegistry`] exposes them by name with JSON arguments.

pub mod add_plan_task;
pub mod context;
pub mod create_plan;
pub mod envelope;
pub mod error;
pub mod get_plan;
pub mod list_plans;
pub mod mark_task_done;
pub mod registry;
pub mod report_failure;

use std::sync::Arc;

pub use add_plan_task::{AddPlanTask, AddPlanTaskArguments, add_plan_task_parameters, add_plan_task_tool};
pub use context::ToolContext;
pub use create_plan::{
    CreatePlan, CreatePlanArguments, NewTaskArguments, create_plan_parameters, create_plan_tool,
};
pub use envelope::ToolResult;
pub use error::{ToolError, ToolErrorKind};
pub use get_plan::{GetPlan, GetPlanArguments, get_plan_parameters, get_plan_tool};
pub use list_plans::{
    ListPlans, ListPlansArguments, list_plans_parameters, list_plans_tool, render_summaries,
};
pub use mark_task_done::{
    MarkTaskDone, MarkTaskDoneArguments, mark_task_done_parameters, mark_task_done_tool,
};
pub use registry::{Tool, ToolDescriptor, ToolRegistry, parse_arguments, schema_of};
pub use report_failure::{
    ReportFailure, ReportFailureArguments, report_failure_parameters, report_failure_tool,
};

/// Names of every tool in the catalog.
pub const TOOL_NAMES: &[&str] = &[
    "get_plan",
    "list_plans",
    "create_plan",
    "add_plan_task",
    "mark_task_done",
    "report_failure",
];

pub(crate) fn builtin_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(GetPlan),
        Arc::new(ListPlans),
        Arc::new(CreatePlan),
        Arc::new(AddPlanTask),
        Arc::new(MarkTaskDone),
        Arc::new(ReportFailure),
    ]
}
