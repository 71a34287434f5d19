use std::fmt::Write as _;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use plankit_store::PlanStatus;

use super::context::ToolContext;
use super::envelope::ToolResult;
use super::error::ToolError;
use super::registry::{Tool, parse_arguments, schema_of};
use crate::plan::{PlanFilter, PlanSummary, list_plans};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListPlansArguments {
    /// Only plans with this status.
    #[serde(default)]
    pub status: Option<PlanStatus>,
    /// Also list done and cancelled plans.
    #[serde(default)]
    pub include_done: bool,
}

pub fn list_plans_parameters() -> Value {
    schema_of::<ListPlansArguments>()
}

pub async fn list_plans_tool(
    args: ListPlansArguments,
    ctx: &ToolContext,
) -> Result<ToolResult<Vec<PlanSummary>>, ToolError> {
    let filter = PlanFilter {
        status: args.status,
        include_finished: args.include_done,
    };
    let summaries = list_plans(&ctx.plans, &filter).await?;
    let text = render_summaries(&summaries);
    let message = match summaries.len() {
        1 => "Found 1 plan".to_owned(),
        n => format!("Found {n} plans"),
    };
    Ok(ToolResult::new(text, summaries, message))
}

/// One line per plan: `42  [in_progress] Add auth (1/3)`.
pub fn render_summaries(summaries: &[PlanSummary]) -> String {
    let mut out = String::new();
    for s in summaries {
        let id = s.id.map_or_else(|| "-".to_owned(), |id| id.to_string());
        let title = s.title.as_deref().unwrap_or("(untitled)");
        let _ = write!(out, "{id:>4}  [{}] {title}", s.status);
        if let Some(priority) = s.priority {
            let _ = write!(out, " ({priority})");
        }
        let _ = writeln!(out, "  {}/{}", s.tasks_done, s.tasks_total);
    }
    out
}

pub struct ListPlans;

#[async_trait]
impl Tool for ListPlans {
    fn name(&self) -> &'static str {
        "list_plans"
    }

    fn description(&self) -> &'static str {
        "List plans with their status and task progress. Finished plans are hidden unless requested."
    }

    fn parameters_schema(&self) -> Value {
        list_plans_parameters()
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<ToolResult<Value>, ToolError> {
        let args = parse_arguments(self.name(), args)?;
        list_plans_tool(args, ctx).await?.into_json()
    }
}
