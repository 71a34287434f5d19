use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use plankit_store::PlanRecord;

use super::context::ToolContext;
use super::envelope::ToolResult;
use super::error::ToolError;
use super::registry::{Tool, parse_arguments, schema_of};
use crate::plan::{PlanRef, build_plan_context, mark_task_done};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MarkTaskDoneArguments {
    pub plan: PlanRef,
    /// 1-based task number, as shown by `get_plan`.
    pub task: usize,
}

pub fn mark_task_done_parameters() -> Value {
    schema_of::<MarkTaskDoneArguments>()
}

pub async fn mark_task_done_tool(
    args: MarkTaskDoneArguments,
    ctx: &ToolContext,
) -> Result<ToolResult<PlanRecord>, ToolError> {
    let (updated, finished) = mark_task_done(&ctx.plans, &args.plan, args.task).await?;
    let text = build_plan_context(&updated.plan, &updated.path, &ctx.plans.cwd);
    let message = if finished {
        format!("Marked task {} done; all tasks complete", args.task)
    } else {
        format!("Marked task {} done", args.task)
    };
    Ok(ToolResult::new(text, (*updated.plan).clone(), message))
}

pub struct MarkTaskDone;

#[async_trait]
impl Tool for MarkTaskDone {
    fn name(&self) -> &'static str {
        "mark_task_done"
    }

    fn description(&self) -> &'static str {
        "Mark one task of a plan as done. The plan itself becomes done when its last task is."
    }

    fn parameters_schema(&self) -> Value {
        mark_task_done_parameters()
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<ToolResult<Value>, ToolError> {
        let args = parse_arguments(self.name(), args)?;
        mark_task_done_tool(args, ctx).await?.into_json()
    }
}
