use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use plankit_store::{PlanRecord, TaskEntry};

use super::context::ToolContext;
use super::envelope::ToolResult;
use super::error::ToolError;
use super::registry::{Tool, parse_arguments, schema_of};
use crate::plan::{PlanRef, add_task, build_plan_context};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AddPlanTaskArguments {
    pub plan: PlanRef,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Files the task is expected to touch.
    #[serde(default)]
    pub files: Vec<String>,
}

pub fn add_plan_task_parameters() -> Value {
    schema_of::<AddPlanTaskArguments>()
}

pub async fn add_plan_task_tool(
    args: AddPlanTaskArguments,
    ctx: &ToolContext,
) -> Result<ToolResult<PlanRecord>, ToolError> {
    let task = TaskEntry {
        title: args.title,
        description: args.description,
        done: false,
        files: args.files,
    };
    let updated = add_task(&ctx.plans, &args.plan, task).await?;
    let text = build_plan_context(&updated.plan, &updated.path, &ctx.plans.cwd);
    let message = format!("Added task {}", updated.plan.tasks.len());
    Ok(ToolResult::new(text, (*updated.plan).clone(), message))
}

pub struct AddPlanTask;

#[async_trait]
impl Tool for AddPlanTask {
    fn name(&self) -> &'static str {
        "add_plan_task"
    }

    fn description(&self) -> &'static str {
        "Append a task to an existing plan, keeping the file's comments and layout."
    }

    fn parameters_schema(&self) -> Value {
        add_plan_task_parameters()
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<ToolResult<Value>, ToolError> {
        let args = parse_arguments(self.name(), args)?;
        add_plan_task_tool(args, ctx).await?.into_json()
    }
}
