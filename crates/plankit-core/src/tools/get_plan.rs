use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use plankit_store::PlanRecord;

use super::context::ToolContext;
use super::envelope::ToolResult;
use super::error::ToolError;
use super::registry::{Tool, parse_arguments, schema_of};
use crate::plan::{PlanRef, build_plan_context, resolve_plan};

/// Arguments of `get_plan`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetPlanArguments {
    /// The plan to fetch: `{"id": "42"}`, `{"id": "add-auth"}` or
    /// `{"path": "tasks/42-add-auth.toml"}`.
    pub plan: PlanRef,
}

pub fn get_plan_parameters() -> Value {
    schema_of::<GetPlanArguments>()
}

/// Fetch one plan, always reading it fresh from disk.
pub async fn get_plan_tool(
    args: GetPlanArguments,
    ctx: &ToolContext,
) -> Result<ToolResult<PlanRecord>, ToolError> {
    ctx.plans.cache.clear();
    let resolved = resolve_plan(&args.plan, &ctx.plans).await?;
    let text = build_plan_context(&resolved.plan, &resolved.path, &ctx.plans.cwd);
    let message = match resolved.plan.id {
        Some(id) => format!("Retrieved plan {id}"),
        None => "Retrieved plan".to_owned(),
    };
    Ok(ToolResult::new(text, (*resolved.plan).clone(), message))
}

pub struct GetPlan;

#[async_trait]
impl Tool for GetPlan {
    fn name(&self) -> &'static str {
        "get_plan"
    }

    fn description(&self) -> &'static str {
        "Retrieve a plan by id, slug or file path and render it with its tasks."
    }

    fn parameters_schema(&self) -> Value {
        get_plan_parameters()
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<ToolResult<Value>, ToolError> {
        let args = parse_arguments(self.name(), args)?;
        get_plan_tool(args, ctx).await?.into_json()
    }
}
