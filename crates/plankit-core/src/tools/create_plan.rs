use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use plankit_store::{PlanRecord, Priority, TaskEntry};

use super::context::ToolContext;
use super::envelope::ToolResult;
use super::error::ToolError;
use super::registry::{Tool, parse_arguments, schema_of};
use crate::plan::{NewPlan, build_plan_context, create_plan};

/// A task given at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NewTaskArguments {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<String>,
}

impl From<NewTaskArguments> for TaskEntry {
    fn from(task: NewTaskArguments) -> Self {
        Self {
            title: task.title,
            description: task.description,
            done: false,
            files: task.files,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreatePlanArguments {
    pub title: String,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Id of an existing parent plan.
    #[serde(default)]
    pub parent: Option<u64>,
    /// Ids of existing plans that must finish first.
    #[serde(default)]
    pub dependencies: Vec<u64>,
    #[serde(default)]
    pub tasks: Vec<NewTaskArguments>,
}

pub fn create_plan_parameters() -> Value {
    schema_of::<CreatePlanArguments>()
}

pub async fn create_plan_tool(
    args: CreatePlanArguments,
    ctx: &ToolContext,
) -> Result<ToolResult<PlanRecord>, ToolError> {
    let new = NewPlan {
        title: args.title,
        goal: args.goal,
        details: args.details,
        priority: args.priority,
        parent: args.parent,
        dependencies: args.dependencies,
        tasks: args.tasks.into_iter().map(TaskEntry::from).collect(),
    };
    let created = create_plan(&ctx.plans, new).await?;
    let text = build_plan_context(&created.plan, &created.path, &ctx.plans.cwd);
    let message = match created.plan.id {
        Some(id) => format!("Created plan {id}"),
        None => "Created plan".to_owned(),
    };
    Ok(ToolResult::new(text, (*created.plan).clone(), message))
}

pub struct CreatePlan;

#[async_trait]
impl Tool for CreatePlan {
    fn name(&self) -> &'static str {
        "create_plan"
    }

    fn description(&self) -> &'static str {
        "Create a new plan file with the next free id."
    }

    fn parameters_schema(&self) -> Value {
        create_plan_parameters()
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<ToolResult<Value>, ToolError> {
        let args = parse_arguments(self.name(), args)?;
        create_plan_tool(args, ctx).await?.into_json()
    }
}
