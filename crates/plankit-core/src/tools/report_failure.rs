use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::context::ToolContext;
use super::envelope::ToolResult;
use super::error::ToolError;
use super::registry::{Tool, parse_arguments, schema_of};
use crate::report::{FailureDetails, StructuredEvent, send_failure_report};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ReportFailureArguments {
    /// What could not be done.
    pub summary: String,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub problems: Option<String>,
    #[serde(default)]
    pub solutions: Option<String>,
    /// Name of the agent filing the report. `sourceAgent` is accepted too,
    /// matching the emitted event.
    #[serde(default, alias = "sourceAgent")]
    pub source_agent: Option<String>,
}

pub fn report_failure_parameters() -> Value {
    schema_of::<ReportFailureArguments>()
}

pub async fn report_failure_tool(
    args: ReportFailureArguments,
    ctx: &ToolContext,
) -> Result<ToolResult<StructuredEvent>, ToolError> {
    let details = FailureDetails {
        requirements: args.requirements,
        problems: args.problems,
        solutions: args.solutions,
        source_agent: args.source_agent,
    };
    let report = send_failure_report(ctx.sink.as_ref(), &args.summary, details);
    let text = format!("Failure reported at {}: {}", report.timestamp, report.summary);
    Ok(ToolResult::new(
        text,
        StructuredEvent::FailureReport(report),
        "Reported failure",
    ))
}

pub struct ReportFailure;

#[async_trait]
impl Tool for ReportFailure {
    fn name(&self) -> &'static str {
        "report_failure"
    }

    fn description(&self) -> &'static str {
        "Record why a piece of work could not be completed."
    }

    fn parameters_schema(&self) -> Value {
        report_failure_parameters()
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<ToolResult<Value>, ToolError> {
        let args = parse_arguments(self.name(), args)?;
        report_failure_tool(args, ctx).await?.into_json()
    }
}
