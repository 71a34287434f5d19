//! `plankit report-failure`: emit a failure report from the command line.

use anyhow::Result;

use plankit_core::report::{FailureDetails, StructuredEvent, send_failure_report};
use plankit_core::tools::ToolContext;

/// Send the report to the configured sink and echo the event as JSON.
pub fn run_report_failure(ctx: &ToolContext, summary: &str, details: FailureDetails) -> Result<()> {
    if summary.trim().is_empty() {
        anyhow::bail!("summary must not be empty");
    }
    let report = send_failure_report(ctx.sink.as_ref(), summary, details);
    let event = StructuredEvent::FailureReport(report);
    println!("{}", serde_json::to_string(&event)?);
    Ok(())
}
