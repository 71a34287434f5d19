//! CLI handlers for `plankit plan` subcommands.
//!
//! Implements:
//! - `plankit plan show (<id> | --file PATH)` -- render one plan
//! - `plankit plan list [--status S] [--all]` -- table of plans
//! - `plankit plan create --title T ...`     -- write a new plan file
//! - `plankit plan add-task ...`             -- append a task
//! - `plankit plan done ... --task N`        -- mark a task done
//! - `plankit plan validate`                 -- check the whole store

use anyhow::Result;

use plankit_core::plan::{
    NewPlan, PlanFilter, add_task, build_plan_context, create_plan, list_plans, mark_task_done,
    validate_store,
};
use plankit_core::tools::{GetPlanArguments, ToolContext, get_plan_tool, render_summaries};
use plankit_store::TaskEntry;

use crate::PlanCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(command: PlanCommands, ctx: &ToolContext) -> Result<()> {
    match command {
        PlanCommands::Show { target } => {
            let args = GetPlanArguments {
                plan: target.into_ref()?,
            };
            let result = get_plan_tool(args, ctx).await?;
            print!("{}", result.text);
        }
        PlanCommands::List { status, all } => {
            let filter = PlanFilter {
                status,
                include_finished: all,
            };
            let summaries = list_plans(&ctx.plans, &filter).await?;
            if summaries.is_empty() {
                println!("No plans found. Use `plankit plan create --title <TITLE>` to create one.");
            } else {
                print!("{}", render_summaries(&summaries));
            }
        }
        PlanCommands::Create {
            title,
            goal,
            details,
            priority,
            parent,
            depends_on,
            tasks,
        } => {
            let new = NewPlan {
                title,
                goal,
                details,
                priority,
                parent,
                dependencies: depends_on,
                tasks: tasks
                    .into_iter()
                    .map(|title| TaskEntry {
                        title,
                        ..Default::default()
                    })
                    .collect(),
            };
            let created = create_plan(&ctx.plans, new).await?;
            println!("Plan created: {}", display_path(ctx, &created.path));
            println!();
            print!(
                "{}",
                build_plan_context(&created.plan, &created.path, &ctx.plans.cwd)
            );
        }
        PlanCommands::AddTask {
            target,
            title,
            description,
            files,
        } => {
            let task = TaskEntry {
                title,
                description,
                done: false,
                files,
            };
            let updated = add_task(&ctx.plans, &target.into_ref()?, task).await?;
            println!(
                "Added task {} to {}",
                updated.plan.tasks.len(),
                display_path(ctx, &updated.path)
            );
        }
        PlanCommands::Done { target, task } => {
            let (updated, finished) = mark_task_done(&ctx.plans, &target.into_ref()?, task).await?;
            println!(
                "Task {task} of {} marked done ({}/{}).",
                display_path(ctx, &updated.path),
                updated.plan.done_task_count(),
                updated.plan.tasks.len()
            );
            if finished {
                println!("All tasks complete; plan status set to done.");
            }
        }
        PlanCommands::Validate => {
            let report = validate_store(&ctx.plans).await?;
            if report.problems.is_empty() {
                println!("{} plan files OK.", report.valid_files);
            } else {
                for problem in &report.problems {
                    println!("  - {problem}");
                }
                anyhow::bail!(
                    "{} problem(s) found in {}",
                    report.problems.len(),
                    ctx.plans.plans_dir().display()
                );
            }
        }
    }
    Ok(())
}

fn display_path(ctx: &ToolContext, path: &std::path::Path) -> String {
    path.strip_prefix(&ctx.plans.cwd)
        .unwrap_or(path)
        .display()
        .to_string()
}
