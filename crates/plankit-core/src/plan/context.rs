//! Render a resolved plan as a text block for humans and agents.

use std::path::Path;

use plankit_store::PlanRecord;

/// Render `plan`, loaded from `path`, as markdown-flavoured text.
///
/// Pure: performs no I/O. `path` is shown relative to `cwd` when it lives
/// underneath it. Absent optional fields are left out rather than rendered
/// as placeholders.
pub fn build_plan_context(plan: &PlanRecord, path: &Path, cwd: &Path) -> String {
    let mut lines: Vec<String> = Vec::new();

    let heading = match (plan.id, plan.title.as_deref().filter(|t| !t.is_empty())) {
        (Some(id), Some(title)) => format!("# Plan {id}: {title}"),
        (Some(id), None) => format!("# Plan {id}"),
        (None, Some(title)) => format!("# Plan: {title}"),
        (None, None) => "# Plan".to_owned(),
    };
    lines.push(heading);
    lines.push(String::new());

    let shown_path = path.strip_prefix(cwd).unwrap_or(path);
    lines.push(format!("- **File**: {}", shown_path.display()));
    lines.push(format!("- **Status**: {}", plan.status));
    if let Some(priority) = plan.priority {
        lines.push(format!("- **Priority**: {priority}"));
    }
    if let Some(parent) = plan.parent {
        lines.push(format!("- **Parent**: {parent}"));
    }
    if !plan.dependencies.is_empty() {
        let deps: Vec<String> = plan.dependencies.iter().map(u64::to_string).collect();
        lines.push(format!("- **Depends on**: {}", deps.join(", ")));
    }
    for issue in &plan.issue {
        lines.push(format!("- **Issue**: {issue}"));
    }

    push_section(&mut lines, "Goal", plan.goal.as_deref());
    push_section(&mut lines, "Details", plan.details.as_deref());

    if !plan.tasks.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "## Tasks ({}/{} done)",
            plan.done_task_count(),
            plan.tasks.len()
        ));
        lines.push(String::new());

        for (idx, task) in plan.tasks.iter().enumerate() {
            let mark = if task.done { "x" } else { " " };
            lines.push(format!("{}. [{mark}] {}", idx + 1, task.title));
            for desc_line in task.description.trim().lines() {
                lines.push(format!("   {desc_line}"));
            }
            if !task.files.is_empty() {
                lines.push(format!("   Files: {}", task.files.join(", ")));
            }
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn push_section(lines: &mut Vec<String>, heading: &str, body: Option<&str>) {
    let Some(body) = body.map(str::trim).filter(|b| !b.is_empty()) else {
        return;
    };
    lines.push(String::new());
    lines.push(format!("## {heading}"));
    lines.push(String::new());
    lines.extend(body.lines().map(str::to_owned));
}
