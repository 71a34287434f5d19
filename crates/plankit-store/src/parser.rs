//! Plan file parser with per-file validation.
//!
//! Parses a plan file into a [`PlanRecord`] and validates:
//! - Status and priority values are valid enum variants (via serde).
//! - The plan does not depend on itself or name itself as parent.
//! - Every task has a non-empty title.
//!
//! Cross-file checks (duplicate ids, unknown dependencies, cycles) need the
//! whole plans directory and live in the core crate.

use thiserror::Error;

use crate::models::PlanRecord;

/// Errors that can occur while parsing a single plan file.
#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("plan {0} lists itself as a dependency")]
    SelfDependency(u64),

    #[error("plan {0} lists itself as its parent")]
    SelfParent(u64),

    #[error("task #{0} has an empty title")]
    EmptyTaskTitle(usize),
}

/// Parse and validate the contents of a plan file.
pub fn parse_plan_toml(content: &str) -> Result<PlanRecord, PlanParseError> {
    let plan: PlanRecord = toml::from_str(content)?;
    validate(&plan)?;
    Ok(plan)
}

fn validate(plan: &PlanRecord) -> Result<(), PlanParseError> {
    if let Some(id) = plan.id {
        if plan.dependencies.contains(&id) {
            return Err(PlanParseError::SelfDependency(id));
        }
        if plan.parent == Some(id) {
            return Err(PlanParseError::SelfParent(id));
        }
    }

    // Task numbers in messages are 1-based to match the CLI.
    for (idx, task) in plan.tasks.iter().enumerate() {
        if task.title.trim().is_empty() {
            return Err(PlanParseError::EmptyTaskTitle(idx + 1));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlanStatus, Priority};

    #[test]
    fn parse_minimal_plan() {
        let plan = parse_plan_toml("title = \"Just a title\"\n").expect("should parse");
        assert_eq!(plan.id, None);
        assert_eq!(plan.title.as_deref(), Some("Just a title"));
        assert_eq!(plan.status, PlanStatus::Pending);
        assert!(plan.tasks.is_empty());
    }

    #[test]
    fn parse_empty_file() {
        let plan = parse_plan_toml("").expect("an empty file is a valid draft");
        assert_eq!(plan, PlanRecord::default());
    }

    #[test]
    fn parse_full_plan() {
        let toml_str = r#"
id = 42
title = "Add user authentication"
goal = "Users can log in"
details = """
Use JWT.
Keep sessions short.
"""
status = "in_progress"
priority = "high"
parent = 3
dependencies = [1, 2]
issue = ["https://example.com/issues/9"]
created_at = "2026-01-05T10:00:00Z"

[[tasks]]
title = "Implement JWT module"
description = "sign() and verify()"
files = ["src/auth/jwt.rs"]

[[tasks]]
title = "Login endpoint"
done = true
"#;
        let plan = parse_plan_toml(toml_str).expect("should parse");
        assert_eq!(plan.id, Some(42));
        assert_eq!(plan.status, PlanStatus::InProgress);
        assert_eq!(plan.priority, Some(Priority::High));
        assert_eq!(plan.parent, Some(3));
        assert_eq!(plan.dependencies, vec![1, 2]);
        assert_eq!(plan.tasks.len(), 2);
        assert_eq!(plan.tasks[0].files, vec!["src/auth/jwt.rs"]);
        assert!(!plan.tasks[0].done);
        assert!(plan.tasks[1].done);
        assert_eq!(plan.tasks[1].description, "");
        assert!(plan.created_at.is_some());
        assert!(plan.details.as_deref().unwrap().contains("Keep sessions short."));
    }

    #[test]
    fn rejects_unknown_status() {
        let err = parse_plan_toml("status = \"finished\"\n").unwrap_err();
        assert!(
            matches!(err, PlanParseError::TomlError(_)),
            "expected TomlError, got: {err}"
        );
    }

    #[test]
    fn rejects_self_dependency() {
        let err = parse_plan_toml("id = 5\ndependencies = [4, 5]\n").unwrap_err();
        assert!(
            matches!(err, PlanParseError::SelfDependency(5)),
            "expected SelfDependency, got: {err}"
        );
    }

    #[test]
    fn rejects_self_parent() {
        let err = parse_plan_toml("id = 5\nparent = 5\n").unwrap_err();
        assert!(
            matches!(err, PlanParseError::SelfParent(5)),
            "expected SelfParent, got: {err}"
        );
    }

    #[test]
    fn rejects_empty_task_title() {
        let toml_str = r#"
[[tasks]]
title = "fine"

[[tasks]]
title = "  "
"#;
        let err = parse_plan_toml(toml_str).unwrap_err();
        assert!(
            matches!(err, PlanParseError::EmptyTaskTitle(2)),
            "expected EmptyTaskTitle(2), got: {err}"
        );
    }

    #[test]
    fn rejects_task_without_title() {
        let err = parse_plan_toml("[[tasks]]\ndescription = \"no title\"\n").unwrap_err();
        assert!(matches!(err, PlanParseError::TomlError(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = parse_plan_toml("this is not valid toml {{{").unwrap_err();
        assert!(
            matches!(err, PlanParseError::TomlError(_)),
            "expected TomlError, got: {err}"
        );
    }
}
