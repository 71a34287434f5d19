//! Surgical edits to plan files.
//!
//! Uses `toml_edit` so that comments, key order and formatting in
//! hand-written plan files survive every write.

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use toml_edit::{ArrayOfTables, DocumentMut, Item, Table, value};

use crate::models::{PlanStatus, TaskEntry};

/// Errors from editing a plan document.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("not a valid TOML document: {0}")]
    Parse(#[from] toml_edit::TomlError),

    #[error("`tasks` is not an array of tables")]
    TasksNotArray,

    #[error("task {index} does not exist (plan has {count} tasks)")]
    TaskOutOfRange { index: usize, count: usize },
}

/// Append a `[[tasks]]` entry and bump `updated_at`.
pub fn append_task(content: &str, task: &TaskEntry, now: DateTime<Utc>) -> Result<String, EditError> {
    let mut doc: DocumentMut = content.parse()?;

    let mut table = Table::new();
    table.insert("title", value(task.title.as_str()));
    if !task.description.is_empty() {
        table.insert("description", value(task.description.as_str()));
    }
    if task.done {
        table.insert("done", value(true));
    }
    if !task.files.is_empty() {
        let files: toml_edit::Array = task.files.iter().map(String::as_str).collect();
        table.insert("files", value(files));
    }

    match tasks_mut(&mut doc)? {
        Some(tasks) => tasks.push(table),
        None => {
            let mut tasks = ArrayOfTables::new();
            tasks.push(table);
            doc.insert("tasks", Item::ArrayOfTables(tasks));
        }
    }

    touch_updated_at(&mut doc, now);
    Ok(doc.to_string())
}

/// Mark the task at 1-based `number` as done and bump `updated_at`.
///
/// When this leaves every task done, the plan `status` becomes `done` as
/// well. Returns the new document and whether that happened.
pub fn set_task_done(
    content: &str,
    number: usize,
    now: DateTime<Utc>,
) -> Result<(String, bool), EditError> {
    let mut doc: DocumentMut = content.parse()?;

    let tasks = match tasks_mut(&mut doc)? {
        Some(tasks) => tasks,
        None => {
            return Err(EditError::TaskOutOfRange {
                index: number,
                count: 0,
            });
        }
    };

    let count = tasks.len();
    let task = number
        .checked_sub(1)
        .and_then(|idx| tasks.get_mut(idx))
        .ok_or(EditError::TaskOutOfRange {
            index: number,
            count,
        })?;
    task.insert("done", value(true));

    let all_done = tasks
        .iter()
        .all(|t| t.get("done").and_then(Item::as_bool).unwrap_or(false));
    if all_done {
        doc.insert("status", value(PlanStatus::Done.to_string()));
    }

    touch_updated_at(&mut doc, now);
    Ok((doc.to_string(), all_done))
}

/// The `tasks` array, rewritten to `[[tasks]]` form when the file uses an
/// inline array of tables. `None` when the key is absent.
fn tasks_mut(doc: &mut DocumentMut) -> Result<Option<&mut ArrayOfTables>, EditError> {
    let Some(item) = doc.get_mut("tasks") else {
        return Ok(None);
    };
    if let Some(empty) = item.as_array().map(toml_edit::Array::is_empty) {
        *item = if empty {
            Item::ArrayOfTables(ArrayOfTables::new())
        } else {
            std::mem::take(item)
                .into_array_of_tables()
                .map(Item::ArrayOfTables)
                .map_err(|_| EditError::TasksNotArray)?
        };
    }
    item.as_array_of_tables_mut()
        .map(Some)
        .ok_or(EditError::TasksNotArray)
}

fn touch_updated_at(doc: &mut DocumentMut, now: DateTime<Utc>) {
    // Root values always render above the first table header, so a new key
    // never lands inside `[[tasks]]`.
    doc.insert(
        "updated_at",
        value(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::parser::parse_plan_toml;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    const PLAN: &str = r#"# Auth work, keep this comment
id = 4
title = "Auth"
status = "in_progress"

[[tasks]]
title = "one"
# first task comment

[[tasks]]
title = "two"
done = true
"#;

    #[test]
    fn append_task_preserves_comments() {
        let task = TaskEntry {
            title: "three".to_owned(),
            description: "the third".to_owned(),
            done: false,
            files: vec!["src/a.rs".to_owned(), "src/b.rs".to_owned()],
        };
        let out = append_task(PLAN, &task, now()).unwrap();

        assert!(out.contains("# Auth work, keep this comment"));
        assert!(out.contains("# first task comment"));

        let parsed = parse_plan_toml(&out).expect("should parse after edit");
        assert_eq!(parsed.tasks.len(), 3);
        assert_eq!(parsed.tasks[2].title, "three");
        assert_eq!(parsed.tasks[2].description, "the third");
        assert_eq!(parsed.tasks[2].files, vec!["src/a.rs", "src/b.rs"]);
        assert_eq!(parsed.updated_at, Some(now()));
    }

    #[test]
    fn append_task_to_plan_without_tasks() {
        let task = TaskEntry {
            title: "first".to_owned(),
            ..Default::default()
        };
        let out = append_task("id = 1\ntitle = \"Empty\"\n", &task, now()).unwrap();
        let parsed = parse_plan_toml(&out).unwrap();
        assert_eq!(parsed.tasks.len(), 1);
        assert_eq!(parsed.tasks[0].title, "first");
        assert_eq!(parsed.title.as_deref(), Some("Empty"));
    }

    #[test]
    fn append_task_rejects_scalar_tasks_key() {
        let task = TaskEntry {
            title: "x".to_owned(),
            ..Default::default()
        };
        let err = append_task("tasks = 3\n", &task, now()).unwrap_err();
        assert!(matches!(err, EditError::TasksNotArray));
    }

    #[test]
    fn edits_accept_inline_task_array() {
        let content = "id = 5\ntitle = \"X\"\ntasks = [{ title = \"a\" }, { title = \"b\", done = true }]\n";
        assert_eq!(parse_plan_toml(content).unwrap().tasks.len(), 2);

        let task = TaskEntry {
            title: "c".to_owned(),
            ..Default::default()
        };
        let out = append_task(content, &task, now()).unwrap();
        let parsed = parse_plan_toml(&out).unwrap();
        let titles: Vec<&str> = parsed.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert!(parsed.tasks[1].done);

        let (out, all_done) = set_task_done(content, 1, now()).unwrap();
        assert!(all_done);
        let parsed = parse_plan_toml(&out).unwrap();
        assert!(parsed.tasks.iter().all(|t| t.done));
        assert_eq!(parsed.status, PlanStatus::Done);
        assert_eq!(parsed.title.as_deref(), Some("X"));
    }

    #[test]
    fn edits_accept_empty_inline_task_array() {
        let task = TaskEntry {
            title: "first".to_owned(),
            ..Default::default()
        };
        let out = append_task("id = 1\ntasks = []\n", &task, now()).unwrap();
        let parsed = parse_plan_toml(&out).unwrap();
        assert_eq!(parsed.tasks.len(), 1);
        assert_eq!(parsed.tasks[0].title, "first");

        let err = set_task_done("id = 1\ntasks = []\n", 1, now()).unwrap_err();
        assert!(matches!(err, EditError::TaskOutOfRange { index: 1, count: 0 }));
    }

    #[test]
    fn edits_reject_array_of_scalars() {
        let err = set_task_done("tasks = [1, 2]\n", 1, now()).unwrap_err();
        assert!(matches!(err, EditError::TasksNotArray));
    }

    #[test]
    fn set_task_done_marks_plan_done_when_last_task_finishes() {
        let (out, all_done) = set_task_done(PLAN, 1, now()).unwrap();
        assert!(all_done);

        let parsed = parse_plan_toml(&out).unwrap();
        assert!(parsed.tasks.iter().all(|t| t.done));
        assert_eq!(parsed.status, PlanStatus::Done);
        assert_eq!(parsed.updated_at, Some(now()));
        assert!(out.contains("# first task comment"));
    }

    #[test]
    fn set_task_done_leaves_status_when_tasks_remain() {
        let content = "status = \"pending\"\n\n[[tasks]]\ntitle = \"a\"\n\n[[tasks]]\ntitle = \"b\"\n";
        let (out, all_done) = set_task_done(content, 2, now()).unwrap();
        assert!(!all_done);

        let parsed = parse_plan_toml(&out).unwrap();
        assert!(!parsed.tasks[0].done);
        assert!(parsed.tasks[1].done);
        assert_eq!(parsed.status, PlanStatus::Pending);
    }

    #[test]
    fn set_task_done_out_of_range() {
        let err = set_task_done(PLAN, 3, now()).unwrap_err();
        assert!(matches!(err, EditError::TaskOutOfRange { index: 3, count: 2 }));

        let err = set_task_done(PLAN, 0, now()).unwrap_err();
        assert!(matches!(err, EditError::TaskOutOfRange { index: 0, .. }));

        let err = set_task_done("id = 1\n", 1, now()).unwrap_err();
        assert!(matches!(err, EditError::TaskOutOfRange { count: 0, .. }));
    }
}
