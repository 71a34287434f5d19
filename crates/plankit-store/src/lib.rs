//! On-disk plan files: format, validation, and the file-backed plan store.

pub mod config;
pub mod edit;
pub mod error;
pub mod fs;
pub mod models;
pub mod parser;

pub use config::StoreConfig;
pub use edit::{EditError, append_task, set_task_done};
pub use error::StoreError;
pub use fs::{FsPlanStore, PlanStore, plan_file_name, slugify};
pub use models::{PlanRecord, PlanStatus, Priority, TaskEntry};
pub use parser::{PlanParseError, parse_plan_toml};
