//! Plan resolution and rendering, plan services, structured reporting, and
//! the agent-facing tool catalog built on top of them.

pub mod plan;
pub mod report;
pub mod tools;
