use std::sync::Arc;

use crate::plan::PlanContext;
use crate::report::StructuredSink;

/// Everything a tool call may touch.
#[derive(Clone)]
pub struct ToolContext {
    pub plans: PlanContext,
    pub sink: Arc<dyn StructuredSink>,
}

impl ToolContext {
    pub fn new(plans: PlanContext, sink: Arc<dyn StructuredSink>) -> Self {
        Self { plans, sink }
    }
}
