use serde::Serialize;
use serde_json::Value;

use super::error::ToolError;

/// The uniform result every tool returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult<T> {
    /// Human/agent-readable rendering.
    pub text: String,
    /// Machine-readable payload.
    pub data: T,
    /// One-line summary of what happened.
    pub message: String,
}

impl<T: Serialize> ToolResult<T> {
    pub fn new(text: impl Into<String>, data: T, message: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data,
            message: message.into(),
        }
    }

    /// Erase the payload type so results from different tools share a type.
    pub fn into_json(self) -> Result<ToolResult<Value>, ToolError> {
        Ok(ToolResult {
            data: serde_json::to_value(&self.data).map_err(ToolError::Encode)?,
            text: self.text,
            message: self.message,
        })
    }
}
