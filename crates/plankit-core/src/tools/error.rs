use thiserror::Error;

use plankit_store::StoreError;

use crate::plan::{ResolveError, ResolveErrorKind, ServiceError};

/// Errors from tool lookup and invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool {0} is registered twice")]
    DuplicateTool(String),

    #[error("failed to encode tool result: {0}")]
    Encode(#[source] serde_json::Error),
}

/// What went wrong, coarsely. Transports map this onto status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    NotFound,
    Ambiguous,
    InvalidArguments,
    UnknownTool,
    Internal,
}

impl ToolError {
    pub fn invalid_arguments(tool: &str, source: serde_json::Error) -> Self {
        Self::InvalidArguments {
            tool: tool.to_owned(),
            source,
        }
    }

    pub fn kind(&self) -> ToolErrorKind {
        match self {
            Self::Resolve(e) | Self::Service(ServiceError::Resolve(e)) => match e.kind() {
                ResolveErrorKind::NotFound => ToolErrorKind::NotFound,
                ResolveErrorKind::Ambiguous => ToolErrorKind::Ambiguous,
                ResolveErrorKind::Store => ToolErrorKind::Internal,
            },
            Self::Service(
                ServiceError::EmptyTitle
                | ServiceError::EmptyTaskTitle
                | ServiceError::UnknownPlan(_)
                | ServiceError::TaskOutOfRange { .. },
            ) => ToolErrorKind::InvalidArguments,
            Self::InvalidArguments { .. } => ToolErrorKind::InvalidArguments,
            Self::UnknownTool(_) => ToolErrorKind::UnknownTool,
            Self::Service(ServiceError::Store(_))
            | Self::Store(_)
            | Self::DuplicateTool(_)
            | Self::Encode(_) => ToolErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_errors_keep_their_kind_through_the_service_layer() {
        let not_found = || ResolveError::NotFound {
            reference: "7".to_owned(),
        };
        assert_eq!(ToolError::from(not_found()).kind(), ToolErrorKind::NotFound);
        assert_eq!(
            ToolError::from(ServiceError::from(not_found())).kind(),
            ToolErrorKind::NotFound
        );

        let ambiguous = ResolveError::Ambiguous {
            identifier: "auth".to_owned(),
            candidates: vec![],
        };
        assert_eq!(
            ToolError::from(ServiceError::from(ambiguous)).kind(),
            ToolErrorKind::Ambiguous
        );
    }

    #[test]
    fn caller_mistakes_are_invalid_arguments() {
        let err = ToolError::from(ServiceError::TaskOutOfRange {
            number: 4,
            count: 2,
        });
        assert_eq!(err.kind(), ToolErrorKind::InvalidArguments);
        assert_eq!(
            ToolError::UnknownTool("nope".to_owned()).kind(),
            ToolErrorKind::UnknownTool
        );
    }
}
