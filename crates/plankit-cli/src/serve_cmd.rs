use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use plankit_core::tools::{ToolContext, ToolError, ToolErrorKind, ToolRegistry};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
}

impl From<ToolError> for AppError {
    fn from(err: ToolError) -> Self {
        let status = match err.kind() {
            ToolErrorKind::NotFound | ToolErrorKind::UnknownTool => StatusCode::NOT_FOUND,
            ToolErrorKind::Ambiguous => StatusCode::CONFLICT,
            ToolErrorKind::InvalidArguments => StatusCode::BAD_REQUEST,
            ToolErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    registry: Arc<ToolRegistry>,
    ctx: ToolContext,
}

pub fn build_router(registry: Arc<ToolRegistry>, ctx: ToolContext) -> Router {
    Router::new()
        .route("/api/tools", get(list_tools))
        .route("/api/tools/{name}", post(call_tool))
        .layer(CorsLayer::permissive())
        .with_state(AppState { registry, ctx })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(ctx: ToolContext, bind: &str, port: u16) -> Result<()> {
    let registry = Arc::new(ToolRegistry::builtin()?);
    let app = build_router(registry, ctx);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("plankit serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("plankit serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C; shutting down");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_tools(State(state): State<AppState>) -> axum::response::Response {
    Json(state.registry.describe()).into_response()
}

/// An empty body is treated as no arguments.
async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: String,
) -> Result<axum::response::Response, AppError> {
    let args: Value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body)
            .map_err(|e| AppError::bad_request(format!("request body is not valid JSON: {e}")))?
    };
    let result = state.registry.call(&name, &state.ctx, args).await?;
    Ok(Json(result).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
