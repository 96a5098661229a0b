//! HTTP API for loanlens.
//!
//! Exposes the two query pipelines and a few schema endpoints for the
//! dashboard front end. Direct mode validates and executes submitted
//! SQL; natural-language mode runs the agent, extracts the
//! authoritative statement from its trace, and re-executes it so the
//! returned rows always come from a statement this service ran itself.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::db::DatabaseClient;
use crate::error::{LoanlensError, Result};
use crate::llm::{LlmProvider, SqlAgent};
use crate::query::QueryExecutor;
use crate::response::{introspection_fallback_note, provenance_note, ApiResponse};
use crate::safety::{self, ValidationResult};
use crate::trace::{self, Extraction};

/// Shared state behind every handler.
pub struct AppState {
    db: Arc<dyn DatabaseClient>,
    agent: Mutex<SqlAgent>,
    provider: LlmProvider,
    query_tools: Vec<String>,
    max_rows: usize,
}

/// State handle as stored in the router.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Assembles the application state from configuration and a
    /// connected database client.
    pub fn new(config: &Config, db: Arc<dyn DatabaseClient>, agent: SqlAgent) -> Self {
        Self {
            db,
            agent: Mutex::new(agent),
            provider: config.agent.provider,
            query_tools: config.extractor.query_tools.clone(),
            max_rows: config.query.max_rows,
        }
    }
}

/// Builds the API router with permissive CORS for the dashboard.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/tables", get(list_tables))
        .route("/api/table/:name", get(table_columns))
        .route("/api/execute", post(execute))
        .route("/api/query", post(query))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Binds the listener and serves the API until shutdown.
pub async fn serve(state: SharedState, bind: &str) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| LoanlensError::config(format!("Failed to bind {}: {}", bind, e)))?;

    tracing::info!("Listening on http://{}", bind);

    axum::serve(listener, app)
        .await
        .map_err(|e| LoanlensError::internal(format!("Server error: {}", e)))?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    #[serde(default)]
    sql: String,
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    #[serde(default)]
    question: String,
}

/// POST /api/execute: validate and run a submitted statement.
async fn execute(
    State(state): State<SharedState>,
    Json(request): Json<ExecuteRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let start = Instant::now();
    tracing::debug!(sql_len = request.sql.len(), "Direct execution request");

    match safety::validate(&request.sql) {
        ValidationResult::Rejected(reason) => {
            tracing::info!(
                reason = %reason.message(),
                duration_ms = start.elapsed().as_millis(),
                "Statement rejected"
            );
            (
                StatusCode::FORBIDDEN,
                Json(ApiResponse::rejected(&request.sql, &reason)),
            )
        }
        ValidationResult::Allowed => {
            let executor = QueryExecutor::new(state.db.as_ref(), state.max_rows);
            match executor.execute(&request.sql).await {
                Ok(result) => {
                    tracing::info!(
                        rows = result.row_count,
                        duration_ms = start.elapsed().as_millis(),
                        "Direct execution complete"
                    );
                    (
                        StatusCode::OK,
                        Json(ApiResponse::executed(&request.sql, &result)),
                    )
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Direct execution failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ApiResponse::execution_failed(&request.sql, e.message())),
                    )
                }
            }
        }
    }
}

/// POST /api/query: answer a natural-language question.
///
/// Runs the agent, extracts the authoritative statement from the
/// recorded trace, re-validates it, and re-executes it fresh. When the
/// trace carries no statement, the agent's own answer is returned as a
/// note-only success.
async fn query(
    State(state): State<SharedState>,
    Json(request): Json<QueryRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let start = Instant::now();
    let question = request.question.trim();

    if question.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::failure("Question cannot be empty")),
        );
    }

    tracing::info!(question_len = question.len(), "Question received");

    let schema = match state.db.introspect_schema().await {
        Ok(schema) => schema,
        Err(e) => {
            tracing::error!(error = %e, "Schema introspection failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::agent_failed(e.message())),
            );
        }
    };

    let run = {
        let mut agent = state.agent.lock().await;
        agent.answer(question, &schema, state.db.as_ref()).await
    };

    let run = match run {
        Ok(run) => run,
        Err(e) => {
            tracing::warn!(error = %e, "Agent run failed");
            let status = if e.message().contains("timed out") {
                StatusCode::GATEWAY_TIMEOUT
            } else {
                StatusCode::BAD_REQUEST
            };
            return (status, Json(ApiResponse::agent_failed(e.message())));
        }
    };

    let extraction = trace::extract(&run.trace, &state.query_tools);
    tracing::debug!(
        trace_len = run.trace.len(),
        extraction = ?extraction.step_index(),
        "Trace extraction complete"
    );

    let (status, response) = match extraction {
        Extraction::Data {
            statement,
            step_index,
            skipped_introspection,
        } => {
            let note = provenance_note(step_index, skipped_introspection);
            run_extracted(&state, &statement, note).await
        }
        Extraction::Introspection {
            statement,
            step_index,
        } => {
            let note = introspection_fallback_note(step_index);
            run_extracted(&state, &statement, note).await
        }
        Extraction::Empty => (
            StatusCode::OK,
            ApiResponse::answer_only(&run.final_answer),
        ),
    };

    tracing::info!(
        success = response.success,
        duration_ms = start.elapsed().as_millis(),
        "Question handled"
    );

    (status, Json(response))
}

/// Re-validates and re-executes an extracted statement, attaching the
/// provenance note.
async fn run_extracted(
    state: &AppState,
    statement: &str,
    note: String,
) -> (StatusCode, ApiResponse) {
    if let ValidationResult::Rejected(reason) = safety::validate(statement) {
        tracing::info!(reason = %reason.message(), "Extracted statement rejected");
        return (
            StatusCode::FORBIDDEN,
            ApiResponse::rejected(statement, &reason),
        );
    }

    let executor = QueryExecutor::new(state.db.as_ref(), state.max_rows);
    match executor.execute(statement).await {
        Ok(result) => (
            StatusCode::OK,
            ApiResponse::executed(statement, &result).with_note(note),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Extracted statement failed on re-execution");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::execution_failed(statement, e.message()),
            )
        }
    }
}

/// GET /api/health: liveness plus database reachability.
async fn health(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let database = match state.db.ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("unreachable: {}", e.message()),
    };

    Json(serde_json::json!({
        "status": "healthy",
        "message": "Backend is running",
        "database": database,
        "provider": state.provider.as_str(),
    }))
}

/// GET /api/tables: table names from schema introspection.
async fn list_tables(
    State(state): State<SharedState>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.db.introspect_schema().await {
        Ok(schema) => {
            let tables = schema.table_names();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "success": true,
                    "tables": tables,
                    "count": tables.len(),
                })),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "success": false,
                "error": e.message(),
            })),
        ),
    }
}

/// GET /api/table/{name}: column listing for one table.
async fn table_columns(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    let schema = match state.db.introspect_schema().await {
        Ok(schema) => schema,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "success": false,
                    "error": e.message(),
                })),
            );
        }
    };

    match schema.table(&name) {
        Some(table) => {
            let columns: Vec<serde_json::Value> = table
                .columns
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "name": c.name,
                        "type": c.data_type,
                        "nullable": c.is_nullable,
                    })
                })
                .collect();

            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "success": true,
                    "table": name,
                    "columns": columns,
                })),
            )
        }
        None => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "error": format!("Table '{}' not found", name),
            })),
        ),
    }
}
