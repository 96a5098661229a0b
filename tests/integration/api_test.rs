//! End-to-end API tests over mock clients.
//!
//! Each test binds the full router on an ephemeral port and drives it
//! over real HTTP, so status codes, serialization, and the middleware
//! stack are all exercised.

use std::sync::Arc;

use loanlens::config::Config;
use loanlens::db::{Column, ColumnInfo, MockDatabaseClient, Schema, Table, Value};
use loanlens::llm::{MockLlmClient, SqlAgent};
use loanlens::server::{router, AppState, SharedState};
use serde_json::json;

fn sample_schema() -> Schema {
    Schema {
        tables: vec![
            Table {
                name: "loan_accounts".to_string(),
                columns: vec![
                    Column::new("account_number", "varchar(32)").nullable(false),
                    Column::new("status", "varchar(16)").nullable(false),
                    Column::new("principal", "numeric"),
                ],
                primary_key: vec!["account_number".to_string()],
            },
            Table {
                name: "repayments".to_string(),
                columns: vec![
                    Column::new("id", "bigint").nullable(false),
                    Column::new("account_number", "varchar(32)").nullable(false),
                    Column::new("amount", "numeric"),
                ],
                primary_key: vec!["id".to_string()],
            },
        ],
        foreign_keys: vec![],
    }
}

fn build_state(db: Arc<MockDatabaseClient>, client: MockLlmClient) -> SharedState {
    let config = Config::default();
    let agent = SqlAgent::new(Box::new(client));
    Arc::new(AppState::new(&config, db, agent))
}

async fn spawn_server(state: SharedState) -> String {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_execute_select_returns_rows() {
    let db = Arc::new(MockDatabaseClient::new().with_result(
        "SELECT 1 AS test",
        vec![ColumnInfo::new("test", "integer")],
        vec![vec![Value::Int(1)]],
    ));
    let base = spawn_server(build_state(db, MockLlmClient::new())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/execute"))
        .json(&json!({"sql": "SELECT 1 AS test"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();

    // All six envelope keys are always present
    let obj = body.as_object().unwrap();
    for key in ["success", "sql", "results", "count", "error", "note"] {
        assert!(obj.contains_key(key), "missing envelope key: {key}");
    }

    assert_eq!(body["success"], true);
    assert_eq!(body["sql"], "SELECT 1 AS test");
    assert_eq!(body["results"], json!([{"test": 1}]));
    assert_eq!(body["count"], 1);
    assert_eq!(body["error"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_execute_mutation_rejected_with_403() {
    let db = Arc::new(MockDatabaseClient::new());
    let base = spawn_server(build_state(db.clone(), MockLlmClient::new())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/execute"))
        .json(&json!({"sql": "DELETE FROM test"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "success": false,
            "sql": "DELETE FROM test",
            "results": [],
            "count": 0,
            "error": "Operation 'DELETE' is not allowed. Only SELECT queries are permitted.",
            "note": null,
        })
    );

    // Nothing may reach the database
    assert!(db.executed().is_empty());
}

#[tokio::test]
async fn test_execute_multiple_statements_rejected() {
    let db = Arc::new(MockDatabaseClient::new());
    let base = spawn_server(build_state(db.clone(), MockLlmClient::new())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/execute"))
        .json(&json!({"sql": "SELECT 1; SELECT 2"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Multiple statements are not allowed. Only single SELECT queries are permitted."
    );
    assert!(db.executed().is_empty());
}

#[tokio::test]
async fn test_execute_driver_error_is_500() {
    let db = Arc::new(
        MockDatabaseClient::new()
            .with_error("SELECT * FROM missing", "relation \"missing\" does not exist"),
    );
    let base = spawn_server(build_state(db, MockLlmClient::new())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/execute"))
        .json(&json!({"sql": "SELECT * FROM missing"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "relation \"missing\" does not exist");
    assert_eq!(body["sql"], "SELECT * FROM missing");
}

#[tokio::test]
async fn test_question_reexecutes_extracted_statement() {
    let statement = "SELECT status, COUNT(*) AS n FROM loan_accounts GROUP BY status";
    let db = Arc::new(
        MockDatabaseClient::new()
            .with_schema(sample_schema())
            .with_result(
                statement,
                vec![
                    ColumnInfo::new("status", "varchar"),
                    ColumnInfo::new("n", "bigint"),
                ],
                vec![
                    vec![Value::String("ACTIVE".to_string()), Value::Int(12)],
                    vec![Value::String("CLOSED".to_string()), Value::Int(5)],
                ],
            ),
    );
    let client = MockLlmClient::new()
        .then_tool_call("sql_db_list_tables", "{}")
        .then_tool_call("sql_db_schema", r#"{"table_names": "loan_accounts"}"#)
        .then_tool_call("sql_db_query", format!(r#"{{"query": "{statement}"}}"#))
        .then_text("There are 12 active and 5 closed accounts.");
    let base = spawn_server(build_state(db.clone(), client)).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/query"))
        .json(&json!({"question": "How many accounts per status?"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["sql"], statement);
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0], json!({"status": "ACTIVE", "n": 12}));
    assert_eq!(
        body["note"],
        "Query taken from step 3 of the agent trace."
    );

    // Once inside the agent loop, once re-executed by the handler
    let executed = db.executed();
    assert_eq!(executed.len(), 2);
    assert!(executed.iter().all(|(sql, _)| sql == statement));
}

#[tokio::test]
async fn test_question_notes_skipped_schema_lookups() {
    let db = Arc::new(MockDatabaseClient::new().with_schema(sample_schema()));
    let client = MockLlmClient::new()
        .then_tool_call(
            "sql_db_query",
            r#"{"query": "SELECT table_name FROM information_schema.tables"}"#,
        )
        .then_tool_call(
            "sql_db_query",
            r#"{"query": "SELECT COUNT(*) FROM repayments"}"#,
        )
        .then_text("There are 17 repayments.");
    let base = spawn_server(build_state(db, client)).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/query"))
        .json(&json!({"question": "How many repayments?"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["sql"], "SELECT COUNT(*) FROM repayments");
    assert_eq!(
        body["note"],
        "Query taken from step 2 of the agent trace; 1 schema-lookup step was skipped."
    );
}

#[tokio::test]
async fn test_question_falls_back_to_schema_query() {
    let db = Arc::new(MockDatabaseClient::new().with_schema(sample_schema()));
    let client = MockLlmClient::new()
        .then_tool_call(
            "sql_db_query",
            r#"{"query": "SELECT table_name FROM information_schema.tables"}"#,
        )
        .then_text("The database has loan_accounts and repayments tables.");
    let base = spawn_server(build_state(db, client)).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/query"))
        .json(&json!({"question": "What tables exist?"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["sql"], "SELECT table_name FROM information_schema.tables");
    assert_eq!(
        body["note"],
        "No data query found in the agent trace; ran the schema query from step 1 instead."
    );
}

#[tokio::test]
async fn test_question_without_statement_returns_answer_only() {
    let db = Arc::new(MockDatabaseClient::new().with_schema(sample_schema()));
    let client =
        MockLlmClient::new().then_text("I can only answer questions about the loan data.");
    let base = spawn_server(build_state(db.clone(), client)).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/query"))
        .json(&json!({"question": "Tell me a joke"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["sql"], serde_json::Value::Null);
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["count"], 0);
    assert_eq!(body["note"], "I can only answer questions about the loan data.");
    assert!(db.executed().is_empty());
}

#[tokio::test]
async fn test_question_extracted_mutation_is_rejected() {
    // The query tool refuses to run mutations, but the statement still
    // lands in the trace. Extraction picks it up and re-validation must
    // reject it before re-execution.
    let db = Arc::new(MockDatabaseClient::new().with_schema(sample_schema()));
    let client = MockLlmClient::new()
        .then_tool_call("sql_db_query", r#"{"query": "DELETE FROM loan_accounts"}"#)
        .then_text("I removed the accounts.");
    let base = spawn_server(build_state(db.clone(), client)).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/query"))
        .json(&json!({"question": "Delete everything"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["sql"], "DELETE FROM loan_accounts");
    assert_eq!(
        body["error"],
        "Operation 'DELETE' is not allowed. Only SELECT queries are permitted."
    );
    assert!(db.executed().is_empty());
}

#[tokio::test]
async fn test_question_empty_is_400() {
    let db = Arc::new(MockDatabaseClient::new());
    let base = spawn_server(build_state(db, MockLlmClient::new())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/query"))
        .json(&json!({"question": "  "}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Question cannot be empty");
    assert_eq!(body["sql"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_health_endpoint() {
    let db = Arc::new(MockDatabaseClient::new());
    let base = spawn_server(build_state(db, MockLlmClient::new())).await;

    let response = reqwest::Client::new()
        .get(format!("{base}/api/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["message"], "Backend is running");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_tables_endpoint() {
    let db = Arc::new(MockDatabaseClient::new().with_schema(sample_schema()));
    let base = spawn_server(build_state(db, MockLlmClient::new())).await;

    let response = reqwest::Client::new()
        .get(format!("{base}/api/tables"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(body["tables"], json!(["loan_accounts", "repayments"]));
}

#[tokio::test]
async fn test_table_columns_endpoint() {
    let db = Arc::new(MockDatabaseClient::new().with_schema(sample_schema()));
    let base = spawn_server(build_state(db, MockLlmClient::new())).await;

    let response = reqwest::Client::new()
        .get(format!("{base}/api/table/loan_accounts"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["table"], "loan_accounts");
    assert_eq!(
        body["columns"][0],
        json!({"name": "account_number", "type": "varchar(32)", "nullable": false})
    );

    let response = reqwest::Client::new()
        .get(format!("{base}/api/table/ghosts"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let db = Arc::new(MockDatabaseClient::new());
    let base = spawn_server(build_state(db, MockLlmClient::new())).await;

    let response = reqwest::Client::new()
        .get(format!("{base}/api/health"))
        .header("Origin", "http://dashboard.example")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
