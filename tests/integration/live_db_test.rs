//! Live database integration tests.
//!
//! Exercises the validation and execution pipeline against a real
//! PostgreSQL server. Every statement is self-contained, so any
//! reachable database works; no fixture data is required. Skipped
//! unless DATABASE_URL is set.

use loanlens::config::ConnectionConfig;
use loanlens::db::{DatabaseClient, PostgresClient, Value};
use loanlens::query::QueryExecutor;
use loanlens::safety::{validate, ValidationResult};

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

/// Helper to create a test client.
async fn get_test_client() -> Option<PostgresClient> {
    let url = get_test_database_url()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    PostgresClient::connect(&config).await.ok()
}

#[tokio::test]
async fn test_validated_statement_executes_unchanged() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    // Identifier contains a forbidden keyword as a substring; it must
    // pass validation and run exactly as written.
    let sql = "SELECT 1 AS deleted_at";
    assert_eq!(validate(sql), ValidationResult::Allowed);

    let executor = QueryExecutor::new(&client, 500);
    let result = executor.execute(sql).await.unwrap();

    assert_eq!(result.columns[0].name, "deleted_at");
    assert_eq!(result.rows[0][0], Value::Int(1));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_executor_caps_rows_without_limit() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let executor = QueryExecutor::new(&client, 3);
    let result = executor
        .execute("SELECT n FROM generate_series(1, 10) AS g(n)")
        .await
        .unwrap();

    assert_eq!(result.row_count, 3);
    assert_eq!(result.total_rows, Some(10));
    assert!(result.was_truncated);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_executor_leaves_explicit_limit_alone() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    // The statement bounds itself, so the configured cap of 2 must not
    // apply and the database returns all 4 rows.
    let executor = QueryExecutor::new(&client, 2);
    let result = executor
        .execute("SELECT n FROM generate_series(1, 10) AS g(n) LIMIT 4")
        .await
        .unwrap();

    assert_eq!(result.row_count, 4);
    assert!(!result.was_truncated);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_scalar_types_convert() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query(
            "SELECT 42::bigint AS big, 2.5::float8 AS ratio, true AS flag, \
             'LN-1001' AS account, NULL AS missing",
            None,
        )
        .await
        .unwrap();

    assert_eq!(result.row_count, 1);
    let row = &result.rows[0];
    assert_eq!(row[0], Value::Int(42));
    assert_eq!(row[1], Value::Float(2.5));
    assert_eq!(row[2], Value::Bool(true));
    assert_eq!(row[3], Value::String("LN-1001".to_string()));
    assert!(row[4].is_null());

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_execution_time_recorded() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client.execute_query("SELECT 1", None).await.unwrap();

    assert!(
        !result.execution_time.is_zero(),
        "Expected non-zero execution time"
    );

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_introspect_schema_returns_consistent_metadata() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let schema = client.introspect_schema().await.unwrap();

    for table in &schema.tables {
        assert!(!table.name.is_empty());
        for column in &table.columns {
            assert!(!column.name.is_empty());
            assert!(!column.data_type.is_empty());
        }
        // Primary key columns must exist in the column list
        for pk in &table.primary_key {
            assert!(
                table.columns.iter().any(|c| &c.name == pk),
                "Primary key column '{}' missing from table '{}'",
                pk,
                table.name
            );
        }
    }

    for fk in &schema.foreign_keys {
        assert!(!fk.from_table.is_empty());
        assert!(!fk.to_table.is_empty());
        assert!(!fk.from_columns.is_empty());
        assert!(!fk.to_columns.is_empty());
    }

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_live_schema_formats_for_agent() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let schema = client.introspect_schema().await.unwrap();
    let formatted = schema.format_for_agent();

    assert!(formatted.starts_with("Database Schema:"));
    for table in &schema.tables {
        assert!(
            formatted.contains(&format!("Table: {}", table.name)),
            "Formatted schema missing table '{}'",
            table.name
        );
    }

    client.close().await.unwrap();
}
