//! Mock database clients for testing.
//!
//! Provides in-memory implementations of [`DatabaseClient`] so the
//! executor, agent tools, and HTTP handlers can be tested without a
//! live database.

use super::{ColumnInfo, DatabaseClient, QueryResult, Row, Schema, Value};
use crate::error::{LoanlensError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// A mock database client that returns scripted results.
///
/// Results can be registered per statement with [`with_result`] and
/// [`with_error`]; anything else gets the default payload set by
/// [`with_rows`] (or a single echo row). Row caps are honored the same
/// way the real client honors them, so truncation behavior can be
/// exercised in tests.
///
/// [`with_result`]: MockDatabaseClient::with_result
/// [`with_error`]: MockDatabaseClient::with_error
/// [`with_rows`]: MockDatabaseClient::with_rows
pub struct MockDatabaseClient {
    schema: Schema,
    columns: Vec<ColumnInfo>,
    rows: Vec<Row>,
    canned: HashMap<String, (Vec<ColumnInfo>, Vec<Row>)>,
    errors: HashMap<String, String>,
    executed: Mutex<Vec<(String, Option<usize>)>>,
}

impl MockDatabaseClient {
    /// Creates a new mock client with an empty schema.
    pub fn new() -> Self {
        Self {
            schema: Schema::default(),
            columns: vec![ColumnInfo {
                name: "result".to_string(),
                data_type: "text".to_string(),
            }],
            rows: vec![vec![Value::String("mock row".to_string())]],
            canned: HashMap::new(),
            errors: HashMap::new(),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Sets the schema returned by introspection.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Sets the default result payload for statements without a
    /// scripted result.
    pub fn with_rows(mut self, columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        self.columns = columns;
        self.rows = rows;
        self
    }

    /// Registers a scripted result for an exact statement text.
    pub fn with_result(mut self, sql: &str, columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        self.canned.insert(sql.to_string(), (columns, rows));
        self
    }

    /// Registers a scripted failure for an exact statement text.
    pub fn with_error(mut self, sql: &str, message: &str) -> Self {
        self.errors.insert(sql.to_string(), message.to_string());
        self
    }

    /// Returns the statements executed so far, with the row cap each
    /// call was given.
    pub fn executed(&self) -> Vec<(String, Option<usize>)> {
        self.executed
            .lock()
            .expect("mock state lock poisoned")
            .clone()
    }

    fn build_result(columns: Vec<ColumnInfo>, rows: Vec<Row>, max_rows: Option<usize>) -> QueryResult {
        let total = rows.len();
        let cap = max_rows.unwrap_or(usize::MAX);
        let kept: Vec<Row> = rows.into_iter().take(cap).collect();
        let row_count = kept.len();

        QueryResult {
            columns,
            rows: kept,
            execution_time: Duration::from_millis(1),
            row_count,
            total_rows: Some(total),
            was_truncated: total > row_count,
        }
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn execute_query(&self, sql: &str, max_rows: Option<usize>) -> Result<QueryResult> {
        self.executed
            .lock()
            .expect("mock state lock poisoned")
            .push((sql.to_string(), max_rows));

        if let Some(message) = self.errors.get(sql) {
            return Err(LoanlensError::query(message.clone()));
        }

        let (columns, rows) = self
            .canned
            .get(sql)
            .cloned()
            .unwrap_or_else(|| (self.columns.clone(), self.rows.clone()));

        Ok(Self::build_result(columns, rows, max_rows))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A database client where every operation fails.
///
/// Used to test error paths without a real connection.
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a failing client whose errors carry the given message.
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Err(LoanlensError::connection(self.message.clone()))
    }

    async fn execute_query(&self, _sql: &str, _max_rows: Option<usize>) -> Result<QueryResult> {
        Err(LoanlensError::query(self.message.clone()))
    }

    async fn ping(&self) -> Result<()> {
        Err(LoanlensError::connection(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
