//! Row-capped query execution.
//!
//! The executor runs statements that have already passed validation.
//! It decides whether a row cap applies and hands the statement to the
//! database client unchanged. Capping happens on the result side, so
//! the executed text is always exactly the validated text.

use std::time::Instant;

use crate::db::{DatabaseClient, QueryResult};
use crate::error::Result;
use crate::safety;

/// Executes validated statements with a configurable row cap.
///
/// Statements that carry their own LIMIT clause run uncapped; the
/// author already bounded the result. Everything else is capped at
/// `max_rows`, with the result recording how many rows the statement
/// actually produced.
pub struct QueryExecutor<'a> {
    db: &'a dyn DatabaseClient,
    max_rows: usize,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new executor over the given client.
    pub fn new(db: &'a dyn DatabaseClient, max_rows: usize) -> Self {
        Self { db, max_rows }
    }

    /// Executes a validated statement and returns its result.
    ///
    /// The caller is responsible for validation; this method does not
    /// re-check the statement.
    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        let cap = self.cap_for(sql);
        tracing::debug!(
            "Executing query ({} chars, row cap: {:?})",
            sql.len(),
            cap
        );

        let start = Instant::now();
        let result = self.db.execute_query(sql, cap).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(query_result) => {
                tracing::debug!(
                    "Query returned {} rows in {}ms{}",
                    query_result.row_count,
                    elapsed.as_millis(),
                    if query_result.was_truncated {
                        " (truncated)"
                    } else {
                        ""
                    }
                );
            }
            Err(e) => {
                tracing::warn!("Query failed after {}ms: {}", elapsed.as_millis(), e);
            }
        }

        result
    }

    fn cap_for(&self, sql: &str) -> Option<usize> {
        if safety::has_explicit_limit(sql) {
            None
        } else {
            Some(self.max_rows)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ColumnInfo, MockDatabaseClient, Row, Value};

    fn id_column() -> Vec<ColumnInfo> {
        vec![ColumnInfo {
            name: "id".to_string(),
            data_type: "integer".to_string(),
        }]
    }

    fn int_rows(n: i64) -> Vec<Row> {
        (1..=n).map(|i| vec![Value::Int(i)]).collect()
    }

    #[tokio::test]
    async fn test_cap_applied_without_explicit_limit() {
        let db = MockDatabaseClient::new().with_rows(id_column(), int_rows(10));
        let executor = QueryExecutor::new(&db, 3);

        let result = executor
            .execute("SELECT id FROM loan_accounts")
            .await
            .unwrap();

        assert_eq!(result.row_count, 3);
        assert_eq!(result.total_rows, Some(10));
        assert!(result.was_truncated);
        assert_eq!(
            db.executed(),
            vec![("SELECT id FROM loan_accounts".to_string(), Some(3))]
        );
    }

    #[tokio::test]
    async fn test_explicit_limit_runs_uncapped() {
        let db = MockDatabaseClient::new().with_rows(id_column(), int_rows(10));
        let executor = QueryExecutor::new(&db, 3);

        let result = executor
            .execute("SELECT id FROM loan_accounts LIMIT 10")
            .await
            .unwrap();

        assert_eq!(result.row_count, 10);
        assert!(!result.was_truncated);
        assert_eq!(db.executed()[0].1, None);
    }

    #[tokio::test]
    async fn test_limit_in_literal_does_not_disable_cap() {
        let db = MockDatabaseClient::new().with_rows(id_column(), int_rows(10));
        let executor = QueryExecutor::new(&db, 3);

        executor
            .execute("SELECT id FROM loan_accounts WHERE note = 'limit reached'")
            .await
            .unwrap();

        assert_eq!(db.executed()[0].1, Some(3));
    }

    #[tokio::test]
    async fn test_limit_in_comment_does_not_disable_cap() {
        let db = MockDatabaseClient::new().with_rows(id_column(), int_rows(10));
        let executor = QueryExecutor::new(&db, 3);

        executor
            .execute("SELECT id FROM loan_accounts -- no limit here")
            .await
            .unwrap();

        assert_eq!(db.executed()[0].1, Some(3));
    }

    #[tokio::test]
    async fn test_statement_text_passed_through_unchanged() {
        let db = MockDatabaseClient::new();
        let executor = QueryExecutor::new(&db, 500);

        let sql = "SELECT   principal ,status\nFROM loan_accounts  WHERE status = 'ACTIVE'";
        executor.execute(sql).await.unwrap();

        assert_eq!(db.executed()[0].0, sql);
    }

    #[tokio::test]
    async fn test_execution_error_propagates() {
        let db = MockDatabaseClient::new().with_error(
            "SELECT * FROM missing",
            "relation \"missing\" does not exist",
        );
        let executor = QueryExecutor::new(&db, 500);

        let err = executor.execute("SELECT * FROM missing").await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_result_under_cap_not_truncated() {
        let db = MockDatabaseClient::new().with_rows(id_column(), int_rows(2));
        let executor = QueryExecutor::new(&db, 500);

        let result = executor
            .execute("SELECT id FROM loan_accounts")
            .await
            .unwrap();

        assert_eq!(result.row_count, 2);
        assert!(!result.was_truncated);
    }
}
