//! Database abstraction layer for loanlens.
//!
//! Provides a trait-based interface for database operations, allowing
//! different database backends to be used interchangeably.

mod mock;
mod postgres;
mod schema;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use schema::{Column, ForeignKey, Schema, Table};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with LoanlensError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Introspects the database schema, returning table and relationship information.
    async fn introspect_schema(&self) -> Result<Schema>;

    /// Executes a SQL query and returns the results.
    ///
    /// When `max_rows` is set, at most that many rows are returned and
    /// the result records how many rows the statement actually
    /// produced. The statement text itself is never modified.
    async fn execute_query(&self, sql: &str, max_rows: Option<usize>) -> Result<QueryResult>;

    /// Checks that the connection is alive.
    async fn ping(&self) -> Result<()>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
