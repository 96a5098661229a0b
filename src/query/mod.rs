//! Query execution for loanlens.
//!
//! This module isolates SQL execution and row capping from the HTTP
//! handlers and the agent loop.

pub mod executor;

pub use executor::QueryExecutor;

/// Default row cap applied to statements without an explicit LIMIT.
pub const DEFAULT_MAX_ROWS: usize = 500;
