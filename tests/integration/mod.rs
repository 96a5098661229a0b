//! Integration tests for loanlens.

pub mod api_test;
pub mod live_db_test;
