//! loanlens - a loan-portfolio analytics backend.
//!
//! This library exposes the core modules for the binary and for
//! integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod query;
pub mod response;
pub mod safety;
pub mod server;
pub mod trace;
