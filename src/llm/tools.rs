//! Agent tool definitions for function calling.
//!
//! The agent works the database through four read-only tools: list
//! tables, inspect table schemas, check a query, and run a query. The
//! handlers live in the agent loop; this module defines the shapes the
//! LLM sees.

use serde::{Deserialize, Serialize};

/// Tool definition for LLM function calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Input for the sql_db_schema tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaToolInput {
    /// Comma-separated table names.
    pub table_names: String,
}

/// Input for the sql_db_query and sql_db_query_checker tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryToolInput {
    pub query: String,
}

/// Returns the tool definitions available to the agent.
pub fn agent_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "sql_db_list_tables".to_string(),
            description: "List all tables in the database. Takes no input. Returns a \
                          comma-separated list of table names."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: "sql_db_schema".to_string(),
            description: "Get the columns, keys, and relationships for the given tables. \
                          Input is a comma-separated list of table names. Call \
                          sql_db_list_tables first to learn which tables exist."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "table_names": {
                        "type": "string",
                        "description": "Comma-separated table names, e.g. \"customers, loan_accounts\""
                    }
                },
                "required": ["table_names"]
            }),
        },
        ToolDefinition {
            name: "sql_db_query_checker".to_string(),
            description: "Check a SELECT statement for policy violations before running it. \
                          Returns the statement unchanged if it is acceptable, or the \
                          rejection reason if it is not."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The SQL statement to check"
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: "sql_db_query".to_string(),
            description: "Execute a single SELECT statement against the database and return \
                          the rows. Only read statements are accepted; anything else is \
                          rejected with an explanation."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The SQL statement to execute"
                    }
                },
                "required": ["query"]
            }),
        },
    ]
}
