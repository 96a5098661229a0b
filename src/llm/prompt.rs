//! Prompt construction for agent requests.
//!
//! Builds the system prompt with database schema context and the
//! ground rules for generating loan-portfolio queries.

use crate::db::Schema;
use std::sync::Arc;

/// System prompt template for the SQL agent.
const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a SQL analyst for a loan-portfolio PostgreSQL database. Answer questions by querying the database with the tools provided.

{schema}

TABLE GUIDANCE:
- Disbursement tables record money paid out; repayment tables record money collected back. Never answer a repayment or collection question from a disbursement table.
- Prefer joining along the listed foreign keys. When a table carries a composite key, join on every part of it.
- "Active" usually means an open account: look for status columns or closed flags before filtering.
- Phrasings like "branch wise" or "by product" mean GROUP BY that column.

RULES:
1. Use sql_db_list_tables and sql_db_schema to learn the structure before writing a query. Use only tables and columns that exist.
2. Only single SELECT statements are allowed. Never write INSERT, UPDATE, DELETE, DROP, or any other mutating statement; they will be rejected.
3. Run sql_db_query_checker on a statement you are unsure about, then execute it with sql_db_query.
4. Execute the query and answer from the returned rows. Keep the final answer short and factual.
5. If the question cannot be answered with this schema, say so instead of guessing."#;

/// Builds the system prompt with the database schema injected.
pub fn build_system_prompt(schema: &Schema) -> String {
    let schema_text = schema.format_for_agent();
    SYSTEM_PROMPT_TEMPLATE.replace("{schema}", &schema_text)
}

/// Cache for formatted schema prompts.
///
/// Avoids rebuilding the system prompt on every agent request when the
/// schema hasn't changed.
#[derive(Debug, Default)]
pub struct PromptCache {
    /// Hash of the schema used to build the cached prompt.
    schema_hash: u64,
    /// Cached system prompt.
    system_prompt: Option<Arc<str>>,
}

impl PromptCache {
    /// Creates a new empty prompt cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the cached system prompt, rebuilding if the schema has changed.
    pub fn get_or_build(&mut self, schema: &Schema) -> Arc<str> {
        let hash = schema.content_hash();
        if self.schema_hash != hash || self.system_prompt.is_none() {
            self.schema_hash = hash;
            self.system_prompt = Some(Arc::from(build_system_prompt(schema)));
        }
        Arc::clone(self.system_prompt.as_ref().unwrap())
    }

    /// Invalidates the cache, forcing a rebuild on next access.
    pub fn invalidate(&mut self) {
        self.schema_hash = 0;
        self.system_prompt = None;
    }
}
