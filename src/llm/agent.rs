//! Reasoning agent that answers questions through SQL tool calls.
//!
//! The agent drives an LLM through a bounded tool-call loop against the
//! introspected schema and the live database, recording every tool
//! invocation along the way. The recorded trace is what downstream
//! extraction selects the authoritative statement from; the agent's own
//! final text is kept as the fallback answer.

use std::time::{Duration, Instant};

use crate::db::{DatabaseClient, Schema};
use crate::error::{LoanlensError, Result};
use crate::query::{QueryExecutor, DEFAULT_MAX_ROWS};
use crate::safety::{self, ValidationResult};
use crate::trace::{ToolInvocation, Trace};

use super::tools::{agent_tool_definitions, QueryToolInput, SchemaToolInput};
use super::{LlmClient, Message, PromptCache};

/// Default iteration cap for one agent run.
const DEFAULT_MAX_ITERATIONS: usize = 8;

/// Default wall-clock timeout for one agent run, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 90;

/// A completed agent run.
#[derive(Debug, Clone)]
pub struct AgentRun {
    /// Every tool invocation, in the order it happened.
    pub trace: Trace,
    /// The agent's final natural-language answer.
    pub final_answer: String,
}

/// Agent that turns a natural-language question into SQL tool calls.
///
/// Holds the LLM client and a cached system prompt. One instance serves
/// many questions; each call to [`answer`] runs an independent loop.
///
/// [`answer`]: Self::answer
pub struct SqlAgent {
    client: Box<dyn LlmClient>,
    prompt_cache: PromptCache,
    max_iterations: usize,
    timeout_secs: u64,
    max_rows: usize,
}

impl SqlAgent {
    /// Creates a new agent over the given LLM client.
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self {
            client,
            prompt_cache: PromptCache::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    /// Sets the iteration cap for one run.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the wall-clock timeout for one run.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the row cap applied to queries the agent executes.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Invalidates the cached system prompt (e.g., after schema refresh).
    pub fn invalidate_cache(&mut self) {
        self.prompt_cache.invalidate();
    }

    /// Answers a question by running the tool loop against the schema
    /// and database.
    ///
    /// The run is bounded by the iteration cap and a wall-clock
    /// timeout; both surface as agent errors. Queries the agent issues
    /// are validated and row-capped exactly like direct submissions.
    pub async fn answer(
        &mut self,
        question: &str,
        schema: &Schema,
        db: &dyn DatabaseClient,
    ) -> Result<AgentRun> {
        let timeout = Duration::from_secs(self.timeout_secs);
        let timeout_secs = self.timeout_secs;

        match tokio::time::timeout(timeout, self.run_loop(question, schema, db)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_secs, "Agent run timed out");
                Err(LoanlensError::agent(format!(
                    "Agent timed out after {} seconds",
                    timeout_secs
                )))
            }
        }
    }

    /// The tool loop itself, without the timeout wrapper.
    async fn run_loop(
        &mut self,
        question: &str,
        schema: &Schema,
        db: &dyn DatabaseClient,
    ) -> Result<AgentRun> {
        let start = Instant::now();
        tracing::debug!(question_len = question.len(), "Starting agent run");

        let system_prompt = self.prompt_cache.get_or_build(schema);
        let tools = agent_tool_definitions();
        let mut messages = vec![
            Message::system(system_prompt.as_ref()),
            Message::user(question),
        ];
        let mut trace: Trace = Vec::new();

        for iteration in 1..=self.max_iterations {
            tracing::debug!(
                iteration,
                message_count = messages.len(),
                "Requesting agent completion"
            );

            let llm_start = Instant::now();
            let response = self.client.complete(&messages, &tools).await?;

            tracing::debug!(
                llm_duration_ms = llm_start.elapsed().as_millis(),
                has_tool_calls = response.has_tool_calls(),
                response_len = response.content.len(),
                "Received agent response"
            );

            if !response.has_tool_calls() {
                tracing::info!(
                    total_duration_ms = start.elapsed().as_millis(),
                    iterations = iteration,
                    trace_len = trace.len(),
                    "Agent run complete"
                );
                return Ok(AgentRun {
                    trace,
                    final_answer: response.content,
                });
            }

            messages.push(Message::assistant_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                let (input, output) = self
                    .execute_tool(&call.name, &call.arguments, schema, db)
                    .await;
                trace.push(ToolInvocation::new(&call.name, input, output.clone()));
                messages.push(Message::tool_result(&call.id, output));
            }
        }

        tracing::warn!(
            max_iterations = self.max_iterations,
            trace_len = trace.len(),
            "Agent hit iteration cap"
        );
        Err(LoanlensError::agent(format!(
            "Agent stopped after {} iterations without a final answer",
            self.max_iterations
        )))
    }

    /// Executes one tool call. Returns (recorded input, tool output).
    ///
    /// The recorded input is the semantic payload (statement text or
    /// table list), which is what trace extraction operates on. Tools
    /// never fail the run; problems come back as output text for the
    /// agent to react to.
    async fn execute_tool(
        &self,
        name: &str,
        arguments: &str,
        schema: &Schema,
        db: &dyn DatabaseClient,
    ) -> (String, String) {
        let start = Instant::now();
        tracing::debug!(tool_name = name, "Executing agent tool");

        let (input, output) = match name {
            "sql_db_list_tables" => (String::new(), schema.table_names().join(", ")),
            "sql_db_schema" => match serde_json::from_str::<SchemaToolInput>(arguments) {
                Ok(parsed) => {
                    let output = Self::describe_tables(schema, &parsed.table_names);
                    (parsed.table_names, output)
                }
                Err(_) => (
                    arguments.to_string(),
                    "Error: invalid tool arguments".to_string(),
                ),
            },
            "sql_db_query_checker" => match serde_json::from_str::<QueryToolInput>(arguments) {
                Ok(parsed) => {
                    let output = Self::check_query(&parsed.query);
                    (parsed.query, output)
                }
                Err(_) => (
                    arguments.to_string(),
                    "Error: invalid tool arguments".to_string(),
                ),
            },
            "sql_db_query" => match serde_json::from_str::<QueryToolInput>(arguments) {
                Ok(parsed) => {
                    let output = self.run_query(&parsed.query, db).await;
                    (parsed.query, output)
                }
                Err(_) => (
                    arguments.to_string(),
                    "Error: invalid tool arguments".to_string(),
                ),
            },
            _ => {
                tracing::warn!(tool_name = name, "Unknown tool requested");
                (
                    arguments.to_string(),
                    format!("Error: unknown tool '{}'", name),
                )
            }
        };

        tracing::debug!(
            tool_name = name,
            duration_ms = start.elapsed().as_millis(),
            result_len = output.len(),
            "Tool execution complete"
        );

        (input, output)
    }

    /// Renders schema text for a comma-separated table list.
    fn describe_tables(schema: &Schema, table_names: &str) -> String {
        let mut sections = Vec::new();

        for name in table_names
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            match schema.format_table_for_agent(name) {
                Some(text) => sections.push(text),
                None => sections.push(format!("Error: table '{}' not found\n", name)),
            }
        }

        if sections.is_empty() {
            "Error: no table names given".to_string()
        } else {
            sections.join("")
        }
    }

    /// Backs the checker tool with the real validator: an allowed
    /// statement echoes back unchanged, a rejected one returns the
    /// rejection message.
    fn check_query(query: &str) -> String {
        match safety::validate(query) {
            ValidationResult::Allowed => query.to_string(),
            ValidationResult::Rejected(reason) => reason.message(),
        }
    }

    /// Validates and executes a query on the agent's behalf, rendering
    /// rows as JSON records. Errors come back as text so the agent can
    /// correct itself and retry.
    async fn run_query(&self, query: &str, db: &dyn DatabaseClient) -> String {
        if let ValidationResult::Rejected(reason) = safety::validate(query) {
            return reason.message();
        }

        let executor = QueryExecutor::new(db, self.max_rows);
        match executor.execute(query).await {
            Ok(result) => {
                let mut output = serde_json::to_string(&result.to_records())
                    .unwrap_or_else(|e| format!("Error: {}", e));
                if result.was_truncated {
                    output.push_str(&format!("\n(Showing first {} rows)", result.row_count));
                }
                output
            }
            Err(e) => format!("Error: {}", e.message()),
        }
    }
}
