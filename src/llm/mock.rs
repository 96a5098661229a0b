//! Mock LLM client for testing.
//!
//! Plays back a scripted sequence of responses, one per completion
//! call, so agent-loop tests can drive multi-turn tool conversations
//! deterministically. Falls back to pattern matching when the script
//! runs out.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::Result;
use crate::llm::tools::ToolDefinition;
use crate::llm::types::{LlmResponse, Message, Role, ToolCall};
use crate::llm::LlmClient;

/// Mock LLM client used for unit testing without making real API calls.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    /// Scripted responses, consumed front to back.
    script: Mutex<VecDeque<LlmResponse>>,
    /// Custom response mappings (pattern -> response) for unscripted calls.
    custom_responses: Vec<(String, String)>,
}

impl MockLlmClient {
    /// Creates a new mock client with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a tool-call turn to the script.
    ///
    /// The call gets a synthetic id based on its position.
    pub fn then_tool_call(self, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        let id = {
            let script = self.script.lock().expect("mock script lock poisoned");
            format!("mock_call_{}", script.len())
        };
        self.then_response(LlmResponse::with_tool_calls(
            String::new(),
            vec![ToolCall::new(id, name, arguments)],
        ))
    }

    /// Appends a plain-text turn to the script.
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.then_response(LlmResponse::text(text))
    }

    /// Appends an arbitrary response to the script.
    pub fn then_response(self, response: LlmResponse) -> Self {
        self.script
            .lock()
            .expect("mock script lock poisoned")
            .push_back(response);
        self
    }

    /// Adds a custom response mapping for unscripted calls.
    ///
    /// When the input contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Generates a fallback response based on the input.
    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        "I could not answer that from the loan data. Could you please rephrase it?".to_string()
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User && m.tool_call_id.is_none())
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        if let Some(response) = self
            .script
            .lock()
            .expect("mock script lock poisoned")
            .pop_front()
        {
            return Ok(response);
        }

        let input = Self::extract_user_input(messages);
        Ok(LlmResponse::text(self.mock_response(&input)))
    }
}
