//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use crate::error::{LoanlensError, Result};
use crate::llm::{
    AnthropicClient, AnthropicConfig, LlmClient, LlmProvider, MockLlmClient, OllamaClient,
    OpenAiClient, OpenAiConfig,
};

/// Creates an LLM client for the given provider.
///
/// If `api_key` or `model` are provided (from config), they take
/// precedence over environment variables. For providers that require an
/// API key (OpenAI, Anthropic), the key is resolved in order:
/// 1. Provided `api_key` parameter
/// 2. Environment variable (`OPENAI_API_KEY` or `ANTHROPIC_API_KEY`)
///
/// Model fallbacks come from environment variables:
/// - `OPENAI_MODEL` (defaults to "gpt-4o")
/// - `ANTHROPIC_MODEL` (defaults to "claude-sonnet-4-20250514")
/// - `OLLAMA_MODEL` (defaults to "llama3.2:3b")
pub fn create_client(
    provider: LlmProvider,
    api_key: Option<String>,
    model: Option<String>,
) -> Result<Box<dyn LlmClient>> {
    match provider {
        LlmProvider::OpenAi => {
            let key = api_key
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .ok_or_else(|| {
                    LoanlensError::agent(
                        "No API key configured. Set agent.api_key or OPENAI_API_KEY.",
                    )
                })?;
            let model = model
                .or_else(|| std::env::var("OPENAI_MODEL").ok())
                .unwrap_or_else(|| "gpt-4o".to_string());
            Ok(Box::new(OpenAiClient::new(OpenAiConfig::new(key, model))?))
        }
        LlmProvider::Anthropic => {
            let key = api_key
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
                .ok_or_else(|| {
                    LoanlensError::agent(
                        "No API key configured. Set agent.api_key or ANTHROPIC_API_KEY.",
                    )
                })?;
            let model = model
                .or_else(|| std::env::var("ANTHROPIC_MODEL").ok())
                .unwrap_or_else(|| "claude-sonnet-4-20250514".to_string());
            Ok(Box::new(AnthropicClient::new(AnthropicConfig::new(
                key, model,
            ))?))
        }
        LlmProvider::Ollama => match model {
            Some(model) => Ok(Box::new(OllamaClient::new(crate::llm::OllamaConfig::new(
                model,
            ))?)),
            None => Ok(Box::new(OllamaClient::from_env()?)),
        },
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}
