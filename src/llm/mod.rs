//! LLM — completion providers behind one injectable trait.
//!
//! DESIGN
//! ======
//! The orchestrator only sees [`CompletionProvider`]. Two families implement
//! it: the mock provider used for demos and tests, and [`ChatCompletionProvider`],
//! which turns a conversation history into a system prompt plus text turns and
//! sends them through an [`LlmChat`] transport. `LlmClient` dispatches that
//! transport to Anthropic or an OpenAI-compatible API based on config.

pub mod anthropic;
pub mod config;
pub mod mock;
pub mod openai;
pub mod search;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use config::{LlmConfig, LlmProviderKind};
pub use types::{ChatResponse, ChatTurn, Completion, CompletionProvider, LlmChat, LlmError};

use crate::types::Message;

const BASE_SYSTEM_PROMPT: &str = "You are Arsenal AI, an advanced AI assistant. You help with complex questions, \
research, coding, analysis, and creative work. Answer clearly and use markdown where it helps.";

// =============================================================================
// CLIENT DISPATCH
// =============================================================================

/// Concrete LLM transport that dispatches to either Anthropic or `OpenAI`.
pub struct LlmClient {
    inner: LlmProvider,
    model: String,
}

enum LlmProvider {
    Anthropic(anthropic::AnthropicClient),
    OpenAi(openai::OpenAiClient),
}

impl LlmClient {
    /// Build an LLM client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client fails to build.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let model = config.model.clone();
        let inner = match config.provider {
            LlmProviderKind::Anthropic => LlmProvider::Anthropic(anthropic::AnthropicClient::new(
                config.api_key.clone(),
                model.clone(),
                config.timeouts,
            )?),
            LlmProviderKind::OpenAi => LlmProvider::OpenAi(openai::OpenAiClient::new(
                config.api_key.clone(),
                model.clone(),
                config.openai_mode,
                config.openai_base_url.clone(),
                config.timeouts,
            )?),
        };
        Ok(Self { inner, model })
    }

    /// Return the configured model name (e.g. `"claude-sonnet-4-5-20250929"`).
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmChat for LlmClient {
    async fn chat(&self, max_tokens: u32, system: &str, turns: &[ChatTurn]) -> Result<ChatResponse, LlmError> {
        match &self.inner {
            LlmProvider::Anthropic(c) => c.chat(max_tokens, system, turns).await,
            LlmProvider::OpenAi(c) => c.chat(max_tokens, system, turns).await,
        }
    }
}

// =============================================================================
// CHAT-BACKED COMPLETION PROVIDER
// =============================================================================

/// Completion provider backed by a real chat model.
pub struct ChatCompletionProvider {
    chat: Arc<dyn LlmChat>,
    max_tokens: u32,
}

impl ChatCompletionProvider {
    #[must_use]
    pub fn new(chat: Arc<dyn LlmChat>, max_tokens: u32) -> Self {
        Self { chat, max_tokens }
    }
}

#[async_trait]
impl CompletionProvider for ChatCompletionProvider {
    async fn generate(&self, history: &[Message], directive: Option<&str>) -> Result<Completion, LlmError> {
        let system = build_system_prompt(directive);
        let turns: Vec<ChatTurn> = history.iter().map(ChatTurn::from).collect();

        let response = self.chat.chat(self.max_tokens, &system, &turns).await?;
        debug!(
            model = %response.model,
            stop_reason = %response.stop_reason,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "llm: completion received"
        );

        if response.text.trim().is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        let sources = directive
            .map(|_| search::extract_urls(&response.text))
            .filter(|urls| !urls.is_empty());
        Ok(Completion { content: response.text, sources })
    }
}

/// System prompt for one generation. A directive asks the model to ground the
/// answer in web sources and cite them as URLs.
#[must_use]
pub fn build_system_prompt(directive: Option<&str>) -> String {
    match directive {
        None => BASE_SYSTEM_PROMPT.to_owned(),
        Some(query) => format!(
            "{BASE_SYSTEM_PROMPT}\n\nThe user wants current, web-sourced information about: \
             <search_query>{query}</search_query>\nGround the answer in recent sources and list each \
             source as a full https URL under a \"Sources\" heading."
        ),
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
