//! LLM types — provider-neutral chat turns, completion results, and errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::Message;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by completion providers and their HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The required API key environment variable is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// The HTTP request to the LLM provider failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The LLM provider returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The LLM provider response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The provider answered but produced no text.
    #[error("provider returned an empty completion")]
    EmptyCompletion,
}

// =============================================================================
// WIRE-NEUTRAL CHAT TYPES
// =============================================================================

/// A single text turn sent to an HTTP chat API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        Self { role: message.role.as_str().to_owned(), content: message.content.clone() }
    }
}

/// Response from an LLM chat call, flattened to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub text: String,
    pub model: String,
    pub stop_reason: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Raw chat transport implemented by the HTTP clients. Enables mocking.
#[async_trait]
pub trait LlmChat: Send + Sync {
    /// Send a chat request to the LLM provider.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails or the response is malformed.
    async fn chat(&self, max_tokens: u32, system: &str, turns: &[ChatTurn]) -> Result<ChatResponse, LlmError>;
}

// =============================================================================
// COMPLETION PROVIDER
// =============================================================================

/// Generated assistant text plus optional citation URLs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    pub content: String,
    pub sources: Option<Vec<String>>,
}

/// The capability the orchestrator calls to produce an assistant turn.
///
/// `history` is the full ordered message list of the conversation, ending
/// with the user turn being answered. `directive` is present when the
/// request is search-augmented.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns an [`LlmError`] when no complete answer could be produced.
    async fn generate(&self, history: &[Message], directive: Option<&str>) -> Result<Completion, LlmError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
