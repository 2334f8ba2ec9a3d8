//! Response orchestrator: user message in, assistant message out.
//!
//! DESIGN
//! ======
//! A send appends the user turn synchronously, marks the conversation
//! in flight, calls the completion provider with the full history, and
//! appends the assistant turn only on success. Failure is atomic: the user
//! turn stays, no assistant turn lands, and the conversation returns to
//! idle. At most one generation runs per conversation; a second send is
//! rejected immediately instead of queued. Generations on different
//! conversations run concurrently and share only the store.
//!
//! TRADE-OFFS
//! ==========
//! The in-flight claim is released by a drop guard, so a caller that drops
//! the send future mid-generation also returns the conversation to idle.
//! The user turn is already stored at that point and no assistant turn is
//! written.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::llm::search::resolve_search_directive;
use crate::llm::types::CompletionProvider;
use crate::store::{ConversationStore, StoreError};
use crate::types::{Message, MessageDraft, Role};

/// Starter prompts offered while a conversation has no user turn yet.
pub const QUICK_PROMPTS: [&str; 3] = ["Explain quantum computing", "Latest AI developments", "Write a creative story"];

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a response is already being generated for conversation {0}")]
    AlreadyInFlight(Uuid),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("response generation failed: {0}")]
    ProviderFailure(String),
    #[error("response generation timed out after {secs}s")]
    TimedOut { secs: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    Idle,
    InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendOptions {
    /// Explicit search mode toggle from the composer.
    pub search_mode: bool,
}

/// The pair of turns a successful send appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub user: Message,
    pub assistant: Message,
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

#[derive(Clone)]
pub struct ResponseOrchestrator {
    store: ConversationStore,
    provider: Arc<dyn CompletionProvider>,
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
    timeout: Option<Duration>,
}

/// Releases a conversation's in-flight claim on drop.
struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
    conversation_id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.conversation_id);
    }
}

fn lock(set: &Mutex<HashSet<Uuid>>) -> MutexGuard<'_, HashSet<Uuid>> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ResponseOrchestrator {
    #[must_use]
    pub fn new(store: ConversationStore, provider: Arc<dyn CompletionProvider>) -> Self {
        Self { store, provider, in_flight: Arc::new(Mutex::new(HashSet::new())), timeout: None }
    }

    /// Bound each provider call. A timed-out generation appends nothing.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    #[must_use]
    pub fn status(&self, conversation_id: Uuid) -> GenerationStatus {
        if lock(&self.in_flight).contains(&conversation_id) {
            GenerationStatus::InFlight
        } else {
            GenerationStatus::Idle
        }
    }

    /// Whether the starter prompts should be offered for a conversation.
    #[must_use]
    pub fn quick_prompts_visible(&self, conversation_id: Uuid) -> bool {
        self.store
            .get_messages(conversation_id)
            .is_ok_and(|messages| quick_prompts_visible(&messages))
    }

    /// Append `text` as a user turn and generate the assistant reply.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::EmptyMessage`] / [`GenerationError::AlreadyInFlight`] /
    ///   [`GenerationError::Store`]: rejected before anything is appended.
    /// - [`GenerationError::ProviderFailure`] / [`GenerationError::TimedOut`]:
    ///   the user turn was appended, no assistant turn was.
    pub async fn send_user_message(
        &self,
        conversation_id: Uuid,
        text: &str,
        options: SendOptions,
    ) -> Result<Exchange, GenerationError> {
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyMessage);
        }
        if !self.store.contains(conversation_id) {
            return Err(StoreError::NotFound(conversation_id).into());
        }
        let _guard = self.claim(conversation_id)?;

        // The conversation may be deleted between the check and the append.
        let user = self.store.append_message(conversation_id, MessageDraft::user(text))?;
        let history = self.store.get_messages(conversation_id)?;
        let directive = resolve_search_directive(text, options.search_mode);

        info!(
            %conversation_id,
            history_len = history.len(),
            searched = directive.is_some(),
            "orchestrator: generation started"
        );

        let call = self.provider.generate(&history, directive.as_deref());
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(%conversation_id, secs = limit.as_secs(), "orchestrator: generation timed out");
                    return Err(GenerationError::TimedOut { secs: limit.as_secs() });
                }
            },
            None => call.await,
        };

        let completion = match outcome {
            Ok(completion) => completion,
            Err(e) => {
                warn!(%conversation_id, error = %e, "orchestrator: generation failed");
                return Err(GenerationError::ProviderFailure(e.to_string()));
            }
        };

        let draft = MessageDraft::assistant(completion.content).with_sources(completion.sources.unwrap_or_default());
        let assistant = self.store.append_message(conversation_id, draft)?;
        info!(%conversation_id, message_id = %assistant.id, "orchestrator: generation finished");
        Ok(Exchange { user, assistant })
    }

    fn claim(&self, conversation_id: Uuid) -> Result<InFlightGuard, GenerationError> {
        let mut in_flight = lock(&self.in_flight);
        if !in_flight.insert(conversation_id) {
            return Err(GenerationError::AlreadyInFlight(conversation_id));
        }
        Ok(InFlightGuard { in_flight: Arc::clone(&self.in_flight), conversation_id })
    }
}

/// Starter prompts are offered until the first user turn exists.
#[must_use]
pub fn quick_prompts_visible(messages: &[Message]) -> bool {
    !messages.iter().any(|m| m.role == Role::User)
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
