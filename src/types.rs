//! Domain types shared by the session gate, store, and orchestrator.
//!
//! DESIGN
//! ======
//! Ids are UUID v4 and timestamps are UTC `OffsetDateTime`s serialized as
//! RFC 3339 strings, so any collaborator that persists these records gets
//! stable, sortable plain-string fields.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Sentinel title given to freshly created conversations.
pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";

// =============================================================================
// SESSION
// =============================================================================

/// An authenticated identity, owned by the session gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub email: String,
    /// Display name. Falls back to `"User"` when the provider has none.
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// =============================================================================
// CONVERSATION
// =============================================================================

/// Snapshot of a conversation as seen by the presentation layer.
///
/// `message_count` is computed from the stored message sequence when the
/// snapshot is taken, so it always equals `messages(id).len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub message_count: usize,
}

// =============================================================================
// MESSAGE
// =============================================================================

/// Author of a message turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One appended turn. Immutable once it lands in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub conversation_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub thinking: bool,
}

/// Message content handed to the store; the store assigns id, owner, and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub role: Role,
    pub content: String,
    pub sources: Option<Vec<String>>,
    pub thinking: bool,
}

impl MessageDraft {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), sources: None, thinking: false }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), sources: None, thinking: false }
    }

    /// Attach citation URLs. An empty list is stored as `None`.
    #[must_use]
    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = if sources.is_empty() { None } else { Some(sources) };
        self
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
