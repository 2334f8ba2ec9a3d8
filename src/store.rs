//! Conversation store — the shared hub for conversation and message state.
//!
//! DESIGN
//! ======
//! All state sits behind one `Mutex`, so every operation is a single
//! critical section and no caller ever observes a conversation whose
//! message list and metadata disagree. `message_count` is not stored at all:
//! snapshots compute it from the message vector, and `append_message` is the
//! only code path that grows that vector.
//!
//! Change notifications fan out to subscriber channels with `try_send`
//! while the lock is held, which keeps event order identical to mutation
//! order. A full subscriber misses the event; a closed one is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use time::OffsetDateTime;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::{Conversation, DEFAULT_CONVERSATION_TITLE, Message, MessageDraft};

/// Title of the conversation seeded by [`ConversationStore::with_welcome`].
pub const WELCOME_TITLE: &str = "Welcome to Arsenal AI";

/// Assistant greeting placed in the welcome conversation.
pub const WELCOME_GREETING: &str = "Hello! I'm Arsenal AI, your advanced AI assistant. I can help you with complex questions, research, coding, analysis, and much more. I have access to real-time web search to provide you with the most current information. What would you like to explore today?";

const SUBSCRIBER_BUFFER: usize = 64;

// =============================================================================
// ERRORS AND EVENTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("conversation not found: {0}")]
    NotFound(Uuid),
}

/// Change notification emitted after each successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Created { conversation_id: Uuid },
    Deleted { conversation_id: Uuid },
    /// The active pointer changed. `None` means no conversation is active.
    Selected { conversation_id: Option<Uuid> },
    MessageAppended { conversation_id: Uuid, message_id: Uuid },
    Renamed { conversation_id: Uuid },
}

/// Receiving side of a store subscription.
pub struct Subscription {
    pub id: Uuid,
    pub events: mpsc::Receiver<StoreEvent>,
}

// =============================================================================
// STORE
// =============================================================================

struct ConversationRecord {
    id: Uuid,
    title: String,
    user_id: Uuid,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    messages: Vec<Message>,
}

impl ConversationRecord {
    fn snapshot(&self) -> Conversation {
        Conversation {
            id: self.id,
            title: self.title.clone(),
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            message_count: self.messages.len(),
        }
    }
}

#[derive(Default)]
struct StoreInner {
    /// Display order, most recently created first.
    order: Vec<Uuid>,
    records: HashMap<Uuid, ConversationRecord>,
    active: Option<Uuid>,
    subscribers: HashMap<Uuid, mpsc::Sender<StoreEvent>>,
}

impl StoreInner {
    fn emit(&mut self, event: &StoreEvent) {
        self.subscribers.retain(|id, tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(subscriber = %id, "store: subscriber lagging; event dropped");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }
}

/// Cloneable handle to the shared conversation state.
#[derive(Clone, Default)]
pub struct ConversationStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl ConversationStore {
    /// An empty store with no active conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with the welcome conversation (holding the assistant
    /// greeting) as its only, active entry.
    #[must_use]
    pub fn with_welcome(owner: Uuid) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            let id = insert_conversation(&mut inner, owner, WELCOME_TITLE);
            if let Some(record) = inner.records.get_mut(&id) {
                push_message(record, MessageDraft::assistant(WELCOME_GREETING));
            }
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a change-notification channel.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = Uuid::new_v4();
        self.lock().subscribers.insert(id, tx);
        Subscription { id, events: rx }
    }

    pub fn unsubscribe(&self, subscription_id: Uuid) {
        self.lock().subscribers.remove(&subscription_id);
    }

    /// Create an empty conversation, prepend it, and make it active.
    pub fn create_conversation(&self, owner: Uuid) -> Uuid {
        let mut inner = self.lock();
        let id = insert_conversation(&mut inner, owner, DEFAULT_CONVERSATION_TITLE);
        debug!(conversation_id = %id, %owner, "store: conversation created");
        inner.emit(&StoreEvent::Created { conversation_id: id });
        inner.emit(&StoreEvent::Selected { conversation_id: Some(id) });
        id
    }

    /// Remove a conversation and its messages. Unknown ids are a no-op.
    ///
    /// Returns `true` if something was removed. When the active conversation
    /// is removed, the first remaining conversation in list order becomes
    /// active, or none if the list is now empty.
    pub fn delete_conversation(&self, id: Uuid) -> bool {
        let mut inner = self.lock();
        if inner.records.remove(&id).is_none() {
            return false;
        }
        inner.order.retain(|c| *c != id);
        debug!(conversation_id = %id, remaining = inner.order.len(), "store: conversation deleted");
        inner.emit(&StoreEvent::Deleted { conversation_id: id });

        if inner.active == Some(id) {
            inner.active = inner.order.first().copied();
            let next = inner.active;
            inner.emit(&StoreEvent::Selected { conversation_id: next });
        }
        true
    }

    /// Point the active conversation at `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `id` is not in the store; the active
    /// pointer is left unchanged.
    pub fn select_conversation(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.records.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        if inner.active != Some(id) {
            inner.active = Some(id);
            inner.emit(&StoreEvent::Selected { conversation_id: Some(id) });
        }
        Ok(())
    }

    /// Append a message, bumping `updated_at`. The count grows by exactly one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the conversation does not exist.
    pub fn append_message(&self, conversation_id: Uuid, draft: MessageDraft) -> Result<Message, StoreError> {
        let mut inner = self.lock();
        let record = inner
            .records
            .get_mut(&conversation_id)
            .ok_or(StoreError::NotFound(conversation_id))?;
        let message = push_message(record, draft);
        inner.emit(&StoreEvent::MessageAppended { conversation_id, message_id: message.id });
        Ok(message)
    }

    /// Change a conversation's title. Blank titles fall back to the sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the conversation does not exist.
    pub fn rename_conversation(&self, id: Uuid, title: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let record = inner.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let title = title.trim();
        record.title = if title.is_empty() { DEFAULT_CONVERSATION_TITLE.to_owned() } else { title.to_owned() };
        inner.emit(&StoreEvent::Renamed { conversation_id: id });
        Ok(())
    }

    /// All conversations, most recently created first.
    #[must_use]
    pub fn list_conversations(&self) -> Vec<Conversation> {
        let inner = self.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id))
            .map(ConversationRecord::snapshot)
            .collect()
    }

    #[must_use]
    pub fn get_conversation(&self, id: Uuid) -> Option<Conversation> {
        self.lock().records.get(&id).map(ConversationRecord::snapshot)
    }

    /// Messages of one conversation in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the conversation does not exist.
    pub fn get_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>, StoreError> {
        self.lock()
            .records
            .get(&conversation_id)
            .map(|r| r.messages.clone())
            .ok_or(StoreError::NotFound(conversation_id))
    }

    #[must_use]
    pub fn active_conversation_id(&self) -> Option<Uuid> {
        self.lock().active
    }

    #[must_use]
    pub fn contains(&self, id: Uuid) -> bool {
        self.lock().records.contains_key(&id)
    }

    /// Conversations whose title contains `query`, ignoring case, in list order.
    #[must_use]
    pub fn filter_conversations(&self, query: &str) -> Vec<Conversation> {
        filter_by_title(&self.list_conversations(), query)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Case-insensitive substring match over titles. Input order is preserved.
#[must_use]
pub fn filter_by_title(conversations: &[Conversation], query: &str) -> Vec<Conversation> {
    let needle = query.to_lowercase();
    conversations
        .iter()
        .filter(|c| c.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

fn insert_conversation(inner: &mut StoreInner, owner: Uuid, title: &str) -> Uuid {
    let now = OffsetDateTime::now_utc();
    let id = Uuid::new_v4();
    inner.records.insert(
        id,
        ConversationRecord {
            id,
            title: title.to_owned(),
            user_id: owner,
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        },
    );
    inner.order.insert(0, id);
    inner.active = Some(id);
    id
}

/// The single place messages are added. Keeps `updated_at` non-decreasing
/// even if the wall clock steps backwards.
fn push_message(record: &mut ConversationRecord, draft: MessageDraft) -> Message {
    let now = OffsetDateTime::now_utc().max(record.updated_at);
    let message = Message {
        id: Uuid::new_v4(),
        content: draft.content,
        role: draft.role,
        timestamp: now,
        conversation_id: record.id,
        sources: draft.sources,
        thinking: draft.thinking,
    };
    record.messages.push(message.clone());
    record.updated_at = now;
    message
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
