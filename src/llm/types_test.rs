use super::*;
use crate::types::Role;
use uuid::Uuid;

#[test]
fn chat_turn_from_message_uses_role_string() {
    let msg = Message {
        id: Uuid::new_v4(),
        content: "hello".into(),
        role: Role::Assistant,
        timestamp: time::OffsetDateTime::now_utc(),
        conversation_id: Uuid::new_v4(),
        sources: None,
        thinking: false,
    };
    let turn = ChatTurn::from(&msg);
    assert_eq!(turn.role, "assistant");
    assert_eq!(turn.content, "hello");
}

#[test]
fn error_messages_are_descriptive() {
    let err = LlmError::MissingApiKey { var: "OPENAI_API_KEY".into() };
    assert_eq!(err.to_string(), "missing API key: env var OPENAI_API_KEY not set");
    let err = LlmError::ApiResponse { status: 500, body: "oops".into() };
    assert_eq!(err.to_string(), "API response error: status 500");
}
