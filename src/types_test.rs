use super::*;

#[test]
fn role_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    assert!(serde_json::from_str::<Role>("\"system\"").is_err());
}

#[test]
fn message_timestamp_is_rfc3339_string() {
    let msg = Message {
        id: Uuid::new_v4(),
        content: "hello".into(),
        role: Role::User,
        timestamp: time::macros::datetime!(2024-05-01 12:30:00 UTC),
        conversation_id: Uuid::new_v4(),
        sources: None,
        thinking: false,
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["timestamp"], "2024-05-01T12:30:00Z");
    assert_eq!(value["role"], "user");
    assert!(value.get("sources").is_none());
    assert!(value.get("thinking").is_none());
}

#[test]
fn draft_with_empty_sources_stores_none() {
    let draft = MessageDraft::assistant("hi").with_sources(Vec::new());
    assert_eq!(draft.sources, None);

    let draft = MessageDraft::assistant("hi").with_sources(vec!["https://a.test".into()]);
    assert_eq!(draft.sources.as_deref(), Some(&["https://a.test".to_string()][..]));
}
