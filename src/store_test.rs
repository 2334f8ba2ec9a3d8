use super::*;
use crate::types::Role;

fn owner() -> Uuid {
    Uuid::new_v4()
}

fn assert_counts_match(store: &ConversationStore) {
    for conv in store.list_conversations() {
        let messages = store.get_messages(conv.id).unwrap();
        assert_eq!(conv.message_count, messages.len(), "count drift in {}", conv.id);
    }
}

fn drain(sub: &mut Subscription) -> Vec<StoreEvent> {
    let mut out = Vec::new();
    while let Ok(event) = sub.events.try_recv() {
        out.push(event);
    }
    out
}

// =========================================================================
// create / list
// =========================================================================

#[test]
fn new_store_is_empty() {
    let store = ConversationStore::new();
    assert!(store.list_conversations().is_empty());
    assert_eq!(store.active_conversation_id(), None);
}

#[test]
fn create_prepends_and_activates() {
    let store = ConversationStore::new();
    let user = owner();
    let a = store.create_conversation(user);
    let b = store.create_conversation(user);

    let ids: Vec<Uuid> = store.list_conversations().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![b, a]);
    assert_eq!(store.active_conversation_id(), Some(b));

    let conv = store.get_conversation(b).unwrap();
    assert_eq!(conv.title, DEFAULT_CONVERSATION_TITLE);
    assert_eq!(conv.user_id, user);
    assert_eq!(conv.message_count, 0);
    assert_eq!(conv.created_at, conv.updated_at);
}

#[test]
fn welcome_store_has_greeting() {
    let store = ConversationStore::with_welcome(owner());
    let convs = store.list_conversations();
    assert_eq!(convs.len(), 1);
    assert_eq!(convs[0].title, WELCOME_TITLE);
    assert_eq!(convs[0].message_count, 1);
    assert_eq!(store.active_conversation_id(), Some(convs[0].id));

    let messages = store.get_messages(convs[0].id).unwrap();
    assert_eq!(messages[0].role, Role::Assistant);
    assert_eq!(messages[0].content, WELCOME_GREETING);
}

// =========================================================================
// append
// =========================================================================

#[test]
fn append_increments_count_and_keeps_order() {
    let store = ConversationStore::new();
    let id = store.create_conversation(owner());
    let created = store.get_conversation(id).unwrap();

    store.append_message(id, MessageDraft::user("one")).unwrap();
    store.append_message(id, MessageDraft::assistant("two")).unwrap();
    store.append_message(id, MessageDraft::user("three")).unwrap();

    let conv = store.get_conversation(id).unwrap();
    assert_eq!(conv.message_count, 3);
    assert!(conv.updated_at >= created.updated_at);
    assert_eq!(conv.created_at, created.created_at);

    let contents: Vec<String> = store
        .get_messages(id)
        .unwrap()
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(contents, vec!["one", "two", "three"]);
}

#[test]
fn append_sets_owner_and_updated_at() {
    let store = ConversationStore::new();
    let id = store.create_conversation(owner());
    let msg = store.append_message(id, MessageDraft::user("hi")).unwrap();
    assert_eq!(msg.conversation_id, id);
    assert_eq!(store.get_conversation(id).unwrap().updated_at, msg.timestamp);
}

#[test]
fn append_to_missing_conversation_is_not_found() {
    let store = ConversationStore::new();
    let missing = Uuid::new_v4();
    let err = store.append_message(missing, MessageDraft::user("x")).unwrap_err();
    assert_eq!(err, StoreError::NotFound(missing));
}

#[test]
fn counts_hold_across_mixed_operations() {
    let store = ConversationStore::with_welcome(owner());
    let user = owner();
    let mut ids = vec![store.active_conversation_id().unwrap()];
    for round in 0..12 {
        match round % 4 {
            0 => ids.push(store.create_conversation(user)),
            1 | 2 => {
                for id in &ids {
                    let _ = store.append_message(*id, MessageDraft::user(format!("m{round}")));
                }
            }
            _ => {
                let victim = ids.remove(0);
                assert!(store.delete_conversation(victim));
            }
        }
        assert_counts_match(&store);
    }
}

#[test]
fn concurrent_appends_keep_counts_exact() {
    let store = ConversationStore::new();
    let a = store.create_conversation(owner());
    let b = store.create_conversation(owner());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            let target = if i % 2 == 0 { a } else { b };
            std::thread::spawn(move || {
                for n in 0..50 {
                    store
                        .append_message(target, MessageDraft::user(format!("{i}-{n}")))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(store.get_conversation(a).unwrap().message_count, 200);
    assert_eq!(store.get_conversation(b).unwrap().message_count, 200);
    assert_counts_match(&store);
}

// =========================================================================
// delete / select
// =========================================================================

#[test]
fn delete_active_selects_first_remaining() {
    let store = ConversationStore::new();
    let user = owner();
    let a = store.create_conversation(user);
    let b = store.create_conversation(user);
    let c = store.create_conversation(user);
    store.select_conversation(b).unwrap();

    assert!(store.delete_conversation(b));
    assert_eq!(store.active_conversation_id(), Some(c));
    assert!(store.get_messages(b).is_err());

    let ids: Vec<Uuid> = store.list_conversations().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![c, a]);
}

#[test]
fn delete_inactive_keeps_active() {
    let store = ConversationStore::new();
    let user = owner();
    let a = store.create_conversation(user);
    let b = store.create_conversation(user);
    assert!(store.delete_conversation(a));
    assert_eq!(store.active_conversation_id(), Some(b));
}

#[test]
fn delete_last_leaves_nothing_active() {
    let store = ConversationStore::new();
    let a = store.create_conversation(owner());
    assert!(store.delete_conversation(a));
    assert!(store.list_conversations().is_empty());
    assert_eq!(store.active_conversation_id(), None);
}

#[test]
fn delete_unknown_is_noop() {
    let store = ConversationStore::new();
    let a = store.create_conversation(owner());
    assert!(!store.delete_conversation(Uuid::new_v4()));
    assert!(store.delete_conversation(a));
    assert!(!store.delete_conversation(a));
}

#[test]
fn select_unknown_fails_and_keeps_active() {
    let store = ConversationStore::new();
    let a = store.create_conversation(owner());
    let missing = Uuid::new_v4();
    assert_eq!(store.select_conversation(missing), Err(StoreError::NotFound(missing)));
    assert_eq!(store.active_conversation_id(), Some(a));
}

// =========================================================================
// rename / filter
// =========================================================================

#[test]
fn rename_trims_and_defaults_blank() {
    let store = ConversationStore::new();
    let id = store.create_conversation(owner());
    store.rename_conversation(id, "  Rust tips  ").unwrap();
    assert_eq!(store.get_conversation(id).unwrap().title, "Rust tips");
    store.rename_conversation(id, "   ").unwrap();
    assert_eq!(store.get_conversation(id).unwrap().title, DEFAULT_CONVERSATION_TITLE);
    assert!(store.rename_conversation(Uuid::new_v4(), "x").is_err());
}

#[test]
fn filter_is_case_insensitive_and_preserves_order() {
    let store = ConversationStore::new();
    let user = owner();
    let a = store.create_conversation(user);
    let b = store.create_conversation(user);
    let c = store.create_conversation(user);
    store.rename_conversation(a, "Rust lifetimes").unwrap();
    store.rename_conversation(b, "Cooking").unwrap();
    store.rename_conversation(c, "rusty bikes").unwrap();

    let hits: Vec<Uuid> = store.filter_conversations("RUST").iter().map(|c| c.id).collect();
    assert_eq!(hits, vec![c, a]);

    let all: Vec<Uuid> = store.list_conversations().iter().map(|c| c.id).collect();
    assert_eq!(all, vec![c, b, a]);
    assert_eq!(store.filter_conversations("").len(), 3);
}

// =========================================================================
// notifications
// =========================================================================

#[test]
fn subscribers_see_events_in_mutation_order() {
    let store = ConversationStore::new();
    let mut sub = store.subscribe();
    let a = store.create_conversation(owner());
    let msg = store.append_message(a, MessageDraft::user("hi")).unwrap();
    store.delete_conversation(a);

    assert_eq!(
        drain(&mut sub),
        vec![
            StoreEvent::Created { conversation_id: a },
            StoreEvent::Selected { conversation_id: Some(a) },
            StoreEvent::MessageAppended { conversation_id: a, message_id: msg.id },
            StoreEvent::Deleted { conversation_id: a },
            StoreEvent::Selected { conversation_id: None },
        ]
    );
}

#[test]
fn unsubscribe_stops_delivery() {
    let store = ConversationStore::new();
    let mut sub = store.subscribe();
    store.unsubscribe(sub.id);
    store.create_conversation(owner());
    assert!(drain(&mut sub).is_empty());
}

#[test]
fn failed_operations_emit_nothing() {
    let store = ConversationStore::new();
    let mut sub = store.subscribe();
    let _ = store.append_message(Uuid::new_v4(), MessageDraft::user("x"));
    let _ = store.select_conversation(Uuid::new_v4());
    store.delete_conversation(Uuid::new_v4());
    assert!(drain(&mut sub).is_empty());
}

#[test]
fn full_subscriber_misses_overflow_while_others_receive_all() {
    let store = ConversationStore::new();
    let mut slow = store.subscribe();
    let mut fast = store.subscribe();

    let id = store.create_conversation(owner());
    let mut fast_seen = drain(&mut fast);
    for i in 0..70 {
        store.append_message(id, MessageDraft::user(format!("m{i}"))).unwrap();
        fast_seen.extend(drain(&mut fast));
    }

    assert_eq!(fast_seen.len(), 72);
    let slow_seen = drain(&mut slow);
    assert_eq!(slow_seen.len(), SUBSCRIBER_BUFFER);
    assert_eq!(slow_seen[..], fast_seen[..SUBSCRIBER_BUFFER]);

    // A lagging subscriber stays registered and resumes once drained.
    let msg = store.append_message(id, MessageDraft::user("after")).unwrap();
    assert_eq!(
        drain(&mut slow),
        vec![StoreEvent::MessageAppended { conversation_id: id, message_id: msg.id }]
    );
}

#[test]
fn closed_subscriber_is_pruned_on_next_event() {
    let store = ConversationStore::new();
    let kept = store.subscribe();
    let closed = store.subscribe();
    drop(closed);
    assert_eq!(store.lock().subscribers.len(), 2);

    store.create_conversation(owner());
    let subscribers = store.lock().subscribers.keys().copied().collect::<Vec<_>>();
    assert_eq!(subscribers, vec![kept.id]);
}
