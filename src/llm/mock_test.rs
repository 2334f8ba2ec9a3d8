use super::*;
use crate::types::Role;
use uuid::Uuid;

fn history(n: usize) -> Vec<Message> {
    let conversation_id = Uuid::new_v4();
    (0..n)
        .map(|i| Message {
            id: Uuid::new_v4(),
            content: format!("turn {i}"),
            role: if i % 2 == 0 { Role::User } else { Role::Assistant },
            timestamp: time::OffsetDateTime::now_utc(),
            conversation_id,
            sources: None,
            thinking: false,
        })
        .collect()
}

#[test]
fn plain_answer_has_no_sources() {
    let out = compose_answer("Hi there", 1, false);
    assert_eq!(out.content, "Hi there");
    assert_eq!(out.sources, None);
}

#[test]
fn searched_answer_lists_sources() {
    let out = compose_answer("Hi there", 1, true);
    assert!(out.content.starts_with("I've searched the web"));
    assert!(out.content.contains("**Sources:**"));
    assert!(out.content.contains("• [LLaMA 2 Dataset and Training - Meta AI Research](https://ai.meta.com/llama)"));
    assert_eq!(
        out.sources.unwrap(),
        vec![
            "https://techcrunch.com/ai-developments-2024",
            "https://ai.meta.com/llama",
            "https://openai.com/research/production-ai",
        ]
    );
}

#[test]
fn long_history_gets_conversational_prefix() {
    assert!(!compose_answer("x", 3, false).content.starts_with("Based on our conversation"));
    assert_eq!(compose_answer("x", 4, false).content, "Based on our conversation, x");
    assert!(compose_answer("x", 4, true).content.starts_with("Based on our conversation, I've searched"));
}

#[test]
fn search_web_filters_by_title_or_snippet() {
    let hits = search_web("llama");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].url, "https://ai.meta.com/llama");

    assert_eq!(search_web("SAFETY").len(), 1);
    assert_eq!(search_web("").len(), MOCK_SEARCH_RESULTS.len());
    assert!(search_web("gardening").is_empty());
}

#[tokio::test]
async fn seeded_provider_is_deterministic() {
    let a = MockCompletionProvider::seeded(7);
    let b = MockCompletionProvider::seeded(7);
    let h = history(1);
    for _ in 0..5 {
        let left = a.generate(&h, None).await.unwrap();
        let right = b.generate(&h, None).await.unwrap();
        assert_eq!(left, right);
        assert!(MOCK_RESPONSES.contains(&left.content.as_str()));
    }
}

#[tokio::test]
async fn directive_adds_sources() {
    let provider = MockCompletionProvider::seeded(1);
    let out = provider.generate(&history(1), Some("latest news")).await.unwrap();
    assert_eq!(out.sources.map(|s| s.len()), Some(3));
}

#[tokio::test(start_paused = true)]
async fn latency_is_simulated() {
    let provider = MockCompletionProvider::new(Duration::from_millis(1500), Duration::ZERO);
    let started = tokio::time::Instant::now();
    provider.generate(&history(1), None).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(1500));
}
