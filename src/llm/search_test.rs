use super::*;

#[test]
fn keyword_triggers_directive_without_search_mode() {
    let directive = resolve_search_directive("what's the latest news on AI", false);
    assert_eq!(directive.as_deref(), Some("what's the latest news on AI"));
}

#[test]
fn keyword_match_ignores_case() {
    assert!(mentions_search_keyword("RECENT papers"));
    assert!(mentions_search_keyword("Can you Research this?"));
    assert!(!mentions_search_keyword("explain quantum computing"));
}

#[test]
fn search_mode_forces_directive() {
    assert_eq!(resolve_search_directive("  explain borrowck ", true).as_deref(), Some("explain borrowck"));
    assert_eq!(resolve_search_directive("explain borrowck", false), None);
}

#[test]
fn every_keyword_is_recognised() {
    for kw in SEARCH_KEYWORDS {
        assert!(mentions_search_keyword(&format!("please {kw} it")), "{kw}");
    }
}

#[test]
fn extract_urls_from_markdown_and_prose() {
    let text = "See [TechCrunch](https://techcrunch.com/ai-developments-2024) and https://ai.meta.com/llama. \
                Also <https://openai.com/research/production-ai>, then https://ai.meta.com/llama again.";
    assert_eq!(
        extract_urls(text),
        vec![
            "https://techcrunch.com/ai-developments-2024",
            "https://ai.meta.com/llama",
            "https://openai.com/research/production-ai",
        ]
    );
}

#[test]
fn extract_urls_ignores_bare_scheme() {
    assert!(extract_urls("https:// nothing here").is_empty());
    assert!(extract_urls("no links at all").is_empty());
}
