//! Search-augmentation rule and citation extraction.
//!
//! A request is search-augmented when the caller turns search mode on, or
//! when the outgoing text contains one of [`SEARCH_KEYWORDS`] (ignoring
//! case). The resulting directive is the outgoing text itself.

pub const SEARCH_KEYWORDS: [&str; 7] = ["latest", "current", "recent", "news", "search", "find", "research"];

/// `true` if `text` contains any search keyword, ignoring case.
#[must_use]
pub fn mentions_search_keyword(text: &str) -> bool {
    let lowered = text.to_lowercase();
    SEARCH_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

/// The directive to pass to the completion provider, if any.
#[must_use]
pub fn resolve_search_directive(text: &str, search_mode: bool) -> Option<String> {
    (search_mode || mentions_search_keyword(text)).then(|| text.trim().to_owned())
}

/// `http(s)://` URLs cited in `text`, in order of first appearance.
///
/// Trailing punctuation and markdown link delimiters are stripped.
#[must_use]
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for token in text.split(|c: char| c.is_whitespace() || matches!(c, '(' | '<' | '[' | '"')) {
        if !(token.starts_with("http://") || token.starts_with("https://")) {
            continue;
        }
        let url = token.trim_end_matches(|c: char| matches!(c, ')' | '>' | ']' | '.' | ',' | ';' | ':' | '"' | '!' | '?'));
        if url.len() > "https://".len() && !urls.iter().any(|u| u == url) {
            urls.push(url.to_owned());
        }
    }
    urls
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
