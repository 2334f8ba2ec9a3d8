//! Mock completion provider with canned answers and simulated web search.
//!
//! DESIGN
//! ======
//! Stands in for a real model during demos. Latency and answer choice are
//! random, but both the RNG seed and the delay are injectable so tests can
//! make the output deterministic.

use std::fmt::Write;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::{Completion, CompletionProvider, LlmError};
use crate::types::Message;

pub const DEFAULT_MOCK_DELAY_MS: u64 = 1500;
pub const DEFAULT_MOCK_JITTER_MS: u64 = 2000;

/// Canned assistant answers.
pub const MOCK_RESPONSES: [&str; 4] = [
    "Hello! I'm Arsenal AI, your advanced AI assistant. I can help you with complex questions, research, coding, analysis, and much more. I have access to real-time web search to provide you with the most current information. What would you like to explore today?",
    "I can assist you with a wide range of tasks including:\n\n• **Research & Analysis** - Deep dive into any topic with web search\n• **Code Development** - Full-stack development, debugging, optimization\n• **Creative Writing** - Stories, articles, scripts, and more\n• **Problem Solving** - Complex mathematical and logical problems\n• **Learning Support** - Explanations, tutorials, and educational content\n\nWhat specific area interests you most?",
    "Based on my web search capabilities, I can provide you with the latest information on any topic. I continuously learn from interactions and can adapt my responses based on context and user preferences. My knowledge spans across:\n\n```\n- Technology & Programming\n- Science & Research\n- Business & Finance\n- Arts & Culture\n- Current Events\n- And much more...\n```\n\nHow can I help you today?",
    "I notice you're interested in advanced AI capabilities. Let me search for the latest developments in AI technology...\n\n*[Searching the web for latest AI developments]*\n\nBased on recent findings, the field of AI is rapidly evolving with breakthroughs in:\n\n• **Large Language Models** - More efficient and capable models\n• **Multimodal AI** - Integration of text, image, and audio processing\n• **AI Safety** - Advanced alignment and safety research\n• **Edge AI** - Running AI models on local devices\n\nWould you like me to dive deeper into any of these areas?",
];

/// A canned web search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub title: &'static str,
    pub url: &'static str,
    pub snippet: &'static str,
}

pub const MOCK_SEARCH_RESULTS: [SearchResult; 3] = [
    SearchResult {
        title: "Latest AI Developments 2024 - TechCrunch",
        url: "https://techcrunch.com/ai-developments-2024",
        snippet: "Comprehensive overview of the latest breakthroughs in artificial intelligence, including new model architectures and applications.",
    },
    SearchResult {
        title: "LLaMA 2 Dataset and Training - Meta AI Research",
        url: "https://ai.meta.com/llama",
        snippet: "Official documentation and research papers on LLaMA 2 dataset, training methodologies, and performance benchmarks.",
    },
    SearchResult {
        title: "Building Production AI Systems - OpenAI",
        url: "https://openai.com/research/production-ai",
        snippet: "Best practices for deploying AI systems at scale, including safety considerations and performance optimization.",
    },
];

/// Canned results whose title or snippet contains `query`, ignoring case.
#[must_use]
pub fn search_web(query: &str) -> Vec<SearchResult> {
    let needle = query.to_lowercase();
    MOCK_SEARCH_RESULTS
        .iter()
        .filter(|r| r.title.to_lowercase().contains(&needle) || r.snippet.to_lowercase().contains(&needle))
        .copied()
        .collect()
}

// =============================================================================
// PROVIDER
// =============================================================================

pub struct MockCompletionProvider {
    rng: Mutex<StdRng>,
    delay: Duration,
    jitter: Duration,
}

impl MockCompletionProvider {
    #[must_use]
    pub fn new(delay: Duration, jitter: Duration) -> Self {
        Self { rng: Mutex::new(StdRng::from_os_rng()), delay, jitter }
    }

    /// Zero-latency provider with a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)), delay: Duration::ZERO, jitter: Duration::ZERO }
    }

    /// Pick the answer index and the simulated latency in one lock.
    fn roll(&self) -> (usize, Duration) {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let index = rng.random_range(0..MOCK_RESPONSES.len());
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let extra = if jitter_ms == 0 { 0 } else { rng.random_range(0..jitter_ms) };
        (index, self.delay + Duration::from_millis(extra))
    }
}

impl Default for MockCompletionProvider {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_MOCK_DELAY_MS), Duration::from_millis(DEFAULT_MOCK_JITTER_MS))
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn generate(&self, history: &[Message], directive: Option<&str>) -> Result<Completion, LlmError> {
        let (index, latency) = self.roll();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Ok(compose_answer(MOCK_RESPONSES[index], history.len(), directive.is_some()))
    }
}

/// Decorate a canned answer: search banner and sources when searching, and a
/// conversational prefix once the history is longer than three turns.
#[must_use]
pub fn compose_answer(base: &str, history_len: usize, searched: bool) -> Completion {
    let mut content = base.to_owned();
    let mut sources = None;

    if searched {
        let mut listing = String::new();
        for (i, result) in MOCK_SEARCH_RESULTS.iter().enumerate() {
            if i > 0 {
                listing.push('\n');
            }
            let _ = write!(listing, "• [{}]({})", result.title, result.url);
        }
        content = format!(
            "I've searched the web for the latest information on your query.\n\n{content}\n\n**Sources:**\n{listing}"
        );
        sources = Some(MOCK_SEARCH_RESULTS.iter().map(|r| r.url.to_owned()).collect());
    }

    if history_len > 3 {
        content = format!("Based on our conversation, {content}");
    }

    Completion { content, sources }
}

#[cfg(test)]
#[path = "mock_test.rs"]
mod tests;
