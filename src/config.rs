//! Application configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! `from_env` delegates to `from_lookup` so parsing is exercised in tests
//! against a plain map instead of the process environment. LLM settings are
//! only read when the LLM completion backend is selected.

use std::time::Duration;

use crate::identity::local::DEFAULT_EMAIL_INTERVAL_SECS;
use crate::identity::supabase::SupabaseConfig;
use crate::llm::config::LlmConfig;
use crate::llm::mock::{DEFAULT_MOCK_DELAY_MS, DEFAULT_MOCK_JITTER_MS};
use crate::llm::types::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required config: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityConfig {
    Local { require_confirmation: bool, email_interval: Duration },
    Supabase(SupabaseConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionConfig {
    Mock { delay: Duration, jitter: Duration },
    Llm(LlmConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub identity: IdentityConfig,
    pub completion: CompletionConfig,
    /// Upper bound on one provider call; `None` waits indefinitely.
    pub generation_timeout: Option<Duration>,
}

impl AppConfig {
    /// # Errors
    ///
    /// See [`AppConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary key lookup.
    ///
    /// - `ARSENAL_IDENTITY`: `local` (default) or `supabase`
    /// - `SUPABASE_URL`, `SUPABASE_ANON_KEY`: required for `supabase`
    /// - `SUPABASE_ACCESS_TOKEN`: optional token of a previous session
    /// - `ARSENAL_LOCAL_REQUIRE_CONFIRMATION`: default false
    /// - `ARSENAL_LOCAL_EMAIL_INTERVAL_SECS`: default 60
    /// - `ARSENAL_COMPLETION`: `mock` (default) or `llm`
    /// - `ARSENAL_MOCK_DELAY_MS`, `ARSENAL_MOCK_JITTER_MS`: default 1500 / 2000
    /// - `ARSENAL_GENERATION_TIMEOUT_SECS`: optional
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for missing required keys, unparseable
    /// values, or an invalid LLM configuration.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let identity = match get("ARSENAL_IDENTITY").as_deref().unwrap_or("local") {
            "local" => IdentityConfig::Local {
                require_confirmation: parse_bool(
                    "ARSENAL_LOCAL_REQUIRE_CONFIRMATION",
                    get("ARSENAL_LOCAL_REQUIRE_CONFIRMATION"),
                    false,
                )?,
                email_interval: Duration::from_secs(parse_u64(
                    "ARSENAL_LOCAL_EMAIL_INTERVAL_SECS",
                    get("ARSENAL_LOCAL_EMAIL_INTERVAL_SECS"),
                )?
                .unwrap_or(DEFAULT_EMAIL_INTERVAL_SECS)),
            },
            "supabase" => IdentityConfig::Supabase(SupabaseConfig {
                url: get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
                anon_key: get("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?,
                access_token: get("SUPABASE_ACCESS_TOKEN"),
            }),
            other => return Err(ConfigError::Invalid { key: "ARSENAL_IDENTITY", value: other.to_owned() }),
        };

        let completion = match get("ARSENAL_COMPLETION").as_deref().unwrap_or("mock") {
            "mock" => CompletionConfig::Mock {
                delay: Duration::from_millis(
                    parse_u64("ARSENAL_MOCK_DELAY_MS", get("ARSENAL_MOCK_DELAY_MS"))?.unwrap_or(DEFAULT_MOCK_DELAY_MS),
                ),
                jitter: Duration::from_millis(
                    parse_u64("ARSENAL_MOCK_JITTER_MS", get("ARSENAL_MOCK_JITTER_MS"))?
                        .unwrap_or(DEFAULT_MOCK_JITTER_MS),
                ),
            },
            "llm" => CompletionConfig::Llm(LlmConfig::from_lookup(&lookup)?),
            other => return Err(ConfigError::Invalid { key: "ARSENAL_COMPLETION", value: other.to_owned() }),
        };

        let generation_timeout = parse_u64("ARSENAL_GENERATION_TIMEOUT_SECS", get("ARSENAL_GENERATION_TIMEOUT_SECS"))?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self { identity, completion, generation_timeout })
    }
}

fn parse_u64(key: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    raw.map(|v| v.parse::<u64>().map_err(|_| ConfigError::Invalid { key, value: v }))
        .transpose()
}

fn parse_bool(key: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
