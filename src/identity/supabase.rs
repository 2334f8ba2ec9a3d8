//! Supabase (GoTrue) password-auth adapter.
//!
//! Thin HTTP wrapper over `/auth/v1`. The access token from the last
//! successful sign-in is kept in memory and used for `user` and `logout`
//! calls. Response parsing is pure for testability.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::{IdentityError, IdentityProvider};
use crate::types::Session;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const FALLBACK_DISPLAY_NAME: &str = "User";

/// Supabase project settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    /// Access token of an earlier session, if the host kept one.
    pub access_token: Option<String>,
}

pub struct SupabaseIdentity {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Mutex<Option<String>>,
}

impl SupabaseIdentity {
    /// # Errors
    ///
    /// Returns [`IdentityError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: SupabaseConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: format!("{}/auth/v1", config.url.trim_end_matches('/')),
            anon_key: config.anon_key,
            access_token: Mutex::new(config.access_token),
        })
    }

    fn token(&self) -> Option<String> {
        self.access_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_token(&self, token: Option<String>) {
        *self
            .access_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(u16, String), IdentityError> {
        let response = request
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        Ok((status, body))
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn current_session(&self) -> Result<Option<Session>, IdentityError> {
        let Some(token) = self.token() else {
            return Ok(None);
        };
        let (status, body) = self
            .send(self.http.get(format!("{}/user", self.base_url)).bearer_auth(&token))
            .await?;
        if status == 401 || status == 403 {
            debug!(status, "supabase: stored token rejected");
            self.set_token(None);
            return Ok(None);
        }
        if !(200..300).contains(&status) {
            return Err(provider_error(status, &body));
        }
        parse_user(&body).map(Some)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let request = self
            .http
            .post(format!("{}/token?grant_type=password", self.base_url))
            .json(&serde_json::json!({ "email": email, "password": password }));
        let (status, body) = self.send(request).await?;
        if !(200..300).contains(&status) {
            return Err(provider_error(status, &body));
        }
        let (session, token) = parse_auth_response(&body)?;
        let Some(token) = token else {
            return Err(IdentityError::Parse("sign-in response carried no access token".into()));
        };
        self.set_token(Some(token));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<Option<Session>, IdentityError> {
        let request = self.http.post(format!("{}/signup", self.base_url)).json(&serde_json::json!({
            "email": email,
            "password": password,
            "data": { "name": name },
        }));
        let (status, body) = self.send(request).await?;
        if !(200..300).contains(&status) {
            return Err(provider_error(status, &body));
        }
        let (session, token) = parse_auth_response(&body)?;
        match token {
            Some(token) => {
                self.set_token(Some(token));
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let Some(token) = self.token() else {
            return Ok(());
        };
        let (status, body) = self
            .send(self.http.post(format!("{}/logout", self.base_url)).bearer_auth(&token))
            .await?;
        // An expired token is already signed out.
        if !(200..300).contains(&status) && status != 401 {
            return Err(provider_error(status, &body));
        }
        self.set_token(None);
        Ok(())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct ApiUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
    #[serde(default)]
    user_metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ApiAuthResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<ApiUser>,
}

#[derive(Deserialize, Default)]
struct ApiError {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// =============================================================================
// PARSING
// =============================================================================

impl From<ApiUser> for Session {
    fn from(user: ApiUser) -> Self {
        let name = user
            .user_metadata
            .as_ref()
            .and_then(|m| m.get("name"))
            .and_then(serde_json::Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
            .to_owned();
        Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
            name,
            created_at: user.created_at.unwrap_or_else(OffsetDateTime::now_utc),
        }
    }
}

fn parse_user(body: &str) -> Result<Session, IdentityError> {
    let user: ApiUser = serde_json::from_str(body).map_err(|e| IdentityError::Parse(e.to_string()))?;
    Ok(user.into())
}

/// Parse a token or sign-up response. Sign-up without auto-confirm returns a
/// bare user object, which yields a session with no token.
fn parse_auth_response(body: &str) -> Result<(Session, Option<String>), IdentityError> {
    let api: ApiAuthResponse = serde_json::from_str(body).map_err(|e| IdentityError::Parse(e.to_string()))?;
    match api.user {
        Some(user) => Ok((user.into(), api.access_token)),
        None => Ok((parse_user(body)?, api.access_token)),
    }
}

/// Render an error body as `"<error_code>: <message>"`.
fn provider_error(status: u16, body: &str) -> IdentityError {
    let api: ApiError = serde_json::from_str(body).unwrap_or_default();
    let code = api.error_code.or(api.error);
    let message = api
        .msg
        .or(api.error_description)
        .or(api.message)
        .unwrap_or_else(|| format!("identity service returned status {status}"));
    IdentityError::Provider(match code {
        Some(code) => format!("{code}: {message}"),
        None => message,
    })
}

#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;
