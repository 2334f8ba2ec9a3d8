//! Session gate: resolves the authenticated identity before chat state is
//! shown, and translates identity-provider failures into [`AuthError`].
//!
//! DESIGN
//! ======
//! The gate is the only holder of the current [`Session`]. Provider errors
//! arrive as provider-formatted text; [`classify_auth_error`] is the single
//! place that pattern-matches that text, so a change in the provider's
//! message format touches one function.

use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use regex::Regex;
use tracing::{info, warn};

use crate::identity::{EMAIL_NOT_CONFIRMED_MARKER, IdentityError, IdentityProvider, RATE_LIMIT_MARKER};
use crate::types::Session;

/// Cooldown applied when a rate-limit message carries no figure.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
const FALLBACK_ERROR_MESSAGE: &str = "An error occurred";

static RETRY_AFTER_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"after (\d+) seconds").ok());

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Rate limit exceeded. Please wait {retry_after_secs} seconds before trying again.")]
    RateLimited { retry_after_secs: u64 },
    #[error(
        "Please check your email and click the confirmation link before signing in. Check your spam folder if you don't see the email."
    )]
    EmailNotConfirmed,
    #[error("{message}")]
    Generic { message: String },
}

/// Translate provider-formatted failure text into the auth taxonomy.
#[must_use]
pub fn classify_auth_error(text: &str) -> AuthError {
    if text.contains(RATE_LIMIT_MARKER) {
        let retry_after_secs = RETRY_AFTER_RE
            .as_ref()
            .and_then(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return AuthError::RateLimited { retry_after_secs };
    }
    if text.contains(EMAIL_NOT_CONFIRMED_MARKER) || text.contains("Email not confirmed") {
        return AuthError::EmailNotConfirmed;
    }
    let message = if text.trim().is_empty() { FALLBACK_ERROR_MESSAGE.to_owned() } else { text.to_owned() };
    AuthError::Generic { message }
}

impl From<IdentityError> for AuthError {
    fn from(err: IdentityError) -> Self {
        classify_auth_error(&err.to_string())
    }
}

// =============================================================================
// GATE
// =============================================================================

pub struct SessionGate {
    provider: Arc<dyn IdentityProvider>,
    session: Mutex<Option<Session>>,
}

impl SessionGate {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider, session: Mutex::new(None) }
    }

    /// Current session, if signed in.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_session(&self, session: Option<Session>) {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Look up a session carried over from a previous run. Provider failures
    /// are logged and treated as signed out.
    pub async fn resolve_session(&self) -> Option<Session> {
        let resolved = match self.provider.current_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "session gate: session lookup failed; continuing signed out");
                None
            }
        };
        self.set_session(resolved.clone());
        resolved
    }

    /// # Errors
    ///
    /// Returns the classified provider failure.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        match self.provider.sign_in(email, password).await {
            Ok(session) => {
                info!(user_id = %session.id, "session gate: signed in");
                self.set_session(Some(session));
                Ok(())
            }
            Err(e) => {
                let err = AuthError::from(e);
                info!(error = %err, "session gate: sign-in rejected");
                Err(err)
            }
        }
    }

    /// Register an account. Succeeds without a session when the provider
    /// requires email confirmation first.
    ///
    /// # Errors
    ///
    /// Returns the classified provider failure.
    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<(), AuthError> {
        match self.provider.sign_up(email, password, name).await {
            Ok(Some(session)) => {
                info!(user_id = %session.id, "session gate: signed up");
                self.set_session(Some(session));
                Ok(())
            }
            Ok(None) => {
                info!("session gate: sign-up awaiting email confirmation");
                Ok(())
            }
            Err(e) => {
                let err = AuthError::from(e);
                info!(error = %err, "session gate: sign-up rejected");
                Err(err)
            }
        }
    }

    /// # Errors
    ///
    /// Returns the classified provider failure; the local session is kept.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.provider.sign_out().await?;
        self.set_session(None);
        info!("session gate: signed out");
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
