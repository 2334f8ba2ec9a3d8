//! Identity providers — the external capability behind the session gate.
//!
//! ARCHITECTURE
//! ============
//! Providers report failures as plain provider-formatted text
//! ([`IdentityError::Provider`]); the session gate owns the translation of
//! that text into the typed auth taxonomy. Both shipped providers render
//! errors the same way (`"<error_code>: <message>"`), so the same markers
//! work against either.

pub mod local;
pub mod supabase;

use async_trait::async_trait;

use crate::types::Session;

/// Marker the identity service uses for confirmation-email throttling.
pub const RATE_LIMIT_MARKER: &str = "over_email_send_rate_limit";
/// Marker for a sign-in before the address was confirmed.
pub const EMAIL_NOT_CONFIRMED_MARKER: &str = "email_not_confirmed";

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider rejected the request; the text is provider-formatted.
    #[error("{0}")]
    Provider(String),
    /// The provider could not be reached.
    #[error("identity request failed: {0}")]
    Transport(String),
    /// The provider answered with something unparseable.
    #[error("identity response parse failed: {0}")]
    Parse(String),
}

/// Session lookup and credential operations of an identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The session carried over from a previous run, if any.
    async fn current_session(&self) -> Result<Option<Session>, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    /// Register an account. Returns `None` when the provider requires the
    /// address to be confirmed before a session exists.
    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<Option<Session>, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;
}
