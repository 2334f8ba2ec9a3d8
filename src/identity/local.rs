//! In-process identity provider for demos and offline use.
//!
//! DESIGN
//! ======
//! Accounts live in memory with salted SHA-256 password hashes. When
//! confirmation is required, sign-up "sends" a confirmation email and
//! sign-in is refused until [`LocalIdentity::confirm_email`] is called.
//! Repeat confirmation emails to one address are throttled, and the refusal
//! uses the same wording as the hosted service so the session gate treats
//! both providers alike.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::{EMAIL_NOT_CONFIRMED_MARKER, IdentityError, IdentityProvider, RATE_LIMIT_MARKER};
use crate::types::Session;

pub const DEFAULT_EMAIL_INTERVAL_SECS: u64 = 60;
const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    session: Session,
    password_hash: String,
    confirmed: bool,
    last_email_sent: Option<Instant>,
}

#[derive(Default)]
struct LocalInner {
    accounts: HashMap<String, Account>,
    current: Option<Session>,
}

pub struct LocalIdentity {
    inner: Mutex<LocalInner>,
    require_confirmation: bool,
    email_interval: Duration,
}

impl LocalIdentity {
    #[must_use]
    pub fn new(require_confirmation: bool, email_interval: Duration) -> Self {
        Self { inner: Mutex::new(LocalInner::default()), require_confirmation, email_interval }
    }

    fn lock(&self) -> MutexGuard<'_, LocalInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark an address as confirmed. Returns `false` for unknown addresses.
    pub fn confirm_email(&self, email: &str) -> bool {
        let Some(email) = normalize_email(email) else {
            return false;
        };
        let mut inner = self.lock();
        let Some(account) = inner.accounts.get_mut(&email) else {
            return false;
        };
        account.confirmed = true;
        true
    }

    fn register_at(
        &self,
        email: &str,
        password: &str,
        name: &str,
        now: Instant,
    ) -> Result<Option<Session>, IdentityError> {
        let email = normalize_email(email)
            .ok_or_else(|| IdentityError::Provider("validation_failed: Unable to validate email address: invalid format".into()))?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::Provider(format!(
                "weak_password: Password should be at least {MIN_PASSWORD_LEN} characters."
            )));
        }

        let mut inner = self.lock();
        if let Some(existing) = inner.accounts.get_mut(&email) {
            if existing.confirmed {
                return Err(IdentityError::Provider("user_already_exists: User already registered".into()));
            }
            // Unconfirmed re-registration resends the confirmation email.
            throttle_email(existing, now, self.email_interval)?;
            return Ok(None);
        }

        let id = Uuid::new_v4();
        let display_name = if name.trim().is_empty() { "User" } else { name.trim() };
        let session =
            Session { id, email: email.clone(), name: display_name.to_owned(), created_at: OffsetDateTime::now_utc() };
        let mut account = Account {
            session: session.clone(),
            password_hash: hash_password(id, password),
            confirmed: !self.require_confirmation,
            last_email_sent: None,
        };

        if self.require_confirmation {
            throttle_email(&mut account, now, self.email_interval)?;
            info!(%email, "local identity: confirmation email sent");
            inner.accounts.insert(email, account);
            return Ok(None);
        }

        inner.accounts.insert(email, account);
        inner.current = Some(session.clone());
        Ok(Some(session))
    }

    fn authenticate(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let invalid = || IdentityError::Provider("invalid_credentials: Invalid login credentials".into());
        let email = normalize_email(email).ok_or_else(invalid)?;

        let mut inner = self.lock();
        let account = inner.accounts.get(&email).ok_or_else(invalid)?;
        if account.password_hash != hash_password(account.session.id, password) {
            return Err(invalid());
        }
        if !account.confirmed {
            return Err(IdentityError::Provider(format!("{EMAIL_NOT_CONFIRMED_MARKER}: Email not confirmed")));
        }
        let session = account.session.clone();
        inner.current = Some(session.clone());
        Ok(session)
    }
}

impl Default for LocalIdentity {
    fn default() -> Self {
        Self::new(false, Duration::from_secs(DEFAULT_EMAIL_INTERVAL_SECS))
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn current_session(&self) -> Result<Option<Session>, IdentityError> {
        Ok(self.lock().current.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        self.authenticate(email, password)
    }

    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<Option<Session>, IdentityError> {
        self.register_at(email, password, name, Instant::now())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.lock().current = None;
        Ok(())
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn throttle_email(account: &mut Account, now: Instant, interval: Duration) -> Result<(), IdentityError> {
    if let Some(sent) = account.last_email_sent {
        let elapsed = now.saturating_duration_since(sent);
        if elapsed < interval {
            let remaining = (interval - elapsed).as_secs_f64().ceil();
            return Err(IdentityError::Provider(format!(
                "{RATE_LIMIT_MARKER}: For security purposes, you can only request this after {remaining} seconds."
            )));
        }
    }
    account.last_email_sent = Some(now);
    Ok(())
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

fn hash_password(salt: Uuid, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize().iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
#[path = "local_test.rs"]
mod tests;
