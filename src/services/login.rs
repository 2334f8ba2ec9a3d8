//! Login form state machine.
//!
//! DESIGN
//! ======
//! Phases run `Idle -> Submitting -> {Idle(error) | Success}`. A rate-limit
//! error starts a [`Cooldown`] that blocks submission until it reaches zero
//! regardless of phase; the host drives it once per second with
//! [`cooldown_ticker`] and [`LoginForm::tick`]. The sign-in/sign-up mode is
//! orthogonal: switching it keeps field values and any pending error.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::session::{AuthError, SessionGate};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Idle,
    Submitting,
    Success,
}

/// Visual channel of an inline notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Warning,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

// =============================================================================
// COOLDOWN
// =============================================================================

/// Whole-second countdown started by a rate-limit rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cooldown {
    remaining_secs: u64,
}

impl Cooldown {
    pub fn start(&mut self, secs: u64) {
        self.remaining_secs = secs;
    }

    /// Advance one second. Returns the seconds left.
    pub fn tick(&mut self) -> u64 {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.remaining_secs
    }

    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.remaining_secs
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.remaining_secs > 0
    }
}

/// One-second ticker whose first tick fires one second from now.
#[must_use]
pub fn cooldown_ticker() -> Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

// =============================================================================
// FORM
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Only sent in sign-up mode.
    pub name: String,
    mode: AuthMode,
    phase: FormPhase,
    error: Option<AuthError>,
    cooldown: Cooldown,
}

impl LoginForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AuthMode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        };
    }

    #[must_use]
    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    #[must_use]
    pub fn error(&self) -> Option<&AuthError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn cooldown_remaining(&self) -> u64 {
        self.cooldown.remaining()
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.phase != FormPhase::Submitting && !self.cooldown.is_active()
    }

    /// Enter `Submitting`, clearing any previous error. Returns `false` and
    /// changes nothing when submission is blocked.
    pub fn begin_submit(&mut self) -> bool {
        if !self.can_submit() {
            return false;
        }
        self.phase = FormPhase::Submitting;
        self.error = None;
        true
    }

    /// Apply the outcome of a submission started with [`Self::begin_submit`].
    pub fn finish(&mut self, outcome: Result<(), AuthError>) {
        match outcome {
            Ok(()) => {
                self.phase = FormPhase::Success;
                self.error = None;
            }
            Err(err) => {
                self.phase = FormPhase::Idle;
                if let AuthError::RateLimited { retry_after_secs } = err {
                    self.cooldown.start(retry_after_secs);
                    if retry_after_secs == 0 {
                        return;
                    }
                }
                self.error = Some(err);
            }
        }
    }

    /// Submit the current fields through the gate in the current mode.
    /// Returns the resulting phase; a blocked form is left untouched.
    pub async fn submit(&mut self, gate: &SessionGate) -> FormPhase {
        if !self.begin_submit() {
            return self.phase;
        }
        let outcome = match self.mode {
            AuthMode::SignIn => gate.sign_in(self.email.trim(), &self.password).await,
            AuthMode::SignUp => gate.sign_up(self.email.trim(), &self.password, self.name.trim()).await,
        };
        self.finish(outcome);
        self.phase
    }

    /// Advance the rate-limit countdown by one second. At zero the
    /// rate-limit error clears and submission re-enables.
    pub fn tick(&mut self) {
        if !self.cooldown.is_active() {
            return;
        }
        let remaining = self.cooldown.tick();
        if remaining == 0 {
            if matches!(self.error, Some(AuthError::RateLimited { .. })) {
                self.error = None;
            }
        } else if let Some(AuthError::RateLimited { retry_after_secs }) = &mut self.error {
            *retry_after_secs = remaining;
        }
    }

    pub fn dismiss(&mut self) {
        self.error = None;
    }

    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        let err = self.error.as_ref()?;
        let kind = match err {
            AuthError::RateLimited { .. } => NoticeKind::Warning,
            AuthError::EmailNotConfirmed => NoticeKind::Info,
            AuthError::Generic { .. } => NoticeKind::Error,
        };
        Some(Notice { kind, text: err.to_string() })
    }

    #[must_use]
    pub fn submit_label(&self) -> String {
        if self.phase == FormPhase::Submitting {
            return "Please wait...".into();
        }
        if self.cooldown.is_active() {
            return format!("Wait {}s", self.cooldown.remaining());
        }
        match self.mode {
            AuthMode::SignIn => "Sign In".into(),
            AuthMode::SignUp => "Create Account".into(),
        }
    }
}

#[cfg(test)]
#[path = "login_test.rs"]
mod tests;
