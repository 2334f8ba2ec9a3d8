//! Application services consumed by the terminal front-end.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the behavioral contracts (authentication gate, login
//! form state, response generation) so the presentation layer only renders
//! state and forwards user input.

pub mod chat;
pub mod login;
pub mod session;
