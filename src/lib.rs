//! Arsenal AI chat core: session gate, conversation store, and response
//! orchestrator, plus the identity and completion providers they call.

pub mod config;
pub mod identity;
pub mod llm;
pub mod services;
pub mod store;
pub mod types;
