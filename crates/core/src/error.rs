//! Shared error type for the routing core
//!
//! Every crate in this workspace defines its own error enum for its own
//! failure domain and converts into `CoreError` at the boundary, the same
//! way `voice_agent_pipeline::PipelineError` converts into
//! `voice_agent_core::Error` in the teacher codebase.

use thiserror::Error;

/// Core errors shared across the routing pipeline.
///
/// None of these are meant to cross the public `query()` boundary (see
/// §7 of SPEC_FULL.md) — callers at that boundary degrade to a no-match
/// response instead of propagating an error.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    #[error("unknown tenant: {0}")]
    UnknownTenant(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("llm unavailable: {0}")]
    LlmUnavailable(String),

    #[error("budget exceeded for tenant {0}")]
    BudgetExceeded(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
