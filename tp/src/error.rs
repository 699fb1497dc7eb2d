//! Workflow error types

use thiserror::Error;

use crate::llm::LlmError;
use crate::state::StoreError;
use crate::workflow::Stage;

/// Errors surfaced by planner operations
///
/// Provider parse failures never appear here: they degrade into empty
/// artifacts inside the parsers. The one exception is regeneration, where a
/// parse failure is reported so the caller knows nothing was replaced.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Stage {stage} is missing prerequisites, redirect to {redirect}")]
    PrerequisiteMissing { stage: Stage, redirect: Stage },

    #[error("Invalid index {index} (have {len})")]
    InvalidIndex { index: usize, len: usize },

    #[error("No suggestions provided")]
    EmptySuggestions,

    #[error("Failed to regenerate itinerary: provider reply did not parse")]
    RegenerationParseError,

    #[error("The {0} is no longer part of this session")]
    StaleArtifact(String),

    #[error("Selected mode '{mode}' has no generated option for {origin} -> {destination}")]
    SelectionMismatch {
        origin: String,
        destination: String,
        mode: String,
    },

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(#[source] LlmError),

    #[error("Provider timed out: {0}")]
    Timeout(#[source] LlmError),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Prompt rendering failed: {0}")]
    Prompt(String),

    #[error("Session store error: {0}")]
    Store(String),
}

impl PlannerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PlannerError::Validation(msg.into())
    }

    /// True for errors caused by the caller's input rather than the provider
    /// or the host
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PlannerError::Validation(_)
                | PlannerError::PrerequisiteMissing { .. }
                | PlannerError::InvalidIndex { .. }
                | PlannerError::EmptySuggestions
                | PlannerError::StaleArtifact(_)
                | PlannerError::SelectionMismatch { .. }
                | PlannerError::SessionNotFound(_)
        )
    }

    /// Stage a transport should redirect to, if this error asks for one
    pub fn redirect(&self) -> Option<Stage> {
        match self {
            PlannerError::PrerequisiteMissing { redirect, .. } => Some(*redirect),
            _ => None,
        }
    }
}

impl From<LlmError> for PlannerError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout(_) => PlannerError::Timeout(err),
            other => PlannerError::ProviderUnavailable(other),
        }
    }
}

impl From<StoreError> for PlannerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => PlannerError::SessionNotFound(id),
            StoreError::Stale(id) => PlannerError::StaleArtifact(id),
            StoreError::InvalidIndex { index, len } => PlannerError::InvalidIndex { index, len },
            StoreError::Rejected(msg) => PlannerError::Validation(msg),
            StoreError::ChannelError => PlannerError::Store(err.to_string()),
        }
    }
}
