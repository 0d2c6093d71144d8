use thiserror::Error;
use uuid::Uuid;

/// Everything that can stop an interaction short of a designed terminal state.
///
/// Recognition failures (no-input, no-match, rejected validation) are NOT
/// errors. They are counted by the engine and surface only through the
/// failure callback or `Outcome::Failed`.
#[derive(Debug, Error)]
pub enum IvrError {
    // --- Configuration (fatal, raised before any collect) ---
    #[error("no grammar, grammar URL or digit limit configured")]
    MissingCollectionCriteria,

    #[error("both a grammar and a grammar URL are configured")]
    AmbiguousCollectionCriteria,

    #[error("menu has no prompts")]
    NoPrompts,

    #[error("max attempts must be at least 1")]
    InvalidMaxAttempts,

    #[error("no collect collaborator attached to the engine")]
    NoCollector,

    #[error("invalid menu config: {0}")]
    InvalidConfig(String),

    // --- Call lifecycle ---
    #[error("call {call_id} was terminated")]
    CallTerminated { call_id: Uuid },

    // --- Collaborator ---
    #[error("collaborator contract violated: {0}")]
    ContractViolation(String),

    #[error("collector failed: {0}")]
    Collector(String),

    #[error("collector transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode collector payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl IvrError {
    /// Configuration errors are never retried and never reach collect.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            IvrError::MissingCollectionCriteria
                | IvrError::AmbiguousCollectionCriteria
                | IvrError::NoPrompts
                | IvrError::InvalidMaxAttempts
                | IvrError::NoCollector
                | IvrError::InvalidConfig(_)
        )
    }
}
