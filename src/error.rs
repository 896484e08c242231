//! Error types and handling for Fairroll
//!
//! The taxonomy mirrors how a round can end badly: the local environment
//! failed (fatal), the peer exchange failed (the round expires), or the peer's
//! reveal does not match what it committed to (a trust violation).

use thiserror::Error;

use crate::protocol::{Outcome, Roll};

/// Result type alias for Fairroll operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fairroll error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("Environment failure: {0}")]
    Environment(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Commitment verification failed: {0}")]
    Verification(#[from] VerificationFailure),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Round not found: {0}")]
    RoundNotFound(u64),

    #[error("Access denied to round {0}")]
    AccessDenied(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error categories, used to decide how a round reacts to a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Entropy or hashing unavailable; the round cannot run at all
    Environment,
    /// The peer exchange failed or answered with a non-success status
    Transport,
    /// The peer answered with malformed or missing fields
    Protocol,
    /// The peer's reveal contradicts its commitment
    Security,
    /// Local input validation errors
    Validation,
    /// Configuration and setup errors
    Configuration,
}

impl Error {
    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Environment(_) => ErrorCategory::Environment,
            Self::Transport(_)
            | Self::Timeout(_)
            | Self::RoundNotFound(_)
            | Self::AccessDenied(_)
            | Self::Io(_) => ErrorCategory::Transport,
            Self::ProtocolViolation(_) | Self::Serialization(_) => ErrorCategory::Protocol,
            Self::Verification(_) => ErrorCategory::Security,
            Self::InvalidData(_) | Self::InvalidState(_) => ErrorCategory::Validation,
            Self::Config(_) => ErrorCategory::Configuration,
        }
    }

    /// Whether a round hitting this error should end as EXPIRED.
    ///
    /// Transport and protocol errors expire the round. Environment failures
    /// abort instead, and verification failures have their own terminal state.
    pub fn expires_round(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transport | ErrorCategory::Protocol
        )
    }
}

/// The specific claim of the peer that did not survive re-verification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationFailure {
    #[error("revealed server nonce does not match its commitment")]
    NonceCommitment,

    #[error("revealed roll and nonce do not match the hash commitment")]
    RollCommitment,

    #[error("server roll claimed {claimed}, derived {derived}")]
    ServerRoll { claimed: Roll, derived: Roll },

    #[error("client roll claimed {claimed}, derived {derived}")]
    ClientRoll { claimed: Roll, derived: Roll },

    #[error("outcome claimed {claimed}, computed {computed}")]
    OutcomeLabel { claimed: Outcome, computed: Outcome },

    #[error("reveal is missing {0}")]
    MissingReveal(&'static str),
}
