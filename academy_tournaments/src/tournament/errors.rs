//! Tournament engine error types.

use super::models::{ParticipantId, SessionId, TournamentId, TournamentStatus};
use crate::catalog::FormatCode;
use thiserror::Error;

/// Errors raised by schedule generation, ranking and reward payout
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Roster size outside the format bounds
    #[error("{format} needs between {min} and {max} participants, got {count}")]
    InvalidParticipantCount {
        format: FormatCode,
        count: usize,
        min: usize,
        max: usize,
    },

    /// Power-of-two format without a padding policy
    #[error("{format} needs a power-of-two roster, got {count} participants")]
    NotPowerOfTwo { format: FormatCode, count: usize },

    #[error("Participant {0} is enrolled more than once")]
    DuplicateParticipant(ParticipantId),

    #[error("Sessions were already generated for tournament {0}")]
    AlreadyGenerated(TournamentId),

    #[error("Unknown tournament format: {0}")]
    UnknownFormat(String),

    /// Recoverable: retry once more results arrive
    #[error("Tournament {tournament_id} has {pending} match(es) waiting on earlier results")]
    IncompleteResults {
        tournament_id: TournamentId,
        pending: usize,
    },

    /// Treated as idempotent success by the reward distributor
    #[error("Rewards were already distributed for tournament {0}")]
    AlreadyDistributed(TournamentId),

    #[error("Tournament {0} has not been completed")]
    TournamentNotCompleted(TournamentId),

    #[error("Tournament {tournament_id} is {status}, cannot {action}")]
    InvalidState {
        tournament_id: TournamentId,
        status: TournamentStatus,
        action: &'static str,
    },

    #[error("Invalid result: {0}")]
    InvalidResult(String),

    #[error("Unknown reward policy: {0}")]
    UnknownRewardPolicy(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TournamentError {
    /// Roster problems the caller fixes before retrying generation
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TournamentError::InvalidParticipantCount { .. }
                | TournamentError::NotPowerOfTwo { .. }
                | TournamentError::DuplicateParticipant(_)
                | TournamentError::InvalidResult(_)
        )
    }

    /// Whether the same call may succeed later without any correction
    pub fn is_retryable(&self) -> bool {
        matches!(self, TournamentError::IncompleteResults { .. })
    }

    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Database(_) => "Internal server error".to_string(),
            TournamentError::Serialization(_) => "Internal server error".to_string(),
            TournamentError::UnknownFormat(_) => "Tournament format is misconfigured".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for tournament engine operations
pub type TournamentResult<T> = Result<T, TournamentError>;
