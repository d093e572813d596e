//! Tournament aggregate and lifecycle models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::catalog::FormatCode;
use crate::ranking::TournamentRanking;
use crate::rewards::RewardPolicySnapshot;
use crate::sessions::{ByeRecord, Session};

/// Tournament ID type
pub type TournamentId = i64;

/// Participant (student or team) ID type
pub type ParticipantId = i64;

/// Session ID type
pub type SessionId = i64;

/// Tournament lifecycle status, owned by the lifecycle component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentStatus {
    Draft,
    SeekingInstructor,
    InstructorAssigned,
    ReadyForEnrollment,
    Ongoing,
    Completed,
    Cancelled,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Draft => "DRAFT",
            TournamentStatus::SeekingInstructor => "SEEKING_INSTRUCTOR",
            TournamentStatus::InstructorAssigned => "INSTRUCTOR_ASSIGNED",
            TournamentStatus::ReadyForEnrollment => "READY_FOR_ENROLLMENT",
            TournamentStatus::Ongoing => "ONGOING",
            TournamentStatus::Completed => "COMPLETED",
            TournamentStatus::Cancelled => "CANCELLED",
        }
    }

    /// Terminal statuses accept no further scheduling
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TournamentStatus::Completed | TournamentStatus::Cancelled
        )
    }
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(TournamentStatus::Draft),
            "SEEKING_INSTRUCTOR" => Ok(TournamentStatus::SeekingInstructor),
            "INSTRUCTOR_ASSIGNED" => Ok(TournamentStatus::InstructorAssigned),
            "READY_FOR_ENROLLMENT" => Ok(TournamentStatus::ReadyForEnrollment),
            "ONGOING" => Ok(TournamentStatus::Ongoing),
            "COMPLETED" => Ok(TournamentStatus::Completed),
            "CANCELLED" => Ok(TournamentStatus::Cancelled),
            other => Err(format!("unknown tournament status: {other}")),
        }
    }
}

/// One row of the append-only status history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub tournament_id: TournamentId,
    pub from_status: Option<TournamentStatus>,
    pub to_status: TournamentStatus,
    pub changed_at: DateTime<Utc>,
}

/// When the tournament entered COMPLETED, if it did
pub fn completed_at(history: &[StatusChange]) -> Option<DateTime<Utc>> {
    history
        .iter()
        .filter(|change| change.to_status == TournamentStatus::Completed)
        .map(|change| change.changed_at)
        .max()
}

/// Tournament aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub format: FormatCode,
    pub status: TournamentStatus,
    /// First session starts here
    pub start_date: DateTime<Utc>,
    /// One-way latch, set in the same transaction as the sessions
    pub sessions_generated: bool,
    pub sessions_generated_at: Option<DateTime<Utc>>,
    pub reward_policy_snapshot: RewardPolicySnapshot,
    pub created_at: DateTime<Utc>,
}

/// Tournament creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTournament {
    pub name: String,
    /// Format code, e.g. `knockout`
    pub format: String,
    pub start_date: DateTime<Utc>,
    /// Named reward policy; the catalog default is used when absent
    pub reward_policy: Option<String>,
}

/// Validated creation data handed to the repository
#[derive(Debug, Clone)]
pub struct TournamentDraft {
    pub name: String,
    pub format: FormatCode,
    pub start_date: DateTime<Utc>,
    pub reward_policy_snapshot: RewardPolicySnapshot,
}

/// Everything persisted for a tournament, read under one lock
#[derive(Debug, Clone)]
pub struct TournamentSnapshot {
    pub tournament: Tournament,
    /// Frozen enrolment order, which is also the seed order
    pub participants: Vec<ParticipantId>,
    pub sessions: Vec<Session>,
    pub byes: Vec<ByeRecord>,
}

impl TournamentSnapshot {
    /// Sessions still waiting for a result
    pub fn pending_sessions(&self) -> usize {
        self.sessions
            .iter()
            .filter(|session| session.game_result.is_none())
            .count()
    }
}

/// Outcome of schedule generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub matches_created: usize,
    pub rounds: u32,
}

/// A stored result and the standings rebuilt from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedResult {
    pub session: Session,
    pub rankings: Vec<TournamentRanking>,
}
