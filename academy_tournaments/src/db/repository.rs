//! Repository trait for tournament persistence.
//!
//! The engine talks to storage only through [`TournamentRepository`], so the
//! same services run against PostgreSQL in production and the in-memory
//! store in tests.

use async_trait::async_trait;

use crate::ranking::{RecomputeOutcome, TournamentRanking};
use crate::rewards::{LedgerEntry, NewLedgerEntry, RewardPolicy};
use crate::sessions::{ByeRecord, GameResult, NewSession, Session};
use crate::tournament::{
    ParticipantId, SessionId, StatusChange, Tournament, TournamentDraft, TournamentId,
    TournamentResult, TournamentSnapshot, TournamentStatus,
};

/// Computation run by [`TournamentRepository::recompute_locked`] while the
/// tournament is locked
pub type RecomputeFn =
    dyn Fn(&TournamentSnapshot) -> TournamentResult<RecomputeOutcome> + Send + Sync;

/// Trait for tournament repository operations
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Check the backing store is reachable
    async fn health_check(&self) -> TournamentResult<()>;

    /// Insert a tournament and its initial DRAFT status row
    async fn create_tournament(&self, draft: TournamentDraft) -> TournamentResult<Tournament>;

    /// Find tournament by ID
    async fn load_tournament(&self, tournament_id: TournamentId) -> TournamentResult<Tournament>;

    /// Append a participant to the enrolment list
    ///
    /// Fails with `DuplicateParticipant` for a repeat enrolment and with
    /// `InvalidState` once sessions exist.
    async fn enroll_participant(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
    ) -> TournamentResult<()>;

    /// Enrolled participants in enrolment (seed) order
    async fn load_participants(&self, tournament_id: TournamentId) -> TournamentResult<Vec<ParticipantId>>;

    /// Status history, oldest first
    async fn load_status_history(&self, tournament_id: TournamentId) -> TournamentResult<Vec<StatusChange>>;

    /// Move the tournament to `to_status` and record the transition
    async fn append_status_change(
        &self,
        tournament_id: TournamentId,
        to_status: TournamentStatus,
    ) -> TournamentResult<StatusChange>;

    /// Find a live reward policy by name
    async fn find_reward_policy(&self, name: &str) -> TournamentResult<Option<RewardPolicy>>;

    /// Insert or replace a live reward policy
    async fn save_reward_policy(&self, policy: &RewardPolicy) -> TournamentResult<()>;

    /// Store a generated schedule and set the generation latch atomically
    ///
    /// Re-checks the latch under the tournament lock and fails with
    /// `AlreadyGenerated` if another caller got there first.
    async fn commit_schedule(
        &self,
        tournament_id: TournamentId,
        sessions: Vec<NewSession>,
        byes: Vec<ByeRecord>,
    ) -> TournamentResult<Vec<Session>>;

    /// Find session by ID
    async fn load_session(&self, session_id: SessionId) -> TournamentResult<Session>;

    /// Tournament, roster, sessions and byes read together
    async fn load_snapshot(&self, tournament_id: TournamentId) -> TournamentResult<TournamentSnapshot>;

    /// Store a session result, replacing any earlier one
    async fn record_result(&self, session_id: SessionId, result: GameResult) -> TournamentResult<Session>;

    /// Run `compute` on a locked snapshot and persist its outcome
    ///
    /// Bindings, new byes and the replacement ranking rows are written in
    /// the same transaction that holds the lock.
    async fn recompute_locked(
        &self,
        tournament_id: TournamentId,
        compute: &RecomputeFn,
    ) -> TournamentResult<RecomputeOutcome>;

    /// Stored rankings, best rank first
    async fn load_rankings(&self, tournament_id: TournamentId) -> TournamentResult<Vec<TournamentRanking>>;

    /// Write the distribution marker and ledger rows in one transaction
    ///
    /// Fails with `AlreadyDistributed` if the marker exists.
    async fn commit_rewards(
        &self,
        tournament_id: TournamentId,
        entries: Vec<NewLedgerEntry>,
    ) -> TournamentResult<Vec<LedgerEntry>>;

    /// Ledger rows written for a tournament
    async fn load_ledger_entries(&self, tournament_id: TournamentId) -> TournamentResult<Vec<LedgerEntry>>;
}
