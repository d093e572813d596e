//! In-memory repository used by tests and local runs without a database.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::Mutex;

use super::repository::{RecomputeFn, TournamentRepository};
use crate::ranking::{RecomputeOutcome, TournamentRanking};
use crate::rewards::{LedgerEntry, NewLedgerEntry, RewardPolicy};
use crate::sessions::{ByeRecord, GameResult, NewSession, Session};
use crate::tournament::{
    ParticipantId, SessionId, StatusChange, Tournament, TournamentDraft, TournamentError,
    TournamentId, TournamentResult, TournamentSnapshot, TournamentStatus,
};

#[derive(Default)]
struct State {
    next_tournament_id: TournamentId,
    next_session_id: SessionId,
    next_entry_id: i64,
    tournaments: BTreeMap<TournamentId, Tournament>,
    participants: HashMap<TournamentId, Vec<ParticipantId>>,
    history: HashMap<TournamentId, Vec<StatusChange>>,
    policies: HashMap<String, RewardPolicy>,
    sessions: BTreeMap<SessionId, Session>,
    byes: HashMap<TournamentId, Vec<ByeRecord>>,
    rankings: HashMap<TournamentId, Vec<TournamentRanking>>,
    distributed: HashSet<TournamentId>,
    ledger: Vec<LedgerEntry>,
}

impl State {
    fn tournament(&self, tournament_id: TournamentId) -> TournamentResult<&Tournament> {
        self.tournaments
            .get(&tournament_id)
            .ok_or(TournamentError::NotFound(tournament_id))
    }

    fn snapshot(&self, tournament_id: TournamentId) -> TournamentResult<TournamentSnapshot> {
        let tournament = self.tournament(tournament_id)?.clone();
        Ok(TournamentSnapshot {
            tournament,
            participants: self.participants.get(&tournament_id).cloned().unwrap_or_default(),
            sessions: self
                .sessions
                .values()
                .filter(|s| s.tournament_id == tournament_id)
                .cloned()
                .collect(),
            byes: self.byes.get(&tournament_id).cloned().unwrap_or_default(),
        })
    }
}

/// Repository keeping everything behind one async mutex
///
/// Holding the mutex for a whole operation gives the same serialisation
/// the PostgreSQL row locks give.
#[derive(Default)]
pub struct InMemoryTournamentRepository {
    state: Mutex<State>,
}

impl InMemoryTournamentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TournamentRepository for InMemoryTournamentRepository {
    async fn health_check(&self) -> TournamentResult<()> {
        Ok(())
    }

    async fn create_tournament(&self, draft: TournamentDraft) -> TournamentResult<Tournament> {
        let mut state = self.state.lock().await;
        state.next_tournament_id += 1;
        let id = state.next_tournament_id;
        let now = Utc::now();

        let tournament = Tournament {
            id,
            name: draft.name,
            format: draft.format,
            status: TournamentStatus::Draft,
            start_date: draft.start_date,
            sessions_generated: false,
            sessions_generated_at: None,
            reward_policy_snapshot: draft.reward_policy_snapshot,
            created_at: now,
        };
        state.tournaments.insert(id, tournament.clone());
        state.history.insert(
            id,
            vec![StatusChange {
                tournament_id: id,
                from_status: None,
                to_status: TournamentStatus::Draft,
                changed_at: now,
            }],
        );

        Ok(tournament)
    }

    async fn load_tournament(&self, tournament_id: TournamentId) -> TournamentResult<Tournament> {
        let state = self.state.lock().await;
        state.tournament(tournament_id).cloned()
    }

    async fn enroll_participant(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
    ) -> TournamentResult<()> {
        let mut state = self.state.lock().await;
        let tournament = state.tournament(tournament_id)?;
        if tournament.sessions_generated {
            return Err(TournamentError::InvalidState {
                tournament_id,
                status: tournament.status,
                action: "enroll after sessions were generated",
            });
        }

        let roster = state.participants.entry(tournament_id).or_default();
        if roster.contains(&participant_id) {
            return Err(TournamentError::DuplicateParticipant(participant_id));
        }
        roster.push(participant_id);
        Ok(())
    }

    async fn load_participants(&self, tournament_id: TournamentId) -> TournamentResult<Vec<ParticipantId>> {
        let state = self.state.lock().await;
        state.tournament(tournament_id)?;
        Ok(state.participants.get(&tournament_id).cloned().unwrap_or_default())
    }

    async fn load_status_history(&self, tournament_id: TournamentId) -> TournamentResult<Vec<StatusChange>> {
        let state = self.state.lock().await;
        state.tournament(tournament_id)?;
        Ok(state.history.get(&tournament_id).cloned().unwrap_or_default())
    }

    async fn append_status_change(
        &self,
        tournament_id: TournamentId,
        to_status: TournamentStatus,
    ) -> TournamentResult<StatusChange> {
        let mut state = self.state.lock().await;
        let tournament = state
            .tournaments
            .get_mut(&tournament_id)
            .ok_or(TournamentError::NotFound(tournament_id))?;

        let change = StatusChange {
            tournament_id,
            from_status: Some(tournament.status),
            to_status,
            changed_at: Utc::now(),
        };
        tournament.status = to_status;
        state.history.entry(tournament_id).or_default().push(change.clone());
        Ok(change)
    }

    async fn find_reward_policy(&self, name: &str) -> TournamentResult<Option<RewardPolicy>> {
        let state = self.state.lock().await;
        Ok(state.policies.get(name).cloned())
    }

    async fn save_reward_policy(&self, policy: &RewardPolicy) -> TournamentResult<()> {
        let mut state = self.state.lock().await;
        state.policies.insert(policy.name.clone(), policy.clone());
        Ok(())
    }

    async fn commit_schedule(
        &self,
        tournament_id: TournamentId,
        sessions: Vec<NewSession>,
        byes: Vec<ByeRecord>,
    ) -> TournamentResult<Vec<Session>> {
        let mut state = self.state.lock().await;
        if state.tournament(tournament_id)?.sessions_generated {
            return Err(TournamentError::AlreadyGenerated(tournament_id));
        }

        let mut stored = Vec::with_capacity(sessions.len());
        for row in sessions {
            state.next_session_id += 1;
            let session = row.into_session(state.next_session_id);
            state.sessions.insert(session.id, session.clone());
            stored.push(session);
        }
        state.byes.entry(tournament_id).or_default().extend(byes);

        if let Some(tournament) = state.tournaments.get_mut(&tournament_id) {
            tournament.sessions_generated = true;
            tournament.sessions_generated_at = Some(Utc::now());
        }

        Ok(stored)
    }

    async fn load_session(&self, session_id: SessionId) -> TournamentResult<Session> {
        let state = self.state.lock().await;
        state
            .sessions
            .get(&session_id)
            .cloned()
            .ok_or(TournamentError::SessionNotFound(session_id))
    }

    async fn load_snapshot(&self, tournament_id: TournamentId) -> TournamentResult<TournamentSnapshot> {
        let state = self.state.lock().await;
        state.snapshot(tournament_id)
    }

    async fn record_result(&self, session_id: SessionId, result: GameResult) -> TournamentResult<Session> {
        let mut state = self.state.lock().await;
        let session = state
            .sessions
            .get_mut(&session_id)
            .ok_or(TournamentError::SessionNotFound(session_id))?;
        session.game_result = Some(result);
        Ok(session.clone())
    }

    async fn recompute_locked(
        &self,
        tournament_id: TournamentId,
        compute: &RecomputeFn,
    ) -> TournamentResult<RecomputeOutcome> {
        let mut state = self.state.lock().await;
        let snapshot = state.snapshot(tournament_id)?;
        let outcome = compute(&snapshot)?;

        for binding in &outcome.bindings {
            if let Some(session) = state.sessions.get_mut(&binding.session_id) {
                session.home_participant = binding.home_participant;
                session.away_participant = binding.away_participant;
            }
        }
        state
            .byes
            .entry(tournament_id)
            .or_default()
            .extend(outcome.byes.iter().copied());
        state.rankings.insert(tournament_id, outcome.rankings.clone());

        Ok(outcome)
    }

    async fn load_rankings(&self, tournament_id: TournamentId) -> TournamentResult<Vec<TournamentRanking>> {
        let state = self.state.lock().await;
        state.tournament(tournament_id)?;
        Ok(state.rankings.get(&tournament_id).cloned().unwrap_or_default())
    }

    async fn commit_rewards(
        &self,
        tournament_id: TournamentId,
        entries: Vec<NewLedgerEntry>,
    ) -> TournamentResult<Vec<LedgerEntry>> {
        let mut state = self.state.lock().await;
        state.tournament(tournament_id)?;
        if !state.distributed.insert(tournament_id) {
            return Err(TournamentError::AlreadyDistributed(tournament_id));
        }

        let now = Utc::now();
        let mut committed = Vec::with_capacity(entries.len());
        for entry in entries {
            if state.ledger.iter().any(|e| e.idempotency_key == entry.idempotency_key) {
                continue;
            }
            state.next_entry_id += 1;
            let stored = LedgerEntry {
                id: state.next_entry_id,
                tournament_id: entry.tournament_id,
                participant_id: entry.participant_id,
                currency: entry.currency,
                amount: entry.amount,
                reason: entry.reason,
                idempotency_key: entry.idempotency_key,
                created_at: now,
            };
            state.ledger.push(stored.clone());
            committed.push(stored);
        }

        Ok(committed)
    }

    async fn load_ledger_entries(&self, tournament_id: TournamentId) -> TournamentResult<Vec<LedgerEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .ledger
            .iter()
            .filter(|e| e.tournament_id == tournament_id)
            .cloned()
            .collect())
    }
}
