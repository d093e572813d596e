//! Tournament service: the facade over generation, results, rankings and
//! reward payout.

use chrono::Utc;
use std::sync::Arc;

use super::errors::{TournamentError, TournamentResult};
use super::models::{
    GenerationSummary, NewTournament, ParticipantId, RecordedResult, SessionId, StatusChange,
    Tournament, TournamentDraft, TournamentId, TournamentStatus,
};
use crate::catalog::TournamentTypeCatalog;
use crate::db::TournamentRepository;
use crate::ranking::{RankingCalculator, TournamentRanking, dependent_results};
use crate::rewards::{
    DEFAULT_POLICY_NAME, LedgerEntry, RewardDistributor, RewardPolicy, RewardPolicySnapshot,
};
use crate::schedule;
use crate::sessions::{GameResult, SessionMaterializer};

/// Tournament service
#[derive(Clone)]
pub struct TournamentService {
    repo: Arc<dyn TournamentRepository>,
    catalog: Arc<TournamentTypeCatalog>,
    materializer: SessionMaterializer,
    calculator: RankingCalculator,
    distributor: RewardDistributor,
}

impl TournamentService {
    /// Create a new tournament service
    ///
    /// # Arguments
    ///
    /// * `repo` - Storage backend
    /// * `catalog` - Tournament formats available to new tournaments
    pub fn new(repo: Arc<dyn TournamentRepository>, catalog: Arc<TournamentTypeCatalog>) -> Self {
        Self {
            calculator: RankingCalculator::new(Arc::clone(&repo), Arc::clone(&catalog)),
            distributor: RewardDistributor::new(Arc::clone(&repo), Arc::clone(&catalog)),
            materializer: SessionMaterializer::new(),
            repo,
            catalog,
        }
    }

    pub fn catalog(&self) -> &TournamentTypeCatalog {
        &self.catalog
    }

    /// Check the storage backend is reachable
    pub async fn health_check(&self) -> TournamentResult<()> {
        self.repo.health_check().await
    }

    /// Load a tournament by ID
    pub async fn tournament(&self, tournament_id: TournamentId) -> TournamentResult<Tournament> {
        self.repo.load_tournament(tournament_id).await
    }

    /// Create a tournament with a frozen copy of its reward policy
    ///
    /// # Errors
    ///
    /// * `TournamentError::UnknownFormat` - Format code not in the catalog
    /// * `TournamentError::UnknownRewardPolicy` - Named policy does not exist
    pub async fn create_tournament(&self, request: NewTournament) -> TournamentResult<Tournament> {
        let definition = self.catalog.lookup(&request.format)?;
        let policy = self.resolve_policy(request.reward_policy.as_deref()).await?;

        let draft = TournamentDraft {
            name: request.name,
            format: definition.code,
            start_date: request.start_date,
            reward_policy_snapshot: RewardPolicySnapshot::capture(&policy, Utc::now()),
        };
        let tournament = self.repo.create_tournament(draft).await?;

        log::info!(
            "Created {} tournament {} '{}' with reward policy '{}'",
            tournament.format,
            tournament.id,
            tournament.name,
            policy.name
        );
        Ok(tournament)
    }

    async fn resolve_policy(&self, name: Option<&str>) -> TournamentResult<RewardPolicy> {
        let name = name.unwrap_or(DEFAULT_POLICY_NAME);
        match self.repo.find_reward_policy(name).await? {
            Some(policy) => Ok(policy),
            None if name == DEFAULT_POLICY_NAME => Ok(RewardPolicy::default()),
            None => Err(TournamentError::UnknownRewardPolicy(name.to_string())),
        }
    }

    /// Insert or replace a live reward policy
    ///
    /// Tournaments created earlier keep the snapshot they captured.
    pub async fn save_reward_policy(&self, policy: RewardPolicy) -> TournamentResult<()> {
        self.repo.save_reward_policy(&policy).await?;
        log::info!("Saved reward policy '{}'", policy.name);
        Ok(())
    }

    /// Enrol a participant; enrolment order is the seed order
    ///
    /// # Errors
    ///
    /// * `TournamentError::DuplicateParticipant` - Already enrolled
    /// * `TournamentError::InvalidState` - Sessions were already generated
    pub async fn enroll(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
    ) -> TournamentResult<()> {
        self.repo.enroll_participant(tournament_id, participant_id).await?;
        log::debug!("Enrolled participant {participant_id} in tournament {tournament_id}");
        Ok(())
    }

    /// Record a lifecycle transition
    pub async fn record_status_change(
        &self,
        tournament_id: TournamentId,
        to_status: TournamentStatus,
    ) -> TournamentResult<StatusChange> {
        let change = self.repo.append_status_change(tournament_id, to_status).await?;
        log::info!(
            "Tournament {tournament_id} moved from {:?} to {to_status}",
            change.from_status
        );
        Ok(change)
    }

    /// Generate and store the tournament's sessions
    ///
    /// The schedule is built in memory first; the repository then stores
    /// every session and bye and sets the generation latch in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// * `TournamentError::AlreadyGenerated` - Sessions already exist
    /// * `TournamentError::InvalidParticipantCount` - Roster outside the format bounds
    /// * `TournamentError::NotPowerOfTwo` - Bracket roster that cannot be padded
    /// * `TournamentError::UnknownFormat` - Format missing from the catalog
    pub async fn generate(&self, tournament_id: TournamentId) -> TournamentResult<GenerationSummary> {
        let tournament = self.repo.load_tournament(tournament_id).await?;
        if tournament.sessions_generated {
            return Err(TournamentError::AlreadyGenerated(tournament_id));
        }
        if tournament.status.is_terminal() {
            return Err(TournamentError::InvalidState {
                tournament_id,
                status: tournament.status,
                action: "generate sessions",
            });
        }

        let definition = self.catalog.get(tournament.format)?;
        let participants = self.repo.load_participants(tournament_id).await?;
        let schedule = schedule::generate(definition, &participants)?;

        let sessions = self
            .materializer
            .materialize(&tournament, definition, &schedule)?;
        let byes = self.materializer.bye_records(&tournament, &schedule);
        let summary = GenerationSummary {
            matches_created: sessions.len(),
            rounds: schedule.rounds,
        };

        self.repo.commit_schedule(tournament_id, sessions, byes).await?;
        log::info!(
            "Generated {} sessions over {} rounds for tournament {} ({} participants)",
            summary.matches_created,
            summary.rounds,
            tournament_id,
            participants.len()
        );

        Ok(summary)
    }

    /// Store a session result and rebuild the standings
    ///
    /// A later call for the same session replaces the earlier result, as long
    /// as no completed session was drawn from it.
    ///
    /// # Errors
    ///
    /// * `TournamentError::SessionNotFound` - Session does not exist
    /// * `TournamentError::InvalidResult` - Result does not fit the phase
    /// * `TournamentError::IncompleteResults` - Session participants not resolved yet
    /// * `TournamentError::InvalidState` - Tournament cancelled, or a completed
    ///   later session depends on the result being replaced
    pub async fn record_result(
        &self,
        session_id: SessionId,
        result: GameResult,
    ) -> TournamentResult<RecordedResult> {
        let session = self.repo.load_session(session_id).await?;
        result.validate_for(session.tournament_phase)?;

        if session.participants().is_none() {
            return Err(TournamentError::IncompleteResults {
                tournament_id: session.tournament_id,
                pending: 1,
            });
        }

        let tournament = self.repo.load_tournament(session.tournament_id).await?;
        if tournament.status == TournamentStatus::Cancelled {
            return Err(TournamentError::InvalidState {
                tournament_id: tournament.id,
                status: tournament.status,
                action: "record results",
            });
        }

        if session.is_completed() {
            let snapshot = self.repo.load_snapshot(tournament.id).await?;
            let dependents = dependent_results(&snapshot.sessions, &session);
            if !dependents.is_empty() {
                log::warn!(
                    "Refusing to replace result of session {}: {} later result(s) depend on it",
                    session_id,
                    dependents.len()
                );
                return Err(TournamentError::InvalidState {
                    tournament_id: tournament.id,
                    status: tournament.status,
                    action: "replace a result that later matches were drawn from",
                });
            }
        }

        let session = self.repo.record_result(session_id, result).await?;
        log::debug!(
            "Recorded {}-{} for session {} of tournament {}",
            result.home_score,
            result.away_score,
            session_id,
            session.tournament_id
        );

        let rankings = self.calculator.recompute(session.tournament_id).await?;
        Ok(RecordedResult { session, rankings })
    }

    /// Rebuild and store the standings from every recorded result
    pub async fn recompute_rankings(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<TournamentRanking>> {
        self.calculator.recompute(tournament_id).await
    }

    /// Standings as last stored
    pub async fn rankings(&self, tournament_id: TournamentId) -> TournamentResult<Vec<TournamentRanking>> {
        self.repo.load_rankings(tournament_id).await
    }

    /// Pay out rewards; repeated calls return the first payout
    pub async fn distribute_rewards(&self, tournament_id: TournamentId) -> TournamentResult<Vec<LedgerEntry>> {
        self.distributor.distribute(tournament_id).await
    }
}
