//! Reward payout for completed tournaments.

use std::collections::HashMap;
use std::sync::Arc;

use super::models::{
    LedgerEntry, NewLedgerEntry, PlacementBucket, RewardCurrency, RewardPolicySnapshot, RewardReason,
};
use crate::catalog::TournamentTypeCatalog;
use crate::db::TournamentRepository;
use crate::ranking::{TournamentRanking, compute_outcome};
use crate::sessions::Session;
use crate::tournament::{
    ParticipantId, TournamentError, TournamentId, TournamentResult, completed_at,
};

/// Ledger rows owed for a final ranking
///
/// Every ranked participant gets the xp and credits of their placement
/// bucket plus attendance xp for each completed session they played.
/// Zero amounts produce no row.
pub fn build_ledger_entries(
    tournament_id: TournamentId,
    policy: &RewardPolicySnapshot,
    rankings: &[TournamentRanking],
    sessions: &[Session],
) -> Vec<NewLedgerEntry> {
    let mut attended: HashMap<ParticipantId, i64> = HashMap::new();
    for session in sessions.iter().filter(|s| s.is_completed()) {
        for participant_id in [session.home_participant, session.away_participant]
            .into_iter()
            .flatten()
        {
            *attended.entry(participant_id).or_default() += 1;
        }
    }

    let mut entries = Vec::new();
    for ranking in rankings {
        let participant_id = ranking.participant_id;
        let bucket = PlacementBucket::for_rank(ranking.rank);
        let reward = policy.placement_reward(bucket);
        let attendance =
            policy.session_attendance_xp() * attended.get(&participant_id).copied().unwrap_or(0);

        let rows = [
            (RewardCurrency::Xp, reward.xp, RewardReason::Placement(bucket)),
            (RewardCurrency::Credits, reward.credits, RewardReason::Placement(bucket)),
            (RewardCurrency::Xp, attendance, RewardReason::SessionAttendance),
        ];
        entries.extend(
            rows.into_iter()
                .filter(|(_, amount, _)| *amount != 0)
                .map(|(currency, amount, reason)| {
                    NewLedgerEntry::new(tournament_id, participant_id, currency, amount, reason)
                }),
        );
    }

    entries
}

/// Pays out a completed tournament exactly once
#[derive(Clone)]
pub struct RewardDistributor {
    repo: Arc<dyn TournamentRepository>,
    catalog: Arc<TournamentTypeCatalog>,
}

impl RewardDistributor {
    pub fn new(repo: Arc<dyn TournamentRepository>, catalog: Arc<TournamentTypeCatalog>) -> Self {
        Self { repo, catalog }
    }

    /// Distribute rewards from the tournament's frozen policy snapshot
    ///
    /// A second call returns the entries written by the first.
    ///
    /// # Errors
    ///
    /// * `TournamentError::NotFound` - Tournament does not exist
    /// * `TournamentError::TournamentNotCompleted` - No COMPLETED transition recorded
    /// * `TournamentError::IncompleteResults` - Some sessions have no result
    pub async fn distribute(&self, tournament_id: TournamentId) -> TournamentResult<Vec<LedgerEntry>> {
        let history = self.repo.load_status_history(tournament_id).await?;
        let Some(finished_at) = completed_at(&history) else {
            return Err(TournamentError::TournamentNotCompleted(tournament_id));
        };

        let snapshot = self.repo.load_snapshot(tournament_id).await?;
        let pending = snapshot.pending_sessions();
        if pending > 0 {
            return Err(TournamentError::IncompleteResults {
                tournament_id,
                pending,
            });
        }

        let definition = self.catalog.get(snapshot.tournament.format)?;
        let outcome = compute_outcome(definition, &snapshot)?;
        let entries = build_ledger_entries(
            tournament_id,
            &snapshot.tournament.reward_policy_snapshot,
            &outcome.rankings,
            &snapshot.sessions,
        );

        match self.repo.commit_rewards(tournament_id, entries).await {
            Ok(committed) => {
                log::info!(
                    "Distributed {} reward entries for tournament {} (completed {}) using policy '{}'",
                    committed.len(),
                    tournament_id,
                    finished_at,
                    snapshot.tournament.reward_policy_snapshot.policy_name()
                );
                Ok(committed)
            }
            Err(TournamentError::AlreadyDistributed(_)) => {
                log::debug!("Rewards for tournament {tournament_id} already distributed");
                self.repo.load_ledger_entries(tournament_id).await
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::{PlacementReward, RewardPolicy};
    use crate::schedule::{Slot, TournamentPhase};
    use crate::sessions::GameResult;
    use chrono::{TimeZone, Utc};

    fn ranking(participant_id: ParticipantId, rank: u32) -> TournamentRanking {
        TournamentRanking {
            tournament_id: 1,
            participant_id,
            rank,
            points: 0.0,
            wins: 0,
            losses: 0,
            draws: 0,
            goals_for: 0,
            goals_against: 0,
        }
    }

    fn played(id: i64, home: ParticipantId, away: ParticipantId, result: Option<GameResult>) -> Session {
        let at = Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap();
        Session {
            id,
            tournament_id: 1,
            title: "Cup - Final".to_string(),
            date_start: at,
            date_end: at,
            tournament_phase: TournamentPhase::Knockout,
            tournament_round: 1,
            tournament_match_number: id as u32,
            group_index: None,
            is_tournament_game: true,
            auto_generated: true,
            home_slot: Slot::participant(home),
            away_slot: Slot::participant(away),
            home_participant: Some(home),
            away_participant: Some(away),
            game_result: result,
        }
    }

    #[test]
    fn test_default_policy_payout() {
        let policy = RewardPolicySnapshot::capture(&RewardPolicy::default(), Utc::now());
        let sessions = vec![played(1, 10, 20, Some(GameResult::new(1, 0)))];
        let entries = build_ledger_entries(1, &policy, &[ranking(10, 1), ranking(20, 2)], &sessions);

        let amounts: Vec<_> = entries
            .iter()
            .map(|e| (e.participant_id, e.currency, e.amount, e.reason.to_string()))
            .collect();
        assert_eq!(
            amounts,
            vec![
                (10, RewardCurrency::Xp, 500, "placement:FIRST".to_string()),
                (10, RewardCurrency::Credits, 100, "placement:FIRST".to_string()),
                (10, RewardCurrency::Xp, 10, "session_attendance".to_string()),
                (20, RewardCurrency::Xp, 300, "placement:SECOND".to_string()),
                (20, RewardCurrency::Credits, 50, "placement:SECOND".to_string()),
                (20, RewardCurrency::Xp, 10, "session_attendance".to_string()),
            ]
        );
    }

    #[test]
    fn test_zero_amounts_are_skipped() {
        let policy = RewardPolicySnapshot::capture(&RewardPolicy::default(), Utc::now());
        let entries = build_ledger_entries(1, &policy, &[ranking(30, 5)], &[]);

        // Participant bucket pays no credits and nothing was attended
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, 50);
        assert_eq!(entries[0].reason, RewardReason::Placement(PlacementBucket::Participant));
    }

    #[test]
    fn test_attendance_counts_completed_sessions_only() {
        let mut policy = RewardPolicy::default();
        policy.placements.insert(PlacementBucket::First, PlacementReward::default());
        let policy = RewardPolicySnapshot::capture(&policy, Utc::now());
        let sessions = vec![
            played(1, 10, 20, Some(GameResult::new(2, 2))),
            played(2, 10, 30, Some(GameResult::new(1, 0))),
            played(3, 10, 40, None),
        ];

        let entries = build_ledger_entries(1, &policy, &[ranking(10, 1)], &sessions);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, 20);
        assert_eq!(entries[0].reason, RewardReason::SessionAttendance);
    }

    #[test]
    fn test_shared_rank_shares_bucket() {
        let policy = RewardPolicySnapshot::capture(&RewardPolicy::default(), Utc::now());
        let entries = build_ledger_entries(1, &policy, &[ranking(1, 3), ranking(2, 3)], &[]);
        assert!(
            entries
                .iter()
                .all(|e| e.reason == RewardReason::Placement(PlacementBucket::Third))
        );
        assert_eq!(entries.len(), 4);
    }
}
