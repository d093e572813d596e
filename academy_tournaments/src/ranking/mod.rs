//! Standings and ranking.
//!
//! Rankings are always rebuilt from scratch out of the persisted sessions,
//! results and byes, so recomputing twice from the same inputs yields the
//! same rows. Ties that survive the whole tie-break chain share a rank
//! (competition ranking: 1, 2, 2, 4).

pub mod bracket;
pub mod calculator;
pub mod resolution;
pub mod standings;

use serde::{Deserialize, Serialize};

pub use calculator::{RankingCalculator, RecomputeOutcome, compute_outcome};
pub use resolution::{Resolution, dependent_results, resolve};
pub use standings::{ParticipantStats, StandingsTable, standings_criteria};

use crate::catalog::TiebreakCriterion;
use crate::sessions::Session;
use crate::tournament::{ParticipantId, TournamentId};

/// Persisted standings row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentRanking {
    pub tournament_id: TournamentId,
    pub participant_id: ParticipantId,
    pub rank: u32,
    pub points: f64,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub goals_for: u32,
    pub goals_against: u32,
}

impl TournamentRanking {
    pub fn from_stats(tournament_id: TournamentId, rank: u32, stats: &ParticipantStats) -> Self {
        Self {
            tournament_id,
            participant_id: stats.participant_id,
            rank,
            points: stats.points,
            wins: stats.wins,
            losses: stats.losses,
            draws: stats.draws,
            goals_for: stats.goals_for,
            goals_against: stats.goals_against,
        }
    }
}

/// A participant's rank before stats are attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub participant_id: ParticipantId,
    pub rank: u32,
}

/// What a format needs to rank its field
#[derive(Debug, Clone, Copy)]
pub struct RankingInput<'a> {
    /// Roster in seed order
    pub seeds: &'a [ParticipantId],
    /// Sessions with resolved bindings
    pub sessions: &'a [Session],
    pub standings: &'a StandingsTable,
}

/// Competition ranks for already ordered tie groups, starting at `first_rank`
pub fn competition_ranks(groups: &[Vec<ParticipantId>], first_rank: u32) -> Vec<Placement> {
    let mut placements = Vec::new();
    let mut rank = first_rank;
    for group in groups {
        placements.extend(group.iter().map(|participant_id| Placement {
            participant_id: *participant_id,
            rank,
        }));
        rank += group.len() as u32;
    }
    placements
}

/// Rank the whole field by points and then the tie-break chain
pub fn rank_by_standings(input: &RankingInput<'_>, chain: &[TiebreakCriterion]) -> Vec<Placement> {
    let criteria = standings_criteria(chain);
    let groups = input.standings.order(input.seeds, &criteria);
    competition_ranks(&groups, 1)
}
