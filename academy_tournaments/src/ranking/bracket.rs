//! Ranking by bracket progress.
//!
//! Each participant gets a progress key from the furthest bracket match they
//! were bound into: losing in round `r` scores `2r`, still being alive in
//! round `r` scores `2r + 1` and winning the final scores above everything.
//! The third-place playoff only breaks the tie between the two semi-final
//! losers.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::{Placement, RankingInput, competition_ranks, standings::group_orders};
use crate::catalog::TiebreakCriterion;
use crate::schedule::{Slot, TournamentPhase};
use crate::sessions::Session;
use crate::tournament::ParticipantId;

type ProgressKey = (u32, u32);

fn is_third_place_playoff(session: &Session) -> bool {
    matches!(session.home_slot, Slot::LoserOf { .. })
}

fn progress_keys(sessions: &[Session]) -> HashMap<ParticipantId, ProgressKey> {
    let bracket: Vec<&Session> = sessions
        .iter()
        .filter(|s| s.tournament_phase == TournamentPhase::Knockout && !is_third_place_playoff(s))
        .collect();
    let final_round = bracket.iter().map(|s| s.tournament_round).max().unwrap_or(0);

    let mut keys: HashMap<ParticipantId, ProgressKey> = HashMap::new();
    for session in &bracket {
        let round = session.tournament_round;
        for id in [session.home_participant, session.away_participant].into_iter().flatten() {
            let primary = if session.loser() == Some(id) {
                2 * round
            } else if session.winner() == Some(id) && round == final_round {
                2 * (round + 1)
            } else {
                2 * round + 1
            };
            let key = keys.entry(id).or_default();
            key.0 = key.0.max(primary);
        }
    }

    let playoff_winner = sessions
        .iter()
        .filter(|s| s.tournament_phase == TournamentPhase::Knockout && is_third_place_playoff(s))
        .find_map(Session::winner);
    if let Some(key) = playoff_winner.and_then(|id| keys.get_mut(&id)) {
        key.1 = 1;
    }

    keys
}

/// Group consecutive items the comparator considers equal
fn tie_groups<T: Copy>(sorted: &[T], same: impl Fn(&T, &T) -> bool) -> Vec<Vec<T>> {
    let mut groups: Vec<Vec<T>> = Vec::new();
    for item in sorted {
        match groups.last_mut() {
            Some(group) if group.last().is_some_and(|last| same(last, item)) => group.push(*item),
            _ => groups.push(vec![*item]),
        }
    }
    groups
}

fn ids(groups: Vec<Vec<(ParticipantId, ProgressKey)>>) -> Vec<Vec<ParticipantId>> {
    groups
        .into_iter()
        .map(|group| group.into_iter().map(|(id, _)| id).collect())
        .collect()
}

/// Knockout ranking: champion, runner-up, semi-final losers, then earlier
/// losers tied per round
pub fn rank_knockout(input: &RankingInput<'_>) -> Vec<Placement> {
    let keys = progress_keys(input.sessions);
    let mut field: Vec<(ParticipantId, ProgressKey)> = input
        .seeds
        .iter()
        .map(|id| (*id, keys.get(id).copied().unwrap_or_default()))
        .collect();
    field.sort_by(|a, b| b.1.cmp(&a.1));

    competition_ranks(&ids(tie_groups(&field, |a, b| a.1 == b.1)), 1)
}

/// Group stage plus knockout ranking
///
/// Qualifiers are ranked by bracket progress. Everyone else follows, ordered
/// by finishing position in their group, then points, goal difference and
/// goals scored.
pub fn rank_group_knockout(input: &RankingInput<'_>, chain: &[TiebreakCriterion]) -> Vec<Placement> {
    let keys = progress_keys(input.sessions);

    let mut qualifiers: Vec<(ParticipantId, ProgressKey)> = input
        .seeds
        .iter()
        .filter_map(|id| keys.get(id).map(|key| (*id, *key)))
        .collect();
    qualifiers.sort_by(|a, b| b.1.cmp(&a.1));
    let mut placements = competition_ranks(&ids(tie_groups(&qualifiers, |a, b| a.1 == b.1)), 1);

    let positions: HashMap<ParticipantId, usize> = group_orders(
        input.seeds,
        input.sessions,
        input.standings.points_table(),
        chain,
        false,
    )
    .into_values()
    .flat_map(|order| order.into_iter().enumerate().map(|(position, id)| (id, position)))
    .collect();

    let mut others: Vec<ParticipantId> = input
        .seeds
        .iter()
        .copied()
        .filter(|id| !keys.contains_key(id))
        .collect();
    let compare = |a: &ParticipantId, b: &ParticipantId| -> Ordering {
        let position = |id| positions.get(id).copied().unwrap_or(usize::MAX);
        let (Some(sa), Some(sb)) = (input.standings.stats(*a), input.standings.stats(*b)) else {
            return position(a).cmp(&position(b));
        };
        position(a)
            .cmp(&position(b))
            .then_with(|| sb.points.total_cmp(&sa.points))
            .then_with(|| sb.goal_difference().cmp(&sa.goal_difference()))
            .then_with(|| sb.goals_for.cmp(&sa.goals_for))
    };
    others.sort_by(compare);

    let groups = tie_groups(&others, |a, b| compare(a, b) == Ordering::Equal);
    placements.extend(competition_ranks(&groups, qualifiers.len() as u32 + 1));
    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PointsTable, TiebreakCriterion};
    use crate::ranking::StandingsTable;
    use crate::schedule::MatchRef;
    use crate::sessions::{GameResult, Side};
    use chrono::Utc;

    fn session(
        id: i64,
        phase: TournamentPhase,
        round: u32,
        number: u32,
        sides: (Option<ParticipantId>, Option<ParticipantId>),
        result: Option<GameResult>,
    ) -> Session {
        Session {
            id,
            tournament_id: 1,
            title: String::new(),
            date_start: Utc::now(),
            date_end: Utc::now(),
            tournament_phase: phase,
            tournament_round: round,
            tournament_match_number: number,
            group_index: None,
            is_tournament_game: true,
            auto_generated: true,
            home_slot: Slot::SwissPairing,
            away_slot: Slot::SwissPairing,
            home_participant: sides.0,
            away_participant: sides.1,
            game_result: result,
        }
    }

    fn placements_of(placements: &[Placement]) -> Vec<(ParticipantId, u32)> {
        placements.iter().map(|p| (p.participant_id, p.rank)).collect()
    }

    fn four_player_bracket(playoff: Option<GameResult>) -> Vec<Session> {
        let ko = TournamentPhase::Knockout;
        let mut third = session(4, ko, 2, 2, (Some(4), Some(2)), playoff);
        third.home_slot = Slot::loser_of(MatchRef::new(ko, 1, 1));
        third.away_slot = Slot::loser_of(MatchRef::new(ko, 1, 2));
        vec![
            session(1, ko, 1, 1, (Some(1), Some(4)), Some(GameResult::new(2, 0))),
            session(2, ko, 1, 2, (Some(2), Some(3)), Some(GameResult::new(0, 1))),
            session(3, ko, 2, 1, (Some(1), Some(3)), Some(GameResult::decided(1, Side::Away))),
            third,
        ]
    }

    #[test]
    fn test_knockout_ranking_with_playoff() {
        let sessions = four_player_bracket(Some(GameResult::new(1, 0)));
        let standings = StandingsTable::new(&[1, 2, 3, 4], PointsTable::FOOTBALL);
        let input = RankingInput {
            seeds: &[1, 2, 3, 4],
            sessions: &sessions,
            standings: &standings,
        };

        let placements = rank_knockout(&input);
        assert_eq!(placements_of(&placements), vec![(3, 1), (1, 2), (4, 3), (2, 4)]);
    }

    #[test]
    fn test_semi_final_losers_tie_without_playoff_result() {
        let sessions = four_player_bracket(None);
        let standings = StandingsTable::new(&[1, 2, 3, 4], PointsTable::FOOTBALL);
        let input = RankingInput {
            seeds: &[1, 2, 3, 4],
            sessions: &sessions,
            standings: &standings,
        };

        let placements = rank_knockout(&input);
        assert_eq!(placements_of(&placements), vec![(3, 1), (1, 2), (2, 3), (4, 3)]);
    }

    #[test]
    fn test_group_knockout_non_qualifiers_follow_bracket() {
        let gs = TournamentPhase::GroupStage;
        let mut group_a = vec![
            session(1, gs, 1, 1, (Some(1), Some(4)), Some(GameResult::new(3, 0))),
            session(2, gs, 1, 2, (Some(2), Some(3)), Some(GameResult::new(1, 0))),
        ];
        for s in &mut group_a {
            s.group_index = Some(0);
        }
        let mut sessions = group_a;
        sessions.push(session(3, TournamentPhase::Knockout, 4, 1, (Some(1), Some(2)), None));

        let standings = StandingsTable::from_results(
            &[1, 2, 3, 4],
            sessions.iter(),
            std::iter::empty(),
            PointsTable::FOOTBALL,
            0.0,
        );
        let input = RankingInput {
            seeds: &[1, 2, 3, 4],
            sessions: &sessions,
            standings: &standings,
        };

        let chain = [TiebreakCriterion::Wins, TiebreakCriterion::GoalDifference];
        let placements = rank_group_knockout(&input, &chain);
        // 1 and 2 are alive in the final; 3 lost by one, 4 by three
        assert_eq!(placements_of(&placements), vec![(1, 1), (2, 1), (3, 3), (4, 4)]);
    }
}
