//! Standings table and tie-break ordering.
//!
//! Ordering starts from the whole field in seed order and refines it one
//! criterion at a time: each still-tied group is sorted by the criterion and
//! split where the values differ. Head-to-head is evaluated as a mini league
//! among the members of the tied group only. Whatever is still tied after
//! the last criterion stays grouped (and in seed order).

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::catalog::{PointsTable, TiebreakCriterion};
use crate::schedule::TournamentPhase;
use crate::sessions::{ByeRecord, GameResult, Session, Side};
use crate::tournament::ParticipantId;

/// Accumulated record of one participant
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantStats {
    pub participant_id: ParticipantId,
    /// 0-based enrolment position
    pub seed: usize,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: f64,
    pub byes: u32,
}

impl ParticipantStats {
    fn new(participant_id: ParticipantId, seed: usize) -> Self {
        Self {
            participant_id,
            seed,
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            points: 0.0,
            byes: 0,
        }
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }
}

#[derive(Debug, Clone, Copy)]
struct Outcome {
    home: ParticipantId,
    away: ParticipantId,
    winner: Option<ParticipantId>,
}

impl Outcome {
    fn opponent_of(&self, id: ParticipantId) -> Option<ParticipantId> {
        if self.home == id {
            Some(self.away)
        } else if self.away == id {
            Some(self.home)
        } else {
            None
        }
    }
}

/// Standings built from recorded results and byes
#[derive(Debug, Clone)]
pub struct StandingsTable {
    points: PointsTable,
    stats: HashMap<ParticipantId, ParticipantStats>,
    outcomes: Vec<Outcome>,
}

impl StandingsTable {
    /// Empty table over the roster in seed order
    pub fn new(seeds: &[ParticipantId], points: PointsTable) -> Self {
        let stats = seeds
            .iter()
            .enumerate()
            .map(|(seed, id)| (*id, ParticipantStats::new(*id, seed)))
            .collect();

        Self {
            points,
            stats,
            outcomes: Vec::new(),
        }
    }

    /// Table over every completed session and bye
    pub fn from_results<'a>(
        seeds: &[ParticipantId],
        sessions: impl IntoIterator<Item = &'a Session>,
        byes: impl IntoIterator<Item = &'a ByeRecord>,
        points: PointsTable,
        bye_points: f64,
    ) -> Self {
        let mut table = Self::new(seeds, points);

        for session in sessions {
            if let (Some((home, away)), Some(result)) = (session.participants(), &session.game_result) {
                table.record(home, away, result);
            }
        }
        for bye in byes {
            table.record_bye(bye.participant_id, bye_points);
        }

        table
    }

    pub fn points_table(&self) -> PointsTable {
        self.points
    }

    fn entry(&mut self, id: ParticipantId) -> &mut ParticipantStats {
        let next_seed = self.stats.len();
        self.stats
            .entry(id)
            .or_insert_with(|| ParticipantStats::new(id, next_seed))
    }

    /// Add one match result
    pub fn record(&mut self, home: ParticipantId, away: ParticipantId, result: &GameResult) {
        let winner = result.winning_side().map(|side| match side {
            Side::Home => home,
            Side::Away => away,
        });
        let points = self.points;

        for (id, scored, conceded) in [
            (home, result.home_score, result.away_score),
            (away, result.away_score, result.home_score),
        ] {
            let stats = self.entry(id);
            stats.played += 1;
            stats.goals_for += scored;
            stats.goals_against += conceded;
            match winner {
                Some(w) if w == id => {
                    stats.wins += 1;
                    stats.points += points.win;
                }
                Some(_) => {
                    stats.losses += 1;
                    stats.points += points.loss;
                }
                None => {
                    stats.draws += 1;
                    stats.points += points.draw;
                }
            }
        }

        self.outcomes.push(Outcome { home, away, winner });
    }

    pub fn record_bye(&mut self, id: ParticipantId, points: f64) {
        let stats = self.entry(id);
        stats.byes += 1;
        stats.points += points;
    }

    pub fn stats(&self, id: ParticipantId) -> Option<&ParticipantStats> {
        self.stats.get(&id)
    }

    /// Every participant in seed order
    pub fn seed_order(&self) -> Vec<ParticipantId> {
        let mut rows: Vec<_> = self.stats.values().collect();
        rows.sort_by_key(|stats| stats.seed);
        rows.into_iter().map(|stats| stats.participant_id).collect()
    }

    /// Pairings already played, as unordered keys
    pub fn played_pairs(&self) -> HashSet<(ParticipantId, ParticipantId)> {
        self.outcomes
            .iter()
            .map(|o| (o.home.min(o.away), o.home.max(o.away)))
            .collect()
    }

    fn total_points(&self, id: ParticipantId) -> f64 {
        self.stats.get(&id).map_or(0.0, |stats| stats.points)
    }

    fn head_to_head_points(&self, id: ParticipantId, tied: &HashSet<ParticipantId>) -> f64 {
        self.outcomes
            .iter()
            .filter(|o| tied.contains(&o.home) && tied.contains(&o.away))
            .filter(|o| o.home == id || o.away == id)
            .map(|o| match o.winner {
                Some(w) if w == id => self.points.win,
                Some(_) => self.points.loss,
                None => self.points.draw,
            })
            .sum()
    }

    fn buchholz(&self, id: ParticipantId) -> f64 {
        self.outcomes
            .iter()
            .filter_map(|o| o.opponent_of(id))
            .map(|opponent| self.total_points(opponent))
            .sum()
    }

    fn sonneborn_berger(&self, id: ParticipantId) -> f64 {
        self.outcomes
            .iter()
            .filter_map(|o| {
                let opponent = o.opponent_of(id)?;
                match o.winner {
                    Some(w) if w == id => Some(self.total_points(opponent)),
                    Some(_) => None,
                    None => Some(self.total_points(opponent) / 2.0),
                }
            })
            .sum()
    }

    fn value(&self, criterion: TiebreakCriterion, id: ParticipantId, tied: &HashSet<ParticipantId>) -> f64 {
        let Some(stats) = self.stats.get(&id) else {
            return 0.0;
        };
        match criterion {
            TiebreakCriterion::Points => stats.points,
            TiebreakCriterion::Wins => f64::from(stats.wins),
            TiebreakCriterion::GoalDifference => stats.goal_difference() as f64,
            TiebreakCriterion::GoalsScored => f64::from(stats.goals_for),
            TiebreakCriterion::HeadToHead => self.head_to_head_points(id, tied),
            TiebreakCriterion::Buchholz => self.buchholz(id),
            TiebreakCriterion::SonnebornBerger => self.sonneborn_berger(id),
        }
    }

    /// Order `ids` by the criteria, returning groups of still-tied participants
    pub fn order(&self, ids: &[ParticipantId], criteria: &[TiebreakCriterion]) -> Vec<Vec<ParticipantId>> {
        let mut field = ids.to_vec();
        field.sort_by_key(|id| self.stats.get(id).map_or(usize::MAX, |stats| stats.seed));

        let mut groups = vec![field];
        for criterion in criteria {
            groups = groups
                .into_iter()
                .flat_map(|group| self.split(group, *criterion))
                .collect();
        }
        groups.retain(|group| !group.is_empty());
        groups
    }

    fn split(&self, group: Vec<ParticipantId>, criterion: TiebreakCriterion) -> Vec<Vec<ParticipantId>> {
        if group.len() < 2 {
            return vec![group];
        }

        let tied: HashSet<ParticipantId> = group.iter().copied().collect();
        let mut valued: Vec<(ParticipantId, f64)> = group
            .into_iter()
            .map(|id| (id, self.value(criterion, id, &tied)))
            .collect();
        valued.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut parts: Vec<Vec<ParticipantId>> = Vec::new();
        let mut last: Option<f64> = None;
        for (id, value) in valued {
            match (last, parts.last_mut()) {
                (Some(previous), Some(part)) if previous == value => part.push(id),
                _ => parts.push(vec![id]),
            }
            last = Some(value);
        }
        parts
    }
}

/// Full standings order: points first, then the format's chain
pub fn standings_criteria(chain: &[TiebreakCriterion]) -> Vec<TiebreakCriterion> {
    std::iter::once(TiebreakCriterion::Points)
        .chain(chain.iter().copied().filter(|c| *c != TiebreakCriterion::Points))
        .collect()
}

/// Current order of each group, keyed by 0-based group index
///
/// With `completed_only` set, groups with unreported matches are left out.
/// Residual ties fall back to seed.
pub fn group_orders(
    seeds: &[ParticipantId],
    sessions: &[Session],
    points: PointsTable,
    chain: &[TiebreakCriterion],
    completed_only: bool,
) -> BTreeMap<u32, Vec<ParticipantId>> {
    let mut groups: BTreeMap<u32, Vec<&Session>> = BTreeMap::new();
    for session in sessions
        .iter()
        .filter(|s| s.tournament_phase == TournamentPhase::GroupStage)
    {
        if let Some(group) = session.group_index {
            groups.entry(group).or_default().push(session);
        }
    }

    let criteria = standings_criteria(chain);
    groups
        .into_iter()
        .filter(|(_, matches)| !completed_only || matches.iter().all(|s| s.is_completed()))
        .map(|(group, matches)| {
            let mut members: Vec<ParticipantId> = Vec::new();
            for (home, away) in matches.iter().filter_map(|s| s.participants()) {
                for id in [home, away] {
                    if !members.contains(&id) {
                        members.push(id);
                    }
                }
            }

            let table = StandingsTable::from_results(
                seeds,
                matches.iter().copied(),
                std::iter::empty(),
                points,
                0.0,
            );
            let order = table.order(&members, &criteria).into_iter().flatten().collect();
            (group, order)
        })
        .collect()
}
