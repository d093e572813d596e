//! Format variants and the capability trait they share.
//!
//! Every format answers the same questions (how many matches, how many
//! rounds, what a round is called, how a roster is scheduled, how standings
//! are ranked) so callers hold a [`TournamentFormat`] and never branch on
//! the format code. Dispatch goes through `enum_dispatch`.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::models::{ByePolicy, PointsTable, TiebreakCriterion};
use crate::ranking::{self, Placement, RankingInput};
use crate::schedule::{self, Schedule};
use crate::tournament::ParticipantId;

/// Participants per group in the group stage
pub const GROUP_SIZE: usize = 4;

/// Group finishers that advance to the knockout stage
pub const QUALIFIERS_PER_GROUP: usize = 2;

/// Rounds played by groups of three or four
pub const GROUP_STAGE_ROUNDS: u32 = 3;

/// Capabilities every tournament format provides
#[enum_dispatch]
pub trait FormatRules {
    /// Whether a non power-of-two roster is padded rather than refused
    fn pads_to_power_of_two(&self) -> bool {
        false
    }

    fn match_count(&self, participants: usize) -> usize;

    fn round_count(&self, participants: usize) -> u32;

    fn round_label(&self, round: u32, _total_rounds: u32) -> String {
        format!("Round {round}")
    }

    /// Ordered criteria used to split equal standings
    fn tiebreak_chain(&self) -> &[TiebreakCriterion];

    fn points_table(&self) -> PointsTable;

    /// Points credited for a bye
    fn bye_points(&self) -> f64 {
        0.0
    }

    /// Build the abstract schedule for an already validated roster
    fn generate(&self, participants: &[ParticipantId]) -> Schedule;

    /// Turn standings into placements
    fn rank(&self, input: &RankingInput<'_>) -> Vec<Placement> {
        ranking::rank_by_standings(input, self.tiebreak_chain())
    }
}

/// Single round robin where everyone meets everyone once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueFormat {
    pub points: PointsTable,
    pub tiebreaks: Vec<TiebreakCriterion>,
}

impl Default for LeagueFormat {
    fn default() -> Self {
        Self {
            points: PointsTable::FOOTBALL,
            tiebreaks: vec![
                TiebreakCriterion::Wins,
                TiebreakCriterion::GoalDifference,
                TiebreakCriterion::GoalsScored,
                TiebreakCriterion::HeadToHead,
            ],
        }
    }
}

impl FormatRules for LeagueFormat {
    fn match_count(&self, participants: usize) -> usize {
        participants * participants.saturating_sub(1) / 2
    }

    fn round_count(&self, participants: usize) -> u32 {
        schedule::round_robin::round_count(participants)
    }

    fn tiebreak_chain(&self) -> &[TiebreakCriterion] {
        &self.tiebreaks
    }

    fn points_table(&self) -> PointsTable {
        self.points
    }

    fn generate(&self, participants: &[ParticipantId]) -> Schedule {
        schedule::round_robin::generate(participants)
    }
}

/// Single elimination bracket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnockoutFormat {
    /// Participants remaining in a round mapped to its name
    pub round_names: BTreeMap<usize, String>,
    pub third_place_playoff: bool,
    pub bye_policy: ByePolicy,
}

impl Default for KnockoutFormat {
    fn default() -> Self {
        let round_names = [
            (2, "Final"),
            (4, "Semi-finals"),
            (8, "Quarter-finals"),
            (16, "Round of 16"),
            (32, "Round of 32"),
            (64, "Round of 64"),
        ]
        .into_iter()
        .map(|(size, name)| (size, name.to_string()))
        .collect();

        Self {
            round_names,
            third_place_playoff: false,
            bye_policy: ByePolicy::Reject,
        }
    }
}

impl KnockoutFormat {
    /// Default bracket plus a playoff between the semi-final losers
    pub fn with_third_place_playoff() -> Self {
        Self {
            third_place_playoff: true,
            ..Self::default()
        }
    }

    /// Bracket variant used after a group stage
    pub fn padded_without_playoff() -> Self {
        Self {
            third_place_playoff: false,
            bye_policy: ByePolicy::PadWithByes,
            ..Self::default()
        }
    }

    pub fn bracket_size(participants: usize) -> usize {
        participants.max(2).next_power_of_two()
    }

    pub fn has_third_place_playoff(&self, participants: usize) -> bool {
        self.third_place_playoff && participants >= 4
    }
}

impl FormatRules for KnockoutFormat {
    fn pads_to_power_of_two(&self) -> bool {
        self.bye_policy == ByePolicy::PadWithByes
    }

    fn match_count(&self, participants: usize) -> usize {
        let playoff = usize::from(self.has_third_place_playoff(participants));
        participants.saturating_sub(1) + playoff
    }

    fn round_count(&self, participants: usize) -> u32 {
        Self::bracket_size(participants).trailing_zeros()
    }

    fn round_label(&self, round: u32, total_rounds: u32) -> String {
        if round == 0 || round > total_rounds {
            return format!("Round {round}");
        }
        let remaining = 1usize << (total_rounds - round + 1);
        self.round_names
            .get(&remaining)
            .cloned()
            .unwrap_or_else(|| format!("Round {round}"))
    }

    fn tiebreak_chain(&self) -> &[TiebreakCriterion] {
        &[
            TiebreakCriterion::Wins,
            TiebreakCriterion::GoalDifference,
            TiebreakCriterion::GoalsScored,
        ]
    }

    fn points_table(&self) -> PointsTable {
        PointsTable::FOOTBALL
    }

    fn generate(&self, participants: &[ParticipantId]) -> Schedule {
        schedule::knockout::generate(self, participants)
    }

    fn rank(&self, input: &RankingInput<'_>) -> Vec<Placement> {
        ranking::bracket::rank_knockout(input)
    }
}

/// Round-robin groups feeding a knockout bracket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupKnockoutFormat {
    pub group_stage: LeagueFormat,
    pub knockout: KnockoutFormat,
}

impl GroupKnockoutFormat {
    pub fn new() -> Self {
        Self {
            group_stage: LeagueFormat::default(),
            knockout: KnockoutFormat::padded_without_playoff(),
        }
    }

    pub fn group_count(participants: usize) -> usize {
        participants.div_ceil(GROUP_SIZE)
    }

    /// Group sizes, largest first; they differ by at most one
    pub fn group_sizes(participants: usize) -> Vec<usize> {
        let groups = Self::group_count(participants);
        if groups == 0 {
            return Vec::new();
        }
        (0..groups)
            .map(|g| participants / groups + usize::from(g < participants % groups))
            .collect()
    }

    pub fn qualifier_count(participants: usize) -> usize {
        Self::group_count(participants) * QUALIFIERS_PER_GROUP
    }
}

impl Default for GroupKnockoutFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRules for GroupKnockoutFormat {
    fn pads_to_power_of_two(&self) -> bool {
        true
    }

    fn match_count(&self, participants: usize) -> usize {
        let group_matches: usize = Self::group_sizes(participants)
            .into_iter()
            .map(|size| size * size.saturating_sub(1) / 2)
            .sum();
        group_matches + self.knockout.match_count(Self::qualifier_count(participants))
    }

    fn round_count(&self, participants: usize) -> u32 {
        GROUP_STAGE_ROUNDS + self.knockout.round_count(Self::qualifier_count(participants))
    }

    fn round_label(&self, round: u32, total_rounds: u32) -> String {
        if round <= GROUP_STAGE_ROUNDS {
            format!("Group Stage - Round {round}")
        } else {
            let bracket_rounds = total_rounds.saturating_sub(GROUP_STAGE_ROUNDS);
            let label = self
                .knockout
                .round_label(round - GROUP_STAGE_ROUNDS, bracket_rounds);
            format!("Knockout Stage - {label}")
        }
    }

    fn tiebreak_chain(&self) -> &[TiebreakCriterion] {
        &self.group_stage.tiebreaks
    }

    fn points_table(&self) -> PointsTable {
        self.group_stage.points
    }

    fn generate(&self, participants: &[ParticipantId]) -> Schedule {
        schedule::group_knockout::generate(self, participants)
    }

    fn rank(&self, input: &RankingInput<'_>) -> Vec<Placement> {
        ranking::bracket::rank_group_knockout(input, &self.group_stage.tiebreaks)
    }
}

/// Swiss system: fixed number of rounds, pairings follow the standings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwissFormat {
    pub points: PointsTable,
    pub bye_points: f64,
    pub tiebreaks: Vec<TiebreakCriterion>,
}

impl Default for SwissFormat {
    fn default() -> Self {
        Self {
            points: PointsTable::CHESS,
            bye_points: 1.0,
            tiebreaks: vec![
                TiebreakCriterion::Points,
                TiebreakCriterion::Buchholz,
                TiebreakCriterion::SonnebornBerger,
                TiebreakCriterion::GoalDifference,
                TiebreakCriterion::GoalsScored,
            ],
        }
    }
}

impl FormatRules for SwissFormat {
    fn match_count(&self, participants: usize) -> usize {
        self.round_count(participants) as usize * (participants / 2)
    }

    fn round_count(&self, participants: usize) -> u32 {
        participants.max(2).next_power_of_two().trailing_zeros()
    }

    fn tiebreak_chain(&self) -> &[TiebreakCriterion] {
        &self.tiebreaks
    }

    fn points_table(&self) -> PointsTable {
        self.points
    }

    fn bye_points(&self) -> f64 {
        self.bye_points
    }

    fn generate(&self, participants: &[ParticipantId]) -> Schedule {
        schedule::swiss::generate(self, participants)
    }
}

/// Format-specific configuration of a catalog entry
#[enum_dispatch(FormatRules)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TournamentFormat {
    League(LeagueFormat),
    Knockout(KnockoutFormat),
    GroupKnockout(GroupKnockoutFormat),
    Swiss(SwissFormat),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_league_counts() {
        let league = TournamentFormat::from(LeagueFormat::default());
        assert_eq!(league.match_count(6), 15);
        assert_eq!(league.round_count(6), 5);
        assert_eq!(league.match_count(5), 10);
        assert_eq!(league.round_count(5), 5);
        assert_eq!(league.round_label(3, 5), "Round 3");
    }

    #[test]
    fn test_knockout_counts_and_labels() {
        let knockout = TournamentFormat::from(KnockoutFormat::default());
        assert_eq!(knockout.match_count(8), 7);
        assert_eq!(knockout.match_count(4), 3);
        assert_eq!(knockout.round_count(8), 3);
        assert_eq!(knockout.round_label(1, 3), "Quarter-finals");
        assert_eq!(knockout.round_label(2, 3), "Semi-finals");
        assert_eq!(knockout.round_label(3, 3), "Final");
        assert_eq!(knockout.round_label(1, 7), "Round 1");
        assert_eq!(knockout.round_label(2, 7), "Round of 64");
    }

    #[test]
    fn test_third_place_playoff_adds_one_match() {
        let knockout = TournamentFormat::from(KnockoutFormat::with_third_place_playoff());
        assert_eq!(knockout.match_count(8), 8);
        assert_eq!(knockout.round_count(8), 3);
    }

    #[test]
    fn test_knockout_without_playoff() {
        let knockout = KnockoutFormat::padded_without_playoff();
        assert_eq!(knockout.match_count(6), 5);
        assert_eq!(knockout.round_count(6), 3);
        assert!(knockout.pads_to_power_of_two());
    }

    #[test]
    fn test_group_knockout_counts() {
        let hybrid = GroupKnockoutFormat::new();
        assert_eq!(GroupKnockoutFormat::group_sizes(16), vec![4, 4, 4, 4]);
        assert_eq!(GroupKnockoutFormat::group_sizes(13), vec![4, 3, 3, 3]);
        assert_eq!(hybrid.match_count(16), 24 + 7);
        assert_eq!(hybrid.match_count(12), 18 + 5);
        assert_eq!(hybrid.round_count(16), 6);
        assert_eq!(hybrid.round_label(2, 6), "Group Stage - Round 2");
        assert_eq!(hybrid.round_label(4, 6), "Knockout Stage - Quarter-finals");
        assert_eq!(hybrid.round_label(6, 6), "Knockout Stage - Final");
    }

    #[test]
    fn test_swiss_counts() {
        let swiss = SwissFormat::default();
        assert_eq!(swiss.round_count(8), 3);
        assert_eq!(swiss.round_count(9), 4);
        assert_eq!(swiss.match_count(8), 12);
        assert_eq!(swiss.match_count(9), 16);
        assert_eq!(swiss.bye_points(), 1.0);
    }

    #[test]
    fn test_format_serializes_with_kind_tag() {
        let format = TournamentFormat::from(SwissFormat::default());
        let json = serde_json::to_value(&format).unwrap();
        assert_eq!(json["kind"], "swiss");
        let back: TournamentFormat = serde_json::from_value(json).unwrap();
        assert_eq!(back, format);
    }
}
