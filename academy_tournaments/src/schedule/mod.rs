//! Schedule generation.
//!
//! A [`Schedule`] is the abstract structure of a tournament: matches
//! addressed by `(phase, round, match_number)` whose sides are [`Slot`]s,
//! plus the byes handed out while building it. Slots that cannot be known
//! up front (bracket winners, group finishers, Swiss pairings) are
//! placeholders that the ranking step resolves later.
//!
//! Generation is pure and deterministic: the same definition and the same
//! ordered roster always yield the same schedule.

pub mod group_knockout;
pub mod knockout;
pub mod round_robin;
pub mod swiss;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::catalog::{FormatRules, TournamentTypeDefinition};
use crate::tournament::{ParticipantId, TournamentError, TournamentResult};

/// Stage of a tournament a match belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentPhase {
    League,
    GroupStage,
    Knockout,
    Swiss,
}

impl TournamentPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentPhase::League => "league",
            TournamentPhase::GroupStage => "group_stage",
            TournamentPhase::Knockout => "knockout",
            TournamentPhase::Swiss => "swiss",
        }
    }
}

impl fmt::Display for TournamentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "league" => Ok(TournamentPhase::League),
            "group_stage" => Ok(TournamentPhase::GroupStage),
            "knockout" => Ok(TournamentPhase::Knockout),
            "swiss" => Ok(TournamentPhase::Swiss),
            other => Err(format!("unknown tournament phase: {other}")),
        }
    }
}

/// Arena address of a match inside a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchRef {
    pub phase: TournamentPhase,
    pub round: u32,
    pub match_number: u32,
}

impl MatchRef {
    pub fn new(phase: TournamentPhase, round: u32, match_number: u32) -> Self {
        Self {
            phase,
            round,
            match_number,
        }
    }
}

/// One side of a match, concrete or still to be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Slot {
    Participant { participant_id: ParticipantId },
    WinnerOf { source: MatchRef },
    LoserOf { source: MatchRef },
    /// 1-based finishing position inside a 0-based group
    GroupPlacement { group: u32, position: u32 },
    /// Filled by the Swiss pairer once the previous round is complete
    SwissPairing,
}

impl Slot {
    pub fn participant(participant_id: ParticipantId) -> Self {
        Slot::Participant { participant_id }
    }

    pub fn winner_of(source: MatchRef) -> Self {
        Slot::WinnerOf { source }
    }

    pub fn loser_of(source: MatchRef) -> Self {
        Slot::LoserOf { source }
    }

    /// Concrete participant, if known at generation time
    pub fn concrete(&self) -> Option<ParticipantId> {
        match self {
            Slot::Participant { participant_id } => Some(*participant_id),
            _ => None,
        }
    }
}

/// A match before it becomes a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractMatch {
    pub phase: TournamentPhase,
    pub round: u32,
    /// Monotonic within `(phase, round)`, starting at 1
    pub match_number: u32,
    pub group: Option<u32>,
    pub label: String,
    pub home: Slot,
    pub away: Slot,
}

impl AbstractMatch {
    pub fn match_ref(&self) -> MatchRef {
        MatchRef::new(self.phase, self.round, self.match_number)
    }
}

/// A participant sitting out a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledBye {
    pub phase: TournamentPhase,
    pub round: u32,
    pub participant_id: ParticipantId,
}

/// Output of schedule generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub matches: Vec<AbstractMatch>,
    pub byes: Vec<ScheduledBye>,
    pub rounds: u32,
}

impl Schedule {
    pub fn find(&self, match_ref: MatchRef) -> Option<&AbstractMatch> {
        self.matches.iter().find(|m| m.match_ref() == match_ref)
    }

    pub fn round(&self, phase: TournamentPhase, round: u32) -> impl Iterator<Item = &AbstractMatch> {
        self.matches
            .iter()
            .filter(move |m| m.phase == phase && m.round == round)
    }
}

/// Validate a roster and build its schedule
///
/// # Arguments
///
/// * `definition` - Catalog entry of the tournament's format
/// * `participants` - Enrolled participants in seed order
///
/// # Errors
///
/// * `TournamentError::DuplicateParticipant` - Same participant listed twice
/// * `TournamentError::InvalidParticipantCount` - Roster outside the bounds
/// * `TournamentError::NotPowerOfTwo` - Bracket roster that cannot be padded
pub fn generate(
    definition: &TournamentTypeDefinition,
    participants: &[ParticipantId],
) -> TournamentResult<Schedule> {
    let mut seen = HashSet::with_capacity(participants.len());
    if let Some(duplicate) = participants.iter().find(|id| !seen.insert(**id)) {
        return Err(TournamentError::DuplicateParticipant(*duplicate));
    }

    definition.validate_participant_count(participants.len())?;

    let schedule = definition.format.generate(participants);
    log::debug!(
        "Generated {} schedule: {} matches over {} rounds, {} byes",
        definition.code,
        schedule.matches.len(),
        schedule.rounds,
        schedule.byes.len()
    );

    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FormatCode, TournamentTypeCatalog};

    fn roster(n: i64) -> Vec<ParticipantId> {
        (1..=n).collect()
    }

    #[test]
    fn test_generate_rejects_duplicates() {
        let catalog = TournamentTypeCatalog::builtin();
        let league = catalog.get(FormatCode::League).unwrap();

        let result = generate(league, &[1, 2, 3, 2, 5]);
        assert!(matches!(result, Err(TournamentError::DuplicateParticipant(2))));
    }

    #[test]
    fn test_generate_validates_count() {
        let catalog = TournamentTypeCatalog::builtin();
        let knockout = catalog.get(FormatCode::Knockout).unwrap();

        assert!(matches!(
            generate(knockout, &roster(2)),
            Err(TournamentError::InvalidParticipantCount { .. })
        ));
        assert!(matches!(
            generate(knockout, &roster(6)),
            Err(TournamentError::NotPowerOfTwo { .. })
        ));
    }

    #[test]
    fn test_match_count_agrees_with_catalog() {
        let catalog = TournamentTypeCatalog::builtin();
        for definition in catalog.definitions() {
            for n in [8usize, 16, 32] {
                let schedule = generate(definition, &roster(n as i64)).unwrap();
                assert_eq!(
                    schedule.matches.len(),
                    definition.compute_match_count(n),
                    "{} with {n} participants",
                    definition.code
                );
                assert_eq!(schedule.rounds, definition.compute_round_count(n));
            }
        }
    }

    #[test]
    fn test_slot_serialization_is_tagged() {
        let slot = Slot::winner_of(MatchRef::new(TournamentPhase::Knockout, 1, 2));
        let json = serde_json::to_value(slot).unwrap();
        assert_eq!(json["type"], "winner_of");
        assert_eq!(json["source"]["match_number"], 2);
    }
}
