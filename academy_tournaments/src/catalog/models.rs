//! Catalog data types: format codes, points tables and tie-break criteria.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::formats::{FormatRules, TournamentFormat};
use crate::tournament::{TournamentError, TournamentResult};

/// Format code as stored on a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatCode {
    League,
    Knockout,
    GroupKnockout,
    Swiss,
}

impl FormatCode {
    pub const ALL: [FormatCode; 4] = [
        FormatCode::League,
        FormatCode::Knockout,
        FormatCode::GroupKnockout,
        FormatCode::Swiss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatCode::League => "league",
            FormatCode::Knockout => "knockout",
            FormatCode::GroupKnockout => "group_knockout",
            FormatCode::Swiss => "swiss",
        }
    }
}

impl fmt::Display for FormatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatCode {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| TournamentError::UnknownFormat(s.to_string()))
    }
}

/// A single standings criterion, always compared descending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiebreakCriterion {
    Points,
    Wins,
    GoalDifference,
    GoalsScored,
    /// Mini league among the tied participants only
    HeadToHead,
    /// Sum of opponents' points
    Buchholz,
    /// Points of beaten opponents plus half of drawn ones
    SonnebornBerger,
}

/// Points awarded per match outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointsTable {
    pub win: f64,
    pub draw: f64,
    pub loss: f64,
}

impl PointsTable {
    /// Three points for a win, one for a draw
    pub const FOOTBALL: PointsTable = PointsTable {
        win: 3.0,
        draw: 1.0,
        loss: 0.0,
    };

    /// Chess-style scoring used by Swiss events
    pub const CHESS: PointsTable = PointsTable {
        win: 1.0,
        draw: 0.5,
        loss: 0.0,
    };
}

/// What a power-of-two bracket does with a roster that does not fill it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByePolicy {
    /// Refuse the roster with a validation error
    Reject,
    /// Pad to the next power of two; top seeds receive the byes
    PadWithByes,
}

/// Immutable catalog entry describing one tournament format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentTypeDefinition {
    pub code: FormatCode,
    pub display_name: String,
    pub min_participants: usize,
    pub max_participants: usize,
    pub requires_power_of_two: bool,
    pub session_duration_minutes: i64,
    pub break_between_sessions_minutes: i64,
    pub format: TournamentFormat,
}

impl TournamentTypeDefinition {
    /// Check a roster size against the bounds and the power-of-two rule
    ///
    /// # Errors
    ///
    /// * `TournamentError::InvalidParticipantCount` - Outside min/max
    /// * `TournamentError::NotPowerOfTwo` - Bracket format that cannot pad
    pub fn validate_participant_count(&self, count: usize) -> TournamentResult<()> {
        if count < self.min_participants || count > self.max_participants {
            return Err(TournamentError::InvalidParticipantCount {
                format: self.code,
                count,
                min: self.min_participants,
                max: self.max_participants,
            });
        }

        if self.requires_power_of_two
            && !count.is_power_of_two()
            && !self.format.pads_to_power_of_two()
        {
            return Err(TournamentError::NotPowerOfTwo {
                format: self.code,
                count,
            });
        }

        Ok(())
    }

    pub fn compute_match_count(&self, count: usize) -> usize {
        self.format.match_count(count)
    }

    pub fn compute_round_count(&self, count: usize) -> u32 {
        self.format.round_count(count)
    }

    pub fn round_label(&self, round: u32, total_rounds: u32) -> String {
        self.format.round_label(round, total_rounds)
    }

    pub fn tiebreak_chain(&self) -> &[TiebreakCriterion] {
        self.format.tiebreak_chain()
    }
}
