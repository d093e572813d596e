//! Session, result and bye models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::{MatchRef, Slot, TournamentPhase};
use crate::tournament::{ParticipantId, SessionId, TournamentError, TournamentId, TournamentResult};

/// Side of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

/// Recorded outcome of a tournament session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub home_score: u32,
    pub away_score: u32,
    /// Who went through after a level score (shoot-out or decider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<Side>,
}

impl GameResult {
    pub fn new(home_score: u32, away_score: u32) -> Self {
        Self {
            home_score,
            away_score,
            decided_by: None,
        }
    }

    /// Level score settled by a decider
    pub fn decided(score: u32, side: Side) -> Self {
        Self {
            home_score: score,
            away_score: score,
            decided_by: Some(side),
        }
    }

    pub fn is_draw(&self) -> bool {
        self.winning_side().is_none()
    }

    /// Winning side, counting a decider when scores are level
    pub fn winning_side(&self) -> Option<Side> {
        match self.home_score.cmp(&self.away_score) {
            std::cmp::Ordering::Greater => Some(Side::Home),
            std::cmp::Ordering::Less => Some(Side::Away),
            std::cmp::Ordering::Equal => self.decided_by,
        }
    }

    /// Check the result fits the phase it is recorded for
    ///
    /// Knockout matches need a winner; other phases accept draws but no
    /// decider.
    pub fn validate_for(&self, phase: TournamentPhase) -> TournamentResult<()> {
        let level = self.home_score == self.away_score;
        match (phase, level, self.decided_by) {
            (TournamentPhase::Knockout, true, None) => Err(TournamentError::InvalidResult(
                "a drawn knockout match needs a deciding side".to_string(),
            )),
            (_, false, Some(_)) => Err(TournamentError::InvalidResult(
                "a deciding side is only valid for a level score".to_string(),
            )),
            (TournamentPhase::Knockout, _, _) | (_, _, None) => Ok(()),
            (_, true, Some(_)) => Err(TournamentError::InvalidResult(format!(
                "{phase} matches cannot be decided after a draw"
            ))),
        }
    }
}

/// Session row ready to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub tournament_id: TournamentId,
    pub title: String,
    pub date_start: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
    pub tournament_phase: TournamentPhase,
    pub tournament_round: u32,
    pub tournament_match_number: u32,
    pub group_index: Option<u32>,
    pub is_tournament_game: bool,
    pub auto_generated: bool,
    pub home_slot: Slot,
    pub away_slot: Slot,
    pub home_participant: Option<ParticipantId>,
    pub away_participant: Option<ParticipantId>,
}

impl NewSession {
    /// Persisted form of this row under the given id
    pub fn into_session(self, id: SessionId) -> Session {
        Session {
            id,
            tournament_id: self.tournament_id,
            title: self.title,
            date_start: self.date_start,
            date_end: self.date_end,
            tournament_phase: self.tournament_phase,
            tournament_round: self.tournament_round,
            tournament_match_number: self.tournament_match_number,
            group_index: self.group_index,
            is_tournament_game: self.is_tournament_game,
            auto_generated: self.auto_generated,
            home_slot: self.home_slot,
            away_slot: self.away_slot,
            home_participant: self.home_participant,
            away_participant: self.away_participant,
            game_result: None,
        }
    }
}

/// Persisted tournament session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub tournament_id: TournamentId,
    pub title: String,
    pub date_start: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
    pub tournament_phase: TournamentPhase,
    pub tournament_round: u32,
    pub tournament_match_number: u32,
    pub group_index: Option<u32>,
    pub is_tournament_game: bool,
    pub auto_generated: bool,
    pub home_slot: Slot,
    pub away_slot: Slot,
    pub home_participant: Option<ParticipantId>,
    pub away_participant: Option<ParticipantId>,
    pub game_result: Option<GameResult>,
}

impl Session {
    pub fn match_ref(&self) -> MatchRef {
        MatchRef::new(
            self.tournament_phase,
            self.tournament_round,
            self.tournament_match_number,
        )
    }

    pub fn is_completed(&self) -> bool {
        self.game_result.is_some()
    }

    /// Both bound participants, home first
    pub fn participants(&self) -> Option<(ParticipantId, ParticipantId)> {
        Some((self.home_participant?, self.away_participant?))
    }

    pub fn involves(&self, participant_id: ParticipantId) -> bool {
        self.home_participant == Some(participant_id) || self.away_participant == Some(participant_id)
    }

    pub fn winner(&self) -> Option<ParticipantId> {
        match self.game_result?.winning_side()? {
            Side::Home => self.home_participant,
            Side::Away => self.away_participant,
        }
    }

    pub fn loser(&self) -> Option<ParticipantId> {
        match self.game_result?.winning_side()? {
            Side::Home => self.away_participant,
            Side::Away => self.home_participant,
        }
    }
}

/// Participants resolved into a session's placeholder slots
///
/// A side stays `None` while its source match is unreported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotBinding {
    pub session_id: SessionId,
    pub home_participant: Option<ParticipantId>,
    pub away_participant: Option<ParticipantId>,
}

/// A participant sitting out a round; produces no session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByeRecord {
    pub tournament_id: TournamentId,
    pub phase: TournamentPhase,
    pub round: u32,
    pub participant_id: ParticipantId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winning_side() {
        assert_eq!(GameResult::new(2, 1).winning_side(), Some(Side::Home));
        assert_eq!(GameResult::new(0, 3).winning_side(), Some(Side::Away));
        assert_eq!(GameResult::new(1, 1).winning_side(), None);
        assert_eq!(GameResult::decided(1, Side::Away).winning_side(), Some(Side::Away));
    }

    #[test]
    fn test_knockout_draw_needs_decider() {
        assert!(GameResult::new(1, 1).validate_for(TournamentPhase::Knockout).is_err());
        assert!(
            GameResult::decided(1, Side::Home)
                .validate_for(TournamentPhase::Knockout)
                .is_ok()
        );
        assert!(GameResult::new(3, 1).validate_for(TournamentPhase::Knockout).is_ok());
    }

    #[test]
    fn test_league_rejects_decider() {
        assert!(GameResult::new(1, 1).validate_for(TournamentPhase::League).is_ok());
        assert!(
            GameResult::decided(0, Side::Home)
                .validate_for(TournamentPhase::League)
                .is_err()
        );
        let bogus = GameResult {
            home_score: 2,
            away_score: 0,
            decided_by: Some(Side::Away),
        };
        assert!(bogus.validate_for(TournamentPhase::Knockout).is_err());
    }

    #[test]
    fn test_decider_omitted_from_json() {
        let json = serde_json::to_value(GameResult::new(2, 2)).unwrap();
        assert!(json.get("decided_by").is_none());

        let parsed: GameResult =
            serde_json::from_str(r#"{"home_score":1,"away_score":1,"decided_by":"away"}"#).unwrap();
        assert_eq!(parsed.decided_by, Some(Side::Away));
    }
}
