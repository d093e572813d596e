//! Turns an abstract schedule into timed session rows.

use chrono::Duration;

use super::models::{ByeRecord, NewSession};
use crate::catalog::TournamentTypeDefinition;
use crate::schedule::Schedule;
use crate::tournament::{Tournament, TournamentError, TournamentResult};

/// Builds session rows for a generated schedule
///
/// Sessions are laid out back to back from the tournament's start date:
/// each one lasts `session_duration_minutes` and is followed by
/// `break_between_sessions_minutes`. Rounds are walked in order, group
/// stage before knockout stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionMaterializer;

impl SessionMaterializer {
    pub fn new() -> Self {
        Self
    }

    /// Session rows for every match of `schedule`
    ///
    /// # Errors
    ///
    /// * `TournamentError::AlreadyGenerated` - Sessions exist for this tournament
    pub fn materialize(
        &self,
        tournament: &Tournament,
        definition: &TournamentTypeDefinition,
        schedule: &Schedule,
    ) -> TournamentResult<Vec<NewSession>> {
        if tournament.sessions_generated {
            return Err(TournamentError::AlreadyGenerated(tournament.id));
        }

        let duration = Duration::minutes(definition.session_duration_minutes);
        let gap = Duration::minutes(definition.break_between_sessions_minutes);

        let mut matches: Vec<_> = schedule.matches.iter().collect();
        matches.sort_by_key(|m| (m.round, m.phase, m.match_number));

        let mut cursor = tournament.start_date;
        let sessions = matches
            .into_iter()
            .map(|m| {
                let date_start = cursor;
                let date_end = date_start + duration;
                cursor = date_end + gap;

                NewSession {
                    tournament_id: tournament.id,
                    title: format!("{} - {}", tournament.name, m.label),
                    date_start,
                    date_end,
                    tournament_phase: m.phase,
                    tournament_round: m.round,
                    tournament_match_number: m.match_number,
                    group_index: m.group,
                    is_tournament_game: true,
                    auto_generated: true,
                    home_slot: m.home,
                    away_slot: m.away,
                    home_participant: m.home.concrete(),
                    away_participant: m.away.concrete(),
                }
            })
            .collect();

        Ok(sessions)
    }

    /// Bye rows recorded while building `schedule`
    pub fn bye_records(&self, tournament: &Tournament, schedule: &Schedule) -> Vec<ByeRecord> {
        schedule
            .byes
            .iter()
            .map(|bye| ByeRecord {
                tournament_id: tournament.id,
                phase: bye.phase,
                round: bye.round,
                participant_id: bye.participant_id,
            })
            .collect()
    }
}
