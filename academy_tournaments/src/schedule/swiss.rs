//! Swiss system scheduling and pairing.
//!
//! Only the first round is known at generation time (adjacent seeds meet).
//! Later rounds are created as [`Slot::SwissPairing`] placeholders and paired
//! by [`pair_round`] once the previous round is complete.

use std::collections::HashSet;

use super::{AbstractMatch, Schedule, ScheduledBye, Slot, TournamentPhase};
use crate::catalog::{FormatRules, SwissFormat};
use crate::tournament::ParticipantId;

/// Search steps the backtracking pairer may take before falling back
pub const PAIRING_SEARCH_BUDGET: usize = 10_000;

/// Unordered key of a pairing, used to detect rematches
pub fn pairing_key(a: ParticipantId, b: ParticipantId) -> (ParticipantId, ParticipantId) {
    (a.min(b), a.max(b))
}

/// Pairings chosen for one Swiss round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwissRound {
    /// `(home, away)` with the higher ranked participant at home
    pub pairs: Vec<(ParticipantId, ParticipantId)>,
    pub bye: Option<ParticipantId>,
    /// Pairings that repeat an earlier match
    pub rematches: usize,
}

/// Pair a round from participants in standings order
///
/// The bye (odd rosters only) goes to the lowest ranked participant who has
/// not had one. Everybody else is paired top-down with the nearest opponent
/// they have not met, backtracking when a choice strands someone. When no
/// rematch-free pairing is found within [`PAIRING_SEARCH_BUDGET`] steps the
/// pairer accepts rematches with the nearest ranked opponent.
pub fn pair_round(
    standings_order: &[ParticipantId],
    played: &HashSet<(ParticipantId, ParticipantId)>,
    had_bye: &HashSet<ParticipantId>,
) -> SwissRound {
    let mut remaining = standings_order.to_vec();
    let mut round = SwissRound::default();

    if remaining.len() % 2 == 1 {
        let position = remaining
            .iter()
            .rposition(|id| !had_bye.contains(id))
            .unwrap_or(remaining.len() - 1);
        round.bye = Some(remaining.remove(position));
    }

    let mut budget = PAIRING_SEARCH_BUDGET;
    let mut pairs = Vec::with_capacity(remaining.len() / 2);
    if search(&remaining, played, &mut pairs, &mut budget) {
        round.pairs = pairs;
        return round;
    }

    log::warn!(
        "No rematch-free Swiss pairing found for {} participants, allowing rematches",
        remaining.len()
    );
    while remaining.len() >= 2 {
        let top = remaining.remove(0);
        let index = remaining
            .iter()
            .position(|other| !played.contains(&pairing_key(top, *other)))
            .unwrap_or_else(|| {
                round.rematches += 1;
                0
            });
        round.pairs.push((top, remaining.remove(index)));
    }

    round
}

fn search(
    remaining: &[ParticipantId],
    played: &HashSet<(ParticipantId, ParticipantId)>,
    pairs: &mut Vec<(ParticipantId, ParticipantId)>,
    budget: &mut usize,
) -> bool {
    let Some((&top, rest)) = remaining.split_first() else {
        return true;
    };
    if *budget == 0 {
        return false;
    }
    *budget -= 1;

    for (index, &opponent) in rest.iter().enumerate() {
        if played.contains(&pairing_key(top, opponent)) {
            continue;
        }

        let others: Vec<ParticipantId> = rest
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .map(|(_, id)| *id)
            .collect();

        pairs.push((top, opponent));
        if search(&others, played, pairs, budget) {
            return true;
        }
        pairs.pop();

        if *budget == 0 {
            return false;
        }
    }

    false
}

/// Swiss schedule: seeded first round plus placeholder rounds
pub fn generate(config: &SwissFormat, participants: &[ParticipantId]) -> Schedule {
    let rounds = config.round_count(participants.len());
    let mut schedule = Schedule {
        rounds,
        ..Schedule::default()
    };

    let mut seeded = participants.chunks_exact(2);
    for (number, pair) in seeded.by_ref().enumerate() {
        schedule.matches.push(AbstractMatch {
            phase: TournamentPhase::Swiss,
            round: 1,
            match_number: number as u32 + 1,
            group: None,
            label: "Round 1".to_string(),
            home: Slot::participant(pair[0]),
            away: Slot::participant(pair[1]),
        });
    }
    if let Some(&participant_id) = seeded.remainder().first() {
        schedule.byes.push(ScheduledBye {
            phase: TournamentPhase::Swiss,
            round: 1,
            participant_id,
        });
    }

    let per_round = participants.len() / 2;
    for round in 2..=rounds {
        for number in 1..=per_round {
            schedule.matches.push(AbstractMatch {
                phase: TournamentPhase::Swiss,
                round,
                match_number: number as u32,
                group: None,
                label: format!("Round {round}"),
                home: Slot::SwissPairing,
                away: Slot::SwissPairing,
            });
        }
    }

    schedule
}
