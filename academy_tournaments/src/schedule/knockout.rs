//! Single elimination brackets.
//!
//! Seeds are placed with the standard recursive expansion so the top two
//! seeds can only meet in the final. Later rounds reference earlier matches
//! through [`Slot::WinnerOf`]; match `k` of round `r + 1` takes the winners
//! of matches `2k - 1` and `2k` of round `r`.

use super::{AbstractMatch, MatchRef, Schedule, ScheduledBye, Slot, TournamentPhase};
use crate::catalog::{FormatRules, KnockoutFormat};
use crate::tournament::ParticipantId;

/// Label of the match between the two losing semi-finalists
pub const THIRD_PLACE_LABEL: &str = "Third-place playoff";

/// Bracket line-up by seed number for a power-of-two bracket
///
/// Adjacent entries meet in the first round, e.g. size 8 gives
/// `[1, 8, 4, 5, 2, 7, 3, 6]`.
pub fn seed_positions(size: usize) -> Vec<usize> {
    let mut positions = vec![1];
    while positions.len() < size {
        let span = positions.len() * 2 + 1;
        positions = positions
            .into_iter()
            .flat_map(|seed| [seed, span - seed])
            .collect();
    }
    positions
}

/// Build a bracket over `entrants` in seed order
///
/// Missing seeds beyond the roster are byes: the paired entrant is carried
/// into the next round without a match. Rounds are numbered from
/// `first_round` and labels get `label_prefix` prepended.
pub fn build_bracket(
    config: &KnockoutFormat,
    entrants: &[Slot],
    phase: TournamentPhase,
    first_round: u32,
    label_prefix: &str,
) -> Schedule {
    let size = KnockoutFormat::bracket_size(entrants.len());
    let bracket_rounds = size.trailing_zeros();
    let mut schedule = Schedule {
        rounds: bracket_rounds,
        ..Schedule::default()
    };

    let mut current: Vec<Option<Slot>> = seed_positions(size)
        .into_iter()
        .map(|seed| entrants.get(seed - 1).copied())
        .collect();

    for bracket_round in 1..=bracket_rounds {
        let round = first_round + bracket_round - 1;
        let label = format!(
            "{label_prefix}{}",
            config.round_label(bracket_round, bracket_rounds)
        );
        let mut next = Vec::with_capacity(current.len() / 2);
        let mut match_number = 0;

        for pair in current.chunks(2) {
            match (pair[0], pair[1]) {
                (Some(home), Some(away)) => {
                    match_number += 1;
                    let source = MatchRef::new(phase, round, match_number);
                    schedule.matches.push(AbstractMatch {
                        phase,
                        round,
                        match_number,
                        group: None,
                        label: label.clone(),
                        home,
                        away,
                    });
                    next.push(Some(Slot::winner_of(source)));
                }
                (Some(carried), None) | (None, Some(carried)) => {
                    if let Some(participant_id) = carried.concrete() {
                        schedule.byes.push(ScheduledBye {
                            phase,
                            round,
                            participant_id,
                        });
                    }
                    next.push(Some(carried));
                }
                (None, None) => next.push(None),
            }
        }

        current = next;
    }

    if config.has_third_place_playoff(entrants.len()) {
        add_third_place_playoff(&mut schedule, phase, first_round + bracket_rounds - 1, label_prefix);
    }

    schedule
}

fn add_third_place_playoff(
    schedule: &mut Schedule,
    phase: TournamentPhase,
    final_round: u32,
    label_prefix: &str,
) {
    let Some(final_match) = schedule.find(MatchRef::new(phase, final_round, 1)) else {
        return;
    };
    let (Slot::WinnerOf { source: first }, Slot::WinnerOf { source: second }) =
        (final_match.home, final_match.away)
    else {
        return;
    };

    schedule.matches.push(AbstractMatch {
        phase,
        round: final_round,
        match_number: 2,
        group: None,
        label: format!("{label_prefix}{THIRD_PLACE_LABEL}"),
        home: Slot::loser_of(first),
        away: Slot::loser_of(second),
    });
}

/// Knockout schedule over the roster in seed order
pub fn generate(config: &KnockoutFormat, participants: &[ParticipantId]) -> Schedule {
    let entrants: Vec<Slot> = participants.iter().copied().map(Slot::participant).collect();
    build_bracket(config, &entrants, TournamentPhase::Knockout, 1, "")
}
