//! Round robin scheduling with the circle method.
//!
//! The first participant stays fixed while the others rotate one position
//! per round. An odd roster gets a phantom slot; whoever is paired with it
//! sits the round out.

use super::{AbstractMatch, Schedule, ScheduledBye, Slot, TournamentPhase};
use crate::tournament::ParticipantId;

/// Pairings of a single round robin round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundPairings {
    /// `(home, away)` pairs
    pub pairs: Vec<(ParticipantId, ParticipantId)>,
    pub bye: Option<ParticipantId>,
}

/// Rounds needed for everyone to meet once
pub fn round_count(participants: usize) -> u32 {
    match participants {
        0 | 1 => 0,
        n if n % 2 == 0 => (n - 1) as u32,
        n => n as u32,
    }
}

/// All rounds of a single round robin
pub fn circle_rounds(participants: &[ParticipantId]) -> Vec<RoundPairings> {
    let mut slots: Vec<Option<ParticipantId>> = participants.iter().copied().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }

    let n = slots.len();
    if n < 2 {
        return Vec::new();
    }

    let mut rounds = Vec::with_capacity(n - 1);
    for round in 0..n - 1 {
        let mut pairs = Vec::with_capacity(n / 2);
        let mut bye = None;

        for i in 0..n / 2 {
            match (slots[i], slots[n - 1 - i]) {
                (Some(first), Some(second)) => {
                    // Fixed participant alternates home and away
                    if i == 0 && round % 2 == 1 {
                        pairs.push((second, first));
                    } else {
                        pairs.push((first, second));
                    }
                }
                (Some(alone), None) | (None, Some(alone)) => bye = Some(alone),
                (None, None) => {}
            }
        }

        rounds.push(RoundPairings { pairs, bye });
        slots[1..].rotate_right(1);
    }

    rounds
}

/// League schedule: one round robin over the whole roster
pub fn generate(participants: &[ParticipantId]) -> Schedule {
    let mut schedule = Schedule {
        rounds: round_count(participants.len()),
        ..Schedule::default()
    };

    for (index, pairing) in circle_rounds(participants).into_iter().enumerate() {
        let round = index as u32 + 1;

        for (number, (home, away)) in pairing.pairs.into_iter().enumerate() {
            schedule.matches.push(AbstractMatch {
                phase: TournamentPhase::League,
                round,
                match_number: number as u32 + 1,
                group: None,
                label: format!("Round {round}"),
                home: Slot::participant(home),
                away: Slot::participant(away),
            });
        }

        if let Some(participant_id) = pairing.bye {
            schedule.byes.push(ScheduledBye {
                phase: TournamentPhase::League,
                round,
                participant_id,
            });
        }
    }

    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    fn roster(n: i64) -> Vec<ParticipantId> {
        (1..=n).collect()
    }

    #[test]
    fn test_even_roster() {
        let rounds = circle_rounds(&roster(6));
        assert_eq!(rounds.len(), 5);
        assert!(rounds.iter().all(|r| r.pairs.len() == 3 && r.bye.is_none()));
    }

    #[test]
    fn test_odd_roster_gives_one_bye_each() {
        let rounds = circle_rounds(&roster(5));
        assert_eq!(rounds.len(), 5);

        let mut byes: Vec<_> = rounds.iter().filter_map(|r| r.bye).collect();
        byes.sort_unstable();
        assert_eq!(byes, roster(5));
        assert!(rounds.iter().all(|r| r.pairs.len() == 2));
    }

    #[test]
    fn test_everyone_meets_once() {
        let participants = roster(7);
        let mut seen = HashSet::new();

        for round in circle_rounds(&participants) {
            let mut in_round = HashSet::new();
            for (home, away) in round.pairs {
                assert!(in_round.insert(home) && in_round.insert(away));
                assert!(seen.insert((home.min(away), home.max(away))));
            }
        }
        assert_eq!(seen.len(), 21);
    }

    #[test]
    fn test_fixed_participant_alternates_home() {
        let rounds = circle_rounds(&roster(6));
        let mut home_games: HashMap<ParticipantId, usize> = HashMap::new();
        for round in &rounds {
            for (home, _) in &round.pairs {
                *home_games.entry(*home).or_default() += 1;
            }
        }
        assert_eq!(home_games[&1], 3);
    }

    #[test]
    fn test_generate_numbers_matches_per_round() {
        let schedule = generate(&roster(4));
        assert_eq!(schedule.rounds, 3);
        assert_eq!(schedule.matches.len(), 6);

        for round in 1..=3 {
            let numbers: Vec<_> = schedule
                .round(TournamentPhase::League, round)
                .map(|m| m.match_number)
                .collect();
            assert_eq!(numbers, vec![1, 2]);
        }
        assert_eq!(schedule.matches[0].label, "Round 1");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(generate(&roster(9)), generate(&roster(9)));
    }
}
