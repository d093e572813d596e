//! Group stage followed by a knockout bracket.

use super::knockout::{build_bracket, seed_positions};
use super::round_robin::circle_rounds;
use super::{AbstractMatch, Schedule, ScheduledBye, Slot, TournamentPhase};
use crate::catalog::{GROUP_STAGE_ROUNDS, GroupKnockoutFormat, KnockoutFormat, QUALIFIERS_PER_GROUP};
use crate::tournament::ParticipantId;

const STAGE_PREFIX: &str = "Knockout Stage - ";

/// Display name of a 0-based group index
pub fn group_name(group: u32) -> String {
    char::from_u32(u32::from(b'A') + group)
        .filter(char::is_ascii_uppercase)
        .map(String::from)
        .unwrap_or_else(|| (group + 1).to_string())
}

/// Serpentine fill: seeds 1..G go A..G, the next G go back G..A, and so on
pub fn assign_groups(participants: &[ParticipantId], group_count: usize) -> Vec<Vec<ParticipantId>> {
    let mut groups = vec![Vec::new(); group_count];
    if group_count == 0 {
        return groups;
    }

    for (index, participant) in participants.iter().enumerate() {
        let pass = index / group_count;
        let offset = index % group_count;
        let group = if pass % 2 == 0 {
            offset
        } else {
            group_count - 1 - offset
        };
        groups[group].push(*participant);
    }

    groups
}

/// Knockout entrants: group winners in group order, then runners-up
fn qualifier_slots(group_count: usize) -> Vec<Slot> {
    (1..=QUALIFIERS_PER_GROUP as u32)
        .flat_map(|position| {
            (0..group_count as u32).map(move |group| Slot::GroupPlacement { group, position })
        })
        .collect()
}

fn group_of(slot: &Slot) -> Option<u32> {
    match slot {
        Slot::GroupPlacement { group, .. } => Some(*group),
        _ => None,
    }
}

/// Swap the lower-seeded sides of first-round pairings until no pairing
/// puts two finishers of the same group against each other
///
/// Returns the number of same-group pairings that could not be separated.
pub fn separate_group_rematches(entrants: &mut [Slot]) -> usize {
    let size = KnockoutFormat::bracket_size(entrants.len());
    let pairs: Vec<(usize, usize)> = seed_positions(size)
        .chunks(2)
        .map(|pair| (pair[0] - 1, pair[1] - 1))
        .filter(|(_, lower)| *lower < entrants.len())
        .collect();

    let same_group = |entrants: &[Slot], a: usize, b: usize| {
        group_of(&entrants[a]).is_some() && group_of(&entrants[a]) == group_of(&entrants[b])
    };

    let mut unresolved = 0;
    for i in 0..pairs.len() {
        let (top, lower) = pairs[i];
        let current: &[Slot] = entrants;
        if !same_group(current, top, lower) {
            continue;
        }

        let partner = pairs.iter().enumerate().find(|(j, (other_top, other_lower))| {
            *j != i
                && !same_group(current, top, *other_lower)
                && !same_group(current, *other_top, lower)
        });

        match partner {
            Some((_, (_, other_lower))) => entrants.swap(lower, *other_lower),
            None => unresolved += 1,
        }
    }

    unresolved
}

/// Group stage plus knockout schedule over the roster in seed order
pub fn generate(config: &GroupKnockoutFormat, participants: &[ParticipantId]) -> Schedule {
    let group_count = GroupKnockoutFormat::group_count(participants.len());
    let groups = assign_groups(participants, group_count);

    let mut schedule = Schedule::default();
    let mut numbers = vec![0u32; GROUP_STAGE_ROUNDS as usize];

    for (group_index, members) in groups.iter().enumerate() {
        let group = group_index as u32;
        let name = group_name(group);

        for (index, pairing) in circle_rounds(members).into_iter().enumerate() {
            let round = index as u32 + 1;
            if numbers.len() < round as usize {
                numbers.resize(round as usize, 0);
            }

            for (home, away) in pairing.pairs {
                let number = &mut numbers[index];
                *number += 1;
                schedule.matches.push(AbstractMatch {
                    phase: TournamentPhase::GroupStage,
                    round,
                    match_number: *number,
                    group: Some(group),
                    label: format!("Group Stage - Group {name} - Round {round}"),
                    home: Slot::participant(home),
                    away: Slot::participant(away),
                });
            }

            if let Some(participant_id) = pairing.bye {
                schedule.byes.push(ScheduledBye {
                    phase: TournamentPhase::GroupStage,
                    round,
                    participant_id,
                });
            }
        }
    }

    let mut entrants = qualifier_slots(group_count);
    let unresolved = separate_group_rematches(&mut entrants);
    if unresolved > 0 {
        log::debug!("{unresolved} first-round knockout pairing(s) keep group rivals together");
    }

    let group_rounds = numbers.len() as u32;
    let bracket = build_bracket(
        &config.knockout,
        &entrants,
        TournamentPhase::Knockout,
        group_rounds + 1,
        STAGE_PREFIX,
    );

    schedule.rounds = group_rounds + bracket.rounds;
    schedule.matches.extend(bracket.matches);
    schedule.byes.extend(bracket.byes);
    schedule
}
