/// Property-based tests for schedule generation using proptest
///
/// These tests check the structural guarantees of every scheduler across
/// the whole range of roster sizes the catalog accepts.
use academy_tournaments::catalog::{FormatCode, TournamentTypeCatalog, TournamentTypeDefinition};
use academy_tournaments::schedule::{self, Schedule, Slot, TournamentPhase};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};

fn definition(code: FormatCode) -> TournamentTypeDefinition {
    TournamentTypeCatalog::builtin()
        .get(code)
        .expect("builtin format")
        .clone()
}

// Roster of distinct ids in seed order, offset so ids never equal seeds
fn roster(size: usize) -> Vec<i64> {
    (0..size as i64).map(|i| 1000 + i * 7).collect()
}

// Strategy for a power-of-two bracket size within the catalog bounds
fn bracket_size_strategy() -> impl Strategy<Value = usize> {
    (2u32..=6).prop_map(|exp| 1usize << exp)
}

fn concrete_sides(schedule: &Schedule) -> Vec<(TournamentPhase, u32, i64)> {
    schedule
        .matches
        .iter()
        .flat_map(|m| {
            [m.home, m.away]
                .into_iter()
                .filter_map(move |slot| slot.concrete().map(|id| (m.phase, m.round, id)))
        })
        .collect()
}

fn assert_match_numbers_unique(schedule: &Schedule) -> Result<(), TestCaseError> {
    let mut seen = HashSet::new();
    for m in &schedule.matches {
        prop_assert!(m.match_number >= 1);
        prop_assert!(
            seen.insert(m.match_ref()),
            "duplicate match address {:?}",
            m.match_ref()
        );
    }
    Ok(())
}

proptest! {
    #[test]
    fn test_league_counts_match_definition(size in 4usize..=64) {
        let definition = definition(FormatCode::League);
        let schedule = schedule::generate(&definition, &roster(size)).unwrap();

        prop_assert_eq!(schedule.matches.len(), definition.compute_match_count(size));
        prop_assert_eq!(schedule.rounds, definition.compute_round_count(size));
        assert_match_numbers_unique(&schedule)?;
    }

    #[test]
    fn test_league_every_pair_meets_once(size in 4usize..=24) {
        let participants = roster(size);
        let schedule = schedule::generate(&definition(FormatCode::League), &participants).unwrap();

        let mut pairs = HashSet::new();
        for m in &schedule.matches {
            let home = m.home.concrete().unwrap();
            let away = m.away.concrete().unwrap();
            prop_assert_ne!(home, away);
            prop_assert!(pairs.insert((home.min(away), home.max(away))));
        }
        prop_assert_eq!(pairs.len(), size * (size - 1) / 2);
    }

    #[test]
    fn test_league_nobody_plays_twice_in_a_round(size in 4usize..=24) {
        let schedule = schedule::generate(&definition(FormatCode::League), &roster(size)).unwrap();

        let mut seen = HashSet::new();
        for side in concrete_sides(&schedule) {
            prop_assert!(seen.insert(side), "{:?} plays twice", side);
        }
    }

    #[test]
    fn test_odd_league_gives_each_participant_one_bye(half in 2usize..=12) {
        let size = 2 * half + 1;
        let participants = roster(size);
        let schedule = schedule::generate(&definition(FormatCode::League), &participants).unwrap();

        let mut byes: HashMap<i64, usize> = HashMap::new();
        let mut rounds = BTreeSet::new();
        for bye in &schedule.byes {
            *byes.entry(bye.participant_id).or_default() += 1;
            prop_assert!(rounds.insert(bye.round), "two byes in round {}", bye.round);
        }
        prop_assert_eq!(byes.len(), size);
        prop_assert!(byes.values().all(|count| *count == 1));
    }

    #[test]
    fn test_knockout_counts_match_definition(size in bracket_size_strategy()) {
        let definition = definition(FormatCode::Knockout);
        let schedule = schedule::generate(&definition, &roster(size)).unwrap();

        prop_assert_eq!(schedule.matches.len(), definition.compute_match_count(size));
        prop_assert_eq!(schedule.matches.len(), size - 1);
        prop_assert_eq!(schedule.rounds, definition.compute_round_count(size));
        prop_assert!(schedule.byes.is_empty());
        assert_match_numbers_unique(&schedule)?;
    }

    #[test]
    fn test_knockout_top_seeds_in_opposite_halves(size in bracket_size_strategy()) {
        let participants = roster(size);
        let schedule = schedule::generate(&definition(FormatCode::Knockout), &participants).unwrap();

        let half = (size / 4) as u32;
        let position = |id: i64| {
            schedule
                .round(TournamentPhase::Knockout, 1)
                .find(|m| m.home.concrete() == Some(id) || m.away.concrete() == Some(id))
                .map(|m| m.match_number)
                .unwrap()
        };
        let top = position(participants[0]);
        let second = position(participants[1]);
        prop_assert!(top <= half && second > half, "seeds 1/2 at {} and {}", top, second);
    }

    #[test]
    fn test_knockout_later_rounds_are_placeholders(size in bracket_size_strategy()) {
        let schedule = schedule::generate(&definition(FormatCode::Knockout), &roster(size)).unwrap();

        for m in schedule.matches.iter().filter(|m| m.round > 1) {
            prop_assert!(
                matches!(m.home, Slot::WinnerOf { .. } | Slot::LoserOf { .. }),
                "round {} home slot should be a placeholder",
                m.round
            );
            prop_assert!(
                matches!(m.away, Slot::WinnerOf { .. } | Slot::LoserOf { .. }),
                "round {} away slot should be a placeholder",
                m.round
            );
        }
    }

    #[test]
    fn test_group_knockout_counts_match_definition(size in 8usize..=64) {
        let definition = definition(FormatCode::GroupKnockout);
        let schedule = schedule::generate(&definition, &roster(size)).unwrap();

        prop_assert_eq!(schedule.matches.len(), definition.compute_match_count(size));
        prop_assert_eq!(schedule.rounds, definition.compute_round_count(size));
        assert_match_numbers_unique(&schedule)?;

        // Group matches come first, the bracket follows
        let last_group_round = schedule
            .matches
            .iter()
            .filter(|m| m.phase == TournamentPhase::GroupStage)
            .map(|m| m.round)
            .max()
            .unwrap();
        prop_assert!(
            schedule
                .matches
                .iter()
                .filter(|m| m.phase == TournamentPhase::Knockout)
                .all(|m| m.round > last_group_round)
        );
    }

    #[test]
    fn test_swiss_first_round_pairs_everyone_once(size in 4usize..=64) {
        let definition = definition(FormatCode::Swiss);
        let participants = roster(size);
        let schedule = schedule::generate(&definition, &participants).unwrap();

        prop_assert_eq!(schedule.matches.len(), definition.compute_match_count(size));
        prop_assert_eq!(schedule.rounds, definition.compute_round_count(size));

        let mut seen: HashSet<i64> = schedule
            .byes
            .iter()
            .map(|bye| bye.participant_id)
            .collect();
        for m in schedule.round(TournamentPhase::Swiss, 1) {
            prop_assert!(seen.insert(m.home.concrete().unwrap()));
            prop_assert!(seen.insert(m.away.concrete().unwrap()));
        }
        prop_assert_eq!(seen.len(), size);

        if size % 2 == 1 {
            prop_assert_eq!(schedule.byes.len(), 1);
            prop_assert_eq!(schedule.byes[0].participant_id, participants[size - 1]);
        }
    }

    #[test]
    fn test_generation_is_deterministic(size in 8usize..=32, format in 0usize..4) {
        let code = FormatCode::ALL[format];
        let definition = definition(code);
        let participants = roster(size);
        prop_assume!(definition.validate_participant_count(size).is_ok());

        let first = schedule::generate(&definition, &participants).unwrap();
        let second = schedule::generate(&definition, &participants).unwrap();
        prop_assert_eq!(first, second);
    }
}

#[test]
fn test_rejects_duplicate_participant() {
    let result = schedule::generate(&definition(FormatCode::League), &[1, 2, 3, 2]);
    assert!(result.is_err());
}

#[test]
fn test_rejects_non_power_of_two_bracket() {
    let result = schedule::generate(&definition(FormatCode::Knockout), &roster(6));
    assert!(result.unwrap_err().is_validation());
}
