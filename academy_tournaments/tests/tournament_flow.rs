//! Integration tests for the tournament lifecycle
//!
//! These tests drive the service end to end against the in-memory
//! repository: creation, enrolment, generation, results, standings and
//! reward payout.

use academy_tournaments::db::{InMemoryTournamentRepository, TournamentRepository};
use academy_tournaments::rewards::{
    PlacementBucket, PlacementReward, RewardCurrency, RewardPolicy, RewardReason,
};
use academy_tournaments::schedule::TournamentPhase;
use academy_tournaments::sessions::{GameResult, Side};
use academy_tournaments::tournament::{
    NewTournament, TournamentError, TournamentId, TournamentService, TournamentStatus,
};
use academy_tournaments::catalog::{FormatCode, KnockoutFormat, TournamentTypeCatalog};
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

struct Harness {
    repo: Arc<InMemoryTournamentRepository>,
    service: TournamentService,
}

fn harness() -> Harness {
    harness_with(TournamentTypeCatalog::builtin())
}

fn harness_with(catalog: TournamentTypeCatalog) -> Harness {
    let repo = Arc::new(InMemoryTournamentRepository::new());
    let service = TournamentService::new(repo.clone(), Arc::new(catalog));
    Harness { repo, service }
}

/// Built-in catalog whose knockout also plays for third place
fn playoff_catalog() -> TournamentTypeCatalog {
    let mut knockout = TournamentTypeCatalog::builtin()
        .get(FormatCode::Knockout)
        .unwrap()
        .clone();
    knockout.format = KnockoutFormat::with_third_place_playoff().into();
    let mut definitions: Vec<_> = TournamentTypeCatalog::builtin().definitions().cloned().collect();
    definitions.push(knockout);
    TournamentTypeCatalog::with_definitions(definitions)
}

fn request(format: &str, reward_policy: Option<&str>) -> NewTournament {
    NewTournament {
        name: "Academy Cup".to_string(),
        format: format.to_string(),
        start_date: Utc.with_ymd_and_hms(2026, 11, 7, 9, 0, 0).unwrap(),
        reward_policy: reward_policy.map(str::to_string),
    }
}

async fn setup(h: &Harness, format: &str, participants: &[i64]) -> TournamentId {
    let tournament = h.service.create_tournament(request(format, None)).await.unwrap();
    for participant in participants {
        h.service.enroll(tournament.id, *participant).await.unwrap();
    }
    h.service.generate(tournament.id).await.unwrap();
    h.service
        .record_status_change(tournament.id, TournamentStatus::Ongoing)
        .await
        .unwrap();
    tournament.id
}

/// Report every playable session, home side winning, until none is left
async fn play_out(h: &Harness, tournament_id: TournamentId) {
    loop {
        let snapshot = h.repo.load_snapshot(tournament_id).await.unwrap();
        let playable: Vec<_> = snapshot
            .sessions
            .iter()
            .filter(|s| !s.is_completed() && s.participants().is_some())
            .map(|s| s.id)
            .collect();
        if playable.is_empty() {
            assert_eq!(snapshot.pending_sessions(), 0, "schedule stalled");
            return;
        }
        for session_id in playable {
            h.service
                .record_result(session_id, GameResult::new(2, 1))
                .await
                .unwrap();
        }
    }
}

#[tokio::test]
async fn test_four_player_knockout_is_two_semis_and_a_final() {
    let h = harness();
    let id = setup(&h, "knockout", &[1, 2, 3, 4]).await;

    let snapshot = h.repo.load_snapshot(id).await.unwrap();
    let shape: Vec<_> = snapshot
        .sessions
        .iter()
        .map(|s| (s.tournament_round, s.title.as_str(), s.participants()))
        .collect();
    assert_eq!(
        shape,
        vec![
            (1, "Academy Cup - Semi-finals", Some((1, 4))),
            (1, "Academy Cup - Semi-finals", Some((2, 3))),
            (2, "Academy Cup - Final", None),
        ]
    );

    play_out(&h, id).await;
    let rankings = h.service.rankings(id).await.unwrap();
    let ranks: Vec<_> = rankings.iter().map(|r| (r.participant_id, r.rank)).collect();
    assert_eq!(ranks, vec![(1, 1), (2, 2), (3, 3), (4, 3)]);

    // Exactly one participant finishes without a loss
    assert_eq!(rankings.iter().filter(|r| r.losses == 0).count(), 1);
}

#[tokio::test]
async fn test_knockout_to_payout() {
    let h = harness_with(playoff_catalog());
    let id = setup(&h, "knockout", &[11, 12, 13, 14]).await;

    // Semi-finals: 11 v 14 and 12 v 13
    h.service.record_result(1, GameResult::new(2, 0)).await.unwrap();
    let recorded = h
        .service
        .record_result(2, GameResult::decided(1, Side::Away))
        .await
        .unwrap();
    assert_eq!(recorded.session.winner(), Some(13));

    let final_match = h.repo.load_session(3).await.unwrap();
    assert_eq!(final_match.participants(), Some((11, 13)));
    let playoff = h.repo.load_session(4).await.unwrap();
    assert_eq!(playoff.participants(), Some((14, 12)));

    h.service.record_result(3, GameResult::new(0, 1)).await.unwrap();
    h.service.record_result(4, GameResult::new(3, 2)).await.unwrap();

    let ranks: Vec<_> = h
        .service
        .rankings(id)
        .await
        .unwrap()
        .iter()
        .map(|r| (r.participant_id, r.rank))
        .collect();
    assert_eq!(ranks, vec![(13, 1), (11, 2), (14, 3), (12, 4)]);

    h.service
        .record_status_change(id, TournamentStatus::Completed)
        .await
        .unwrap();
    let entries = h.service.distribute_rewards(id).await.unwrap();
    assert_eq!(entries.len(), 11);

    let champion_xp: i64 = entries
        .iter()
        .filter(|e| e.participant_id == 13 && e.currency == RewardCurrency::Xp)
        .map(|e| e.amount)
        .sum();
    assert_eq!(champion_xp, 500 + 2 * 10);
    assert!(
        entries
            .iter()
            .any(|e| e.participant_id == 12
                && e.reason == RewardReason::Placement(PlacementBucket::Participant))
    );

    // Second call returns the first payout unchanged
    let again = h.service.distribute_rewards(id).await.unwrap();
    assert_eq!(again, entries);
}

#[tokio::test]
async fn test_distribute_requires_completion() {
    let h = harness();
    let id = setup(&h, "league", &[1, 2, 3, 4]).await;

    let result = h.service.distribute_rewards(id).await;
    assert!(matches!(result, Err(TournamentError::TournamentNotCompleted(_))));

    h.service
        .record_status_change(id, TournamentStatus::Completed)
        .await
        .unwrap();
    let result = h.service.distribute_rewards(id).await;
    assert!(matches!(
        result,
        Err(TournamentError::IncompleteResults { pending: 6, .. })
    ));
}

#[tokio::test]
async fn test_policy_snapshot_is_frozen() {
    let h = harness();
    let id = setup(&h, "league", &[1, 2, 3, 4]).await;

    let mut edited = RewardPolicy::default();
    edited.placements.insert(
        PlacementBucket::First,
        PlacementReward {
            xp: 9999,
            credits: 9999,
        },
    );
    h.service.save_reward_policy(edited).await.unwrap();

    play_out(&h, id).await;
    h.service
        .record_status_change(id, TournamentStatus::Completed)
        .await
        .unwrap();

    let entries = h.service.distribute_rewards(id).await.unwrap();
    let first_xp: Vec<_> = entries
        .iter()
        .filter(|e| e.reason == RewardReason::Placement(PlacementBucket::First))
        .filter(|e| e.currency == RewardCurrency::Xp)
        .map(|e| e.amount)
        .collect();
    assert!(!first_xp.is_empty());
    assert!(first_xp.iter().all(|xp| *xp == 500));

    // New tournaments pick up the edited policy
    let later = h
        .service
        .create_tournament(request("league", None))
        .await
        .unwrap();
    assert_eq!(
        later
            .reward_policy_snapshot
            .placement_reward(PlacementBucket::First)
            .xp,
        9999
    );
}

#[tokio::test]
async fn test_named_policy_is_captured() {
    let h = harness();
    let mut gold = RewardPolicy::default();
    gold.name = "gold".to_string();
    gold.participation_rewards.session_attendance = 25;
    h.service.save_reward_policy(gold).await.unwrap();

    let tournament = h
        .service
        .create_tournament(request("swiss", Some("gold")))
        .await
        .unwrap();
    assert_eq!(tournament.reward_policy_snapshot.policy_name(), "gold");
    assert_eq!(tournament.reward_policy_snapshot.session_attendance_xp(), 25);
}

#[tokio::test]
async fn test_swiss_plays_out_without_rematches_or_double_byes() {
    let h = harness();
    let participants: Vec<i64> = (101..=107).collect();
    let id = setup(&h, "swiss", &participants).await;

    play_out(&h, id).await;
    let snapshot = h.repo.load_snapshot(id).await.unwrap();

    let mut pairs = HashSet::new();
    for session in &snapshot.sessions {
        let (home, away) = session.participants().unwrap();
        assert!(pairs.insert((home.min(away), home.max(away))), "rematch {home} v {away}");
    }

    let mut byes: HashMap<i64, usize> = HashMap::new();
    for bye in &snapshot.byes {
        assert_eq!(bye.phase, TournamentPhase::Swiss);
        *byes.entry(bye.participant_id).or_default() += 1;
    }
    assert_eq!(snapshot.byes.len(), 3);
    assert!(byes.values().all(|count| *count == 1));

    let rankings = h.service.rankings(id).await.unwrap();
    assert_eq!(rankings.len(), 7);
    assert_eq!(rankings[0].rank, 1);
}

#[tokio::test]
async fn test_group_knockout_plays_out() {
    let h = harness();
    let participants: Vec<i64> = (1..=12).collect();
    let id = setup(&h, "group_knockout", &participants).await;

    play_out(&h, id).await;
    let snapshot = h.repo.load_snapshot(id).await.unwrap();

    let group_matches = snapshot
        .sessions
        .iter()
        .filter(|s| s.tournament_phase == TournamentPhase::GroupStage)
        .count();
    let knockout_matches = snapshot
        .sessions
        .iter()
        .filter(|s| s.tournament_phase == TournamentPhase::Knockout)
        .count();
    assert_eq!(group_matches, 18);
    assert_eq!(knockout_matches, 5);

    let rankings = h.service.recompute_rankings(id).await.unwrap();
    assert_eq!(rankings.len(), 12);
    assert_eq!(rankings.iter().filter(|r| r.rank == 1).count(), 1);
    assert_eq!(rankings.iter().filter(|r| r.rank == 2).count(), 1);
}

#[tokio::test]
async fn test_recompute_is_stable() {
    let h = harness();
    let id = setup(&h, "league", &[1, 2, 3, 4, 5]).await;
    h.service.record_result(1, GameResult::new(1, 1)).await.unwrap();
    h.service.record_result(2, GameResult::new(0, 4)).await.unwrap();

    let first = h.service.recompute_rankings(id).await.unwrap();
    let second = h.service.recompute_rankings(id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(h.service.rankings(id).await.unwrap(), second);
}

#[tokio::test]
async fn test_knockout_draw_needs_decider() {
    let h = harness();
    setup(&h, "knockout", &[1, 2, 3, 4]).await;

    let result = h.service.record_result(1, GameResult::new(2, 2)).await;
    assert!(matches!(result, Err(TournamentError::InvalidResult(_))));
}

#[tokio::test]
async fn test_semi_final_correction_rebinds_the_final() {
    let h = harness();
    let id = setup(&h, "knockout", &[1, 2, 3, 4]).await;
    h.service.record_result(1, GameResult::new(2, 1)).await.unwrap();
    h.service.record_result(2, GameResult::new(2, 1)).await.unwrap();

    // Corrected before the final is played: seed 4 goes through instead
    h.service.record_result(1, GameResult::new(0, 2)).await.unwrap();
    let final_match = h.repo.load_session(3).await.unwrap();
    assert_eq!(final_match.participants(), Some((4, 2)));

    h.service.record_result(3, GameResult::new(2, 1)).await.unwrap();
    let rankings = h.service.rankings(id).await.unwrap();
    assert_eq!(rankings[0].participant_id, 4);
    assert_eq!(rankings[0].losses, 0);
}

#[tokio::test]
async fn test_result_feeding_a_played_final_is_frozen() {
    let h = harness();
    let id = setup(&h, "knockout", &[1, 2, 3, 4]).await;
    play_out(&h, id).await;
    let before = h.service.rankings(id).await.unwrap();

    let result = h.service.record_result(1, GameResult::new(0, 2)).await;
    assert!(matches!(result, Err(TournamentError::InvalidState { .. })));

    // The final itself has nothing downstream and can still be corrected
    h.service.record_result(3, GameResult::new(0, 2)).await.unwrap();
    let after = h.service.rankings(id).await.unwrap();
    assert_ne!(before, after);
    assert_eq!(after[0].participant_id, 2);
    assert_eq!(h.repo.load_session(1).await.unwrap().winner(), Some(1));
}

#[tokio::test]
async fn test_group_result_feeding_a_played_knockout_is_frozen() {
    let h = harness();
    let id = setup(&h, "group_knockout", &(1..=8).collect::<Vec<_>>()).await;
    play_out(&h, id).await;

    let snapshot = h.repo.load_snapshot(id).await.unwrap();
    let group_match = snapshot
        .sessions
        .iter()
        .find(|s| s.tournament_phase == TournamentPhase::GroupStage)
        .unwrap();
    let result = h.service.record_result(group_match.id, GameResult::new(0, 5)).await;
    assert!(matches!(result, Err(TournamentError::InvalidState { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_generate_commits_once() {
    let h = harness();
    let tournament = h.service.create_tournament(request("league", None)).await.unwrap();
    let id = tournament.id;
    for participant in 1..=6 {
        h.service.enroll(id, participant).await.unwrap();
    }

    let first = tokio::spawn({
        let service = h.service.clone();
        async move { service.generate(id).await }
    });
    let second = tokio::spawn({
        let service = h.service.clone();
        async move { service.generate(id).await }
    });
    let results = [first.await.unwrap(), second.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(TournamentError::AlreadyGenerated(t)) if *t == id))
    );
    let snapshot = h.repo.load_snapshot(id).await.unwrap();
    assert_eq!(snapshot.sessions.len(), 15);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_recompute_agrees() {
    let h = harness();
    let id = setup(&h, "league", &[1, 2, 3, 4, 5]).await;
    h.service.record_result(1, GameResult::new(3, 0)).await.unwrap();
    h.service.record_result(2, GameResult::new(1, 1)).await.unwrap();

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let service = h.service.clone();
            tokio::spawn(async move { service.recompute_rankings(id).await })
        })
        .collect();
    let mut outcomes = Vec::new();
    for task in tasks {
        outcomes.push(task.await.unwrap().unwrap());
    }

    assert!(outcomes.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(h.service.rankings(id).await.unwrap(), outcomes[0]);
}
