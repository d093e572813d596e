//! Resolution of placeholder slots into concrete participants.
//!
//! Sessions are walked in round order so a winner resolved in round `r` is
//! visible to round `r + 1` within the same pass. Sessions that already have
//! a result keep their bindings, as do Swiss rounds that were paired before.
//! A result that later completed sessions were resolved from is therefore
//! frozen; see [`dependent_results`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::standings::{StandingsTable, group_orders};
use crate::catalog::{FormatRules, TiebreakCriterion, TournamentTypeDefinition};
use crate::schedule::{MatchRef, Slot, TournamentPhase, swiss};
use crate::sessions::{ByeRecord, Session, SlotBinding};
use crate::tournament::{ParticipantId, TournamentError, TournamentResult, TournamentSnapshot};

/// Sessions after resolution plus what changed
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Every session in round order with current bindings
    pub sessions: Vec<Session>,
    /// Bindings that differ from what is stored
    pub bindings: Vec<SlotBinding>,
    /// Byes handed out by newly paired Swiss rounds
    pub byes: Vec<ByeRecord>,
}

/// Resolve every slot that can be resolved from the recorded results
///
/// # Errors
///
/// * `TournamentError::IncompleteResults` - A result exists for a session
///   whose participants are not bound
pub fn resolve(
    definition: &TournamentTypeDefinition,
    snapshot: &TournamentSnapshot,
) -> TournamentResult<Resolution> {
    let tournament_id = snapshot.tournament.id;
    let mut sessions = snapshot.sessions.clone();
    sessions.sort_by_key(|s| (s.tournament_round, s.tournament_phase, s.tournament_match_number));

    let unbound_results = sessions
        .iter()
        .filter(|s| s.is_completed() && s.participants().is_none())
        .count();
    if unbound_results > 0 {
        return Err(TournamentError::IncompleteResults {
            tournament_id,
            pending: unbound_results,
        });
    }

    let format = &definition.format;
    let groups = group_orders(
        &snapshot.participants,
        &sessions,
        format.points_table(),
        format.tiebreak_chain(),
        true,
    );
    let index: HashMap<MatchRef, usize> = sessions
        .iter()
        .enumerate()
        .map(|(i, s)| (s.match_ref(), i))
        .collect();

    let mut bindings = Vec::new();
    for i in 0..sessions.len() {
        if sessions[i].is_completed() {
            continue;
        }

        let home = resolve_slot(&sessions, &index, &groups, sessions[i].home_slot, sessions[i].home_participant);
        let away = resolve_slot(&sessions, &index, &groups, sessions[i].away_slot, sessions[i].away_participant);

        let session = &mut sessions[i];
        if (home, away) != (session.home_participant, session.away_participant) {
            session.home_participant = home;
            session.away_participant = away;
            bindings.push(SlotBinding {
                session_id: session.id,
                home_participant: home,
                away_participant: away,
            });
        }
    }

    let byes = pair_swiss_rounds(definition, snapshot, &mut sessions, &mut bindings);

    Ok(Resolution {
        sessions,
        bindings,
        byes,
    })
}

/// Completed sessions whose participants were decided by `source`'s result
///
/// Knockout slots depend on the match they name, group placements on every
/// match of their group, and a Swiss round on every earlier Swiss round.
pub fn dependent_results<'a>(sessions: &'a [Session], source: &Session) -> Vec<&'a Session> {
    sessions
        .iter()
        .filter(|s| s.id != source.id && s.is_completed())
        .filter(|s| {
            feeds(s.home_slot, source)
                || feeds(s.away_slot, source)
                || (s.home_slot == Slot::SwissPairing
                    && source.tournament_phase == TournamentPhase::Swiss
                    && s.tournament_round > source.tournament_round)
        })
        .collect()
}

fn feeds(slot: Slot, source: &Session) -> bool {
    match slot {
        Slot::WinnerOf { source: from } | Slot::LoserOf { source: from } => from == source.match_ref(),
        Slot::GroupPlacement { group, .. } => {
            source.tournament_phase == TournamentPhase::GroupStage && source.group_index == Some(group)
        }
        Slot::Participant { .. } | Slot::SwissPairing => false,
    }
}

fn resolve_slot(
    sessions: &[Session],
    index: &HashMap<MatchRef, usize>,
    groups: &BTreeMap<u32, Vec<ParticipantId>>,
    slot: Slot,
    current: Option<ParticipantId>,
) -> Option<ParticipantId> {
    match slot {
        Slot::Participant { participant_id } => Some(participant_id),
        Slot::WinnerOf { source } => index.get(&source).and_then(|i| sessions[*i].winner()),
        Slot::LoserOf { source } => index.get(&source).and_then(|i| sessions[*i].loser()),
        Slot::GroupPlacement { group, position } => {
            let order = groups.get(&group)?;
            order.get(position.checked_sub(1)? as usize).copied()
        }
        Slot::SwissPairing => current,
    }
}

/// Pair the next Swiss round once every earlier round is reported
fn pair_swiss_rounds(
    definition: &TournamentTypeDefinition,
    snapshot: &TournamentSnapshot,
    sessions: &mut [Session],
    bindings: &mut Vec<SlotBinding>,
) -> Vec<ByeRecord> {
    let rounds: BTreeSet<u32> = sessions
        .iter()
        .filter(|s| s.home_slot == Slot::SwissPairing)
        .map(|s| s.tournament_round)
        .collect();

    let mut new_byes: Vec<ByeRecord> = Vec::new();
    for round in rounds {
        let in_round: Vec<usize> = (0..sessions.len())
            .filter(|i| {
                sessions[*i].tournament_phase == TournamentPhase::Swiss
                    && sessions[*i].tournament_round == round
            })
            .collect();

        let already_paired = in_round.iter().any(|i| {
            sessions[*i].home_participant.is_some() || sessions[*i].away_participant.is_some()
        });
        if already_paired {
            continue;
        }

        let earlier_complete = sessions
            .iter()
            .filter(|s| s.tournament_phase == TournamentPhase::Swiss && s.tournament_round < round)
            .all(Session::is_completed);
        if !earlier_complete {
            break;
        }

        let byes: Vec<ByeRecord> = snapshot
            .byes
            .iter()
            .chain(new_byes.iter())
            .filter(|bye| bye.phase == TournamentPhase::Swiss)
            .copied()
            .collect();
        let table = StandingsTable::from_results(
            &snapshot.participants,
            sessions.iter().filter(|s| s.tournament_phase == TournamentPhase::Swiss),
            byes.iter(),
            definition.format.points_table(),
            definition.format.bye_points(),
        );
        let order: Vec<ParticipantId> = table
            .order(&snapshot.participants, &[TiebreakCriterion::Points])
            .into_iter()
            .flatten()
            .collect();
        let had_bye: HashSet<ParticipantId> = byes.iter().map(|bye| bye.participant_id).collect();

        let pairing = swiss::pair_round(&order, &table.played_pairs(), &had_bye);
        if pairing.rematches > 0 {
            log::warn!(
                "Tournament {} Swiss round {round} repeats {} pairing(s)",
                snapshot.tournament.id,
                pairing.rematches
            );
        }

        for (i, (home, away)) in in_round.into_iter().zip(pairing.pairs) {
            let session = &mut sessions[i];
            session.home_participant = Some(home);
            session.away_participant = Some(away);
            bindings.push(SlotBinding {
                session_id: session.id,
                home_participant: Some(home),
                away_participant: Some(away),
            });
        }

        if let Some(participant_id) = pairing.bye {
            new_byes.push(ByeRecord {
                tournament_id: snapshot.tournament.id,
                phase: TournamentPhase::Swiss,
                round,
                participant_id,
            });
        }
        log::debug!("Paired Swiss round {round} of tournament {}", snapshot.tournament.id);
    }

    new_byes
}
