//! Ranking recomputation.

use std::sync::Arc;

use super::resolution::resolve;
use super::{RankingInput, StandingsTable, TournamentRanking};
use crate::catalog::{FormatRules, TournamentTypeCatalog, TournamentTypeDefinition};
use crate::db::TournamentRepository;
use crate::sessions::{ByeRecord, SlotBinding};
use crate::tournament::{TournamentId, TournamentResult, TournamentSnapshot};

/// Everything a recompute writes back
#[derive(Debug, Clone, Default)]
pub struct RecomputeOutcome {
    pub rankings: Vec<TournamentRanking>,
    pub bindings: Vec<SlotBinding>,
    pub byes: Vec<ByeRecord>,
}

/// Rebuild bindings and standings from a snapshot
///
/// Pure function of the snapshot: the same persisted results always give
/// the same outcome.
///
/// # Errors
///
/// * `TournamentError::IncompleteResults` - A result is recorded for a
///   session whose participants are not resolved
pub fn compute_outcome(
    definition: &TournamentTypeDefinition,
    snapshot: &TournamentSnapshot,
) -> TournamentResult<RecomputeOutcome> {
    let resolution = resolve(definition, snapshot)?;
    let format = &definition.format;

    let standings = StandingsTable::from_results(
        &snapshot.participants,
        resolution.sessions.iter(),
        snapshot.byes.iter().chain(resolution.byes.iter()),
        format.points_table(),
        format.bye_points(),
    );
    let input = RankingInput {
        seeds: &snapshot.participants,
        sessions: &resolution.sessions,
        standings: &standings,
    };

    let rankings = format
        .rank(&input)
        .into_iter()
        .filter_map(|placement| {
            let stats = standings.stats(placement.participant_id)?;
            Some(TournamentRanking::from_stats(
                snapshot.tournament.id,
                placement.rank,
                stats,
            ))
        })
        .collect();

    Ok(RecomputeOutcome {
        rankings,
        bindings: resolution.bindings,
        byes: resolution.byes,
    })
}

/// Recomputes and persists tournament standings
#[derive(Clone)]
pub struct RankingCalculator {
    repo: Arc<dyn TournamentRepository>,
    catalog: Arc<TournamentTypeCatalog>,
}

impl RankingCalculator {
    pub fn new(repo: Arc<dyn TournamentRepository>, catalog: Arc<TournamentTypeCatalog>) -> Self {
        Self { repo, catalog }
    }

    /// Full rebuild of a tournament's standings
    ///
    /// Runs under the tournament's lock: bindings, new Swiss byes and the
    /// replacement ranking rows are written atomically.
    ///
    /// # Errors
    ///
    /// * `TournamentError::NotFound` - Tournament does not exist
    /// * `TournamentError::UnknownFormat` - Format missing from the catalog
    /// * `TournamentError::IncompleteResults` - Results reference unresolved sessions
    pub async fn recompute(&self, tournament_id: TournamentId) -> TournamentResult<Vec<TournamentRanking>> {
        let catalog = Arc::clone(&self.catalog);
        let compute = move |snapshot: &TournamentSnapshot| -> TournamentResult<RecomputeOutcome> {
            let definition = catalog.get(snapshot.tournament.format)?;
            compute_outcome(definition, snapshot)
        };

        let outcome = self.repo.recompute_locked(tournament_id, &compute).await?;
        log::info!(
            "Recomputed tournament {}: {} ranking rows, {} new bindings, {} new byes",
            tournament_id,
            outcome.rankings.len(),
            outcome.bindings.len(),
            outcome.byes.len()
        );

        Ok(outcome.rankings)
    }
}
