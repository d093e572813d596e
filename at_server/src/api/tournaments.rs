//! Tournament API handlers.
//!
//! Covers the tournament lifecycle from creation to reward payout:
//! - Creating a tournament from a catalog format and reward policy
//! - Enrolling participants in seed order
//! - Recording lifecycle transitions
//! - Generating sessions
//! - Reading and rebuilding standings
//! - Distributing rewards
//!
//! # Examples
//!
//! Generate sessions for a tournament:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/tournaments/1/generate
//! ```
//!
//! Pay out rewards once the tournament is completed:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/tournaments/1/rewards/distribute
//! ```

use academy_tournaments::rewards::LedgerEntry;
use academy_tournaments::tournament::{
    GenerationSummary, NewTournament, ParticipantId, StatusChange, Tournament, TournamentId,
    TournamentStatus,
};
use academy_tournaments::{TournamentError, TournamentRanking};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::time::Instant;

use super::{ApiResult, AppState, ErrorResponse, error_response};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub participant_id: ParticipantId,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: TournamentStatus,
}

/// Create a tournament.
///
/// # Request
///
/// ```json
/// {
///   "name": "Autumn Cup",
///   "format": "knockout",
///   "start_date": "2026-11-07T09:00:00Z",
///   "reward_policy": null
/// }
/// ```
///
/// # Response
///
/// Returns `201 Created` with the tournament and its frozen reward policy.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Unknown format code or reward policy
pub async fn create_tournament(
    State(state): State<AppState>,
    Json(request): Json<NewTournament>,
) -> ApiResult<(StatusCode, Json<Tournament>)> {
    match state.service.create_tournament(request).await {
        Ok(tournament) => Ok((StatusCode::CREATED, Json(tournament))),
        // The format came from the caller here, not from a stored tournament
        Err(TournamentError::UnknownFormat(code)) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: format!("Unknown tournament format: {code}"),
            }),
        )),
        Err(e) => Err(error_response(e)),
    }
}

/// Enrol a participant; enrolment order is the seed order.
///
/// # Errors
///
/// - `404 Not Found`: Tournament doesn't exist
/// - `409 Conflict`: Sessions were already generated
/// - `422 Unprocessable Entity`: Participant already enrolled
pub async fn enroll_participant(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    Json(request): Json<EnrollRequest>,
) -> ApiResult<StatusCode> {
    state
        .service
        .enroll(tournament_id, request.participant_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a lifecycle transition.
///
/// # Request
///
/// ```json
/// { "status": "COMPLETED" }
/// ```
pub async fn change_status(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    Json(request): Json<StatusChangeRequest>,
) -> ApiResult<Json<StatusChange>> {
    let change = state
        .service
        .record_status_change(tournament_id, request.status)
        .await
        .map_err(error_response)?;
    Ok(Json(change))
}

/// Generate and store every session of the tournament.
///
/// # Response
///
/// Returns `200 OK` with:
/// ```json
/// { "matches_created": 7, "rounds": 3 }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Tournament doesn't exist
/// - `409 Conflict`: Sessions were already generated
/// - `422 Unprocessable Entity`: Roster does not fit the format
pub async fn generate(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<GenerationSummary>> {
    let start = Instant::now();
    let summary = state
        .service
        .generate(tournament_id)
        .await
        .map_err(error_response)?;
    logging::log_operation("generate", tournament_id, start.elapsed().as_millis() as u64);

    let format = state
        .service
        .tournament(tournament_id)
        .await
        .map(|t| t.format.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    metrics::tournaments_generated_total(&format);
    metrics::sessions_materialized_total(summary.matches_created);

    tracing::info!(
        tournament_id = tournament_id,
        matches_created = summary.matches_created,
        rounds = summary.rounds,
        "Sessions generated"
    );
    Ok(Json(summary))
}

/// Standings as last stored.
pub async fn rankings(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Vec<TournamentRanking>>> {
    let rankings = state
        .service
        .rankings(tournament_id)
        .await
        .map_err(error_response)?;
    Ok(Json(rankings))
}

/// Rebuild the standings from every recorded result.
///
/// # Errors
///
/// - `404 Not Found`: Tournament doesn't exist
/// - `409 Conflict`: A later stage is still waiting on results
pub async fn recompute_rankings(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Vec<TournamentRanking>>> {
    let start = Instant::now();
    let rankings = state
        .service
        .recompute_rankings(tournament_id)
        .await
        .map_err(error_response)?;
    logging::log_operation("recompute", tournament_id, start.elapsed().as_millis() as u64);
    metrics::rankings_recomputed_total();
    Ok(Json(rankings))
}

/// Pay out rewards; repeated calls return the first payout.
///
/// # Errors
///
/// - `409 Conflict`: Tournament not completed, or results still missing
pub async fn distribute_rewards(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Vec<LedgerEntry>>> {
    let entries = state
        .service
        .distribute_rewards(tournament_id)
        .await
        .map_err(error_response)?;
    metrics::rewards_distributed_total(entries.len());

    tracing::info!(
        tournament_id = tournament_id,
        entries = entries.len(),
        "Rewards distributed"
    );
    Ok(Json(entries))
}
