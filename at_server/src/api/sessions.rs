//! Session result handler.

use academy_tournaments::GameResult;
use academy_tournaments::tournament::{RecordedResult, SessionId};
use axum::{
    Json,
    extract::{Path, State},
};

use super::{ApiResult, AppState, error_response};
use crate::metrics;

/// Record the result of a session and return the refreshed standings.
///
/// Reporting again for the same session replaces the earlier result until a
/// later match that depends on it has been played.
///
/// # Request
///
/// ```json
/// { "home_score": 2, "away_score": 2, "decided_by": "away" }
/// ```
///
/// `decided_by` is required for a level knockout score and rejected
/// anywhere else.
///
/// # Errors
///
/// - `404 Not Found`: Session doesn't exist
/// - `409 Conflict`: Participants not decided yet, tournament cancelled, or a
///   completed later match was drawn from the result being replaced
/// - `422 Unprocessable Entity`: Result does not fit the phase
pub async fn record_result(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(result): Json<GameResult>,
) -> ApiResult<Json<RecordedResult>> {
    let recorded = state
        .service
        .record_result(session_id, result)
        .await
        .map_err(error_response)?;
    metrics::rankings_recomputed_total();

    tracing::info!(
        session_id = session_id,
        tournament_id = recorded.session.tournament_id,
        home_score = result.home_score,
        away_score = result.away_score,
        "Result recorded"
    );
    Ok(Json(recorded))
}
