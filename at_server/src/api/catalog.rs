//! Format catalog and reward policy handlers.

use academy_tournaments::{RewardPolicy, TournamentTypeDefinition};
use axum::{Json, extract::State, http::StatusCode};

use super::{ApiResult, AppState, error_response};

/// List every format new tournaments may use.
///
/// # Response
///
/// Returns `200 OK` with the catalog definitions, including each format's
/// participant bounds, session timing and rules.
pub async fn list_formats(State(state): State<AppState>) -> Json<Vec<TournamentTypeDefinition>> {
    Json(state.service.catalog().definitions().cloned().collect())
}

/// Create or replace a named live reward policy.
///
/// Tournaments that already captured a snapshot of this policy keep paying
/// out from their snapshot.
///
/// # Response
///
/// Returns `204 No Content`.
pub async fn save_reward_policy(
    State(state): State<AppState>,
    Json(policy): Json<RewardPolicy>,
) -> ApiResult<StatusCode> {
    state
        .service
        .save_reward_policy(policy)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
