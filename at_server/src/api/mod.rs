//! HTTP API for the tournament engine.
//!
//! # Modules
//!
//! - [`catalog`]: Format listing and reward policy maintenance
//! - [`tournaments`]: Creation, enrolment, lifecycle, generation, standings and payout
//! - [`sessions`]: Result reporting
//! - [`request_id`]: Request correlation middleware
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                                     - Storage health
//! GET  /api/v1/formats                             - Catalog listing
//! PUT  /api/v1/reward-policies                     - Create or replace a live policy
//! POST /api/v1/tournaments                         - Create a tournament
//! POST /api/v1/tournaments/{id}/participants       - Enrol a participant
//! POST /api/v1/tournaments/{id}/status             - Record a lifecycle transition
//! POST /api/v1/tournaments/{id}/generate           - Generate sessions
//! GET  /api/v1/tournaments/{id}/rankings           - Stored standings
//! POST /api/v1/tournaments/{id}/rankings/recompute - Rebuild standings
//! POST /api/v1/tournaments/{id}/rewards/distribute - Pay out rewards
//! POST /api/v1/sessions/{id}/result                - Record a session result
//! ```
//!
//! # Errors
//!
//! Every failure is returned as `{"error": "..."}`. Roster and result
//! problems map to `422`, state conflicts to `409`, missing rows to `404`
//! and storage or catalog faults to `500` with a sanitised message.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use academy_tournaments::TournamentTypeCatalog;
//! use academy_tournaments::db::InMemoryTournamentRepository;
//! use academy_tournaments::TournamentService;
//! use at_server::api::{create_router, AppState};
//! use std::sync::Arc;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let service = TournamentService::new(
//!     Arc::new(InMemoryTournamentRepository::new()),
//!     Arc::new(TournamentTypeCatalog::builtin()),
//! );
//! let app = create_router(AppState { service: Arc::new(service) });
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod request_id;
pub mod sessions;
pub mod tournaments;

use academy_tournaments::{TournamentError, TournamentService};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TournamentService>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler result carrying a status and JSON error body on failure
pub type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

/// HTTP status for an engine error
pub fn status_for(err: &TournamentError) -> StatusCode {
    match err {
        TournamentError::InvalidParticipantCount { .. }
        | TournamentError::NotPowerOfTwo { .. }
        | TournamentError::DuplicateParticipant(_)
        | TournamentError::InvalidResult(_)
        | TournamentError::UnknownRewardPolicy(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TournamentError::AlreadyGenerated(_)
        | TournamentError::IncompleteResults { .. }
        | TournamentError::AlreadyDistributed(_)
        | TournamentError::TournamentNotCompleted(_)
        | TournamentError::InvalidState { .. } => StatusCode::CONFLICT,
        TournamentError::NotFound(_) | TournamentError::SessionNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        TournamentError::UnknownFormat(_)
        | TournamentError::Database(_)
        | TournamentError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert an engine error into a client response, logging server faults
pub fn error_response(err: TournamentError) -> (StatusCode, Json<ErrorResponse>) {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "Tournament operation failed");
    } else {
        tracing::debug!(error = %err, status = %status, "Tournament request rejected");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router();

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/formats", get(catalog::list_formats))
        .route("/reward-policies", put(catalog::save_reward_policy))
        .route("/tournaments", post(tournaments::create_tournament))
        .route(
            "/tournaments/{tournament_id}/participants",
            post(tournaments::enroll_participant),
        )
        .route(
            "/tournaments/{tournament_id}/status",
            post(tournaments::change_status),
        )
        .route(
            "/tournaments/{tournament_id}/generate",
            post(tournaments::generate),
        )
        .route(
            "/tournaments/{tournament_id}/rankings",
            get(tournaments::rankings),
        )
        .route(
            "/tournaments/{tournament_id}/rankings/recompute",
            post(tournaments::recompute_rankings),
        )
        .route(
            "/tournaments/{tournament_id}/rewards/distribute",
            post(tournaments::distribute_rewards),
        )
        .route(
            "/sessions/{session_id}/result",
            post(sessions::record_result),
        )
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the storage backend answers, `503 Service
/// Unavailable` otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage_healthy = state.service.health_check().await.is_ok();

    let status_code = if storage_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if storage_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage_healthy,
        "formats": state.service.catalog().definitions().count(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = TournamentError::NotPowerOfTwo {
            format: academy_tournaments::FormatCode::Knockout,
            count: 6,
        };
        assert_eq!(status_for(&err), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status_for(&TournamentError::AlreadyGenerated(1)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&TournamentError::SessionNotFound(3)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&TournamentError::UnknownFormat("ladder".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&TournamentError::IncompleteResults {
                tournament_id: 1,
                pending: 2
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_error_response_hides_storage_details() {
        let parse_error = serde_json::from_str::<i64>("not json").unwrap_err();
        let (status, Json(body)) = error_response(TournamentError::Serialization(parse_error));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
    }
}
