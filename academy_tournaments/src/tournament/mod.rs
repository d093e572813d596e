//! Tournament aggregate, errors and the service facade.
//!
//! ## Example
//!
//! ```no_run
//! use academy_tournaments::catalog::TournamentTypeCatalog;
//! use academy_tournaments::db::{Database, DatabaseConfig};
//! use academy_tournaments::tournament::{NewTournament, TournamentService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::from_env()).await?;
//!     let service = TournamentService::new(
//!         Arc::new(db.repository()),
//!         Arc::new(TournamentTypeCatalog::builtin()),
//!     );
//!
//!     let tournament = service
//!         .create_tournament(NewTournament {
//!             name: "Under-12 Cup".to_string(),
//!             format: "knockout".to_string(),
//!             start_date: chrono::Utc::now(),
//!             reward_policy: None,
//!         })
//!         .await?;
//!     for participant_id in 1..=8 {
//!         service.enroll(tournament.id, participant_id).await?;
//!     }
//!
//!     let summary = service.generate(tournament.id).await?;
//!     println!("Created {} matches", summary.matches_created);
//!
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{TournamentError, TournamentResult};
pub use manager::TournamentService;
pub use models::{
    GenerationSummary, NewTournament, ParticipantId, RecordedResult, SessionId, StatusChange,
    Tournament, TournamentDraft, TournamentId, TournamentSnapshot, TournamentStatus, completed_at,
};
