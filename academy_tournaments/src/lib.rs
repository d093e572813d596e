//! # Academy Tournaments
//!
//! Tournament structure generation, standings and reward payout for a
//! sports academy.
//!
//! Given a declarative format from the catalog and an ordered roster, the
//! engine builds a full schedule, turns it into timed sessions, keeps the
//! standings up to date as results arrive and pays out rewards once from
//! the policy frozen onto the tournament at creation.
//!
//! ## Architecture
//!
//! Four formats are supported, each dispatched through `enum_dispatch`:
//!
//! - **League**: single round robin using the circle method
//! - **Knockout**: seeded single elimination with an optional third-place playoff
//! - **Group + knockout**: serpentine groups of four, top two into a bracket
//! - **Swiss**: fixed number of rounds paired by score without rematches
//!
//! ## Core Modules
//!
//! - [`catalog`]: Format definitions and their rules
//! - [`schedule`]: Pure schedule generation
//! - [`sessions`]: Session rows and the materializer
//! - [`ranking`]: Slot resolution and standings
//! - [`rewards`]: Reward policies and payout
//! - [`tournament`]: Aggregate, errors and the service facade
//! - [`db`]: Repository trait with PostgreSQL and in-memory backends
//!
//! ## Example
//!
//! ```
//! use academy_tournaments::catalog::{FormatCode, TournamentTypeCatalog};
//! use academy_tournaments::schedule;
//!
//! let catalog = TournamentTypeCatalog::builtin();
//! let league = catalog.get(FormatCode::League).unwrap();
//!
//! let schedule = schedule::generate(league, &[1, 2, 3, 4, 5]).unwrap();
//! assert_eq!(schedule.matches.len(), 10);
//! assert_eq!(schedule.rounds, 5);
//! ```

/// Tournament formats and the catalog.
pub mod catalog;
pub use catalog::{FormatCode, TournamentTypeCatalog, TournamentTypeDefinition};

/// Abstract schedules and the four schedulers.
pub mod schedule;
pub use schedule::{Schedule, Slot, TournamentPhase};

/// Tournament sessions and their materialization.
pub mod sessions;
pub use sessions::{GameResult, Session, SessionMaterializer};

/// Standings and rankings.
pub mod ranking;
pub use ranking::{RankingCalculator, TournamentRanking};

/// Reward policies and payout.
pub mod rewards;
pub use rewards::{LedgerEntry, RewardDistributor, RewardPolicy};

/// Tournament aggregate and service.
pub mod tournament;
pub use tournament::{TournamentError, TournamentResult, TournamentService};

/// Persistence.
pub mod db;
