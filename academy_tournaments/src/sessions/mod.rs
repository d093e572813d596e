//! Tournament sessions: one bookable session per scheduled match.

pub mod materializer;
pub mod models;

pub use materializer::SessionMaterializer;
pub use models::{ByeRecord, GameResult, NewSession, Session, Side, SlotBinding};
