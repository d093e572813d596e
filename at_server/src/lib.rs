//! HTTP server for the academy tournament engine.
//!
//! Exposes schedule generation, result recording, standings and reward
//! payout over a versioned JSON API.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
