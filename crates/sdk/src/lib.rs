#![deny(missing_docs)]
#![deny(unreachable_pub)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Core of the live competition dashboard.
//!
//! - [`phase`]: competition phase evaluation.
//! - [`participation`]: the request-account / join state machine and its flow.
//! - [`leaderboard`]: row reordering animations and live synchronization.
//! - [`trade_history`]: trade ledger aggregation.
//! - [`format`]: money and percentage formatting.

/// Error type.
pub mod error;

/// Competition phase.
pub mod phase;

/// Participation.
pub mod participation;

/// Leaderboard.
pub mod leaderboard;

/// Trade history analytics.
pub mod trade_history;

/// Money formatting.
pub mod format;

/// Utils.
pub mod utils;

/// Polling scheduler.
#[cfg(client)]
pub mod polling;

/// Dashboard context.
#[cfg(client)]
pub mod dashboard;

/// JS bindings.
#[cfg(js)]
pub mod js;

pub use error::Error;

#[cfg(client)]
pub use dashboard::Dashboard;

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;

pub use rust_decimal;
pub use tournament_client as client;
