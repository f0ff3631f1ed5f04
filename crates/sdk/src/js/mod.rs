/// Phase.
pub mod phase;

/// Participation.
pub mod participation;

/// Leaderboard.
pub mod leaderboard;

/// Trade history.
pub mod trade_history;

/// Formatting.
pub mod format;

use time::{format_description::well_known::Rfc3339, OffsetDateTime};

fn parse_time(field: &str, value: &str) -> crate::Result<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|err| crate::Error::custom(format!("invalid `{field}`: {err}")))
}
