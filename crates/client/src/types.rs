use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Competition identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompetitionId(String);

impl CompetitionId {
    /// Create from string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompetitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CompetitionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Competition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competition {
    /// Id.
    pub id: CompetitionId,
    /// Name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Start of the competition.
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    /// End of the competition.
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
}

/// Reference to the currently relevant competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCompetition {
    /// Id.
    pub id: CompetitionId,
}

/// Participation status of the current user, as reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationStatus {
    /// Whether a trading account has been requested.
    #[serde(default)]
    pub has_requested_account: bool,
    /// Whether the user has joined.
    #[serde(default)]
    pub has_joined: bool,
}

/// A ranked leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    /// Login of the trading account.
    pub trading_account_login: i64,
    /// Rank, starting at 1.
    pub rank: u32,
    /// Username.
    pub username: String,
    /// Initial account size.
    #[serde(default)]
    pub account_size: f64,
    /// Profit.
    #[serde(default)]
    pub profit: f64,
    /// Equity.
    #[serde(default)]
    pub equity: f64,
    /// Gain in percent.
    #[serde(default)]
    pub gain_percent: f64,
}

/// Trade history of a trading account.
///
/// Trades are kept as raw JSON so that one malformed record does not
/// fail the whole response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeHistory {
    /// Owner of the trading account.
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    /// Raw trade records.
    #[serde(default, deserialize_with = "null_as_default")]
    pub trades: Vec<Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of the join request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Login of the trading account.
    pub login: i64,
    /// Investor (read-only) password.
    pub investor_password: String,
    /// Broker server.
    pub broker: String,
}

impl fmt::Debug for JoinRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinRequest")
            .field("login", &self.login)
            .field("investor_password", &"<redacted>")
            .field("broker", &self.broker)
            .finish()
    }
}

/// Body of the login request.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email.
    pub email: String,
    /// Password.
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of the register request.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Email.
    pub email: String,
    /// Username.
    pub username: String,
    /// Discord username.
    pub discord_username: String,
    /// Password.
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("discord_username", &self.discord_username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Error body returned by the server.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub(crate) error: String,
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn decode_competition() -> crate::Result<()> {
        let competition: Competition = serde_json::from_str(
            r#"{
                "id": "3f1c2b9e-8d2a-4c55-9a57-0c3b1e7f9a10",
                "name": "Winter Cup",
                "startsAt": "2026-01-10T12:00:00Z",
                "endsAt": "2026-01-24T12:00:00Z"
            }"#,
        )?;
        assert_eq!(competition.name, "Winter Cup");
        assert!(competition.description.is_empty());
        assert_eq!(competition.starts_at, datetime!(2026-01-10 12:00 UTC));
        assert_eq!(competition.ends_at, datetime!(2026-01-24 12:00 UTC));
        Ok(())
    }

    #[test]
    fn decode_leaderboard_row() -> crate::Result<()> {
        let row: LeaderboardRow = serde_json::from_str(
            r#"{
                "tradingAccountLogin": 12345678,
                "rank": 1,
                "username": "alice",
                "accountSize": 10000,
                "profit": 512.5,
                "equity": 10512.5,
                "gainPercent": 5.125
            }"#,
        )?;
        assert_eq!(row.trading_account_login, 12345678);
        assert_eq!(row.rank, 1);
        assert_eq!(row.gain_percent, 5.125);
        Ok(())
    }

    #[test]
    fn trade_history_tolerates_null_trades() -> crate::Result<()> {
        let history: TradeHistory = serde_json::from_str(r#"{"username":"bob","trades":null}"#)?;
        assert_eq!(history.username, "bob");
        assert!(history.trades.is_empty());

        let history: TradeHistory = serde_json::from_str("{}")?;
        assert!(history.trades.is_empty());
        Ok(())
    }

    #[test]
    fn join_request_is_camel_case_and_redacted() -> crate::Result<()> {
        let request = JoinRequest {
            login: 12345678,
            investor_password: "secret".to_string(),
            broker: "Demo-Server".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        assert_eq!(value["login"], 12345678);
        assert_eq!(value["investorPassword"], "secret");
        assert!(!format!("{request:?}").contains("secret"));
        Ok(())
    }
}
