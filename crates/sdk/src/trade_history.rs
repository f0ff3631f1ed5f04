use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Trade direction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Side {
    /// Buy.
    Buy,
    /// Sell.
    Sell,
}

/// A normalized closed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    /// Position id, or the record id when there is none.
    pub id: Option<String>,
    /// Symbol.
    pub symbol: String,
    /// Side.
    pub side: Side,
    /// Volume in lots.
    pub volume: Decimal,
    /// Open time.
    #[serde(with = "time::serde::rfc3339::option")]
    pub open_time: Option<OffsetDateTime>,
    /// Close time.
    #[serde(with = "time::serde::rfc3339")]
    pub close_time: OffsetDateTime,
    /// Open price.
    pub open_price: Decimal,
    /// Close price.
    pub close_price: Decimal,
    /// Realized profit.
    pub profit: Decimal,
    /// Commission, signed.
    pub commission: Decimal,
    /// Swap, signed.
    pub swap: Decimal,
}

impl Trade {
    /// Net result: `profit + commission + swap`, or `None` if it does not fit
    /// in a [`Decimal`].
    pub fn checked_net(&self) -> Option<Decimal> {
        self.profit
            .checked_add(self.commission)?
            .checked_add(self.swap)
    }

    /// Net result: `profit + commission + swap`, saturated at the bounds of
    /// [`Decimal`].
    ///
    /// Trades returned by [`normalize_trade`] always have an exact net.
    pub fn net(&self) -> Decimal {
        self.checked_net().unwrap_or_else(|| {
            self.profit
                .saturating_add(self.commission)
                .saturating_add(self.swap)
        })
    }
}

/// Reason a raw record could not be turned into a [`Trade`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedTrade {
    /// The record is not a JSON object.
    #[error("not an object")]
    NotAnObject,
    /// The side is missing or not `BUY`/`SELL`.
    #[error("missing or unknown side")]
    Side,
    /// The close time is missing or unparsable.
    #[error("missing or invalid close time")]
    CloseTime,
    /// The net result is out of range.
    #[error("net result out of range")]
    NetOutOfRange,
}

fn field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Numbers and numeric strings are accepted, anything else is zero.
fn decimal(value: Option<&Value>) -> Decimal {
    match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .map(Decimal::from)
            .or_else(|| parse_decimal(&number.to_string()))
            .or_else(|| number.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        Some(Value::String(s)) => parse_decimal(s),
        _ => None,
    }
    .unwrap_or_default()
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn timestamp(value: Option<&Value>) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value?.as_str()?.trim(), &Rfc3339).ok()
}

/// Normalize one raw trade record.
///
/// Field names are accepted in camelCase and snake_case. Missing or
/// unparsable numeric fields count as zero.
pub fn normalize_trade(raw: &Value) -> Result<Trade, MalformedTrade> {
    let object = raw.as_object().ok_or(MalformedTrade::NotAnObject)?;

    let side = field(object, &["side"])
        .and_then(Value::as_str)
        .and_then(|side| Side::from_str(side.trim()).ok())
        .ok_or(MalformedTrade::Side)?;
    let close_time =
        timestamp(field(object, &["closeTime", "close_time"])).ok_or(MalformedTrade::CloseTime)?;

    let trade = Trade {
        id: text(field(object, &["positionId", "position_id"]))
            .or_else(|| text(field(object, &["id"]))),
        symbol: text(field(object, &["symbol"])).unwrap_or_default(),
        side,
        volume: decimal(field(object, &["volume"])),
        open_time: timestamp(field(object, &["openTime", "open_time"])),
        close_time,
        open_price: decimal(field(object, &["openPrice", "open_price"])),
        close_price: decimal(field(object, &["closePrice", "close_price"])),
        profit: decimal(field(object, &["profit"])),
        commission: decimal(field(object, &["commission"])),
        swap: decimal(field(object, &["swap"])),
    };
    trade.checked_net().ok_or(MalformedTrade::NetOutOfRange)?;
    Ok(trade)
}

/// Normalize raw records, skipping the ones that cannot be placed.
///
/// Returns the trades in source order and the number of skipped records.
pub fn normalize(raw: &[Value]) -> (Vec<Trade>, usize) {
    let mut skipped = 0;
    let trades = raw
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match normalize_trade(record) {
            Ok(trade) => Some(trade),
            Err(err) => {
                tracing::debug!(index, %err, "skipping malformed trade record");
                skipped += 1;
                None
            }
        })
        .collect();
    (trades, skipped)
}

/// A trade as shown in the history table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRow {
    /// Trade.
    #[serde(flatten)]
    pub trade: Trade,
    /// Net result.
    pub net: Decimal,
}

/// A point of the equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    /// Position in the curve.
    pub index: usize,
    /// Close time of the trade.
    #[serde(with = "time::serde::rfc3339")]
    pub close_time: OffsetDateTime,
    /// Sum of the net results up to and including this trade.
    pub cumulative_net: Decimal,
}

/// Cumulative net result over trades ordered by close time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquitySeries(Vec<EquityPoint>);

impl EquitySeries {
    /// Points, ascending by close time.
    pub fn points(&self) -> &[EquityPoint] {
        &self.0
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last point.
    pub fn last(&self) -> Option<&EquityPoint> {
        self.0.last()
    }
}

/// Summary statistics of a trade history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    /// Number of trades.
    pub trade_count: usize,
    /// Sum of the net results.
    pub net_total: Decimal,
    /// Fraction of trades with a positive net result, in `[0, 1]`.
    pub win_rate: f64,
    /// Best net result, zero when there is no trade.
    pub best_trade: Decimal,
    /// Worst net result, zero when there is no trade.
    pub worst_trade: Decimal,
}

impl SummaryStats {
    /// Win rate in percent.
    pub fn win_rate_percent(&self) -> f64 {
        self.win_rate * 100.0
    }
}

/// Everything the trade history view shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeHistoryReport {
    /// Table rows in source order.
    pub rows: Vec<TradeRow>,
    /// Equity curve.
    pub series: EquitySeries,
    /// Summary statistics.
    pub stats: SummaryStats,
    /// Number of skipped malformed records.
    pub skipped: usize,
}

/// Build the equity curve.
///
/// The input order is left untouched; the curve is computed over a stable
/// ascending sort by close time. The running sum saturates at the bounds of
/// [`Decimal`].
pub fn equity_series(trades: &[Trade]) -> EquitySeries {
    let mut ordered = trades.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|trade| trade.close_time);

    let mut cumulative_net = Decimal::ZERO;
    EquitySeries(
        ordered
            .into_iter()
            .enumerate()
            .map(|(index, trade)| {
                cumulative_net = cumulative_net.saturating_add(trade.net());
                EquityPoint {
                    index,
                    close_time: trade.close_time,
                    cumulative_net,
                }
            })
            .collect(),
    )
}

/// Compute the summary statistics.
///
/// The net total saturates at the bounds of [`Decimal`].
pub fn summary_stats(trades: &[Trade]) -> SummaryStats {
    let nets = trades.iter().map(Trade::net).collect::<Vec<_>>();
    let trade_count = nets.len();
    if trade_count == 0 {
        return SummaryStats::default();
    }
    let wins = nets.iter().filter(|net| **net > Decimal::ZERO).count();
    SummaryStats {
        trade_count,
        net_total: nets
            .iter()
            .fold(Decimal::ZERO, |total, net| total.saturating_add(*net)),
        win_rate: wins as f64 / trade_count as f64,
        best_trade: nets.iter().copied().max().unwrap_or_default(),
        worst_trade: nets.iter().copied().min().unwrap_or_default(),
    }
}

/// Turn raw trade records into the trade history view.
///
/// Pure: the same input always yields the same report.
pub fn aggregate(raw: &[Value]) -> TradeHistoryReport {
    let (trades, skipped) = normalize(raw);
    let series = equity_series(&trades);
    let stats = summary_stats(&trades);
    let rows = trades
        .into_iter()
        .map(|trade| TradeRow {
            net: trade.net(),
            trade,
        })
        .collect();
    TradeHistoryReport {
        rows,
        series,
        stats,
        skipped,
    }
}
