use rust_decimal::Decimal;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tournament_sdk::{
    dashboard::fetch_trade_history,
    format::{format_money, format_percent, MoneyFormat},
    trade_history::TradeHistoryReport,
};

use crate::config::{DisplayOptions, OutputFormat};

/// Show the trade history of a trading account.
#[derive(Debug, clap::Args)]
pub struct Trades {
    /// Login of the trading account.
    account: i64,
    /// Also show the equity curve.
    #[arg(long)]
    curve: bool,
}

fn time_text(time: Option<OffsetDateTime>) -> eyre::Result<Option<String>> {
    Ok(time.map(|time| time.format(&Rfc3339)).transpose()?)
}

fn money(value: Decimal) -> String {
    format_money(value, MoneyFormat::default())
}

fn signed(value: Decimal) -> String {
    format_money(value, MoneyFormat::signed())
}

fn render(
    output: OutputFormat,
    username: &str,
    report: &TradeHistoryReport,
    curve: bool,
) -> eyre::Result<String> {
    if output.is_json() {
        return Ok(serde_json::to_string_pretty(&serde_json::json!({
            "username": username,
            "report": report,
        }))?);
    }

    let mut out = format!("Trade history of {username}\n");
    if report.rows.is_empty() {
        out.push_str("No trades yet.\n");
    } else {
        let items = report
            .rows
            .iter()
            .map(|row| {
                let trade = &row.trade;
                Ok(serde_json::json!({
                    "id": trade.id,
                    "symbol": trade.symbol,
                    "side": trade.side,
                    "volume": trade.volume.normalize().to_string(),
                    "open_time": time_text(trade.open_time)?,
                    "close_time": time_text(Some(trade.close_time))?,
                    "open_price": trade.open_price.normalize().to_string(),
                    "close_price": trade.close_price.normalize().to_string(),
                    "profit": signed(trade.profit),
                    "commission": signed(trade.commission),
                    "swap": signed(trade.swap),
                    "net": signed(row.net),
                }))
            })
            .collect::<eyre::Result<Vec<_>>>()?;
        out.push_str(&output.display_many(
            items,
            DisplayOptions::table_projection([
                ("id", "Position"),
                ("symbol", "Symbol"),
                ("side", "Side"),
                ("volume", "Volume"),
                ("open_time", "Opened"),
                ("close_time", "Closed"),
                ("open_price", "Open"),
                ("close_price", "Close"),
                ("profit", "Profit"),
                ("commission", "Commission"),
                ("swap", "Swap"),
                ("net", "Net"),
            ]),
        )?);
    }

    let stats = &report.stats;
    out.push_str(&output.display_one(
        serde_json::json!({
            "trades": stats.trade_count,
            "net_total": signed(stats.net_total),
            "win_rate": format_percent(stats.win_rate_percent(), false),
            "best": money(stats.best_trade),
            "worst": money(stats.worst_trade),
        }),
        DisplayOptions::table_projection([
            ("trades", "Trades"),
            ("net_total", "Net Total"),
            ("win_rate", "Win Rate"),
            ("best", "Best Trade"),
            ("worst", "Worst Trade"),
        ]),
    )?);

    if curve && !report.series.is_empty() {
        let points = report
            .series
            .points()
            .iter()
            .map(|point| {
                Ok(serde_json::json!({
                    "index": point.index,
                    "close_time": time_text(Some(point.close_time))?,
                    "cumulative_net": signed(point.cumulative_net),
                }))
            })
            .collect::<eyre::Result<Vec<_>>>()?;
        out.push_str(&output.display_many(
            points,
            DisplayOptions::table_projection([
                ("index", "#"),
                ("close_time", "Closed"),
                ("cumulative_net", "Cumulative Net"),
            ]),
        )?);
    }

    if report.skipped != 0 {
        out.push_str(&format!("{} malformed trade(s) skipped\n", report.skipped));
    }
    Ok(out)
}

impl super::Command for Trades {
    fn is_client_required(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let client = ctx.client()?;
        let (username, report) = fetch_trade_history(client.as_ref(), self.account).await?;
        print!(
            "{}",
            render(ctx.config().output(), &username, &report, self.curve)?
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tournament_sdk::trade_history::aggregate;

    use super::*;

    #[test]
    fn summary_and_curve_are_rendered() -> eyre::Result<()> {
        let report = aggregate(&[
            json!({"positionId": 11, "symbol": "EURUSD", "side": "buy", "closeTime": "2026-04-01T10:00:00Z", "profit": 50}),
            json!({"positionId": 12, "symbol": "GBPUSD", "side": "SELL", "closeTime": "2026-04-02T10:00:00Z", "profit": -30}),
            json!({"positionId": 13, "symbol": "XAUUSD", "side": "BUY", "closeTime": "2026-04-03T10:00:00Z", "profit": 40}),
        ]);
        let out = render(OutputFormat::Table, "alice", &report, true)?;
        assert!(out.starts_with("Trade history of alice"));
        assert!(out.contains("+$60.00"));
        assert!(out.contains("66.67%"));
        assert!(out.contains("Cumulative Net"));
        assert!(!out.contains("skipped"));
        Ok(())
    }

    #[test]
    fn empty_history() -> eyre::Result<()> {
        let out = render(OutputFormat::Table, "bob", &TradeHistoryReport::default(), false)?;
        assert!(out.contains("No trades yet."));
        assert!(out.contains("$0.00"));
        Ok(())
    }
}
