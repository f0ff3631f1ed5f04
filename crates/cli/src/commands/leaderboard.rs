use tournament_client::{types::LeaderboardRow, CompetitionApi};
use tournament_sdk::{
    format::{format_money_f64, format_percent, MoneyFormat},
    leaderboard::{medal, LeaderboardSnapshot, LeaderboardStatus, UniformRowLayout},
    polling::PollOptions,
    utils::{Clock, SystemClock},
};

use crate::config::{DisplayOptions, OutputFormat};

use super::CompetitionArgs;

/// Show the leaderboard of a competition.
#[derive(Debug, clap::Args)]
pub struct Leaderboard {
    #[command(flatten)]
    competition: CompetitionArgs,
    /// Keep the leaderboard up to date until the competition ends.
    #[arg(long)]
    watch: bool,
}

fn rank_text(rank: u32) -> String {
    match medal(rank) {
        Some(medal) => format!("{medal} {rank}"),
        None => rank.to_string(),
    }
}

fn render_rows(output: OutputFormat, rows: &[LeaderboardRow]) -> eyre::Result<String> {
    if output.is_json() {
        return Ok(serde_json::to_string_pretty(rows)?);
    }
    let items = rows.iter().map(|row| {
        serde_json::json!({
            "rank": rank_text(row.rank),
            "username": row.username,
            "account": row.trading_account_login,
            "account_size": format_money_f64(row.account_size, MoneyFormat::default()),
            "equity": format_money_f64(row.equity, MoneyFormat::default()),
            "profit": format_money_f64(row.profit, MoneyFormat::signed()),
            "gain": format_percent(row.gain_percent, true),
        })
    });
    output.display_many(
        items,
        DisplayOptions::table_projection([
            ("rank", "Rank"),
            ("username", "Trader"),
            ("account", "Account"),
            ("account_size", "Account Size"),
            ("equity", "Equity"),
            ("profit", "Profit"),
            ("gain", "Gain"),
        ]),
    )
}

fn render_snapshot(output: OutputFormat, snapshot: &LeaderboardSnapshot) -> eyre::Result<String> {
    if let Some(placeholder) = snapshot.placeholder() {
        return Ok(placeholder.to_string());
    }
    let mut out = render_rows(output, &snapshot.rows)?;
    if !output.is_json() {
        for animation in &snapshot.animations {
            let arrow = if animation.moved_up() { "▲" } else { "▼" };
            out.push_str(&format!("{arrow} {}\n", animation.key));
        }
        out.push_str(snapshot.status.label());
    }
    Ok(out)
}

impl super::Command for Leaderboard {
    fn is_client_required(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let config = ctx.config();
        let output = config.output();
        let dashboard = ctx.dashboard(&self.competition).await?;
        let clock = SystemClock;

        if !self.watch {
            let rows = ctx
                .client()?
                .leaderboard(&dashboard.competition().id)
                .await?;
            println!("{}", render_rows(output, &rows)?);
            if !output.is_json() {
                let status = LeaderboardStatus::from(dashboard.phase_at(clock.now()));
                println!("{}", status.label());
            }
            return Ok(());
        }

        let options = PollOptions::builder()
            .interval(config.poll_interval())
            .build();
        let layout = UniformRowLayout {
            row_height: config.row_height(),
        };
        let mut sync = dashboard.sync_leaderboard(clock, layout, options);
        let mut phases = dashboard.watch_phase(clock);
        let mut watching_phase = !phases.phase().is_ended();

        println!("{}", render_snapshot(output, &sync.snapshot())?);
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                snapshot = sync.changed() => match snapshot {
                    Some(snapshot) => println!("{}", render_snapshot(output, &snapshot)?),
                    None => break,
                },
                phase = phases.changed(), if watching_phase => match phase {
                    Some(phase) => tracing::info!(phase = phase.label(), "competition phase changed"),
                    None => watching_phase = false,
                },
            }
        }
        phases.shutdown().await;
        sync.shutdown().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tournament_sdk::leaderboard::{LeaderboardState, LeaderboardStatus};

    use super::*;

    fn row(rank: u32, username: &str, profit: f64) -> LeaderboardRow {
        LeaderboardRow {
            trading_account_login: 7_000 + i64::from(rank),
            rank,
            username: username.to_string(),
            account_size: 10_000.0,
            profit,
            equity: 10_000.0 + profit,
            gain_percent: profit / 100.0,
        }
    }

    #[test]
    fn table_shows_medals_and_signed_amounts() -> eyre::Result<()> {
        let out = render_rows(
            OutputFormat::Table,
            &[row(1, "alice", 1250.0), row(4, "dave", -20.0)],
        )?;
        assert!(out.contains("🥇 1"));
        assert!(out.contains("+$1,250.00"));
        assert!(out.contains("-$20.00"));
        assert!(out.contains("+12.50%"));
        assert!(out.contains("-0.20%"));
        Ok(())
    }

    #[test]
    fn snapshot_lists_moved_rows() -> eyre::Result<()> {
        let mut state = LeaderboardState::new(UniformRowLayout::default(), LeaderboardStatus::Live);
        assert_eq!(render_snapshot(OutputFormat::Table, &state.snapshot())?, "Loading…");

        state.commit(vec![row(1, "alice", 10.0), row(2, "bob", 5.0)]);
        state.commit(vec![row(1, "bob", 20.0), row(2, "alice", 10.0)]);
        let out = render_snapshot(OutputFormat::Table, &state.snapshot())?;
        assert!(out.contains("▲ bob"));
        assert!(out.contains("▼ alice"));
        assert!(out.ends_with("Updates every minute"));
        Ok(())
    }
}
