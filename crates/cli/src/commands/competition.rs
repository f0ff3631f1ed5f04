use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tournament_sdk::{
    participation::JoinPanel,
    phase::{CompetitionPhase, DashboardView},
    utils::{Clock, SystemClock},
    Dashboard,
};

use crate::config::DisplayOptions;

use super::{CommandClient, CompetitionArgs};

/// Show a competition and the participation panel.
#[derive(Debug, clap::Args)]
pub struct Competition {
    #[command(flatten)]
    competition: CompetitionArgs,
    /// Keep running and report phase changes until the competition ends.
    #[arg(long)]
    watch: bool,
}

fn actions(panel: &JoinPanel) -> &'static str {
    let machine = panel.machine();
    if machine.can_request_account() {
        "request-account"
    } else if machine.can_join() {
        "join"
    } else {
        "-"
    }
}

fn overview(
    dashboard: &Dashboard<CommandClient>,
    now: OffsetDateTime,
) -> eyre::Result<serde_json::Value> {
    let competition = dashboard.competition();
    let phase = dashboard.phase_at(now);
    let panel = dashboard.participation().map(JoinPanel::new);
    let participation = match (&panel, phase.view()) {
        (Some(panel), _) => Some(panel.state().to_string()),
        (None, DashboardView::JoinPanel) => Some("sign in to participate".to_string()),
        (None, DashboardView::Leaderboard) => None,
    };
    Ok(serde_json::json!({
        "id": competition.id,
        "name": competition.name,
        "description": competition.description,
        "starts_at": competition.starts_at.format(&Rfc3339)?,
        "ends_at": competition.ends_at.format(&Rfc3339)?,
        "phase": phase.label(),
        "participation": participation,
        "notice": panel.as_ref().and_then(|panel| panel.notice()).map(|notice| notice.text()),
        "actions": panel.as_ref().map(actions),
    }))
}

impl super::Command for Competition {
    fn is_client_required(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let output = ctx.config().output();
        let dashboard = ctx.dashboard(&self.competition).await?;
        let clock = SystemClock;

        let out = output.display_one(
            overview(&dashboard, clock.now())?,
            DisplayOptions::table_projection([
                ("id", "Id"),
                ("name", "Name"),
                ("description", "Description"),
                ("starts_at", "Starts"),
                ("ends_at", "Ends"),
                ("phase", "Phase"),
                ("participation", "Participation"),
                ("notice", "Notice"),
                ("actions", "Actions"),
            ]),
        )?;
        println!("{out}");

        if !self.watch {
            return Ok(());
        }

        let mut watcher = dashboard.watch_phase(clock);
        if watcher.phase().is_ended() {
            return Ok(());
        }
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                phase = watcher.changed() => match phase {
                    Some(phase) => {
                        println!("Phase changed: {}", phase.label());
                        if phase == CompetitionPhase::Live {
                            println!("The competition has started, run `tournament leaderboard --watch`");
                        }
                    }
                    None => break,
                },
            }
        }
        watcher.shutdown().await;
        Ok(())
    }
}
