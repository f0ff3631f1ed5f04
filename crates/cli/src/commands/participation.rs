use eyre::OptionExt;
use tournament_sdk::{
    participation::{JoinFlow, JoinForm},
    utils::{Clock, SystemClock},
    Dashboard, Error,
};

use super::{CommandClient, CompetitionArgs};

/// Request a trading account for a competition.
#[derive(Debug, clap::Args)]
pub struct RequestAccount {
    #[command(flatten)]
    competition: CompetitionArgs,
}

/// Join a competition with a trading account.
#[derive(Debug, clap::Args)]
pub struct Join {
    #[command(flatten)]
    competition: CompetitionArgs,
    /// Login of the trading account.
    #[arg(long)]
    login: String,
    /// Investor password, prompted for if not given.
    #[arg(long, env = "TOURNAMENT_INVESTOR_PASSWORD", hide_env_values = true)]
    investor_password: Option<String>,
    /// Broker server.
    #[arg(long)]
    broker: String,
}

async fn join_flow(
    ctx: &super::Context<'_>,
    args: &CompetitionArgs,
) -> eyre::Result<JoinFlow<std::sync::Arc<CommandClient>>> {
    ctx.require_authenticated()?;
    let dashboard: Dashboard<CommandClient> = ctx.dashboard(args).await?;
    let phase = dashboard.phase_at(SystemClock.now());
    if phase.is_ended() {
        eyre::bail!("`{}` is over", dashboard.competition().name);
    }
    dashboard.join_flow().ok_or_eyre("not signed in")
}

fn print_notice(flow: &JoinFlow<std::sync::Arc<CommandClient>>) {
    if let Some(notice) = flow.panel().notice() {
        println!("{}", notice.text());
    }
}

impl super::Command for RequestAccount {
    fn is_client_required(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let mut flow = join_flow(&ctx, &self.competition).await?;
        let state = flow.request_account().await?;
        tracing::info!(%state, "account requested");
        print_notice(&flow);
        if flow.needs_reconciliation() {
            println!("Could not confirm the request yet, check again with `tournament competition`");
        }
        Ok(())
    }
}

impl super::Command for Join {
    fn is_client_required(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let mut flow = join_flow(&ctx, &self.competition).await?;
        flow.panel_mut().open_form()?;

        let investor_password = match &self.investor_password {
            Some(password) => password.clone(),
            None => dialoguer::Password::new()
                .with_prompt("Investor password")
                .allow_empty_password(true)
                .interact()?,
        };
        *flow.panel_mut().form_mut() = JoinForm::new(&self.login, investor_password, &self.broker);

        match flow.submit_join().await {
            Ok(()) => {
                print_notice(&flow);
                Ok(())
            }
            Err(Error::InvalidJoinForm(errors)) => {
                for (field, message) in errors.iter() {
                    eprintln!("{field}: {message}");
                }
                eyre::bail!("invalid join form")
            }
            Err(err) => Err(err.into()),
        }
    }
}
