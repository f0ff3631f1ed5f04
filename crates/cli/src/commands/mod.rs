use std::{path::Path, sync::Arc};

use auth::{Login, Logout, Register};
use competition::Competition;
use enum_dispatch::enum_dispatch;
use eyre::OptionExt;
use init_config::InitConfig;
use leaderboard::Leaderboard;
use participation::{Join, RequestAccount};
use tournament_client::{types::CompetitionId, ApiClient, HttpApiSender};
use tournament_sdk::Dashboard;
use trades::Trades;

use crate::config::Config;

mod auth;
mod competition;
mod init_config;
mod leaderboard;
mod participation;
mod trades;

/// Commands.
#[enum_dispatch(Command)]
#[derive(Debug, clap::Subcommand)]
pub(crate) enum Commands {
    /// Initialize config file.
    InitConfig(InitConfig),
    /// Sign in.
    Login(Login),
    /// Create an account.
    Register(Register),
    /// Sign out.
    Logout(Logout),
    /// Show a competition and the participation panel.
    Competition(Competition),
    /// Request a trading account for a competition.
    RequestAccount(RequestAccount),
    /// Join a competition with a trading account.
    Join(Join),
    /// Show the leaderboard of a competition.
    Leaderboard(Leaderboard),
    /// Show the trade history of a trading account.
    Trades(Trades),
}

#[enum_dispatch]
pub(crate) trait Command {
    fn is_client_required(&self) -> bool {
        false
    }

    async fn execute(&self, ctx: Context<'_>) -> eyre::Result<()>;
}

/// API client used by the commands.
pub(crate) type CommandClient = ApiClient<HttpApiSender>;

/// Selects the competition a command works on.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct CompetitionArgs {
    /// Competition id, defaults to the current competition.
    #[arg(long)]
    competition: Option<String>,
}

impl CompetitionArgs {
    fn id(&self) -> Option<CompetitionId> {
        self.competition.as_deref().map(CompetitionId::from)
    }
}

pub(crate) struct Context<'a> {
    config_path: &'a Path,
    config: &'a Config,
    client: Option<&'a Arc<CommandClient>>,
}

impl<'a> Context<'a> {
    pub(super) fn new(
        config_path: &'a Path,
        config: &'a Config,
        client: Option<&'a Arc<CommandClient>>,
    ) -> Self {
        Self {
            config_path,
            config,
            client,
        }
    }

    pub(crate) fn config(&self) -> &Config {
        self.config
    }

    pub(crate) fn config_path(&self) -> &Path {
        self.config_path
    }

    pub(crate) fn client(&self) -> eyre::Result<&Arc<CommandClient>> {
        self.client.ok_or_eyre("client is not provided")
    }

    pub(crate) fn require_authenticated(&self) -> eyre::Result<()> {
        if self.client()?.session().auth_state().is_authenticated {
            Ok(())
        } else {
            eyre::bail!("not signed in, run `tournament login` first")
        }
    }

    pub(crate) async fn dashboard(
        &self,
        args: &CompetitionArgs,
    ) -> eyre::Result<Dashboard<CommandClient>> {
        Dashboard::load(self.client()?.clone(), args.id())
            .await?
            .ok_or_eyre("there is no current competition")
    }
}
