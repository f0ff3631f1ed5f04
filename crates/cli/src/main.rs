use std::sync::Arc;

use clap::Parser;
use commands::{Command, CommandClient, Commands, Context};
use config::{Config, Overrides};
use session::SessionFile;
use tournament_client::HttpApiSender;
use tracing::Instrument;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod session;

/// Command-line interface for the trading tournament platform.
#[derive(Debug, clap::Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the config file.
    #[arg(long, short, env = "TOURNAMENT_CONFIG", global = true)]
    config: Option<String>,
    /// Print debug logs.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(flatten)]
    overrides: Overrides,
    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(verbose: bool) -> eyre::Result<()> {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .try_init()?;
    Ok(())
}

impl Cli {
    async fn run(self) -> eyre::Result<()> {
        let config_path = config::resolve_config_path(self.config.as_deref())?;
        let config = Config::load(&config_path, &self.overrides)?;

        let mut session_file = None;
        let client = if self.command.is_client_required() {
            let file = SessionFile::new(config.session_file()?);
            let session = file.load()?;
            let sender = HttpApiSender::new_with_timeout(config.base_url(), config.timeout())?;
            session_file = Some(file);
            Some(Arc::new(CommandClient::new_with_sender(sender, session)))
        } else {
            None
        };

        let span = tracing::info_span!("command", base_url = config.base_url());
        let result = self
            .command
            .execute(Context::new(&config_path, &config, client.as_ref()))
            .instrument(span)
            .await;

        if let (Some(client), Some(file)) = (&client, &session_file) {
            file.save(client.session())?;
        }
        result
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    cli.run().await
}
