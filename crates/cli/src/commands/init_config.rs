use std::fs;

use crate::config::Config;

/// Initialize config file.
#[derive(Debug, clap::Args)]
pub struct InitConfig {
    /// Overwrite an existing config file.
    #[arg(long, short)]
    force: bool,
}

impl super::Command for InitConfig {
    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let path = ctx.config_path();
        if path.exists() && !self.force {
            eyre::bail!(
                "config file already exists at {}, use `--force` to overwrite",
                path.display()
            );
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, Config::default().to_toml()?)?;
        println!("Initialized config file at {}", path.display());
        Ok(())
    }
}
