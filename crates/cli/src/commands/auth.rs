use tournament_client::types::{LoginRequest, RegisterRequest};

/// Sign in.
#[derive(Debug, clap::Args)]
pub struct Login {
    /// Email.
    #[arg(long)]
    email: String,
    /// Password, prompted for if not given.
    #[arg(long, env = "TOURNAMENT_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

/// Create an account.
#[derive(Debug, clap::Args)]
pub struct Register {
    /// Email.
    #[arg(long)]
    email: String,
    /// Username shown on the leaderboard.
    #[arg(long)]
    username: String,
    /// Discord username.
    #[arg(long)]
    discord_username: String,
    /// Password, prompted for if not given.
    #[arg(long, env = "TOURNAMENT_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

/// Sign out.
#[derive(Debug, clap::Args)]
pub struct Logout {}

fn password(given: Option<&String>, confirm: bool) -> eyre::Result<String> {
    if let Some(password) = given {
        return Ok(password.clone());
    }
    let mut prompt = dialoguer::Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}

impl super::Command for Login {
    fn is_client_required(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let client = ctx.client()?;
        let request = LoginRequest {
            email: self.email.trim().to_string(),
            password: password(self.password.as_ref(), false)?,
        };
        client.login(&request).await?;
        tracing::info!(email = %request.email, "signed in");
        println!("Signed in as {}", request.email);
        Ok(())
    }
}

impl super::Command for Register {
    fn is_client_required(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let client = ctx.client()?;
        let request = RegisterRequest {
            email: self.email.trim().to_string(),
            username: self.username.trim().to_string(),
            discord_username: self.discord_username.trim().to_string(),
            password: password(self.password.as_ref(), true)?,
        };
        client.register(&request).await?;
        println!(
            "Registered {}, sign in with `tournament login --email {}`",
            request.username, request.email
        );
        Ok(())
    }
}

impl super::Command for Logout {
    fn is_client_required(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: super::Context<'_>) -> eyre::Result<()> {
        let client = ctx.client()?;
        if !client.session().auth_state().is_authenticated {
            println!("Not signed in");
            return Ok(());
        }
        // The local credential is dropped even if the server call fails.
        if let Err(err) = client.logout().await {
            tracing::warn!(%err, "logout request failed");
        }
        println!("Signed out");
        Ok(())
    }
}
