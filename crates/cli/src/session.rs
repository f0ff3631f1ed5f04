use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tournament_client::{Credential, SessionContext};

#[derive(Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
}

/// File keeping the access credential between invocations.
#[derive(Debug, Clone)]
pub(crate) struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Restore the session, unauthenticated if there is no file.
    pub(crate) fn load(&self) -> eyre::Result<SessionContext> {
        if !self.path.exists() {
            return Ok(SessionContext::new());
        }
        let content = fs::read_to_string(&self.path)?;
        let stored: StoredSession = serde_json::from_str(&content)?;
        tracing::debug!(path = %self.path.display(), "restored session");
        Ok(SessionContext::with_credential(Credential::new(
            stored.access_token,
        )))
    }

    /// Write the credential of `session`, or remove the file if there is none.
    pub(crate) fn save(&self, session: &SessionContext) -> eyre::Result<()> {
        match session.credential() {
            Some(credential) => {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let stored = StoredSession {
                    access_token: credential.expose().to_string(),
                };
                fs::write(&self.path, serde_json::to_string(&stored)?)?;
                restrict_permissions(&self.path)?;
            }
            None => {
                if self.path.exists() {
                    fs::remove_file(&self.path)?;
                    tracing::debug!(path = %self.path.display(), "removed session");
                }
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn credential_survives_between_runs() {
        Jail::expect_with(|jail| {
            let file = SessionFile::new(jail.directory().join("state").join("session.json"));
            let session = file.load().map_err(|err| err.to_string())?;
            assert!(!session.auth_state().is_authenticated);

            session.establish(Credential::new("token-1"));
            file.save(&session).map_err(|err| err.to_string())?;

            let restored = file.load().map_err(|err| err.to_string())?;
            assert_eq!(restored.credential(), Some(Credential::new("token-1")));

            restored.invalidate();
            file.save(&restored).map_err(|err| err.to_string())?;
            assert!(!file.path().exists());
            Ok(())
        });
    }
}
