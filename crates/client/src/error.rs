/// Error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Parse url error.
    #[error("parse url: {0}")]
    ParseUrl(#[from] url::ParseError),
    /// Transport error, no response was received.
    #[cfg(http_sender)]
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    /// JSON error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The credential is missing or has been rejected.
    #[error("unauthorized")]
    Unauthorized,
    /// The server rejected the request.
    #[error("status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message reported by the server.
        message: String,
    },
    /// The login response did not carry a credential.
    #[error("missing credential in login response")]
    MissingCredential,
    /// Custom error.
    #[error("custom: {0}")]
    Custom(String),
}

impl Error {
    /// Create a custom error.
    pub fn custom(msg: impl ToString) -> Self {
        Self::Custom(msg.to_string())
    }

    /// Returns the HTTP status code if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            Self::Unauthorized => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns whether the error is a not-found answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns whether the error is a conflict answer.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// Returns whether no response reached the client.
    pub fn is_transport(&self) -> bool {
        #[cfg(http_sender)]
        if matches!(self, Self::Transport(_)) {
            return true;
        }
        false
    }
}
