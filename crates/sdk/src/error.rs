use crate::participation::{JoinFormErrors, ParticipationEvent, ParticipationState};

/// SDK Error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// API client error.
    #[error("client: {0}")]
    Client(#[from] tournament_client::Error),
    /// The join form did not pass validation.
    #[error("invalid join form: {0}")]
    InvalidJoinForm(JoinFormErrors),
    /// The event is not allowed in the current participation state.
    #[error("`{event}` is not allowed in state `{state}`")]
    Transition {
        /// Current state.
        state: ParticipationState,
        /// Rejected event.
        event: ParticipationEvent,
    },
    /// JSON error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// Custom error.
    #[error("custom: {0}")]
    Custom(String),
}

impl Error {
    /// Create a custom error.
    pub fn custom(msg: impl ToString) -> Self {
        Self::Custom(msg.to_string())
    }

    /// Returns the underlying client error, if any.
    pub fn as_client_error(&self) -> Option<&tournament_client::Error> {
        match self {
            Self::Client(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(js)]
impl From<Error> for wasm_bindgen::JsValue {
    fn from(value: Error) -> Self {
        Self::from_str(&value.to_string())
    }
}

#[cfg(js)]
impl From<serde_wasm_bindgen::Error> for Error {
    fn from(value: serde_wasm_bindgen::Error) -> Self {
        Self::custom(value)
    }
}
