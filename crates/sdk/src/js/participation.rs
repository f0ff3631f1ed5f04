use serde::{Deserialize, Serialize};
use tournament_client::types::ParticipationStatus;
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

use crate::participation::{JoinForm, JoinFormErrors, JoinPanel};

/// Participation state with the actions it allows.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationView {
    /// `NOT_REQUESTED`, `REQUESTED` or `JOINED`.
    pub state: String,
    /// Whether a trading account can be requested.
    pub can_request_account: bool,
    /// Whether the join form can be submitted.
    pub can_join: bool,
    /// Notice to show, if any.
    pub notice: Option<String>,
}

/// Map a participation status reported by the server to the panel state.
#[wasm_bindgen(js_name = participationView)]
pub fn participation_view(has_requested_account: bool, has_joined: bool) -> ParticipationView {
    let panel = JoinPanel::new(ParticipationStatus {
        has_requested_account,
        has_joined,
    });
    let machine = panel.machine();
    ParticipationView {
        state: panel.state().to_string(),
        can_request_account: machine.can_request_account(),
        can_join: machine.can_join(),
        notice: panel.notice().map(|notice| notice.text().to_string()),
    }
}

/// Result of [`validate_join_form`].
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JoinFormValidation {
    /// Body to send when the form is valid.
    pub request: Option<JoinRequestBody>,
    /// One message per invalid field.
    pub errors: JoinFormErrors,
}

/// Body of the join request.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequestBody {
    /// Login of the trading account.
    pub login: i64,
    /// Investor password.
    pub investor_password: String,
    /// Broker server.
    pub broker: String,
}

/// Validate the join form.
#[wasm_bindgen(js_name = validateJoinForm)]
pub fn validate_join_form(form: JoinForm) -> JoinFormValidation {
    match form.validate() {
        Ok(request) => JoinFormValidation {
            request: Some(JoinRequestBody {
                login: request.login,
                investor_password: request.investor_password,
                broker: request.broker,
            }),
            errors: JoinFormErrors::default(),
        },
        Err(errors) => JoinFormValidation {
            request: None,
            errors,
        },
    }
}
