use std::fmt;

use serde::{Deserialize, Serialize};
use tournament_client::types::JoinRequest;

/// Raw input of the join form.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(js, derive(tsify_next::Tsify))]
#[cfg_attr(js, tsify(from_wasm_abi))]
#[serde(rename_all = "camelCase", default)]
pub struct JoinForm {
    /// Login of the trading account, digits only.
    pub login: String,
    /// Investor password.
    pub investor_password: String,
    /// Broker server.
    pub broker: String,
}

impl fmt::Debug for JoinForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinForm")
            .field("login", &self.login)
            .field("investor_password", &"<redacted>")
            .field("broker", &self.broker)
            .finish()
    }
}

impl JoinForm {
    /// Create a form.
    pub fn new(
        login: impl Into<String>,
        investor_password: impl Into<String>,
        broker: impl Into<String>,
    ) -> Self {
        Self {
            login: login.into(),
            investor_password: investor_password.into(),
            broker: broker.into(),
        }
    }

    /// Validate the form and build the request body.
    ///
    /// All fields are checked so that every invalid field gets its message.
    pub fn validate(&self) -> Result<JoinRequest, JoinFormErrors> {
        let mut errors = JoinFormErrors::default();

        let login = self.login.trim();
        let parsed_login = if login.is_empty() {
            errors.login = Some(LOGIN_REQUIRED.to_string());
            None
        } else if !login.bytes().all(|b| b.is_ascii_digit()) {
            errors.login = Some(LOGIN_DIGITS_ONLY.to_string());
            None
        } else {
            match login.parse::<i64>() {
                Ok(login) => Some(login),
                Err(_) => {
                    errors.login = Some(LOGIN_TOO_LARGE.to_string());
                    None
                }
            }
        };

        let investor_password = self.investor_password.trim();
        if investor_password.is_empty() {
            errors.investor_password = Some(INVESTOR_PASSWORD_REQUIRED.to_string());
        }

        let broker = self.broker.trim();
        if broker.is_empty() {
            errors.broker = Some(SERVER_REQUIRED.to_string());
        }

        match parsed_login {
            Some(login) if errors.is_empty() => Ok(JoinRequest {
                login,
                investor_password: investor_password.to_string(),
                broker: broker.to_string(),
            }),
            _ => Err(errors),
        }
    }

    /// Reset all fields.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns whether all fields are empty.
    pub fn is_empty(&self) -> bool {
        self.login.is_empty() && self.investor_password.is_empty() && self.broker.is_empty()
    }
}

const LOGIN_REQUIRED: &str = "Login is required.";
const LOGIN_DIGITS_ONLY: &str = "Login must contain digits only.";
const LOGIN_TOO_LARGE: &str = "Login is too large.";
const INVESTOR_PASSWORD_REQUIRED: &str = "Investor password is required.";
const SERVER_REQUIRED: &str = "Server is required.";

/// Per-field validation messages of the join form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(js, derive(tsify_next::Tsify))]
#[serde(rename_all = "camelCase")]
pub struct JoinFormErrors {
    /// Message for the login field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    /// Message for the investor password field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investor_password: Option<String>,
    /// Message for the broker server field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broker: Option<String>,
}

impl JoinFormErrors {
    /// Returns whether there is no error.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of invalid fields.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Iterate over `(field, message)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("login", &self.login),
            ("investorPassword", &self.investor_password),
            ("broker", &self.broker),
        ]
        .into_iter()
        .filter_map(|(field, message)| Some((field, message.as_deref()?)))
    }
}

impl fmt::Display for JoinFormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (_, message)) in self.iter().enumerate() {
            if idx != 0 {
                f.write_str(" ")?;
            }
            f.write_str(message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_form_is_trimmed_and_coerced() {
        let request = JoinForm::new(" 00012345 ", "  secret ", " Demo-Server\t")
            .validate()
            .expect("valid form");
        assert_eq!(request.login, 12345);
        assert_eq!(request.investor_password, "secret");
        assert_eq!(request.broker, "Demo-Server");
    }

    #[test]
    fn every_invalid_field_has_one_message() {
        let errors = JoinForm::new("   ", " ", "").validate().unwrap_err();
        assert_eq!(errors.login.as_deref(), Some("Login is required."));
        assert_eq!(
            errors.investor_password.as_deref(),
            Some("Investor password is required.")
        );
        assert_eq!(errors.broker.as_deref(), Some("Server is required."));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn login_rules() {
        let check = |login: &str| {
            JoinForm::new(login, "pw", "srv")
                .validate()
                .map(|request| request.login)
                .map_err(|errors| errors.login)
        };
        assert_eq!(check("12a4"), Err(Some("Login must contain digits only.".to_string())));
        assert_eq!(check("-12"), Err(Some("Login must contain digits only.".to_string())));
        assert_eq!(check("1 2"), Err(Some("Login must contain digits only.".to_string())));
        assert_eq!(check("١٢٣"), Err(Some("Login must contain digits only.".to_string())));
        assert_eq!(check("99999999999999999999"), Err(Some("Login is too large.".to_string())));
        assert_eq!(check("9223372036854775807"), Ok(i64::MAX));
    }

    #[test]
    fn clear_and_display() {
        let mut form = JoinForm::new("1", "2", "3");
        assert!(!format!("{form:?}").contains("\"2\""));
        form.clear();
        assert!(form.is_empty());

        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.to_string(),
            "Login is required. Investor password is required. Server is required."
        );
        let fields = errors.iter().map(|(field, _)| field).collect::<Vec<_>>();
        assert_eq!(fields, ["login", "investorPassword", "broker"]);
    }
}
