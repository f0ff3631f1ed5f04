use std::{future::Future, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    sender::{ApiRequest, ApiResponse, ApiSender},
    session::{Credential, SessionContext},
    types::{
        Competition, CompetitionId, CurrentCompetition, ErrorBody, JoinRequest, LeaderboardRow,
        LoginRequest, ParticipationStatus, RegisterRequest, TradeHistory,
    },
};

#[cfg(http_sender)]
use crate::sender::HttpApiSender;

const MAX_MESSAGE_LEN: usize = 1024;

/// Operations of the tournament API used by the dashboard.
pub trait CompetitionApi {
    /// Get the currently relevant competition, `None` if there is none.
    fn current_competition(
        &self,
    ) -> impl Future<Output = crate::Result<Option<CompetitionId>>> + Send;

    /// Get a competition.
    fn competition(
        &self,
        id: &CompetitionId,
    ) -> impl Future<Output = crate::Result<Competition>> + Send;

    /// Get the participation status of the current user.
    fn participation(
        &self,
        id: &CompetitionId,
    ) -> impl Future<Output = crate::Result<ParticipationStatus>> + Send;

    /// Request a trading account for the competition.
    fn request_account(&self, id: &CompetitionId)
        -> impl Future<Output = crate::Result<()>> + Send;

    /// Join the competition with the given trading account.
    fn join(
        &self,
        id: &CompetitionId,
        request: &JoinRequest,
    ) -> impl Future<Output = crate::Result<()>> + Send;

    /// Get the ranked leaderboard, in source order.
    fn leaderboard(
        &self,
        id: &CompetitionId,
    ) -> impl Future<Output = crate::Result<Vec<LeaderboardRow>>> + Send;

    /// Get the trade history of a trading account.
    fn trade_history(
        &self,
        account_login: i64,
    ) -> impl Future<Output = crate::Result<TradeHistory>> + Send;
}

macro_rules! forward_competition_api {
    ($ty:ty) => {
        impl<T: CompetitionApi + Send + Sync + ?Sized> CompetitionApi for $ty {
            fn current_competition(
                &self,
            ) -> impl Future<Output = crate::Result<Option<CompetitionId>>> + Send {
                (**self).current_competition()
            }

            fn competition(
                &self,
                id: &CompetitionId,
            ) -> impl Future<Output = crate::Result<Competition>> + Send {
                (**self).competition(id)
            }

            fn participation(
                &self,
                id: &CompetitionId,
            ) -> impl Future<Output = crate::Result<ParticipationStatus>> + Send {
                (**self).participation(id)
            }

            fn request_account(
                &self,
                id: &CompetitionId,
            ) -> impl Future<Output = crate::Result<()>> + Send {
                (**self).request_account(id)
            }

            fn join(
                &self,
                id: &CompetitionId,
                request: &JoinRequest,
            ) -> impl Future<Output = crate::Result<()>> + Send {
                (**self).join(id, request)
            }

            fn leaderboard(
                &self,
                id: &CompetitionId,
            ) -> impl Future<Output = crate::Result<Vec<LeaderboardRow>>> + Send {
                (**self).leaderboard(id)
            }

            fn trade_history(
                &self,
                account_login: i64,
            ) -> impl Future<Output = crate::Result<TradeHistory>> + Send {
                (**self).trade_history(account_login)
            }
        }
    };
}

forward_competition_api!(&T);
forward_competition_api!(Arc<T>);

/// API client.
#[derive(Debug, Clone)]
pub struct ApiClient<S> {
    sender: S,
    session: SessionContext,
}

impl<S> ApiClient<S> {
    /// Create an API client with sender and session.
    pub fn new_with_sender(sender: S, session: SessionContext) -> Self {
        Self { sender, session }
    }

    /// Get the session.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Get the sender.
    pub fn sender(&self) -> &S {
        &self.sender
    }
}

#[cfg(http_sender)]
impl ApiClient<HttpApiSender> {
    /// Create an API client talking HTTP to `base_url`.
    pub fn new(base_url: &str, session: SessionContext) -> crate::Result<Self> {
        Ok(Self::new_with_sender(HttpApiSender::new(base_url)?, session))
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error }) => error,
        Err(_) => body.trim().chars().take(MAX_MESSAGE_LEN).collect(),
    }
}

impl<S: ApiSender + Sync> ApiClient<S> {
    /// Send a request and map non-2xx answers to errors.
    pub async fn execute(&self, request: ApiRequest) -> crate::Result<ApiResponse> {
        let path = request.path.clone();
        let method = request.method;
        let request = request.with_credential(
            self.session
                .credential()
                .map(|credential| credential.expose().to_string()),
        );
        let response = self.sender.send(request).await?;
        tracing::debug!(?method, %path, status = response.status, "received response");

        if response.is_success() {
            return Ok(response);
        }
        match response.status {
            401 => {
                self.session.invalidate();
                Err(crate::Error::Unauthorized)
            }
            404 => Err(crate::Error::NotFound(path)),
            status => Err(crate::Error::Status {
                status,
                message: error_message(&response.body),
            }),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: String) -> crate::Result<T> {
        let response = self.execute(ApiRequest::get(path)).await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    async fn post(
        &self,
        path: String,
        body: Option<&(impl Serialize + Sync)>,
    ) -> crate::Result<ApiResponse> {
        let body = body.map(|body| serde_json::to_value(body)).transpose()?;
        self.execute(ApiRequest::post(path, body)).await
    }

    /// Log in and store the issued credential in the session.
    pub async fn login(&self, request: &LoginRequest) -> crate::Result<()> {
        let response = self.post("auth/login".to_string(), Some(request)).await?;
        let credential = response
            .set_cookie
            .iter()
            .find_map(|header| Credential::from_set_cookie(header))
            .ok_or(crate::Error::MissingCredential)?;
        self.session.establish(credential);
        tracing::info!(email = %request.email, "logged in");
        Ok(())
    }

    /// Register a new user.
    pub async fn register(&self, request: &RegisterRequest) -> crate::Result<()> {
        self.post("auth/register".to_string(), Some(request))
            .await?;
        Ok(())
    }

    /// Log out.
    ///
    /// The local credential is dropped even if the server call fails.
    pub async fn logout(&self) -> crate::Result<()> {
        let res = self.post("auth/logout".to_string(), None::<&()>).await;
        self.session.invalidate();
        res.map(|_| ())
    }
}

impl<S: ApiSender + Sync> CompetitionApi for ApiClient<S> {
    async fn current_competition(&self) -> crate::Result<Option<CompetitionId>> {
        match self
            .get::<CurrentCompetition>("competitions/current".to_string())
            .await
        {
            Ok(current) => Ok(Some(current.id)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn competition(&self, id: &CompetitionId) -> crate::Result<Competition> {
        self.get(format!("competitions/{id}")).await
    }

    async fn participation(&self, id: &CompetitionId) -> crate::Result<ParticipationStatus> {
        self.get(format!("competitions/{id}/me")).await
    }

    async fn request_account(&self, id: &CompetitionId) -> crate::Result<()> {
        self.post(format!("competitions/{id}/account-requests"), None::<&()>)
            .await?;
        Ok(())
    }

    async fn join(&self, id: &CompetitionId, request: &JoinRequest) -> crate::Result<()> {
        self.post(format!("competitions/{id}/join"), Some(request))
            .await?;
        Ok(())
    }

    async fn leaderboard(&self, id: &CompetitionId) -> crate::Result<Vec<LeaderboardRow>> {
        self.get(format!("competitions/{id}/leaderboard")).await
    }

    async fn trade_history(&self, account_login: i64) -> crate::Result<TradeHistory> {
        self.get(format!("trading-accounts/{account_login}/trade-history"))
            .await
    }
}
