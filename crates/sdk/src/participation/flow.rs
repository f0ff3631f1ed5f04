use tournament_client::{types::CompetitionId, CompetitionApi};

use super::{JoinPanel, ParticipationEvent, ParticipationState, Reconciliation};

/// Drives the join panel against the API.
#[derive(Debug)]
pub struct JoinFlow<C> {
    api: C,
    competition: CompetitionId,
    panel: JoinPanel,
}

impl<C: CompetitionApi> JoinFlow<C> {
    /// Fetch the participation status and build the flow.
    pub async fn load(api: C, competition: CompetitionId) -> crate::Result<Self> {
        let status = api.participation(&competition).await?;
        Ok(Self::new(api, competition, JoinPanel::new(status)))
    }

    /// Create from an existing panel.
    pub fn new(api: C, competition: CompetitionId, panel: JoinPanel) -> Self {
        Self {
            api,
            competition,
            panel,
        }
    }

    /// The panel.
    pub fn panel(&self) -> &JoinPanel {
        &self.panel
    }

    /// The panel, mutably.
    pub fn panel_mut(&mut self) -> &mut JoinPanel {
        &mut self.panel
    }

    /// Current participation state.
    pub fn state(&self) -> ParticipationState {
        self.panel.state()
    }

    /// Returns whether the local state still waits for the server status.
    pub fn needs_reconciliation(&self) -> bool {
        self.panel.machine().needs_reconciliation()
    }

    /// Request a trading account.
    ///
    /// The request is sent first; on success the state becomes a tentative
    /// [`ParticipationState::Requested`] and the status is fetched again to
    /// reconcile. If that fetch fails the tentative state is kept and
    /// [`needs_reconciliation`](Self::needs_reconciliation) stays `true`.
    pub async fn request_account(&mut self) -> crate::Result<ParticipationState> {
        if !self.panel.machine().can_request_account() {
            return Err(crate::Error::Transition {
                state: self.state(),
                event: ParticipationEvent::RequestAccount,
            });
        }
        self.api.request_account(&self.competition).await?;
        self.panel.account_requested()?;
        if let Err(err) = self.reconcile().await {
            tracing::warn!(%err, competition = %self.competition, "failed to refetch participation status");
        }
        Ok(self.state())
    }

    /// Fetch the status and reconcile the local state with it.
    pub async fn reconcile(&mut self) -> crate::Result<Reconciliation> {
        let status = self.api.participation(&self.competition).await?;
        Ok(self.panel.reconcile(status))
    }

    /// Validate the form of the panel and join.
    ///
    /// Nothing is sent if the form is invalid. A conflict answer means the
    /// local state is stale, the status is reconciled before the error is
    /// returned.
    pub async fn submit_join(&mut self) -> crate::Result<()> {
        let request = self.panel.validate_form()?;
        match self.api.join(&self.competition, &request).await {
            Ok(()) => {
                self.panel.joined()?;
                tracing::info!(competition = %self.competition, "joined competition");
                Ok(())
            }
            Err(err) if err.is_conflict() => {
                tracing::warn!(%err, "join conflicted, reconciling");
                if let Err(reconcile_err) = self.reconcile().await {
                    tracing::warn!(%reconcile_err, "failed to reconcile after conflict");
                }
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    use tournament_client::types::{
        Competition, JoinRequest, LeaderboardRow, ParticipationStatus, TradeHistory,
    };

    use super::*;

    #[derive(Default)]
    struct Script {
        participation: VecDeque<tournament_client::Result<ParticipationStatus>>,
        request_account: VecDeque<tournament_client::Result<()>>,
        join: VecDeque<tournament_client::Result<()>>,
        joins: Vec<JoinRequest>,
        calls: Vec<&'static str>,
    }

    #[derive(Clone, Default)]
    struct FakeApi(Arc<Mutex<Script>>);

    impl FakeApi {
        fn script(&self) -> std::sync::MutexGuard<'_, Script> {
            self.0.lock().unwrap()
        }
    }

    fn exhausted<T>() -> tournament_client::Result<T> {
        Err(tournament_client::Error::custom("no scripted answer"))
    }

    impl CompetitionApi for FakeApi {
        async fn current_competition(&self) -> tournament_client::Result<Option<CompetitionId>> {
            exhausted()
        }

        async fn competition(&self, _id: &CompetitionId) -> tournament_client::Result<Competition> {
            exhausted()
        }

        async fn participation(
            &self,
            _id: &CompetitionId,
        ) -> tournament_client::Result<ParticipationStatus> {
            let mut script = self.script();
            script.calls.push("participation");
            script.participation.pop_front().unwrap_or_else(exhausted)
        }

        async fn request_account(&self, _id: &CompetitionId) -> tournament_client::Result<()> {
            let mut script = self.script();
            script.calls.push("request_account");
            script.request_account.pop_front().unwrap_or_else(exhausted)
        }

        async fn join(
            &self,
            _id: &CompetitionId,
            request: &JoinRequest,
        ) -> tournament_client::Result<()> {
            let mut script = self.script();
            script.calls.push("join");
            script.joins.push(request.clone());
            script.join.pop_front().unwrap_or_else(exhausted)
        }

        async fn leaderboard(
            &self,
            _id: &CompetitionId,
        ) -> tournament_client::Result<Vec<LeaderboardRow>> {
            exhausted()
        }

        async fn trade_history(&self, _account_login: i64) -> tournament_client::Result<TradeHistory> {
            exhausted()
        }
    }

    fn status(has_requested_account: bool, has_joined: bool) -> ParticipationStatus {
        ParticipationStatus {
            has_requested_account,
            has_joined,
        }
    }

    fn conflict() -> tournament_client::Error {
        tournament_client::Error::Status {
            status: 409,
            message: "already joined".to_string(),
        }
    }

    #[tokio::test]
    async fn request_account_then_refetch() -> crate::Result<()> {
        let api = FakeApi::default();
        {
            let mut script = api.script();
            script.participation.push_back(Ok(status(false, false)));
            script.request_account.push_back(Ok(()));
            script.participation.push_back(Ok(status(true, false)));
        }
        let mut flow = JoinFlow::load(api.clone(), "c1".into()).await?;
        assert_eq!(flow.state(), ParticipationState::NotRequested);

        assert_eq!(flow.request_account().await?, ParticipationState::Requested);
        assert!(!flow.needs_reconciliation());
        assert_eq!(
            api.script().calls,
            ["participation", "request_account", "participation"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_refetch_keeps_tentative_state() -> crate::Result<()> {
        let api = FakeApi::default();
        api.script().request_account.push_back(Ok(()));
        let mut flow = JoinFlow::new(api.clone(), "c1".into(), JoinPanel::new(status(false, false)));

        assert_eq!(flow.request_account().await?, ParticipationState::Requested);
        assert!(flow.needs_reconciliation());
        assert_eq!(flow.panel().machine().committed(), ParticipationState::NotRequested);

        api.script().participation.push_back(Ok(status(true, false)));
        assert_eq!(flow.reconcile().await?, Reconciliation::Unchanged);
        assert!(!flow.needs_reconciliation());
        Ok(())
    }

    #[tokio::test]
    async fn failed_request_changes_nothing() {
        let api = FakeApi::default();
        api.script().request_account.push_back(Err(tournament_client::Error::Status {
            status: 403,
            message: "competition already started".to_string(),
        }));
        let mut flow = JoinFlow::new(api.clone(), "c1".into(), JoinPanel::new(status(false, false)));
        assert!(flow.request_account().await.is_err());
        assert_eq!(flow.state(), ParticipationState::NotRequested);
        assert_eq!(api.script().calls, ["request_account"]);
    }

    #[tokio::test]
    async fn invalid_form_is_not_sent() {
        let api = FakeApi::default();
        let mut flow = JoinFlow::new(api.clone(), "c1".into(), JoinPanel::new(status(true, false)));
        flow.panel_mut().open_form().expect("join is available");
        flow.panel_mut().form_mut().login = "abc".to_string();

        let err = flow.submit_join().await.unwrap_err();
        assert!(matches!(err, crate::Error::InvalidJoinForm(_)));
        assert!(api.script().calls.is_empty());
        assert_eq!(flow.state(), ParticipationState::Requested);
    }

    #[tokio::test]
    async fn join_commits_and_clears_form() -> crate::Result<()> {
        let api = FakeApi::default();
        api.script().join.push_back(Ok(()));
        let mut flow = JoinFlow::new(api.clone(), "c1".into(), JoinPanel::new(status(true, false)));
        flow.panel_mut().open_form()?;
        *flow.panel_mut().form_mut() = crate::participation::JoinForm::new("12345678", "pw", "Demo");

        flow.submit_join().await?;
        assert_eq!(flow.state(), ParticipationState::Joined);
        assert!(flow.panel().form().is_empty());
        assert_eq!(api.script().joins[0].login, 12345678);
        Ok(())
    }

    #[tokio::test]
    async fn join_conflict_reconciles() {
        let api = FakeApi::default();
        {
            let mut script = api.script();
            script.join.push_back(Err(conflict()));
            script.participation.push_back(Ok(status(true, true)));
        }
        let mut flow = JoinFlow::new(api.clone(), "c1".into(), JoinPanel::new(status(false, true)));
        assert_eq!(flow.state(), ParticipationState::Requested);
        *flow.panel_mut().form_mut() = crate::participation::JoinForm::new("1", "pw", "Demo");

        let err = flow.submit_join().await.unwrap_err();
        assert!(err.as_client_error().is_some_and(|err| err.is_conflict()));
        assert_eq!(flow.state(), ParticipationState::Joined);
        assert_eq!(api.script().calls, ["join", "participation"]);
    }
}
