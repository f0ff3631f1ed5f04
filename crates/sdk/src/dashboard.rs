use std::sync::Arc;

use futures_util::future::try_join;
use time::OffsetDateTime;
use tournament_client::{
    types::{Competition, CompetitionId, ParticipationStatus},
    CompetitionApi,
};

use crate::{
    leaderboard::{LeaderboardSync, RowLayout},
    participation::{JoinFlow, JoinPanel},
    phase::{CompetitionPhase, CompetitionWindow, DashboardView, PhaseWatcher},
    polling::{PollOptions, DEFAULT_EVALUATE_EVERY},
    trade_history::{aggregate, TradeHistoryReport},
    utils::Clock,
};

/// A competition loaded for display, with handles to its live parts.
#[derive(Debug)]
pub struct Dashboard<A> {
    api: Arc<A>,
    competition: Competition,
    participation: Option<ParticipationStatus>,
}

impl<A> Dashboard<A>
where
    A: CompetitionApi + Send + Sync + 'static,
{
    /// Load the competition with `id`, or the current one if `id` is `None`.
    ///
    /// Returns `None` if there is no current competition. The participation
    /// status is `None` when the session is not authenticated.
    pub async fn load(api: Arc<A>, id: Option<CompetitionId>) -> crate::Result<Option<Self>> {
        let id = match id {
            Some(id) => id,
            None => match api.current_competition().await? {
                Some(id) => id,
                None => {
                    tracing::info!("no current competition");
                    return Ok(None);
                }
            },
        };
        let participation = async {
            match api.participation(&id).await {
                Ok(status) => Ok(Some(status)),
                Err(tournament_client::Error::Unauthorized) => {
                    tracing::debug!(competition = %id, "not signed in, skipping participation");
                    Ok(None)
                }
                Err(err) => Err(err),
            }
        };
        let (competition, participation) = try_join(api.competition(&id), participation).await?;
        Ok(Some(Self {
            api,
            competition,
            participation,
        }))
    }

    /// The competition.
    pub fn competition(&self) -> &Competition {
        &self.competition
    }

    /// The time window of the competition.
    pub fn window(&self) -> CompetitionWindow {
        CompetitionWindow::from(&self.competition)
    }

    /// Participation status as loaded, `None` if not signed in.
    pub fn participation(&self) -> Option<ParticipationStatus> {
        self.participation
    }

    /// Phase at `now`.
    pub fn phase_at(&self, now: OffsetDateTime) -> CompetitionPhase {
        self.window().phase(now)
    }

    /// View to show at `now`.
    pub fn view_at(&self, now: OffsetDateTime) -> DashboardView {
        self.phase_at(now).view()
    }

    /// Join flow of the signed-in user.
    ///
    /// Returns `None` if not signed in.
    pub fn join_flow(&self) -> Option<JoinFlow<Arc<A>>> {
        let status = self.participation?;
        Some(JoinFlow::new(
            self.api.clone(),
            self.competition.id.clone(),
            JoinPanel::new(status),
        ))
    }

    /// Start re-evaluating the phase every second.
    pub fn watch_phase<C: Clock + Clone + 'static>(&self, clock: C) -> PhaseWatcher {
        PhaseWatcher::spawn(self.window(), clock, DEFAULT_EVALUATE_EVERY)
    }

    /// Start synchronizing the leaderboard.
    pub fn sync_leaderboard<C, L>(&self, clock: C, layout: L, options: PollOptions) -> LeaderboardSync
    where
        C: Clock + Clone + 'static,
        L: RowLayout + Send + 'static,
    {
        LeaderboardSync::spawn(
            self.api.clone(),
            self.competition.id.clone(),
            self.window(),
            clock,
            layout,
            options,
        )
    }

    /// Fetch and aggregate the trade history of an account.
    ///
    /// Returns the owner of the account together with the report.
    pub async fn trade_history(&self, account_login: i64) -> crate::Result<(String, TradeHistoryReport)> {
        fetch_trade_history(self.api.as_ref(), account_login).await
    }
}

/// Fetch and aggregate the trade history of an account.
pub async fn fetch_trade_history<A: CompetitionApi>(
    api: &A,
    account_login: i64,
) -> crate::Result<(String, TradeHistoryReport)> {
    let history = api.trade_history(account_login).await?;
    let report = aggregate(&history.trades);
    if report.skipped != 0 {
        tracing::warn!(account_login, skipped = report.skipped, "skipped malformed trades");
    }
    Ok((history.username, report))
}
