#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use time::OffsetDateTime;
use tournament_sdk::client::{
    types::{
        Competition, CompetitionId, JoinRequest, LeaderboardRow, ParticipationStatus, TradeHistory,
    },
    CompetitionApi, Error, Result,
};

pub fn row(rank: u32, username: &str) -> LeaderboardRow {
    LeaderboardRow {
        trading_account_login: 50_000 + i64::from(rank),
        rank,
        username: username.to_string(),
        account_size: 10_000.0,
        profit: 0.0,
        equity: 10_000.0,
        gain_percent: 0.0,
    }
}

pub fn competition(id: &str, starts_at: OffsetDateTime, ends_at: OffsetDateTime) -> Competition {
    Competition {
        id: CompetitionId::new(id),
        name: "Spring Cup".to_string(),
        description: String::new(),
        starts_at,
        ends_at,
    }
}

pub fn server_error() -> Error {
    Error::Status {
        status: 500,
        message: "internal error".to_string(),
    }
}

#[derive(Debug, Default)]
struct State {
    current: Option<CompetitionId>,
    competition: Option<Competition>,
    participation: VecDeque<Result<ParticipationStatus>>,
    leaderboards: VecDeque<Result<Vec<LeaderboardRow>>>,
    last_leaderboard: Vec<LeaderboardRow>,
    trade_history: Option<TradeHistory>,
    joins: Vec<JoinRequest>,
    leaderboard_calls: usize,
    request_account_calls: usize,
}

/// Scripted, in-memory API.
#[derive(Debug, Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<State>>,
}

impl FakeApi {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn with_competition(competition: Competition) -> Self {
        let api = Self::default();
        {
            let mut state = api.state();
            state.current = Some(competition.id.clone());
            state.competition = Some(competition);
        }
        api
    }

    pub fn push_participation(&self, status: Result<ParticipationStatus>) -> &Self {
        self.state().participation.push_back(status);
        self
    }

    pub fn push_leaderboard(&self, rows: Result<Vec<LeaderboardRow>>) -> &Self {
        self.state().leaderboards.push_back(rows);
        self
    }

    pub fn set_trade_history(&self, history: TradeHistory) {
        self.state().trade_history = Some(history);
    }

    pub fn leaderboard_calls(&self) -> usize {
        self.state().leaderboard_calls
    }

    pub fn request_account_calls(&self) -> usize {
        self.state().request_account_calls
    }

    pub fn joins(&self) -> Vec<JoinRequest> {
        self.state().joins.clone()
    }
}

impl CompetitionApi for FakeApi {
    async fn current_competition(&self) -> Result<Option<CompetitionId>> {
        Ok(self.state().current.clone())
    }

    async fn competition(&self, id: &CompetitionId) -> Result<Competition> {
        self.state()
            .competition
            .clone()
            .filter(|competition| competition.id == *id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn participation(&self, _id: &CompetitionId) -> Result<ParticipationStatus> {
        self.state()
            .participation
            .pop_front()
            .unwrap_or(Ok(ParticipationStatus::default()))
    }

    async fn request_account(&self, _id: &CompetitionId) -> Result<()> {
        self.state().request_account_calls += 1;
        Ok(())
    }

    async fn join(&self, _id: &CompetitionId, request: &JoinRequest) -> Result<()> {
        self.state().joins.push(request.clone());
        Ok(())
    }

    async fn leaderboard(&self, _id: &CompetitionId) -> Result<Vec<LeaderboardRow>> {
        let mut state = self.state();
        state.leaderboard_calls += 1;
        match state.leaderboards.pop_front() {
            Some(Ok(rows)) => {
                state.last_leaderboard = rows.clone();
                Ok(rows)
            }
            Some(Err(err)) => Err(err),
            None => Ok(state.last_leaderboard.clone()),
        }
    }

    async fn trade_history(&self, account_login: i64) -> Result<TradeHistory> {
        self.state()
            .trade_history
            .clone()
            .ok_or_else(|| Error::NotFound(account_login.to_string()))
    }
}
