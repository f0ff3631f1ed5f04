/// Reorder animations.
pub mod reorder;

/// Live synchronization.
#[cfg(client)]
pub mod sync;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tournament_client::types::LeaderboardRow;

use crate::phase::CompetitionPhase;

pub use reorder::{
    Easing, MeasuredLayout, PositionSnapshot, RowAnimation, RowLayout, UniformRowLayout,
};

#[cfg(client)]
pub use sync::LeaderboardSync;

/// Items with a stable identity across refreshes.
pub trait Keyed {
    /// Identity key.
    fn identity_key(&self) -> Cow<'_, str>;
}

impl<T: Keyed + ?Sized> Keyed for &T {
    fn identity_key(&self) -> Cow<'_, str> {
        (**self).identity_key()
    }
}

impl Keyed for LeaderboardRow {
    fn identity_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.username)
    }
}

/// Medal for the first three ranks.
pub fn medal(rank: u32) -> Option<&'static str> {
    match rank {
        1 => Some("🥇"),
        2 => Some("🥈"),
        3 => Some("🥉"),
        _ => None,
    }
}

/// Account login whose trade history a row opens.
pub fn trade_history_target(row: &LeaderboardRow) -> i64 {
    row.trading_account_login
}

/// Whether the leaderboard is still updating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaderboardStatus {
    /// Refreshed periodically.
    Live,
    /// The competition is over.
    Final,
}

impl LeaderboardStatus {
    /// Status line.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Live => "Updates every minute",
            Self::Final => "Final results",
        }
    }
}

impl From<CompetitionPhase> for LeaderboardStatus {
    fn from(phase: CompetitionPhase) -> Self {
        if phase.is_ended() {
            Self::Final
        } else {
            Self::Live
        }
    }
}

/// Load state of the leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LoadState {
    /// No successful fetch yet.
    Loading,
    /// Rows have been fetched at least once.
    Ready,
}

/// A published state of the leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardSnapshot {
    /// Rows in source order.
    pub rows: Vec<LeaderboardRow>,
    /// Animations for the last commit.
    pub animations: Vec<RowAnimation>,
    /// Load state.
    pub load_state: LoadState,
    /// Status.
    pub status: LeaderboardStatus,
    /// Number of commits so far.
    pub revision: u64,
}

impl LeaderboardSnapshot {
    /// Text to show instead of the rows, if any.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self.load_state {
            LoadState::Loading => Some("Loading…"),
            LoadState::Ready if self.rows.is_empty() => Some("No data yet."),
            LoadState::Ready => None,
        }
    }

    /// Animation of the row with `key`, if it moved in the last commit.
    pub fn animation(&self, key: &str) -> Option<&RowAnimation> {
        self.animations.iter().find(|animation| animation.key == key)
    }
}

/// Rows of the leaderboard as currently rendered.
#[derive(Debug, Clone)]
pub struct LeaderboardState<L> {
    rows: Vec<LeaderboardRow>,
    layout: L,
    animations: Vec<RowAnimation>,
    load_state: LoadState,
    status: LeaderboardStatus,
    revision: u64,
}

impl<L: RowLayout> LeaderboardState<L> {
    /// Create an empty, loading leaderboard.
    pub fn new(layout: L, status: LeaderboardStatus) -> Self {
        Self {
            rows: Vec::new(),
            layout,
            animations: Vec::new(),
            load_state: LoadState::Loading,
            status,
            revision: 0,
        }
    }

    /// Replace all rows, returning the animations of the rows that moved.
    ///
    /// Positions are captured before the replacement and measured after it.
    pub fn commit(&mut self, rows: Vec<LeaderboardRow>) -> &[RowAnimation] {
        let snapshot = PositionSnapshot::capture(&self.rows, &self.layout);
        self.rows = rows;
        self.animations = snapshot.play(&self.rows, &self.layout);
        self.load_state = LoadState::Ready;
        self.revision += 1;
        tracing::debug!(
            revision = self.revision,
            rows = self.rows.len(),
            moved = self.animations.len(),
            "leaderboard committed"
        );
        &self.animations
    }

    /// Set the status, returning whether it changed.
    pub fn set_status(&mut self, status: LeaderboardStatus) -> bool {
        let changed = self.status != status;
        self.status = status;
        changed
    }

    /// Current rows.
    pub fn rows(&self) -> &[LeaderboardRow] {
        &self.rows
    }

    /// Load state.
    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    /// Status.
    pub fn status(&self) -> LeaderboardStatus {
        self.status
    }

    /// Layout, e.g. to update measurements before the next commit.
    pub fn layout_mut(&mut self) -> &mut L {
        &mut self.layout
    }

    /// Snapshot of the current state.
    pub fn snapshot(&self) -> LeaderboardSnapshot {
        LeaderboardSnapshot {
            rows: self.rows.clone(),
            animations: self.animations.clone(),
            load_state: self.load_state,
            status: self.status,
            revision: self.revision,
        }
    }
}
