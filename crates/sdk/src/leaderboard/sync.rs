use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tournament_client::{
    types::{CompetitionId, LeaderboardRow},
    CompetitionApi,
};

use crate::{
    phase::CompetitionWindow,
    polling::{PollHandle, PollOptions, Polled, Poller},
    utils::Clock,
};

use super::{LeaderboardSnapshot, LeaderboardState, LeaderboardStatus, RowLayout};

/// Keeps a leaderboard up to date while its competition is running.
///
/// Rows are fetched once on start, then on every poll interval until the
/// competition ends, and one last time when it does. Every committed update
/// is published as a [`LeaderboardSnapshot`]. The status becomes final when
/// the competition ends, even if the last fetch fails.
#[derive(Debug)]
pub struct LeaderboardSync {
    receiver: watch::Receiver<LeaderboardSnapshot>,
    handle: PollHandle,
}

impl LeaderboardSync {
    /// Start synchronizing the leaderboard of `competition`.
    pub fn spawn<A, C, L>(
        api: Arc<A>,
        competition: CompetitionId,
        window: CompetitionWindow,
        clock: C,
        layout: L,
        options: PollOptions,
    ) -> Self
    where
        A: CompetitionApi + Send + Sync + 'static,
        C: Clock + Clone + 'static,
        L: RowLayout + Send + 'static,
    {
        Self::spawn_with_parent(
            api,
            competition,
            window,
            clock,
            layout,
            options,
            None,
        )
    }

    /// Same as [`spawn`](Self::spawn), cancelled together with `parent`.
    pub fn spawn_with_parent<A, C, L>(
        api: Arc<A>,
        competition: CompetitionId,
        window: CompetitionWindow,
        clock: C,
        layout: L,
        options: PollOptions,
        parent: Option<&CancellationToken>,
    ) -> Self
    where
        A: CompetitionApi + Send + Sync + 'static,
        C: Clock + Clone + 'static,
        L: RowLayout + Send + 'static,
    {
        let status = LeaderboardStatus::from(window.phase(clock.now()));
        let mut state = LeaderboardState::new(layout, status);
        let (sender, receiver) = watch::channel(state.snapshot());

        let options = PollOptions {
            run_on_deactivate: true,
            ..options
        };
        let mut poller = Poller::new(clock, options);
        if let Some(parent) = parent {
            poller = poller.with_parent(parent);
        }

        let fetch = {
            let competition = competition.clone();
            move |_: OffsetDateTime| {
                let api = api.clone();
                let competition = competition.clone();
                async move {
                    tracing::debug!(%competition, "fetching leaderboard");
                    api.leaderboard(&competition).await
                }
            }
        };
        let deliver = move |polled: Polled<Vec<LeaderboardRow>>| {
            let (rows, now) = match polled {
                Polled::Value { value, now } => (Some(value), now),
                Polled::Deactivated { now } => (None, now),
            };
            let status = LeaderboardStatus::from(window.phase(now));
            let status_changed = state.set_status(status);
            if status_changed {
                tracing::info!(%status, "leaderboard status changed");
            }
            match rows {
                Some(rows) => {
                    state.commit(rows);
                }
                // The final fetch may have failed, the rows stay as they were.
                None if !status_changed => return,
                None => {}
            }
            sender.send_replace(state.snapshot());
        };
        let handle = poller.spawn(fetch, move |now| !window.phase(now).is_ended(), deliver);

        Self { receiver, handle }
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> LeaderboardSnapshot {
        self.receiver.borrow().clone()
    }

    /// Subscribe to snapshots.
    pub fn subscribe(&self) -> watch::Receiver<LeaderboardSnapshot> {
        self.receiver.clone()
    }

    /// Wait for the next snapshot.
    ///
    /// Returns `None` once synchronization has stopped.
    pub async fn changed(&mut self) -> Option<LeaderboardSnapshot> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Returns whether synchronization has stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop synchronizing.
    ///
    /// No snapshot is published after this returns.
    pub async fn shutdown(self) {
        self.handle.shutdown().await;
    }
}
