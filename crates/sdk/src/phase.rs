use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tournament_client::types::Competition;

/// Phase of a competition, derived from its window and the current time.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetitionPhase {
    /// Not started yet.
    Upcoming,
    /// Running.
    Live,
    /// Over.
    Ended,
}

impl CompetitionPhase {
    /// Label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Upcoming => "Upcoming",
            Self::Live => "Live",
            Self::Ended => "Finished",
        }
    }

    /// Returns whether the competition is over.
    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended)
    }

    /// The view to show in this phase.
    pub fn view(&self) -> DashboardView {
        match self {
            Self::Upcoming => DashboardView::JoinPanel,
            Self::Live | Self::Ended => DashboardView::Leaderboard,
        }
    }
}

/// Which part of the dashboard is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DashboardView {
    /// Participation actions (request account, join).
    JoinPanel,
    /// The live (or final) leaderboard.
    Leaderboard,
}

/// Start and end of a competition.
///
/// `starts_at <= ends_at` is assumed, not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionWindow {
    /// Start.
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    /// End.
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
}

impl CompetitionWindow {
    /// Create a window.
    pub fn new(starts_at: OffsetDateTime, ends_at: OffsetDateTime) -> Self {
        Self { starts_at, ends_at }
    }

    /// Phase at `now`.
    pub fn phase(&self, now: OffsetDateTime) -> CompetitionPhase {
        phase(now, self)
    }
}

impl From<&Competition> for CompetitionWindow {
    fn from(competition: &Competition) -> Self {
        Self::new(competition.starts_at, competition.ends_at)
    }
}

/// Evaluate the phase of `window` at `now`.
///
/// Both bounds belong to the live phase.
pub fn phase(now: OffsetDateTime, window: &CompetitionWindow) -> CompetitionPhase {
    if now < window.starts_at {
        CompetitionPhase::Upcoming
    } else if now <= window.ends_at {
        CompetitionPhase::Live
    } else {
        CompetitionPhase::Ended
    }
}

#[cfg(client)]
pub use watcher::PhaseWatcher;

#[cfg(client)]
mod watcher {
    use std::time::Duration;

    use tokio::sync::watch;

    use crate::{
        polling::{PollHandle, PollOptions, Polled, Poller},
        utils::Clock,
    };

    use super::{CompetitionPhase, CompetitionWindow};

    /// Re-evaluates the phase of a competition on a fixed cadence and
    /// publishes every change.
    ///
    /// Evaluation stops once the competition has ended.
    #[derive(Debug)]
    pub struct PhaseWatcher {
        receiver: watch::Receiver<CompetitionPhase>,
        handle: PollHandle,
    }

    impl PhaseWatcher {
        /// Start watching `window`, evaluating every `every`.
        pub fn spawn<C: Clock + Clone + 'static>(
            window: CompetitionWindow,
            clock: C,
            every: Duration,
        ) -> Self {
            let initial = window.phase(clock.now());
            let (sender, receiver) = watch::channel(initial);
            let options = PollOptions::builder()
                .interval(every)
                .evaluate_every(every)
                .build();
            let handle = Poller::new(clock, options).spawn(
                move |now| std::future::ready(Ok::<_, crate::Error>(window.phase(now))),
                move |now| !window.phase(now).is_ended(),
                move |polled| {
                    let phase = match polled {
                        Polled::Value { value, .. } => value,
                        Polled::Deactivated { now } => window.phase(now),
                    };
                    sender.send_if_modified(|current| {
                        if *current == phase {
                            false
                        } else {
                            tracing::info!(from = %current, to = %phase, "competition phase changed");
                            *current = phase;
                            true
                        }
                    });
                },
            );
            Self { receiver, handle }
        }

        /// Current phase.
        pub fn phase(&self) -> CompetitionPhase {
            *self.receiver.borrow()
        }

        /// Subscribe to phase changes.
        pub fn subscribe(&self) -> watch::Receiver<CompetitionPhase> {
            self.receiver.clone()
        }

        /// Wait for the next phase change.
        ///
        /// Returns `None` once no further change can happen.
        pub async fn changed(&mut self) -> Option<CompetitionPhase> {
            self.receiver.changed().await.ok()?;
            Some(*self.receiver.borrow_and_update())
        }

        /// Stop watching.
        pub async fn shutdown(self) {
            self.handle.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn window() -> CompetitionWindow {
        CompetitionWindow::new(
            datetime!(2026-01-10 12:00 UTC),
            datetime!(2026-01-24 12:00 UTC),
        )
    }

    #[test]
    fn phase_follows_the_window() {
        let window = window();
        assert_eq!(
            phase(datetime!(2026-01-10 11:59:59 UTC), &window),
            CompetitionPhase::Upcoming
        );
        assert_eq!(
            phase(datetime!(2026-01-10 12:00 UTC), &window),
            CompetitionPhase::Live
        );
        assert_eq!(
            phase(datetime!(2026-01-24 12:00 UTC), &window),
            CompetitionPhase::Live
        );
        assert_eq!(
            phase(datetime!(2026-01-24 12:00:00.001 UTC), &window),
            CompetitionPhase::Ended
        );
    }

    #[test]
    fn phase_is_monotonic_in_time() {
        let window = window();
        let mut now = datetime!(2026-01-01 00:00 UTC);
        let mut last = phase(now, &window);
        while now < datetime!(2026-02-01 00:00 UTC) {
            now += time::Duration::hours(7);
            let next = phase(now, &window);
            assert!(next as u8 >= last as u8, "{last} -> {next} at {now}");
            last = next;
        }
        assert_eq!(last, CompetitionPhase::Ended);
    }

    #[test]
    fn empty_window_is_live_at_its_instant() {
        let at = datetime!(2026-03-01 00:00 UTC);
        let window = CompetitionWindow::new(at, at);
        assert_eq!(window.phase(at), CompetitionPhase::Live);
    }

    #[test]
    fn labels_and_views() {
        assert_eq!(CompetitionPhase::Ended.label(), "Finished");
        assert_eq!(CompetitionPhase::Live.to_string(), "LIVE");
        assert_eq!(
            CompetitionPhase::Upcoming.view(),
            DashboardView::JoinPanel
        );
        assert_eq!(CompetitionPhase::Ended.view(), DashboardView::Leaderboard);
    }

    #[cfg(client)]
    #[tokio::test(start_paused = true)]
    async fn watcher_publishes_changes() {
        use std::time::Duration;

        use crate::utils::TokioClock;

        let window = CompetitionWindow::new(
            datetime!(2026-01-10 12:00:05 UTC),
            datetime!(2026-01-10 12:00:10 UTC),
        );
        let clock = TokioClock::new(datetime!(2026-01-10 12:00 UTC));
        let mut watcher = PhaseWatcher::spawn(window, clock, Duration::from_secs(1));
        assert_eq!(watcher.phase(), CompetitionPhase::Upcoming);

        assert_eq!(watcher.changed().await, Some(CompetitionPhase::Live));
        assert_eq!(watcher.changed().await, Some(CompetitionPhase::Ended));
        assert_eq!(watcher.changed().await, None);
    }
}
