use std::{fmt, future::Future, time::Duration};

use time::OffsetDateTime;
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use typed_builder::TypedBuilder;

use crate::utils::Clock;

/// Default interval between two fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Default interval between two evaluations of the activity predicate.
pub const DEFAULT_EVALUATE_EVERY: Duration = Duration::from_secs(1);

/// Options for [`Poller`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct PollOptions {
    /// Interval between two fetches.
    #[builder(default = DEFAULT_POLL_INTERVAL)]
    pub interval: Duration,
    /// Interval between two evaluations of the activity predicate.
    #[builder(default = DEFAULT_EVALUATE_EVERY)]
    pub evaluate_every: Duration,
    /// Whether to fetch one last time when the predicate turns false.
    #[builder(default)]
    pub run_on_deactivate: bool,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Recurring fetch scheduler.
#[derive(Debug)]
pub struct Poller<C> {
    clock: C,
    options: PollOptions,
    token: CancellationToken,
}

impl<C: Clock + 'static> Poller<C> {
    /// Create a poller reading the time from `clock`.
    pub fn new(clock: C, options: PollOptions) -> Self {
        Self {
            clock,
            options,
            token: CancellationToken::new(),
        }
    }

    /// Tie the spawned task to `parent`: cancelling the parent cancels the task.
    pub fn with_parent(mut self, parent: &CancellationToken) -> Self {
        self.token = parent.child_token();
        self
    }

    /// Spawn the polling task.
    ///
    /// `fetch` runs once immediately and then on every tick for as long as
    /// `active_while(now)` holds. Both `fetch` and `deliver` receive the `now`
    /// the predicate was evaluated with. Successful results are passed to
    /// `deliver`; failures are logged and retried on the next tick. When the
    /// predicate turns false, `deliver` receives [`Polled::Deactivated`] after
    /// the optional final fetch, whatever that fetch returned.
    pub fn spawn<T, E, F, Fut, A, D>(self, fetch: F, active_while: A, deliver: D) -> PollHandle
    where
        T: Send + 'static,
        E: fmt::Display + Send + 'static,
        F: FnMut(OffsetDateTime) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        A: Fn(OffsetDateTime) -> bool + Send + 'static,
        D: FnMut(Polled<T>) + Send + 'static,
    {
        let token = self.token.clone();
        let task = PollTask {
            clock: self.clock,
            options: self.options,
            token: self.token,
            fetch,
            active_while,
            deliver,
        };
        PollHandle {
            token,
            task: Some(tokio::spawn(task.run())),
        }
    }
}

/// Event passed to the delivery callback of a [`Poller`].
#[derive(Debug, Clone, PartialEq)]
pub enum Polled<T> {
    /// A fetch succeeded.
    Value {
        /// Fetched value.
        value: T,
        /// Time the fetch was decided at.
        now: OffsetDateTime,
    },
    /// The activity predicate turned false. Nothing is delivered afterwards.
    Deactivated {
        /// Time the predicate was found false at.
        now: OffsetDateTime,
    },
}

enum Flow {
    Continue,
    Cancelled,
}

struct PollTask<C, F, A, D> {
    clock: C,
    options: PollOptions,
    token: CancellationToken,
    fetch: F,
    active_while: A,
    deliver: D,
}

impl<C, F, A, D> PollTask<C, F, A, D> {
    async fn fetch_once<T, E, Fut>(&mut self, now: OffsetDateTime) -> Flow
    where
        E: fmt::Display,
        F: FnMut(OffsetDateTime) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        D: FnMut(Polled<T>),
    {
        let fut = (self.fetch)(now);
        let result = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Flow::Cancelled,
            result = fut => result,
        };
        if self.token.is_cancelled() {
            tracing::debug!("discarding result of a cancelled poll");
            return Flow::Cancelled;
        }
        match result {
            Ok(value) => (self.deliver)(Polled::Value { value, now }),
            Err(err) => tracing::warn!(%err, "poll failed, retrying on next tick"),
        }
        Flow::Continue
    }

    async fn deactivate<T, E, Fut>(&mut self, now: OffsetDateTime)
    where
        E: fmt::Display,
        F: FnMut(OffsetDateTime) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        D: FnMut(Polled<T>),
    {
        tracing::debug!(
            final_fetch = self.options.run_on_deactivate,
            "poller deactivated"
        );
        if self.options.run_on_deactivate {
            if let Flow::Cancelled = self.fetch_once(now).await {
                return;
            }
        }
        if !self.token.is_cancelled() {
            (self.deliver)(Polled::Deactivated { now });
        }
    }

    async fn run<T, E, Fut>(mut self)
    where
        C: Clock,
        E: fmt::Display,
        F: FnMut(OffsetDateTime) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        A: Fn(OffsetDateTime) -> bool,
        D: FnMut(Polled<T>),
    {
        let now = self.clock.now();
        if !(self.active_while)(now) {
            self.deactivate(now).await;
            return;
        }
        if let Flow::Cancelled = self.fetch_once(now).await {
            return;
        }

        let start = Instant::now();
        let mut fetch_ticker =
            interval_at(start + self.options.interval, self.options.interval);
        fetch_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut evaluate_ticker = interval_at(
            start + self.options.evaluate_every,
            self.options.evaluate_every,
        );
        evaluate_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let fetch_due = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = evaluate_ticker.tick() => false,
                _ = fetch_ticker.tick() => true,
            };
            let now = self.clock.now();
            if !(self.active_while)(now) {
                self.deactivate(now).await;
                break;
            }
            if fetch_due {
                if let Flow::Cancelled = self.fetch_once(now).await {
                    break;
                }
            }
        }
        tracing::trace!("poller stopped");
    }
}

/// Handle of a spawned polling task.
///
/// Dropping the handle cancels the task.
#[derive(Debug)]
pub struct PollHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stop future invocations.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns whether the handle has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns whether the task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel the task and wait for it to stop.
    ///
    /// The delivery callback is never invoked after this returns.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        self.join().await;
    }

    /// Wait for the task to stop by itself.
    pub async fn wait(mut self) {
        self.join().await;
    }

    async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                if err.is_panic() {
                    tracing::error!(%err, "polling task panicked");
                }
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
