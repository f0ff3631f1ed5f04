mod common;

use std::{sync::Arc, time::Duration};

use time::macros::datetime;
use tournament_sdk::{
    client::types::CompetitionId,
    leaderboard::{LeaderboardStatus, LeaderboardSync, LoadState, UniformRowLayout},
    phase::CompetitionWindow,
    polling::PollOptions,
    utils::TokioClock,
};

use common::{row, server_error, FakeApi};

const ROW_HEIGHT: f64 = 40.0;

fn spawn(api: &FakeApi, window: CompetitionWindow, clock: TokioClock) -> LeaderboardSync {
    LeaderboardSync::spawn(
        Arc::new(api.clone()),
        CompetitionId::new("spring-cup"),
        window,
        clock,
        UniformRowLayout {
            row_height: ROW_HEIGHT,
        },
        PollOptions::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn refreshes_until_the_end_then_shows_final_results() -> eyre::Result<()> {
    let now = datetime!(2026-03-01 12:00 UTC);
    let clock = TokioClock::new(now);
    let window = CompetitionWindow::new(
        now - time::Duration::hours(1),
        now + time::Duration::seconds(150),
    );
    let api = FakeApi::default();
    api.push_leaderboard(Ok(vec![row(1, "alice"), row(2, "bob"), row(3, "carol")]))
        .push_leaderboard(Ok(vec![row(1, "bob"), row(2, "alice"), row(3, "carol")]))
        .push_leaderboard(Ok(vec![row(1, "bob"), row(2, "alice"), row(3, "carol")]))
        .push_leaderboard(Ok(vec![row(1, "carol"), row(2, "bob"), row(3, "alice")]));

    let mut sync = spawn(&api, window, clock);
    assert_eq!(sync.snapshot().load_state, LoadState::Loading);
    assert_eq!(sync.snapshot().placeholder(), Some("Loading…"));

    let first = sync.changed().await.ok_or_else(|| eyre::eyre!("stopped"))?;
    assert_eq!(first.revision, 1);
    assert_eq!(first.load_state, LoadState::Ready);
    assert_eq!(first.status, LeaderboardStatus::Live);
    assert!(first.animations.is_empty());

    let second = sync.changed().await.ok_or_else(|| eyre::eyre!("stopped"))?;
    assert_eq!(second.revision, 2);
    assert_eq!(api.leaderboard_calls(), 2);
    let bob = second.animation("bob").ok_or_else(|| eyre::eyre!("bob did not move"))?;
    assert_eq!(bob.from_offset, ROW_HEIGHT);
    assert_eq!(bob.to_offset, 0.0);
    assert!(bob.moved_up());
    assert_eq!(second.animation("alice").map(|a| a.from_offset), Some(-ROW_HEIGHT));
    assert!(second.animation("carol").is_none());

    let third = sync.changed().await.ok_or_else(|| eyre::eyre!("stopped"))?;
    assert_eq!(third.revision, 3);
    assert!(third.animations.is_empty());
    assert_eq!(third.status, LeaderboardStatus::Live);

    // One last fetch once the competition is over.
    let last = sync.changed().await.ok_or_else(|| eyre::eyre!("stopped"))?;
    assert_eq!(last.revision, 4);
    assert_eq!(last.status, LeaderboardStatus::Final);
    assert_eq!(last.status.label(), "Final results");
    assert_eq!(last.rows[0].username, "carol");
    assert_eq!(last.animations.len(), 3);

    assert!(sync.changed().await.is_none());
    assert!(sync.is_finished());
    assert_eq!(api.leaderboard_calls(), 4);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failures_keep_the_last_known_rows() -> eyre::Result<()> {
    let now = datetime!(2026-03-01 12:00 UTC);
    let window = CompetitionWindow::new(now, now + time::Duration::days(1));
    let api = FakeApi::default();
    api.push_leaderboard(Err(server_error()))
        .push_leaderboard(Ok(vec![row(1, "alice")]))
        .push_leaderboard(Err(server_error()))
        .push_leaderboard(Ok(vec![row(1, "alice"), row(2, "bob")]));

    let mut sync = spawn(&api, window, TokioClock::new(now));

    let first = sync.changed().await.ok_or_else(|| eyre::eyre!("stopped"))?;
    assert_eq!(first.revision, 1);
    assert_eq!(first.rows.len(), 1);
    assert_eq!(api.leaderboard_calls(), 2);

    let next = sync.changed().await.ok_or_else(|| eyre::eyre!("stopped"))?;
    assert_eq!(next.revision, 2);
    assert_eq!(next.rows.len(), 2);
    assert_eq!(api.leaderboard_calls(), 4);

    sync.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn nothing_is_fetched_after_shutdown() -> eyre::Result<()> {
    let now = datetime!(2026-03-01 12:00 UTC);
    let window = CompetitionWindow::new(now, now + time::Duration::days(1));
    let api = FakeApi::default();
    api.push_leaderboard(Ok(vec![row(1, "alice")]));

    let mut sync = spawn(&api, window, TokioClock::new(now));
    sync.changed().await.ok_or_else(|| eyre::eyre!("stopped"))?;
    sync.shutdown().await;

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(api.leaderboard_calls(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn ended_competition_is_fetched_once() -> eyre::Result<()> {
    let now = datetime!(2026-03-01 12:00 UTC);
    let window = CompetitionWindow::new(now - time::Duration::days(2), now - time::Duration::days(1));
    let api = FakeApi::default();
    api.push_leaderboard(Ok(vec![row(1, "alice"), row(2, "bob")]));

    let mut sync = spawn(&api, window, TokioClock::new(now));
    assert_eq!(sync.snapshot().status, LeaderboardStatus::Final);

    let snapshot = sync.changed().await.ok_or_else(|| eyre::eyre!("stopped"))?;
    assert_eq!(snapshot.status, LeaderboardStatus::Final);
    assert_eq!(snapshot.rows.len(), 2);

    assert!(sync.changed().await.is_none());
    assert_eq!(api.leaderboard_calls(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_final_fetch_still_shows_final_results() -> eyre::Result<()> {
    let now = datetime!(2026-03-01 12:00 UTC);
    let window = CompetitionWindow::new(now, now + time::Duration::seconds(30));
    let api = FakeApi::default();
    api.push_leaderboard(Ok(vec![row(1, "alice"), row(2, "bob")]))
        .push_leaderboard(Err(server_error()));

    let mut sync = spawn(&api, window, TokioClock::new(now));
    let first = sync.changed().await.ok_or_else(|| eyre::eyre!("stopped"))?;
    assert_eq!(first.status, LeaderboardStatus::Live);
    assert_eq!(first.revision, 1);

    let last = sync.changed().await.ok_or_else(|| eyre::eyre!("stopped"))?;
    assert_eq!(last.status, LeaderboardStatus::Final);
    assert_eq!(last.status.label(), "Final results");
    assert_eq!(last.revision, 1);
    assert_eq!(last.load_state, LoadState::Ready);
    assert_eq!(last.rows, first.rows);
    assert!(last.animations.is_empty());

    assert!(sync.changed().await.is_none());
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert!(sync.is_finished());
    assert_eq!(api.leaderboard_calls(), 2);
    assert_eq!(sync.snapshot().status, LeaderboardStatus::Final);
    Ok(())
}
