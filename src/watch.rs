//! Polls a resolved run and redraws it until GitHub reports it completed.

use crate::app::{RunHandle, RunSnapshot};
use crate::error::WatchError;
use crate::gh::client::CiApi;
use crate::gh::repo::RepoSpec;
use crate::snapshot::{self, AnnotationCache};
use crate::tui::render::{self, Summary};
use crate::tui::screen::Screen;
use color_eyre::eyre::{Result, WrapErr};
use std::time::Duration;
use tokio::time;

#[derive(Debug, Clone, Copy)]
pub struct WatchConfig {
    pub interval: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
        }
    }
}

/// Fetch, draw, sleep. Exactly one fetch per redraw; the loop ends on the first
/// completed snapshot, which is drawn but not followed by a sleep.
async fn poll_until_complete(
    api: &dyn CiApi,
    repo: &RepoSpec,
    handle: RunHandle,
    config: &WatchConfig,
    screen: &mut dyn Screen,
) -> Result<RunSnapshot> {
    let header = render::refresh_header(config.interval, &repo.run_url(handle.id));
    let mut cache = AnnotationCache::default();
    let mut polls = 0u32;

    loop {
        let snapshot = snapshot::fetch_snapshot(api, repo, handle, &mut cache).await?;
        polls += 1;
        screen
            .present(&header, &render::snapshot_lines(&snapshot))
            .wrap_err("failed to draw run status")?;

        if snapshot.is_completed() {
            tracing::info!(
                run_id = handle.id,
                polls,
                cached_jobs = cache.len(),
                "run completed"
            );
            return Ok(snapshot);
        }
        time::sleep(config.interval).await;
    }
}

/// Watches `handle` to completion, then prints the summary when attached to a terminal.
///
/// A run that completes with anything but `success` yields [`WatchError::RunFailed`], which
/// `main` turns into a non-zero exit without further output.
pub async fn watch_run(
    api: &dyn CiApi,
    repo: &RepoSpec,
    handle: RunHandle,
    config: &WatchConfig,
    screen: &mut dyn Screen,
) -> Result<RunSnapshot> {
    screen.enter().wrap_err("failed to enter alternate screen")?;
    let polled = poll_until_complete(api, repo, handle, config, screen).await;
    let left = screen.leave();
    let snapshot = polled?;
    left.wrap_err("failed to leave alternate screen")?;

    if screen.is_terminal() {
        screen
            .print_summary(&Summary::from_run(&snapshot.run))
            .wrap_err("failed to print summary")?;
    }

    if !snapshot.run.succeeded() {
        return Err(WatchError::RunFailed {
            run_id: snapshot.run.id,
            conclusion: snapshot
                .run
                .conclusion
                .map_or_else(String::new, |c| c.as_str().to_string()),
        }
        .into());
    }
    Ok(snapshot)
}
