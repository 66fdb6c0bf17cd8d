//! Correlates a fire-and-forget dispatch with the run it created.
//!
//! The dispatch endpoints return no run id, so the resolver polls the run listing (most
//! recent first) until a non-terminal run of the right workflow and event shows up. Two runs
//! of the same workflow dispatched by the same actor inside one polling window cannot be told
//! apart; the most recent one wins.

use crate::app::{RunHandle, TriggerContext, WorkflowRun};
use crate::error::WatchError;
use crate::gh::client::CiApi;
use crate::gh::parser;
use color_eyre::eyre::Result;
use std::time::Duration;
use tokio::time;

/// Upper bound on the listing page; GitHub caps `per_page` at 100.
pub const RUNS_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            poll_interval: Duration::from_secs(2),
        }
    }
}

pub fn is_match(run: &WorkflowRun, ctx: &TriggerContext) -> bool {
    !run.is_completed()
        && run.workflow_id == ctx.workflow_id
        && run.event == ctx.event.as_str()
}

/// First run in listing order that matches the trigger.
pub fn select_run<'a>(runs: &'a [WorkflowRun], ctx: &TriggerContext) -> Option<&'a WorkflowRun> {
    runs.iter().find(|run| is_match(run, ctx))
}

fn runs_path(ctx: &TriggerContext) -> String {
    format!(
        "repos/{}/actions/workflows/{}/runs",
        ctx.repo.full_name(),
        ctx.workflow_id
    )
}

fn runs_query(ctx: &TriggerContext) -> [(&'static str, String); 3] {
    [
        ("per_page", RUNS_PAGE_SIZE.to_string()),
        ("event", ctx.event.as_str().to_string()),
        ("actor", ctx.actor.clone()),
    ]
}

/// Polls until a matching run appears or `config.max_attempts` listings came back empty.
/// Request failures are not retried.
pub async fn resolve(
    api: &dyn CiApi,
    ctx: &TriggerContext,
    config: &ResolverConfig,
) -> Result<RunHandle> {
    let path = runs_path(ctx);
    let query = runs_query(ctx);
    let attempts = config.max_attempts.max(1);

    for attempt in 1..=attempts {
        let runs = parser::parse_runs(api.get(&path, &query).await?)?;
        if let Some(run) = select_run(&runs, ctx) {
            tracing::info!(run_id = run.id, attempt, "resolved dispatched run");
            return Ok(RunHandle { id: run.id });
        }
        tracing::debug!(attempt, listed = runs.len(), "no matching run yet");
        if attempt < attempts {
            time::sleep(config.poll_interval).await;
        }
    }

    Err(WatchError::ResolutionTimeout {
        event: ctx.event.to_string(),
        workflow_id: ctx.workflow_id,
        attempts,
    }
    .into())
}
