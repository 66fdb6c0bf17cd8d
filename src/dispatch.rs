//! The two dispatch commands: send the event, find the run it started, watch it.

use crate::app::{EventKind, RunSnapshot, TriggerContext};
use crate::error::WatchError;
use crate::gh::client::CiApi;
use crate::gh::parser;
use crate::gh::repo::RepoSpec;
use crate::resolver::{self, ResolverConfig};
use crate::tui::screen::Screen;
use crate::watch::{self, WatchConfig};
use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const WORKFLOWS_PAGE_SIZE: usize = 100;

/// Body of `POST /repos/{owner}/{repo}/dispatches`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryDispatchRequest {
    pub event_type: String,
    pub client_payload: Value,
}

/// Body of `POST /repos/{owner}/{repo}/actions/workflows/{workflow}/dispatches`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDispatchRequest {
    pub inputs: Value,
    #[serde(rename = "ref")]
    pub git_ref: String,
}

/// Per-invocation settings shared by both commands.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub repo: RepoSpec,
    pub watch: WatchConfig,
    pub resolver: ResolverConfig,
}

fn to_body<T: Serialize>(request: &T) -> Result<Value> {
    serde_json::to_value(request).wrap_err("failed to encode request body")
}

/// Looks a workflow up by its display name, walking the listing page by page.
pub async fn find_workflow_id(api: &dyn CiApi, repo: &RepoSpec, name: &str) -> Result<u64> {
    let path = format!("repos/{}/actions/workflows", repo.full_name());
    let mut seen = 0u64;

    for page in 1u32.. {
        let query = [
            ("per_page", WORKFLOWS_PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ];
        let listing = parser::parse_workflows(api.get(&path, &query).await?)?;
        if let Some(workflow) = listing.workflows.iter().find(|w| w.name == name) {
            tracing::debug!(workflow_id = workflow.id, page, "workflow found");
            return Ok(workflow.id);
        }
        seen += listing.workflows.len() as u64;
        if listing.workflows.len() < WORKFLOWS_PAGE_SIZE || seen >= listing.total_count {
            break;
        }
    }

    Err(WatchError::WorkflowNotFound {
        name: name.to_string(),
        repo: repo.full_name(),
    }
    .into())
}

pub async fn current_login(api: &dyn CiApi) -> Result<String> {
    parser::parse_login(api.get("user", &[]).await?)
}

async fn resolve_and_watch(
    api: &dyn CiApi,
    opts: &DispatchOptions,
    ctx: TriggerContext,
    screen: &mut dyn Screen,
) -> Result<RunSnapshot> {
    let handle = resolver::resolve(api, &ctx, &opts.resolver)
        .await
        .wrap_err("failed to find the dispatched run")?;
    watch::watch_run(api, &opts.repo, handle, &opts.watch, screen).await
}

/// Sends a `repository_dispatch` event and watches the run of `workflow_name` it triggers.
pub async fn repository_dispatch(
    api: &dyn CiApi,
    opts: &DispatchOptions,
    request: &RepositoryDispatchRequest,
    workflow_name: &str,
    screen: &mut dyn Screen,
) -> Result<RunSnapshot> {
    let path = format!("repos/{}/dispatches", opts.repo.full_name());
    api.post(&path, &to_body(request)?)
        .await
        .wrap_err("failed to send repository dispatch")?;
    tracing::info!(repo = %opts.repo, event_type = %request.event_type, "repository dispatch sent");

    let workflow_id = find_workflow_id(api, &opts.repo, workflow_name)
        .await
        .wrap_err("failed to get workflows")?;
    let actor = current_login(api)
        .await
        .wrap_err("failed to get current user")?;

    let ctx = TriggerContext {
        event: EventKind::RepositoryDispatch,
        workflow_id,
        actor,
        repo: opts.repo.clone(),
    };
    resolve_and_watch(api, opts, ctx, screen).await
}

/// Triggers `workflow` (file name or numeric id) on `request.git_ref` and watches the run.
pub async fn workflow_dispatch(
    api: &dyn CiApi,
    opts: &DispatchOptions,
    workflow: &str,
    request: &WorkflowDispatchRequest,
    screen: &mut dyn Screen,
) -> Result<RunSnapshot> {
    let base = format!("repos/{}/actions/workflows/{workflow}", opts.repo.full_name());
    api.post(&format!("{base}/dispatches"), &to_body(request)?)
        .await
        .wrap_err("failed to send workflow dispatch")?;
    tracing::info!(repo = %opts.repo, workflow, git_ref = %request.git_ref, "workflow dispatch sent");

    let resolved = parser::parse_workflow(
        api.get(&base, &[])
            .await
            .wrap_err("failed to get workflow")?,
    )?;
    let actor = current_login(api)
        .await
        .wrap_err("failed to get current user")?;

    let ctx = TriggerContext {
        event: EventKind::WorkflowDispatch,
        workflow_id: resolved.id,
        actor,
        repo: opts.repo.clone(),
    };
    resolve_and_watch(api, opts, ctx, screen).await
}
