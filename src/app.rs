//! Run data model shared by the resolver, the snapshot fetcher and the renderer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::gh::repo::RepoSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    InProgress,
    Queued,
    Requested,
    Waiting,
    Pending,
    #[default]
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::InProgress => "in_progress",
            RunStatus::Queued => "queued",
            RunStatus::Requested => "requested",
            RunStatus::Waiting => "waiting",
            RunStatus::Pending => "pending",
            RunStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    StartupFailure,
    Stale,
    Neutral,
    #[serde(other)]
    Unknown,
}

impl Conclusion {
    pub fn as_str(self) -> &'static str {
        match self {
            Conclusion::Success => "success",
            Conclusion::Failure => "failure",
            Conclusion::Cancelled => "cancelled",
            Conclusion::Skipped => "skipped",
            Conclusion::TimedOut => "timed_out",
            Conclusion::ActionRequired => "action_required",
            Conclusion::StartupFailure => "startup_failure",
            Conclusion::Stale => "stale",
            Conclusion::Neutral => "neutral",
            Conclusion::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The event that triggered a run. Only the two dispatch events can be sent by this tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RepositoryDispatch,
    WorkflowDispatch,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::RepositoryDispatch => "repository_dispatch",
            EventKind::WorkflowDispatch => "workflow_dispatch",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GitHub sends `null` for several fields it documents as strings; treat it like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub workflow_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
    /// Raw event string; runs can be triggered by events this tool never sends.
    #[serde(default, deserialize_with = "null_as_default")]
    pub event: String,
}

impl WorkflowRun {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn succeeded(&self) -> bool {
        self.is_completed() && self.conclusion == Some(Conclusion::Success)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub name: String,
    pub number: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationLevel {
    Failure,
    Warning,
    Notice,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A check-run annotation. `job_id` and `job_name` are filled in by the fetcher,
/// the API only returns them implicitly through the request path.
#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    #[serde(skip)]
    pub job_id: u64,
    #[serde(skip)]
    pub job_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(
        rename = "annotation_level",
        default,
        deserialize_with = "null_as_default"
    )]
    pub level: AnnotationLevel,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_line: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
}

/// Everything needed to pick out the run a dispatch created. Built once per invocation.
#[derive(Debug, Clone)]
pub struct TriggerContext {
    pub event: EventKind,
    pub workflow_id: u64,
    pub actor: String,
    pub repo: RepoSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunHandle {
    pub id: u64,
}

/// Most recently fetched state of one run. Rebuilt from scratch on every poll.
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    pub run: WorkflowRun,
    pub jobs: Vec<Job>,
    pub annotations: Vec<Annotation>,
}

impl RunSnapshot {
    pub fn is_completed(&self) -> bool {
        self.run.is_completed()
    }
}
