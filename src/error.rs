use thiserror::Error;

/// Failures surfaced by the REST client. None of these are retried by the client itself.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message} ({url})")]
    Http {
        status: u16,
        url: String,
        message: String,
    },

    #[error("failed to decode response from {url}: {source}")]
    MalformedResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("no in-progress {event} run found for workflow {workflow_id} after {attempts} attempts")]
    ResolutionTimeout {
        event: String,
        workflow_id: u64,
        attempts: u32,
    },

    #[error("workflow '{name}' not found in {repo}")]
    WorkflowNotFound { name: String, repo: String },

    /// The run finished unsuccessfully. Already shown on screen, so `main` exits without
    /// printing anything else.
    #[error("run {run_id} completed with '{conclusion}'")]
    RunFailed { run_id: u64, conclusion: String },
}

impl WatchError {
    pub fn is_silent(&self) -> bool {
        matches!(self, WatchError::RunFailed { .. })
    }
}

/// True when `report` carries the silent run-failed error anywhere in its chain.
pub fn is_silent(report: &color_eyre::eyre::Report) -> bool {
    report
        .chain()
        .any(|cause| cause.downcast_ref::<WatchError>().is_some_and(WatchError::is_silent))
}

/// How the process ends once the command finished or was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success,
    /// Failed, but the failure is already on screen.
    Silent,
    /// Failed; the error still has to be printed.
    Report,
    Interrupted,
}

impl Exit {
    /// `None` means Ctrl+C won the race against the command.
    pub fn from_outcome(outcome: Option<&color_eyre::eyre::Result<()>>) -> Self {
        match outcome {
            Some(Ok(())) => Exit::Success,
            Some(Err(e)) if is_silent(e) => Exit::Silent,
            Some(Err(_)) => Exit::Report,
            None => Exit::Interrupted,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Exit::Success => 0,
            Exit::Silent | Exit::Report => 1,
            Exit::Interrupted => 130,
        }
    }
}
