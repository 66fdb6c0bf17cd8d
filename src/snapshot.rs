//! Fetches one consistent view of a run: metadata, jobs, and per-job annotations.

use crate::app::{Annotation, Job, RunHandle, RunSnapshot, RunStatus, WorkflowRun};
use crate::gh::client::CiApi;
use crate::gh::parser;
use crate::gh::repo::RepoSpec;
use color_eyre::eyre::{Result, WrapErr};
use std::collections::HashMap;

const JOBS_PAGE_SIZE: usize = 100;

/// Annotations of completed jobs, keyed by job id.
///
/// Annotations are only final once a job has completed; queued and in-progress jobs are
/// re-fetched every poll. An entry is never replaced once written.
#[derive(Debug, Default)]
pub struct AnnotationCache {
    entries: HashMap<u64, Vec<Annotation>>,
}

impl AnnotationCache {
    pub fn get(&self, job_id: u64) -> Option<&[Annotation]> {
        self.entries.get(&job_id).map(Vec::as_slice)
    }

    /// Stores `annotations` for `job` if it has completed and is not cached yet.
    /// Returns whether the entry was written.
    pub fn store(&mut self, job: &Job, annotations: &[Annotation]) -> bool {
        if job.status != RunStatus::Completed || self.entries.contains_key(&job.id) {
            return false;
        }
        self.entries.insert(job.id, annotations.to_vec());
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub async fn get_run(api: &dyn CiApi, repo: &RepoSpec, run_id: u64) -> Result<WorkflowRun> {
    let path = format!("repos/{}/actions/runs/{run_id}", repo.full_name());
    parser::parse_run(api.get(&path, &[]).await?)
}

/// All jobs of the run's latest attempt, following pagination for large matrices.
pub async fn get_jobs(api: &dyn CiApi, repo: &RepoSpec, run_id: u64) -> Result<Vec<Job>> {
    let path = format!("repos/{}/actions/runs/{run_id}/jobs", repo.full_name());
    let mut jobs = Vec::new();

    for page in 1u32.. {
        let query = [
            ("per_page", JOBS_PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ];
        let listing = parser::parse_jobs(api.get(&path, &query).await?)?;
        let fetched = listing.jobs.len();
        jobs.extend(listing.jobs);
        if fetched < JOBS_PAGE_SIZE || jobs.len() as u64 >= listing.total_count {
            break;
        }
    }
    Ok(jobs)
}

pub async fn get_annotations(api: &dyn CiApi, repo: &RepoSpec, job: &Job) -> Result<Vec<Annotation>> {
    let path = format!("repos/{}/check-runs/{}/annotations", repo.full_name(), job.id);
    parser::parse_annotations(api.get(&path, &[]).await?, job)
}

/// Any failure, including a single annotation request, fails the whole snapshot so a
/// half-populated view is never rendered.
pub async fn fetch_snapshot(
    api: &dyn CiApi,
    repo: &RepoSpec,
    handle: RunHandle,
    cache: &mut AnnotationCache,
) -> Result<RunSnapshot> {
    let run = get_run(api, repo, handle.id)
        .await
        .wrap_err("failed to get run")?;
    let jobs = get_jobs(api, repo, run.id)
        .await
        .wrap_err("failed to get jobs")?;

    let mut annotations = Vec::new();
    for job in &jobs {
        if let Some(cached) = cache.get(job.id) {
            tracing::trace!(job_id = job.id, "annotation cache hit");
            annotations.extend_from_slice(cached);
            continue;
        }
        let fetched = get_annotations(api, repo, job)
            .await
            .wrap_err("failed to get annotations")?;
        cache.store(job, &fetched);
        annotations.extend(fetched);
    }

    tracing::debug!(
        run_id = run.id,
        status = run.status.as_str(),
        jobs = jobs.len(),
        annotations = annotations.len(),
        "snapshot fetched"
    );
    Ok(RunSnapshot {
        run,
        jobs,
        annotations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AnnotationLevel;

    fn job(id: u64, status: RunStatus) -> Job {
        Job {
            id,
            name: format!("job-{id}"),
            status,
            conclusion: None,
            started_at: None,
            completed_at: None,
            steps: Vec::new(),
        }
    }

    fn annotation(job_id: u64, message: &str) -> Annotation {
        Annotation {
            job_id,
            job_name: format!("job-{job_id}"),
            message: message.to_string(),
            level: AnnotationLevel::Warning,
            path: ".github".to_string(),
            start_line: 1,
        }
    }

    #[test]
    fn in_progress_job_is_not_cached() {
        let mut cache = AnnotationCache::default();
        assert!(!cache.store(&job(1, RunStatus::InProgress), &[annotation(1, "a")]));
        assert!(cache.get(1).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn completed_job_is_cached_once() {
        let mut cache = AnnotationCache::default();
        assert!(cache.store(&job(1, RunStatus::Completed), &[annotation(1, "first")]));
        assert!(!cache.store(&job(1, RunStatus::Completed), &[annotation(1, "second")]));
        let cached = cache.get(1).unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].message, "first");
    }

    #[test]
    fn queued_job_is_not_cached() {
        let mut cache = AnnotationCache::default();
        assert!(!cache.store(&job(2, RunStatus::Queued), &[]));
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn completed_job_without_annotations_is_cached_empty() {
        let mut cache = AnnotationCache::default();
        assert!(cache.store(&job(3, RunStatus::Completed), &[]));
        assert!(cache.get(3).is_some_and(<[Annotation]>::is_empty));
        assert_eq!(cache.len(), 1);
    }
}
