use crate::app::{Annotation, Job, Workflow, WorkflowRun};
use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct RunsResponse {
    workflow_runs: Vec<WorkflowRun>,
}

#[derive(Deserialize)]
pub struct JobsPage {
    #[serde(default)]
    pub total_count: u64,
    pub jobs: Vec<Job>,
}

#[derive(Deserialize)]
pub struct WorkflowsPage {
    #[serde(default)]
    pub total_count: u64,
    pub workflows: Vec<Workflow>,
}

#[derive(Deserialize)]
struct User {
    login: String,
}

pub fn parse_runs(json: Value) -> Result<Vec<WorkflowRun>> {
    let resp: RunsResponse =
        serde_json::from_value(json).wrap_err("unexpected workflow runs payload")?;
    Ok(resp.workflow_runs)
}

pub fn parse_run(json: Value) -> Result<WorkflowRun> {
    serde_json::from_value(json).wrap_err("unexpected workflow run payload")
}

pub fn parse_jobs(json: Value) -> Result<JobsPage> {
    serde_json::from_value(json).wrap_err("unexpected jobs payload")
}

/// Annotations for one job; the job identity is stamped on each entry.
pub fn parse_annotations(json: Value, job: &Job) -> Result<Vec<Annotation>> {
    let mut annotations: Vec<Annotation> =
        serde_json::from_value(json).wrap_err("unexpected annotations payload")?;
    for annotation in &mut annotations {
        annotation.job_id = job.id;
        annotation.job_name.clone_from(&job.name);
    }
    Ok(annotations)
}

pub fn parse_workflows(json: Value) -> Result<WorkflowsPage> {
    serde_json::from_value(json).wrap_err("unexpected workflows payload")
}

pub fn parse_workflow(json: Value) -> Result<Workflow> {
    serde_json::from_value(json).wrap_err("unexpected workflow payload")
}

pub fn parse_login(json: Value) -> Result<String> {
    let user: User = serde_json::from_value(json).wrap_err("unexpected user payload")?;
    Ok(user.login)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AnnotationLevel, Conclusion, RunStatus};
    use serde_json::json;

    fn job(id: u64, name: &str) -> Job {
        parse_jobs(json!({"jobs": [{"id": id, "name": name, "status": "completed", "conclusion": "success"}]}))
            .unwrap()
            .jobs
            .remove(0)
    }

    #[test]
    fn parse_runs_listing() {
        let runs = parse_runs(json!({
            "total_count": 2,
            "workflow_runs": [
                {"id": 123, "workflow_id": 456, "name": "foo", "status": "queued",
                 "conclusion": null, "event": "repository_dispatch"},
                {"id": 122, "workflow_id": 456, "name": "foo", "status": "completed",
                 "conclusion": "failure", "event": "push"}
            ]
        }))
        .unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, 123);
        assert_eq!(runs[0].workflow_id, 456);
        assert_eq!(runs[0].status, RunStatus::Queued);
        assert_eq!(runs[0].conclusion, None);
        assert_eq!(runs[0].event, "repository_dispatch");
        assert_eq!(runs[1].conclusion, Some(Conclusion::Failure));
    }

    #[test]
    fn parse_all_status_strings() {
        let statuses = [
            ("completed", RunStatus::Completed),
            ("in_progress", RunStatus::InProgress),
            ("queued", RunStatus::Queued),
            ("requested", RunStatus::Requested),
            ("waiting", RunStatus::Waiting),
            ("pending", RunStatus::Pending),
            ("something_new", RunStatus::Unknown),
        ];
        for (s, expected) in &statuses {
            let run = parse_run(json!({"id": 1, "status": s, "conclusion": null})).unwrap();
            assert_eq!(run.status, *expected, "status string: {s}");
        }
    }

    #[test]
    fn parse_all_conclusion_strings() {
        let conclusions = [
            ("success", Conclusion::Success),
            ("failure", Conclusion::Failure),
            ("cancelled", Conclusion::Cancelled),
            ("skipped", Conclusion::Skipped),
            ("timed_out", Conclusion::TimedOut),
            ("action_required", Conclusion::ActionRequired),
            ("startup_failure", Conclusion::StartupFailure),
            ("stale", Conclusion::Stale),
            ("neutral", Conclusion::Neutral),
            ("brand_new_thing", Conclusion::Unknown),
        ];
        for (s, expected) in &conclusions {
            let run = parse_run(json!({"id": 1, "status": "completed", "conclusion": s})).unwrap();
            assert_eq!(run.conclusion, Some(*expected), "conclusion string: {s}");
        }
    }

    #[test]
    fn parse_run_without_status_is_unknown() {
        let run = parse_run(json!({"id": 123, "workflow_id": 456, "event": "repository_dispatch"}))
            .unwrap();
        assert_eq!(run.status, RunStatus::Unknown);
        assert!(!run.is_completed());
    }

    #[test]
    fn parse_runs_missing_wrapper_error() {
        assert!(parse_runs(json!([{"id": 1}])).is_err());
    }

    #[test]
    fn parse_jobs_with_steps_and_offsets() {
        let jobs = parse_jobs(json!({"total_count": 1, "jobs": [{
            "id": 399_444_496,
            "name": "build",
            "status": "completed",
            "conclusion": "success",
            "started_at": "2020-01-20T17:42:40Z",
            "completed_at": "2020-01-20T17:44:39Z",
            "steps": [
                {"name": "Run actions/checkout@v2", "status": "completed", "conclusion": "success",
                 "number": 2, "started_at": "2020-01-20T09:42:41.000-08:00",
                 "completed_at": "2020-01-20T09:42:45.000-08:00"},
                {"name": "Test", "status": "in_progress", "conclusion": null, "number": 3}
            ]
        }]}))
        .unwrap();
        assert_eq!(jobs.total_count, 1);
        let jobs = jobs.jobs;
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.id, 399_444_496);
        assert_eq!(job.steps.len(), 2);
        assert_eq!(job.steps[0].number, 2);
        assert_eq!(
            job.steps[0].started_at.unwrap().to_rfc3339(),
            "2020-01-20T17:42:41+00:00"
        );
        assert_eq!(job.steps[1].status, RunStatus::InProgress);
        assert!(job.steps[1].completed_at.is_none());
    }

    #[test]
    fn parse_jobs_null_timestamps() {
        let jobs = parse_jobs(json!({"jobs": [{
            "id": 1, "name": "build", "status": "queued", "conclusion": null,
            "started_at": null, "completed_at": null, "steps": []
        }]}))
        .unwrap()
        .jobs;
        assert!(jobs[0].started_at.is_none());
        assert!(jobs[0].completed_at.is_none());
    }

    #[test]
    fn parse_annotations_stamps_job() {
        let build = job(7, "build");
        let annotations = parse_annotations(
            json!([{
                "path": ".github",
                "start_line": 1,
                "end_line": 1,
                "annotation_level": "failure",
                "title": "",
                "message": "Process completed with exit code 1."
            }]),
            &build,
        )
        .unwrap();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].job_id, 7);
        assert_eq!(annotations[0].job_name, "build");
        assert_eq!(annotations[0].level, AnnotationLevel::Failure);
        assert_eq!(annotations[0].start_line, 1);
    }

    #[test]
    fn parse_runs_with_null_fields() {
        let runs = parse_runs(json!({"workflow_runs": [
            {"id": 9, "workflow_id": null, "name": null, "status": null,
             "conclusion": null, "event": null},
            {"id": 123, "workflow_id": 456, "name": "foo", "status": "queued",
             "conclusion": null, "event": "repository_dispatch"}
        ]}))
        .unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].name, "");
        assert_eq!(runs[0].workflow_id, 0);
        assert_eq!(runs[0].status, RunStatus::Unknown);
        assert_eq!(runs[0].event, "");
        assert_eq!(runs[1].name, "foo");
    }

    #[test]
    fn parse_annotations_with_null_fields() {
        let build = job(7, "build");
        let annotations = parse_annotations(
            json!([
                {"path": null, "start_line": null, "annotation_level": null, "message": null},
                {"path": ".github", "start_line": 3, "annotation_level": "notice", "message": "ok"}
            ]),
            &build,
        )
        .unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].message, "");
        assert_eq!(annotations[0].level, AnnotationLevel::Unknown);
        assert_eq!(annotations[0].path, "");
        assert_eq!(annotations[0].start_line, 0);
        assert_eq!(annotations[1].level, AnnotationLevel::Notice);
    }

    #[test]
    fn parse_job_with_null_status() {
        let page = parse_jobs(json!({"jobs": [{"id": 1, "name": "build", "status": null, "conclusion": null}]}))
            .unwrap();
        assert_eq!(page.jobs[0].status, RunStatus::Unknown);
    }

    #[test]
    fn parse_workflows_page() {
        let page = parse_workflows(json!({
            "total_count": 1,
            "workflows": [{"id": 456, "name": "foo", "path": ".github/workflows/foo.yml"}]
        }))
        .unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.workflows[0].id, 456);
        assert_eq!(page.workflows[0].name, "foo");
    }

    #[test]
    fn parse_single_workflow_with_only_id() {
        let wf = parse_workflow(json!({"id": 456})).unwrap();
        assert_eq!(wf.id, 456);
        assert!(wf.name.is_empty());
        assert!(parse_workflow(json!({"name": "foo"})).is_err());
    }

    #[test]
    fn parse_login_from_user() {
        assert_eq!(parse_login(json!({"login": "octocat", "id": 1})).unwrap(), "octocat");
        assert!(parse_login(Value::Null).is_err());
    }
}
