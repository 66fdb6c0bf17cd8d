use crate::gh::repo::{RepoSpec, DEFAULT_HOST};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_NUMBER"));

#[derive(Parser, Debug)]
#[command(
    name = "gh-dispatch",
    version = VERSION,
    about = "Send a GitHub dispatch event and watch the resulting Actions run"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Repository in [HOST/]OWNER/REPO format (auto-detected from cwd)
    #[arg(short = 'R', long, global = true, value_parser = parse_repo)]
    pub repo: Option<String>,

    /// Seconds between status refreshes
    #[arg(long, global = true, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// How many times to look for the dispatched run before giving up
    #[arg(long, global = true, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    /// Seconds between attempts to find the dispatched run
    #[arg(long, global = true, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
    pub resolve_interval: u64,

    /// Enable verbose logging to $XDG_STATE_HOME/ghd/debug.log
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a repository_dispatch event
    Repository(RepositoryArgs),
    /// Send a workflow_dispatch event
    Workflow(WorkflowArgs),
}

#[derive(Args, Debug)]
pub struct RepositoryArgs {
    /// Event type the workflow listens for
    #[arg(short, long)]
    pub event_type: String,

    /// JSON object passed to the workflow as github.event.client_payload
    #[arg(short = 'p', long, value_parser = parse_json)]
    pub client_payload: Value,

    /// Display name of the workflow to watch
    #[arg(short, long)]
    pub workflow: String,
}

#[derive(Args, Debug)]
pub struct WorkflowArgs {
    /// JSON object of workflow inputs
    #[arg(short, long, value_parser = parse_json)]
    pub inputs: Value,

    /// Workflow file name or numeric id
    #[arg(short, long)]
    pub workflow: String,

    /// Branch or tag to run the workflow on
    #[arg(short = 'f', long = "ref", default_value = "main")]
    pub git_ref: String,
}

/// Rejects anything `RepoSpec::parse` would; the host is resolved later in `main`.
fn parse_repo(repo: &str) -> Result<String, String> {
    RepoSpec::parse(repo, DEFAULT_HOST)
        .map(|_| repo.to_string())
        .map_err(|e| e.to_string())
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_repo_format() {
        assert_eq!(parse_repo("cli/cli").unwrap(), "cli/cli");
        assert!(parse_repo("ghe.example.com/owner/repo").is_ok());
    }

    #[test]
    fn invalid_repo_format_uses_repo_spec_message() {
        for bad in ["noslash", "a/b/c/d", "/repo", "owner/", "owner /repo", ""] {
            let err = parse_repo(bad).unwrap_err();
            assert!(err.starts_with("Invalid repository"), "{bad}: {err}");
        }
    }

    #[test]
    fn json_arguments() {
        assert_eq!(parse_json(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
        assert!(parse_json("{").unwrap_err().starts_with("invalid JSON"));
    }

    #[test]
    fn repository_subcommand() {
        let cli = Cli::try_parse_from([
            "gh-dispatch",
            "repository",
            "--event-type",
            "deploy",
            "--client-payload",
            r#"{"env":"prod"}"#,
            "--workflow",
            "Deploy",
            "-R",
            "OWNER/REPO",
        ])
        .unwrap();
        assert_eq!(cli.repo.as_deref(), Some("OWNER/REPO"));
        assert_eq!(cli.interval, 2);
        assert_eq!(cli.max_attempts, 30);
        match cli.command {
            Command::Repository(args) => {
                assert_eq!(args.event_type, "deploy");
                assert_eq!(args.client_payload, json!({"env": "prod"}));
                assert_eq!(args.workflow, "Deploy");
            }
            Command::Workflow(_) => panic!("expected repository subcommand"),
        }
    }

    #[test]
    fn workflow_subcommand_defaults_ref() {
        let cli = Cli::try_parse_from([
            "gh-dispatch",
            "workflow",
            "-i",
            "{}",
            "-w",
            "ci.yml",
            "--interval",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.interval, 5);
        match cli.command {
            Command::Workflow(args) => {
                assert_eq!(args.git_ref, "main");
                assert_eq!(args.workflow, "ci.yml");
                assert_eq!(args.inputs, json!({}));
            }
            Command::Repository(_) => panic!("expected workflow subcommand"),
        }
    }

    #[test]
    fn rejects_bad_payload_and_interval() {
        assert!(Cli::try_parse_from([
            "gh-dispatch", "repository", "-e", "x", "-p", "{", "-w", "foo"
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "gh-dispatch", "workflow", "-i", "{}", "-w", "ci.yml", "--interval", "0"
        ])
        .is_err());
    }
}
