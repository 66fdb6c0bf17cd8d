use ghd::cli::{Cli, Command};
use ghd::dispatch::{self, DispatchOptions, RepositoryDispatchRequest, WorkflowDispatchRequest};
use ghd::error::Exit;
use ghd::gh::client::GithubClient;
use ghd::gh::executor;
use ghd::gh::repo::{self, RepoSpec};
use ghd::resolver::ResolverConfig;
use ghd::tui::screen;
use ghd::watch::WatchConfig;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::LeaveAlternateScreen;
use std::io;
use std::time::Duration;

fn setup_verbose_logging() -> Result<()> {
    let state_dir = dirs_next_or_fallback();
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| eyre!("Failed to create log directory {state_dir:?}: {e}"))?;
    let log_path = state_dir.join("debug.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eyre!("Failed to open log file {log_path:?}: {e}"))?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .init();
    tracing::info!(
        "gh-dispatch v{} starting with verbose logging",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn dirs_next_or_fallback() -> std::path::PathBuf {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME") {
        std::path::PathBuf::from(state).join("ghd")
    } else if let Some(home) = std::env::var_os("HOME") {
        std::path::PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("ghd")
    } else {
        std::path::PathBuf::from("/tmp/ghd")
    }
}

async fn run(args: Cli) -> Result<()> {
    let repo_arg = match args.repo {
        Some(r) => r,
        None => executor::detect_repo().await?,
    };
    let repo = RepoSpec::parse(&repo_arg, &repo::default_host())?;

    let token = executor::resolve_token(&repo.host).await?;
    let client = GithubClient::new(repo.api_base(), Some(token))?;

    let opts = DispatchOptions {
        repo,
        watch: WatchConfig {
            interval: Duration::from_secs(args.interval),
        },
        resolver: ResolverConfig {
            max_attempts: args.max_attempts,
            poll_interval: Duration::from_secs(args.resolve_interval),
        },
    };

    let mut screen = screen::stdout_screen()?;
    match args.command {
        Command::Repository(cmd) => {
            let request = RepositoryDispatchRequest {
                event_type: cmd.event_type,
                client_payload: cmd.client_payload,
            };
            dispatch::repository_dispatch(&client, &opts, &request, &cmd.workflow, screen.as_mut())
                .await?;
        }
        Command::Workflow(cmd) => {
            let request = WorkflowDispatchRequest {
                inputs: cmd.inputs,
                git_ref: cmd.git_ref,
            };
            dispatch::workflow_dispatch(&client, &opts, &cmd.workflow, &request, screen.as_mut())
                .await?;
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    if args.verbose {
        setup_verbose_logging()?;
    }

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        original_hook(panic_info);
    }));

    // The command future owns the screen; dropping it on Ctrl+C leaves the alternate screen.
    let outcome = tokio::select! {
        result = run(args) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    let exit = Exit::from_outcome(outcome.as_ref());
    match (&outcome, exit) {
        (_, Exit::Success) => return Ok(()),
        (Some(Err(e)), Exit::Report) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
        }
        (Some(Err(e)), _) => tracing::info!("run did not succeed: {e}"),
        _ => tracing::info!("interrupted"),
    }
    std::process::exit(exit.code());
}
