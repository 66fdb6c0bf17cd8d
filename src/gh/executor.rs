//! Thin wrappers around the `gh` CLI for the two things it already knows: the current
//! repository and the stored auth token.

use color_eyre::eyre::{eyre, Result};
use std::time::Duration;
use tokio::process::Command;

use super::repo::DEFAULT_HOST;

const GH_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn run_gh(args: &[&str]) -> Result<String> {
    let start = std::time::Instant::now();
    let output = tokio::time::timeout(GH_TIMEOUT, Command::new("gh").args(args).output())
        .await
        .map_err(|_| eyre!("gh command timed out after {}s", GH_TIMEOUT.as_secs()))?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                eyre!("gh CLI not found. Install it from https://cli.github.com/ or pass --repo and set GH_TOKEN")
            } else {
                eyre!("Failed to run gh: {}", e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(eyre!("{}", classify_gh_error(&stderr)));
    }

    tracing::debug!(
        args = ?args,
        elapsed_ms = start.elapsed().as_millis(),
        "gh command completed"
    );
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Repository of the current directory as `OWNER/REPO`.
pub async fn detect_repo() -> Result<String> {
    let output = run_gh(&[
        "repo",
        "view",
        "--json",
        "nameWithOwner",
        "-q",
        ".nameWithOwner",
    ])
    .await?;
    let repo = output.trim().to_string();
    if repo.is_empty() {
        return Err(eyre!("Could not detect repository. Use --repo flag."));
    }
    Ok(repo)
}

/// Token for `host`: environment first, then whatever `gh auth login` stored.
pub async fn resolve_token(host: &str) -> Result<String> {
    if let Some(token) = token_from_env(host, |key| std::env::var(key).ok()) {
        return Ok(token);
    }
    let token = run_gh(&["auth", "token", "--hostname", host]).await?;
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(eyre!(
            "No auth token for {host}. Run `gh auth login` or set GH_TOKEN."
        ));
    }
    Ok(token)
}

pub fn token_from_env(host: &str, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    let keys: &[&str] = if host.eq_ignore_ascii_case(DEFAULT_HOST) {
        &["GH_TOKEN", "GITHUB_TOKEN"]
    } else {
        &["GH_ENTERPRISE_TOKEN", "GITHUB_ENTERPRISE_TOKEN"]
    };
    keys.iter()
        .filter_map(|key| lookup(key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

pub fn classify_gh_error(stderr: &str) -> String {
    if stderr.contains("not logged") || stderr.contains("auth login") {
        "Not authenticated with gh. Run `gh auth login` first.".to_string()
    } else if stderr.contains("not a git repository") || stderr.contains("could not determine") {
        "Not in a GitHub repository. Use --repo flag or cd into a repo.".to_string()
    } else {
        let trimmed = stderr.trim();
        if trimmed.is_empty() {
            "gh command failed".to_string()
        } else {
            format!("gh command failed: {trimmed}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn classify_not_logged_in() {
        let msg = classify_gh_error("You are not logged into any GitHub hosts");
        assert!(msg.contains("Not authenticated"));
    }

    #[test]
    fn classify_not_a_git_repo() {
        let msg = classify_gh_error("fatal: not a git repository (or any parent)");
        assert!(msg.contains("Not in a GitHub repository"));
    }

    #[test]
    fn classify_generic_and_empty() {
        assert_eq!(
            classify_gh_error("something went wrong"),
            "gh command failed: something went wrong"
        );
        assert_eq!(classify_gh_error("  \n "), "gh command failed");
    }

    #[test]
    fn gh_token_preferred_over_github_token() {
        let lookup = env(&[("GH_TOKEN", "a"), ("GITHUB_TOKEN", "b")]);
        assert_eq!(token_from_env("github.com", lookup), Some("a".to_string()));
    }

    #[test]
    fn blank_token_is_skipped() {
        let lookup = env(&[("GH_TOKEN", "  "), ("GITHUB_TOKEN", "b")]);
        assert_eq!(token_from_env("github.com", lookup), Some("b".to_string()));
    }

    #[test]
    fn enterprise_host_uses_enterprise_vars() {
        let lookup = env(&[("GH_TOKEN", "a"), ("GH_ENTERPRISE_TOKEN", "e")]);
        assert_eq!(token_from_env("ghe.corp", lookup), Some("e".to_string()));
    }

    #[test]
    fn no_token_in_env() {
        assert_eq!(token_from_env("github.com", env(&[])), None);
    }
}
