use color_eyre::eyre::{eyre, Result};
use std::fmt;

pub const DEFAULT_HOST: &str = "github.com";

/// A repository in `[HOST/]OWNER/REPO` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl RepoSpec {
    pub fn parse(input: &str, default_host: &str) -> Result<Self> {
        let parts: Vec<&str> = input.trim().split('/').collect();
        if parts.iter().any(|p| p.is_empty() || p.contains(char::is_whitespace)) {
            return Err(invalid(input));
        }
        match parts.as_slice() {
            [owner, name] => Ok(Self {
                host: default_host.to_string(),
                owner: (*owner).to_string(),
                name: (*name).to_string(),
            }),
            [host, owner, name] => Ok(Self {
                host: (*host).to_string(),
                owner: (*owner).to_string(),
                name: (*name).to_string(),
            }),
            _ => Err(invalid(input)),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// REST root for this host, always ending in `/`.
    pub fn api_base(&self) -> String {
        if self.host.eq_ignore_ascii_case(DEFAULT_HOST) {
            "https://api.github.com/".to_string()
        } else {
            format!("https://{}/api/v3/", self.host)
        }
    }

    pub fn run_url(&self, run_id: u64) -> String {
        format!(
            "https://{}/{}/{}/actions/runs/{run_id}",
            self.host, self.owner, self.name
        )
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// `GH_HOST` wins over github.com, matching how the gh CLI picks a host.
pub fn default_host() -> String {
    std::env::var("GH_HOST")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_HOST.to_string())
}

fn invalid(input: &str) -> color_eyre::eyre::Report {
    eyre!("Invalid repository '{input}'. Expected [HOST/]OWNER/REPO (e.g. 'cli/cli').")
}
