//! Remote URL parsing and per-repository hosting configuration.
//!
//! Both `git@host:org/repo.git` and `https://host/org/repo.git` style URLs
//! describe the same repository; they are normalized to a host plus an
//! `owner/name` path so the API endpoint can be derived from either.

use crate::errors::{BuddyError, Result};
use git2::{ConfigLevel, ErrorCode, Repository};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use url::Url;

/// Git config key holding the hosting API token
pub const TOKEN_CONFIG_KEY: &str = "pr-buddy.github-api-token";

pub const DEFAULT_REMOTE: &str = "origin";

const PUBLIC_HOST: &str = "github.com";
const PUBLIC_API_URL: &str = "https://api.github.com";

/// Host and repository path of a remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteDescriptor {
    pub host: String,
    pub path: String,
}

impl RemoteDescriptor {
    /// Base URL of the hosting API for this remote.
    ///
    /// The public host has a dedicated API domain; self-hosted instances
    /// serve it under `/api` on the same host.
    pub fn api_base_url(&self) -> String {
        if self.host == PUBLIC_HOST {
            PUBLIC_API_URL.to_string()
        } else {
            format!("https://{}/api", self.host)
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.path.split_once('/').map(|(owner, _)| owner)
    }

    pub fn name(&self) -> &str {
        self.path
            .rsplit_once('/')
            .map_or(self.path.as_str(), |(_, name)| name)
    }
}

impl fmt::Display for RemoteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.host, self.path)
    }
}

/// Parse a remote URL in SCP-like (`user@host:path`) or URL
/// (`ssh://`, `git://`, `http(s)://`) form.
pub fn parse_remote_url(raw: &str) -> Result<RemoteDescriptor> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(BuddyError::config_parse("Remote URL is empty"));
    }

    let (host, path) = if raw.contains("://") {
        parse_url_form(raw)?
    } else {
        parse_scp_form(raw)?
    };

    let path = normalize_path(&path);
    if host.is_empty() || path.is_empty() {
        return Err(BuddyError::config_parse(format!(
            "Could not parse remote URL '{raw}'"
        )));
    }

    Ok(RemoteDescriptor { host, path })
}

fn parse_url_form(raw: &str) -> Result<(String, String)> {
    let url = Url::parse(raw).map_err(|e| {
        BuddyError::config_parse(format!("Could not parse remote URL '{raw}': {e}"))
    })?;

    match url.scheme() {
        "ssh" | "git" | "http" | "https" | "git+ssh" | "ssh+git" => {}
        other => {
            return Err(BuddyError::config_parse(format!(
                "Unsupported remote URL scheme '{other}' in '{raw}'"
            )))
        }
    }

    let host = url
        .host_str()
        .ok_or_else(|| BuddyError::config_parse(format!("Remote URL '{raw}' has no host")))?;
    let host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    Ok((host, url.path().to_string()))
}

fn parse_scp_form(raw: &str) -> Result<(String, String)> {
    let not_remote = || BuddyError::config_parse(format!("Could not parse remote URL '{raw}'"));

    let (user_host, path) = raw.split_once(':').ok_or_else(not_remote)?;
    // A slash before the first colon means a local path, not host:path
    if user_host.contains('/') || user_host.contains('\\') {
        return Err(not_remote());
    }

    let host = user_host
        .rsplit_once('@')
        .map_or(user_host, |(_, host)| host);
    Ok((host.to_string(), path.to_string()))
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/').trim_end_matches('/');
    trimmed
        .strip_suffix(".git")
        .unwrap_or(trimmed)
        .to_string()
}

/// Hosting details read from a repository's git configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub remote_name: String,
    pub remote_url: String,
    pub remote: RemoteDescriptor,
    pub api_token: Option<String>,
}

impl RepositoryConfig {
    /// The API token, or a [`BuddyError::MissingToken`] naming the config key
    pub fn require_token(&self) -> Result<&str> {
        self.api_token.as_deref().ok_or_else(|| {
            BuddyError::missing_token(format!(
                "set one with `git config {TOKEN_CONFIG_KEY} <token>`"
            ))
        })
    }
}

/// Read the remote and API token from the repository-local git config.
pub fn read_repository_config(repo_path: &Path, remote_name: &str) -> Result<RepositoryConfig> {
    let config = open_local_config(repo_path)?;

    let remote_url = config
        .get_string(&format!("remote.{remote_name}.url"))
        .map_err(|e| {
            BuddyError::config_parse(format!(
                "Could not read url of remote '{remote_name}' in {}: {}",
                repo_path.display(),
                e.message()
            ))
        })?;
    let remote = parse_remote_url(&remote_url)?;
    let api_token = read_token(&config)?;

    Ok(RepositoryConfig {
        remote_name: remote_name.to_string(),
        remote_url,
        remote,
        api_token,
    })
}

/// Read just the `origin` remote of a repository
pub fn read_remote(repo_path: &Path) -> Result<RemoteDescriptor> {
    read_repository_config(repo_path, DEFAULT_REMOTE).map(|config| config.remote)
}

/// Read just the API token of a repository
pub fn read_api_token(repo_path: &Path) -> Result<Option<String>> {
    read_token(&open_local_config(repo_path)?)
}

fn open_local_config(repo_path: &Path) -> Result<git2::Config> {
    let repo = Repository::open(repo_path).map_err(|e| {
        BuddyError::config_parse(format!(
            "{} is not a git repository: {}",
            repo_path.display(),
            e.message()
        ))
    })?;
    Ok(repo.config()?.open_level(ConfigLevel::Local)?)
}

fn read_token(config: &git2::Config) -> Result<Option<String>> {
    match config.get_string(TOKEN_CONFIG_KEY) {
        Ok(token) if token.trim().is_empty() => Ok(None),
        Ok(token) => Ok(Some(token.trim().to_string())),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
