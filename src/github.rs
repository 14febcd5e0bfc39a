//! GitHub REST API integration
//!
//! Implements [`IssueSource`] for a single repository, plus helpers for
//! working out which repository to analyze.

use crate::config::Config;
use crate::context::IssueSource;
use crate::issue::{CodeMatch, CommentSnapshot, RawIssue};
use anyhow::{Context, Result};
use async_trait::async_trait;
use git2::Repository;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const USER_AGENT: &str = "mozi";
const API_VERSION: &str = "2022-11-28";
const PER_PAGE: usize = 100;

/// Maximum length for error body content in error messages
const MAX_ERROR_BODY_LEN: usize = 200;

// ============================================================================
// Repository references
// ============================================================================

/// An `owner/repo` pair on github.com.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    pub fn issue_url(&self, number: u64) -> String {
        format!(
            "https://github.com/{}/{}/issues/{}",
            self.owner, self.repo, number
        )
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

fn split_owner_repo(path: &str) -> Option<RepoRef> {
    let path = path.trim_end_matches('/').trim_end_matches(".git");
    let mut parts = path.splitn(3, '/');
    let owner = parts.next()?.trim();
    let repo = parts.next()?.trim();
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some(RepoRef::new(owner, repo))
}

/// Extract owner and repo from a git remote URL.
///
/// Supports:
/// - git@github.com:owner/repo.git
/// - https://github.com/owner/repo.git
/// - https://github.com/owner/repo
pub fn parse_remote_url(url: &str) -> Option<RepoRef> {
    // SSH format: git@github.com:owner/repo.git
    if let Some(rest) = url.strip_prefix("git@github.com:") {
        return split_owner_repo(rest);
    }

    // HTTPS format: https://github.com/owner/repo.git
    if url.contains("github.com") {
        if let Ok(parsed) = url::Url::parse(url) {
            if parsed.host_str() != Some("github.com") {
                return None;
            }
            return split_owner_repo(parsed.path().trim_start_matches('/'));
        }

        // Fallback: simple string parsing for URLs without scheme
        let path = url
            .split("github.com")
            .nth(1)?
            .trim_start_matches(['/', ':']);
        return split_owner_repo(path);
    }

    None
}

/// Parse a repository argument: `owner/repo` or any GitHub URL form.
pub fn parse_repo_reference(input: &str) -> Option<RepoRef> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if input.contains("github.com") {
        return parse_remote_url(input);
    }
    if input.contains(':') || input.matches('/').count() != 1 {
        return None;
    }
    split_owner_repo(input)
}

/// Get the owner and repo from the repository's origin remote.
pub fn get_remote_info(repo_path: &Path) -> Result<RepoRef> {
    let repo = Repository::discover(repo_path).context("Failed to open repository")?;

    // Try common remote names in order
    for remote_name in ["origin", "upstream", "github"] {
        if let Ok(remote) = repo.find_remote(remote_name) {
            if let Some(found) = remote.url().and_then(parse_remote_url) {
                return Ok(found);
            }
        }
    }

    // Try first available remote
    if let Ok(remotes) = repo.remotes() {
        for name in remotes.iter().flatten() {
            if let Ok(remote) = repo.find_remote(name) {
                if let Some(found) = remote.url().and_then(parse_remote_url) {
                    return Ok(found);
                }
            }
        }
    }

    Err(anyhow::anyhow!(
        "No GitHub remote found. Pass owner/repo or a github.com URL explicitly"
    ))
}

// ============================================================================
// Error handling
// ============================================================================

/// Sanitize an API error body to prevent credential leakage.
/// Truncates long responses and redacts potential secrets.
pub fn sanitize_error_body(body: &str) -> String {
    // Patterns that might indicate secrets in error responses
    const SECRET_PATTERNS: &[&str] = &[
        "token",
        "secret",
        "password",
        "credential",
        "bearer",
        "ghp_",        // GitHub personal access token prefix
        "gho_",        // GitHub OAuth token prefix
        "ghu_",        // GitHub user token prefix
        "github_pat_", // GitHub PAT prefix
    ];

    let truncated = if body.chars().count() > MAX_ERROR_BODY_LEN {
        format!(
            "{}... (truncated)",
            crate::util::truncate_chars(body, MAX_ERROR_BODY_LEN)
        )
    } else {
        body.to_string()
    };

    let lower = truncated.to_lowercase();
    if SECRET_PATTERNS.iter().any(|p| lower.contains(p)) {
        return "(error details redacted - may contain sensitive data)".to_string();
    }

    truncated
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Turn a non-success response body into a readable message.
fn api_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(body) {
        let detail = api_error
            .errors
            .first()
            .and_then(|e| e.message.clone())
            .unwrap_or_default();

        return if detail.is_empty() {
            format!("GitHub API error ({}): {}", status, api_error.message)
        } else {
            format!(
                "GitHub API error ({}): {}: {}",
                status, api_error.message, detail
            )
        };
    }

    format!(
        "GitHub API error ({}): {}",
        status,
        sanitize_error_body(body)
    )
}

async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(anyhow::anyhow!("{}", api_error_message(status, &body)))
}

// ============================================================================
// Client
// ============================================================================

/// A page shorter than `PER_PAGE` (including an empty one) is the last.
fn is_last_page(count: usize) -> bool {
    count < PER_PAGE
}

/// The issues endpoint also lists pull requests; drop them unless asked not to.
fn retain_issues(issues: Vec<RawIssue>, include_pull_requests: bool) -> Vec<RawIssue> {
    if include_pull_requests {
        return issues;
    }
    issues.into_iter().filter(|i| !i.is_pull_request()).collect()
}

/// Directories come back as a JSON listing even with the raw media type.
fn is_directory_listing(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.starts_with("application/json"))
}

#[derive(Deserialize)]
struct SearchCodeResponse {
    #[serde(default)]
    items: Vec<SearchCodeItem>,
}

#[derive(Deserialize)]
struct SearchCodeItem {
    path: String,
    html_url: String,
}

/// Read-only GitHub client scoped to one repository.
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: url::Url,
    token: String,
    repo: RepoRef,
    include_pull_requests: bool,
}

impl GitHubClient {
    pub fn new(repo: RepoRef, token: String, config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = url::Url::parse(&config.api_base_url)
            .with_context(|| format!("Invalid API base URL: {}", config.api_base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot be a base: {}", config.api_base_url);
        }

        Ok(Self {
            http,
            base_url,
            token,
            repo,
            include_pull_requests: config.include_pull_requests,
        })
    }

    /// Build an API URL from path segments, percent-encoding each one.
    fn endpoint<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> url::Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    fn repo_endpoint<'s>(&'s self, rest: impl IntoIterator<Item = &'s str>) -> url::Url {
        let mut segments = vec!["repos", self.repo.owner.as_str(), self.repo.repo.as_str()];
        segments.extend(rest);
        self.endpoint(segments)
    }

    fn get(&self, url: url::Url) -> RequestBuilder {
        self.get_as(url, "application/vnd.github+json")
    }

    fn get_as(&self, url: url::Url, accept: &str) -> RequestBuilder {
        self.http
            .get(url)
            .header("Accept", accept)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Follow `page=N` until a short or empty page.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        url: url::Url,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut all = Vec::new();
        let per_page = PER_PAGE.to_string();
        let mut page = 1usize;

        loop {
            let page_str = page.to_string();
            let resp = self
                .get(url.clone())
                .query(query)
                .query(&[("per_page", per_page.as_str()), ("page", page_str.as_str())])
                .send()
                .await
                .with_context(|| format!("Failed to request {}", url.path()))?;
            let items: Vec<T> = ensure_success(resp)
                .await?
                .json()
                .await
                .with_context(|| format!("Failed to parse response from {}", url.path()))?;

            let count = items.len();
            all.extend(items);
            debug!(path = url.path(), page, count, total = all.len(), "Fetched page");

            if is_last_page(count) {
                break;
            }
            page += 1;
        }

        Ok(all)
    }
}

#[async_trait]
impl IssueSource for GitHubClient {
    async fn fetch_open_issues(&self) -> Result<Vec<RawIssue>> {
        let issues: Vec<RawIssue> = self
            .get_paginated(
                self.repo_endpoint(["issues"]),
                &[("state", "open"), ("sort", "created"), ("direction", "desc")],
            )
            .await
            .with_context(|| format!("Failed to fetch issues for {}", self.repo))?;

        let total = issues.len();
        let issues = retain_issues(issues, self.include_pull_requests);
        info!(repo = %self.repo, total, issues = issues.len(), "Fetched open issues");
        Ok(issues)
    }

    async fn fetch_comments(&self, issue_number: u64) -> Result<Vec<CommentSnapshot>> {
        let number = issue_number.to_string();
        self.get_paginated(
            self.repo_endpoint(["issues", number.as_str(), "comments"]),
            &[],
        )
        .await
        .with_context(|| format!("Failed to fetch comments for issue #{}", issue_number))
    }

    async fn fetch_file_content(&self, path: &str) -> Result<Option<String>> {
        let mut segments = vec!["contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));

        let resp = self
            .get_as(self.repo_endpoint(segments), "application/vnd.github.raw+json")
            .send()
            .await
            .with_context(|| format!("Failed to request file {}", path))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = ensure_success(resp).await?;

        let content_type = resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        if is_directory_listing(content_type) {
            return Ok(None);
        }

        let content = resp
            .text()
            .await
            .with_context(|| format!("Failed to read file {}", path))?;
        Ok(Some(content))
    }

    async fn search_code(&self, keyword: &str) -> Result<Vec<CodeMatch>> {
        let query = format!("{} repo:{}", keyword, self.repo);
        let resp = self
            .get(self.endpoint(["search", "code"]))
            .query(&[("q", query.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to search code for \"{}\"", keyword))?;

        let found: SearchCodeResponse = ensure_success(resp)
            .await?
            .json()
            .await
            .context("Failed to parse code search response")?;

        Ok(found
            .items
            .into_iter()
            .map(|item| CodeMatch {
                path: item.path,
                url: item.html_url,
            })
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
