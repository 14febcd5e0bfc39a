//! Issue context assembly
//!
//! Turns extracted references into concrete evidence by asking an
//! [`IssueSource`] for comments, file contents and code search results.
//! Every lookup yields a [`Resolution`]; skipped items are logged and
//! dropped, so a partial failure only ever makes the context thinner.

pub mod references;

#[cfg(test)]
pub(crate) mod fake;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::issue::{
    CodeMatch, CodeReference, CommentSnapshot, FileContentRef, IssueContext, IssueSnapshot,
    MalformedIssue, RawIssue,
};
use crate::util::truncate_chars;

pub use references::{extract_code_keywords, extract_file_references};

/// Read-only view of one repository on an issue tracker.
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// All open issues, newest first.
    async fn fetch_open_issues(&self) -> Result<Vec<RawIssue>>;

    /// Comments on an issue, in tracker order.
    async fn fetch_comments(&self, issue_number: u64) -> Result<Vec<CommentSnapshot>>;

    /// File contents at the default branch, or `None` if there is no such file.
    async fn fetch_file_content(&self, path: &str) -> Result<Option<String>>;

    /// Code search hits for a keyword, scoped to the repository.
    async fn search_code(&self, keyword: &str) -> Result<Vec<CodeMatch>>;
}

/// Bounds on how much evidence is gathered per issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLimits {
    /// Characters of file content kept per related file.
    pub file_content_cap: usize,
    /// Keywords actually sent to code search.
    pub keyword_limit: usize,
    /// Matches kept per keyword.
    pub matches_per_keyword: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            file_content_cap: 5000,
            keyword_limit: 5,
            matches_per_keyword: 3,
        }
    }
}

impl From<&Config> for ContextLimits {
    fn from(config: &Config) -> Self {
        Self {
            file_content_cap: config.file_content_cap,
            keyword_limit: config.keyword_limit,
            matches_per_keyword: config.matches_per_keyword,
        }
    }
}

/// Why a candidate reference produced no evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotFound,
    FetchFailed(String),
    NoMatches,
    SearchFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotFound => write!(f, "not found"),
            SkipReason::FetchFailed(e) => write!(f, "fetch failed: {}", e),
            SkipReason::NoMatches => write!(f, "no matches"),
            SkipReason::SearchFailed(e) => write!(f, "search failed: {}", e),
        }
    }
}

impl SkipReason {
    /// The source errored, as opposed to the evidence simply not existing.
    pub fn is_failure(&self) -> bool {
        matches!(self, SkipReason::FetchFailed(_) | SkipReason::SearchFailed(_))
    }
}

/// Outcome of resolving one candidate reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Resolved(T),
    Skipped(SkipReason),
}

/// Builds [`IssueContext`] values from a single [`IssueSource`].
pub struct ContextGatherer<'a, S: IssueSource + ?Sized> {
    source: &'a S,
    limits: ContextLimits,
}

impl<'a, S: IssueSource + ?Sized> ContextGatherer<'a, S> {
    pub fn new(source: &'a S, limits: ContextLimits) -> Self {
        Self { source, limits }
    }

    /// Fetch and truncate one candidate file.
    pub async fn resolve_file(&self, path: &str) -> Resolution<FileContentRef> {
        match self.source.fetch_file_content(path).await {
            Ok(Some(content)) => Resolution::Resolved(FileContentRef {
                path: path.to_string(),
                content: truncate_chars(&content, self.limits.file_content_cap),
            }),
            Ok(None) => Resolution::Skipped(SkipReason::NotFound),
            Err(e) => Resolution::Skipped(SkipReason::FetchFailed(format!("{:#}", e))),
        }
    }

    /// Fetch every candidate path, keeping the ones that resolve.
    pub async fn resolve_files(&self, paths: &[String]) -> Vec<FileContentRef> {
        let mut files = Vec::new();
        for path in paths {
            match self.resolve_file(path).await {
                Resolution::Resolved(file) => files.push(file),
                Resolution::Skipped(reason) if reason.is_failure() => {
                    warn!(path = %path, %reason, "Failed to fetch related file");
                }
                Resolution::Skipped(reason) => {
                    debug!(path = %path, %reason, "Skipping related file");
                }
            }
        }
        files
    }

    /// Search for one keyword, keeping the first few matches.
    pub async fn resolve_keyword(&self, keyword: &str) -> Resolution<CodeReference> {
        match self.source.search_code(keyword).await {
            Ok(found) if found.is_empty() => Resolution::Skipped(SkipReason::NoMatches),
            Ok(found) => Resolution::Resolved(CodeReference {
                keyword: keyword.to_string(),
                matches: found
                    .into_iter()
                    .take(self.limits.matches_per_keyword)
                    .collect(),
            }),
            Err(e) => Resolution::Skipped(SkipReason::SearchFailed(format!("{:#}", e))),
        }
    }

    /// Search for the first `keyword_limit` keywords only.
    pub async fn resolve_code_references(&self, keywords: &[String]) -> Vec<CodeReference> {
        let mut references = Vec::new();
        for keyword in keywords.iter().take(self.limits.keyword_limit) {
            match self.resolve_keyword(keyword).await {
                Resolution::Resolved(reference) => references.push(reference),
                Resolution::Skipped(reason) if reason.is_failure() => {
                    warn!(keyword = %keyword, %reason, "Code search failed");
                }
                Resolution::Skipped(reason) => {
                    debug!(keyword = %keyword, %reason, "Skipping code reference");
                }
            }
        }
        references
    }

    /// Build the full context for a raw tracker issue.
    ///
    /// Fails only when the issue itself is malformed.
    pub async fn gather_issue_context(&self, raw: &RawIssue) -> Result<IssueContext, MalformedIssue> {
        let snapshot = IssueSnapshot::from_raw(raw)?;
        Ok(self.gather_for_snapshot(snapshot).await)
    }

    /// Build the full context for an already validated snapshot. Never fails.
    pub async fn gather_for_snapshot(&self, issue: IssueSnapshot) -> IssueContext {
        let comments = match self.source.fetch_comments(issue.number).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(issue = issue.number, error = %format!("{:#}", e), "Failed to fetch comments");
                Vec::new()
            }
        };

        let file_candidates = extract_file_references(&issue.body, &comments);
        let keywords = extract_code_keywords(&issue.body, &comments);
        debug!(
            issue = issue.number,
            files = file_candidates.len(),
            keywords = keywords.len(),
            "Extracted references"
        );

        let related_files = self.resolve_files(&file_candidates).await;
        let code_references = self.resolve_code_references(&keywords).await;

        IssueContext {
            issue,
            comments,
            related_files,
            code_references,
        }
    }
}
