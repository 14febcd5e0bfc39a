//! Issue data model
//!
//! Raw tracker payloads come in as [`RawIssue`]; everything the scorer sees is
//! an immutable projection built once per analysis run.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::fixability::FixabilityAnalysis;

// ============================================================================
// Raw tracker payloads
// ============================================================================

/// Label as returned by the GitHub issues API.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RawLabel {
    pub name: String,
}

/// Issue as returned by the GitHub issues API.
///
/// Fields are optional so that a malformed entry can be reported and skipped
/// instead of failing the whole page.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawIssue {
    pub number: Option<u64>,
    pub title: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<RawLabel>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Present when the "issue" is really a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl RawIssue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// An issue that can't be analyzed because required fields are missing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedIssue {
    #[error("issue has no number")]
    MissingNumber,
    #[error("issue #{0} has no title")]
    MissingTitle(u64),
}

// ============================================================================
// Snapshots
// ============================================================================

/// Immutable projection of an issue at analysis time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSnapshot {
    pub number: u64,
    pub title: String,
    /// Never null: an absent body becomes the empty string.
    pub body: String,
    pub labels: Vec<String>,
    pub state: String,
    pub created_at: String,
    pub updated_at: String,
}

impl IssueSnapshot {
    /// Project a raw tracker issue, normalizing absent text fields.
    pub fn from_raw(raw: &RawIssue) -> Result<Self, MalformedIssue> {
        let number = raw.number.ok_or(MalformedIssue::MissingNumber)?;
        let title = raw
            .title
            .clone()
            .ok_or(MalformedIssue::MissingTitle(number))?;

        Ok(Self {
            number,
            title,
            body: raw.body.clone().unwrap_or_default(),
            labels: raw.labels.iter().map(|l| l.name.clone()).collect(),
            state: raw.state.clone().unwrap_or_else(|| "open".to_string()),
            created_at: raw.created_at.clone().unwrap_or_default(),
            updated_at: raw.updated_at.clone().unwrap_or_default(),
        })
    }

    /// Minimal snapshot, mostly useful for tests and benches.
    pub fn new(number: u64, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            body: body.into(),
            labels: Vec::new(),
            state: "open".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }
}

/// One comment on an issue. Only the body matters for scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSnapshot {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl CommentSnapshot {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

// ============================================================================
// Evidence
// ============================================================================

/// Truncated contents of a file referenced by the issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContentRef {
    pub path: String,
    pub content: String,
}

/// A single code search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMatch {
    pub path: String,
    pub url: String,
}

/// Code search hits for one extracted keyword. Never built with zero matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeReference {
    pub keyword: String,
    pub matches: Vec<CodeMatch>,
}

/// Everything known about an issue at scoring time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueContext {
    pub issue: IssueSnapshot,
    pub comments: Vec<CommentSnapshot>,
    pub related_files: Vec<FileContentRef>,
    pub code_references: Vec<CodeReference>,
}

impl IssueContext {
    /// Context carrying only the issue itself, with no gathered evidence.
    pub fn new(issue: IssueSnapshot) -> Self {
        Self {
            issue,
            comments: Vec::new(),
            related_files: Vec::new(),
            code_references: Vec::new(),
        }
    }

    pub fn with_comments<I, S>(mut self, comments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.comments = comments.into_iter().map(CommentSnapshot::new).collect();
        self
    }

    /// Issue body followed by every comment body, space separated.
    pub fn body_and_comments(&self) -> String {
        let mut text = self.issue.body.clone();
        for comment in &self.comments {
            text.push(' ');
            text.push_str(&comment.body);
        }
        text
    }

    /// Title and body, space separated.
    pub fn title_and_body(&self) -> String {
        format!("{} {}", self.issue.title, self.issue.body)
    }

    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            related_files_count: self.related_files.len(),
            code_references_count: self.code_references.len(),
            comments_count: self.comments.len(),
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// Evidence counts kept alongside a stored analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSummary {
    pub related_files_count: usize,
    pub code_references_count: usize,
    pub comments_count: usize,
}

/// One scored issue, ready for reporting or export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedIssue {
    pub issue: IssueSnapshot,
    pub analysis: FixabilityAnalysis,
    pub context: ContextSummary,
    /// True when evidence gathering timed out and the score used the issue text alone.
    #[serde(default)]
    pub context_incomplete: bool,
}
