//! In-memory [`IssueSource`] for tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::IssueSource;
use crate::issue::{CodeMatch, CommentSnapshot, RawIssue};

#[derive(Default)]
pub(crate) struct FakeSource {
    issues: Vec<RawIssue>,
    fail_issues: bool,
    comments: HashMap<u64, Vec<CommentSnapshot>>,
    fail_comments: bool,
    files: HashMap<String, String>,
    failing_files: HashSet<String>,
    searches: HashMap<String, usize>,
    failing_searches: HashSet<String>,
    default_search_hits: usize,
    comment_delay: HashMap<u64, Duration>,

    issue_calls: AtomicUsize,
    comment_calls: AtomicUsize,
    file_calls: AtomicUsize,
    search_calls: AtomicUsize,
}

fn hits(n: usize) -> Vec<CodeMatch> {
    (0..n)
        .map(|i| CodeMatch {
            path: format!("src/match_{}.rs", i),
            url: format!("https://github.com/acme/widgets/blob/main/src/match_{}.rs", i),
        })
        .collect()
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issue(mut self, number: u64, title: &str, body: &str) -> Self {
        self.issues.push(RawIssue {
            number: Some(number),
            title: Some(title.to_string()),
            body: Some(body.to_string()),
            ..Default::default()
        });
        self
    }

    pub fn with_raw_issue(mut self, raw: RawIssue) -> Self {
        self.issues.push(raw);
        self
    }

    pub fn with_failing_issues(mut self) -> Self {
        self.fail_issues = true;
        self
    }

    pub fn with_comments(mut self, number: u64, bodies: &[&str]) -> Self {
        self.comments.insert(
            number,
            bodies.iter().map(|b| CommentSnapshot::new(*b)).collect(),
        );
        self
    }

    pub fn with_failing_comments(mut self) -> Self {
        self.fail_comments = true;
        self
    }

    /// Make comment fetches for one issue slow, to exercise timeouts.
    pub fn with_comment_delay(mut self, number: u64, delay: Duration) -> Self {
        self.comment_delay.insert(number, delay);
        self
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_failing_file(mut self, path: &str) -> Self {
        self.failing_files.insert(path.to_string());
        self
    }

    pub fn with_search(mut self, keyword: &str, count: usize) -> Self {
        self.searches.insert(keyword.to_string(), count);
        self
    }

    pub fn with_failing_search(mut self, keyword: &str) -> Self {
        self.failing_searches.insert(keyword.to_string());
        self
    }

    pub fn with_default_search_hits(mut self, count: usize) -> Self {
        self.default_search_hits = count;
        self
    }

    pub fn issue_calls(&self) -> usize {
        self.issue_calls.load(Ordering::SeqCst)
    }

    pub fn comment_calls(&self) -> usize {
        self.comment_calls.load(Ordering::SeqCst)
    }

    pub fn file_calls(&self) -> usize {
        self.file_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IssueSource for FakeSource {
    async fn fetch_open_issues(&self) -> Result<Vec<RawIssue>> {
        self.issue_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_issues {
            return Err(anyhow!("issue listing unavailable"));
        }
        Ok(self.issues.clone())
    }

    async fn fetch_comments(&self, issue_number: u64) -> Result<Vec<CommentSnapshot>> {
        self.comment_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.comment_delay.get(&issue_number) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_comments {
            return Err(anyhow!("comments unavailable"));
        }
        Ok(self.comments.get(&issue_number).cloned().unwrap_or_default())
    }

    async fn fetch_file_content(&self, path: &str) -> Result<Option<String>> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_files.contains(path) {
            return Err(anyhow!("403 forbidden"));
        }
        Ok(self.files.get(path).cloned())
    }

    async fn search_code(&self, keyword: &str) -> Result<Vec<CodeMatch>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_searches.contains(keyword) {
            return Err(anyhow!("secondary rate limit"));
        }
        let count = self
            .searches
            .get(keyword)
            .copied()
            .unwrap_or(self.default_search_hits);
        Ok(hits(count))
    }
}
