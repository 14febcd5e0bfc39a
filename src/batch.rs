//! Batch analysis of a repository's open issues
//!
//! Issues are independent: nothing gathered for one issue is shared with
//! another, so the fan-out width is purely a rate-limit policy. Results keep
//! the tracker's order regardless of concurrency.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::Config;
use crate::context::{ContextGatherer, ContextLimits, IssueSource};
use crate::fixability::analyze_fixability;
use crate::issue::{AnalyzedIssue, IssueContext, IssueSnapshot, MalformedIssue};

/// How a batch run fetches evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub limits: ContextLimits,
    /// Issues in flight at once (at least 1)
    pub concurrency: usize,
    /// Per-issue budget for evidence gathering
    pub issue_timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            limits: ContextLimits::default(),
            concurrency: 1,
            issue_timeout: None,
        }
    }
}

impl From<&Config> for BatchOptions {
    fn from(config: &Config) -> Self {
        Self {
            limits: ContextLimits::from(config),
            concurrency: config.concurrency.max(1),
            issue_timeout: config.issue_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// A tracker entry that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedIssue {
    /// Position in the tracker listing
    pub position: usize,
    pub number: Option<u64>,
    pub reason: MalformedIssue,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub analyzed: Vec<AnalyzedIssue>,
    pub skipped: Vec<SkippedIssue>,
    pub duration: Duration,
}

impl BatchReport {
    pub fn incomplete_count(&self) -> usize {
        self.analyzed.iter().filter(|a| a.context_incomplete).count()
    }
}

/// Gather evidence for one issue and score it.
///
/// A timeout keeps the issue in the batch, scored on its own text.
pub async fn analyze_issue<S: IssueSource + ?Sized>(
    gatherer: &ContextGatherer<'_, S>,
    issue: IssueSnapshot,
    timeout: Option<Duration>,
) -> AnalyzedIssue {
    let number = issue.number;
    info!(issue = number, title = %issue.title, "Analyzing issue");

    let (context, context_incomplete) = match timeout {
        Some(limit) => {
            match tokio::time::timeout(limit, gatherer.gather_for_snapshot(issue.clone())).await {
                Ok(context) => (context, false),
                Err(_) => {
                    warn!(issue = number, timeout_secs = limit.as_secs_f64(), "Context gathering timed out");
                    (IssueContext::new(issue), true)
                }
            }
        }
        None => (gatherer.gather_for_snapshot(issue).await, false),
    };

    let analysis = analyze_fixability(&context);
    info!(
        issue = number,
        level = %analysis.level,
        score = %analysis.percent(),
        "Scored issue"
    );

    let summary = context.summary();
    AnalyzedIssue {
        issue: context.issue,
        analysis,
        context: summary,
        context_incomplete,
    }
}

/// Fetch every open issue from `source`, then gather and score each one.
///
/// Only the issue listing itself is fatal. Malformed entries are skipped and
/// reported; evidence failures just thin out the context.
pub async fn analyze_repository<S: IssueSource + ?Sized>(
    source: &S,
    options: &BatchOptions,
) -> Result<BatchReport> {
    let started = Instant::now();
    let raw_issues = source
        .fetch_open_issues()
        .await
        .context("Failed to fetch open issues")?;
    info!(count = raw_issues.len(), "Found open issues");

    let mut snapshots = Vec::with_capacity(raw_issues.len());
    let mut skipped = Vec::new();
    for (position, raw) in raw_issues.iter().enumerate() {
        match IssueSnapshot::from_raw(raw) {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(reason) => {
                warn!(position, %reason, "Skipping malformed issue");
                skipped.push(SkippedIssue {
                    position,
                    number: raw.number,
                    reason,
                });
            }
        }
    }

    let gatherer = ContextGatherer::new(source, options.limits);
    let analyzed: Vec<AnalyzedIssue> = stream::iter(snapshots)
        .map(|issue| analyze_issue(&gatherer, issue, options.issue_timeout))
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    Ok(BatchReport {
        analyzed,
        skipped,
        duration: started.elapsed(),
    })
}
