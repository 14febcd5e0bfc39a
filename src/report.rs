//! Rendering and saving batch results
//!
//! The text report groups issues by fixability level, best first, and ends
//! with a short list of the most promising fixes.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::batch::BatchReport;
use crate::fixability::FixabilityLevel;
use crate::github::RepoRef;
use crate::issue::AnalyzedIssue;
use crate::util::truncate;

/// Issues below this score never make the recommended list.
pub const RECOMMENDED_MIN_SCORE: f64 = 0.4;

const RULE_WIDTH: usize = 70;
const SECTION_WIDTH: usize = 50;
const TOP_TITLE_WIDTH: usize = 60;

/// Highest score first. Ties keep tracker order.
pub fn sort_by_score(issues: &[AnalyzedIssue]) -> Vec<&AnalyzedIssue> {
    let mut sorted: Vec<&AnalyzedIssue> = issues.iter().collect();
    sorted.sort_by(|a, b| b.analysis.score.total_cmp(&a.analysis.score));
    sorted
}

/// The first `count` issues by score, dropping anything below the cutoff.
pub fn top_recommended(issues: &[AnalyzedIssue], count: usize) -> Vec<&AnalyzedIssue> {
    sort_by_score(issues)
        .into_iter()
        .take(count)
        .filter(|a| a.analysis.score >= RECOMMENDED_MIN_SCORE)
        .collect()
}

fn write_issue(out: &mut String, index: usize, item: &AnalyzedIssue, repo: &RepoRef) {
    let _ = writeln!(
        out,
        "\n{}. Issue #{}: {}",
        index + 1,
        item.issue.number,
        item.issue.title
    );
    let _ = writeln!(out, "   Score: {}", item.analysis.percent());
    let _ = writeln!(
        out,
        "   Context: {} files, {} code refs, {} comments{}",
        item.context.related_files_count,
        item.context.code_references_count,
        item.context.comments_count,
        if item.context_incomplete {
            " (context incomplete)"
        } else {
            ""
        }
    );
    let _ = writeln!(out, "   Recommendation: {}", item.analysis.recommendation);

    if !item.analysis.applied_rules.is_empty() {
        let _ = writeln!(out, "   Applied Rules:");
        for rule in &item.analysis.applied_rules {
            let _ = writeln!(out, "     {} {} ({})", rule.sign.symbol(), rule.name, rule.weight);
        }
    }

    let _ = writeln!(out, "   🔗 {}", repo.issue_url(item.issue.number));
}

/// Render the full text report for one repository.
pub fn render_text(report: &BatchReport, repo: &RepoRef, top_count: usize) -> String {
    let mut out = String::new();
    let sorted = sort_by_score(&report.analyzed);

    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "📊 FIXABILITY ANALYSIS RESULTS - {}", repo);
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));

    let _ = writeln!(out, "\n📈 SUMMARY:");
    for level in FixabilityLevel::ALL {
        let count = sorted.iter().filter(|a| a.analysis.level == level).count();
        if count > 0 {
            let _ = writeln!(out, "   {} {}: {} issues", level.emoji(), level, count);
        }
    }
    if !report.skipped.is_empty() {
        let _ = writeln!(out, "   ⚪ Skipped (malformed): {}", report.skipped.len());
    }
    let incomplete = report.incomplete_count();
    if incomplete > 0 {
        let _ = writeln!(out, "   ⏱  Context incomplete: {}", incomplete);
    }

    for level in FixabilityLevel::ALL {
        let group: Vec<&AnalyzedIssue> = sorted
            .iter()
            .copied()
            .filter(|a| a.analysis.level == level)
            .collect();
        if group.is_empty() {
            continue;
        }

        let _ = writeln!(
            out,
            "\n{} {} FIXABILITY ISSUES:",
            level.emoji(),
            level.as_str().to_uppercase()
        );
        let _ = writeln!(out, "{}", "─".repeat(SECTION_WIDTH));
        for (index, item) in group.into_iter().enumerate() {
            write_issue(&mut out, index, item, repo);
        }
    }

    let top = top_recommended(&report.analyzed, top_count);
    if !top.is_empty() {
        let _ = writeln!(out, "\n🎯 TOP {} RECOMMENDED FIXES:", top_count);
        let _ = writeln!(out, "{}", "─".repeat(30));
        for (index, item) in top.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. #{}: {} ({})",
                index + 1,
                item.issue.number,
                truncate(&item.issue.title, TOP_TITLE_WIDTH),
                item.analysis.percent()
            );
        }
    }

    let _ = writeln!(out, "\n✅ Analysis complete!");
    out
}

/// File name for a saved report, e.g. `mozi-analysis-acme-widgets-2024-05-01T10-00-00.txt`.
pub fn report_file_name(repo: &RepoRef, at: DateTime<Utc>) -> String {
    format!(
        "mozi-analysis-{}-{}-{}.txt",
        repo.owner,
        repo.repo,
        at.format("%Y-%m-%dT%H-%M-%S")
    )
}

/// Write the text report into `dir`, returning the file path.
pub fn save_text(dir: &Path, repo: &RepoRef, text: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let path = dir.join(report_file_name(repo, Utc::now()));
    fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Serialize analyzed issues as pretty JSON.
pub fn to_json(issues: &[AnalyzedIssue]) -> Result<String> {
    serde_json::to_string_pretty(issues).context("Failed to serialize analysis results")
}

pub fn save_json(path: &Path, issues: &[AnalyzedIssue]) -> Result<()> {
    let json = to_json(issues)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::SkippedIssue;
    use crate::fixability::analyze_fixability;
    use crate::issue::{IssueContext, IssueSnapshot, MalformedIssue};
    use chrono::TimeZone;

    fn analyzed(number: u64, title: &str, body: &str, labels: &[&str]) -> AnalyzedIssue {
        let ctx = IssueContext::new(
            IssueSnapshot::new(number, title, body).with_labels(labels.iter().copied()),
        );
        AnalyzedIssue {
            analysis: analyze_fixability(&ctx),
            context: ctx.summary(),
            issue: ctx.issue,
            context_incomplete: false,
        }
    }

    fn sample() -> BatchReport {
        BatchReport {
            analyzed: vec![
                analyzed(1, "Why is it slow?", "", &[]),
                analyzed(2, "Layout glitch", "", &["bug"]),
                analyzed(3, "render() flickers", "", &[]),
                analyzed(4, "Header overlaps", "", &["bug"]),
            ],
            skipped: vec![SkippedIssue {
                position: 4,
                number: Some(5),
                reason: MalformedIssue::MissingTitle(5),
            }],
            duration: Default::default(),
        }
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let report = sample();
        let numbers: Vec<u64> = sort_by_score(&report.analyzed)
            .iter()
            .map(|a| a.issue.number)
            .collect();
        assert_eq!(numbers, vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_top_recommended_drops_low_scores() {
        let report = sample();
        let top: Vec<u64> = top_recommended(&report.analyzed, 10)
            .iter()
            .map(|a| a.issue.number)
            .collect();
        assert_eq!(top, vec![2, 4, 3]);

        let top_one: Vec<u64> = top_recommended(&report.analyzed, 1)
            .iter()
            .map(|a| a.issue.number)
            .collect();
        assert_eq!(top_one, vec![2]);
    }

    #[test]
    fn test_render_text_sections() {
        let repo = RepoRef::new("acme", "widgets");
        let text = render_text(&sample(), &repo, 10);

        assert!(text.contains("FIXABILITY ANALYSIS RESULTS - acme/widgets"));
        assert!(text.contains("🟢 High: 2 issues"));
        assert!(text.contains("🟡 Medium: 1 issues"));
        assert!(text.contains("🔴 Very Low: 1 issues"));
        assert!(text.contains("VERY LOW FIXABILITY ISSUES:"));
        assert!(text.contains("Skipped (malformed): 1"));
        assert!(text.contains("     + Simple Bug Label (0.7)"));
        assert!(text.contains("     - Question or Discussion (-0.6)"));
        assert!(text.contains("https://github.com/acme/widgets/issues/3"));
        assert!(text.contains("TOP 10 RECOMMENDED FIXES:"));
        assert!(text.contains("1. #2: Layout glitch (70.0%)"));

        let high = text.find("HIGH FIXABILITY ISSUES").unwrap();
        let medium = text.find("MEDIUM FIXABILITY ISSUES").unwrap();
        assert!(high < medium);
    }

    #[test]
    fn test_render_without_recommendations() {
        let report = BatchReport {
            analyzed: vec![analyzed(1, "Why?", "", &[])],
            ..Default::default()
        };
        let text = render_text(&report, &RepoRef::new("a", "b"), 5);
        assert!(!text.contains("RECOMMENDED FIXES"));
        assert!(text.ends_with("✅ Analysis complete!\n"));
    }

    #[test]
    fn test_top_list_shortens_long_titles() {
        let title = format!("Crash {}", "x".repeat(100));
        let report = BatchReport {
            analyzed: vec![analyzed(9, &title, "", &["bug"])],
            ..Default::default()
        };
        let text = render_text(&report, &RepoRef::new("a", "b"), 3);
        let top_line = text
            .lines()
            .find(|l| l.starts_with("1. #9: "))
            .unwrap();
        assert!(top_line.ends_with("... (70.0%)"));
        assert!(text.contains(&title));
    }

    #[test]
    fn test_report_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(
            report_file_name(&RepoRef::new("acme", "widgets"), at),
            "mozi-analysis-acme-widgets-2024-05-01T10-00-00.txt"
        );
    }

    #[test]
    fn test_save_text_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let repo = RepoRef::new("acme", "widgets");
        let report = sample();

        let path = save_text(dir.path(), &repo, "hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");

        let json_path = dir.path().join("out").join("results.json");
        save_json(&json_path, &report.analyzed).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 4);
        assert_eq!(parsed[1]["analysis"]["level"], "High");
        assert_eq!(parsed[1]["context"]["commentsCount"], 0);
    }
}
