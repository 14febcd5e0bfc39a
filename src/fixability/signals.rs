//! Text signals used by the rule table
//!
//! Every check is a pure boolean over normalized (never-null) text. Empty
//! inputs are falsy for all of them.

use regex::Regex;
use std::sync::LazyLock;

use crate::issue::IssueContext;

const BUG_KEYWORDS: &[&str] = &[
    "error", "bug", "crash", "exception", "fail", "broken", "issue", "problem",
];
const BUG_LABELS: &[&str] = &["bug", "error", "defect", "issue", "crash"];
const ENHANCEMENT_LABELS: &[&str] = &["enhancement", "feature", "improvement"];
const FEATURE_KEYWORDS: &[&str] = &["feature", "add", "implement", "support", "enhancement"];
const QUESTION_KEYWORDS: &[&str] = &["how", "why", "what", "question", "help", "discussion"];
const DEPENDENCY_KEYWORDS: &[&str] = &[
    "npm",
    "yarn",
    "package",
    "dependency",
    "third-party",
    "external",
];
const DUPLICATE_KEYWORDS: &[&str] = &["duplicate", "already", "existing"];

/// Minimum body length (in characters) for requirements to count as clear.
const CLEAR_REQUIREMENTS_MIN_LEN: usize = 100;

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid signal pattern {p}: {e}")))
        .collect()
}

static STACK_TRACE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        // JS/Java frame: at handler (file.js:10:5)
        r"at\s+[A-Za-z0-9_]+.*:\d+:\d+",
        // Python frame
        r#"File\s+".*",\s+line\s+\d+"#,
        r"(?m)^\s*at\s+.*\(.*:\d+:\d+\)$",
        r"Traceback|Exception|Error:",
    ])
});

static ERROR_MESSAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"Error:\s*.+",
        r"Exception:\s*.+",
        r"Failed:\s*.+",
        r"TypeError|ReferenceError|SyntaxError",
    ])
});

static FUNCTION_MENTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)function\s+[A-Za-z0-9_]+",
        r"[A-Za-z0-9_]+\(\)",
        r"(?i)method\s+[A-Za-z0-9_]+",
        r"[A-Za-z0-9_]+\.[A-Za-z0-9_]+\(",
        // stack frame with a location: at render (view.js:3:14)
        r"(?m)^\s*at\s+[A-Za-z0-9_$.<>]+\s+\([^)]*:\d+(?::\d+)?\)",
    ])
});

static REQUIREMENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?i)should|must|need|want|require",
        r"(?i)step.*\d",
        r"(?i)expected.*behavior",
        r"\d+\.",
    ])
});

fn any_match(patterns: &[Regex], text: &str) -> bool {
    !text.is_empty() && patterns.iter().any(|p| p.is_match(text))
}

fn contains_any(haystack_lower: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack_lower.contains(n))
}

fn labels_contain_any(labels: &[String], needles: &[&str]) -> bool {
    labels
        .iter()
        .any(|label| contains_any(&label.to_lowercase(), needles))
}

pub fn has_bug_indicators(ctx: &IssueContext) -> bool {
    contains_any(&ctx.title_and_body().to_lowercase(), BUG_KEYWORDS)
}

pub fn has_stack_trace(ctx: &IssueContext) -> bool {
    any_match(&STACK_TRACE_PATTERNS, &ctx.body_and_comments())
}

pub fn has_error_message(ctx: &IssueContext) -> bool {
    any_match(&ERROR_MESSAGE_PATTERNS, &ctx.body_and_comments())
}

pub fn has_bug_label(ctx: &IssueContext) -> bool {
    labels_contain_any(&ctx.issue.labels, BUG_LABELS)
}

pub fn has_enhancement_label(ctx: &IssueContext) -> bool {
    labels_contain_any(&ctx.issue.labels, ENHANCEMENT_LABELS)
}

pub fn mentions_function_or_method(ctx: &IssueContext) -> bool {
    any_match(&FUNCTION_MENTION_PATTERNS, &ctx.title_and_body())
}

/// Body reads like a specification: requirement phrasing and enough detail.
pub fn has_clear_requirements(ctx: &IssueContext) -> bool {
    let body = &ctx.issue.body;
    any_match(&REQUIREMENT_PATTERNS, body) && body.chars().count() > CLEAR_REQUIREMENTS_MIN_LEN
}

pub fn is_feature_request(ctx: &IssueContext) -> bool {
    contains_any(&ctx.title_and_body().to_lowercase(), FEATURE_KEYWORDS)
}

pub fn is_question_or_discussion(ctx: &IssueContext) -> bool {
    let title = ctx.issue.title.to_lowercase();
    contains_any(&title, QUESTION_KEYWORDS) || title.contains('?')
}

pub fn mentions_external_dependency(ctx: &IssueContext) -> bool {
    contains_any(&ctx.title_and_body().to_lowercase(), DEPENDENCY_KEYWORDS)
}

pub fn is_marked_duplicate(ctx: &IssueContext) -> bool {
    ctx.comments
        .iter()
        .any(|c| contains_any(&c.body.to_lowercase(), DUPLICATE_KEYWORDS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueSnapshot;

    fn ctx(title: &str, body: &str) -> IssueContext {
        IssueContext::new(IssueSnapshot::new(1, title, body))
    }

    #[test]
    fn test_python_traceback_is_stack_trace() {
        let c = ctx(
            "Import fails",
            "Traceback (most recent call last):\n  File \"app.py\", line 12, in <module>",
        );
        assert!(has_stack_trace(&c));
    }

    #[test]
    fn test_stack_trace_found_in_comments() {
        let c = ctx("Crash", "It crashes").with_comments(["    at render (view.js:3:14)"]);
        assert!(has_stack_trace(&c));
    }

    #[test]
    fn test_plain_prose_has_no_stack_trace() {
        assert!(!has_stack_trace(&ctx("Crash", "the page goes blank sometimes")));
    }

    #[test]
    fn test_named_runtime_error_is_error_message() {
        assert!(has_error_message(&ctx("", "a ReferenceError shows up")));
        assert!(has_error_message(&ctx("", "Failed: timeout after 30s")));
        assert!(!has_error_message(&ctx("", "it just misbehaves")));
    }

    #[test]
    fn test_bug_label_is_case_insensitive_substring() {
        let c = IssueContext::new(IssueSnapshot::new(1, "t", "").with_labels(["Type: Bug"]));
        assert!(has_bug_label(&c));
        let c = IssueContext::new(IssueSnapshot::new(1, "t", "").with_labels(["docs"]));
        assert!(!has_bug_label(&c));
    }

    #[test]
    fn test_function_mention_shapes() {
        assert!(mentions_function_or_method(&ctx("parse() returns None", "")));
        assert!(mentions_function_or_method(&ctx("", "calling client.fetch( twice")));
        assert!(mentions_function_or_method(&ctx("", "the method render leaks")));
        assert!(mentions_function_or_method(&ctx("", "Oops\n  at foo (index.js:10:5)")));
        assert!(!mentions_function_or_method(&ctx("Docs typo", "spelling on the home page")));
    }

    #[test]
    fn test_prose_starting_with_at_is_not_a_frame() {
        let c = ctx("Layout shifts", "It happens\nat startup (every time) on mobile");
        assert!(!mentions_function_or_method(&c));
        assert!(mentions_function_or_method(&ctx("", "at loadView (app/view.py:88)")));
    }

    #[test]
    fn test_clear_requirements_needs_length() {
        assert!(!has_clear_requirements(&ctx("", "It should sort.")));

        let long = format!("It should sort entries by date. {}", "Details here. ".repeat(8));
        assert!(long.chars().count() > CLEAR_REQUIREMENTS_MIN_LEN);
        assert!(has_clear_requirements(&ctx("", &long)));
    }

    #[test]
    fn test_clear_requirements_length_boundary() {
        let at_limit = format!("It should sort.{}", "x".repeat(85));
        assert_eq!(at_limit.chars().count(), 100);
        assert!(!has_clear_requirements(&ctx("", &at_limit)));

        let over = format!("{}x", at_limit);
        assert!(has_clear_requirements(&ctx("", &over)));
    }

    #[test]
    fn test_question_by_trailing_mark() {
        assert!(is_question_or_discussion(&ctx("Is this intended?", "")));
        assert!(is_question_or_discussion(&ctx("Why does it hang", "")));
        assert!(!is_question_or_discussion(&ctx("Crash on start", "how do I fix?")));
    }

    #[test]
    fn test_duplicate_only_looks_at_comments() {
        assert!(!is_marked_duplicate(&ctx("duplicate", "already reported")));
        let c = ctx("t", "").with_comments(["Closing, duplicate of #123"]);
        assert!(is_marked_duplicate(&c));
    }

    #[test]
    fn test_empty_context_is_falsy_everywhere() {
        let c = ctx("", "");
        assert!(!has_bug_indicators(&c));
        assert!(!has_stack_trace(&c));
        assert!(!has_error_message(&c));
        assert!(!has_bug_label(&c));
        assert!(!has_enhancement_label(&c));
        assert!(!mentions_function_or_method(&c));
        assert!(!has_clear_requirements(&c));
        assert!(!is_feature_request(&c));
        assert!(!is_question_or_discussion(&c));
        assert!(!mentions_external_dependency(&c));
        assert!(!is_marked_duplicate(&c));
    }
}
