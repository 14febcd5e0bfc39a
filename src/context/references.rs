//! Reference extraction from issue text
//!
//! Mines file paths and code identifiers out of the issue body and comments.
//! Deliberately permissive: it only produces candidates, and the assembler
//! decides how many of them are worth a network round trip.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::issue::CommentSnapshot;

const SOURCE_EXTENSIONS: &[&str] = &[
    ".js", ".ts", ".jsx", ".tsx", ".py", ".java", ".cpp", ".c", ".h", ".css", ".html", ".vue",
    ".php", ".rb", ".go", ".rs", ".swift", ".kt",
];

/// Manifests and lockfiles are almost never the actual defect.
const IGNORED_FILES: &[&str] = &[
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
];

/// Shortest identifier worth searching for.
const MIN_KEYWORD_LEN: usize = 3;

static FILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|\s)([A-Za-z0-9_-]+/[A-Za-z0-9_./-]+\.[A-Za-z]{1,4})|(?:^|\s)([A-Za-z0-9_.-]+\.[A-Za-z]{1,4})",
    )
    .expect("file reference pattern")
});

static KEYWORD_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // function render / def parse / class Parser / method save
        Regex::new(r"(?i)(?:function|def|class|method)\s+([A-Za-z0-9_]+)").expect("definition pattern"),
        // const total / let x / @Component Header
        Regex::new(r"(?i)(?:const|let|var|@[A-Za-z0-9_]+)\s+([A-Za-z0-9_]+)")
            .expect("declaration pattern"),
        // Error: missingField
        Regex::new(r"(?i)(?:Error|Exception|Bug|Issue):\s*([A-Za-z0-9_]+)").expect("error pattern"),
    ]
});

/// Body plus comment bodies, space separated.
fn combined_text(body: &str, comments: &[CommentSnapshot]) -> String {
    let mut parts = Vec::with_capacity(comments.len() + 1);
    parts.push(body);
    parts.extend(comments.iter().map(|c| c.body.as_str()));
    parts.join(" ")
}

/// Accept allow-listed source extensions, or anything with a directory part.
pub fn is_valid_file_path(path: &str) -> bool {
    if IGNORED_FILES.contains(&path) {
        return false;
    }
    SOURCE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) || path.contains('/')
}

/// Candidate file paths mentioned in the text, in first-seen order.
pub fn extract_file_references(body: &str, comments: &[CommentSnapshot]) -> Vec<String> {
    let text = combined_text(body, comments);
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for caps in FILE_PATTERN.captures_iter(&text) {
        let Some(m) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        let file = m.as_str();
        if is_valid_file_path(file) && seen.insert(file.to_string()) {
            files.push(file.to_string());
        }
    }

    files
}

/// Candidate identifiers for code search, in first-seen order.
///
/// Patterns are scanned one after another, so all definition names come
/// before declaration names, which come before error subjects.
pub fn extract_code_keywords(body: &str, comments: &[CommentSnapshot]) -> Vec<String> {
    let text = combined_text(body, comments);
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for pattern in KEYWORD_PATTERNS.iter() {
        for caps in pattern.captures_iter(&text) {
            let Some(name) = caps.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if name.len() >= MIN_KEYWORD_LEN && seen.insert(name.to_string()) {
                keywords.push(name.to_string());
            }
        }
    }

    keywords
}
