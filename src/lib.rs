//! mozi library crate
//!
//! Scores open issues by how fixable they look. The pipeline is
//! reference extraction, context assembly against an [`context::IssueSource`],
//! then a pure rule-table score in [`fixability`].

pub mod batch;
pub mod config;
pub mod context;
pub mod fixability;
pub mod github;
pub mod issue;
pub mod report;
pub mod util;

pub use context::{ContextGatherer, ContextLimits, IssueSource};
pub use fixability::{analyze_fixability, FixabilityAnalysis, FixabilityLevel};
pub use issue::{AnalyzedIssue, IssueContext, IssueSnapshot};
