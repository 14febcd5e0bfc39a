//! Fixability scoring
//!
//! A static, ordered table of weighted rules is folded over an
//! [`IssueContext`]. The raw sum is clamped into `[0, 1]` once, after every
//! rule has been evaluated, and mapped to a [`FixabilityLevel`].

pub mod signals;


use serde::{Deserialize, Serialize};

use crate::issue::IssueContext;

/// Whether a rule pushes the score up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSign {
    Positive,
    Negative,
}

impl RuleSign {
    pub fn symbol(&self) -> &'static str {
        match self {
            RuleSign::Positive => "+",
            RuleSign::Negative => "-",
        }
    }
}

/// A named, weighted heuristic over an issue context.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub weight: f64,
    pub predicate: fn(&IssueContext) -> bool,
}

impl Rule {
    pub fn applies(&self, ctx: &IssueContext) -> bool {
        (self.predicate)(ctx)
    }
}

/// Rules that raise the score, in reporting order.
pub static POSITIVE_RULES: &[Rule] = &[
    Rule {
        name: "Bug Report with Stack Trace",
        weight: 0.9,
        predicate: |ctx| signals::has_bug_indicators(ctx) && signals::has_stack_trace(ctx),
    },
    Rule {
        name: "File Reference with Error Message",
        weight: 0.8,
        predicate: |ctx| !ctx.related_files.is_empty() && signals::has_error_message(ctx),
    },
    Rule {
        name: "Simple Bug Label",
        weight: 0.7,
        predicate: signals::has_bug_label,
    },
    Rule {
        name: "Code References Available",
        weight: 0.6,
        predicate: |ctx| !ctx.code_references.is_empty(),
    },
    Rule {
        name: "Specific Function/Method Mentioned",
        weight: 0.5,
        predicate: signals::mentions_function_or_method,
    },
    Rule {
        name: "Enhancement with Clear Requirements",
        weight: 0.4,
        predicate: |ctx| signals::has_enhancement_label(ctx) && signals::has_clear_requirements(ctx),
    },
];

/// Rules that lower the score, in reporting order.
pub static NEGATIVE_RULES: &[Rule] = &[
    Rule {
        name: "Feature Request without Context",
        weight: -0.5,
        predicate: |ctx| signals::is_feature_request(ctx) && !signals::has_clear_requirements(ctx),
    },
    Rule {
        name: "Question or Discussion",
        weight: -0.6,
        predicate: signals::is_question_or_discussion,
    },
    Rule {
        name: "External Dependency Issue",
        weight: -0.4,
        predicate: signals::mentions_external_dependency,
    },
    Rule {
        name: "Duplicate Issue",
        weight: -0.8,
        predicate: signals::is_marked_duplicate,
    },
];

/// Discrete fixability bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FixabilityLevel {
    High,
    Medium,
    Low,
    #[serde(rename = "Very Low")]
    VeryLow,
}

impl FixabilityLevel {
    /// All levels, best first.
    pub const ALL: [FixabilityLevel; 4] = [
        FixabilityLevel::High,
        FixabilityLevel::Medium,
        FixabilityLevel::Low,
        FixabilityLevel::VeryLow,
    ];

    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            FixabilityLevel::High
        } else if score >= 0.4 {
            FixabilityLevel::Medium
        } else if score >= 0.2 {
            FixabilityLevel::Low
        } else {
            FixabilityLevel::VeryLow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FixabilityLevel::High => "High",
            FixabilityLevel::Medium => "Medium",
            FixabilityLevel::Low => "Low",
            FixabilityLevel::VeryLow => "Very Low",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            FixabilityLevel::High => {
                "This issue appears highly fixable with clear context and actionable information."
            }
            FixabilityLevel::Medium => {
                "This issue is moderately fixable but may need additional context or investigation."
            }
            FixabilityLevel::Low => {
                "This issue has low fixability - consider asking for more details or reproduction steps."
            }
            FixabilityLevel::VeryLow => {
                "This issue appears difficult to fix without significant additional information."
            }
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            FixabilityLevel::High => "🟢",
            FixabilityLevel::Medium => "🟡",
            FixabilityLevel::Low => "🟠",
            FixabilityLevel::VeryLow => "🔴",
        }
    }
}

impl std::fmt::Display for FixabilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recommendation text for a clamped score.
pub fn recommendation_for(score: f64) -> &'static str {
    FixabilityLevel::from_score(score).recommendation()
}

/// A rule that fired, as recorded in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedRule {
    pub name: String,
    pub weight: f64,
    pub sign: RuleSign,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixabilityAnalysis {
    /// Always within `[0, 1]`.
    pub score: f64,
    pub level: FixabilityLevel,
    pub applied_rules: Vec<AppliedRule>,
    pub recommendation: String,
}

impl FixabilityAnalysis {
    /// Score as a percentage with one decimal, e.g. `"72.5%"`.
    pub fn percent(&self) -> String {
        format!("{:.1}%", self.score * 100.0)
    }
}

fn apply_rules(
    rules: &[Rule],
    sign: RuleSign,
    ctx: &IssueContext,
    score: &mut f64,
    applied: &mut Vec<AppliedRule>,
) {
    for rule in rules.iter().filter(|r| r.applies(ctx)) {
        *score += rule.weight;
        applied.push(AppliedRule {
            name: rule.name.to_string(),
            weight: rule.weight,
            sign,
        });
    }
}

/// Score an issue context. Pure: no I/O, no panics, same input gives same output.
pub fn analyze_fixability(ctx: &IssueContext) -> FixabilityAnalysis {
    let mut raw = 0.0_f64;
    let mut applied_rules = Vec::new();

    apply_rules(POSITIVE_RULES, RuleSign::Positive, ctx, &mut raw, &mut applied_rules);
    apply_rules(NEGATIVE_RULES, RuleSign::Negative, ctx, &mut raw, &mut applied_rules);

    let score = raw.clamp(0.0, 1.0);
    let level = FixabilityLevel::from_score(score);

    FixabilityAnalysis {
        score,
        level,
        applied_rules,
        recommendation: level.recommendation().to_string(),
    }
}
