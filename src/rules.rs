// 🏷️ Postal Code Rules - Rules as Data
// Country code → canonicalization applied before the reference lookup

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// RULE DEFINITION
// ============================================================================

/// How a country's postal codes are reshaped to match the reference table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostalTransform {
    /// Keep only the first `length` characters (e.g. Canadian forward sortation area)
    Truncate { length: usize },

    /// Prepend a single "0" when the code is exactly one character short of `width`.
    /// Any other length passes through unchanged.
    RestoreLeadingZero { width: usize },
}

impl PostalTransform {
    pub fn apply(&self, code: &str) -> String {
        match self {
            PostalTransform::Truncate { length } => code.chars().take(*length).collect(),
            PostalTransform::RestoreLeadingZero { width } => {
                if *width > 0 && code.chars().count() == width - 1 {
                    format!("0{}", code)
                } else {
                    code.to_string()
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalRule {
    /// Two-letter country code, matched exactly
    pub country: String,

    #[serde(flatten)]
    pub transform: PostalTransform,

    /// Description/notes about this rule
    #[serde(default)]
    pub description: Option<String>,
}

impl PostalRule {
    pub fn truncate(country: &str, length: usize) -> Self {
        PostalRule {
            country: country.to_string(),
            transform: PostalTransform::Truncate { length },
            description: None,
        }
    }

    pub fn restore_leading_zero(country: &str, width: usize) -> Self {
        PostalRule {
            country: country.to_string(),
            transform: PostalTransform::RestoreLeadingZero { width },
            description: None,
        }
    }
}

/// Rules shipped by default: CA keeps its 3-character area, US zips get their dropped zero back
pub fn default_rules() -> Vec<PostalRule> {
    vec![
        PostalRule {
            description: Some("Canadian postal code area".to_string()),
            ..PostalRule::truncate("CA", 3)
        },
        PostalRule {
            description: Some("US zip stored as a number".to_string()),
            ..PostalRule::restore_leading_zero("US", 5)
        },
    ]
}

// ============================================================================
// RULE TABLE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: HashMap<String, PostalTransform>,
}

impl RuleTable {
    /// Create an empty table (every country passes through unchanged)
    pub fn new() -> Self {
        RuleTable {
            rules: HashMap::new(),
        }
    }

    /// Build a table from a list of rules. A later rule for the same country replaces an earlier one.
    pub fn from_rules(rules: Vec<PostalRule>) -> Self {
        let mut table = RuleTable::new();
        for rule in rules {
            table.add_rule(rule);
        }
        table
    }

    pub fn add_rule(&mut self, rule: PostalRule) {
        self.rules.insert(rule.country, rule.transform);
    }

    pub fn rule_for(&self, country: &str) -> Option<&PostalTransform> {
        self.rules.get(country)
    }

    /// Canonicalize a postal code for its country
    pub fn apply(&self, country: &str, code: &str) -> String {
        match self.rules.get(country) {
            Some(transform) => transform.apply(code),
            None => code.to_string(),
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================
