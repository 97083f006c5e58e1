// SPDX-License-Identifier: PMPL-1.0-or-later
//! Result and report model.
//!
//! A [`CheckResult`] is the single outcome of one check in one run. A
//! [`Report`] collects the results of a run in execution order and derives
//! its [`Summary`] on demand.

pub mod report;

pub use report::{Report, ReportDocument, Summary};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome of a single check execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Passed,
    Failed,
    Warning,
    Error,
    Info,
}

impl CheckStatus {
    /// Whether this outcome should fail a CI gate
    pub fn is_failure(&self) -> bool {
        matches!(self, CheckStatus::Failed | CheckStatus::Error)
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Passed => write!(f, "PASSED"),
            CheckStatus::Failed => write!(f, "FAILED"),
            CheckStatus::Warning => write!(f, "WARNING"),
            CheckStatus::Error => write!(f, "ERROR"),
            CheckStatus::Info => write!(f, "INFO"),
        }
    }
}

/// Severity of a check. A property of the check, not of its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Effort needed to apply a remediation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Complexity::Low => write!(f, "low"),
            Complexity::Medium => write!(f, "medium"),
            Complexity::High => write!(f, "high"),
        }
    }
}

/// Remediation guidance attached to a result. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub description: String,
    pub code_snippet: String,
    pub language: String,
    pub complexity: Complexity,
}

impl Solution {
    /// Create a solution with an empty javascript snippet and medium complexity
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            code_snippet: String::new(),
            language: "javascript".to_string(),
            complexity: Complexity::Medium,
        }
    }

    /// Attach an example snippet and its language tag
    pub fn with_snippet(mut self, code: &str, language: &str) -> Self {
        self.code_snippet = code.trim().to_string();
        self.language = language.to_string();
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }
}

/// The outcome of one check against one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_id: String,
    pub check_name: String,
    pub status: CheckStatus,
    pub severity: Severity,
    pub description: String,
    /// Supplementary evidence, not further validated
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
    pub solution: Option<Solution>,
    pub timestamp: DateTime<Utc>,
}

impl CheckResult {
    /// Create a result stamped with the current time
    pub fn new(
        check_id: &str,
        check_name: &str,
        status: CheckStatus,
        severity: Severity,
        description: &str,
    ) -> Self {
        Self {
            check_id: check_id.to_string(),
            check_name: check_name.to_string(),
            status,
            severity,
            description: description.to_string(),
            details: BTreeMap::new(),
            solution: None,
            timestamp: Utc::now(),
        }
    }

    /// Add one detail entry
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Merge a set of detail entries
    pub fn with_details(mut self, details: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.details.extend(details);
        self
    }

    pub fn with_solution(mut self, solution: Solution) -> Self {
        self.solution = Some(solution);
        self
    }

    /// Attach a solution only when one is given
    pub fn with_optional_solution(mut self, solution: Option<Solution>) -> Self {
        self.solution = solution;
        self
    }

    pub fn is_passed(&self) -> bool {
        self.status == CheckStatus::Passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(serde_json::to_value(CheckStatus::Passed).unwrap(), json!("PASSED"));
        assert_eq!(serde_json::to_value(CheckStatus::Error).unwrap(), json!("ERROR"));
        let parsed: CheckStatus = serde_json::from_value(json!("WARNING")).unwrap();
        assert_eq!(parsed, CheckStatus::Warning);
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Severity::High).unwrap(), json!("high"));
        assert_eq!(Severity::Info.to_string(), "info");
    }

    #[test]
    fn test_solution_defaults() {
        let solution = Solution::new("Add a banner");
        assert_eq!(solution.code_snippet, "");
        assert_eq!(solution.language, "javascript");
        assert_eq!(solution.complexity, Complexity::Medium);

        let solution = solution
            .with_snippet("\n<div id=\"banner\"></div>\n", "html")
            .with_complexity(Complexity::Low);
        assert_eq!(solution.code_snippet, "<div id=\"banner\"></div>");
        assert_eq!(solution.language, "html");
    }

    #[test]
    fn test_result_details() {
        let result = CheckResult::new("x", "X", CheckStatus::Failed, Severity::Medium, "bad")
            .with_detail("issues", vec!["one", "two"])
            .with_detail("count", 2);
        assert_eq!(result.details["issues"], json!(["one", "two"]));
        assert_eq!(result.details["count"], json!(2));
        assert!(result.solution.is_none());
        assert!(!result.is_passed());
    }

    #[test]
    fn test_absent_solution_serializes_as_null() {
        let result = CheckResult::new("x", "X", CheckStatus::Passed, Severity::High, "ok");
        let value = serde_json::to_value(&result).unwrap();
        assert!(value["solution"].is_null());
        assert_eq!(value["status"], "PASSED");
        assert_eq!(value["severity"], "high");
    }
}
