// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report aggregation for one audited target.

use super::{CheckResult, CheckStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered results of one run against one target.
///
/// Only the check runner appends results; everyone else reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    url: String,
    timestamp: DateTime<Utc>,
    results: Vec<CheckResult>,
}

impl Report {
    pub(crate) fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            timestamp: Utc::now(),
            results: Vec::new(),
        }
    }

    pub(crate) fn add_result(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Results in execution order
    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results with the given status, in execution order
    pub fn by_status(&self, status: CheckStatus) -> Vec<&CheckResult> {
        self.results.iter().filter(|r| r.status == status).collect()
    }

    /// Look up the result of a check by id
    pub fn result(&self, check_id: &str) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.check_id == check_id)
    }

    /// Whether any check failed or errored
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.status.is_failure())
    }

    /// Derive aggregate metrics. Pure; repeated calls agree.
    pub fn summary(&self) -> Summary {
        summarize(&self.results)
    }

    /// The serializable document shape handed to renderers
    pub fn to_document(&self) -> ReportDocument {
        ReportDocument {
            url: self.url.clone(),
            timestamp: self.timestamp,
            summary: self.summary(),
            results: self.results.clone(),
        }
    }
}

/// Aggregate metrics over a report's results
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    pub errors: usize,
    pub info: usize,
    /// passed / total, two decimals, 0 when there are no results
    pub pass_rate: f64,
    /// pass_rate as a percentage, two decimals
    pub compliance_score: f64,
}

/// Summarize a sequence of results
pub fn summarize(results: &[CheckResult]) -> Summary {
    let count = |status: CheckStatus| results.iter().filter(|r| r.status == status).count();

    let total = results.len();
    let passed = count(CheckStatus::Passed);

    let (pass_rate, compliance_score) = if total == 0 {
        (0.0, 0.0)
    } else {
        let ratio = passed as f64 / total as f64;
        (round2(ratio), round2(ratio * 100.0))
    };

    Summary {
        total,
        passed,
        failed: count(CheckStatus::Failed),
        warnings: count(CheckStatus::Warning),
        errors: count(CheckStatus::Error),
        info: count(CheckStatus::Info),
        pass_rate,
        compliance_score,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Serialized form of a report: url, timestamp, summary and results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub summary: Summary,
    pub results: Vec<CheckResult>,
}

impl ReportDocument {
    /// Rebuild the report. The stored summary is discarded and re-derived.
    pub fn into_report(self) -> Report {
        Report {
            url: self.url,
            timestamp: self.timestamp,
            results: self.results,
        }
    }
}

impl From<&Report> for ReportDocument {
    fn from(report: &Report) -> Self {
        report.to_document()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Severity, Solution};

    fn result(id: &str, status: CheckStatus) -> CheckResult {
        CheckResult::new(id, id, status, Severity::High, "test")
    }

    fn report_with(statuses: &[CheckStatus]) -> Report {
        let mut report = Report::new("https://example.com");
        for (i, status) in statuses.iter().enumerate() {
            report.add_result(result(&format!("check_{}", i), *status));
        }
        report
    }

    #[test]
    fn test_empty_report_summary() {
        let summary = Report::new("https://example.com").summary();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.pass_rate, 0.0);
        assert_eq!(summary.compliance_score, 0.0);
    }

    #[test]
    fn test_mixed_summary() {
        let report = report_with(&[
            CheckStatus::Passed,
            CheckStatus::Passed,
            CheckStatus::Failed,
            CheckStatus::Error,
        ]);
        let summary = report.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.warnings, 0);
        assert_eq!(summary.pass_rate, 0.5);
        assert_eq!(summary.compliance_score, 50.0);
    }

    #[test]
    fn test_pass_rate_rounding() {
        let report = report_with(&[CheckStatus::Passed, CheckStatus::Failed, CheckStatus::Info]);
        let summary = report.summary();
        assert_eq!(summary.pass_rate, 0.33);
        assert_eq!(summary.compliance_score, 33.33);
        assert_eq!(summary.info, 1);
    }

    #[test]
    fn test_summary_is_idempotent() {
        let report = report_with(&[CheckStatus::Passed, CheckStatus::Warning]);
        assert_eq!(report.summary(), report.summary());
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_results_keep_insertion_order() {
        let report = report_with(&[CheckStatus::Failed, CheckStatus::Passed, CheckStatus::Error]);
        let ids: Vec<&str> = report.results().iter().map(|r| r.check_id.as_str()).collect();
        assert_eq!(ids, vec!["check_0", "check_1", "check_2"]);
        assert!(report.has_failures());
        assert_eq!(report.by_status(CheckStatus::Passed).len(), 1);
        assert_eq!(report.result("check_2").unwrap().status, CheckStatus::Error);
    }

    #[test]
    fn test_document_round_trip() {
        let mut report = Report::new("https://example.com");
        report.add_result(
            result("cookie_banner_check", CheckStatus::Failed)
                .with_solution(Solution::new("Add a banner").with_snippet("<div></div>", "html")),
        );
        report.add_result(
            CheckResult::new("data_breach", "Breach", CheckStatus::Passed, Severity::Medium, "ok")
                .with_detail("execution_time_seconds", 0.12),
        );

        let json = serde_json::to_string(&report.to_document()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["url"], "https://example.com");
        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(value["results"][0]["solution"]["language"], "html");
        assert!(value["results"][1]["solution"].is_null());

        let restored = serde_json::from_str::<ReportDocument>(&json)
            .unwrap()
            .into_report();
        assert_eq!(restored.url(), report.url());
        assert_eq!(restored.timestamp(), report.timestamp());
        for (a, b) in restored.results().iter().zip(report.results()) {
            assert_eq!(a.check_id, b.check_id);
            assert_eq!(a.status, b.status);
            assert_eq!(a.severity, b.severity);
            assert_eq!(a.solution.is_some(), b.solution.is_some());
        }
        assert_eq!(restored.summary(), report.summary());
    }
}
