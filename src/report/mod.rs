// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report rendering for audit results.
//!
//! Supports multiple output formats:
//! - Text: human-readable results grouped by status, with remediation hints
//! - JSON: the report document for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for CI integration

use crate::model::{CheckResult, CheckStatus, Report, ReportDocument, Severity};
use serde::Serialize;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
    /// SARIF for CI integration
    Sarif,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Sarif => write!(f, "sarif"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "sarif" => Ok(OutputFormat::Sarif),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Render a report in the requested format
pub fn generate_report(report: &Report, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => generate_text_report(report),
        OutputFormat::Json => generate_json_report(report),
        OutputFormat::Sarif => generate_sarif_report(report),
    }
}

/// Status groups in the order the text report lists them
const STATUS_ORDER: [CheckStatus; 5] = [
    CheckStatus::Failed,
    CheckStatus::Error,
    CheckStatus::Warning,
    CheckStatus::Info,
    CheckStatus::Passed,
];

fn generate_text_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("=== Privacybot GDPR/NDPR Compliance Report ===\n\n");
    output.push_str(&format!("URL: {}\n", report.url()));
    output.push_str(&format!(
        "Date: {}\n\n",
        report.timestamp().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if report.is_empty() {
        output.push_str("No checks were run.\n");
        return output;
    }

    let summary = report.summary();
    output.push_str(&format!(
        "Ran {} check(s): {} passed, {} failed, {} error(s), {} warning(s), {} info. \
         Compliance score: {:.2}%\n\n",
        summary.total,
        summary.passed,
        summary.failed,
        summary.errors,
        summary.warnings,
        summary.info,
        summary.compliance_score
    ));

    for status in STATUS_ORDER {
        let results = report.by_status(status);
        if results.is_empty() {
            continue;
        }

        output.push_str(&format!("--- {} ({}) ---\n", status, results.len()));
        for result in results {
            write_result(&mut output, result);
        }
    }

    if summary.errors > 0 && summary.failed == 0 {
        output.push_str("RESULT: INCOMPLETE (some checks could not run)\n");
    } else if report.has_failures() {
        output.push_str("RESULT: NON-COMPLIANT (issues found)\n");
    } else if summary.warnings > 0 {
        output.push_str("RESULT: COMPLIANT WITH WARNINGS\n");
    } else {
        output.push_str("RESULT: COMPLIANT\n");
    }

    output
}

fn write_result(output: &mut String, result: &CheckResult) {
    output.push_str(&format!(
        "[{}] {} (severity: {})\n",
        result.check_id, result.check_name, result.severity
    ));
    for line in result.description.lines() {
        output.push_str(&format!("  {}\n", line));
    }
    if let Some(ref solution) = result.solution {
        if result.status != CheckStatus::Passed {
            output.push_str(&format!(
                "  Fix ({} effort): {}\n",
                solution.complexity, solution.description
            ));
        }
    }
    output.push('\n');
}

fn generate_json_report(report: &Report) -> String {
    serde_json::to_string_pretty(&ReportDocument::from(report))
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize report: {}\"}}", e))
}

/// SARIF report structure (simplified)
#[derive(Debug, Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Serialize)]
struct SarifDriver {
    name: String,
    version: String,
    rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize)]
struct SarifRule {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
}

#[derive(Debug, Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

fn sarif_level(result: &CheckResult) -> &'static str {
    match (result.status, result.severity) {
        (CheckStatus::Error, _) => "error",
        (CheckStatus::Failed, Severity::High) => "error",
        (CheckStatus::Failed, _) | (CheckStatus::Warning, _) => "warning",
        _ => "note",
    }
}

fn generate_sarif_report(report: &Report) -> String {
    let mut rules: Vec<SarifRule> = Vec::new();
    let mut results = Vec::new();

    for result in report.results().iter().filter(|r| !r.is_passed()) {
        if !rules.iter().any(|r| r.id == result.check_id) {
            rules.push(SarifRule {
                id: result.check_id.clone(),
                name: result.check_name.clone(),
            });
        }
        results.push(SarifResult {
            rule_id: result.check_id.clone(),
            level: sarif_level(result).to_string(),
            message: SarifMessage {
                text: result.description.clone(),
            },
            locations: vec![SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifactLocation {
                        uri: report.url().to_string(),
                    },
                },
            }],
        });
    }

    let sarif = SarifReport {
        schema: "https://json.schemastore.org/sarif-2.1.0.json".to_string(),
        version: "2.1.0".to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "privacybot".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    rules,
                },
            },
            results,
        }],
    };

    serde_json::to_string_pretty(&sarif)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize SARIF report: {}\"}}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Solution;

    fn sample_report() -> Report {
        let mut report = Report::new("https://shop.example/");
        report.add_result(
            CheckResult::new(
                "cookie_banner_check",
                "Cookie Consent Banner",
                CheckStatus::Failed,
                Severity::High,
                "Cookie banner issues:\n\n• No clear 'Reject' or 'Decline' option found",
            )
            .with_solution(Solution::new("Offer a reject button")),
        );
        report.add_result(CheckResult::new(
            "data_breach",
            "Data Breach Notification",
            CheckStatus::Passed,
            Severity::Medium,
            "No data breach notification compliance issues detected.",
        ));
        report
    }

    #[test]
    fn test_text_report_groups_by_status() {
        let text = generate_report(&sample_report(), OutputFormat::Text);
        assert!(text.contains("URL: https://shop.example/"));
        assert!(text.contains("Compliance score: 50.00%"));
        let failed = text.find("--- FAILED (1) ---").unwrap();
        let passed = text.find("--- PASSED (1) ---").unwrap();
        assert!(failed < passed);
        assert!(text.contains("  • No clear 'Reject' or 'Decline' option found"));
        assert!(text.contains("Fix (medium effort): Offer a reject button"));
        assert!(text.ends_with("RESULT: NON-COMPLIANT (issues found)\n"));
    }

    #[test]
    fn test_text_report_empty() {
        let text = generate_report(&Report::new("https://shop.example/"), OutputFormat::Text);
        assert!(text.contains("No checks were run."));
    }

    #[test]
    fn test_text_report_compliant() {
        let mut report = Report::new("https://shop.example/");
        report.add_result(CheckResult::new("a", "A", CheckStatus::Passed, Severity::High, "ok"));
        let text = generate_report(&report, OutputFormat::Text);
        assert!(text.ends_with("RESULT: COMPLIANT\n"));
    }

    #[test]
    fn test_json_report_is_document() {
        let report = sample_report();
        let json = generate_report(&report, OutputFormat::Json);
        let document: ReportDocument = serde_json::from_str(&json).expect("valid JSON");
        assert_eq!(document.summary.total, 2);
        assert_eq!(document.results[0].status, CheckStatus::Failed);
        assert_eq!(document.into_report().summary(), report.summary());
    }

    #[test]
    fn test_sarif_report_skips_passed() {
        let sarif = generate_report(&sample_report(), OutputFormat::Sarif);
        let parsed: serde_json::Value = serde_json::from_str(&sarif).expect("valid JSON");
        assert_eq!(parsed["version"], "2.1.0");
        let results = parsed["runs"][0]["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["ruleId"], "cookie_banner_check");
        assert_eq!(results[0]["level"], "error");
        assert_eq!(
            results[0]["locations"][0]["physicalLocation"]["artifactLocation"]["uri"],
            "https://shop.example/"
        );
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("sarif".parse::<OutputFormat>().unwrap(), OutputFormat::Sarif);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
