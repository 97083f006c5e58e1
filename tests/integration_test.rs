// SPDX-License-Identifier: PMPL-1.0-or-later
//! Integration tests for privacybot

use privacybot::checks::BUILTIN_CHECK_IDS;
use privacybot::config::{Config, KeywordTables};
use privacybot::inspect::{FixturePage, FixtureSite};
use privacybot::model::ReportDocument;
use privacybot::report::{generate_report, OutputFormat};
use privacybot::{default_registry, CheckStatus, Report};
use std::path::Path;

const SHOP: &str = "https://shop.example/";
const CLINIC: &str = "http://clinic.example/";

fn audit(site: &FixtureSite, url: &str) -> Report {
    let mut config = Config::default();
    config.runner.settle_ms = 0;
    config.runner.pacing_ms = 0;
    default_registry(&config)
        .expect("default registry")
        .audit(site, url)
        .expect("fixture sessions always start")
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(Path::new("tests/fixtures/compliant").join(name))
        .expect("fixture should exist")
}

/// The compliant shop, with the response headers a hardened server sends
fn hardened_shop() -> FixtureSite {
    let landing = KeywordTables::default()
        .security_headers
        .iter()
        .fold(FixturePage::new(&fixture("index.html")), |page, header| {
            page.with_header(header, "set")
        })
        .with_header(
            "Strict-Transport-Security",
            "max-age=63072000; includeSubDomains; preload",
        );

    FixtureSite::new()
        .with_page(SHOP, landing)
        .page("https://shop.example/privacy", &fixture("privacy.html"))
        .page("https://shop.example/cookie-policy", &fixture("cookie-policy.html"))
        .page("https://shop.example/contact", &fixture("contact.html"))
}

fn failed_ids(report: &Report) -> Vec<&str> {
    report
        .by_status(CheckStatus::Failed)
        .iter()
        .map(|r| r.check_id.as_str())
        .collect()
}

#[test]
fn test_compliant_site_passes_every_check() {
    let site = hardened_shop();
    let report = audit(&site, SHOP);

    assert_eq!(report.len(), BUILTIN_CHECK_IDS.len());
    assert!(
        !report.has_failures(),
        "Compliant fixture should pass, got failures in {:?}",
        failed_ids(&report)
    );
    assert_eq!(report.summary().compliance_score, 100.0);
    assert_eq!(site.sessions_released(), 1);
}

#[test]
fn test_noncompliant_site_fails_every_check() {
    let site = FixtureSite::from_path(Path::new("tests/fixtures/noncompliant"), CLINIC)
        .expect("fixture directory should load");
    let report = audit(&site, CLINIC);

    let summary = report.summary();
    assert_eq!(
        summary.errors,
        0,
        "no check should error: {:?}",
        report.by_status(CheckStatus::Error)
    );
    assert_eq!(summary.failed, BUILTIN_CHECK_IDS.len());
    assert_eq!(summary.pass_rate, 0.0);

    let exposure = report.result("personal_data_exposure").unwrap();
    assert_eq!(exposure.details["exposed_emails"], serde_json::json!(["ada.obi@mail.example"]));
    let transfer = report.result("secure_data_transfer").unwrap();
    assert!(transfer.description.contains("Password form uses GET method"));
}

#[test]
fn test_local_analysis_reports_missing_headers_only() {
    let site = FixtureSite::from_path(Path::new("tests/fixtures/compliant"), SHOP)
        .expect("fixture directory should load");
    let report = audit(&site, SHOP);

    assert_eq!(
        failed_ids(&report),
        vec!["secure_data_transfer", "international_transfer"]
    );
    let transfer = report.result("secure_data_transfer").unwrap();
    assert_eq!(transfer.details["issues"], serde_json::json!(["HSTS header is missing"]));
}

#[test]
fn test_unreachable_target_yields_error_results() {
    let site = hardened_shop();
    let report = audit(&site, "https://elsewhere.example/");

    assert_eq!(report.by_status(CheckStatus::Error).len(), BUILTIN_CHECK_IDS.len());
    assert!(report.has_failures());
}

#[test]
fn test_disabled_checks_are_skipped() {
    let mut config = Config::default();
    config.runner.settle_ms = 0;
    config.runner.pacing_ms = 0;
    config.checks.enabled = vec!["privacy_policy_check".to_string(), "data_breach".to_string()];
    config.checks.disabled = vec!["data_breach".to_string()];

    let report = default_registry(&config)
        .unwrap()
        .audit(&hardened_shop(), SHOP)
        .unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report.results()[0].check_id, "privacy_policy_check");
}

#[test]
fn test_reports_render_in_every_format() {
    let site = FixtureSite::from_path(Path::new("tests/fixtures/noncompliant"), CLINIC).unwrap();
    let report = audit(&site, CLINIC);

    let text = generate_report(&report, OutputFormat::Text);
    assert!(text.contains("URL: http://clinic.example/"));
    assert!(text.contains("RESULT: NON-COMPLIANT"));

    let json = generate_report(&report, OutputFormat::Json);
    let document: ReportDocument = serde_json::from_str(&json).expect("valid JSON");
    assert_eq!(document.results.len(), report.len());
    assert_eq!(document.into_report().summary(), report.summary());

    let sarif = generate_report(&report, OutputFormat::Sarif);
    let parsed: serde_json::Value = serde_json::from_str(&sarif).expect("valid JSON");
    assert_eq!(
        parsed["runs"][0]["results"].as_array().unwrap().len(),
        BUILTIN_CHECK_IDS.len()
    );
}
