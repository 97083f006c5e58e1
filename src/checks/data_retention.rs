// SPDX-License-Identifier: PMPL-1.0-or-later
//! Data retention check - GDPR Art. 5(1)(e), Art. 13(2)(a)

use super::{contains_any, describe_issues, Check, PageContext};
use crate::config::KeywordTables;
use crate::error::Result;
use crate::model::{CheckResult, CheckStatus, Severity, Solution};
use std::sync::Arc;

const RETENTION_SNIPPET: &str = r#"
<section id="data-retention">
  <h2>How long we keep your data</h2>
  <table>
    <tr><th>Data</th><th>Retention period</th><th>Legal basis</th></tr>
    <tr><td>Account data</td><td>Until account deletion plus 30 days</td><td>Contract</td></tr>
    <tr><td>Order records</td><td>7 years</td><td>Legal obligation</td></tr>
    <tr><td>Analytics cookies</td><td>Expire after 13 months</td><td>Consent</td></tr>
  </table>
</section>
"#;

/// Retention periods and their legal basis in the privacy policy
pub struct DataRetentionCheck {
    keywords: Arc<KeywordTables>,
}

impl DataRetentionCheck {
    pub fn new(keywords: Arc<KeywordTables>) -> Self {
        Self { keywords }
    }
}

impl Check for DataRetentionCheck {
    fn id(&self) -> &str {
        "data_retention"
    }

    fn name(&self) -> &str {
        "Data Retention Policy"
    }

    fn description(&self) -> &str {
        "Looks for retention periods, their legal basis and cookie lifetimes"
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn requires_fresh_navigation(&self) -> bool {
        true
    }

    fn inspect(&self, page: &mut PageContext<'_>, _url: &str) -> Result<CheckResult> {
        let kw = &self.keywords;

        let cookie_page = page.find_link(&kw.cookie_policy_link_terms)?;
        let policy = page
            .privacy_policy_text(&kw.privacy_link_terms)?
            .unwrap_or_default();

        let has_retention_section = contains_any(&policy, &kw.retention_terms);
        let has_legal_basis = contains_any(&policy, &kw.legal_basis_terms);
        let has_retention_periods = contains_any(&policy, &kw.retention_period_terms);

        let cookie_text = match cookie_page {
            Some(link) => page.visit(&link.href)?.unwrap_or_default(),
            None => String::new(),
        };
        let has_cookie_retention = contains_any(&cookie_text, &kw.cookie_retention_terms)
            || contains_any(&policy, &kw.cookie_retention_terms);

        let mut issues = Vec::new();
        if !has_retention_section {
            issues.push("No explicit data retention period found in privacy policy".to_string());
        }
        if !has_legal_basis {
            issues.push("Legal basis for data retention not clearly specified".to_string());
        }
        if !has_retention_periods {
            issues.push(
                "Specific retention periods for different data types not specified".to_string(),
            );
        }
        if !has_cookie_retention {
            issues.push("Cookie retention periods not clearly specified".to_string());
        }

        let solution = Solution::new(
            "Document the retention policy in the privacy policy: give retention periods per \
             category of personal data, explain the legal basis for keeping it, and state how \
             long cookies persist.",
        )
        .with_snippet(RETENTION_SNIPPET, "html");

        let result = if issues.is_empty() {
            self.result(
                CheckStatus::Passed,
                "Data retention policies appear to be properly documented and implemented.",
            )
        } else {
            self.result(
                CheckStatus::Failed,
                &describe_issues(
                    "Potential GDPR compliance issues with data retention policies:",
                    &issues,
                ),
            )
            .with_detail("issues", issues)
        };

        Ok(result
            .with_detail("has_retention_section", has_retention_section)
            .with_detail("has_legal_basis", has_legal_basis)
            .with_detail("has_retention_periods", has_retention_periods)
            .with_detail("has_cookie_retention", has_cookie_retention)
            .with_solution(solution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{issues, keywords, run_check};
    use crate::inspect::FixtureSite;

    fn run(site: FixtureSite) -> CheckResult {
        run_check(&DataRetentionCheck::new(keywords()), &site, "https://shop.example/")
    }

    #[test]
    fn test_documented_retention_passes() {
        let result = run(FixtureSite::new()
            .page(
                "https://shop.example/",
                r#"<a href="/privacy">Privacy</a><a href="/cookies">Cookie policy</a>"#,
            )
            .page(
                "https://shop.example/privacy",
                "<p>Data retention: we keep order records for 7 years under a legal obligation.</p>",
            )
            .page(
                "https://shop.example/cookies",
                "<p>Analytics cookies are stored for 13 months.</p>",
            ));
        assert_eq!(result.status, CheckStatus::Passed);
        assert_eq!(result.severity, Severity::Medium);
        assert!(result.solution.is_some());
    }

    #[test]
    fn test_no_policy_reports_every_gap() {
        let result = run(FixtureSite::new().page("https://shop.example/", "<p>Hello</p>"));
        assert_eq!(result.status, CheckStatus::Failed);
        assert_eq!(issues(&result).len(), 4);
        assert_eq!(result.details["has_legal_basis"], false);
    }

    #[test]
    fn test_cookie_policy_link_terms_from_tables() {
        let mut tables = KeywordTables::default();
        tables.cookie_policy_link_terms = vec!["cookie-richtlinie".to_string()];
        let site = FixtureSite::new()
            .page("https://shop.example/", r#"<a href="/cookie-richtlinie">Cookies</a>"#)
            .page(
                "https://shop.example/cookie-richtlinie",
                "<p>Analytics cookies are stored for 13 months.</p>",
            );
        let check = DataRetentionCheck::new(Arc::new(tables));
        let result = run_check(&check, &site, "https://shop.example/");
        assert_eq!(result.details["has_cookie_retention"], true);
    }
}
