// SPDX-License-Identifier: PMPL-1.0-or-later
//! Data breach notification check - GDPR Art. 33-34, NDPR 2.10
//!
//! The privacy policy should describe breach notification and its
//! obligations, and name a Data Protection Officer with a way to reach them.

use super::{contains_any, describe_issues, Check, PageContext};
use crate::config::KeywordTables;
use crate::error::Result;
use crate::model::{CheckResult, CheckStatus, Severity, Solution};
use regex::Regex;
use std::sync::Arc;

const EMAIL_PATTERN: &str = r"[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}";

const BREACH_SNIPPET: &str = r#"
<section id="data-breaches">
  <h2>Personal data breaches</h2>
  <p>If a personal data breach occurs we notify the supervisory authority
     without undue delay and within 72 hours of becoming aware of it, and we
     inform affected individuals when the breach poses a high risk to them.</p>
  <p>Report a suspected breach to our Data Protection Officer:
     <a href="mailto:dpo@example.com">dpo@example.com</a></p>
</section>
"#;

/// Breach notification procedures and DPO contact
pub struct DataBreachCheck {
    keywords: Arc<KeywordTables>,
}

impl DataBreachCheck {
    pub fn new(keywords: Arc<KeywordTables>) -> Self {
        Self { keywords }
    }
}

impl Check for DataBreachCheck {
    fn id(&self) -> &str {
        "data_breach"
    }

    fn name(&self) -> &str {
        "Data Breach Notification"
    }

    fn description(&self) -> &str {
        "Looks for breach notification procedures and Data Protection Officer details"
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn requires_fresh_navigation(&self) -> bool {
        true
    }

    fn inspect(&self, page: &mut PageContext<'_>, _url: &str) -> Result<CheckResult> {
        let kw = &self.keywords;
        let email = Regex::new(EMAIL_PATTERN)?;

        let landing = page.body_text()?;
        let policy = page.privacy_policy_text(&kw.privacy_link_terms)?;

        let mut issues = Vec::new();
        let mut has_breach_procedure = false;
        let mut policy_names_dpo = false;

        match &policy {
            None => issues.push("No privacy policy link found".to_string()),
            Some(text) => {
                has_breach_procedure = contains_any(text, &kw.breach_terms);
                if !has_breach_procedure {
                    issues.push(
                        "No data breach notification procedures found in privacy policy"
                            .to_string(),
                    );
                }
                if !contains_any(text, &kw.breach_requirement_terms) {
                    issues.push(
                        "Insufficient detail about breach notification requirements".to_string(),
                    );
                }
                policy_names_dpo = contains_any(text, &kw.dpo_terms);
                if policy_names_dpo && !email.is_match(text) {
                    issues.push(
                        "Privacy policy mentions DPO but lacks contact information".to_string(),
                    );
                }
            }
        }

        let has_dpo = policy_names_dpo || contains_any(&landing, &kw.dpo_terms);
        if !has_dpo {
            issues.push("No Data Protection Officer (DPO) information found".to_string());
        }

        let solution = Solution::new(
            "Document breach response procedures in the privacy policy, commit to notifying \
             the supervisory authority within 72 hours, explain when affected individuals are \
             informed, and publish a contact route to the Data Protection Officer.",
        )
        .with_snippet(BREACH_SNIPPET, "html");

        let result = if issues.is_empty() {
            self.result(
                CheckStatus::Passed,
                "No data breach notification compliance issues detected.",
            )
        } else {
            self.result(
                CheckStatus::Failed,
                &describe_issues(
                    "Potential GDPR compliance issues with data breach notifications:",
                    &issues,
                ),
            )
            .with_detail("issues", issues)
        };

        Ok(result
            .with_detail("has_breach_procedure", has_breach_procedure)
            .with_detail("has_dpo", has_dpo)
            .with_solution(solution))
    }
}
