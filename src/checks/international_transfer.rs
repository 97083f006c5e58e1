// SPDX-License-Identifier: PMPL-1.0-or-later
//! International data transfer check - GDPR Chapter V, NDPR 2.11
//!
//! Combines what the page loads (third-party services, cookie flags,
//! security headers) with what the privacy policy says about transfers
//! and their safeguards.

use super::third_party_tracking::host_of;
use super::{contains_any, describe_issues, Check, PageContext};
use crate::config::KeywordTables;
use crate::error::Result;
use crate::model::{CheckResult, CheckStatus, Severity, Solution};
use std::sync::Arc;

/// Insecure cookie names listed in an issue before truncating
const MAX_LISTED_COOKIES: usize = 5;

const TRANSFER_SNIPPET: &str = r#"
<section id="international-transfers">
  <h2>International data transfers</h2>
  <p>Some of our service providers process personal data outside the EEA.
     These transfers are protected by the European Commission's Standard
     Contractual Clauses or by an adequacy decision. A transfer impact
     assessment is performed for every destination country.</p>
</section>
"#;

/// Cross-border transfers and their safeguards
pub struct InternationalTransferCheck {
    keywords: Arc<KeywordTables>,
}

impl InternationalTransferCheck {
    pub fn new(keywords: Arc<KeywordTables>) -> Self {
        Self { keywords }
    }
}

impl Check for InternationalTransferCheck {
    fn id(&self) -> &str {
        "international_transfer"
    }

    fn name(&self) -> &str {
        "International Data Transfer"
    }

    fn description(&self) -> &str {
        "Checks third-party services, transfer disclosures and safeguards"
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn requires_fresh_navigation(&self) -> bool {
        true
    }

    fn inspect(&self, page: &mut PageContext<'_>, _url: &str) -> Result<CheckResult> {
        let kw = &self.keywords;
        let own_host = host_of(&page.current_url()).unwrap_or_default();

        let mut services: Vec<String> = Vec::new();
        for resource in page.resources()? {
            let Some(host) = host_of(&resource) else {
                continue;
            };
            if host == own_host || !contains_any(&host, &kw.third_party_service_domains) {
                continue;
            }
            if !services.contains(&host) {
                services.push(host);
            }
        }
        services.sort();

        let missing_headers: Vec<String> = {
            let mut missing = Vec::new();
            for header in &kw.security_headers {
                if page.header(header)?.is_none() {
                    missing.push(header.clone());
                }
            }
            missing
        };

        let insecure_cookies: Vec<String> = page
            .cookies()?
            .into_iter()
            .filter(|c| !c.secure)
            .map(|c| c.name)
            .collect();

        let policy = page.privacy_policy_text(&kw.privacy_link_terms)?;

        let mut issues = Vec::new();
        match &policy {
            None => issues.push("No privacy policy link found".to_string()),
            Some(text) => {
                if !contains_any(text, &kw.transfer_terms) {
                    issues.push(
                        "No clear mention of international data transfers in privacy policy"
                            .to_string(),
                    );
                }
                if !contains_any(text, &kw.safeguard_terms) {
                    issues.push(
                        "No safeguards mentioned for international data transfers".to_string(),
                    );
                }
            }
        }
        if !services.is_empty() {
            issues.push(format!(
                "Found {} third-party services that may involve international data transfers: {}",
                services.len(),
                services.join(", ")
            ));
        }
        if !missing_headers.is_empty() {
            issues.push(format!(
                "Missing recommended security headers: {}",
                missing_headers.join(", ")
            ));
        }
        if !insecure_cookies.is_empty() {
            let listed: Vec<&str> = insecure_cookies
                .iter()
                .take(MAX_LISTED_COOKIES)
                .map(String::as_str)
                .collect();
            let more = if insecure_cookies.len() > MAX_LISTED_COOKIES {
                "..."
            } else {
                ""
            };
            issues.push(format!(
                "Found {} cookies without Secure flag: {}{}",
                insecure_cookies.len(),
                listed.join(", "),
                more
            ));
        }

        let solution = Solution::new(
            "Document every international transfer in the privacy policy, rely on Standard \
             Contractual Clauses or another approved mechanism, carry out transfer impact \
             assessments and encrypt transferred data.",
        )
        .with_snippet(TRANSFER_SNIPPET, "html");

        let result = if issues.is_empty() {
            self.result(
                CheckStatus::Passed,
                "No international data transfer compliance issues detected.",
            )
        } else {
            self.result(
                CheckStatus::Failed,
                &describe_issues(
                    "Potential GDPR compliance issues with international data transfers:",
                    &issues,
                ),
            )
            .with_detail("issues", issues)
        };

        Ok(result
            .with_detail("third_party_services", services)
            .with_detail("missing_security_headers", missing_headers)
            .with_detail("insecure_cookies", insecure_cookies)
            .with_solution(solution))
    }
}
