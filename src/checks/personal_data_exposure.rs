// SPDX-License-Identifier: PMPL-1.0-or-later
//! Personal data exposure check - GDPR Art. 5(1)(f), Art. 32
//!
//! Looks at the text a visitor sees before giving any consent. Email
//! addresses that are not published contact links, and markers of
//! sensitive records such as patient data, suggest personal data leaking
//! into public pages.

use super::{describe_issues, Check, PageContext};
use crate::config::KeywordTables;
use crate::error::Result;
use crate::inspect::Locator;
use crate::model::{CheckResult, CheckStatus, Severity, Solution};
use regex::Regex;
use std::sync::Arc;

const EMAIL_PATTERN: &str = r"[a-z0-9._%+-]+@[a-z0-9-]+(\.[a-z0-9-]+)*\.[a-z]{2,}";

/// Exposed addresses listed in an issue before truncating
const MAX_LISTED: usize = 5;

const EXPOSURE_SNIPPET: &str = r#"
<!-- Publish contact addresses deliberately, never records -->
<a href="mailto:privacy@example.com">privacy@example.com</a>

<!-- Render personal records only behind authentication -->
{% if user.is_authenticated and user.can_view(record) %}
  {{ record.summary }}
{% endif %}
"#;

/// Personal data visible on the landing page
pub struct PersonalDataExposureCheck {
    keywords: Arc<KeywordTables>,
}

impl PersonalDataExposureCheck {
    pub fn new(keywords: Arc<KeywordTables>) -> Self {
        Self { keywords }
    }

    fn marker_patterns(&self) -> Result<Vec<(String, Regex)>> {
        self.keywords
            .sensitive_markers
            .iter()
            .map(|m| Ok((m.clone(), Regex::new(&format!(r"(?i)\b{}\b", regex::escape(m)))?)))
            .collect()
    }
}

/// Address part of a `mailto:` target, lowercased
fn mailto_address(href: &str) -> Option<String> {
    let rest = href.trim().strip_prefix("mailto:")?;
    let address = rest.split('?').next().unwrap_or_default();
    (!address.is_empty()).then(|| address.to_lowercase())
}

impl Check for PersonalDataExposureCheck {
    fn id(&self) -> &str {
        "personal_data_exposure"
    }

    fn name(&self) -> &str {
        "Personal Data Exposure"
    }

    fn description(&self) -> &str {
        "Looks for email addresses and sensitive record markers in public page text"
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn requires_fresh_navigation(&self) -> bool {
        true
    }

    fn inspect(&self, page: &mut PageContext<'_>, _url: &str) -> Result<CheckResult> {
        let email = Regex::new(EMAIL_PATTERN)?;
        let text = page.body_text()?;

        let published: Vec<String> = page
            .find_elements(&Locator::css("a[href^=\"mailto:\"]"))?
            .iter()
            .filter_map(|a| a.attr("href").and_then(mailto_address))
            .collect();

        let mut emails: Vec<String> = Vec::new();
        for found in email.find_iter(&text) {
            let address = found.as_str().trim_end_matches('.').to_string();
            if !published.contains(&address) && !emails.contains(&address) {
                emails.push(address);
            }
        }

        let markers: Vec<String> = self
            .marker_patterns()?
            .into_iter()
            .filter(|(_, pattern)| pattern.is_match(&text))
            .map(|(marker, _)| marker)
            .collect();

        let mut issues = Vec::new();
        if !emails.is_empty() {
            let listed: Vec<&str> = emails.iter().take(MAX_LISTED).map(String::as_str).collect();
            let more = if emails.len() > MAX_LISTED { "..." } else { "" };
            issues.push(format!(
                "Found {} email addresses exposed in page text: {}{}",
                emails.len(),
                listed.join(", "),
                more
            ));
        }
        if !markers.is_empty() {
            issues.push(format!(
                "Page text contains sensitive data markers: {}",
                markers.join(", ")
            ));
        }

        let result = if issues.is_empty() {
            self.result(
                CheckStatus::Passed,
                "No personal data appears to be exposed in the page text.",
            )
        } else {
            self.result(
                CheckStatus::Failed,
                &describe_issues("Possible personal data exposed before consent:", &issues),
            )
            .with_detail("issues", issues)
            .with_solution(
                Solution::new(
                    "Remove personal data from public pages, publish contact addresses only as \
                     deliberate contact links, and render personal records only to \
                     authenticated and authorised users.",
                )
                .with_snippet(EXPOSURE_SNIPPET, "html"),
            )
        };

        Ok(result
            .with_detail("exposed_emails", emails)
            .with_detail("sensitive_markers", markers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{issues, keywords, run_check};
    use crate::inspect::FixtureSite;

    fn run(html: &str) -> CheckResult {
        let site = FixtureSite::new().page("https://clinic.example/", html);
        run_check(&PersonalDataExposureCheck::new(keywords()), &site, "https://clinic.example/")
    }

    #[test]
    fn test_published_contact_address_passes() {
        let result = run(
            r#"<p>Questions? Write to <a href="mailto:Privacy@Clinic.example?subject=Hi">privacy@clinic.example</a>.</p>
               <p>Download our Adobe brochure.</p>"#,
        );
        assert_eq!(result.status, CheckStatus::Passed);
        assert!(result.solution.is_none());
    }

    #[test]
    fn test_exposed_records() {
        let result = run(
            "<table><tr><td>Patient: Ada Obi</td><td>DOB 1990-02-01</td>\
             <td>ada.obi@mail.example</td></tr></table>",
        );
        assert_eq!(
            issues(&result),
            vec![
                "Found 1 email addresses exposed in page text: ada.obi@mail.example".to_string(),
                "Page text contains sensitive data markers: patient, dob".to_string(),
            ]
        );
        assert_eq!(result.severity, Severity::Medium);
    }

    #[test]
    fn test_mailto_address() {
        assert_eq!(
            mailto_address("mailto:DPO@x.example?subject=a").as_deref(),
            Some("dpo@x.example")
        );
        assert_eq!(mailto_address("mailto:"), None);
        assert_eq!(mailto_address("https://x.example"), None);
    }
}
