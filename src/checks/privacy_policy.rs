// SPDX-License-Identifier: PMPL-1.0-or-later
//! Privacy policy check - GDPR Art. 12-14, NDPR 2.5
//!
//! Finds the privacy policy link, loads the policy and verifies that the
//! configured sections are present.

use super::{Check, PageContext};
use crate::config::KeywordTables;
use crate::error::Result;
use crate::model::{CheckResult, CheckStatus, Complexity, Solution};
use std::sync::Arc;

const LINK_SNIPPET: &str = r#"
<footer>
  <a href="/privacy-policy">Privacy Policy</a>
  <a href="/cookie-policy">Cookie Policy</a>
  <a href="/terms">Terms of Service</a>
</footer>
"#;

const POLICY_SNIPPET: &str = r#"
<article class="privacy-policy">
  <h1>Privacy Policy</h1>
  <h2>Information we collect</h2>
  <h2>How we use your information</h2>
  <h2>Sharing your information</h2>
  <h2>Cookies and tracking</h2>
  <h2>Your rights under the GDPR</h2>
  <h2>Contact us</h2>
</article>
"#;

/// Privacy policy presence and structure
pub struct PrivacyPolicyCheck {
    keywords: Arc<KeywordTables>,
}

impl PrivacyPolicyCheck {
    pub fn new(keywords: Arc<KeywordTables>) -> Self {
        Self { keywords }
    }
}

impl Check for PrivacyPolicyCheck {
    fn id(&self) -> &str {
        "privacy_policy_check"
    }

    fn name(&self) -> &str {
        "Privacy Policy Check"
    }

    fn description(&self) -> &str {
        "Verifies a privacy policy is linked, reachable and covers the required sections"
    }

    fn requires_fresh_navigation(&self) -> bool {
        true
    }

    fn inspect(&self, page: &mut PageContext<'_>, _url: &str) -> Result<CheckResult> {
        let Some(link) = page.privacy_link(&self.keywords.privacy_link_terms)? else {
            return Ok(self
                .result(
                    CheckStatus::Failed,
                    "No privacy policy link found on the website.",
                )
                .with_solution(
                    Solution::new(
                        "Add a clearly visible link to your privacy policy in the website footer \
                         or main navigation.",
                    )
                    .with_snippet(LINK_SNIPPET, "html")
                    .with_complexity(Complexity::Low),
                ));
        };

        let content = match page.visit(&link.href)? {
            Some(text) if !text.is_empty() => text,
            _ => {
                return Ok(self
                    .result(
                        CheckStatus::Failed,
                        &format!("Could not access privacy policy at {}", link.href),
                    )
                    .with_detail("privacy_policy_url", link.href.as_str())
                    .with_solution(Solution::new(
                        "Ensure the privacy policy URL is accessible and returns a 200 OK \
                         status code.",
                    )));
            }
        };

        let missing: Vec<String> = self
            .keywords
            .policy_sections
            .iter()
            .filter(|s| !content.contains(s.key.as_str()))
            .map(|s| s.name.clone())
            .collect();

        if !missing.is_empty() {
            let list = missing.join(", ");
            return Ok(self
                .result(
                    CheckStatus::Failed,
                    &format!("Privacy policy is missing important sections: {}.", list),
                )
                .with_detail("privacy_policy_url", link.href.as_str())
                .with_detail("missing_sections", missing)
                .with_solution(
                    Solution::new(&format!(
                        "Update your privacy policy to include the following sections: {}.",
                        list
                    ))
                    .with_snippet(POLICY_SNIPPET, "html"),
                ));
        }

        Ok(self
            .result(
                CheckStatus::Passed,
                "Privacy policy is properly implemented and includes all required sections.",
            )
            .with_detail("privacy_policy_url", link.href.as_str())
            .with_detail("has_required_sections", true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{keywords, run_check};
    use crate::inspect::FixtureSite;

    const HOME: &str = r#"<html><body><h1>Shop</h1>
        <footer><a href="/privacy">Privacy Policy</a></footer></body></html>"#;

    const FULL_POLICY: &str = r#"<html><body>
        <h2>Data collection</h2><h2>Data usage</h2><h2>Data sharing</h2>
        <h2>Cookies</h2><h2>Your rights under the GDPR</h2><h2>Contact us</h2>
        </body></html>"#;

    fn run(site: FixtureSite) -> CheckResult {
        run_check(&PrivacyPolicyCheck::new(keywords()), &site, "https://shop.example/")
    }

    #[test]
    fn test_complete_policy_passes() {
        let result = run(FixtureSite::new()
            .page("https://shop.example/", HOME)
            .page("https://shop.example/privacy", FULL_POLICY));
        assert_eq!(result.status, CheckStatus::Passed);
        assert_eq!(result.details["privacy_policy_url"], "https://shop.example/privacy");
    }

    #[test]
    fn test_missing_sections_listed() {
        let result = run(FixtureSite::new()
            .page("https://shop.example/", HOME)
            .page(
                "https://shop.example/privacy",
                "<html><body><h2>Data collection</h2><p>Cookies are used.</p></body></html>",
            ));
        assert_eq!(result.status, CheckStatus::Failed);
        let missing = result.details["missing_sections"].as_array().unwrap();
        assert!(missing.iter().any(|m| m == "your rights"));
        assert!(!missing.iter().any(|m| m == "cookies and tracking"));
    }

    #[test]
    fn test_unreachable_policy() {
        let result = run(FixtureSite::new().page("https://shop.example/", HOME));
        assert_eq!(result.status, CheckStatus::Failed);
        assert_eq!(
            result.description,
            "Could not access privacy policy at https://shop.example/privacy"
        );
    }

    #[test]
    fn test_no_link() {
        let result =
            run(FixtureSite::new().page("https://shop.example/", "<html><body></body></html>"));
        assert_eq!(result.status, CheckStatus::Failed);
        assert_eq!(result.description, "No privacy policy link found on the website.");
    }
}
