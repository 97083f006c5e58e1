// SPDX-License-Identifier: PMPL-1.0-or-later
//! Data subject rights check - GDPR Art. 15-22, NDPR 3.1
//!
//! Looks for information about data subject rights (on the page, in forms,
//! in the privacy policy or on dedicated pages) and for a contact route
//! through which requests can be made.

use super::{contains_any, describe_issues, matching_terms, Check, PageContext};
use crate::config::KeywordTables;
use crate::error::Result;
use crate::inspect::Locator;
use crate::model::{CheckResult, CheckStatus, Solution};
use std::sync::Arc;

/// Contact pages followed at most
const MAX_CONTACT_PAGES: usize = 2;

const DSAR_SNIPPET: &str = r#"
<section id="your-rights">
  <h2>Your data protection rights</h2>
  <ul>
    <li>Right to access your personal data</li>
    <li>Right to rectification</li>
    <li>Right to erasure ("right to be forgotten")</li>
    <li>Right to data portability</li>
  </ul>
  <form action="/privacy-request" method="post">
    <label>Email <input type="email" name="email" required></label>
    <select name="request_type">
      <option value="access">Subject access request</option>
      <option value="erasure">Erasure request</option>
    </select>
    <button type="submit">Submit privacy request</button>
  </form>
  <p>Or contact our Data Protection Officer at dpo@example.com.</p>
</section>
"#;

/// Information about and routes for data subject requests
pub struct DataSubjectRightsCheck {
    keywords: Arc<KeywordTables>,
}

impl DataSubjectRightsCheck {
    pub fn new(keywords: Arc<KeywordTables>) -> Self {
        Self { keywords }
    }
}

impl Check for DataSubjectRightsCheck {
    fn id(&self) -> &str {
        "data_subject_rights"
    }

    fn name(&self) -> &str {
        "Data Subject Rights Implementation"
    }

    fn description(&self) -> &str {
        "Looks for data subject rights information and a contact route for requests"
    }

    fn requires_fresh_navigation(&self) -> bool {
        true
    }

    fn inspect(&self, page: &mut PageContext<'_>, _url: &str) -> Result<CheckResult> {
        let kw = &self.keywords;

        let terms_found = matching_terms(&page.body_text()?, &kw.dsar_terms);
        let dsar_forms = page
            .find_elements(&Locator::tag("form"))?
            .iter()
            .filter(|f| contains_any(&f.outer_html().to_lowercase(), &kw.dsar_terms))
            .count();

        let links = page.links()?;
        let dsar_pages: Vec<String> = links
            .iter()
            .filter(|l| l.mentions(&kw.dsar_terms))
            .map(|l| l.href.clone())
            .collect();
        let contact_pages: Vec<String> = links
            .iter()
            .filter(|l| contains_any(&l.text, &kw.contact_terms))
            .map(|l| l.href.clone())
            .take(MAX_CONTACT_PAGES)
            .collect();

        let policy_mentions_rights = page
            .privacy_policy_text(&kw.privacy_link_terms)?
            .map(|text| contains_any(&text, &kw.dsar_terms))
            .unwrap_or(false);

        let mut contact_text = String::new();
        for href in &contact_pages {
            if let Some(text) = page.visit(href)? {
                contact_text.push_str(&text);
                contact_text.push(' ');
            }
        }
        let has_dsar_contact = contains_any(&contact_text, &kw.dsar_terms)
            || contains_any(&contact_text, &kw.privacy_link_terms);

        let mut issues = Vec::new();
        if terms_found.is_empty()
            && dsar_forms == 0
            && !policy_mentions_rights
            && dsar_pages.is_empty()
        {
            issues.push(
                "No clear information about data subject rights found on the website".to_string(),
            );
        }
        if !has_dsar_contact {
            issues.push("No clear contact information for data subject requests found".to_string());
        }

        let result = if issues.is_empty() {
            self.result(
                CheckStatus::Passed,
                "The website appears to implement data subject rights with clear information \
                 and contact methods for requests.",
            )
        } else {
            self.result(
                CheckStatus::Failed,
                &describe_issues(
                    "Potential issues with data subject rights implementation:",
                    &issues,
                ),
            )
            .with_detail("issues", issues)
            .with_solution(
                Solution::new(
                    "Create a dedicated data subject request page that explains each right \
                     (access, rectification, erasure, portability), offers a way to submit \
                     requests, names the Data Protection Officer and states the response timeline.",
                )
                .with_snippet(DSAR_SNIPPET, "html"),
            )
        };

        Ok(result
            .with_detail("dsar_terms_found", terms_found)
            .with_detail("dsar_forms", dsar_forms)
            .with_detail("dsar_pages", dsar_pages)
            .with_detail("policy_mentions_rights", policy_mentions_rights)
            .with_detail("has_dsar_contact", has_dsar_contact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{issues, keywords, run_check};
    use crate::inspect::FixtureSite;

    const HOME: &str = r#"<html><body>
        <a href="/privacy">Privacy</a> <a href="/contact">Contact us</a>
        </body></html>"#;

    fn run(site: FixtureSite) -> CheckResult {
        run_check(&DataSubjectRightsCheck::new(keywords()), &site, "https://shop.example/")
    }

    #[test]
    fn test_rights_and_contact_pass() {
        let result = run(FixtureSite::new()
            .page("https://shop.example/", HOME)
            .page(
                "https://shop.example/privacy",
                "<html><body>You have the right to access and the right to erasure.</body></html>",
            )
            .page(
                "https://shop.example/contact",
                "<html><body>Send privacy requests to our Data Protection Officer.</body></html>",
            ));
        assert_eq!(result.status, CheckStatus::Passed);
        assert_eq!(result.details["policy_mentions_rights"], true);
    }

    #[test]
    fn test_nothing_found() {
        let result = run(FixtureSite::new().page(
            "https://shop.example/",
            "<html><body><p>Welcome</p></body></html>",
        ));
        assert_eq!(result.status, CheckStatus::Failed);
        assert_eq!(issues(&result).len(), 2);
    }

    #[test]
    fn test_broken_contact_link_is_not_an_error() {
        let result = run(FixtureSite::new()
            .page("https://shop.example/", HOME)
            .page(
                "https://shop.example/privacy",
                "<html><body>Data portability requests are welcome.</body></html>",
            ));
        assert_eq!(result.status, CheckStatus::Failed);
        assert_eq!(
            issues(&result),
            vec!["No clear contact information for data subject requests found".to_string()]
        );
    }
}
