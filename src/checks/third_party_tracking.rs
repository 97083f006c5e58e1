// SPDX-License-Identifier: PMPL-1.0-or-later
//! Third-party tracking check - GDPR Art. 6, Art. 13(1)(e), ePrivacy Art. 5(3)
//!
//! Detects tracker resources, tracking cookies and tracking scripts on the
//! page, and checks that the privacy policy discloses third-party sharing.

use super::{contains_any, describe_issues, Check, PageContext};
use crate::config::KeywordTables;
use crate::error::Result;
use crate::inspect::Locator;
use crate::model::{CheckResult, CheckStatus, Solution};
use std::sync::Arc;
use url::Url;

/// Inline script excerpt length kept as evidence
const EXCERPT_CHARS: usize = 100;

const CONSENT_GATED_SNIPPET: &str = r#"
<!-- Load analytics only after consent -->
<script type="text/plain" data-cookieconsent="statistics"
        src="https://www.googletagmanager.com/gtag/js?id=G-XXXX"></script>
<script>
  window.addEventListener('consent-granted', () => {
    document.querySelectorAll('script[type="text/plain"][data-cookieconsent]')
      .forEach((s) => {
        const live = document.createElement('script');
        live.src = s.src;
        document.head.appendChild(live);
      });
  });
</script>
"#;

/// Trackers, tracking cookies and their disclosure
pub struct ThirdPartyTrackingCheck {
    keywords: Arc<KeywordTables>,
}

impl ThirdPartyTrackingCheck {
    pub fn new(keywords: Arc<KeywordTables>) -> Self {
        Self { keywords }
    }
}

/// Host of a URL without a leading `www.`
pub(crate) fn host_of(resource: &str) -> Option<String> {
    let url = Url::parse(resource).ok()?;
    let host = url.host_str()?.to_lowercase();
    Some(host.trim_start_matches("www.").to_string())
}

impl Check for ThirdPartyTrackingCheck {
    fn id(&self) -> &str {
        "third_party_tracking"
    }

    fn name(&self) -> &str {
        "Third-Party Tracking Detection"
    }

    fn description(&self) -> &str {
        "Detects tracker requests, tracking cookies and scripts, and their disclosure"
    }

    fn requires_fresh_navigation(&self) -> bool {
        true
    }

    fn inspect(&self, page: &mut PageContext<'_>, _url: &str) -> Result<CheckResult> {
        let kw = &self.keywords;

        let mut tracker_domains: Vec<String> = Vec::new();
        for resource in page.resources()? {
            if !contains_any(&resource.to_lowercase(), &kw.tracker_domains) {
                continue;
            }
            if let Some(host) = host_of(&resource) {
                if !tracker_domains.contains(&host) {
                    tracker_domains.push(host);
                }
            }
        }

        let tracking_cookies: Vec<String> = page
            .cookies()?
            .into_iter()
            .filter(|c| contains_any(&c.name.to_lowercase(), &kw.tracking_cookie_names))
            .map(|c| c.name)
            .collect();

        let mut tracking_scripts = Vec::new();
        for script in page.find_elements(&Locator::tag("script"))? {
            let evidence = match script.attr("src") {
                Some(src) => src.to_string(),
                None => script.outer_html().chars().take(EXCERPT_CHARS).collect(),
            };
            let haystack = match script.attr("src") {
                Some(src) => src.to_lowercase(),
                None => script.outer_html().to_lowercase(),
            };
            if contains_any(&haystack, &kw.tracking_script_terms) {
                tracking_scripts.push(evidence);
            }
        }

        let discloses_third_parties = page
            .privacy_policy_text(&kw.privacy_link_terms)?
            .map(|text| contains_any(&text, &kw.third_party_disclosure_terms))
            .unwrap_or(false);

        let mut issues = Vec::new();
        if !tracker_domains.is_empty() {
            issues.push(format!(
                "Found {} potential third-party trackers",
                tracker_domains.len()
            ));
        }
        if !tracking_cookies.is_empty() {
            issues.push(format!("Found {} tracking cookies", tracking_cookies.len()));
        }
        if !tracking_scripts.is_empty() {
            issues.push(format!("Found {} tracking scripts", tracking_scripts.len()));
        }
        if !discloses_third_parties {
            issues.push(
                "No clear disclosure of third-party data sharing in privacy policy".to_string(),
            );
        }

        let result = if issues.is_empty() {
            self.result(CheckStatus::Passed, "No obvious third-party trackers detected.")
        } else {
            self.result(
                CheckStatus::Failed,
                &describe_issues("Potential third-party tracking issues found:", &issues),
            )
            .with_detail("issues", issues)
            .with_solution(
                Solution::new(
                    "Disclose all third-party trackers in your privacy policy, load them only \
                     after consent, prefer privacy-friendly analytics and sign data processing \
                     agreements with every third party.",
                )
                .with_snippet(CONSENT_GATED_SNIPPET, "html"),
            )
        };

        Ok(result
            .with_detail("tracker_domains", tracker_domains)
            .with_detail("tracking_cookies", tracking_cookies)
            .with_detail("tracking_scripts", tracking_scripts)
            .with_detail("third_party_disclosure", discloses_third_parties))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{issues, keywords, run_check};
    use crate::inspect::{Cookie, FixturePage, FixtureSite};

    const POLICY: &str = "<html><body>We share data with service providers.</body></html>";

    fn run(site: FixtureSite) -> CheckResult {
        run_check(&ThirdPartyTrackingCheck::new(keywords()), &site, "https://shop.example/")
    }

    #[test]
    fn test_clean_page_with_disclosure_passes() {
        let result = run(FixtureSite::new()
            .page(
                "https://shop.example/",
                r#"<html><body><script src="/app.js"></script>
                   <a href="/privacy">Privacy</a></body></html>"#,
            )
            .page("https://shop.example/privacy", POLICY));
        assert_eq!(result.status, CheckStatus::Passed);
    }

    #[test]
    fn test_trackers_cookies_and_scripts_found() {
        let home = FixturePage::new(
            r#"<html><head>
                <script src="https://www.google-analytics.com/analytics.js"></script>
                <script>fbq('track', 'PageView');</script>
               </head><body><a href="/privacy">Privacy</a></body></html>"#,
        )
        .with_cookie(Cookie::new("_ga", "GA1.2.3"))
        .with_cookie(Cookie::new("session", "abc"));
        let result = run(FixtureSite::new()
            .with_page("https://shop.example/", home)
            .page("https://shop.example/privacy", POLICY));

        assert_eq!(result.status, CheckStatus::Failed);
        assert_eq!(result.details["tracker_domains"][0], "google-analytics.com");
        assert_eq!(result.details["tracking_cookies"].as_array().unwrap().len(), 1);
        assert_eq!(result.details["tracking_scripts"].as_array().unwrap().len(), 2);
        assert_eq!(result.details["third_party_disclosure"], true);
        assert_eq!(issues(&result).len(), 3);
    }

    #[test]
    fn test_missing_policy_is_undisclosed() {
        let result =
            run(FixtureSite::new().page("https://shop.example/", "<html><body></body></html>"));
        assert_eq!(
            issues(&result),
            vec!["No clear disclosure of third-party data sharing in privacy policy".to_string()]
        );
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://www.Hotjar.com/x.js").as_deref(), Some("hotjar.com"));
        assert_eq!(host_of("not a url"), None);
    }
}
