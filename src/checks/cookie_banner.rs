// SPDX-License-Identifier: PMPL-1.0-or-later
//! Cookie consent banner check - GDPR Art. 7, ePrivacy Art. 5(3)
//!
//! Locates a consent banner and verifies it offers:
//! - a clear accept action
//! - an equally available reject action
//! - a link to more information about cookies

use super::{contains_any, describe_issues, Check, PageContext};
use crate::config::KeywordTables;
use crate::error::Result;
use crate::inspect::{Element, Locator};
use crate::model::{CheckResult, CheckStatus, Complexity, Solution};
use std::sync::Arc;

const BANNER_SNIPPET: &str = r#"
<div id="cookie-consent" role="dialog" aria-label="Cookie consent">
  <p>We use cookies to improve your experience.
     <a href="/cookie-policy">Learn more</a></p>
  <button id="cookie-reject">Reject all</button>
  <button id="cookie-accept">Accept all</button>
</div>
<script>
  const banner = document.getElementById('cookie-consent');
  const remember = (choice) => {
    document.cookie = `cookie_consent=${choice}; path=/; max-age=31536000; SameSite=Lax`;
    banner.remove();
  };
  document.getElementById('cookie-accept').onclick = () => remember('all');
  document.getElementById('cookie-reject').onclick = () => remember('necessary');
  if (document.cookie.includes('cookie_consent=')) banner.remove();
</script>
"#;

/// Consent banner presence and controls
pub struct CookieBannerCheck {
    keywords: Arc<KeywordTables>,
}

impl CookieBannerCheck {
    pub fn new(keywords: Arc<KeywordTables>) -> Self {
        Self { keywords }
    }

    fn locate_banner(&self, page: &PageContext<'_>) -> Result<Option<Element>> {
        for selector in &self.keywords.cookie_banner_selectors {
            if let Some(banner) = page.find_element(&Locator::css(selector))? {
                return Ok(Some(banner));
            }
        }
        Ok(None)
    }
}

impl Check for CookieBannerCheck {
    fn id(&self) -> &str {
        "cookie_banner_check"
    }

    fn name(&self) -> &str {
        "Cookie Consent Banner Check"
    }

    fn description(&self) -> &str {
        "Looks for a cookie consent banner with accept, reject and more-info options"
    }

    fn requires_fresh_navigation(&self) -> bool {
        true
    }

    fn inspect(&self, page: &mut PageContext<'_>, _url: &str) -> Result<CheckResult> {
        let Some(banner) = self.locate_banner(page)? else {
            return Ok(self
                .result(CheckStatus::Failed, "No cookie consent banner found")
                .with_detail("banner_found", false)
                .with_solution(
                    Solution::new(
                        "Implement a cookie consent banner that informs users about cookie usage \
                         and obtains consent before setting non-essential cookies.",
                    )
                    .with_snippet(BANNER_SNIPPET, "html"),
                ));
        };

        let button_texts: Vec<String> = banner
            .find_all(&Locator::css("button, input[type=\"button\"], input[type=\"submit\"]"))?
            .iter()
            .map(|b| {
                let label = b.attr("value").unwrap_or_default();
                format!("{} {}", b.text(), label).to_lowercase()
            })
            .collect();
        let link_texts: Vec<String> = banner
            .find_all(&Locator::tag("a"))?
            .iter()
            .map(|a| a.text().to_lowercase())
            .collect();

        let kw = &self.keywords;
        let has_accept = button_texts.iter().any(|t| contains_any(t, &kw.accept_terms));
        let has_reject = button_texts.iter().any(|t| contains_any(t, &kw.reject_terms));
        let has_more_info = link_texts.iter().any(|t| contains_any(t, &kw.more_info_terms));

        let mut issues = Vec::new();
        if !has_accept {
            issues.push("No clear 'Accept' button found".to_string());
        }
        if !has_reject {
            issues.push("No clear 'Reject' or 'Decline' option found".to_string());
        }
        if !has_more_info {
            issues.push("No link to more information about cookies".to_string());
        }

        let result = if issues.is_empty() {
            self.result(
                CheckStatus::Passed,
                "Cookie consent banner is properly implemented with accept, reject, and more \
                 info options.",
            )
        } else {
            self.result(
                CheckStatus::Failed,
                &describe_issues("Cookie consent banner has the following issues:", &issues),
            )
            .with_detail("issues", issues)
            .with_solution(
                Solution::new(
                    "Give the banner a clear 'Accept' button, an equally visible 'Reject' button, \
                     and a link to more information about cookie usage.",
                )
                .with_snippet(BANNER_SNIPPET, "html")
                .with_complexity(Complexity::Low),
            )
        };

        Ok(result
            .with_detail("banner_found", true)
            .with_detail("has_accept", has_accept)
            .with_detail("has_reject", has_reject)
            .with_detail("has_more_info", has_more_info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{issues, keywords, run_check};
    use crate::inspect::FixtureSite;

    const URL: &str = "https://shop.example/";

    fn check(html: &str) -> CheckResult {
        let site = FixtureSite::new().page(URL, html);
        run_check(&CookieBannerCheck::new(keywords()), &site, URL)
    }

    #[test]
    fn test_compliant_banner_passes() {
        let result = check(
            r#"<html><body>
            <div id="cookie-consent"><p>We use cookies.</p>
              <a href="/cookie-policy">Learn more</a>
              <button>Reject all</button><button>Accept all</button>
            </div></body></html>"#,
        );
        assert_eq!(result.status, CheckStatus::Passed);
        assert_eq!(result.details["has_reject"], true);
        assert!(result.solution.is_none());
    }

    #[test]
    fn test_accept_only_banner_fails() {
        let result = check(
            r#"<html><body><div class="cookie-banner">
              We use cookies. <button>Got it</button>
            </div></body></html>"#,
        );
        assert_eq!(result.status, CheckStatus::Failed);
        assert_eq!(result.details["has_accept"], true);
        assert_eq!(
            issues(&result),
            vec![
                "No clear 'Reject' or 'Decline' option found".to_string(),
                "No link to more information about cookies".to_string(),
            ]
        );
        assert!(result.solution.is_some());
    }

    #[test]
    fn test_missing_banner_fails() {
        let result = check("<html><body><h1>Welcome</h1></body></html>");
        assert_eq!(result.status, CheckStatus::Failed);
        assert_eq!(result.description, "No cookie consent banner found");
        assert_eq!(result.details["banner_found"], false);
        assert_eq!(result.solution.unwrap().language, "html");
    }
}
