// SPDX-License-Identifier: PMPL-1.0-or-later
//! Consent management check - GDPR Art. 7, ePrivacy Art. 5(3)
//!
//! Covers the consent mechanism as a whole:
//! - a banner offering accept, reject and settings controls
//! - a consent management platform wired to the IAB TCF API and a consent cookie
//! - a cookie policy with the expected sections
//! - trackers loaded only behind consent

use super::{contains_any, describe_issues, Check, PageContext};
use crate::config::KeywordTables;
use crate::error::{PrivacyError, Result};
use crate::inspect::Locator;
use crate::model::{CheckResult, CheckStatus, Solution};
use std::sync::Arc;

/// Probe for the IAB Transparency and Consent Framework API
pub const TCF_PROBE: &str = "return window.__tcfapi !== undefined";

/// Scripts held back until consent is given
const CONSENT_AWARE_SCRIPTS: &str = "script[data-cookiescript], script[data-cookieconsent]";

const CMP_SNIPPET: &str = r#"
<!-- Consent management platform, loaded first -->
<script src="https://consent.cookiebot.com/uc.js" data-cbid="YOUR-ID"></script>

<!-- Analytics held back until statistics consent -->
<script type="text/plain" data-cookieconsent="statistics"
        src="https://www.googletagmanager.com/gtag/js?id=G-XXXX"></script>

<footer><a href="/cookie-policy">Cookie policy</a></footer>
"#;

/// Consent banner, platform, policy and gating of trackers
pub struct ConsentManagementCheck {
    keywords: Arc<KeywordTables>,
}

impl ConsentManagementCheck {
    pub fn new(keywords: Arc<KeywordTables>) -> Self {
        Self { keywords }
    }

    fn banner_issues(&self, page: &PageContext<'_>) -> Result<Vec<String>> {
        let kw = &self.keywords;
        let mut banner_found = false;
        for selector in kw.consent_element_selectors.iter().chain(&kw.cookie_banner_selectors) {
            if page.element_exists(&Locator::css(selector))? {
                banner_found = true;
                break;
            }
        }
        if !banner_found {
            return Ok(vec!["No cookie banner or consent mechanism found".to_string()]);
        }

        let buttons: Vec<String> = page
            .find_elements(&Locator::tag("button"))?
            .iter()
            .map(|b| b.text().to_lowercase())
            .collect();

        let mut issues = Vec::new();
        if !buttons.iter().any(|b| contains_any(b, &kw.accept_terms)) {
            issues.push("Cookie banner missing accept button".to_string());
        }
        if !buttons.iter().any(|b| contains_any(b, &kw.reject_terms)) {
            issues.push("Cookie banner missing reject/decline button".to_string());
        }
        if !buttons.iter().any(|b| contains_any(b, &kw.settings_terms)) {
            issues.push("Cookie banner missing settings/preferences button".to_string());
        }
        Ok(issues)
    }

    /// Whether the TCF API is present. Sessions without a script engine
    /// fall back to searching the page source.
    fn has_tcf_api(&self, page: &mut PageContext<'_>) -> Result<bool> {
        match page.evaluate(TCF_PROBE) {
            Ok(present) => Ok(present),
            Err(PrivacyError::Unsupported(_)) => Ok(page.page_source()?.contains("__tcfapi")),
            Err(e) => Err(e),
        }
    }
}

impl Check for ConsentManagementCheck {
    fn id(&self) -> &str {
        "consent_management"
    }

    fn name(&self) -> &str {
        "Consent Management"
    }

    fn description(&self) -> &str {
        "Checks the consent banner, consent platform, cookie policy and tracker gating"
    }

    fn requires_fresh_navigation(&self) -> bool {
        true
    }

    fn inspect(&self, page: &mut PageContext<'_>, _url: &str) -> Result<CheckResult> {
        let kw = &self.keywords;
        let mut issues = self.banner_issues(page)?;

        let script_srcs: Vec<String> = page
            .find_elements(&Locator::css("script[src]"))?
            .iter()
            .map(|s| s.attr_lower("src"))
            .collect();

        let cmp = kw
            .cmp_vendors
            .iter()
            .find(|vendor| script_srcs.iter().any(|src| src.contains(vendor.as_str())))
            .cloned();
        let has_tcf = self.has_tcf_api(page)?;
        let has_consent_cookie = page
            .cookies()?
            .iter()
            .any(|c| contains_any(&c.name.to_lowercase(), &kw.consent_cookie_terms));
        if cmp.is_some() {
            if !has_tcf {
                issues.push("CMP detected but IAB TCF API not implemented".to_string());
            }
            if !has_consent_cookie {
                issues.push("CMP detected but no consent cookie found".to_string());
            }
        }

        let mut trackers: Vec<String> = Vec::new();
        for src in &script_srcs {
            for tracker in &kw.tracker_domains {
                if src.contains(tracker.as_str()) && !trackers.contains(tracker) {
                    trackers.push(tracker.clone());
                }
            }
        }
        if !trackers.is_empty() && !page.element_exists(&Locator::css(CONSENT_AWARE_SCRIPTS))? {
            issues.push(format!(
                "Tracking scripts detected without clear consent mechanism: {}",
                trackers.join(", ")
            ));
        }

        match page.find_link(&kw.cookie_policy_link_terms)? {
            None => issues.push(
                "No cookie policy link found in the main navigation or footer".to_string(),
            ),
            Some(link) => match page.visit(&link.href)? {
                None => issues.push(format!("Cookie policy at {} could not be loaded", link.href)),
                Some(text) => {
                    for section in &kw.cookie_policy_sections {
                        if !text.contains(section.as_str()) {
                            issues.push(format!("Cookie policy missing section: {}", section));
                        }
                    }
                }
            },
        }

        let solution = Solution::new(
            "Use a GDPR-compliant consent banner with granular accept, reject and customise \
             options, let users withdraw consent easily, record consent, and load non-essential \
             cookies only after consent.",
        )
        .with_snippet(CMP_SNIPPET, "html");

        let result = if issues.is_empty() {
            self.result(
                CheckStatus::Passed,
                "No consent management compliance issues detected.",
            )
        } else {
            self.result(
                CheckStatus::Failed,
                &describe_issues("GDPR compliance issues with consent management:", &issues),
            )
            .with_detail("issues", issues)
        };

        Ok(result
            .with_detail("cmp", cmp)
            .with_detail("tcf_api", has_tcf)
            .with_detail("consent_cookie", has_consent_cookie)
            .with_detail("trackers", trackers)
            .with_solution(solution))
    }
}
