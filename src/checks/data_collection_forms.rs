// SPDX-License-Identifier: PMPL-1.0-or-later
//! Data collection form check - GDPR Art. 6-7, Art. 13, Art. 32
//!
//! For every form on the page:
//! - a privacy policy link is present near the form
//! - forms collecting personal data ask for explicit consent
//! - submissions go over HTTPS, always so for sensitive fields

use super::{contains_any, describe_issues, Check, PageContext};
use crate::config::KeywordTables;
use crate::error::Result;
use crate::inspect::{Element, Locator};
use crate::model::{CheckResult, CheckStatus, Solution};
use std::sync::Arc;

/// Inputs that carry personal data
const DATA_INPUTS: &str = "input[type=\"email\"], input[type=\"tel\"], input[type=\"text\"], \
                           input:not([type]), textarea, [required]";

/// Inputs whose values must never travel in clear text
const SENSITIVE_INPUTS: &str = "input[type=\"password\"], input[type=\"credit-card\"], \
                                input[type=\"cc-number\"], input[autocomplete^=\"cc-\"]";

/// Checkbox attributes inspected for consent wording
const CONSENT_ATTRS: &[&str] = &["id", "name", "class", "aria-label", "value"];

const FORM_GUIDANCE: &str = "\
1. Add privacy policy links to all forms
2. Ensure all required fields are clearly marked
3. Add explicit consent checkboxes where needed
4. Submit forms over HTTPS";

/// Consent and transport of data collection forms
pub struct DataCollectionFormsCheck {
    keywords: Arc<KeywordTables>,
}

impl DataCollectionFormsCheck {
    pub fn new(keywords: Arc<KeywordTables>) -> Self {
        Self { keywords }
    }

    fn form_issues(
        &self,
        page: &PageContext<'_>,
        form: &Element,
        number: usize,
    ) -> Result<Vec<String>> {
        let mut issues = Vec::new();
        let kw = &self.keywords;

        let has_privacy_link = form.find_all(&Locator::tag("a"))?.iter().any(|a| {
            contains_any(&a.text().to_lowercase(), &kw.privacy_link_terms)
                || contains_any(&a.attr_lower("href"), &kw.privacy_link_terms)
        });
        if !has_privacy_link {
            issues.push(format!("Form {}: No privacy policy link found near the form", number));
        }

        let collects_data = !form.find_all(&Locator::css(DATA_INPUTS))?.is_empty();
        let has_consent = form
            .find_all(&Locator::css("input[type=\"checkbox\"]"))?
            .iter()
            .any(|checkbox| {
                CONSENT_ATTRS.iter().any(|attr| {
                    contains_any(&checkbox.attr_lower(attr), &kw.consent_checkbox_terms)
                })
            });
        if collects_data && !has_consent {
            issues.push(format!(
                "Form {}: No explicit consent checkbox found for data processing",
                number
            ));
        }

        let action = form.attr("action").unwrap_or_default();
        let target = if action.trim().is_empty() {
            page.current_url()
        } else {
            page.resolve(action).unwrap_or_default()
        };
        let secure = target.starts_with("https://");
        if target.starts_with("http://") {
            issues.push(format!(
                "Form {}: Form is submitted over HTTP instead of HTTPS",
                number
            ));
        }

        if !secure && !form.find_all(&Locator::css(SENSITIVE_INPUTS))?.is_empty() {
            issues.push(format!(
                "Form {}: Sensitive data collection detected without HTTPS",
                number
            ));
        }

        Ok(issues)
    }
}

impl Check for DataCollectionFormsCheck {
    fn id(&self) -> &str {
        "data_collection_forms"
    }

    fn name(&self) -> &str {
        "Data Collection Form Compliance"
    }

    fn description(&self) -> &str {
        "Checks forms for privacy links, consent checkboxes and secure submission"
    }

    fn requires_fresh_navigation(&self) -> bool {
        true
    }

    fn inspect(&self, page: &mut PageContext<'_>, _url: &str) -> Result<CheckResult> {
        let forms = page.find_elements(&Locator::tag("form"))?;
        if forms.is_empty() {
            return Ok(self
                .result(CheckStatus::Passed, "No data collection forms found on the page.")
                .with_detail("forms_found", 0));
        }

        let mut issues = Vec::new();
        for (i, form) in forms.iter().enumerate() {
            issues.extend(self.form_issues(page, form, i + 1)?);
        }

        if issues.is_empty() {
            return Ok(self
                .result(
                    CheckStatus::Passed,
                    "All data collection forms appear to be GDPR compliant.",
                )
                .with_detail("forms_found", forms.len()));
        }

        Ok(self
            .result(
                CheckStatus::Failed,
                &describe_issues(
                    "Found potential GDPR compliance issues in data collection forms:",
                    &issues,
                ),
            )
            .with_detail("forms_found", forms.len())
            .with_detail("issues", issues)
            .with_solution(
                Solution::new("Address the following issues in your data collection forms:")
                    .with_snippet(FORM_GUIDANCE, "markdown"),
            ))
    }
}
