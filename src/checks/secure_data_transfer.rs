// SPDX-License-Identifier: PMPL-1.0-or-later
//! Secure data transfer check - GDPR Art. 32, NDPR 2.6
//!
//! Checks how data reaches the site:
//! - the page is served over HTTPS
//! - HSTS is configured
//! - no mixed content on HTTPS pages
//! - forms submit securely and never send passwords in the query string

use super::{describe_issues, Check, PageContext};
use crate::error::Result;
use crate::inspect::Locator;
use crate::model::{CheckResult, CheckStatus, Solution};

/// Hosts never counted as mixed content
const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1", "[::1]", "0.0.0.0"];

const TRANSPORT_SNIPPET: &str = r#"
# nginx: redirect to HTTPS and enable HSTS
server {
    listen 80;
    return 301 https://$host$request_uri;
}
server {
    listen 443 ssl http2;
    add_header Strict-Transport-Security "max-age=63072000; includeSubDomains; preload" always;
}
"#;

/// Transport security of the page and its forms
pub struct SecureDataTransferCheck;

/// Issues with a `Strict-Transport-Security` value, plus advisory notes
fn hsts_issues(header: Option<&str>) -> (Vec<String>, Vec<String>) {
    let mut issues = Vec::new();
    let mut notes = Vec::new();

    let Some(value) = header else {
        issues.push("HSTS header is missing".to_string());
        return (issues, notes);
    };

    let value = value.to_lowercase().replace(' ', "");
    match max_age(&value) {
        Some(0) => issues.push("HSTS max-age is set to 0, which disables HSTS".to_string()),
        None => issues.push("HSTS max-age is missing".to_string()),
        Some(_) if !value.contains("includesubdomains") => {
            issues.push("HSTS should include subdomains (includeSubDomains)".to_string())
        }
        Some(_) => {}
    }
    if !value.contains("preload") {
        notes.push("Consider adding 'preload' to HSTS header for better security".to_string());
    }
    (issues, notes)
}

fn max_age(value: &str) -> Option<u64> {
    value
        .split(';')
        .find_map(|directive| directive.strip_prefix("max-age="))
        .and_then(|v| v.trim_matches('"').parse().ok())
}

impl Check for SecureDataTransferCheck {
    fn id(&self) -> &str {
        "secure_data_transfer"
    }

    fn name(&self) -> &str {
        "Secure Data Transfer"
    }

    fn description(&self) -> &str {
        "Checks HTTPS, HSTS, mixed content and form submission security"
    }

    fn requires_fresh_navigation(&self) -> bool {
        true
    }

    fn inspect(&self, page: &mut PageContext<'_>, _url: &str) -> Result<CheckResult> {
        let mut issues = Vec::new();
        let final_url = page.current_url();
        let https = final_url.starts_with("https://");

        if !https {
            issues.push("Website is accessible via HTTP without redirect to HTTPS".to_string());
        }

        let hsts_header = page.header("strict-transport-security")?;
        let (hsts, recommendations) = hsts_issues(hsts_header.as_deref());
        issues.extend(hsts);

        if https {
            let insecure: Vec<String> = page
                .resources()?
                .into_iter()
                .filter(|r| r.starts_with("http://"))
                .filter(|r| !LOCAL_HOSTS.iter().any(|h| r.contains(h)))
                .collect();
            if !insecure.is_empty() {
                issues.push(format!(
                    "Found {} potential mixed content resources",
                    insecure.len()
                ));
            }
        }

        for (i, form) in page.find_elements(&Locator::tag("form"))?.iter().enumerate() {
            let number = i + 1;
            let action = form.attr("action").unwrap_or_default();
            if !action.trim().is_empty()
                && page.resolve(action).is_some_and(|t| t.starts_with("http://"))
            {
                issues.push(format!("Form {}: Insecure form action (HTTP)", number));
            }

            let method = form.attr_lower("method");
            let uses_get = method.is_empty() || method == "get";
            let has_password = !form
                .find_all(&Locator::css("input[type=\"password\"]"))?
                .is_empty();
            if uses_get && has_password {
                issues.push(format!("Form {}: Password form uses GET method", number));
            }
        }

        let result = if issues.is_empty() {
            self.result(
                CheckStatus::Passed,
                "All data transfers appear to be secure and GDPR compliant.",
            )
        } else {
            self.result(
                CheckStatus::Failed,
                &describe_issues("Potential secure data transfer issues found:", &issues),
            )
            .with_detail("issues", issues)
            .with_solution(
                Solution::new(
                    "Enforce HTTPS across the whole site, enable HSTS, make every form submit \
                     over HTTPS with POST, and remove mixed content.",
                )
                .with_snippet(TRANSPORT_SNIPPET, "nginx"),
            )
        };

        Ok(result
            .with_detail("final_url", final_url)
            .with_detail("recommendations", recommendations))
    }
}
