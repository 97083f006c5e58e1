// SPDX-License-Identifier: PMPL-1.0-or-later
//! Privacy compliance checks.
//!
//! Each check module covers one GDPR/NDPR obligation. A check inspects the
//! page through a [`PageContext`] and returns one [`CheckResult`]; the
//! [`Check::execute`] boundary turns every failure into an ERROR result so a
//! single check can never abort an audit.

pub mod consent_management;
pub mod cookie_banner;
pub mod data_breach;
pub mod data_collection_forms;
pub mod data_retention;
pub mod data_subject_rights;
pub mod international_transfer;
pub mod personal_data_exposure;
pub mod privacy_policy;
pub mod secure_data_transfer;
pub mod third_party_tracking;

use crate::config::{Config, KeywordTables};
use crate::error::{PrivacyError, Result};
use crate::inspect::document::resolve_reference;
use crate::inspect::{Cookie, Element, Locator, PageInspector};
use crate::model::{CheckResult, CheckStatus, Severity};
use crate::runner::CheckRegistry;
use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// Ids of the built-in checks, in registration order
pub const BUILTIN_CHECK_IDS: &[&str] = &[
    "cookie_banner_check",
    "privacy_policy_check",
    "data_collection_forms",
    "data_subject_rights",
    "third_party_tracking",
    "secure_data_transfer",
    "data_retention",
    "international_transfer",
    "data_breach",
    "consent_management",
    "personal_data_exposure",
];

thread_local! {
    static INSIDE_CHECK: Cell<bool> = const { Cell::new(false) };
}

static PANIC_HOOK: Once = Once::new();

/// Send panics raised inside a check to the log instead of stderr.
///
/// The execution boundary already reports them as ERROR results. Panics
/// anywhere else still reach the previously installed hook.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if inside_check() {
                debug!("Check panicked: {}", info);
            } else {
                previous(info);
            }
        }));
    });
}

/// Whether the current thread is inside a check's execution boundary
pub fn inside_check() -> bool {
    INSIDE_CHECK.with(Cell::get)
}

/// Trait implemented by all compliance checks
pub trait Check: Send + Sync {
    /// Stable short identifier, unique within a registry
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Short description of what this check looks for
    fn description(&self) -> &str;

    /// Severity of the check's category, independent of the outcome
    fn severity(&self) -> Severity {
        Severity::High
    }

    /// Whether the session must load the target before `inspect` runs
    fn requires_fresh_navigation(&self) -> bool {
        false
    }

    /// Check-specific inspection logic
    fn inspect(&self, page: &mut PageContext<'_>, url: &str) -> Result<CheckResult>;

    /// A result pre-filled with this check's id, name and severity
    fn result(&self, status: CheckStatus, description: &str) -> CheckResult {
        CheckResult::new(self.id(), self.name(), status, self.severity(), description)
    }

    /// Run the check against `url`. Never fails: errors and panics inside
    /// navigation or inspection become an ERROR result.
    fn execute(&self, session: &mut dyn PageInspector, url: &str, settle: Duration) -> CheckResult {
        let started = Instant::now();

        let outer = INSIDE_CHECK.with(|flag| flag.replace(true));
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut page = PageContext::new(&mut *session);
            if self.requires_fresh_navigation() {
                page.navigate(url)?;
                if !settle.is_zero() {
                    thread::sleep(settle);
                }
            }
            self.inspect(&mut page, url)
        }));
        INSIDE_CHECK.with(|flag| flag.set(outer));

        match outcome {
            Ok(Ok(result)) => {
                let elapsed = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;
                debug!("{} finished in {:.2}s: {}", self.id(), elapsed, result.status);
                result.with_detail("execution_time_seconds", elapsed)
            }
            Ok(Err(e)) => {
                warn!("{} failed: {}", self.id(), e);
                error_result(self, &format!("Error executing check: {}", e), &e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("{} panicked: {}", self.id(), message);
                error_result(
                    self,
                    &format!("Unexpected error during check: {}", message),
                    &message,
                )
            }
        }
    }
}

fn error_result<C: Check + ?Sized>(check: &C, description: &str, error: &str) -> CheckResult {
    CheckResult::new(
        check.id(),
        check.name(),
        CheckStatus::Error,
        Severity::High,
        description,
    )
    .with_detail("error", error)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

/// A hyperlink on the current page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Lowercased link text
    pub text: String,
    /// Absolute target URL
    pub href: String,
}

impl Link {
    /// Whether the text or target mentions any of `terms`
    pub fn mentions(&self, terms: &[String]) -> bool {
        let href = self.href.to_lowercase();
        terms
            .iter()
            .any(|t| self.text.contains(t.as_str()) || href.contains(t.as_str()))
    }
}

/// Helpers shared by all checks, wrapping the inspection session.
///
/// Lookups that match nothing yield `None` or an empty list. Session
/// failures propagate so the execution boundary can report them.
pub struct PageContext<'a> {
    session: &'a mut dyn PageInspector,
}

impl<'a> PageContext<'a> {
    pub fn new(session: &'a mut dyn PageInspector) -> Self {
        Self { session }
    }

    /// Direct access to the underlying session
    pub fn session(&mut self) -> &mut dyn PageInspector {
        &mut *self.session
    }

    pub fn navigate(&mut self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.session.navigate(url)
    }

    pub fn current_url(&self) -> String {
        self.session.current_url()
    }

    pub fn page_source(&self) -> Result<String> {
        self.session.page_source()
    }

    pub fn find_element(&self, locator: &Locator) -> Result<Option<Element>> {
        self.session.find_element(locator)
    }

    pub fn find_elements(&self, locator: &Locator) -> Result<Vec<Element>> {
        self.session.find_elements(locator)
    }

    pub fn element_exists(&self, locator: &Locator) -> Result<bool> {
        Ok(self.find_element(locator)?.is_some())
    }

    /// Whether the first element matching `locator` contains `text`.
    /// False when nothing matches.
    pub fn element_contains_text(
        &self,
        locator: &Locator,
        text: &str,
        case_sensitive: bool,
    ) -> Result<bool> {
        Ok(self
            .find_element(locator)?
            .map(|el| el.contains_text(text, case_sensitive))
            .unwrap_or(false))
    }

    /// Rendered body text, lowercased
    pub fn body_text(&self) -> Result<String> {
        Ok(self
            .find_element(&Locator::tag("body"))?
            .map(|body| body.text().to_lowercase())
            .unwrap_or_default())
    }

    pub fn cookies(&self) -> Result<Vec<Cookie>> {
        self.session.cookies()
    }

    pub fn header(&self, name: &str) -> Result<Option<String>> {
        self.session.header(name)
    }

    pub fn resources(&self) -> Result<Vec<String>> {
        self.session.resources()
    }

    pub fn evaluate(&mut self, script: &str) -> Result<bool> {
        self.session.evaluate(script)
    }

    /// Resolve an element's `href` against the current page
    pub fn resolve(&self, reference: &str) -> Option<String> {
        match Url::parse(&self.current_url()) {
            Ok(base) => resolve_reference(&base, reference),
            Err(_) => Some(reference.to_string()),
        }
    }

    /// All links on the page with a followable target
    pub fn links(&self) -> Result<Vec<Link>> {
        let anchors = self.find_elements(&Locator::css("a[href]"))?;
        Ok(self.to_links(anchors))
    }

    fn to_links(&self, anchors: Vec<Element>) -> Vec<Link> {
        anchors
            .into_iter()
            .filter_map(|a| {
                let href = self.resolve(a.attr("href")?)?;
                Some(Link {
                    text: a.text().to_lowercase(),
                    href,
                })
            })
            .collect()
    }

    /// First link mentioning any of `terms`
    pub fn find_link(&self, terms: &[String]) -> Result<Option<Link>> {
        Ok(self.links()?.into_iter().find(|l| l.mentions(terms)))
    }

    /// The privacy policy link, preferring one in the footer
    pub fn privacy_link(&self, terms: &[String]) -> Result<Option<Link>> {
        if let Some(footer) = self.find_element(&Locator::tag("footer"))? {
            let anchors = footer.find_all(&Locator::css("a[href]"))?;
            if let Some(link) = self.to_links(anchors).into_iter().find(|l| l.mentions(terms)) {
                return Ok(Some(link));
            }
        }
        self.find_link(terms)
    }

    /// Load a linked page and return its lowercased body text.
    /// `None` when the page cannot be reached; other session failures propagate.
    pub fn visit(&mut self, url: &str) -> Result<Option<String>> {
        match self.navigate(url) {
            Ok(()) => Ok(Some(self.body_text()?)),
            Err(PrivacyError::Navigation { url, reason }) => {
                debug!("Linked page {} unreachable: {}", url, reason);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Follow the privacy policy link and return the policy's lowercased text.
    /// `None` when the page links to no policy or the policy is unreachable.
    pub fn privacy_policy_text(&mut self, terms: &[String]) -> Result<Option<String>> {
        match self.privacy_link(terms)? {
            Some(link) => self.visit(&link.href),
            None => Ok(None),
        }
    }
}

/// Terms from `terms` found in an already lowercased haystack
pub(crate) fn matching_terms(haystack: &str, terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .filter(|t| haystack.contains(t.as_str()))
        .cloned()
        .collect()
}

pub(crate) fn contains_any(haystack: &str, terms: &[String]) -> bool {
    terms.iter().any(|t| haystack.contains(t.as_str()))
}

/// A FAILED description followed by one bullet per issue
pub(crate) fn describe_issues(headline: &str, issues: &[String]) -> String {
    format!("{}\n\n• {}", headline, issues.join("\n• "))
}

/// Every built-in check, sharing one set of keyword tables
pub fn builtin_checks(keywords: &Arc<KeywordTables>) -> Vec<Box<dyn Check>> {
    vec![
        Box::new(cookie_banner::CookieBannerCheck::new(keywords.clone())),
        Box::new(privacy_policy::PrivacyPolicyCheck::new(keywords.clone())),
        Box::new(data_collection_forms::DataCollectionFormsCheck::new(keywords.clone())),
        Box::new(data_subject_rights::DataSubjectRightsCheck::new(keywords.clone())),
        Box::new(third_party_tracking::ThirdPartyTrackingCheck::new(keywords.clone())),
        Box::new(secure_data_transfer::SecureDataTransferCheck),
        Box::new(data_retention::DataRetentionCheck::new(keywords.clone())),
        Box::new(international_transfer::InternationalTransferCheck::new(keywords.clone())),
        Box::new(data_breach::DataBreachCheck::new(keywords.clone())),
        Box::new(consent_management::ConsentManagementCheck::new(keywords.clone())),
        Box::new(personal_data_exposure::PersonalDataExposureCheck::new(keywords.clone())),
    ]
}

/// Registry of the built-in checks selected by the configuration
pub fn default_registry(config: &Config) -> Result<CheckRegistry> {
    for id in config.checks.enabled.iter().chain(&config.checks.disabled) {
        if !BUILTIN_CHECK_IDS.contains(&id.as_str()) {
            return Err(PrivacyError::UnknownCheck(id.clone()));
        }
    }

    let keywords = Arc::new(config.keywords.clone());
    let mut registry = CheckRegistry::from_config(&config.runner);
    for check in builtin_checks(&keywords) {
        if config.checks.includes(check.id()) {
            registry.register(check)?;
        }
    }
    Ok(registry)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::inspect::{FixtureSite, SessionProvider};

    pub fn keywords() -> Arc<KeywordTables> {
        Arc::new(KeywordTables::default())
    }

    /// Execute one check against a fixture site with no settle delay
    pub fn run_check(check: &dyn Check, site: &FixtureSite, url: &str) -> CheckResult {
        let mut session = site.acquire().unwrap();
        check.execute(&mut session, url, Duration::ZERO)
    }

    pub fn issues(result: &CheckResult) -> Vec<String> {
        result
            .details
            .get("issues")
            .and_then(|v| v.as_array())
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}
