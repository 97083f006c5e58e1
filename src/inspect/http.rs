// SPDX-License-Identifier: PMPL-1.0-or-later
//! HTTP inspection session.
//!
//! Fetches pages with a blocking HTTP client and inspects the served HTML.
//! There is no script engine, so boolean probes report `Unsupported`.
//! Cookies are sent and reported only for URLs their domain, path and
//! `Secure` flag allow.

use super::{Cookie, Document, Element, Locator, PageInspector, SessionProvider};
use crate::config::SessionConfig;
use crate::error::{PrivacyError, Result};
use reqwest::blocking::Client;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Builds [`HttpSession`]s from session settings
#[derive(Debug, Clone, Default)]
pub struct HttpSessionProvider {
    config: SessionConfig,
}

impl HttpSessionProvider {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

impl SessionProvider for HttpSessionProvider {
    type Session = HttpSession;

    fn acquire(&self) -> Result<HttpSession> {
        HttpSession::new(&self.config)
    }
}

/// A cookie in the jar. Host-only cookies were set without a `Domain`
/// attribute and go back to the exact host that set them.
#[derive(Debug, Clone)]
struct StoredCookie {
    cookie: Cookie,
    host_only: bool,
}

impl StoredCookie {
    fn domain(&self) -> &str {
        self.cookie.domain.as_deref().unwrap_or_default()
    }

    fn path(&self) -> &str {
        self.cookie.path.as_deref().unwrap_or("/")
    }

    fn same_slot(&self, other: &StoredCookie) -> bool {
        self.cookie.name == other.cookie.name
            && self.domain() == other.domain()
            && self.path() == other.path()
    }

    fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let host_ok = if self.host_only {
            host == self.domain()
        } else {
            domain_matches(&host, self.domain())
        };
        host_ok
            && path_matches(url.path(), self.path())
            && (!self.cookie.secure || url.scheme() == "https")
    }
}

/// `host` equals `domain` or is a subdomain of it
fn domain_matches(host: &str, domain: &str) -> bool {
    !domain.is_empty()
        && (host == domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.')))
}

fn path_matches(request: &str, cookie: &str) -> bool {
    request == cookie
        || (request.starts_with(cookie)
            && (cookie.ends_with('/') || request[cookie.len()..].starts_with('/')))
}

/// Directory of the request path, used when `Path` is absent
fn default_path(url: &Url) -> String {
    match url.path().rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => url.path()[..i].to_string(),
    }
}

/// Page inspection over plain HTTP
pub struct HttpSession {
    client: Client,
    page: Option<Document>,
    headers: Vec<(String, String)>,
    jar: Vec<StoredCookie>,
}

impl HttpSession {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| PrivacyError::SessionUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            page: None,
            headers: Vec::new(),
            jar: Vec::new(),
        })
    }

    fn page(&self) -> Result<&Document> {
        self.page.as_ref().ok_or_else(|| PrivacyError::Navigation {
            url: self.current_url(),
            reason: "no page loaded".to_string(),
        })
    }

    /// Cookies the jar would send with a request to `url`
    fn cookies_for(&self, url: &Url) -> Vec<Cookie> {
        self.jar
            .iter()
            .filter(|stored| stored.matches(url))
            .map(|stored| stored.cookie.clone())
            .collect()
    }

    fn cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.cookies_for(url);
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Store a cookie set by a response from `origin`. Cookies whose
    /// `Domain` does not cover the origin host are dropped.
    fn store_cookie(&mut self, mut cookie: Cookie, origin: &Url) {
        let Some(host) = origin.host_str().map(str::to_ascii_lowercase) else {
            return;
        };

        let host_only = match cookie.domain.as_deref().map(str::to_ascii_lowercase) {
            Some(domain) if !domain.is_empty() => {
                if !domain_matches(&host, &domain) {
                    debug!("Ignoring cookie {} for foreign domain {}", cookie.name, domain);
                    return;
                }
                cookie.domain = Some(domain);
                false
            }
            _ => {
                cookie.domain = Some(host);
                true
            }
        };
        if cookie.path.as_deref().map_or(true, |p| !p.starts_with('/')) {
            cookie.path = Some(default_path(origin));
        }

        let stored = StoredCookie { cookie, host_only };
        self.jar.retain(|c| !c.same_slot(&stored));
        self.jar.push(stored);
    }
}

impl PageInspector for HttpSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        debug!("GET {}", url);
        let navigation_error = |reason: String| PrivacyError::Navigation {
            url: url.to_string(),
            reason,
        };

        let target = Url::parse(url).map_err(|e| navigation_error(e.to_string()))?;
        let mut request = self.client.get(target.clone());
        if let Some(cookies) = self.cookie_header(&target) {
            request = request.header(COOKIE, cookies);
        }

        let response = request.send().map_err(|e| navigation_error(e.to_string()))?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(navigation_error(format!("HTTP {}", status)));
        }

        let final_url = response.url().clone();
        let mut headers = Vec::new();
        for (name, value) in response.headers() {
            let value = value.to_str().unwrap_or_default().to_string();
            if *name == SET_COOKIE {
                if let Some(cookie) = Cookie::parse_set_cookie(&value) {
                    self.store_cookie(cookie, &final_url);
                }
            }
            headers.push((name.as_str().to_ascii_lowercase(), value));
        }

        let body = response.text().map_err(|e| navigation_error(e.to_string()))?;
        self.page = Some(Document::parse(final_url.as_str(), &body)?);
        self.headers = headers;
        Ok(())
    }

    fn current_url(&self) -> String {
        self.page
            .as_ref()
            .map(|p| p.url().to_string())
            .unwrap_or_else(|| "about:blank".to_string())
    }

    fn page_source(&self) -> Result<String> {
        Ok(self.page()?.source().to_string())
    }

    fn find_elements(&self, locator: &Locator) -> Result<Vec<Element>> {
        self.page()?.select(locator)
    }

    fn cookies(&self) -> Result<Vec<Cookie>> {
        Ok(self
            .page
            .as_ref()
            .map(|p| self.cookies_for(p.url()))
            .unwrap_or_default())
    }

    fn response_headers(&self) -> Result<Vec<(String, String)>> {
        Ok(self.headers.clone())
    }

    fn resources(&self) -> Result<Vec<String>> {
        self.page()?.resources()
    }

    fn evaluate(&mut self, _script: &str) -> Result<bool> {
        Err(PrivacyError::Unsupported(
            "script evaluation needs a browser session".to_string(),
        ))
    }

    fn close(&mut self) -> Result<()> {
        debug!("Closing HTTP session ({} cookies held)", self.jar.len());
        self.page = None;
        self.jar.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_has_no_page() {
        let session = HttpSessionProvider::default().acquire().unwrap();
        assert_eq!(session.current_url(), "about:blank");
        assert!(matches!(
            session.page_source().unwrap_err(),
            PrivacyError::Navigation { .. }
        ));
        assert!(session.cookies().unwrap().is_empty());
    }

    #[test]
    fn test_probes_unsupported() {
        let mut session = HttpSessionProvider::default().acquire().unwrap();
        let err = session.evaluate("return true").unwrap_err();
        assert!(matches!(err, PrivacyError::Unsupported(_)));
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn set_cookie(session: &mut HttpSession, header: &str, origin: &str) {
        let cookie = Cookie::parse_set_cookie(header).unwrap();
        session.store_cookie(cookie, &url(origin));
    }

    #[test]
    fn test_cookie_jar_replaces_by_name() {
        let mut session = HttpSessionProvider::default().acquire().unwrap();
        let origin = "https://shop.example/";
        set_cookie(&mut session, "consent=no", origin);
        set_cookie(&mut session, "_ga=1", origin);
        set_cookie(&mut session, "consent=yes", origin);
        assert_eq!(
            session.cookie_header(&url(origin)).as_deref(),
            Some("_ga=1; consent=yes")
        );
    }

    #[test]
    fn test_cookies_stay_with_their_host() {
        let mut session = HttpSessionProvider::default().acquire().unwrap();
        set_cookie(&mut session, "session_id=SECRET; Domain=127.0.0.1", "http://127.0.0.1:8080/");
        set_cookie(&mut session, "sid=1; Path=/", "https://shop.example/account/login");

        assert_eq!(
            session.cookie_header(&url("http://127.0.0.1:8080/")).as_deref(),
            Some("session_id=SECRET")
        );
        assert_eq!(session.cookie_header(&url("http://localhost:8080/")), None);
        assert_eq!(session.cookie_header(&url("https://cdn.shop.example/")), None);
        assert_eq!(session.cookie_header(&url("https://policies.example/privacy")), None);
        assert_eq!(
            session.cookie_header(&url("https://shop.example/privacy")).as_deref(),
            Some("sid=1")
        );
    }

    #[test]
    fn test_domain_cookie_covers_subdomains_only() {
        let mut session = HttpSessionProvider::default().acquire().unwrap();
        set_cookie(&mut session, "_ga=1; Domain=.shop.example", "https://www.shop.example/");
        set_cookie(&mut session, "evil=1; Domain=other.example", "https://www.shop.example/");

        assert!(session.cookie_header(&url("https://cdn.shop.example/")).is_some());
        assert!(session.cookie_header(&url("https://shop.example/")).is_some());
        assert_eq!(session.cookie_header(&url("https://notshop.example/")), None);
        assert_eq!(session.cookie_header(&url("https://other.example/")), None);
        assert_eq!(session.jar.len(), 1);
    }

    #[test]
    fn test_secure_and_path_rules() {
        let mut session = HttpSessionProvider::default().acquire().unwrap();
        set_cookie(&mut session, "token=1; Secure; Path=/", "https://shop.example/");
        set_cookie(&mut session, "cart=2; Path=/shop", "https://shop.example/");
        set_cookie(&mut session, "step=3", "https://shop.example/checkout/pay");

        assert_eq!(session.cookie_header(&url("http://shop.example/")), None);
        assert_eq!(
            session.cookie_header(&url("https://shop.example/shop/item")).as_deref(),
            Some("token=1; cart=2")
        );
        assert_eq!(
            session.cookie_header(&url("https://shop.example/shopping")).as_deref(),
            Some("token=1")
        );
        assert_eq!(
            session.cookie_header(&url("https://shop.example/checkout/done")).as_deref(),
            Some("token=1; step=3")
        );
        let names: Vec<String> = session
            .cookies_for(&url("https://shop.example/"))
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["token".to_string()]);
    }
}
