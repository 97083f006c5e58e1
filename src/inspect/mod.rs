// SPDX-License-Identifier: PMPL-1.0-or-later
//! Page inspection capability.
//!
//! Checks never talk to a browser or HTTP client directly. They receive a
//! [`PageInspector`], which offers DOM queries, cookies, response headers and
//! the network resources referenced by the current page. Sessions are created
//! by a [`SessionProvider`] and passed explicitly to the runner.

pub mod document;
pub mod fixture;
pub mod http;

pub use document::{Document, Element};
pub use fixture::{FixturePage, FixtureSession, FixtureSite};
pub use http::{HttpSession, HttpSessionProvider};

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// How to locate elements on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Raw CSS selector
    Css(String),
    /// Tag name, e.g. `form`
    Tag(String),
    /// Element id
    Id(String),
    /// `name` attribute
    Name(String),
}

impl Locator {
    pub fn css(selector: &str) -> Self {
        Locator::Css(selector.to_string())
    }

    pub fn tag(tag: &str) -> Self {
        Locator::Tag(tag.to_string())
    }

    pub fn id(id: &str) -> Self {
        Locator::Id(id.to_string())
    }

    pub fn name(name: &str) -> Self {
        Locator::Name(name.to_string())
    }

    /// The equivalent CSS selector
    pub fn to_css(&self) -> String {
        match self {
            Locator::Css(css) => css.clone(),
            Locator::Tag(tag) => tag.clone(),
            Locator::Id(id) => format!("[id=\"{}\"]", escape_attr(id)),
            Locator::Name(name) => format!("[name=\"{}\"]", escape_attr(name)),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css(css) => write!(f, "css={}", css),
            Locator::Tag(tag) => write!(f, "tag={}", tag),
            Locator::Id(id) => write!(f, "id={}", id),
            Locator::Name(name) => write!(f, "name={}", name),
        }
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// A cookie visible to the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<String>,
    /// Raw `Expires`/`Max-Age` attribute, if any
    pub expires: Option<String>,
}

impl Cookie {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            ..Self::default()
        }
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// Parse a `Set-Cookie` header value. Returns `None` for a header without a name.
    pub fn parse_set_cookie(header: &str) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Cookie::new(name, value.trim().trim_matches('"'));
        for attr in parts {
            let (key, val) = match attr.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (attr.trim(), None),
            };
            match key.to_ascii_lowercase().as_str() {
                "domain" => cookie.domain = val.map(|v| v.trim_start_matches('.').to_string()),
                "path" => cookie.path = val.map(String::from),
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                "samesite" => cookie.same_site = val.map(String::from),
                "expires" | "max-age" => cookie.expires = val.map(String::from),
                _ => {}
            }
        }
        Some(cookie)
    }
}

/// The capability a check inspects a page through.
///
/// Queries that match nothing return empty results; `Err` is reserved for
/// failures of the session itself (bad selector, navigation failure, and so on).
pub trait PageInspector {
    /// Load a URL, replacing the current page
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// URL of the current page after redirects
    fn current_url(&self) -> String;

    /// Raw HTML of the current page
    fn page_source(&self) -> Result<String>;

    /// All elements matching a locator, in document order
    fn find_elements(&self, locator: &Locator) -> Result<Vec<Element>>;

    /// First element matching a locator
    fn find_element(&self, locator: &Locator) -> Result<Option<Element>> {
        Ok(self.find_elements(locator)?.into_iter().next())
    }

    /// Rendered text of an element
    fn text(&self, element: &Element) -> String {
        element.text().to_string()
    }

    /// Attribute value of an element
    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.attr(name).map(String::from)
    }

    /// Cookies currently held by the session
    fn cookies(&self) -> Result<Vec<Cookie>>;

    /// Response headers of the current page, names lowercased
    fn response_headers(&self) -> Result<Vec<(String, String)>>;

    /// A single response header, case-insensitive
    fn header(&self, name: &str) -> Result<Option<String>> {
        let name = name.to_ascii_lowercase();
        Ok(self
            .response_headers()?
            .into_iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v))
    }

    /// Absolute URLs of resources referenced by the current page
    fn resources(&self) -> Result<Vec<String>>;

    /// Evaluate a simple boolean probe script
    fn evaluate(&mut self, script: &str) -> Result<bool>;

    /// Release the session
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Creates inspection sessions
pub trait SessionProvider {
    type Session: PageInspector;

    /// Acquire a fresh session. Failure here aborts the whole audit.
    fn acquire(&self) -> Result<Self::Session>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_css() {
        assert_eq!(Locator::tag("form").to_css(), "form");
        assert_eq!(Locator::id("cookie-banner").to_css(), "[id=\"cookie-banner\"]");
        assert_eq!(Locator::name("email").to_css(), "[name=\"email\"]");
        assert_eq!(Locator::css("div.banner a").to_css(), "div.banner a");
        assert_eq!(Locator::id("a\"b").to_css(), "[id=\"a\\\"b\"]");
    }

    #[test]
    fn test_parse_set_cookie() {
        let cookie = Cookie::parse_set_cookie(
            "_ga=GA1.2.3; Domain=.example.com; Path=/; Max-Age=63072000; Secure; SameSite=Lax",
        )
        .unwrap();
        assert_eq!(cookie.name, "_ga");
        assert_eq!(cookie.value, "GA1.2.3");
        assert_eq!(cookie.domain.as_deref(), Some("example.com"));
        assert_eq!(cookie.path.as_deref(), Some("/"));
        assert_eq!(cookie.expires.as_deref(), Some("63072000"));
        assert_eq!(cookie.same_site.as_deref(), Some("Lax"));
        assert!(cookie.secure);
        assert!(!cookie.http_only);
    }

    #[test]
    fn test_parse_set_cookie_rejects_nameless() {
        assert!(Cookie::parse_set_cookie("=value; Secure").is_none());
        assert!(Cookie::parse_set_cookie("novalue").is_none());
    }
}
