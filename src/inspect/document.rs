// SPDX-License-Identifier: PMPL-1.0-or-later
//! Parsed HTML pages and owned element snapshots.

use super::Locator;
use crate::error::{PrivacyError, Result};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Tags whose content is never part of rendered text
const NON_RENDERED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements whose URL attribute is fetched when the page loads
const RESOURCE_ATTRS: &[(&str, &str)] = &[
    ("script[src]", "src"),
    ("img[src]", "src"),
    ("iframe[src]", "src"),
    ("link[rel~=\"stylesheet\"][href]", "href"),
    ("source[src]", "src"),
    ("embed[src]", "src"),
    ("video[src]", "src"),
    ("audio[src]", "src"),
];

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PrivacyError::Selector(format!("{}: {:?}", css, e)))
}

/// A loaded page
#[derive(Debug, Clone)]
pub struct Document {
    url: Url,
    source: String,
    html: Html,
}

impl Document {
    /// Parse page source served at `url`
    pub fn parse(url: &str, source: &str) -> Result<Self> {
        Ok(Self {
            url: Url::parse(url)?,
            source: source.to_string(),
            html: Html::parse_document(source),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// All elements matching a locator
    pub fn select(&self, locator: &Locator) -> Result<Vec<Element>> {
        let selector = parse_selector(&locator.to_css())?;
        Ok(self.html.select(&selector).map(Element::from_ref).collect())
    }

    /// Rendered text of the body, or of the whole document when there is no body
    pub fn body_text(&self) -> String {
        let mut out = String::new();
        match parse_selector("body")
            .ok()
            .and_then(|sel| self.html.select(&sel).next())
        {
            Some(body) => collect_text(body, &mut out),
            None => collect_text(self.html.root_element(), &mut out),
        }
        normalize_whitespace(&out)
    }

    /// Resolve a possibly relative reference against this page
    pub fn resolve(&self, reference: &str) -> Option<String> {
        resolve_reference(&self.url, reference)
    }

    /// Absolute URLs of resources the page loads, deduplicated in document order
    pub fn resources(&self) -> Result<Vec<String>> {
        let mut found: Vec<String> = Vec::new();
        for (css, attr) in RESOURCE_ATTRS {
            let selector = parse_selector(css)?;
            for el in self.html.select(&selector) {
                if let Some(abs) = el.value().attr(attr).and_then(|v| self.resolve(v)) {
                    if !found.contains(&abs) {
                        found.push(abs);
                    }
                }
            }
        }
        Ok(found)
    }
}

/// Owned snapshot of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    html: String,
}

impl Element {
    fn from_ref(el: ElementRef<'_>) -> Self {
        let mut text = String::new();
        collect_text(el, &mut text);
        Self {
            tag: el.value().name().to_string(),
            attrs: el
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: normalize_whitespace(&text),
            html: el.html(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value lowercased, empty when absent
    pub fn attr_lower(&self, name: &str) -> String {
        self.attr(name).unwrap_or_default().to_lowercase()
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// Rendered text with whitespace collapsed
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn outer_html(&self) -> &str {
        &self.html
    }

    /// Substring test against the rendered text
    pub fn contains_text(&self, needle: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            self.text.contains(needle)
        } else {
            self.text.to_lowercase().contains(&needle.to_lowercase())
        }
    }

    /// Descendants matching a locator, excluding this element
    pub fn find_all(&self, locator: &Locator) -> Result<Vec<Element>> {
        let selector = parse_selector(&locator.to_css())?;
        let fragment = Html::parse_fragment(&self.html);
        let root = fragment.root_element();
        let scope = root
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == self.tag)
            .unwrap_or(root);
        Ok(scope.select(&selector).map(Element::from_ref).collect())
    }
}

/// Resolve a link or resource reference against a base URL.
/// Inline and non-fetchable schemes resolve to `None`.
pub fn resolve_reference(base: &Url, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty()
        || reference.starts_with('#')
        || reference.starts_with("data:")
        || reference.starts_with("javascript:")
        || reference.starts_with("mailto:")
        || reference.starts_with("tel:")
    {
        return None;
    }
    base.join(reference).ok().map(|u| u.to_string())
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            if NON_RENDERED_TAGS.contains(&child_el.value().name()) {
                continue;
            }
            collect_text(child_el, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        }
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
