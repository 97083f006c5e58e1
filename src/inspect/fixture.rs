// SPDX-License-Identifier: PMPL-1.0-or-later
//! In-memory inspection session.
//!
//! A [`FixtureSite`] maps URLs to canned pages. It backs the `analyze`
//! command (local HTML files served under a base URL) and the test suite.

use super::{Cookie, Document, Element, Locator, PageInspector, SessionProvider};
use crate::error::{PrivacyError, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;
use url::Url;
use walkdir::WalkDir;

/// Directories never served from a local site
const SKIP_DIRS: &[&str] = &["node_modules", "target", "dist", "build", "vendor", "coverage"];

/// One canned page
#[derive(Debug, Clone, Default)]
pub struct FixturePage {
    pub html: String,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<Cookie>,
}

impl FixturePage {
    pub fn new(html: &str) -> Self {
        Self {
            html: html.to_string(),
            ..Self::default()
        }
    }

    /// Set a response header, replacing any earlier value
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        self.headers.retain(|(k, _)| *k != name);
        self.headers.push((name, value.to_string()));
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }
}

/// A set of canned pages and probe answers
#[derive(Debug, Clone, Default)]
pub struct FixtureSite {
    pages: HashMap<String, FixturePage>,
    probes: HashMap<String, bool>,
    released: Arc<AtomicUsize>,
}

impl FixtureSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve raw HTML at a URL
    pub fn page(self, url: &str, html: &str) -> Self {
        self.with_page(url, FixturePage::new(html))
    }

    pub fn with_page(mut self, url: &str, page: FixturePage) -> Self {
        self.pages.insert(page_key(url), page);
        self
    }

    /// Answer a probe script with a fixed value
    pub fn with_probe(mut self, script: &str, answer: bool) -> Self {
        self.probes.insert(script.to_string(), answer);
        self
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// How many sessions from this site have been closed
    pub fn sessions_released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Serve local HTML under `base_url`.
    ///
    /// A file is served at the base URL itself. For a directory every
    /// `.html`/`.htm` file is served at its relative path, with and without
    /// the extension; `index.html` also answers for its directory.
    pub fn from_path(path: &Path, base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)?;
        let mut site = FixtureSite::new();

        if path.is_file() {
            let html = std::fs::read_to_string(path)?;
            return Ok(site.page(base.as_str(), &html));
        }

        for entry in WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_str().unwrap_or("");
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || (!SKIP_DIRS.contains(&name) && !name.starts_with('.'))
            })
            .filter_map(|e| e.ok())
        {
            let file = entry.path();
            let ext = file.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !entry.file_type().is_file() || !matches!(ext, "html" | "htm") {
                continue;
            }

            let rel = file
                .strip_prefix(path)
                .map_err(|e| PrivacyError::Config(e.to_string()))?
                .to_string_lossy()
                .replace('\\', "/");
            let html = std::fs::read_to_string(file)?;

            let stem = rel.trim_end_matches(&format!(".{}", ext)).to_string();
            let mut routes = vec![rel.clone(), stem.clone()];
            if stem == "index" || stem.ends_with("/index") {
                routes.push(stem.trim_end_matches("index").to_string());
            }
            for route in routes {
                let url = base.join(&route)?;
                debug!("Fixture {} -> {}", url, file.display());
                site = site.page(url.as_str(), &html);
            }
        }

        if site.is_empty() {
            return Err(PrivacyError::Config(format!(
                "no HTML files found under {}",
                path.display()
            )));
        }
        Ok(site)
    }
}

impl SessionProvider for FixtureSite {
    type Session = FixtureSession;

    fn acquire(&self) -> Result<FixtureSession> {
        Ok(FixtureSession::new(self.clone()))
    }
}

fn page_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

/// Session over a [`FixtureSite`]
#[derive(Debug)]
pub struct FixtureSession {
    site: FixtureSite,
    page: Option<(Document, FixturePage)>,
    jar: Vec<Cookie>,
    history: Vec<String>,
}

impl FixtureSession {
    pub fn new(site: FixtureSite) -> Self {
        Self {
            site,
            page: None,
            jar: Vec::new(),
            history: Vec::new(),
        }
    }

    /// URLs navigated to, in order
    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn lookup(&self, url: &str) -> Option<&FixturePage> {
        let key = page_key(url);
        self.site.pages.get(&key).or_else(|| {
            let alternate = match key.strip_suffix('/') {
                Some(stripped) => stripped.to_string(),
                None => format!("{}/", key),
            };
            self.site.pages.get(&alternate)
        })
    }

    fn document(&self) -> Result<&Document> {
        self.page
            .as_ref()
            .map(|(doc, _)| doc)
            .ok_or_else(|| PrivacyError::Navigation {
                url: "about:blank".to_string(),
                reason: "no page loaded".to_string(),
            })
    }
}

impl PageInspector for FixtureSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.history.push(url.to_string());
        let page = self
            .lookup(url)
            .cloned()
            .ok_or_else(|| PrivacyError::Navigation {
                url: url.to_string(),
                reason: "no fixture page".to_string(),
            })?;

        let doc = Document::parse(&page_key(url), &page.html)?;
        for cookie in &page.cookies {
            self.jar.retain(|c| c.name != cookie.name);
            self.jar.push(cookie.clone());
        }
        self.page = Some((doc, page));
        Ok(())
    }

    fn current_url(&self) -> String {
        self.page
            .as_ref()
            .map(|(doc, _)| doc.url().to_string())
            .unwrap_or_else(|| "about:blank".to_string())
    }

    fn page_source(&self) -> Result<String> {
        Ok(self.document()?.source().to_string())
    }

    fn find_elements(&self, locator: &Locator) -> Result<Vec<Element>> {
        self.document()?.select(locator)
    }

    fn cookies(&self) -> Result<Vec<Cookie>> {
        Ok(self.jar.clone())
    }

    fn response_headers(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .page
            .as_ref()
            .map(|(_, page)| page.headers.clone())
            .unwrap_or_default())
    }

    fn resources(&self) -> Result<Vec<String>> {
        self.document()?.resources()
    }

    fn evaluate(&mut self, script: &str) -> Result<bool> {
        self.site
            .probes
            .get(script)
            .copied()
            .ok_or_else(|| PrivacyError::Unsupported(format!("no probe answer for `{}`", script)))
    }

    fn close(&mut self) -> Result<()> {
        self.page = None;
        self.site.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
