//! Offline pages rendered from HTML snapshots
//!
//! [`StaticPage`] answers the full [`Page`] contract against a fixed HTML
//! document, re-parsing on demand so the type stays `Send`. [`FixtureBrowser`]
//! serves a canned set of such pages and records cookie injections and
//! navigations, which makes it the workhorse of the integration tests and of
//! the binary's `--fixtures` mode.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

use super::{Browser, BrowserError, DomNode, Page};
use crate::session::{Disguise, SessionCookie};

/// A `Page` rendered from a fixed HTML snapshot
pub struct StaticPage {
    html: Arc<String>,
    final_url: Url,
}

impl StaticPage {
    pub fn new(final_url: Url, html: impl Into<String>) -> Self {
        Self {
            html: Arc::new(html.into()),
            final_url,
        }
    }

    fn parse_selector(selector: &str) -> Result<Selector, BrowserError> {
        Selector::parse(selector).map_err(|e| BrowserError::Query {
            selector: selector.to_string(),
            message: format!("{e:?}"),
        })
    }
}

fn collect_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[async_trait]
impl Page for StaticPage {
    fn final_url(&self) -> &Url {
        &self.final_url
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<bool, BrowserError> {
        // Static content either has the node or never will.
        self.exists(selector).await
    }

    async fn exists(&self, selector: &str) -> Result<bool, BrowserError> {
        let sel = Self::parse_selector(selector)?;
        let doc = Html::parse_document(&self.html);
        Ok(doc.select(&sel).next().is_some())
    }

    async fn count(&self, selector: &str) -> Result<usize, BrowserError> {
        let sel = Self::parse_selector(selector)?;
        let doc = Html::parse_document(&self.html);
        Ok(doc.select(&sel).count())
    }

    async fn text_of(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        let sel = Self::parse_selector(selector)?;
        let doc = Html::parse_document(&self.html);
        Ok(doc.select(&sel).next().map(|el| collect_text(&el)))
    }

    async fn texts_of(&self, selector: &str) -> Result<Vec<String>, BrowserError> {
        let sel = Self::parse_selector(selector)?;
        let doc = Html::parse_document(&self.html);
        Ok(doc.select(&sel).map(|el| collect_text(&el)).collect())
    }

    async fn attr_of(&self, selector: &str, attr: &str) -> Result<Option<String>, BrowserError> {
        let sel = Self::parse_selector(selector)?;
        let doc = Html::parse_document(&self.html);
        Ok(doc
            .select(&sel)
            .next()
            .and_then(|el| el.value().attr(attr))
            .map(str::to_string))
    }

    async fn attrs_of(&self, selector: &str, attr: &str) -> Result<Vec<String>, BrowserError> {
        let sel = Self::parse_selector(selector)?;
        let doc = Html::parse_document(&self.html);
        Ok(doc
            .select(&sel)
            .filter_map(|el| el.value().attr(attr))
            .map(str::to_string)
            .collect())
    }

    async fn nodes(&self, selector: &str) -> Result<Vec<Box<dyn DomNode>>, BrowserError> {
        let count = self.count(selector).await?;
        Ok((0..count)
            .map(|index| {
                Box::new(StaticNode {
                    html: Arc::clone(&self.html),
                    scope: selector.to_string(),
                    index,
                }) as Box<dyn DomNode>
            })
            .collect())
    }

    async fn title(&self) -> Result<String, BrowserError> {
        self.text_of("title").await.map(|t| t.unwrap_or_default())
    }

    async fn body_text(&self) -> Result<String, BrowserError> {
        let doc = Html::parse_document(&self.html);
        let sel = Self::parse_selector("body")?;
        Ok(doc
            .select(&sel)
            .next()
            .map(|el| collect_text(&el))
            .unwrap_or_else(|| doc.root_element().text().collect::<String>()))
    }

    async fn scroll_by_viewport(&self) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        // Best-effort stand-in: the raw document bytes.
        Ok(self.html.as_bytes().to_vec())
    }
}

/// A scoped element handle over a static document
struct StaticNode {
    html: Arc<String>,
    scope: String,
    index: usize,
}

#[async_trait]
impl DomNode for StaticNode {
    async fn text(&self) -> Result<String, BrowserError> {
        let scope = StaticPage::parse_selector(&self.scope)?;
        let doc = Html::parse_document(&self.html);
        Ok(doc
            .select(&scope)
            .nth(self.index)
            .map(|el| collect_text(&el))
            .unwrap_or_default())
    }

    async fn text_of(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        let scope = StaticPage::parse_selector(&self.scope)?;
        let sub = StaticPage::parse_selector(selector)?;
        let doc = Html::parse_document(&self.html);
        Ok(doc
            .select(&scope)
            .nth(self.index)
            .and_then(|el| el.select(&sub).next())
            .map(|el| collect_text(&el)))
    }

    async fn attr_of(&self, selector: &str, attr: &str) -> Result<Option<String>, BrowserError> {
        let scope = StaticPage::parse_selector(&self.scope)?;
        let sub = StaticPage::parse_selector(selector)?;
        let doc = Html::parse_document(&self.html);
        Ok(doc
            .select(&scope)
            .nth(self.index)
            .and_then(|el| el.select(&sub).next())
            .and_then(|el| el.value().attr(attr))
            .map(str::to_string))
    }
}

#[derive(Clone)]
struct FixtureEntry {
    html: Arc<String>,
    final_url: Url,
}

/// Manifest entry mapping a crawl URL onto an HTML snapshot file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry {
    url: String,
    file: String,
    #[serde(default)]
    final_url: Option<String>,
}

/// A `Browser` serving canned pages, with call tracking for assertions
#[derive(Default)]
pub struct FixtureBrowser {
    pages: Mutex<HashMap<String, FixtureEntry>>,
    injected_cookies: Mutex<Vec<SessionCookie>>,
    navigations: Mutex<Vec<String>>,
    reject_cookies: AtomicBool,
}

impl FixtureBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a page served at `url` that resolves to the same URL.
    pub fn add_page(&self, url: Url, html: impl Into<String>) {
        self.add_redirected_page(url.clone(), url, html);
    }

    /// Registers a page served at `url` that resolves to `final_url`,
    /// simulating a redirect.
    pub fn add_redirected_page(&self, url: Url, final_url: Url, html: impl Into<String>) {
        self.pages.lock().unwrap().insert(
            url.to_string(),
            FixtureEntry {
                html: Arc::new(html.into()),
                final_url,
            },
        );
    }

    /// Builder form of [`add_page`](Self::add_page).
    pub fn with_page(self, url: Url, html: impl Into<String>) -> Self {
        self.add_page(url, html);
        self
    }

    /// Loads pages from a fixture directory containing `manifest.json` and
    /// the snapshot files it references.
    pub fn from_manifest(dir: &Path) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(dir.join("manifest.json"))?;
        let entries: Vec<ManifestEntry> = serde_json::from_str(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let browser = Self::new();
        for entry in entries {
            let url = Url::parse(&entry.url)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            let final_url = match &entry.final_url {
                Some(raw) => Url::parse(raw)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?,
                None => url.clone(),
            };
            let html = std::fs::read_to_string(dir.join(&entry.file))?;
            browser.add_redirected_page(url, final_url, html);
        }
        Ok(browser)
    }

    /// Makes subsequent cookie injections fail, for exercising the
    /// skip-on-failure path.
    pub fn reject_cookie_injection(&self) {
        self.reject_cookies.store(true, Ordering::Relaxed);
    }

    /// Cookies installed so far.
    pub fn injected_cookies(&self) -> Vec<SessionCookie> {
        self.injected_cookies.lock().unwrap().clone()
    }

    /// Every URL opened, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Browser for FixtureBrowser {
    async fn inject_cookies(&self, cookies: &[SessionCookie]) -> Result<(), BrowserError> {
        if self.reject_cookies.load(Ordering::Relaxed) {
            return Err(BrowserError::Unsupported(
                "cookie injection disabled".to_string(),
            ));
        }
        self.injected_cookies
            .lock()
            .unwrap()
            .extend_from_slice(cookies);
        Ok(())
    }

    async fn open(&self, url: &Url, _disguise: &Disguise) -> Result<Box<dyn Page>, BrowserError> {
        self.navigations.lock().unwrap().push(url.to_string());
        let entry = self
            .pages
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| BrowserError::Navigation(format!("no fixture for {url}")))?;
        Ok(Box::new(StaticPage {
            html: entry.html,
            final_url: entry.final_url,
        }))
    }
}
