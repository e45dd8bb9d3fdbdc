//! Remote data model for a Nextra docs site.
//!
//! A built site exposes two JSON assets this crate consumes:
//!
//! - the per-locale search data chunk
//!   (`/_next/static/chunks/nextra-data-<locale>.json`): a map from route to
//!   page title plus per-heading paragraph text, and
//! - the blog feed (`/feed.json`) with `items` carrying title, HTML content,
//!   url, and summary.
//!
//! [`Fetcher`] is the seam between the index loader and the asset source.
//! [`HttpFetcher`] reads a live site; [`DirFetcher`] reads the same layout
//! from a local build directory (and backs the tests).

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Locale used when the site does not specify one.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Route-relative path of the blog feed asset.
pub const FEED_PATH: &str = "/feed.json";

/// Route-relative path of the per-locale search data asset.
pub fn search_data_path(locale: &str) -> String {
    format!("/_next/static/chunks/nextra-data-{locale}.json")
}

/// Search data for one route.
///
/// Keys of `data` are `"<headingId>#<heading text>"` (empty heading id for
/// content above the first heading); values are newline-delimited paragraphs.
#[derive(Debug, Clone, Deserialize)]
pub struct PageData {
    pub title: String,
    pub data: BTreeMap<String, String>,
}

/// The whole per-locale search data asset: route -> page data.
pub type SearchData = BTreeMap<String, PageData>;

#[derive(Debug, Clone, Deserialize)]
pub struct BlogFeed {
    #[serde(default)]
    pub items: Vec<BlogItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlogItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content_html: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Source of the two site assets.
///
/// `base_path` doubles as the cache key prefix in the index registry, so two
/// fetchers pointed at different sites never share indices.
pub trait Fetcher: Send + Sync {
    fn fetch_search_data(
        &self,
        base_path: &str,
        locale: &str,
    ) -> impl Future<Output = Result<SearchData>> + Send;

    fn fetch_blog_feed(&self, base_path: &str) -> impl Future<Output = Result<BlogFeed>> + Send;
}

/// Fetches assets from a live site over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// The site serves these assets statically, so a hung request means the
    /// site is down; the timeout turns that into a load error instead of a
    /// search box that stays in its loading state forever.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!(url, "fetch_start");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        response.json().await.with_context(|| format!("parsing {url}"))
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch_search_data(&self, base_path: &str, locale: &str) -> Result<SearchData> {
        let url = format!("{base_path}{}", search_data_path(locale));
        self.get_json(&url).await
    }

    async fn fetch_blog_feed(&self, base_path: &str) -> Result<BlogFeed> {
        let url = format!("{base_path}{FEED_PATH}");
        self.get_json(&url).await
    }
}

/// Reads assets from a local site build directory (`next build` output).
#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(&self, rel: &str) -> Result<T> {
        let path = self.root.join(rel.trim_start_matches('/'));
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }
}

impl Fetcher for DirFetcher {
    async fn fetch_search_data(&self, _base_path: &str, locale: &str) -> Result<SearchData> {
        self.read_json(&search_data_path(locale)).await
    }

    async fn fetch_blog_feed(&self, _base_path: &str) -> Result<BlogFeed> {
        self.read_json(FEED_PATH).await
    }
}
