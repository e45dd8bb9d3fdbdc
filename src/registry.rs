//! Session-scoped index registry.
//!
//! Indices are built lazily on first use and cached for the lifetime of the
//! registry; there is no TTL, eviction, or rebuild. Doc indices are keyed by
//! `basePath@locale`; the blog index is locale-independent and keyed by base
//! path alone.
//!
//! Concurrent loads for the same key collapse onto a single in-flight
//! computation: each key maps to a shared [`OnceCell`], the first caller runs
//! the load and every other caller awaits the same cell. The outcome is
//! cached either way — a failed load stays failed for the session and is
//! reported again (without refetching) until a new registry is constructed.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};

use crate::data::Fetcher;
use crate::index::{BlogIndex, DocIndexes, build_blog_index, build_doc_indexes};

/// Why an index could not be produced. Cloneable so every waiter on a shared
/// load observes the same failure.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("fetching {asset}: {message}")]
    Fetch { asset: String, message: String },
    #[error("building {index} index: {message}")]
    Build {
        index: &'static str,
        message: String,
    },
}

type Slot<T> = Arc<OnceCell<Result<Arc<T>, LoadError>>>;

/// Explicit owner of all per-session indices. Construct once at startup and
/// hand it to each search client.
pub struct IndexRegistry<F> {
    fetcher: F,
    docs: Mutex<HashMap<String, Slot<DocIndexes>>>,
    blog: Mutex<HashMap<String, Slot<BlogIndex>>>,
}

impl<F: Fetcher> IndexRegistry<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            docs: Mutex::new(HashMap::new()),
            blog: Mutex::new(HashMap::new()),
        }
    }

    pub fn key(base_path: &str, locale: &str) -> String {
        format!("{base_path}@{locale}")
    }

    /// Page + section indices for a locale, loading them on first call.
    pub async fn docs(&self, base_path: &str, locale: &str) -> Result<Arc<DocIndexes>, LoadError> {
        let slot = {
            let mut map = self.docs.lock().await;
            map.entry(Self::key(base_path, locale)).or_default().clone()
        };
        slot.get_or_init(|| self.load_docs(base_path, locale))
            .await
            .clone()
    }

    /// Blog index for a site, loading it on first call.
    pub async fn blog(&self, base_path: &str) -> Result<Arc<BlogIndex>, LoadError> {
        let slot = {
            let mut map = self.blog.lock().await;
            map.entry(base_path.to_string()).or_default().clone()
        };
        slot.get_or_init(|| self.load_blog(base_path)).await.clone()
    }

    async fn load_docs(
        &self,
        base_path: &str,
        locale: &str,
    ) -> Result<Arc<DocIndexes>, LoadError> {
        tracing::info!(base_path, locale, "index_load_start");
        let data = self
            .fetcher
            .fetch_search_data(base_path, locale)
            .await
            .map_err(|e| LoadError::Fetch {
                asset: format!("nextra-data-{locale}.json"),
                message: format!("{e:#}"),
            })?;
        let indexes = build_doc_indexes(&data).map_err(|e| LoadError::Build {
            index: "docs",
            message: format!("{e:#}"),
        })?;
        tracing::info!(
            base_path,
            locale,
            pages = indexes.pages.num_docs(),
            sections = indexes.sections.num_docs(),
            "index_load_done"
        );
        Ok(Arc::new(indexes))
    }

    async fn load_blog(&self, base_path: &str) -> Result<Arc<BlogIndex>, LoadError> {
        let feed = self
            .fetcher
            .fetch_blog_feed(base_path)
            .await
            .map_err(|e| LoadError::Fetch {
                asset: "feed.json".into(),
                message: format!("{e:#}"),
            })?;
        let index = build_blog_index(&feed).map_err(|e| LoadError::Build {
            index: "blog",
            message: format!("{e:#}"),
        })?;
        tracing::info!(base_path, posts = index.num_docs(), "blog_index_loaded");
        Ok(Arc::new(index))
    }
}
