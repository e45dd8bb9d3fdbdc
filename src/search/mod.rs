//! Query aggregation over the page, section, and blog indices.
//!
//! A query fans out as the site's search box does: the page index nominates
//! candidate pages, the top candidates are expanded into per-page section
//! matches, duplicates are dropped, and ordering is biased toward pages whose
//! headings matched the query. Blog matches are appended after all docs
//! matches regardless of score.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use crate::data::Fetcher;
use crate::registry::IndexRegistry;

/// Candidate pages requested from the page index.
pub const PAGE_SEARCH_LIMIT: usize = 5;
/// Candidate pages actually expanded into sections.
pub const PAGE_EXPAND_LIMIT: usize = 3;
/// Section matches requested per expanded page.
pub const SECTION_SEARCH_LIMIT: usize = 5;
/// Section results kept per page, applied after the global sort so the cap
/// keeps the best sections, not the first found.
pub const SECTIONS_PER_PAGE: usize = 3;
/// Blog matches requested from the blog index.
pub const BLOG_SEARCH_LIMIT: usize = 5;
/// Blog results kept in the output.
pub const BLOG_RESULT_LIMIT: usize = 3;

/// Group label attached to every blog result.
pub const BLOG_GROUP: &str = "Blog";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Docs,
    Blog,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub kind: ResultKind,
    /// Route of the matched section (or blog post url).
    pub route: String,
    /// Group header: the page title on the first result of each page, the
    /// blog label on every blog result.
    pub group: Option<String>,
    /// Section heading (or blog post title).
    pub title: String,
    /// Displayed snippet: the section's first paragraph for heading matches,
    /// otherwise the matched paragraph (blog: the post summary).
    pub excerpt: Option<String>,
}

struct Ranked {
    page_rank: usize,
    section_rank: usize,
    result: SearchResult,
}

/// Search facade over one site + locale. Indices load lazily on the first
/// query and are shared through the registry.
pub struct SearchClient<F> {
    registry: Arc<IndexRegistry<F>>,
    base_path: String,
    locale: String,
}

impl<F: Fetcher> SearchClient<F> {
    pub fn new(
        registry: Arc<IndexRegistry<F>>,
        base_path: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            base_path: base_path.into(),
            locale: locale.into(),
        }
    }

    /// Run one query. An empty query short-circuits without loading or
    /// touching any index.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let docs = self.registry.docs(&self.base_path, &self.locale).await?;
        let blog = self.registry.blog(&self.base_path).await?;
        tracing::info!(query, locale = %self.locale, "search_start");

        let page_hits = docs.pages.search(query, PAGE_SEARCH_LIMIT)?;

        let mut ranked: Vec<Ranked> = Vec::new();
        let mut title_matches = vec![0usize; page_hits.len().min(PAGE_EXPAND_LIMIT)];

        for (i, page) in page_hits.iter().take(PAGE_EXPAND_LIMIT).enumerate() {
            let sections = docs
                .sections
                .search_page(query, page.id, SECTION_SEARCH_LIMIT)?;

            let mut first_of_page = true;
            let mut seen: HashSet<(String, String)> = HashSet::new();
            for (j, section) in sections.into_iter().enumerate() {
                // A hit with a display paragraph is a heading match; it
                // counts toward the page's title bias even when the entry is
                // later dropped as a duplicate.
                if section.display.is_some() {
                    title_matches[i] += 1;
                }
                let content = section.display.unwrap_or(section.content);
                if !seen.insert((section.url.clone(), content.clone())) {
                    continue;
                }
                ranked.push(Ranked {
                    page_rank: i,
                    section_rank: j,
                    result: SearchResult {
                        id: format!("{i}_{j}"),
                        kind: ResultKind::Docs,
                        route: section.url,
                        group: first_of_page.then(|| page.title.clone()),
                        title: section.title,
                        excerpt: (!content.is_empty()).then_some(content),
                    },
                });
                first_of_page = false;
            }
        }

        // Pages with more heading matches come first; raw page rank breaks
        // ties, section rank orders within a page.
        ranked.sort_by(|a, b| {
            if a.page_rank == b.page_rank {
                return a.section_rank.cmp(&b.section_rank);
            }
            let (ta, tb) = (title_matches[a.page_rank], title_matches[b.page_rank]);
            if ta != tb {
                return tb.cmp(&ta);
            }
            a.page_rank.cmp(&b.page_rank)
        });

        let mut per_page: HashMap<usize, usize> = HashMap::new();
        let mut results: Vec<SearchResult> = ranked
            .into_iter()
            .filter(|r| {
                let count = per_page.entry(r.page_rank).or_insert(0);
                *count += 1;
                *count <= SECTIONS_PER_PAGE
            })
            .map(|r| r.result)
            .collect();

        let docs_count = results.len();
        for hit in blog
            .search(query, BLOG_SEARCH_LIMIT)?
            .into_iter()
            .take(BLOG_RESULT_LIMIT)
        {
            results.push(SearchResult {
                id: hit.id.to_string(),
                kind: ResultKind::Blog,
                route: hit.url,
                group: Some(BLOG_GROUP.to_string()),
                title: hit.title,
                excerpt: hit.summary.filter(|s| !s.is_empty()),
            });
        }

        tracing::info!(
            query,
            docs = docs_count,
            blog = results.len() - docs_count,
            "search_done"
        );
        Ok(results)
    }
}
