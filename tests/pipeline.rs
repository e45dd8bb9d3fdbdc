//! End-to-end pipeline tests: fixture corpus -> registry -> aggregator.
//!
//! Covers the ranking contract of the search box:
//! - at most 3 pages expanded, at most 3 sections per page
//! - no duplicate (route, excerpt) pairs
//! - heading-match bias overrides raw page order
//! - blog results always trail docs results

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use docsearch::data::{BlogFeed, BlogItem, Fetcher, PageData, SearchData};
use docsearch::registry::IndexRegistry;
use docsearch::search::{ResultKind, SearchClient, SECTIONS_PER_PAGE};

#[derive(Clone)]
struct FixtureFetcher {
    data: SearchData,
    feed: BlogFeed,
}

impl Fetcher for FixtureFetcher {
    async fn fetch_search_data(&self, _base_path: &str, _locale: &str) -> Result<SearchData> {
        Ok(self.data.clone())
    }

    async fn fetch_blog_feed(&self, _base_path: &str) -> Result<BlogFeed> {
        Ok(self.feed.clone())
    }
}

fn page(title: &str, sections: &[(&str, &str)]) -> PageData {
    PageData {
        title: title.into(),
        data: sections
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn fixture() -> FixtureFetcher {
    let mut data = SearchData::new();

    // Body-only matches for "cat": headings say nothing about cats.
    data.insert(
        "/docs/alpha".into(),
        page(
            "Alpha",
            &[(
                "",
                "cat cat cat cat cat cat\ncat cat cat cat\ncat herding at scale",
            )],
        ),
    );

    // Heading matches for "cat".
    data.insert(
        "/docs/beta".into(),
        page(
            "Beta",
            &[
                ("cat-basics#Cat basics", "cat behavior overview"),
                ("cat-care#Cat care", "feeding your cat"),
            ],
        ),
    );

    // Six matching sections on one page; the per-page cap must bite.
    data.insert(
        "/docs/gamma".into(),
        page(
            "Gamma",
            &[
                ("w1#Walrus one", "walrus walrus"),
                ("w2#Walrus two", "walrus habitat"),
                ("w3#Walrus three", "walrus diet"),
                ("w4#Walrus four", "walrus songs"),
                ("w5#Walrus five", "walrus travel"),
                ("w6#Walrus six", "walrus trivia"),
            ],
        ),
    );

    // Five matching pages; only three may be expanded.
    for i in 1..=5 {
        data.insert(
            format!("/docs/shark-{i}"),
            page(&format!("Shark {i}"), &[("", "shark shark shark")]),
        );
    }

    let feed = BlogFeed {
        items: (0..5)
            .map(|i| BlogItem {
                title: format!("Cat post {i}"),
                content_html: "<p>cat cat cat</p>".into(),
                url: format!("https://example.com/blog/cat-{i}"),
                summary: Some("a cat story".into()),
            })
            .collect(),
    };

    FixtureFetcher { data, feed }
}

fn client(fetcher: FixtureFetcher) -> SearchClient<FixtureFetcher> {
    SearchClient::new(Arc::new(IndexRegistry::new(fetcher)), "", "en-US")
}

#[tokio::test]
async fn heading_matches_outrank_body_matches() {
    let client = client(fixture());
    let results = client.search("cat").await.unwrap();

    let first_beta = results
        .iter()
        .position(|r| r.route.starts_with("/docs/beta"))
        .expect("beta sections present");
    let first_alpha = results
        .iter()
        .position(|r| r.route.starts_with("/docs/alpha"))
        .expect("alpha sections present");
    assert!(
        first_beta < first_alpha,
        "page with heading matches must sort before body-only page: {results:#?}"
    );
}

#[tokio::test]
async fn at_most_three_sections_per_page() {
    let client = client(fixture());
    let results = client.search("walrus").await.unwrap();

    assert!(!results.is_empty());
    let gamma = results
        .iter()
        .filter(|r| r.route.starts_with("/docs/gamma"))
        .count();
    assert!(gamma <= SECTIONS_PER_PAGE, "got {gamma} gamma sections");
}

#[tokio::test]
async fn at_most_three_pages_expanded() {
    let client = client(fixture());
    let results = client.search("shark").await.unwrap();

    let pages: HashSet<&str> = results
        .iter()
        .filter(|r| r.kind == ResultKind::Docs)
        .map(|r| r.route.split('#').next().unwrap_or(&r.route))
        .collect();
    assert!(!pages.is_empty());
    assert!(pages.len() <= 3, "expanded pages: {pages:?}");
}

#[tokio::test]
async fn no_duplicate_route_excerpt_pairs() {
    let client = client(fixture());
    let results = client.search("cat").await.unwrap();

    let mut seen = HashSet::new();
    for result in &results {
        assert!(
            seen.insert((result.route.clone(), result.excerpt.clone())),
            "duplicate entry for {} / {:?}",
            result.route,
            result.excerpt
        );
    }
}

#[tokio::test]
async fn blog_results_trail_docs_results_and_are_capped() {
    let client = client(fixture());
    let results = client.search("cat").await.unwrap();

    let last_docs = results.iter().rposition(|r| r.kind == ResultKind::Docs);
    let first_blog = results.iter().position(|r| r.kind == ResultKind::Blog);
    let blog_count = results.iter().filter(|r| r.kind == ResultKind::Blog).count();

    assert!(blog_count >= 1, "fixture blog posts should match");
    assert!(blog_count <= 3, "got {blog_count} blog results");
    if let (Some(last_docs), Some(first_blog)) = (last_docs, first_blog) {
        assert!(last_docs < first_blog, "docs must precede blog: {results:#?}");
    }
    for result in results.iter().filter(|r| r.kind == ResultKind::Blog) {
        assert_eq!(result.group.as_deref(), Some("Blog"));
    }
}

#[tokio::test]
async fn first_result_of_each_page_carries_group_header() {
    let client = client(fixture());
    let results = client.search("walrus").await.unwrap();

    let gamma: Vec<_> = results
        .iter()
        .filter(|r| r.route.starts_with("/docs/gamma"))
        .collect();
    assert!(!gamma.is_empty());
    assert_eq!(gamma[0].group.as_deref(), Some("Gamma"));
    for later in &gamma[1..] {
        assert!(later.group.is_none());
    }
}

#[tokio::test]
async fn empty_query_yields_no_results() {
    let client = client(fixture());
    let results = client.search("").await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn repeated_queries_reuse_the_session_indices() {
    // Registry memoization means a second query must not refetch; a panicking
    // second fetch would surface here.
    let client = client(fixture());
    let first = client.search("cat").await.unwrap();
    let second = client.search("cat").await.unwrap();
    assert_eq!(first.len(), second.len());
}
