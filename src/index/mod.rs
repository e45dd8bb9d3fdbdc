//! In-memory tantivy indices over a site's search data.
//!
//! Three indices back a search session:
//!
//! - **page**: one document per route, body = page title plus all section
//!   text concatenated.
//! - **section**: per heading, one title document (content = heading text,
//!   `display` = first paragraph when present) plus one document per
//!   paragraph; every document is tagged with its page id so section
//!   searches can be scoped to a single page.
//! - **blog**: one document per feed item, indexed on the HTML body.
//!
//! Indices live in RAM for the session and are never rebuilt; the registry
//! (`crate::registry`) owns their lifecycle.

use anyhow::{Context, Result};
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{
    INDEXED, IndexRecordOption, STORED, Schema, TEXT, Term, Value,
};
use tantivy::{Index, IndexReader, TantivyDocument, doc};

use crate::data::{BlogFeed, SearchData};

/// Tantivy requires a sizable writer arena even for small corpora.
const WRITER_HEAP_BYTES: usize = 50_000_000;

pub struct PageFields {
    pub id: tantivy::schema::Field,
    pub title: tantivy::schema::Field,
    pub content: tantivy::schema::Field,
}

pub struct SectionFields {
    pub id: tantivy::schema::Field,
    pub url: tantivy::schema::Field,
    pub title: tantivy::schema::Field,
    pub page_id: tantivy::schema::Field,
    pub content: tantivy::schema::Field,
    pub display: tantivy::schema::Field,
}

pub struct BlogFields {
    pub id: tantivy::schema::Field,
    pub title: tantivy::schema::Field,
    pub content: tantivy::schema::Field,
    pub url: tantivy::schema::Field,
    pub summary: tantivy::schema::Field,
}

pub struct PageIndex {
    index: Index,
    reader: IndexReader,
    fields: PageFields,
}

pub struct SectionIndex {
    index: Index,
    reader: IndexReader,
    fields: SectionFields,
}

pub struct BlogIndex {
    index: Index,
    reader: IndexReader,
    fields: BlogFields,
}

/// The per-locale pair the registry caches.
pub struct DocIndexes {
    pub pages: PageIndex,
    pub sections: SectionIndex,
}

/// Whole-page match from the page index.
#[derive(Debug, Clone)]
pub struct PageHit {
    pub id: u64,
    pub title: String,
}

/// Section match scoped to one page.
#[derive(Debug, Clone)]
pub struct SectionHit {
    pub url: String,
    pub title: String,
    pub content: String,
    /// First paragraph of the section. Present only on title documents, so
    /// presence doubles as "this hit matched the heading text".
    pub display: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BlogHit {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub summary: Option<String>,
}

fn page_schema() -> (Schema, PageFields) {
    let mut builder = Schema::builder();
    let id = builder.add_u64_field("id", INDEXED | STORED);
    let title = builder.add_text_field("title", STORED);
    let content = builder.add_text_field("content", TEXT);
    (builder.build(), PageFields { id, title, content })
}

fn section_schema() -> (Schema, SectionFields) {
    let mut builder = Schema::builder();
    let id = builder.add_text_field("id", STORED);
    let url = builder.add_text_field("url", STORED);
    let title = builder.add_text_field("title", STORED);
    let page_id = builder.add_u64_field("page_id", INDEXED | STORED);
    let content = builder.add_text_field("content", TEXT | STORED);
    let display = builder.add_text_field("display", STORED);
    (
        builder.build(),
        SectionFields {
            id,
            url,
            title,
            page_id,
            content,
            display,
        },
    )
}

fn blog_schema() -> (Schema, BlogFields) {
    let mut builder = Schema::builder();
    let id = builder.add_u64_field("id", STORED);
    let title = builder.add_text_field("title", STORED);
    let content = builder.add_text_field("content", TEXT);
    let url = builder.add_text_field("url", STORED);
    let summary = builder.add_text_field("summary", STORED);
    (
        builder.build(),
        BlogFields {
            id,
            title,
            content,
            url,
            summary,
        },
    )
}

/// Build the page and section indices from one locale's search data.
///
/// Page ids are assigned in route order starting at 1 and tag every section
/// document of that route.
pub fn build_doc_indexes(data: &SearchData) -> Result<DocIndexes> {
    let (page_schema, pf) = page_schema();
    let page_index = Index::create_in_ram(page_schema);
    let mut page_writer = page_index
        .writer(WRITER_HEAP_BYTES)
        .context("create page index writer")?;

    let (section_schema, sf) = section_schema();
    let section_index = Index::create_in_ram(section_schema);
    let mut section_writer = section_index
        .writer(WRITER_HEAP_BYTES)
        .context("create section index writer")?;

    let mut page_id: u64 = 0;
    for (route, page) in data {
        page_id += 1;
        let mut page_content = String::new();

        for (key, content) in &page.data {
            let (heading_id, heading_text) = key.split_once('#').unwrap_or((key.as_str(), ""));
            let url = if heading_id.is_empty() {
                route.clone()
            } else {
                format!("{route}#{heading_id}")
            };
            let title = if heading_text.is_empty() {
                page.title.as_str()
            } else {
                heading_text
            };
            let paragraphs: Vec<&str> = content.split('\n').collect();

            // Title document: matches here mean the heading itself matched.
            let mut title_doc = doc!(
                sf.id => url.clone(),
                sf.url => url.clone(),
                sf.title => title,
                sf.page_id => page_id,
                sf.content => title,
            );
            if let Some(first) = paragraphs.first().filter(|p| !p.is_empty()) {
                title_doc.add_text(sf.display, *first);
            }
            section_writer.add_document(title_doc)?;

            for (i, paragraph) in paragraphs.iter().enumerate() {
                section_writer.add_document(doc!(
                    sf.id => format!("{url}_{i}"),
                    sf.url => url.clone(),
                    sf.title => title,
                    sf.page_id => page_id,
                    sf.content => *paragraph,
                ))?;
            }

            page_content.push(' ');
            page_content.push_str(title);
            page_content.push(' ');
            page_content.push_str(content);
        }

        page_writer.add_document(doc!(
            pf.id => page_id,
            pf.title => page.title.clone(),
            pf.content => page_content,
        ))?;
    }

    page_writer.commit().context("commit page index")?;
    section_writer.commit().context("commit section index")?;

    let pages = PageIndex {
        reader: page_index.reader().context("page index reader")?,
        index: page_index,
        fields: pf,
    };
    let sections = SectionIndex {
        reader: section_index.reader().context("section index reader")?,
        index: section_index,
        fields: sf,
    };
    tracing::debug!(
        pages = pages.num_docs(),
        sections = sections.num_docs(),
        "doc_indexes_built"
    );
    Ok(DocIndexes { pages, sections })
}

/// Build the blog index from the site feed. Item ids are feed positions.
pub fn build_blog_index(feed: &BlogFeed) -> Result<BlogIndex> {
    let (schema, bf) = blog_schema();
    let index = Index::create_in_ram(schema);
    let mut writer = index
        .writer(WRITER_HEAP_BYTES)
        .context("create blog index writer")?;

    for (i, item) in feed.items.iter().enumerate() {
        let mut d = doc!(
            bf.id => i as u64,
            bf.title => item.title.clone(),
            bf.content => item.content_html.clone(),
            bf.url => item.url.clone(),
        );
        if let Some(summary) = &item.summary {
            d.add_text(bf.summary, summary);
        }
        writer.add_document(d)?;
    }
    writer.commit().context("commit blog index")?;

    Ok(BlogIndex {
        reader: index.reader().context("blog index reader")?,
        index,
        fields: bf,
    })
}

fn stored_str(doc: &TantivyDocument, field: tantivy::schema::Field) -> String {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

impl PageIndex {
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<PageHit>> {
        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.fields.content]);
        let (q, _) = parser.parse_query_lenient(query);
        let top = searcher.search(&q, &TopDocs::with_limit(limit))?;

        let mut hits = Vec::with_capacity(top.len());
        for (_score, addr) in top {
            let doc: TantivyDocument = searcher.doc(addr)?;
            let id = doc
                .get_first(self.fields.id)
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            hits.push(PageHit {
                id,
                title: stored_str(&doc, self.fields.title),
            });
        }
        Ok(hits)
    }

    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

impl SectionIndex {
    /// Search section text, restricted to the sections of one page.
    pub fn search_page(&self, query: &str, page_id: u64, limit: usize) -> Result<Vec<SectionHit>> {
        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.fields.content]);
        let (text_query, _) = parser.parse_query_lenient(query);

        let tag: Box<dyn Query> = Box::new(TermQuery::new(
            Term::from_field_u64(self.fields.page_id, page_id),
            IndexRecordOption::Basic,
        ));
        let q = BooleanQuery::new(vec![(Occur::Must, text_query), (Occur::Must, tag)]);
        let top = searcher.search(&q, &TopDocs::with_limit(limit))?;

        let mut hits = Vec::with_capacity(top.len());
        for (_score, addr) in top {
            let doc: TantivyDocument = searcher.doc(addr)?;
            let display = doc
                .get_first(self.fields.display)
                .and_then(|v| v.as_str())
                .map(str::to_string);
            hits.push(SectionHit {
                url: stored_str(&doc, self.fields.url),
                title: stored_str(&doc, self.fields.title),
                content: stored_str(&doc, self.fields.content),
                display,
            });
        }
        Ok(hits)
    }

    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

impl BlogIndex {
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<BlogHit>> {
        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.fields.content]);
        let (q, _) = parser.parse_query_lenient(query);
        let top = searcher.search(&q, &TopDocs::with_limit(limit))?;

        let mut hits = Vec::with_capacity(top.len());
        for (_score, addr) in top {
            let doc: TantivyDocument = searcher.doc(addr)?;
            let summary = doc
                .get_first(self.fields.summary)
                .and_then(|v| v.as_str())
                .map(str::to_string);
            hits.push(BlogHit {
                id: doc
                    .get_first(self.fields.id)
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0),
                title: stored_str(&doc, self.fields.title),
                url: stored_str(&doc, self.fields.url),
                summary,
            });
        }
        Ok(hits)
    }

    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}
