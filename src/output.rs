//! CLI rendering of search results.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::highlight::{self, Span};
use crate::search::SearchResult;

/// JSON view of a result with `**` match markers, mirroring the snippet
/// format used for text search hits elsewhere in the ecosystem.
#[derive(Debug, Serialize)]
struct JsonResult<'a> {
    id: &'a str,
    kind: &'a crate::search::ResultKind,
    route: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    excerpt: Option<String>,
}

pub fn print_results(query: &str, results: &[SearchResult], json: bool) -> Result<()> {
    if json {
        let view: Vec<JsonResult<'_>> = results
            .iter()
            .map(|r| JsonResult {
                id: &r.id,
                kind: &r.kind,
                route: &r.route,
                group: r.group.as_deref(),
                title: highlight::mark(&r.title, query, "**", "**"),
                excerpt: r.excerpt.as_deref().map(|e| highlight::mark(e, query, "**", "**")),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("{}", "no results".dimmed());
        return Ok(());
    }

    for result in results {
        if let Some(group) = &result.group {
            println!("\n{}", group.to_uppercase().bold().underline());
        }
        println!(
            "  {}  {}",
            render_spans(highlight::highlight(&result.title, query), true),
            result.route.dimmed()
        );
        if let Some(excerpt) = &result.excerpt {
            println!("    {}", render_spans(highlight::highlight(excerpt, query), false));
        }
    }
    Ok(())
}

fn render_spans(spans: Vec<Span>, title: bool) -> String {
    spans
        .into_iter()
        .map(|span| {
            if span.highlighted {
                span.text.cyan().bold().to_string()
            } else if title {
                span.text.bold().to_string()
            } else {
                span.text.normal().to_string()
            }
        })
        .collect()
}
