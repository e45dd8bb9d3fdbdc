//! CLI tests over a local site build directory (no network).

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

/// Lay out a minimal `next build` output: search data chunk + blog feed.
fn write_site(root: &Path) {
    let chunks = root.join("_next/static/chunks");
    fs::create_dir_all(&chunks).unwrap();
    fs::write(
        chunks.join("nextra-data-en-US.json"),
        r#"{
            "/docs/permissions": {
                "title": "Permissions",
                "data": {
                    "": "How permissions are computed.",
                    "caveats#Caveats": "Caveats gate permissions at check time."
                }
            },
            "/docs/schema": {
                "title": "Schema",
                "data": {
                    "": "Schema language reference."
                }
            }
        }"#,
    )
    .unwrap();
    fs::write(
        root.join("feed.json"),
        r#"{
            "items": [
                {
                    "title": "Announcing caveats",
                    "content_html": "<p>Caveats are generally available.</p>",
                    "url": "https://example.com/blog/caveats",
                    "summary": "Caveats GA"
                }
            ]
        }"#,
    )
    .unwrap();
}

#[test]
fn query_renders_grouped_results() {
    let tmp = tempfile::TempDir::new().unwrap();
    write_site(tmp.path());

    cargo_bin_cmd!("docsearch")
        .args(["query", "caveats", "--dir"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("/docs/permissions#caveats"));
}

#[test]
fn query_json_marks_matches_and_orders_blog_last() {
    let tmp = tempfile::TempDir::new().unwrap();
    write_site(tmp.path());

    let assert = cargo_bin_cmd!("docsearch")
        .args(["query", "caveats", "--json", "--dir"])
        .arg(tmp.path())
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let results: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let results = results.as_array().unwrap();
    assert!(!results.is_empty());

    // Docs entries precede the blog entry.
    let kinds: Vec<&str> = results
        .iter()
        .map(|r| r["kind"].as_str().unwrap())
        .collect();
    let first_blog = kinds.iter().position(|k| *k == "blog");
    if let Some(first_blog) = first_blog {
        assert!(kinds[..first_blog].iter().all(|k| *k == "docs"));
    }

    // Matches carry ** markers.
    assert!(stdout.contains("**Caveats**") || stdout.contains("**caveats**"));
}

#[test]
fn empty_query_prints_empty_json_array() {
    let tmp = tempfile::TempDir::new().unwrap();
    write_site(tmp.path());

    let assert = cargo_bin_cmd!("docsearch")
        .args(["query", "--json", "--dir"])
        .arg(tmp.path())
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let results: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(results.as_array().unwrap().len(), 0);
}

#[test]
fn stats_reports_index_sizes() {
    let tmp = tempfile::TempDir::new().unwrap();
    write_site(tmp.path());

    cargo_bin_cmd!("docsearch")
        .args(["stats", "--dir"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("pages:      2")
                .and(predicate::str::contains("blog posts: 1")),
        );
}

#[test]
fn missing_site_dir_fails_with_context() {
    let tmp = tempfile::TempDir::new().unwrap();
    // No assets written: the load must fail, not hang or succeed empty.
    cargo_bin_cmd!("docsearch")
        .args(["query", "anything", "--dir"])
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("nextra-data-en-US.json"));
}
