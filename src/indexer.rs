use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use futures::{StreamExt, stream};
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{info, warn};

use crate::data_models::SearchDocument;
use crate::elastic::ElasticBackend;

/// How many page files are read and parsed at once.
const CONCURRENT_READS: usize = 8;
/// Documents per bulk request.
const BULK_BATCH: usize = 200;

/// The slice of a Sphinx `.fjson` page dump we index. Everything else in the
/// file is ignored.
#[derive(Debug, Deserialize)]
struct FjsonPage {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    current_page_name: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    parents: Vec<FjsonParent>,
}

#[derive(Debug, Deserialize)]
struct FjsonParent {
    #[serde(default)]
    title: String,
}

/// Walks a documentation build directory and loads its pages into the search
/// index.
pub struct Indexer {
    backend: ElasticBackend,
}

impl Indexer {
    pub fn new(backend: ElasticBackend) -> Indexer {
        Indexer { backend }
    }

    /// Index every page under `build_dir` as belonging to `version`. Pages
    /// that cannot be read or parsed are logged and skipped, not fatal.
    /// Returns the number of documents loaded.
    pub async fn index(&self, version: &str, build_dir: &Path) -> Result<usize> {
        let files = collect_fjson_files(build_dir)?;
        info!(count = files.len(), dir = %build_dir.display(), "indexing page files");

        let mut indexed = 0usize;
        let mut batch: Vec<SearchDocument> = Vec::with_capacity(BULK_BATCH);

        let mut pages = stream::iter(files)
            .map(|path| {
                let version = version.to_string();
                // file reads and HTML parsing stay off the runtime workers
                tokio::task::spawn_blocking(move || (build_document(&version, &path), path))
            })
            .buffer_unordered(CONCURRENT_READS);

        while let Some(joined) = pages.next().await {
            let (document, path) = joined.context("page reader task panicked")?;
            match document {
                Ok(Some(doc)) => {
                    batch.push(doc);
                    if batch.len() >= BULK_BATCH {
                        self.backend.bulk_index(&batch).await?;
                        indexed += batch.len();
                        batch.clear();
                    }
                }
                Ok(None) => {} // titleless page, nothing to index
                Err(e) => {
                    warn!(path = %path.display(), error = format!("{e:#}"), "skipping page");
                }
            }
        }

        if !batch.is_empty() {
            self.backend.bulk_index(&batch).await?;
            indexed += batch.len();
        }

        info!(indexed, version, "indexing finished");
        Ok(indexed)
    }

    /// Drop and rebuild the index mapping before a full reload.
    pub async fn recreate_index(&self) -> Result<()> {
        self.backend.remove_index().await?;
        self.backend.create_index().await
    }
}

/// All `.fjson` files under `dir`, recursively, in stable order.
pub fn collect_fjson_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries =
            fs::read_dir(&dir).with_context(|| format!("failed to read {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "fjson") {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Read one page file into an indexable document. `Ok(None)` when the page
/// has no title (Sphinx writes such stubs for search/genindex pages).
pub fn build_document(version: &str, path: &Path) -> Result<Option<SearchDocument>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_page(version, &raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse_page(version: &str, raw: &str) -> Result<Option<SearchDocument>> {
    let page: FjsonPage = serde_json::from_str(raw).context("not a valid fjson page")?;

    let Some(title) = page.title.filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let Some(name) = page.current_page_name.filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    let slug = format!("{name}.html");
    let parent_title = page
        .parents
        .first()
        .map(|p| p.title.clone())
        .unwrap_or_default();
    let html = page.body.unwrap_or_default();

    let mut doc = SearchDocument::new(version.to_string(), title, parent_title, slug, html);
    let (h1, h2, h3) = extract_headings(&doc.html);
    doc.h1 = h1;
    doc.h2 = h2;
    doc.h3 = h3;
    Ok(Some(doc))
}

/// Heading texts per level, with Sphinx's "¶" permalink marker stripped.
pub fn extract_headings(html: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
    let document = Html::parse_fragment(html);
    let h1 = Selector::parse("h1").unwrap();
    let h2 = Selector::parse("h2").unwrap();
    let h3 = Selector::parse("h3").unwrap();
    (
        heading_texts(&document, &h1),
        heading_texts(&document, &h2),
        heading_texts(&document, &h3),
    )
}

fn heading_texts(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .map(|el| {
            el.text()
                .collect::<String>()
                .replace('¶', "")
                .trim()
                .to_string()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_are_collected_per_level_without_permalink_marker() {
        let html = r#"
            <h1>Getting started¶</h1>
            <p>intro</p>
            <h2>Install¶</h2>
            <h2>Configure</h2>
            <h3>On <em>Linux</em>¶</h3>
        "#;
        let (h1, h2, h3) = extract_headings(html);
        assert_eq!(h1, vec!["Getting started"]);
        assert_eq!(h2, vec!["Install", "Configure"]);
        assert_eq!(h3, vec!["On Linux"]);
    }

    #[test]
    fn page_without_title_is_skipped() {
        let raw = r#"{"current_page_name": "genindex", "body": "<p>x</p>"}"#;
        assert_eq!(parse_page("2.7", raw).unwrap(), None);

        let raw = r#"{"title": "", "current_page_name": "genindex"}"#;
        assert_eq!(parse_page("2.7", raw).unwrap(), None);
    }

    #[test]
    fn page_fields_map_into_the_document() {
        let raw = r#"{
            "title": "Installing",
            "current_page_name": "install",
            "body": "<h1>Installing¶</h1><p>run pip</p>",
            "parents": [{"title": "Getting started"}, {"title": "Root"}]
        }"#;
        let doc = parse_page("2.7", raw).unwrap().unwrap();
        assert_eq!(doc.version, "2.7");
        assert_eq!(doc.slug, "install.html");
        assert_eq!(doc.title, "Installing");
        assert_eq!(doc.parent_title, "Getting started");
        assert_eq!(doc.h1, vec!["Installing"]);
        assert!(doc.html.contains("run pip"));
    }

    #[test]
    fn parentless_page_stores_empty_parent() {
        let raw = r#"{"title": "Docs", "current_page_name": "index", "body": ""}"#;
        let doc = parse_page("2.7", raw).unwrap().unwrap();
        assert_eq!(doc.parent_title, "");
    }

    #[test]
    fn garbage_page_is_an_error() {
        assert!(parse_page("2.7", "not json").is_err());
    }
}
