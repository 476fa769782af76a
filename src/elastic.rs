use anyhow::{Context, Result};
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::CONFIG;
use crate::data_models::{RawResult, SearchDocument, SearchResponse};

/// How many hits a search answers with.
const SEARCH_WINDOW: usize = 5;

/// HTTP wrapper around the Elasticsearch cluster holding the docs index.
/// Both the proxy (queries) and the indexer (bulk loads) go through this.
#[derive(Debug, Clone)]
pub struct ElasticBackend {
    http: Client,
    base_url: String,
    index: String,
}

impl ElasticBackend {
    pub fn new(base_url: impl Into<String>, index: impl Into<String>) -> ElasticBackend {
        ElasticBackend {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            index: index.into(),
        }
    }

    /// Backend using environment configuration.
    pub fn from_config() -> ElasticBackend {
        ElasticBackend::new(&CONFIG.elastic_url, &CONFIG.elastic_index)
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Cluster info, used as a connectivity check.
    pub async fn ping(&self) -> Result<Value> {
        let res = self
            .http
            .get(&self.base_url)
            .send()
            .await
            .context("failed to reach elasticsearch")?;
        let info = res
            .error_for_status()
            .context("elasticsearch answered with an error")?
            .json::<Value>()
            .await
            .context("unexpected elasticsearch info response")?;
        Ok(info)
    }

    pub async fn create_index(&self) -> Result<()> {
        let mapping = index_mapping(&self.index);
        let res = self
            .http
            .put(format!("{}/{}", self.base_url, self.index))
            .json(&mapping)
            .send()
            .await
            .context("failed to reach elasticsearch")?;
        res.error_for_status()
            .with_context(|| format!("creating index {} failed", self.index))?;
        info!(index = %self.index, "created index");
        Ok(())
    }

    /// Removing an index that does not exist is not an error.
    pub async fn remove_index(&self) -> Result<()> {
        let res = self
            .http
            .delete(format!("{}/{}", self.base_url, self.index))
            .send()
            .await
            .context("failed to reach elasticsearch")?;
        if res.status() == StatusCode::NOT_FOUND {
            debug!(index = %self.index, "index already absent");
            return Ok(());
        }
        res.error_for_status()
            .with_context(|| format!("removing index {} failed", self.index))?;
        info!(index = %self.index, "removed index");
        Ok(())
    }

    /// Load a batch of documents through the bulk endpoint.
    pub async fn bulk_index(&self, docs: &[SearchDocument]) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }
        let body = build_bulk_body(&self.index, docs)?;
        let res = self
            .http
            .post(format!("{}/_bulk", self.base_url))
            .header(header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .context("failed to reach elasticsearch")?;
        res.error_for_status().context("bulk indexing failed")?;
        info!(count = docs.len(), index = %self.index, "bulk indexed documents");
        Ok(())
    }

    /// Run a docs search and reshape the hits into the adapter's wire schema.
    pub async fn search(&self, keywords: &str, version: &str) -> Result<SearchResponse> {
        let body = build_search_body(keywords, version);
        debug!(index = %self.index, keywords, version, "querying elasticsearch");

        let res = self
            .http
            .get(format!("{}/{}/_search", self.base_url, self.index))
            .json(&body)
            .send()
            .await
            .context("failed to reach elasticsearch")?;
        let es = res
            .error_for_status()
            .context("elasticsearch answered with an error")?
            .json::<EsSearchResponse>()
            .await
            .context("unexpected elasticsearch search response")?;
        Ok(reshape(es))
    }
}

/// The bool query behind the search box: hard filter on the docs version,
/// title matches worth three times a body match, first `SEARCH_WINDOW` hits.
/// A highlight on the body supplies the snippet under each title.
pub fn build_search_body(keywords: &str, version: &str) -> Value {
    json!({
        "from": 0, "size": SEARCH_WINDOW,
        "query": {
            "bool": {
                "filter": [
                    {"match": {"version": version}}
                ],
                "should": [
                    {"match": {
                        "html": {
                            "query": keywords,
                            "boost": 1
                        }
                    }},
                    {"match": {
                        "title": {
                            "query": keywords,
                            "boost": 3
                        }
                    }}
                ]
            }
        },
        "highlight": {
            "fields": {
                "html": {}
            }
        }
    })
}

/// Index settings: the body field is analyzed with tags stripped, everything
/// else is plain text.
fn index_mapping(doc_type: &str) -> Value {
    let mut mappings = serde_json::Map::new();
    mappings.insert(
        doc_type.to_string(),
        json!({
            "properties": {
                "html": {"type": "text", "analyzer": "htmlStripAnalyzer"},
                "title": {"type": "text"},
                "parent_title": {"type": "text"},
                "version": {"type": "text"},
                "url": {"type": "text"},
                "h1": {"type": "text"},
                "h2": {"type": "text"},
                "h3": {"type": "text"}
            }
        }),
    );
    json!({
        "settings": {
            "analysis": {
                "analyzer": {
                    "htmlStripAnalyzer": {
                        "type": "custom",
                        "tokenizer": "standard",
                        "filter": ["standard", "lowercase"],
                        "char_filter": ["html_strip"]
                    }
                }
            }
        },
        "mappings": mappings
    })
}

/// Action line + document line per entry, newline terminated.
pub fn build_bulk_body(index: &str, docs: &[SearchDocument]) -> Result<String> {
    let mut body = String::new();
    for doc in docs {
        let action = json!({"index": {"_index": index, "_type": index}});
        body.push_str(&action.to_string());
        body.push('\n');
        body.push_str(&serde_json::to_string(doc).context("failed to serialize document")?);
        body.push('\n');
    }
    Ok(body)
}

#[derive(Debug, Deserialize)]
struct EsSearchResponse {
    #[serde(default)]
    took: f64,
    hits: EsHits,
}

#[derive(Debug, Deserialize)]
struct EsHits {
    hits: Vec<EsHit>,
}

#[derive(Debug, Deserialize)]
struct EsHit {
    #[serde(rename = "_source")]
    source: EsSource,
    #[serde(default)]
    highlight: Option<EsHighlight>,
}

#[derive(Debug, Deserialize)]
struct EsSource {
    slug: String,
    title: String,
    #[serde(default)]
    parent_title: String,
}

#[derive(Debug, Deserialize)]
struct EsHighlight {
    #[serde(default)]
    html: Vec<String>,
}

/// Hits → wire schema. The index stores an empty string for parentless pages;
/// that becomes an absent field so the adapter's title fallback applies. The
/// first body highlight, when present, becomes the snippet.
fn reshape(es: EsSearchResponse) -> SearchResponse {
    let results = es
        .hits
        .hits
        .into_iter()
        .map(|hit| RawResult {
            slug: hit.source.slug,
            title: hit.source.title,
            parent_title: Some(hit.source.parent_title).filter(|p| !p.is_empty()),
            relevant_text: hit
                .highlight
                .and_then(|h| h.html.into_iter().next())
                .filter(|f| !f.is_empty()),
        })
        .collect();
    SearchResponse {
        time: es.took,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_body_filters_version_and_boosts_title() {
        let body = build_search_body("install", "2.7");
        assert_eq!(body["from"], 0);
        assert_eq!(body["size"], 5);
        assert_eq!(body["query"]["bool"]["filter"][0]["match"]["version"], "2.7");
        let should = &body["query"]["bool"]["should"];
        assert_eq!(should[0]["match"]["html"]["query"], "install");
        assert_eq!(should[0]["match"]["html"]["boost"], 1);
        assert_eq!(should[1]["match"]["title"]["query"], "install");
        assert_eq!(should[1]["match"]["title"]["boost"], 3);
        assert!(body["highlight"]["fields"]["html"].is_object());
    }

    #[test]
    fn reshape_maps_hits_in_order() {
        let es: EsSearchResponse = serde_json::from_value(json!({
            "took": 7,
            "hits": {
                "hits": [
                    {
                        "_source": {"slug": "install.html", "title": "Installing",
                                    "parent_title": "Getting started"},
                        "highlight": {"html": ["run <em>pip install</em>", "second"]}
                    },
                    {
                        "_source": {"slug": "index.html", "title": "Overview",
                                    "parent_title": ""}
                    }
                ]
            }
        }))
        .unwrap();

        let response = reshape(es);
        assert_eq!(response.time, 7.0);
        assert_eq!(response.results.len(), 2);

        let first = &response.results[0];
        assert_eq!(first.slug, "install.html");
        assert_eq!(first.parent_title.as_deref(), Some("Getting started"));
        assert_eq!(first.relevant_text.as_deref(), Some("run <em>pip install</em>"));

        // Empty parent and missing highlight become absent fields.
        let second = &response.results[1];
        assert_eq!(second.parent_title, None);
        assert_eq!(second.relevant_text, None);
    }

    #[test]
    fn bulk_body_is_newline_delimited_pairs() {
        let docs = vec![
            SearchDocument::new("2.7".into(), "A".into(), "".into(), "a.html".into(), "<p>a</p>".into()),
            SearchDocument::new("2.7".into(), "B".into(), "A".into(), "b.html".into(), "<p>b</p>".into()),
        ];
        let body = build_bulk_body("docs", &docs).unwrap();
        assert!(body.ends_with('\n'));

        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        let action: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(action["index"]["_index"], "docs");
        let doc: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(doc["slug"], "a.html");
        assert_eq!(doc["version"], "2.7");
    }

    #[test]
    fn empty_bulk_body_is_empty() {
        let body = build_bulk_body("docs", &[]).unwrap();
        assert!(body.is_empty());
    }
}
