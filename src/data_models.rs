use serde::{Deserialize, Serialize};

/// A search request the adapter is willing to send: a user-typed term plus the
/// fixed docs version tag the host page was built for.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub query: String,
    pub version: String,
}

impl Query {
    /// Fails closed: terms shorter than 2 characters (after trimming) never
    /// turn into a request.
    pub fn build(term: &str, version: &str) -> Option<Query> {
        let term = term.trim();
        if term.chars().count() < 2 {
            return None;
        }
        Some(Query {
            query: term.to_string(),
            version: version.to_string(),
        })
    }
}

/// One result as the search endpoint returns it. `parent_title` and
/// `relevant_text` are optional on the wire; `DisplayResult` resolves the
/// fallbacks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RawResult {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_text: Option<String>,
}

/// Response envelope from the search endpoint. A body without `results` is
/// malformed; `time` is informational and tolerated missing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResponse {
    #[serde(default)]
    pub time: f64,
    pub results: Vec<RawResult>,
}

/// A result ready for display, every field resolved.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DisplayResult {
    pub id: String,
    pub text: String,
    pub parent_title: String,
    pub relevant_text: String,
}

impl From<RawResult> for DisplayResult {
    /// Fallback order: parent_title, then title; relevant_text, then title.
    fn from(raw: RawResult) -> DisplayResult {
        let text = raw.title;
        DisplayResult {
            id: raw.slug,
            parent_title: raw
                .parent_title
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| text.clone()),
            relevant_text: raw
                .relevant_text
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| text.clone()),
            text,
        }
    }
}

/// One documentation page as stored in the search index, built from a Sphinx
/// `.fjson` page dump.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchDocument {
    pub version: String,
    pub title: String,
    pub parent_title: String,
    pub slug: String,
    pub html: String,
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
}

impl SearchDocument {
    pub fn new(
        version: String,
        title: String,
        parent_title: String,
        slug: String,
        html: String,
    ) -> SearchDocument {
        SearchDocument {
            version,
            title,
            parent_title,
            slug,
            html,
            h1: vec![], // populated later by heading extraction.
            h2: vec![],
            h3: vec![],
        }
    }
}
