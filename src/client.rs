use std::time::Duration;

use reqwest::{Client, Url};
use thiserror::Error;
use tracing::debug;

use crate::data_models::{DisplayResult, Query, SearchResponse};

/// Bounds how long the dropdown can sit in its loading state.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SearchError {
    /// Term too short to search for. Suppressed at the adapter boundary,
    /// never shown to the user.
    #[error("query term too short, no request sent")]
    EmptyQuery,

    /// The endpoint could not be reached, timed out, or answered outside 2xx.
    #[error("search endpoint unavailable: {reason}")]
    SearchUnavailable { reason: String, timed_out: bool },

    /// The endpoint answered 2xx but the body is not the expected envelope.
    #[error("malformed search response: {0}")]
    MalformedResponse(String),
}

impl SearchError {
    /// What the dropdown shows instead of results, if anything.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            SearchError::EmptyQuery => None,
            SearchError::SearchUnavailable { timed_out: true, .. } => {
                Some("Search timed out, please try again.")
            }
            SearchError::SearchUnavailable { .. } | SearchError::MalformedResponse(_) => {
                Some("Search is currently unavailable.")
            }
        }
    }
}

/// Thin client for the docs search endpoint.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: Client,
    endpoint: Url,
}

impl SearchClient {
    pub fn new(endpoint: Url) -> SearchClient {
        SearchClient {
            http: Client::new(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// GET the endpoint with `query` and `version` request parameters.
    pub async fn fetch(&self, query: &Query) -> Result<SearchResponse, SearchError> {
        debug!(endpoint = %self.endpoint, term = %query.query, "sending search request");

        let res = self
            .http
            .get(self.endpoint.clone())
            .query(query)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| SearchError::SearchUnavailable {
                timed_out: e.is_timeout(),
                reason: e.to_string(),
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(SearchError::SearchUnavailable {
                reason: format!("endpoint answered {status}"),
                timed_out: false,
            });
        }

        let body = res
            .text()
            .await
            .map_err(|e| SearchError::SearchUnavailable {
                timed_out: e.is_timeout(),
                reason: e.to_string(),
            })?;

        // Parse from text so a bad body ends up in the error message instead
        // of an opaque decode failure.
        serde_json::from_str::<SearchResponse>(&body)
            .map_err(|e| SearchError::MalformedResponse(e.to_string()))
    }
}

/// Reshape a server response into display records. Order and count are the
/// server's; results arrive relevance-ranked and are not re-sorted.
pub fn normalize(response: SearchResponse) -> Vec<DisplayResult> {
    response.results.into_iter().map(DisplayResult::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_models::RawResult;

    fn raw(slug: &str, title: &str) -> RawResult {
        RawResult {
            slug: slug.into(),
            title: title.into(),
            parent_title: None,
            relevant_text: None,
        }
    }

    #[test]
    fn normalize_preserves_order_and_count() {
        let response = SearchResponse {
            time: 12.0,
            results: vec![raw("a", "A"), raw("b", "B"), raw("c", "C")],
        };
        let display = normalize(response);
        assert_eq!(display.len(), 3);
        let ids: Vec<&str> = display.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn normalize_is_idempotent_on_resolved_records() {
        // A record whose optional fields are already filled maps onto itself.
        let resolved = RawResult {
            slug: "s".into(),
            title: "T".into(),
            parent_title: Some("P".into()),
            relevant_text: Some("R".into()),
        };
        let once = normalize(SearchResponse {
            time: 0.0,
            results: vec![resolved],
        });
        let again = normalize(SearchResponse {
            time: 0.0,
            results: vec![RawResult {
                slug: once[0].id.clone(),
                title: once[0].text.clone(),
                parent_title: Some(once[0].parent_title.clone()),
                relevant_text: Some(once[0].relevant_text.clone()),
            }],
        });
        assert_eq!(once, again);
    }

    #[test]
    fn timeout_errors_carry_their_own_message() {
        let err = SearchError::SearchUnavailable {
            reason: "deadline elapsed".into(),
            timed_out: true,
        };
        assert_eq!(err.user_message(), Some("Search timed out, please try again."));

        let err = SearchError::MalformedResponse("missing field `results`".into());
        assert_eq!(err.user_message(), Some("Search is currently unavailable."));

        assert_eq!(SearchError::EmptyQuery.user_message(), None);
    }
}
