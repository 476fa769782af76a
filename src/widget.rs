use std::time::Duration;

use reqwest::{Method, Url};
use tracing::warn;

use crate::client::{SearchClient, SearchError, normalize};
use crate::data_models::{DisplayResult, Query};

/// Quiet period between the last keystroke and the request going out.
pub const SEARCH_DELAY: Duration = Duration::from_millis(350);

/// Shortest term worth searching for.
pub const MINIMUM_INPUT_LENGTH: usize = 2;

/// How the widget should issue search requests.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub delay: Duration,
    pub method: Method,
    pub url: Url,
}

/// Everything the dropdown widget needs from us: display settings plus the
/// fetch descriptor.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub placeholder: String,
    pub allow_clear: bool,
    pub minimum_input_length: usize,
    pub fetch: FetchConfig,
}

/// What a finished search hands the widget: results to show (possibly none)
/// and an optional message for the empty state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub results: Vec<DisplayResult>,
    pub message: Option<String>,
}

impl SearchOutcome {
    pub fn empty() -> SearchOutcome {
        SearchOutcome::default()
    }
}

/// Glue between the dropdown widget and the search endpoint. Holds no state
/// beyond the endpoint and the version tag; every search is independent.
pub struct SearchAdapter {
    client: SearchClient,
    version: String,
}

impl SearchAdapter {
    /// Explicit per-page initialization: the docs version the host page was
    /// built for and the search service URL. No process-wide setup.
    pub fn new(version: impl Into<String>, endpoint: Url) -> SearchAdapter {
        SearchAdapter {
            client: SearchClient::new(endpoint),
            version: version.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The configuration handed to the dropdown widget.
    pub fn widget_config(&self) -> WidgetConfig {
        WidgetConfig {
            placeholder: "Search the docs".to_string(),
            allow_clear: true,
            minimum_input_length: MINIMUM_INPUT_LENGTH,
            fetch: FetchConfig {
                delay: SEARCH_DELAY,
                method: Method::GET,
                url: self.client.endpoint().clone(),
            },
        }
    }

    /// Request parameters for a keystroke, or `None` when the term is too
    /// short to search for.
    pub fn build_query(&self, term: &str) -> Option<Query> {
        Query::build(term, &self.version)
    }

    async fn run(&self, term: &str) -> Result<Vec<DisplayResult>, SearchError> {
        let query = self.build_query(term).ok_or(SearchError::EmptyQuery)?;
        let response = self.client.fetch(&query).await?;
        Ok(normalize(response))
    }

    /// Run one search to completion. This is the error boundary: every failure
    /// collapses into an empty result list plus an optional user-visible
    /// message, nothing propagates to the host page.
    pub async fn search(&self, term: &str) -> SearchOutcome {
        match self.run(term).await {
            Ok(results) => SearchOutcome {
                results,
                message: None,
            },
            // Too-short terms are not an error, the dropdown just stays put.
            Err(SearchError::EmptyQuery) => SearchOutcome::empty(),
            Err(err) => {
                warn!(term, error = %err, "search failed");
                SearchOutcome {
                    results: vec![],
                    message: err.user_message().map(str::to_string),
                }
            }
        }
    }
}
