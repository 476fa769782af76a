use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

use crate::data_models::SearchResponse;
use crate::elastic::ElasticBackend;

use super::models::SearchParams;

pub async fn search_handler(
    State(backend): State<Arc<ElasticBackend>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = Instant::now();

    if params.query.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query cannot be empty".to_string()));
    }

    let response = backend
        .search(&params.query, &params.version)
        .await
        .map_err(|e| {
            error!(error = format!("{e:#}"), "search backend failure");
            (
                StatusCode::BAD_GATEWAY,
                "Search backend is unavailable".to_string(),
            )
        })?;

    debug!(
        query = %params.query,
        version = %params.version,
        hits = response.results.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "search served"
    );

    Ok(Json(response))
}
