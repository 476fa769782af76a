use serde::Deserialize;

/// Query-string parameters of `GET /search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub version: String,
}
