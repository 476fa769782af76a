use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        search_endpoint: get_env_or_default("SEARCH_ENDPOINT", "http://127.0.0.1:8000/search"),
        elastic_url: get_env_or_default("ELASTIC_URL", "http://localhost:9200"),
        elastic_index: get_env_or_default("ELASTIC_INDEX", "docs"),
        bind_addr: get_env_or_default("BIND_ADDR", "127.0.0.1:8000"),
    }
});

pub struct Config {
    /// Endpoint the client adapter queries (the proxy's /search route).
    pub search_endpoint: String,
    /// Elasticsearch cluster the proxy and indexer talk to.
    pub elastic_url: String,
    pub elastic_index: String,
    /// Address the proxy binds to.
    pub bind_addr: String,
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
