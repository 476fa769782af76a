use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::elastic::ElasticBackend;

pub mod handlers;
pub mod models;

pub fn create_router(backend: Arc<ElasticBackend>) -> Router {
    // CORS configuration: the search box calls from the docs pages' origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // API routes
        .route("/search", get(handlers::search_handler))
        .with_state(backend)
        // Static file serving for the docs site
        .nest_service("/", ServeDir::new("static"))
        .layer(cors)
}

/// Bind and run the search proxy until shutdown.
pub async fn serve(backend: ElasticBackend, bind_addr: &str) -> anyhow::Result<()> {
    let router = create_router(Arc::new(backend));
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "search proxy listening");
    axum::serve(listener, router).await?;
    Ok(())
}
