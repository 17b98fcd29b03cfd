use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};

use wlo_dedup::cache::handlers::handle_cache_clear;
use wlo_dedup::cache::ResponseCache;
use wlo_dedup::client::{UpstreamApi, WloClient};
use wlo_dedup::config::ServiceConfig;
use wlo_dedup::detection::handlers::{
    handle_detect_by_metadata, handle_detect_by_node, handle_hash, handle_health,
};
use wlo_dedup::minhash::MinHasher;
use wlo_dedup::ratelimit::RateLimiter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(ServiceConfig::from_env());

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    tracing::info!("WLO duplicate detection service starting");
    tracing::info!("Upstream repository: {}", config.wlo.base_url);
    tracing::info!(
        "Cache: ttl={}s max_size={}",
        config.cache.ttl.as_secs(),
        config.cache.max_size
    );
    tracing::info!(
        "Rate limit: {} requests per {}s",
        config.rate_limit.max_requests,
        config.rate_limit.window.as_secs()
    );
    if config.admin_api_key.is_none() {
        tracing::warn!("ADMIN_API_KEY not set, the cache-clear route is disabled");
    }

    let upstream: Arc<dyn UpstreamApi> = Arc::new(WloClient::new(&config.wlo));
    let hasher = Arc::new(MinHasher::new());
    let cache = Arc::new(ResponseCache::new(&config.cache));
    let limiter = Arc::new(RateLimiter::new(&config.rate_limit));

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/hash", post(handle_hash))
        .route("/detect/hash/by-node", post(handle_detect_by_node))
        .route("/detect/hash/by-metadata", post(handle_detect_by_metadata))
        .route("/admin/cache/clear", post(handle_cache_clear))
        .layer(Extension(config.clone()))
        .layer(Extension(upstream))
        .layer(Extension(hasher))
        .layer(Extension(cache))
        .layer(Extension(limiter));

    tracing::info!("HTTP server listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
