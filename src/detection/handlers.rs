use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use super::pipeline::{self, DetectionParams};
use super::types::{
    DetectByMetadataRequest, DetectByNodeRequest, DetectionResponse, ErrorResponse, HashRequest,
    HashResponse, HealthResponse, SearchField,
};
use crate::cache::store::{cache_key, ResponseCache};
use crate::client::UpstreamApi;
use crate::config::ServiceConfig;
use crate::error::DetectError;
use crate::minhash::{MinHasher, NUM_HASHES};
use crate::ratelimit::RateLimiter;

/// Overall deadline for one detection request. Upstream calls still in
/// flight when it expires are cancelled.
const REQUEST_DEADLINE: Duration = Duration::from_secs(55);

pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Debug surface: MinHash signature for an arbitrary text. Not rate-limited.
pub async fn handle_hash(
    Extension(hasher): Extension<Arc<MinHasher>>,
    Json(body): Json<HashRequest>,
) -> (StatusCode, Json<HashResponse>) {
    let signature = hasher.text_signature(&body.text);
    (
        StatusCode::OK,
        Json(HashResponse {
            success: true,
            signature: signature.0,
            num_hashes: NUM_HASHES,
        }),
    )
}

/// Duplicate detection for an existing repository node. Never cached: the
/// node's upstream state can change between requests.
pub async fn handle_detect_by_node(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Extension(config): Extension<Arc<ServiceConfig>>,
    Extension(limiter): Extension<Arc<RateLimiter>>,
    Extension(upstream): Extension<Arc<dyn UpstreamApi>>,
    Extension(hasher): Extension<Arc<MinHasher>>,
    Json(body): Json<DetectByNodeRequest>,
) -> Response {
    let params = match validate_params(
        &config,
        body.similarity_threshold,
        &body.search_fields,
        body.max_candidates,
    ) {
        Ok(params) => params,
        Err(e) => return error_response(e),
    };
    let node_id = body.node_id.trim();
    if node_id.is_empty() {
        return error_response(DetectError::InvalidRequest(
            "node_id must not be empty".to_string(),
        ));
    }

    if !limiter.check(addr.ip()) {
        return error_response(DetectError::RateLimited);
    }

    tracing::info!("Hash detection for node {}", node_id);
    let outcome = tokio::time::timeout(
        REQUEST_DEADLINE,
        pipeline::detect_by_node(&upstream, &hasher, &params, node_id),
    )
    .await;
    respond(outcome)
}

/// Duplicate detection for a caller-supplied record. Successful responses
/// are cached keyed on the normalized request.
pub async fn handle_detect_by_metadata(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Extension(config): Extension<Arc<ServiceConfig>>,
    Extension(limiter): Extension<Arc<RateLimiter>>,
    Extension(cache): Extension<Arc<ResponseCache>>,
    Extension(upstream): Extension<Arc<dyn UpstreamApi>>,
    Extension(hasher): Extension<Arc<MinHasher>>,
    Json(body): Json<DetectByMetadataRequest>,
) -> Response {
    let params = match validate_params(
        &config,
        body.similarity_threshold,
        &body.search_fields,
        body.max_candidates,
    ) {
        Ok(params) => params,
        Err(e) => return error_response(e),
    };
    if !body.metadata.is_searchable() {
        return error_response(DetectError::InvalidRequest(
            "no searchable content provided (need at least title, description, keywords, or URL)"
                .to_string(),
        ));
    }

    if !limiter.check(addr.ip()) {
        return error_response(DetectError::RateLimited);
    }

    let key = cache_key(
        &body.metadata,
        params.threshold,
        &params.search_fields,
        params.max_candidates,
    );
    if let Some(cached) = cache.get(&key) {
        tracing::info!("Cache hit for metadata detection");
        return (StatusCode::OK, Json(cached)).into_response();
    }

    tracing::info!("Hash detection by metadata");
    let outcome = tokio::time::timeout(
        REQUEST_DEADLINE,
        pipeline::detect_by_metadata(&upstream, &hasher, &params, body.metadata),
    )
    .await;

    match outcome {
        Ok(Ok(response)) => {
            cache.insert(key, response.clone());
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(Err(e)) => error_response(e),
        Err(_) => error_response(deadline_error()),
    }
}

pub(crate) fn validate_params(
    config: &ServiceConfig,
    threshold: f64,
    search_fields: &[SearchField],
    max_candidates: Option<usize>,
) -> Result<DetectionParams, DetectError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(DetectError::InvalidRequest(format!(
            "similarity_threshold must be within [0.0, 1.0], got {}",
            threshold
        )));
    }
    if search_fields.is_empty() {
        return Err(DetectError::InvalidRequest(
            "search_fields must not be empty".to_string(),
        ));
    }

    // Client wishes above the configured ceiling are capped, not rejected.
    let ceiling = config.detection.max_candidates;
    let max_candidates = match max_candidates {
        Some(0) => {
            return Err(DetectError::InvalidRequest(
                "max_candidates must be at least 1".to_string(),
            ))
        }
        Some(requested) => requested.min(ceiling),
        None => ceiling,
    };

    Ok(DetectionParams {
        threshold,
        search_fields: search_fields.to_vec(),
        max_candidates,
    })
}

fn respond(
    outcome: Result<Result<DetectionResponse, DetectError>, tokio::time::error::Elapsed>,
) -> Response {
    match outcome {
        Ok(Ok(response)) => (StatusCode::OK, Json(response)).into_response(),
        Ok(Err(e)) => error_response(e),
        Err(_) => error_response(deadline_error()),
    }
}

fn deadline_error() -> DetectError {
    DetectError::UpstreamFatal(format!(
        "request deadline of {}s exceeded",
        REQUEST_DEADLINE.as_secs()
    ))
}

fn error_response(error: DetectError) -> Response {
    let status = error.status();
    if status.is_server_error() {
        tracing::error!("Request failed: {}", error);
    } else {
        tracing::warn!("Request rejected: {}", error);
    }
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: error.to_string(),
        }),
    )
        .into_response()
}
