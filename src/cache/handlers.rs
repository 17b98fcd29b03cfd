use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use serde::Serialize;

use super::store::ResponseCache;
use crate::config::ServiceConfig;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

#[derive(Debug, Serialize)]
pub struct CacheClearResponse {
    pub success: bool,
    pub entries_removed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Admin purge. Requires the shared secret in the `X-Admin-Key` header;
/// a deployment without `ADMIN_API_KEY` cannot use this route at all.
pub async fn handle_cache_clear(
    Extension(config): Extension<Arc<ServiceConfig>>,
    Extension(cache): Extension<Arc<ResponseCache>>,
    headers: HeaderMap,
) -> (StatusCode, Json<CacheClearResponse>) {
    let Some(expected) = config.admin_api_key.as_deref() else {
        tracing::error!("Cache clear requested but ADMIN_API_KEY is not configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(CacheClearResponse {
                success: false,
                entries_removed: 0,
                error: Some("admin API key is not configured".to_string()),
            }),
        );
    };

    let provided = headers.get(ADMIN_KEY_HEADER).and_then(|v| v.to_str().ok());
    if provided != Some(expected) {
        tracing::warn!("Cache clear rejected: invalid admin key");
        return (
            StatusCode::FORBIDDEN,
            Json(CacheClearResponse {
                success: false,
                entries_removed: 0,
                error: Some("invalid admin key".to_string()),
            }),
        );
    }

    let removed = cache.clear();
    tracing::info!("Cache cleared: {} entries removed", removed);
    (
        StatusCode::OK,
        Json(CacheClearResponse {
            success: true,
            entries_removed: removed,
            error: None,
        }),
    )
}
