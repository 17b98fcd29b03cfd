use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::types::{NodeEntry, NodeEnvelope, SearchBody, SearchCriterion, SearchPage};
use crate::config::WloConfig;
use crate::detection::types::ContentMetadata;
use crate::normalize::url::normalize_url;

/// Free-text search property.
pub const SEARCH_PROPERTY_TEXT: &str = "ngsearchword";
/// Exact-URL search property.
pub const SEARCH_PROPERTY_URL: &str = "ccm:wwwurl";

const REPOSITORY: &str = "-home-";
const PAGE_SIZE: usize = 100;
const BACKOFF_START_MS: u64 = 250;
const BACKOFF_CAP_MS: u64 = 2000;
const REDIRECT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "Mozilla/5.0 (compatible; wlo-dedup/1.0)";

/// The two repository operations the service depends on, plus the
/// best-effort redirect check.
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    /// Full metadata for a node, or `None` when the node does not exist.
    async fn fetch_metadata(&self, node_id: &str) -> Result<Option<ContentMetadata>>;

    /// Property-scoped search, paginating transparently when `max_results`
    /// exceeds one page.
    async fn search(
        &self,
        property: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<NodeEntry>>;

    /// Final URL after following redirects, when it normalizes differently
    /// from the input. `None` on any failure; must never fail the pipeline.
    async fn check_redirect(&self, url: &str) -> Option<String>;
}

pub struct WloClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    max_retries: usize,
}

impl WloClient {
    pub fn new(config: &WloConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            max_retries: config.max_retries,
        }
    }

    /// Sends a request, retrying on network errors and 5xx responses with
    /// exponential backoff (250 ms doubling up to 2 s, plus jitter).
    /// 4xx responses are returned to the caller unretried.
    async fn send_with_retry<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut delay_ms = BACKOFF_START_MS;
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let jitter = rand::random::<u64>() % 50;
                tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                delay_ms = (delay_ms * 2).min(BACKOFF_CAP_MS);
            }

            match build().timeout(self.timeout).send().await {
                Ok(response) if response.status().is_server_error() => {
                    last_error = Some(anyhow::anyhow!(
                        "upstream returned {}",
                        response.status()
                    ));
                }
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_error = Some(anyhow::anyhow!(e));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("retry attempts exhausted")))
    }
}

#[async_trait]
impl UpstreamApi for WloClient {
    async fn fetch_metadata(&self, node_id: &str) -> Result<Option<ContentMetadata>> {
        let url = format!(
            "{}/node/v1/nodes/{}/{}/metadata",
            self.base_url, REPOSITORY, node_id
        );

        let response = self
            .send_with_retry(|| self.http.get(&url).query(&[("propertyFilter", "-all-")]))
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "metadata fetch for {} failed: {}",
                node_id,
                response.status()
            ));
        }

        let envelope: NodeEnvelope = response.json().await?;
        Ok(Some(extract_metadata(&envelope.node)))
    }

    async fn search(
        &self,
        property: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<NodeEntry>> {
        let endpoint = format!(
            "{}/search/v1/queries/{}/mds_oeh/ngsearch",
            self.base_url, REPOSITORY
        );
        let body = SearchBody {
            criteria: vec![SearchCriterion {
                property: property.to_string(),
                values: vec![query.to_string()],
            }],
        };

        let mut all_nodes: Vec<NodeEntry> = Vec::new();
        let mut skip_count = 0usize;

        while all_nodes.len() < max_results {
            let page_size = PAGE_SIZE.min(max_results - all_nodes.len());
            let response = self
                .send_with_retry(|| {
                    self.http
                        .post(&endpoint)
                        .query(&[
                            ("contentType", "FILES".to_string()),
                            ("maxItems", page_size.to_string()),
                            ("skipCount", skip_count.to_string()),
                            ("propertyFilter", "-all-".to_string()),
                        ])
                        .json(&body)
                })
                .await?;

            if !response.status().is_success() {
                return Err(anyhow::anyhow!(
                    "search for {}={} failed: {}",
                    property,
                    query,
                    response.status()
                ));
            }

            let page: SearchPage = response.json().await?;
            if page.nodes.is_empty() {
                break;
            }

            let fetched = page.nodes.len();
            all_nodes.extend(page.nodes);

            // A short page means the upstream ran out of results.
            if fetched < page_size {
                break;
            }
            skip_count += fetched;

            if max_results > PAGE_SIZE {
                tracing::debug!(
                    "Pagination: fetched {}/{} for {}",
                    all_nodes.len(),
                    max_results,
                    property
                );
            }
        }

        tracing::debug!(
            "Search {}='{}' returned {} nodes",
            property,
            query,
            all_nodes.len()
        );
        Ok(all_nodes)
    }

    async fn check_redirect(&self, url: &str) -> Option<String> {
        let url = url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return None;
        }

        let response = match self
            .http
            .head(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(REDIRECT_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Redirect check failed for {}: {}", url, e);
                return None;
            }
        };

        let final_url = response.url().to_string();
        if normalize_url(&final_url) != normalize_url(url) {
            tracing::info!("URL redirect detected: {} -> {}", url, final_url);
            Some(final_url)
        } else {
            None
        }
    }
}

/// Pulls the four metadata fields out of a node's untyped property map.
/// Values may be scalars or arrays; for scalar fields the first array
/// element wins.
pub fn extract_metadata(entry: &NodeEntry) -> ContentMetadata {
    let props = &entry.properties;
    ContentMetadata {
        title: first_string(props, &["cclom:title", "cm:name", "cm:title"]),
        description: first_string(props, &["cclom:general_description", "cm:description"]),
        keywords: string_list(props, "cclom:general_keyword"),
        url: first_string(props, &["ccm:wwwurl", "cclom:location"]),
        redirect_url: None,
    }
}

fn first_string(props: &HashMap<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| props.get(*key).and_then(scalar_or_first))
        .filter(|value| !value.trim().is_empty())
}

fn scalar_or_first(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items
            .first()
            .and_then(|item| item.as_str().map(str::to_string)),
        _ => None,
    }
}

fn string_list(props: &HashMap<String, Value>, key: &str) -> Option<Vec<String>> {
    match props.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(vec![s.clone()]),
        Value::Array(items) => {
            let list: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .filter(|item| !item.trim().is_empty())
                .collect();
            (!list.is_empty()).then_some(list)
        }
        _ => None,
    }
}
