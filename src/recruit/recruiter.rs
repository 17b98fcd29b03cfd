use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use super::types::{Candidate, FieldSearchInfo, QueryJob, QueryKind, RecruitResult};
use crate::client::rest::{extract_metadata, SEARCH_PROPERTY_TEXT, SEARCH_PROPERTY_URL};
use crate::client::types::NodeEntry;
use crate::client::UpstreamApi;
use crate::detection::types::{ContentMetadata, SearchField};
use crate::error::DetectError;
use crate::normalize::title::normalize_title;
use crate::normalize::url::normalize_url;
use crate::normalize::variants::title_variants;

/// Upper bound on concurrent in-flight upstream queries per request.
pub const WORKER_COUNT: usize = 10;

/// Description queries only use the leading part of the text.
const DESCRIPTION_QUERY_CHARS: usize = 100;

/// Builds the full list of upstream queries for the given fields. Fields
/// whose metadata value is empty contribute nothing.
pub fn build_query_plan(metadata: &ContentMetadata, fields: &[SearchField]) -> Vec<QueryJob> {
    let mut jobs: Vec<QueryJob> = Vec::new();

    for field in fields {
        match field {
            SearchField::Title => {
                let Some(title) = trimmed(&metadata.title) else {
                    continue;
                };
                let mut seen = HashSet::new();
                push_query(
                    &mut jobs,
                    &mut seen,
                    SearchField::Title,
                    QueryKind::Original,
                    SEARCH_PROPERTY_TEXT,
                    title.to_string(),
                );

                let normalized = normalize_title(title);
                let variant_base = if normalized.is_empty() {
                    title.to_string()
                } else {
                    push_query(
                        &mut jobs,
                        &mut seen,
                        SearchField::Title,
                        QueryKind::Normalized,
                        SEARCH_PROPERTY_TEXT,
                        normalized.clone(),
                    );
                    normalized
                };

                for variant in title_variants(&variant_base) {
                    push_query(
                        &mut jobs,
                        &mut seen,
                        SearchField::Title,
                        QueryKind::Normalized,
                        SEARCH_PROPERTY_TEXT,
                        variant,
                    );
                }
            }
            SearchField::Description => {
                let Some(description) = trimmed(&metadata.description) else {
                    continue;
                };
                jobs.push(QueryJob {
                    field: SearchField::Description,
                    kind: QueryKind::Original,
                    property: SEARCH_PROPERTY_TEXT,
                    value: description.chars().take(DESCRIPTION_QUERY_CHARS).collect(),
                });
            }
            SearchField::Keywords => {
                let Some(keywords) = metadata.keywords.as_deref() else {
                    continue;
                };
                let joined = keywords
                    .iter()
                    .map(|k| k.trim())
                    .filter(|k| !k.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                if joined.is_empty() {
                    continue;
                }
                jobs.push(QueryJob {
                    field: SearchField::Keywords,
                    kind: QueryKind::Original,
                    property: SEARCH_PROPERTY_TEXT,
                    value: joined,
                });
            }
            SearchField::Url => {
                let Some(url) = trimmed(&metadata.url) else {
                    continue;
                };
                let mut seen = HashSet::new();
                push_query(
                    &mut jobs,
                    &mut seen,
                    SearchField::Url,
                    QueryKind::Original,
                    SEARCH_PROPERTY_URL,
                    url.to_string(),
                );
                if let Some(normalized) = normalize_url(url) {
                    push_query(
                        &mut jobs,
                        &mut seen,
                        SearchField::Url,
                        QueryKind::Normalized,
                        SEARCH_PROPERTY_TEXT,
                        normalized,
                    );
                }
                if let Some(redirect) = trimmed(&metadata.redirect_url) {
                    push_query(
                        &mut jobs,
                        &mut seen,
                        SearchField::Url,
                        QueryKind::Normalized,
                        SEARCH_PROPERTY_URL,
                        redirect.to_string(),
                    );
                }
            }
        }
    }

    jobs
}

/// Runs the query plan and merges the results into a deduplicated candidate
/// set. `exclude_node_id` drops the source node itself from every result.
///
/// Fails only when every query failed; partial upstream trouble degrades to
/// fewer candidates.
pub async fn recruit(
    upstream: Arc<dyn UpstreamApi>,
    metadata: &ContentMetadata,
    fields: &[SearchField],
    max_candidates: usize,
    exclude_node_id: Option<&str>,
) -> Result<RecruitResult, DetectError> {
    let jobs = build_query_plan(metadata, fields);
    if jobs.is_empty() {
        return Ok(RecruitResult::default());
    }

    let results = run_queries(upstream, &jobs, max_candidates).await;

    if results.iter().all(|outcome| outcome.is_none()) {
        return Err(DetectError::UpstreamFatal(format!(
            "all {} candidate searches failed",
            jobs.len()
        )));
    }

    Ok(merge_results(&jobs, results, fields, exclude_node_id))
}

/// Executes all jobs on a bounded worker pool. Workers pull from a shared
/// queue and report `(job index, outcome)` through a channel; a failed query
/// reports `None`. Dropping the returned future aborts the pool via the
/// `JoinSet`, which is how request-deadline cancellation propagates.
async fn run_queries(
    upstream: Arc<dyn UpstreamApi>,
    jobs: &[QueryJob],
    max_candidates: usize,
) -> Vec<Option<Vec<NodeEntry>>> {
    let queue: Arc<Mutex<VecDeque<(usize, QueryJob)>>> =
        Arc::new(Mutex::new(jobs.iter().cloned().enumerate().collect()));
    let (result_tx, mut result_rx) = mpsc::channel(jobs.len());

    let mut workers = JoinSet::new();
    for worker_id in 0..WORKER_COUNT.min(jobs.len()) {
        let queue = queue.clone();
        let upstream = upstream.clone();
        let result_tx = result_tx.clone();

        workers.spawn(async move {
            loop {
                let next = queue.lock().await.pop_front();
                let Some((index, job)) = next else {
                    break;
                };

                let outcome = match upstream.search(job.property, &job.value, max_candidates).await
                {
                    Ok(nodes) => Some(nodes),
                    Err(e) => {
                        tracing::warn!(
                            "Search query failed ({}='{}'): {}",
                            job.property,
                            job.value,
                            e
                        );
                        None
                    }
                };

                if result_tx.send((index, outcome)).await.is_err() {
                    break;
                }
            }
            tracing::trace!("Search worker {} drained the queue", worker_id);
        });
    }
    drop(result_tx);

    let mut results: Vec<Option<Vec<NodeEntry>>> = vec![None; jobs.len()];
    while let Some((index, outcome)) = result_rx.recv().await {
        results[index] = outcome;
    }
    results
}

fn merge_results(
    jobs: &[QueryJob],
    results: Vec<Option<Vec<NodeEntry>>>,
    fields: &[SearchField],
    exclude_node_id: Option<&str>,
) -> RecruitResult {
    let mut known: HashSet<String> = HashSet::new();
    let mut candidates: Vec<Candidate> = Vec::new();
    let mut field_stats: Vec<FieldSearchInfo> = Vec::new();

    // Merge in declared field order, queries in plan order, so the outcome
    // is independent of worker scheduling.
    for field in fields {
        let field_jobs: Vec<usize> = jobs
            .iter()
            .enumerate()
            .filter(|(_, job)| job.field == *field)
            .map(|(index, _)| index)
            .collect();
        if field_jobs.is_empty() {
            continue;
        }

        let mut info = FieldSearchInfo {
            field: *field,
            original_search: None,
            original_count: 0,
            normalized_search: None,
            normalized_count: 0,
            total_added: 0,
        };

        for index in field_jobs {
            let job = &jobs[index];
            match job.kind {
                QueryKind::Original => {
                    if info.original_search.is_none() {
                        info.original_search = Some(job.value.clone());
                    }
                }
                QueryKind::Normalized => {
                    if info.normalized_search.is_none() {
                        info.normalized_search = Some(job.value.clone());
                    }
                }
            }

            let Some(nodes) = &results[index] else {
                continue;
            };
            if job.kind == QueryKind::Original {
                info.original_count += nodes.len();
            }

            for entry in nodes {
                let node_id = entry.node_ref.id.trim().to_string();
                if node_id.is_empty() || exclude_node_id == Some(node_id.as_str()) {
                    continue;
                }
                if !known.insert(node_id.clone()) {
                    continue;
                }
                if job.kind == QueryKind::Normalized {
                    info.normalized_count += 1;
                }
                info.total_added += 1;
                candidates.push(Candidate {
                    node_id,
                    metadata: extract_metadata(entry),
                    match_source: (*field).into(),
                    discovery_field: *field,
                });
            }
        }

        tracing::info!(
            "Field '{}': original={}, normalized=+{}, total={}",
            field.as_str(),
            info.original_count,
            info.normalized_count,
            info.total_added
        );
        field_stats.push(info);
    }

    RecruitResult {
        candidates,
        field_stats,
    }
}

fn push_query(
    jobs: &mut Vec<QueryJob>,
    seen: &mut HashSet<String>,
    field: SearchField,
    kind: QueryKind,
    property: &'static str,
    value: String,
) {
    if !value.trim().is_empty() && seen.insert(value.to_lowercase()) {
        jobs.push(QueryJob {
            field,
            kind,
            property,
            value,
        });
    }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
