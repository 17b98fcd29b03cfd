use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::types::{
    CandidateStats, ContentMetadata, DetectionResponse, DuplicateEntry, EnrichmentInfo,
    MatchSource, SearchField,
};
use crate::client::UpstreamApi;
use crate::error::DetectError;
use crate::minhash::MinHasher;
use crate::recruit::types::Candidate;
use crate::recruit::{recruit, RecruitResult};

/// A title-sourced candidate must score at least this to be trusted as an
/// enrichment donor.
const ENRICHMENT_MIN_SIMILARITY: f64 = 0.7;

const SEARCH_VALUE_DISPLAY_CHARS: usize = 80;
const NORMALIZED_DISPLAY_CHARS: usize = 50;

/// Validated request parameters, with `max_candidates` already capped at
/// the configured ceiling.
#[derive(Debug, Clone)]
pub struct DetectionParams {
    pub threshold: f64,
    pub search_fields: Vec<SearchField>,
    pub max_candidates: usize,
}

/// Detection entry point for an existing repository node.
pub async fn detect_by_node(
    upstream: &Arc<dyn UpstreamApi>,
    hasher: &MinHasher,
    params: &DetectionParams,
    node_id: &str,
) -> Result<DetectionResponse, DetectError> {
    let metadata = match upstream.fetch_metadata(node_id).await {
        Ok(Some(metadata)) => metadata,
        Ok(None) => return Err(DetectError::NodeNotFound(node_id.to_string())),
        Err(e) => {
            return Err(DetectError::UpstreamFatal(format!(
                "metadata fetch for {} failed: {}",
                node_id, e
            )))
        }
    };

    run_pipeline(upstream, hasher, params, metadata, Some(node_id.to_string())).await
}

/// Detection entry point for a caller-supplied record (content that is not
/// yet in the repository).
pub async fn detect_by_metadata(
    upstream: &Arc<dyn UpstreamApi>,
    hasher: &MinHasher,
    params: &DetectionParams,
    metadata: ContentMetadata,
) -> Result<DetectionResponse, DetectError> {
    run_pipeline(upstream, hasher, params, metadata, None).await
}

async fn run_pipeline(
    upstream: &Arc<dyn UpstreamApi>,
    hasher: &MinHasher,
    params: &DetectionParams,
    mut metadata: ContentMetadata,
    source_node_id: Option<String>,
) -> Result<DetectionResponse, DetectError> {
    if !metadata.is_searchable() {
        return Err(DetectError::InvalidRequest(
            "no searchable content provided (need at least title, description, keywords, or URL)"
                .to_string(),
        ));
    }

    // Resolve redirects up front so the redirected target participates in
    // URL search and URL-exact matching.
    if metadata.has_url() && metadata.redirect_url.is_none() {
        if let Some(url) = metadata.url.clone() {
            metadata.redirect_url = upstream.check_redirect(&url).await;
        }
    }

    // Phase 2: initial recruitment over the non-empty active fields.
    let active = active_fields(&metadata, &params.search_fields);
    let mut result = recruit(
        upstream.clone(),
        &metadata,
        &active,
        params.max_candidates,
        source_node_id.as_deref(),
    )
    .await?;

    // Phase 3: enrichment, at most one pass.
    let mut enrichment = EnrichmentInfo::default();
    if needs_enrichment(&metadata) {
        if let Some((donor_id, source_field)) =
            select_enrichment_candidate(hasher, &metadata, &result.candidates)
        {
            // Search hits can carry sparse properties; prefer a full fetch.
            let donor = match upstream.fetch_metadata(&donor_id).await {
                Ok(Some(full)) => Some(full),
                _ => result
                    .candidates
                    .iter()
                    .find(|c| c.node_id == donor_id)
                    .map(|c| c.metadata.clone()),
            };

            let fields_added = donor
                .map(|donor| merge_enrichment(&mut metadata, &donor))
                .unwrap_or_default();

            if !fields_added.is_empty() {
                tracing::info!(
                    "Enriched metadata from node {} ({}): added {:?}",
                    donor_id,
                    source_field.as_str(),
                    fields_added
                );
                enrichment = EnrichmentInfo {
                    enriched: true,
                    enrichment_source_node_id: Some(donor_id),
                    enrichment_source_field: Some(source_field),
                    fields_added,
                };

                // Re-run recruitment exactly once with the completed record.
                let active = active_fields(&metadata, &params.search_fields);
                match recruit(
                    upstream.clone(),
                    &metadata,
                    &active,
                    params.max_candidates,
                    source_node_id.as_deref(),
                )
                .await
                {
                    Ok(second) => merge_recruit_results(&mut result, second),
                    Err(e) => {
                        tracing::warn!("Re-recruitment after enrichment failed: {}", e);
                    }
                }
            }
        }
    }

    // Phases 4 + 5: URL-exact determination, then similarity scoring for
    // everything else.
    let source_urls = source_url_keys(&metadata);
    let source_signature = hasher.text_signature(&metadata.scoring_text());

    let mut field_max: HashMap<SearchField, f64> = HashMap::new();
    let mut duplicates: Vec<DuplicateEntry> = Vec::new();

    for candidate in &result.candidates {
        if source_node_id.as_deref() == Some(candidate.node_id.as_str()) {
            continue;
        }

        let url_exact = candidate
            .metadata
            .normalized_url()
            .is_some_and(|key| source_urls.contains(&key));

        let (score, match_source) = if url_exact {
            (1.0, MatchSource::UrlExact)
        } else {
            let candidate_signature = hasher.text_signature(&candidate.metadata.scoring_text());
            (
                round4(source_signature.jaccard(&candidate_signature)),
                candidate.match_source,
            )
        };

        let entry = field_max.entry(candidate.discovery_field).or_insert(0.0);
        if score > *entry {
            *entry = score;
        }

        if url_exact || score >= params.threshold {
            duplicates.push(DuplicateEntry {
                node_id: candidate.node_id.clone(),
                title: candidate.metadata.title.clone(),
                description: candidate.metadata.description.clone(),
                keywords: candidate.metadata.keywords.clone(),
                url: candidate.metadata.url.clone(),
                similarity_score: score,
                match_source,
            });
        }
    }

    // Phase 6: URL-exact entries first, then by score, ties by node id.
    duplicates.sort_by(|a, b| {
        let a_exact = a.match_source == MatchSource::UrlExact;
        let b_exact = b.match_source == MatchSource::UrlExact;
        b_exact
            .cmp(&a_exact)
            .then(
                b.similarity_score
                    .partial_cmp(&a.similarity_score)
                    .unwrap_or(Ordering::Equal),
            )
            .then_with(|| a.node_id.cmp(&b.node_id))
    });

    let url_matches = duplicates
        .iter()
        .filter(|d| d.match_source == MatchSource::UrlExact)
        .count();
    tracing::info!(
        "Found {} duplicates: {} URL-exact, {} above threshold {}",
        duplicates.len(),
        url_matches,
        duplicates.len() - url_matches,
        params.threshold
    );

    let candidate_search_results = build_candidate_stats(&result, &field_max);

    Ok(DetectionResponse {
        success: true,
        source_node_id,
        total_candidates_checked: result.candidates.len(),
        source_metadata: metadata,
        threshold: params.threshold,
        enrichment,
        candidate_search_results,
        duplicates,
    })
}

/// The fields to actually search: requested AND non-empty on the record.
fn active_fields(metadata: &ContentMetadata, requested: &[SearchField]) -> Vec<SearchField> {
    requested
        .iter()
        .copied()
        .filter(|field| match field {
            SearchField::Title => metadata.has_title(),
            SearchField::Description => metadata.has_description(),
            SearchField::Keywords => metadata.has_keywords(),
            SearchField::Url => metadata.has_url(),
        })
        .collect()
}

fn needs_enrichment(metadata: &ContentMetadata) -> bool {
    !(metadata.has_title() && metadata.has_description() && metadata.has_url())
}

/// Picks the enrichment donor: any URL-exact candidate first, otherwise the
/// best title-sourced candidate scoring at least 0.7. Ties resolve to the
/// higher score, then the lexicographically smallest node id.
fn select_enrichment_candidate(
    hasher: &MinHasher,
    metadata: &ContentMetadata,
    candidates: &[Candidate],
) -> Option<(String, SearchField)> {
    let source_urls = source_url_keys(metadata);

    for candidate in candidates {
        if candidate
            .metadata
            .normalized_url()
            .is_some_and(|key| source_urls.contains(&key))
        {
            return Some((candidate.node_id.clone(), SearchField::Url));
        }
    }

    let source_signature = hasher.text_signature(&metadata.scoring_text());
    let mut best: Option<(&Candidate, f64)> = None;

    for candidate in candidates
        .iter()
        .filter(|c| c.discovery_field == SearchField::Title)
    {
        let score =
            source_signature.jaccard(&hasher.text_signature(&candidate.metadata.scoring_text()));
        if score < ENRICHMENT_MIN_SIMILARITY {
            continue;
        }
        let better = match &best {
            None => true,
            Some((current, current_score)) => {
                score > *current_score
                    || (score == *current_score && candidate.node_id < current.node_id)
            }
        };
        if better {
            best = Some((candidate, score));
        }
    }

    best.map(|(candidate, _)| (candidate.node_id.clone(), SearchField::Title))
}

/// Copies the donor's non-empty fields into the source's empty ones.
/// Returns the field names that were filled, in a fixed order.
fn merge_enrichment(metadata: &mut ContentMetadata, donor: &ContentMetadata) -> Vec<String> {
    let mut added = Vec::new();
    if !metadata.has_title() && donor.has_title() {
        metadata.title = donor.title.clone();
        added.push("title".to_string());
    }
    if !metadata.has_description() && donor.has_description() {
        metadata.description = donor.description.clone();
        added.push("description".to_string());
    }
    if !metadata.has_keywords() && donor.has_keywords() {
        metadata.keywords = donor.keywords.clone();
        added.push("keywords".to_string());
    }
    if !metadata.has_url() && donor.has_url() {
        metadata.url = donor.url.clone();
        added.push("url".to_string());
    }
    added
}

/// Folds a second recruitment round into the first. Existing candidates and
/// field stats win; only new node ids and newly-searched fields are added.
fn merge_recruit_results(first: &mut RecruitResult, second: RecruitResult) {
    let known: HashSet<String> = first
        .candidates
        .iter()
        .map(|c| c.node_id.clone())
        .collect();
    for candidate in second.candidates {
        if !known.contains(&candidate.node_id) {
            first.candidates.push(candidate);
        }
    }

    let seen_fields: HashSet<SearchField> =
        first.field_stats.iter().map(|info| info.field).collect();
    for info in second.field_stats {
        if !seen_fields.contains(&info.field) {
            first.field_stats.push(info);
        }
    }
}

/// Normalized keys the source answers to: its URL plus the redirect target.
fn source_url_keys(metadata: &ContentMetadata) -> Vec<String> {
    [
        metadata.normalized_url(),
        metadata.normalized_redirect_url(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn build_candidate_stats(
    result: &RecruitResult,
    field_max: &HashMap<SearchField, f64>,
) -> Vec<CandidateStats> {
    result
        .field_stats
        .iter()
        .map(|info| {
            let search_value = match (&info.original_search, &info.normalized_search) {
                (Some(original), Some(normalized)) => Some(format!("{} → {}", original, normalized)),
                (Some(original), None) => Some(original.clone()),
                (None, normalized) => normalized.clone(),
            }
            .map(|value| truncate_chars(&value, SEARCH_VALUE_DISPLAY_CHARS));

            CandidateStats {
                field: info.field,
                search_value,
                candidates_found: info.total_added,
                highest_similarity: field_max.get(&info.field).map(|score| round4(*score)),
                original_count: Some(info.original_count),
                normalized_search: info
                    .normalized_search
                    .as_deref()
                    .map(|value| truncate_chars(value, NORMALIZED_DISPLAY_CHARS)),
                normalized_count: info
                    .normalized_search
                    .is_some()
                    .then_some(info.normalized_count),
            }
        })
        .collect()
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let truncated: String = value.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
