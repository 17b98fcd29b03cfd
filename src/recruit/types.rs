use crate::detection::types::{ContentMetadata, MatchSource, SearchField};

/// A repository node discovered during recruitment. `match_source` starts
/// as the discovery field and is upgraded to `UrlExact` by the pipeline's
/// URL pass.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub node_id: String,
    pub metadata: ContentMetadata,
    pub match_source: MatchSource,
    pub discovery_field: SearchField,
}

/// Distinguishes a field's primary query from the normalized/variant
/// queries layered on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Original,
    Normalized,
}

/// One upstream search to execute.
#[derive(Debug, Clone)]
pub struct QueryJob {
    pub field: SearchField,
    pub kind: QueryKind,
    pub property: &'static str,
    pub value: String,
}

/// Per-field accounting over the recruiter's final contribution.
#[derive(Debug, Clone)]
pub struct FieldSearchInfo {
    pub field: SearchField,
    /// Value of the field's primary query.
    pub original_search: Option<String>,
    /// Raw hit count of the primary query.
    pub original_count: usize,
    /// First normalized/variant query value, when any ran.
    pub normalized_search: Option<String>,
    /// Unique candidates contributed by normalized/variant queries.
    pub normalized_count: usize,
    /// Unique candidates this field added to the merged set.
    pub total_added: usize,
}

#[derive(Debug, Default)]
pub struct RecruitResult {
    /// Deduplicated candidates in discovery order.
    pub candidates: Vec<Candidate>,
    pub field_stats: Vec<FieldSearchInfo>,
}
