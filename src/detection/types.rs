use serde::{Deserialize, Serialize};

use crate::normalize::url::normalize_url;

/// Metadata fields usable for candidate search. `keywords` is not in the
/// default set because it produces too many false positives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Title,
    Description,
    Keywords,
    Url,
}

impl SearchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Description => "description",
            SearchField::Keywords => "keywords",
            SearchField::Url => "url",
        }
    }
}

/// How a duplicate was identified. `UrlExact` outranks every field-based
/// source and bypasses the similarity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    UrlExact,
    Title,
    Description,
    Keywords,
    Url,
}

impl From<SearchField> for MatchSource {
    fn from(field: SearchField) -> Self {
        match field {
            SearchField::Title => MatchSource::Title,
            SearchField::Description => MatchSource::Description,
            SearchField::Keywords => MatchSource::Keywords,
            SearchField::Url => MatchSource::Url,
        }
    }
}

/// The metadata record duplicates are detected against. All fields are
/// optional; a record is searchable when at least one is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Final URL after following redirects, when it differs from `url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl ContentMetadata {
    pub fn has_title(&self) -> bool {
        non_empty(&self.title)
    }

    pub fn has_description(&self) -> bool {
        non_empty(&self.description)
    }

    pub fn has_url(&self) -> bool {
        non_empty(&self.url)
    }

    pub fn has_keywords(&self) -> bool {
        self.keywords
            .as_deref()
            .is_some_and(|list| list.iter().any(|k| !k.trim().is_empty()))
    }

    /// A record is searchable iff any field survives trimming.
    pub fn is_searchable(&self) -> bool {
        self.has_title() || self.has_description() || self.has_keywords() || self.has_url()
    }

    pub fn normalized_url(&self) -> Option<String> {
        self.url.as_deref().and_then(normalize_url)
    }

    pub fn normalized_redirect_url(&self) -> Option<String> {
        self.redirect_url.as_deref().and_then(normalize_url)
    }

    /// The text similarity scoring runs over: title plus the first 200
    /// characters of the description.
    pub fn scoring_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            parts.push(title.trim().to_string());
        }
        if let Some(description) = self.description.as_deref().filter(|d| !d.trim().is_empty()) {
            parts.push(description.trim().chars().take(200).collect());
        }
        parts.join(" ")
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

// --- Request DTOs ---

fn default_threshold() -> f64 {
    0.9
}

fn default_search_fields() -> Vec<SearchField> {
    vec![SearchField::Title, SearchField::Description, SearchField::Url]
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectByNodeRequest {
    pub node_id: String,
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<SearchField>,
    #[serde(default)]
    pub max_candidates: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectByMetadataRequest {
    pub metadata: ContentMetadata,
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<SearchField>,
    #[serde(default)]
    pub max_candidates: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HashRequest {
    pub text: String,
}

// --- Response DTOs ---

/// A candidate that passed the acceptance rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateEntry {
    pub node_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub similarity_score: f64,
    pub match_source: MatchSource,
}

/// Per-field search statistics for the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateStats {
    pub field: SearchField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_value: Option<String>,
    pub candidates_found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_similarity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_count: Option<usize>,
}

/// Records the one-shot completion of missing source fields from a
/// highly-confident candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentInfo {
    pub enriched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment_source_node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment_source_field: Option<SearchField>,
    #[serde(default)]
    pub fields_added: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_node_id: Option<String>,
    pub source_metadata: ContentMetadata,
    pub threshold: f64,
    pub enrichment: EnrichmentInfo,
    pub candidate_search_results: Vec<CandidateStats>,
    pub total_candidates_checked: usize,
    pub duplicates: Vec<DuplicateEntry>,
}

#[derive(Debug, Serialize)]
pub struct HashResponse {
    pub success: bool,
    pub signature: Vec<u32>,
    pub num_hashes: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
