//! Wire-format DTOs for the repository REST API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Reference block identifying a repository node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: String,
}

/// A node as returned by the search and metadata endpoints. Property values
/// arrive untyped; extraction happens in `rest::extract_metadata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry {
    #[serde(rename = "ref")]
    pub node_ref: NodeRef,
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

/// One page of search results.
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
}

/// Envelope around the metadata endpoint's payload.
#[derive(Debug, Deserialize)]
pub struct NodeEnvelope {
    pub node: NodeEntry,
}

#[derive(Debug, Serialize)]
pub struct SearchCriterion {
    pub property: String,
    pub values: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchBody {
    pub criteria: Vec<SearchCriterion>,
}
