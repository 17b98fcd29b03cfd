#[cfg(test)]
mod tests {
    use crate::client::rest::extract_metadata;
    use crate::client::types::{NodeEntry, NodeRef, SearchBody, SearchCriterion, SearchPage};
    use serde_json::json;
    use std::collections::HashMap;

    fn entry_with(props: Vec<(&str, serde_json::Value)>) -> NodeEntry {
        NodeEntry {
            node_ref: NodeRef {
                id: "node-1".to_string(),
            },
            properties: props
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<HashMap<_, _>>(),
        }
    }

    // ============================================================
    // METADATA EXTRACTION
    // ============================================================

    #[test]
    fn test_extract_metadata_from_array_values() {
        let entry = entry_with(vec![
            ("cclom:title", json!(["Islam - Wikipedia"])),
            ("cclom:general_description", json!(["Ein Artikel über den Islam"])),
            ("cclom:general_keyword", json!(["Islam", "Religion"])),
            ("ccm:wwwurl", json!(["https://de.wikipedia.org/wiki/Islam"])),
        ]);

        let metadata = extract_metadata(&entry);
        assert_eq!(metadata.title.as_deref(), Some("Islam - Wikipedia"));
        assert_eq!(
            metadata.description.as_deref(),
            Some("Ein Artikel über den Islam")
        );
        assert_eq!(
            metadata.keywords,
            Some(vec!["Islam".to_string(), "Religion".to_string()])
        );
        assert_eq!(
            metadata.url.as_deref(),
            Some("https://de.wikipedia.org/wiki/Islam")
        );
        assert!(metadata.redirect_url.is_none());
    }

    #[test]
    fn test_extract_metadata_from_scalar_values() {
        let entry = entry_with(vec![
            ("cclom:title", json!("Bruchrechnung")),
            ("cclom:general_keyword", json!("Mathematik")),
        ]);

        let metadata = extract_metadata(&entry);
        assert_eq!(metadata.title.as_deref(), Some("Bruchrechnung"));
        assert_eq!(metadata.keywords, Some(vec!["Mathematik".to_string()]));
        assert!(metadata.description.is_none());
        assert!(metadata.url.is_none());
    }

    #[test]
    fn test_extract_metadata_key_fallbacks() {
        // cm:name is the fallback when cclom:title is absent
        let entry = entry_with(vec![
            ("cm:name", json!("dateiname.pdf")),
            ("cclom:location", json!(["https://example.com/material"])),
        ]);

        let metadata = extract_metadata(&entry);
        assert_eq!(metadata.title.as_deref(), Some("dateiname.pdf"));
        assert_eq!(
            metadata.url.as_deref(),
            Some("https://example.com/material")
        );
    }

    #[test]
    fn test_extract_metadata_prefers_primary_keys() {
        let entry = entry_with(vec![
            ("cclom:title", json!("Echter Titel")),
            ("cm:name", json!("dateiname.pdf")),
        ]);

        let metadata = extract_metadata(&entry);
        assert_eq!(metadata.title.as_deref(), Some("Echter Titel"));
    }

    #[test]
    fn test_extract_metadata_skips_empty_values() {
        let entry = entry_with(vec![
            ("cclom:title", json!("   ")),
            ("cclom:general_keyword", json!(["", "  "])),
        ]);

        let metadata = extract_metadata(&entry);
        assert!(metadata.title.is_none());
        assert!(metadata.keywords.is_none());
        assert!(!metadata.is_searchable());
    }

    // ============================================================
    // WIRE FORMAT
    // ============================================================

    #[test]
    fn test_search_body_serialization() {
        let body = SearchBody {
            criteria: vec![SearchCriterion {
                property: "ngsearchword".to_string(),
                values: vec!["mathematik".to_string()],
            }],
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "criteria": [
                    {"property": "ngsearchword", "values": ["mathematik"]}
                ]
            })
        );
    }

    #[test]
    fn test_search_page_deserialization() {
        let page: SearchPage = serde_json::from_value(json!({
            "nodes": [
                {"ref": {"id": "abc-123"}, "properties": {"cclom:title": ["T"]}}
            ]
        }))
        .unwrap();
        assert_eq!(page.nodes.len(), 1);
        assert_eq!(page.nodes[0].node_ref.id, "abc-123");
    }

    #[test]
    fn test_search_page_tolerates_missing_nodes() {
        let page: SearchPage = serde_json::from_value(json!({})).unwrap();
        assert!(page.nodes.is_empty());
    }
}
