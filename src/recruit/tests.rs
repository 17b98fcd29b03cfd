#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::client::rest::{SEARCH_PROPERTY_TEXT, SEARCH_PROPERTY_URL};
    use crate::client::types::{NodeEntry, NodeRef};
    use crate::client::UpstreamApi;
    use crate::detection::types::{ContentMetadata, MatchSource, SearchField};
    use crate::error::DetectError;
    use crate::recruit::recruiter::{build_query_plan, recruit};
    use crate::recruit::types::QueryKind;

    // Canned upstream: search results are keyed on (property, query), and
    // every call is recorded for assertions.
    struct FakeUpstream {
        responses: HashMap<(String, String), Vec<NodeEntry>>,
        calls: Mutex<Vec<(String, String, usize)>>,
        fail_everything: bool,
        fail_queries: Vec<String>,
    }

    impl FakeUpstream {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
                calls: Mutex::new(Vec::new()),
                fail_everything: false,
                fail_queries: Vec::new(),
            }
        }

        fn respond(mut self, property: &str, query: &str, nodes: Vec<NodeEntry>) -> Self {
            self.responses
                .insert((property.to_string(), query.to_string()), nodes);
            self
        }

        fn recorded_calls(&self) -> Vec<(String, String, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UpstreamApi for FakeUpstream {
        async fn fetch_metadata(&self, _node_id: &str) -> Result<Option<ContentMetadata>> {
            Ok(None)
        }

        async fn search(
            &self,
            property: &str,
            query: &str,
            max_results: usize,
        ) -> Result<Vec<NodeEntry>> {
            self.calls
                .lock()
                .unwrap()
                .push((property.to_string(), query.to_string(), max_results));
            if self.fail_everything || self.fail_queries.iter().any(|q| q == query) {
                anyhow::bail!("upstream unavailable");
            }
            Ok(self
                .responses
                .get(&(property.to_string(), query.to_string()))
                .cloned()
                .unwrap_or_default())
        }

        async fn check_redirect(&self, _url: &str) -> Option<String> {
            None
        }
    }

    fn node(id: &str, title: &str, url: &str) -> NodeEntry {
        let mut properties = HashMap::new();
        if !title.is_empty() {
            properties.insert("cclom:title".to_string(), json!([title]));
        }
        if !url.is_empty() {
            properties.insert("ccm:wwwurl".to_string(), json!([url]));
        }
        NodeEntry {
            node_ref: NodeRef { id: id.to_string() },
            properties,
        }
    }

    fn title_only(title: &str) -> ContentMetadata {
        ContentMetadata {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    // ============================================================
    // QUERY PLAN
    // ============================================================

    #[test]
    fn test_plan_title_includes_normalized_and_variants() {
        let metadata = title_only("Mathematik für Grundschüler");
        let jobs = build_query_plan(&metadata, &[SearchField::Title]);

        let values: Vec<&str> = jobs.iter().map(|j| j.value.as_str()).collect();
        assert!(values.contains(&"Mathematik für Grundschüler"));
        assert!(values.contains(&"mathematik fuer grundschueler"));
        assert!(jobs.iter().all(|j| j.property == SEARCH_PROPERTY_TEXT));
        assert_eq!(jobs[0].kind, QueryKind::Original);
    }

    #[test]
    fn test_plan_title_with_publisher_suffix() {
        let metadata = title_only("Islam - Wikipedia");
        let jobs = build_query_plan(&metadata, &[SearchField::Title]);

        let values: Vec<&str> = jobs.iter().map(|j| j.value.as_str()).collect();
        assert_eq!(values[0], "Islam - Wikipedia");
        assert!(values.contains(&"Islam"));
    }

    #[test]
    fn test_plan_deduplicates_case_insensitively() {
        let metadata = title_only("Islam");
        let jobs = build_query_plan(&metadata, &[SearchField::Title]);

        // "Islam", its normalization and its lowercase variant all collapse
        let mut lowered: Vec<String> = jobs.iter().map(|j| j.value.to_lowercase()).collect();
        lowered.sort();
        lowered.dedup();
        assert_eq!(lowered.len(), jobs.len());
    }

    #[test]
    fn test_plan_description_truncated_to_100_chars() {
        let metadata = ContentMetadata {
            description: Some("x".repeat(250)),
            ..Default::default()
        };
        let jobs = build_query_plan(&metadata, &[SearchField::Description]);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].value.chars().count(), 100);
    }

    #[test]
    fn test_plan_keywords_joined() {
        let metadata = ContentMetadata {
            keywords: Some(vec![
                "Islam".to_string(),
                " Religion ".to_string(),
                "".to_string(),
            ]),
            ..Default::default()
        };
        let jobs = build_query_plan(&metadata, &[SearchField::Keywords]);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].value, "Islam Religion");
    }

    #[test]
    fn test_plan_url_uses_exact_and_normalized_search() {
        let metadata = ContentMetadata {
            url: Some("https://www.Example.com/Page/".to_string()),
            ..Default::default()
        };
        let jobs = build_query_plan(&metadata, &[SearchField::Url]);

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].property, SEARCH_PROPERTY_URL);
        assert_eq!(jobs[0].value, "https://www.Example.com/Page/");
        assert_eq!(jobs[1].property, SEARCH_PROPERTY_TEXT);
        assert_eq!(jobs[1].value, "example.com/page");
    }

    #[test]
    fn test_plan_url_includes_redirect_target() {
        let metadata = ContentMetadata {
            url: Some("https://example.com/old".to_string()),
            redirect_url: Some("https://example.com/new".to_string()),
            ..Default::default()
        };
        let jobs = build_query_plan(&metadata, &[SearchField::Url]);

        assert!(jobs
            .iter()
            .any(|j| j.property == SEARCH_PROPERTY_URL && j.value == "https://example.com/new"));
    }

    #[test]
    fn test_plan_skips_empty_fields() {
        let metadata = title_only("Islam");
        let jobs = build_query_plan(
            &metadata,
            &[SearchField::Title, SearchField::Description, SearchField::Url],
        );
        assert!(jobs.iter().all(|j| j.field == SearchField::Title));
    }

    // ============================================================
    // RECRUITMENT & MERGING
    // ============================================================

    #[tokio::test]
    async fn test_recruit_first_discovery_wins() {
        let metadata = ContentMetadata {
            title: Some("Islam".to_string()),
            url: Some("https://example.com/islam".to_string()),
            ..Default::default()
        };
        // The same node comes back from both the title and the url search.
        let upstream = Arc::new(
            FakeUpstream::new()
                .respond(
                    SEARCH_PROPERTY_TEXT,
                    "Islam",
                    vec![node("n-1", "Islam", "https://example.com/islam")],
                )
                .respond(
                    SEARCH_PROPERTY_URL,
                    "https://example.com/islam",
                    vec![node("n-1", "Islam", "https://example.com/islam")],
                ),
        );

        let result = recruit(
            upstream,
            &metadata,
            &[SearchField::Title, SearchField::Url],
            40,
            None,
        )
        .await
        .unwrap();

        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].discovery_field, SearchField::Title);
        assert_eq!(result.candidates[0].match_source, MatchSource::Title);

        let url_stats = result
            .field_stats
            .iter()
            .find(|s| s.field == SearchField::Url)
            .unwrap();
        assert_eq!(url_stats.total_added, 0, "node already taken by title");
        assert_eq!(url_stats.original_count, 1, "raw hits still counted");
    }

    #[tokio::test]
    async fn test_recruit_counts_variant_discoveries() {
        let metadata = title_only("Mathematik für Grundschüler");
        let upstream = Arc::new(
            FakeUpstream::new()
                .respond(
                    SEARCH_PROPERTY_TEXT,
                    "Mathematik für Grundschüler",
                    vec![node("n-1", "Mathematik für Grundschüler", "")],
                )
                .respond(
                    SEARCH_PROPERTY_TEXT,
                    "mathematik fuer grundschueler",
                    vec![node("n-2", "Mathematik fuer Grundschueler", "")],
                ),
        );

        let result = recruit(upstream, &metadata, &[SearchField::Title], 40, None)
            .await
            .unwrap();

        assert_eq!(result.candidates.len(), 2);
        let stats = &result.field_stats[0];
        assert_eq!(stats.original_count, 1);
        assert_eq!(stats.normalized_count, 1);
        assert_eq!(stats.total_added, 2);
    }

    #[tokio::test]
    async fn test_recruit_excludes_source_node() {
        let metadata = title_only("Islam");
        let upstream = Arc::new(FakeUpstream::new().respond(
            SEARCH_PROPERTY_TEXT,
            "Islam",
            vec![node("source-node", "Islam", ""), node("other", "Islam", "")],
        ));

        let result = recruit(
            upstream,
            &metadata,
            &[SearchField::Title],
            40,
            Some("source-node"),
        )
        .await
        .unwrap();

        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].node_id, "other");
    }

    #[tokio::test]
    async fn test_recruit_all_failures_is_fatal() {
        let metadata = title_only("Islam");
        let mut upstream = FakeUpstream::new();
        upstream.fail_everything = true;

        let result = recruit(
            Arc::new(upstream),
            &metadata,
            &[SearchField::Title],
            40,
            None,
        )
        .await;

        assert!(matches!(result, Err(DetectError::UpstreamFatal(_))));
    }

    #[tokio::test]
    async fn test_recruit_tolerates_partial_failures() {
        let metadata = title_only("Islam - Wikipedia");
        let mut upstream = FakeUpstream::new().respond(
            SEARCH_PROPERTY_TEXT,
            "Islam",
            vec![node("n-1", "Islam", "")],
        );
        // The original-title query fails, the normalized one succeeds.
        upstream.fail_queries = vec!["Islam - Wikipedia".to_string()];

        let result = recruit(
            Arc::new(upstream),
            &metadata,
            &[SearchField::Title],
            40,
            None,
        )
        .await
        .unwrap();

        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].node_id, "n-1");
    }

    #[tokio::test]
    async fn test_recruit_never_exceeds_candidate_limit() {
        let metadata = ContentMetadata {
            title: Some("Islam - Wikipedia".to_string()),
            description: Some("Ein langer Artikel über den Islam".to_string()),
            url: Some("https://de.wikipedia.org/wiki/Islam".to_string()),
            ..Default::default()
        };
        let upstream = Arc::new(FakeUpstream::new());

        recruit(
            upstream.clone(),
            &metadata,
            &[SearchField::Title, SearchField::Description, SearchField::Url],
            40,
            None,
        )
        .await
        .unwrap();

        let calls = upstream.recorded_calls();
        assert!(!calls.is_empty());
        assert!(
            calls.iter().all(|(_, _, limit)| *limit <= 40),
            "no upstream query may exceed the configured candidate ceiling"
        );
    }

    #[tokio::test]
    async fn test_recruit_empty_plan_yields_empty_result() {
        let metadata = ContentMetadata::default();
        let upstream = Arc::new(FakeUpstream::new());

        let result = recruit(upstream, &metadata, &[SearchField::Title], 40, None)
            .await
            .unwrap();

        assert!(result.candidates.is_empty());
        assert!(result.field_stats.is_empty());
    }
}
