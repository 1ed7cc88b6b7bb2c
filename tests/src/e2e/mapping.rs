//! # Mapping Flows
//!
//! Inbound metadata publish events through the running mapper to the
//! outbound concept annotations topic.
//!
//! Messages are handled one at a time in publish order, so a trailing
//! "sentinel" message proves that everything before it produced no output.

#[cfg(test)]
mod tests {
    use crate::e2e::fixtures::*;
    use annotations_mapper::{ConceptAnnotation, PREDICATE_TABLE};
    use mapper_runtime::AppConfig;
    use queue_transport::headers;

    #[tokio::test]
    async fn test_mentions_annotation_is_mapped() {
        let harness = Harness::new().await;
        harness.start().await;

        harness.publish(inbound(
            "tid_e2e_1",
            PAC_ORIGIN,
            r#"{"uuid":"u1","annotations":[{"predicate":"http://www.ft.com/ontology/annotation/mentions","id":"c1"}]}"#,
        ));

        let output = harness.next_output().await;
        assert_eq!(
            output.body,
            r#"{"uuid":"u1","annotations":[{"thing":{"id":"c1","predicate":"mentions"}}]}"#
        );
        assert_eq!(output.header(headers::REQUEST_ID), Some("tid_e2e_1"));
        assert_eq!(output.header(headers::ORIGIN_SYSTEM_ID), Some(PAC_ORIGIN));
        assert_eq!(output.header(headers::MESSAGE_TYPE), Some("concept-annotation"));
        assert!(output.header(headers::MESSAGE_ID).is_some());
        assert!(output
            .header(headers::MESSAGE_TIMESTAMP)
            .is_some_and(|t| t.ends_with('Z') && t.len() == 24));

        harness.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_every_supported_predicate_in_order() {
        let harness = Harness::new().await;
        harness.start().await;

        let ids: Vec<String> = (0..PREDICATE_TABLE.len()).map(|i| format!("c{i}")).collect();
        let pairs: Vec<(&str, &str)> = PREDICATE_TABLE
            .iter()
            .zip(&ids)
            .map(|((uri, _), id)| (*uri, id.as_str()))
            .collect();
        harness.publish(inbound("tid_all", PAC_ORIGIN, event_body("u-all", &pairs)));

        let (_, annotations) = harness.next_annotations().await;
        let expected: Vec<ConceptAnnotation> = PREDICATE_TABLE
            .iter()
            .zip(&ids)
            .map(|((_, name), id)| ConceptAnnotation::new(id.clone(), *name))
            .collect();
        assert_eq!(annotations.uuid, "u-all");
        assert_eq!(annotations.annotations, expected);

        harness.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_unsupported_predicates_are_dropped() {
        let harness = Harness::new().await;
        harness.start().await;

        harness.publish(inbound(
            "tid_mixed",
            PAC_ORIGIN,
            event_body(
                "u-mixed",
                &[
                    (ABOUT, "c1"),
                    ("http://www.ft.com/ontology/unknown", "c2"),
                    (MENTIONS, "c3"),
                ],
            ),
        ));
        harness.publish(inbound(
            "tid_none",
            PAC_ORIGIN,
            event_body("u-none", &[("invalid predicate", "c4")]),
        ));

        let (_, mixed) = harness.next_annotations().await;
        assert_eq!(
            mixed.annotations,
            vec![
                ConceptAnnotation::new("c1", "about"),
                ConceptAnnotation::new("c3", "mentions"),
            ]
        );

        // Nothing supported still yields a message with no annotations
        let (_, none) = harness.next_annotations().await;
        assert_eq!(none.uuid, "u-none");
        assert!(none.annotations.is_empty());

        harness.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_excluded_origin_and_bad_json_produce_nothing() {
        let harness = Harness::new().await;
        harness.start().await;

        harness.publish(inbound(
            "tid_other",
            "http://example.com/other",
            event_body("u-other", &[(ABOUT, "c1")]),
        ));
        harness.publish(inbound("tid_bad", PAC_ORIGIN, "{not json"));
        harness.publish(inbound(
            "tid_sentinel",
            PAC_ORIGIN,
            event_body("u-sentinel", &[(ABOUT, "c1")]),
        ));

        let (output, annotations) = harness.next_annotations().await;
        assert_eq!(annotations.uuid, "u-sentinel");
        assert_eq!(output.header(headers::REQUEST_ID), Some("tid_sentinel"));
        let published = harness.broker.messages(OUT_TOPIC);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0], output);

        harness.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_message_ids_differ_for_identical_input() {
        let harness = Harness::new().await;
        harness.start().await;

        let body = event_body("u-dup", &[(ABOUT, "c1")]);
        harness.publish(inbound("tid_dup", PAC_ORIGIN, body.clone()));
        harness.publish(inbound("tid_dup", PAC_ORIGIN, body));

        let first = harness.next_output().await;
        let second = harness.next_output().await;
        assert_eq!(first.body, second.body);
        assert_ne!(
            first.header(headers::MESSAGE_ID),
            second.header(headers::MESSAGE_ID)
        );

        harness.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_whitelist_maps_nothing() {
        let harness = Harness::with_config(AppConfig {
            whitelist_regex: "(unclosed".into(),
            connect_backoff_secs: 1,
            ..AppConfig::default()
        })
        .await;
        harness.start().await;

        for i in 0..3 {
            harness.publish(inbound(
                &format!("tid_{i}"),
                PAC_ORIGIN,
                event_body("u1", &[(ABOUT, "c1")]),
            ));
        }
        harness.wait_drained().await;
        harness.runtime.shutdown().await;

        assert_eq!(harness.outputs_published(), 0);
        let report = harness.runtime.health().run_checks().await;
        assert!(!report.ok);
        assert!(report.check("message-whitelist").is_some());
    }

    #[tokio::test]
    async fn test_custom_topics_and_whitelist() {
        let harness = Harness::with_config(AppConfig {
            consumer_topic: IN_TOPIC.into(),
            producer_topic: OUT_TOPIC.into(),
            whitelist_regex: r"^http://cmdb\.ft\.com/systems/(pac|next-video)$".into(),
            connect_backoff_secs: 1,
            ..AppConfig::default()
        })
        .await;
        harness.start().await;

        harness.publish(inbound(
            "tid_suffix",
            "http://cmdb.ft.com/systems/pac-old",
            event_body("u-suffix", &[(ABOUT, "c1")]),
        ));
        harness.publish(inbound(
            "tid_video",
            "http://cmdb.ft.com/systems/next-video",
            event_body("u-video", &[(ABOUT, "c1")]),
        ));

        let (_, annotations) = harness.next_annotations().await;
        assert_eq!(annotations.uuid, "u-video");

        harness.runtime.shutdown().await;
    }
}
