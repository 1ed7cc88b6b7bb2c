//! # Resilience Flows
//!
//! Queue outages, publish failures and what the health endpoints report
//! while they happen.

#[cfg(test)]
mod tests {
    use crate::e2e::fixtures::*;
    use annotations_mapper::{HealthService, ProxyConsumer, ProxyProducer, ServiceInfo, Whitelist};
    use mapper_runtime::{AppConfig, APP_DESCRIPTION, APP_NAME, APP_SYSTEM_CODE};
    use mapper_telemetry::MESSAGES_FAILED;
    use queue_transport::{headers, InMemoryBroker};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_mapper_catches_up_after_queue_outage() {
        let harness = Harness::with_config(AppConfig::default()).await;
        harness.broker.set_available(false);
        harness.runtime.start();

        tokio::time::sleep(Duration::from_secs(90)).await;
        assert!(!harness.runtime.is_connected());
        assert!(!harness.runtime.health().gtg().await.good_to_go);

        harness.broker.set_available(true);
        // Next attempt happens on the fixed one minute interval
        tokio::time::sleep(Duration::from_secs(40)).await;
        harness.wait_connected().await;
        assert!(harness.runtime.health().gtg().await.good_to_go);

        harness.publish(inbound(
            "tid_after_outage",
            PAC_ORIGIN,
            event_body("u1", &[(MENTIONS, "c1")]),
        ));
        let output = harness.next_output().await;
        assert_eq!(output.header(headers::REQUEST_ID), Some("tid_after_outage"));

        harness.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_publish_failure_drops_message_and_continues() {
        let harness = Harness::new().await;
        harness.start().await;

        let failed = MESSAGES_FAILED.with_label_values(&["publish"]).get();
        harness.broker.set_topic_writable(OUT_TOPIC, false);
        harness.publish(inbound(
            "tid_lost",
            PAC_ORIGIN,
            event_body("u-lost", &[(ABOUT, "c1")]),
        ));
        harness.wait_failed("publish", failed).await;
        assert_eq!(harness.outputs_published(), 0);

        harness.broker.set_topic_writable(OUT_TOPIC, true);
        harness.publish(inbound(
            "tid_next",
            PAC_ORIGIN,
            event_body("u-next", &[(ABOUT, "c1")]),
        ));

        let (output, annotations) = harness.next_annotations().await;
        assert_eq!(annotations.uuid, "u-next");
        assert_eq!(output.header(headers::REQUEST_ID), Some("tid_next"));
        assert_eq!(harness.outputs_published(), 1);

        harness.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_health_probe_does_not_disturb_consumption() {
        let harness = Harness::new().await;
        harness.start().await;

        for _ in 0..3 {
            let report = harness.runtime.health().run_checks().await;
            assert!(report.ok, "{report:?}");
        }
        assert_eq!(
            harness
                .broker
                .sessions_opened("pac-annotations-mapper-healthcheck"),
            3
        );
        assert_eq!(
            harness
                .broker
                .active_sessions("pac-annotations-mapper-healthcheck"),
            0
        );

        harness.publish(inbound(
            "tid_after_probe",
            PAC_ORIGIN,
            event_body("u1", &[(ABOUT, "c1")]),
        ));
        let output = harness.next_output().await;
        assert_eq!(output.header(headers::REQUEST_ID), Some("tid_after_probe"));

        harness.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_consumer_lag_check() {
        let broker = Arc::new(InMemoryBroker::new("kafka:9092"));
        let retry = Duration::from_secs(1);
        let consumer = Arc::new(ProxyConsumer::new(
            Arc::clone(&broker),
            GROUP,
            vec![IN_TOPIC.to_string()],
            retry,
        ));
        let producer = Arc::new(ProxyProducer::new(Arc::clone(&broker), OUT_TOPIC, retry));
        consumer.connect().await;
        producer.connect().await;

        let health = HealthService::new(
            ServiceInfo {
                system_code: APP_SYSTEM_CODE.into(),
                name: APP_NAME.into(),
                description: APP_DESCRIPTION.into(),
            },
            &Whitelist::compile(r"http://cmdb\.ft\.com/systems/pac"),
            consumer,
            producer,
        )
        .with_lag_tolerance(2);

        // Nobody is listening, so the group falls behind
        for i in 0..3 {
            broker
                .publish(IN_TOPIC, inbound(&format!("tid_{i}"), PAC_ORIGIN, "{}"))
                .unwrap();
        }

        let report = health.run_checks().await;
        assert!(!report.ok);
        let lag = report.check("consumer-lag").unwrap();
        assert!(!lag.ok);
        assert_eq!(lag.severity, 3);
        assert!(report.check("read-message-queue-reachable").unwrap().ok);
        assert!(report.check("write-message-queue-reachable").unwrap().ok);
        // Lag alone does not fail good-to-go
        assert!(health.gtg().await.good_to_go);
    }
}
