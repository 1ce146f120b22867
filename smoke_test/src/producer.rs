//! Producer delivery-report scenarios
//!
//! Validates the fire-and-forget contract: every submitted message is
//! acknowledged exactly once through the delivery-report callback, as
//! either a success or a broker-reported error, never silently dropped.

use crate::common::{broker_list, create_service, unique_topic, wait_for, TestResult, TEST_TIMEOUT};

/// Produce one message and expect exactly one successful delivery report
pub async fn test_delivery_report_success() -> TestResult {
    println!("=== Test: Delivery Report (success) ===");

    let topic = unique_topic("smoke-delivery");
    let service = create_service();
    service.producer_init("bootstrap.servers", &broker_list());

    service.produce(&topic, b"hello");

    let acknowledged = wait_for(TEST_TIMEOUT, || {
        let (delivered, failed) = service.delivery_stats().unwrap_or((0, 0));
        delivered + failed == 1
    });
    assert!(acknowledged, "delivery report never arrived");

    let (delivered, failed) = service.delivery_stats().expect("producer initialized");
    assert_eq!(delivered, 1, "expected a successful delivery");
    assert_eq!(failed, 0);
    assert!(service.producer_healthy(), "metadata probe failed");

    service.shutdown();
    println!("delivery acknowledged exactly once\n");
    Ok(())
}

/// Produce to an unreachable cluster and expect exactly one failure report
pub async fn test_delivery_report_failure() -> TestResult {
    println!("=== Test: Delivery Report (broker error) ===");

    let service = create_service();
    // Unroutable address with a short message timeout, so the broker
    // client gives up quickly and reports the failure.
    let settings = kafka_service::ProducerSettings::brokers("localhost:1")
        .set("message.timeout.ms", "3000");
    service.init_producer(settings)?;

    service.produce("smoke-unreachable", b"doomed");

    let acknowledged = wait_for(TEST_TIMEOUT, || {
        let (delivered, failed) = service.delivery_stats().unwrap_or((0, 0));
        delivered + failed == 1
    });
    assert!(acknowledged, "failure report never arrived");

    let (delivered, failed) = service.delivery_stats().expect("producer initialized");
    assert_eq!(failed, 1, "expected a broker-reported failure");
    assert_eq!(delivered, 0);

    service.shutdown();
    println!("failure acknowledged exactly once\n");
    Ok(())
}
