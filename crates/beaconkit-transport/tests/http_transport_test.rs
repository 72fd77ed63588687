//! Integration tests for the HTTP transmitter, exercised against a mock
//! server (native target only — the wasm32 `fetch` path has no host
//! environment to mock outside a real browser).

#![cfg(not(target_arch = "wasm32"))]

use std::time::Duration;

use beaconkit_core::retry::BackoffStrategy;
use beaconkit_protocol::Batch;
use beaconkit_transport::http::{HttpTransmitterConfig, RetryPolicy};
use beaconkit_transport::{HttpTransmitter, Transmitter};

#[tokio::test]
async fn delivers_an_empty_batch_successfully() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path("/v1/batch"))
        .respond_with(wiremock::ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let transmitter =
        HttpTransmitter::new(format!("{}/v1/batch", server.uri())).expect("build transmitter");
    let batch = Batch::new(vec![], 0);
    transmitter.send(&batch).await.expect("delivery");
}

#[tokio::test]
async fn gives_up_after_configured_retries() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .respond_with(wiremock::ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = HttpTransmitterConfig {
        endpoint: server.uri(),
        timeout: Duration::from_secs(5),
        retry_policy: RetryPolicy::builder()
            .max_retries(1)
            .initial_delay(Duration::from_millis(1))
            .max_delay(Duration::from_millis(5))
            .build(),
    };
    let transmitter = HttpTransmitter::with_config(config).expect("build transmitter");
    let batch = Batch::new(vec![], 0);
    assert!(transmitter.send(&batch).await.is_err());
}

#[test]
fn retry_policy_matches_the_one_second_doubling_contract() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_retries(), 3);

    let delay_0 = policy.calculate_delay(0);
    let delay_1 = policy.calculate_delay(1);
    let delay_2 = policy.calculate_delay(2);

    assert!(delay_0 >= Duration::from_millis(900) && delay_0 <= Duration::from_millis(1100));
    assert!(delay_1 >= Duration::from_millis(1800) && delay_1 <= Duration::from_millis(2200));
    assert!(delay_2 >= Duration::from_millis(3600) && delay_2 <= Duration::from_millis(4400));
}
