//! End-to-end tests over a real socket.

use std::sync::Arc;
use std::time::Duration;

use observability_lab::client::LabClient;
use serde_json::json;

mod common;

#[tokio::test]
async fn test_serves_and_shuts_down() {
    let (addr, shutdown) = common::start_server(common::test_config()).await;
    let client = LabClient::new(&format!("http://{}", addr));

    let res = client.health().await.expect("server unreachable");
    assert_eq!(res.status, 200);
    assert_eq!(
        res.body,
        json!({ "ok": true, "service": "lab-test", "env": "test" })
    );

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(client.health().await.is_err(), "server still accepting");
}

#[tokio::test]
async fn test_request_id_generated_and_propagated() {
    let (addr, shutdown) = common::start_server(common::test_config()).await;
    let base = format!("http://{}", addr);

    let res = LabClient::new(&base).hello(0).await.unwrap();
    let generated = res.request_id.expect("missing x-request-id");
    assert!(uuid::Uuid::parse_str(&generated).is_ok());

    let res = reqwest::Client::new()
        .get(format!("{}/health", base))
        .header("x-request-id", "caller-supplied-42")
        .send()
        .await
        .unwrap();
    assert_eq!(
        res.headers().get("x-request-id").unwrap(),
        "caller-supplied-42"
    );

    shutdown.trigger();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_request_does_not_block_others() {
    let (addr, shutdown) = common::start_server(common::test_config()).await;
    let client = Arc::new(LabClient::new(&format!("http://{}", addr)));

    let slow = {
        let client = client.clone();
        tokio::spawn(async move { client.slow(11, false).await })
    };
    let blocking_hello = {
        let client = client.clone();
        tokio::spawn(async move { client.hello(300).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let health = client.health().await.unwrap();
    assert_eq!(health.status, 200);
    assert!(
        health.elapsed < Duration::from_millis(250),
        "health waited {:?}",
        health.elapsed
    );

    let slow = slow.await.unwrap().unwrap();
    assert_eq!(slow.body, json!({ "result": 121, "cache": false }));
    assert!(slow.elapsed >= Duration::from_millis(800));
    assert_eq!(blocking_hello.await.unwrap().unwrap().status, 200);

    shutdown.trigger();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_burst_summary_counts_every_request() {
    let mut config = common::test_config();
    config.compute.delay_ms = 5;
    let (addr, shutdown) = common::start_server(config).await;
    let client = Arc::new(LabClient::new(&format!("http://{}", addr)));

    let summary = LabClient::burst(client, 40, 8, 1.0).await;
    assert_eq!(summary.transport_errors, 0);
    assert_eq!(summary.statuses.get(&200), Some(&30));
    assert_eq!(summary.statuses.get(&500), Some(&10));

    shutdown.trigger();
}
