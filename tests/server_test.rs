//! Server integration tests
//!
//! Tests for HTTP endpoints, served in-process against mock switches.

mod common;

use common::{config_for, serve, spawn_switch, MockSwitch};
use std::sync::Arc;
use tplink_exporter::error::ExporterError;
use tplink_exporter::scrape::Scraper;
use tplink_exporter::server;

/// Start the exporter for `hosts` and return its base URL
async fn start_exporter(hosts: Vec<String>) -> String {
    let scraper = Scraper::new(&config_for(hosts, 20)).expect("Failed to build scraper");
    let addr = serve(server::router(scraper)).await;
    format!("http://{}", addr)
}

async fn get(url: &str) -> (u16, String) {
    let response = reqwest::get(url).await.expect("Request failed");
    let status = response.status().as_u16();
    let body = response.text().await.expect("Body not readable");
    (status, body)
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    // Given: An exporter in front of one healthy switch
    let host = spawn_switch(Arc::new(MockSwitch::healthy())).await;
    let base = start_exporter(vec![host.clone()]).await;

    // When: Scraping /metrics
    let (status, body) = get(&format!("{}/metrics", base)).await;

    // Then: Output is Prometheus text with the switch's series
    assert_eq!(status, 200);
    assert!(body.contains("# HELP"), "Missing HELP comment");
    assert!(body.contains("# TYPE"), "Missing TYPE comment");
    assert!(body.contains(&format!("port_rx_metric{{host=\"{}\",portnum=\"1\"}} 1234", host)));
    assert!(body.contains(&format!("port_speed_metric{{host=\"{}\",portnum=\"2\"}} 100", host)));
    assert!(body.contains("switch_generalinfo_metric{"));
    assert!(body.contains("tplink_exporter_devices_scraped 1"));
}

#[tokio::test]
async fn test_each_metrics_request_runs_a_cycle() {
    // Given: An exporter in front of one switch
    let mock = Arc::new(MockSwitch::healthy());
    let host = spawn_switch(mock.clone()).await;
    let base = start_exporter(vec![host]).await;

    // When: Scraping twice
    get(&format!("{}/metrics", base)).await;
    get(&format!("{}/metrics", base)).await;

    // Then: The switch was logged into once per scrape
    assert_eq!(mock.call_count("login.json"), 2);
}

#[tokio::test]
async fn test_failing_switch_omitted_without_error() {
    // Given: One healthy and one broken switch
    let good = spawn_switch(Arc::new(MockSwitch::healthy())).await;
    let bad = spawn_switch(Arc::new(MockSwitch::failing_at("systemSummaryConfig.json"))).await;
    let base = start_exporter(vec![good.clone(), bad.clone()]).await;

    // When: Scraping /metrics
    let (status, body) = get(&format!("{}/metrics", base)).await;

    // Then: Still 200, with only the healthy switch present
    assert_eq!(status, 200);
    assert!(body.contains(&format!("host=\"{}\"", good)));
    assert!(!body.contains(&format!("host=\"{}\"", bad)));
    assert!(body.contains("tplink_exporter_devices_configured 2"));
    assert!(body.contains("tplink_exporter_devices_scraped 1"));
}

#[tokio::test]
async fn test_health_follows_last_cycle() {
    // Given: An exporter whose only switch is broken
    let bad = spawn_switch(Arc::new(MockSwitch::failing_at("login.json"))).await;
    let base = start_exporter(vec![bad]).await;

    // Then: Healthy before any scrape
    let (status, body) = get(&format!("{}/health", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body, "OK");

    // When: A scrape reaches no switch
    get(&format!("{}/metrics", base)).await;

    // Then: Health reports unavailable
    let (status, _) = get(&format!("{}/health", base)).await;
    assert_eq!(status, 503);
}

#[tokio::test]
async fn test_root_links_endpoints() {
    let host = spawn_switch(Arc::new(MockSwitch::healthy())).await;
    let base = start_exporter(vec![host]).await;

    let (status, body) = get(&base).await;

    assert_eq!(status, 200);
    assert!(body.contains("href=\"/metrics\""));
    assert!(body.contains("href=\"/health\""));
}

#[tokio::test]
async fn test_start_reports_bind_failure() {
    // Given: A port already taken by another listener
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let port = taken.local_addr().unwrap().port();

    let mut config = config_for(vec!["sw1.lan".to_string()], 20);
    config.server.addr = "127.0.0.1".to_string();
    config.server.port = port;

    // When: Starting the exporter on it
    let err = server::start(config).await.unwrap_err();

    // Then: The failure is a server error naming the address
    let exporter_err = err
        .downcast_ref::<ExporterError>()
        .expect("Should be an ExporterError");
    assert!(matches!(exporter_err, ExporterError::Server(_)));
    assert!(err.to_string().contains(&format!("127.0.0.1:{}", port)));
}
