//! Mock TP-Link switch for integration tests
//!
//! Serves the `/data/*.json` endpoints over plain HTTP on an ephemeral port and
//! records every call it receives.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tplink_exporter::config::{Config, ScrapeConfig, SwitchConfig};

pub const USER: &str = "admin";
pub const PASSWORD: &str = "secret";
pub const TID: &str = "a1b2c3d4";

/// Tracks how many logins are being served at the same time across mocks
#[derive(Default)]
pub struct Concurrency {
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

#[derive(Default)]
pub struct MockSwitch {
    /// Endpoint file (e.g. `systemSummaryConfig.json`) answered with HTTP 500
    pub fail_at: Option<&'static str>,
    /// Endpoint file answered with `success: false`
    pub reject_at: Option<&'static str>,
    pub login_delay: Option<Duration>,
    pub concurrency: Option<Arc<Concurrency>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockSwitch {
    pub fn healthy() -> Self {
        Self::default()
    }

    pub fn failing_at(endpoint: &'static str) -> Self {
        Self {
            fail_at: Some(endpoint),
            ..Default::default()
        }
    }

    pub fn rejecting(endpoint: &'static str) -> Self {
        Self {
            reject_at: Some(endpoint),
            ..Default::default()
        }
    }

    /// Endpoint files called so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == endpoint).count()
    }
}

/// Start `mock` on 127.0.0.1 and return its `host:port`
pub async fn spawn_switch(mock: Arc<MockSwitch>) -> String {
    let app = Router::new()
        .route("/data/{file}", post(handle))
        .with_state(mock);
    serve(app).await
}

/// Serve any router on an ephemeral local port
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock listener");
    let addr = listener.local_addr().expect("Mock listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr.to_string()
}

/// Exporter config pointing at `hosts` over plain HTTP
pub fn config_for(hosts: Vec<String>, concurrency: usize) -> Config {
    Config {
        switches: SwitchConfig {
            devices: hosts,
            user: Some(USER.to_string()),
            password: Some(SecretString::from(PASSWORD)),
            use_tls: false,
            timeout_seconds: 5,
            ..Default::default()
        },
        scrape: ScrapeConfig { concurrency },
        ..Default::default()
    }
}

async fn handle(
    State(mock): State<Arc<MockSwitch>>,
    Path(file): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    mock.calls.lock().unwrap().push(file.clone());

    if mock.fail_at == Some(file.as_str()) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    if mock.reject_at == Some(file.as_str()) {
        return Json(json!({"success": false, "errorcode": -1})).into_response();
    }

    if file == "login.json" {
        return login(&mock, &body).await;
    }

    if query.get("_tid_").map(String::as_str) != Some(TID)
        || query.get("usrLvl").map(String::as_str) != Some("1")
    {
        return Json(json!({"success": false, "errorcode": 401, "timeout": true})).into_response();
    }

    let port = body.get("port").and_then(Value::as_str).unwrap_or_default();
    let data = match file.as_str() {
        "systemSummaryConfig.json" => system_summary(),
        "port.json" => json!([
            {"port": "1/0/1", "state": 1, "speedCfg": 0, "speedLink": 3, "linkStatus": 1},
            {"port": "1/0/2", "state": 1, "speedCfg": 0, "speedLink": 2, "linkStatus": 1},
            {"port": "1/0/3", "state": 1, "speedCfg": 0, "speedLink": 0, "linkStatus": 0},
        ]),
        "trafficMonitorCfgDetailModel.json" => traffic(port),
        "vlanPortDetailCfg.json" => match port {
            "1/0/1" => json!([
                {"key": 1, "name": "default", "vlanId": 1},
                {"key": 2, "name": "iot", "vlanId": 20},
            ]),
            "1/0/3" => json!([]),
            _ => json!([{"key": 1, "name": "default", "vlanId": 1}]),
        },
        "vlanPortCfg.json" => json!([
            {"key": "1/0/1", "pvid": 1, "ingress_check": 1, "frame_type": 0, "lag": "---"},
            {"key": "1/0/2", "pvid": 20, "ingress_check": 0, "frame_type": 1, "lag": "LAG1"},
            {"key": "1/0/9", "pvid": 30, "ingress_check": 0, "frame_type": 0, "lag": "---"},
        ]),
        "vlanMacCfgModel.json" => json!({"ports": "1/0/2,1/0/8"}),
        "vlanMacCfg.json" => json!([
            {"key": "1", "mac": "AA-BB-CC-DD-EE-FF", "note": "printer", "vlanId": 20, "vlanName": "iot"},
        ]),
        "memoryInfo.json" => json!({"memory": [42.0, 40.0, 41.0]}),
        "cpuInfo.json" => json!({"cpu": [7.0, 9.0]}),
        _ => return (StatusCode::NOT_FOUND, "unknown endpoint").into_response(),
    };

    Json(json!({"data": data, "success": true, "errorcode": 0, "timeout": false})).into_response()
}

async fn login(mock: &MockSwitch, body: &Value) -> Response {
    if let Some(tracker) = &mock.concurrency {
        let now = tracker.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        tracker.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }
    if let Some(delay) = mock.login_delay {
        tokio::time::sleep(delay).await;
    }
    if let Some(tracker) = &mock.concurrency {
        tracker.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    let valid = body.get("username") == Some(&json!(USER))
        && body.get("password") == Some(&json!(PASSWORD))
        && body.get("operation") == Some(&json!("write"));
    if !valid {
        return Json(json!({"success": false, "errorcode": 1})).into_response();
    }

    Json(json!({
        "data": {"_tid_": TID, "usrLvl": 1, "pwdNeedChange": 0},
        "success": true,
        "errorcode": 0
    }))
    .into_response()
}

fn system_summary() -> Value {
    json!({
        "dev_name": "core-switch",
        "dev_loc": "rack-2",
        "contact_info": "noc@example.com",
        "sys_description": "JetStream 24-Port Gigabit L2 Managed Switch",
        "fw_version": "2.0.5 Build 20230220",
        "hw_version": "T2600G-28TS 3.0",
        "bl_version": "1.0.0",
        "mac_address": "00-11-22-33-44-55",
        "se_number": "2217123000123",
        "sys_time": "2024-01-01 10:00:00",
        "run_time": "3 day - 4 hour - 5 min - 6 sec",
        "fan_speed": "",
        "temperature": 41.0,
        "max_temp": 75.0,
        "snmp_sta": 1
    })
}

fn traffic(port: &str) -> Value {
    match port {
        "1/0/1" => json!({
            "pktsRx": "1,234",
            "pktsTx": 5678,
            "bytesRx": "98,765,432",
            "bytesTx": "12,345",
            "errorsRx": "0",
            "errorsTx": "2",
            "broadcastRx": "1,000",
            "broadcastTx": "10",
            "multicastRx": "200",
            "multicastTx": "20",
            "unicastRx": "34",
            "unicastTx": "5,648",
            "undersizePkts": "N/A",
            "Pkts64": "12"
        }),
        _ => json!({
            "pktsRx": "10",
            "pktsTx": "20",
            "errorsRx": "0",
            "errorsTx": "0",
            "broadcastRx": "1",
            "broadcastTx": "1",
            "multicastRx": "1",
            "multicastTx": "1",
            "unicastRx": "8",
            "unicastTx": "18"
        }),
    }
}
