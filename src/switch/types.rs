//! Switch Web API Type Definitions
//!
//! Wire types for the JSON management API served by TP-Link managed switches under
//! `/data/*.json`. Every endpoint answers with the same envelope ([`ApiResponse`])
//! whose `data` member carries the endpoint-specific payload.
//!
//! # Design Notes
//!
//! - **Typed once**: tables such as `vlanPortCfg.json` are decoded into typed rows and
//!   then merged into port records by key, instead of walking untyped maps.
//! - **Serde Defaults**: firmware revisions omit fields freely, so nearly every field
//!   carries `#[serde(default)]`.
//! - Per-port counters decode straight into [`PortCounters`](super::record::PortCounters),
//!   and VLAN rows into [`VlanMembership`](super::record::VlanMembership) and
//!   [`MacVlanBinding`](super::record::MacVlanBinding).
//!
//! # API Endpoints Covered
//!
//! - `login.json` → [`LoginData`]
//! - `systemSummaryConfig.json` → [`SystemSummary`]
//! - `port.json` → [`PortEntry`]
//! - `vlanPortCfg.json` → [`VlanPortCfgRow`]
//! - `vlanMacCfgModel.json` → [`MacVlanModel`]
//! - `memoryInfo.json` → [`MemoryInfo`]
//! - `cpuInfo.json` → [`CpuInfo`]

use crate::error::{ExporterError, Result};
use serde::Deserialize;

/// Response envelope shared by every endpoint
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub errorcode: i64,
    #[serde(default)]
    pub timeout: bool,
}

fn default_success() -> bool {
    true
}

impl<T> ApiResponse<T> {
    /// Unwrap the payload, turning a rejected or timed-out call into an error
    pub fn into_data(self, endpoint: &str) -> Result<T> {
        if self.timeout {
            return Err(ExporterError::SwitchApi(format!(
                "{} reported a session timeout",
                endpoint
            )));
        }
        if !self.success {
            return Err(ExporterError::SwitchApi(format!(
                "{} rejected the request (errorcode {})",
                endpoint, self.errorcode
            )));
        }
        self.data
            .ok_or_else(|| ExporterError::SwitchApi(format!("{} returned no data", endpoint)))
    }
}

/// Session returned by `login.json`
#[derive(Debug, Deserialize)]
pub struct LoginData {
    #[serde(rename = "_tid_", default)]
    pub tid: String,
    #[serde(rename = "usrLvl", default)]
    pub usr_lvl: i64,
    #[serde(rename = "pwdNeedChange", default)]
    pub pwd_need_change: i64,
}

/// Device identity from `systemSummaryConfig.json`
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SystemSummary {
    pub dev_name: String,
    pub dev_loc: String,
    pub contact_info: String,
    pub sys_description: String,
    pub fw_version: String,
    pub hw_version: String,
    pub bl_version: String,
    pub mac_address: String,
    pub se_number: String,
    pub sys_time: String,
    pub run_time: String,
    pub fan_speed: String,
    pub temperature: f64,
    pub max_temp: f64,
}

/// One physical port from `port.json`
///
/// `speed_link` is the raw firmware code: 0 and 1 = no rated link, 2 = 100M, 3 = 1000M.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortEntry {
    pub port: String,
    #[serde(default)]
    pub state: i64,
    #[serde(default)]
    pub speed_cfg: i64,
    #[serde(default)]
    pub speed_link: i64,
    #[serde(default)]
    pub duplex_cfg: i64,
    #[serde(default)]
    pub duplex_link: i64,
    #[serde(default)]
    pub flow_control: i64,
    #[serde(default)]
    pub link_status: i64,
    #[serde(default)]
    pub media_type: i64,
}

/// Row of the device-wide `vlanPortCfg.json` table, keyed by port identifier
#[derive(Debug, Deserialize)]
pub struct VlanPortCfgRow {
    pub key: String,
    #[serde(default)]
    pub pvid: u32,
    #[serde(default)]
    pub ingress_check: i64,
    #[serde(default)]
    pub frame_type: i64,
    #[serde(default)]
    pub lag: String,
}

/// MAC-VLAN enrollment from `vlanMacCfgModel.json`
#[derive(Debug, Deserialize, Default)]
pub struct MacVlanModel {
    /// Comma-separated port identifiers, e.g. `"1/0/2,1/0/7"`
    #[serde(default)]
    pub ports: String,
}

impl MacVlanModel {
    pub fn enrolled_ports(&self) -> impl Iterator<Item = &str> {
        self.ports
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct MemoryInfo {
    #[serde(default)]
    pub memory: Vec<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CpuInfo {
    #[serde(default)]
    pub cpu: Vec<f64>,
}
