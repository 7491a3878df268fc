//! Scrape Results
//!
//! In-memory records produced by one scrape cycle. A [`DeviceRecord`] is built
//! fresh by a device session and dropped at the next cycle; nothing here outlives
//! a single `/metrics` request.

use crate::switch::types::{PortEntry, SystemSummary, VlanPortCfgRow};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Aggregate scrape result for one switch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceRecord {
    /// Hostname exactly as configured
    pub host: String,
    pub session: SessionToken,
    pub system: SystemInfo,
    pub ports: Vec<PortRecord>,
}

/// Transaction id and permission level handed out by `login.json`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionToken {
    pub transaction_id: String,
    pub permission_level: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemInfo {
    pub device_name: String,
    pub description: String,
    pub location: String,
    pub contact: String,
    pub firmware_version: String,
    pub hardware_version: String,
    pub bootloader_version: String,
    pub mac_address: String,
    pub serial_number: String,
    pub system_time: String,
    pub uptime: String,
    pub fan_speed: String,
    pub temperature: f64,
    pub max_temperature: f64,
    /// Memory utilization samples, most recent first
    pub memory: Vec<f64>,
    /// CPU utilization samples, most recent first
    pub cpu: Vec<f64>,
}

impl From<SystemSummary> for SystemInfo {
    fn from(summary: SystemSummary) -> Self {
        Self {
            device_name: summary.dev_name,
            description: summary.sys_description,
            location: summary.dev_loc,
            contact: summary.contact_info,
            firmware_version: summary.fw_version,
            hardware_version: summary.hw_version,
            bootloader_version: summary.bl_version,
            mac_address: summary.mac_address,
            serial_number: summary.se_number,
            system_time: summary.sys_time,
            uptime: summary.run_time,
            fan_speed: summary.fan_speed,
            temperature: summary.temperature,
            max_temperature: summary.max_temp,
            memory: Vec::new(),
            cpu: Vec::new(),
        }
    }
}

/// Aggregate scrape result for one physical port
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortRecord {
    /// Slash-delimited identifier, e.g. `1/0/12`
    pub id: String,
    pub state: i64,
    pub speed_config: i64,
    pub duplex_config: i64,
    pub duplex_link: i64,
    pub flow_control: i64,
    pub link_status: i64,
    pub media_type: i64,
    pub link_speed: LinkSpeed,
    pub counters: PortCounters,
    pub vlans: Vec<VlanMembership>,
    pub mac_vlans: Vec<MacVlanBinding>,
    pub vlan_config: PortVlanConfig,
}

impl PortRecord {
    /// Numeric port number taken from the last segment of the identifier
    pub fn number(&self) -> Option<u32> {
        port_number(&self.id)
    }

    pub fn apply_vlan_config(&mut self, row: &VlanPortCfgRow) {
        self.vlan_config = PortVlanConfig {
            pvid: row.pvid,
            ingress_check: row.ingress_check != 0,
            frame_type: row.frame_type,
            lag: row.lag.clone(),
        };
    }
}

impl From<PortEntry> for PortRecord {
    fn from(entry: PortEntry) -> Self {
        Self {
            link_speed: LinkSpeed::from_code(entry.speed_link),
            id: entry.port,
            state: entry.state,
            speed_config: entry.speed_cfg,
            duplex_config: entry.duplex_cfg,
            duplex_link: entry.duplex_link,
            flow_control: entry.flow_control,
            link_status: entry.link_status,
            media_type: entry.media_type,
            ..Default::default()
        }
    }
}

/// Administrative VLAN settings of a port from `vlanPortCfg.json`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortVlanConfig {
    /// Default (port) VLAN id
    pub pvid: u32,
    pub ingress_check: bool,
    pub frame_type: i64,
    /// Link-aggregation group label, `---` when the port is not aggregated
    pub lag: String,
}

/// VLAN a port is a member of
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VlanMembership {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "vlanId", default)]
    pub vlan_id: u32,
}

/// MAC address bound to a VLAN on a MAC-VLAN enrolled port
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MacVlanBinding {
    #[serde(default)]
    pub mac: String,
    #[serde(rename = "vlanId", default)]
    pub vlan_id: u32,
    #[serde(rename = "vlanName", default)]
    pub vlan_name: String,
    #[serde(default)]
    pub note: String,
}

/// Normalized link speed
///
/// Firmware reports a speed code; only 100M and 1000M are rated; everything else
/// (link down, 10M, unknown codes) is reported as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkSpeed {
    #[default]
    Unrated,
    Mbps100,
    Mbps1000,
}

impl LinkSpeed {
    /// Map a raw `speedLink` code. Unrecognized codes fall back to
    /// [`LinkSpeed::Unrated`] instead of failing the scrape.
    pub fn from_code(code: i64) -> Self {
        match code {
            2 => LinkSpeed::Mbps100,
            3 => LinkSpeed::Mbps1000,
            _ => LinkSpeed::Unrated,
        }
    }

    pub fn mbps(self) -> u32 {
        match self {
            LinkSpeed::Unrated => 0,
            LinkSpeed::Mbps100 => 100,
            LinkSpeed::Mbps1000 => 1000,
        }
    }
}

/// Port number from an identifier shaped `unit/slot/port`
///
/// Returns `None` unless there are exactly three segments and the last one is numeric.
pub fn port_number(id: &str) -> Option<u32> {
    let mut segments = id.split('/');
    let (_, _, port) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }
    port.trim().parse().ok()
}

/// A counter as shown by the switch web UI
///
/// The traffic monitor renders counters for display (`"1,234"`). Values that still
/// fail to parse once the grouping separators are removed are kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayValue {
    Number(f64),
    Text(String),
}

impl DisplayValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DisplayValue::Number(n) => Some(*n),
            DisplayValue::Text(_) => None,
        }
    }

    fn from_number(n: f64) -> Self {
        if n.is_finite() && n >= 0.0 {
            DisplayValue::Number(n)
        } else {
            DisplayValue::Text(n.to_string())
        }
    }
}

impl Default for DisplayValue {
    fn default() -> Self {
        DisplayValue::Number(0.0)
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Number(n) => write!(f, "{}", n),
            DisplayValue::Text(s) => f.write_str(s),
        }
    }
}

/// Parse a comma-grouped decimal such as `"1,234"`; keep the input as text otherwise
pub fn parse_display_number(raw: &str) -> DisplayValue {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    match cleaned.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => DisplayValue::Number(n),
        _ => DisplayValue::Text(raw.to_string()),
    }
}

impl<'de> Deserialize<'de> for DisplayValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(n) => DisplayValue::from_number(n),
                None => DisplayValue::Text(n.to_string()),
            },
            serde_json::Value::String(s) => parse_display_number(&s),
            other => DisplayValue::Text(other.to_string()),
        })
    }
}

/// Traffic counters from `trafficMonitorCfgDetailModel.json`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PortCounters {
    #[serde(rename = "pktsRx")]
    pub rx_packets: DisplayValue,
    #[serde(rename = "pktsTx")]
    pub tx_packets: DisplayValue,
    #[serde(rename = "bytesRx")]
    pub rx_bytes: DisplayValue,
    #[serde(rename = "bytesTx")]
    pub tx_bytes: DisplayValue,
    #[serde(rename = "errorsRx")]
    pub rx_errors: DisplayValue,
    #[serde(rename = "errorsTx")]
    pub tx_errors: DisplayValue,
    #[serde(rename = "broadcastRx")]
    pub rx_broadcast: DisplayValue,
    #[serde(rename = "broadcastTx")]
    pub tx_broadcast: DisplayValue,
    #[serde(rename = "multicastRx")]
    pub rx_multicast: DisplayValue,
    #[serde(rename = "multicastTx")]
    pub tx_multicast: DisplayValue,
    #[serde(rename = "unicastRx")]
    pub rx_unicast: DisplayValue,
    #[serde(rename = "unicastTx")]
    pub tx_unicast: DisplayValue,
    #[serde(rename = "oversizePktsRx")]
    pub rx_oversize: DisplayValue,
    #[serde(rename = "oversizePktsTx")]
    pub tx_oversize: DisplayValue,
    #[serde(rename = "undersizePkts")]
    pub undersize: DisplayValue,
    #[serde(rename = "Pkts64")]
    pub pkts_64: DisplayValue,
    #[serde(rename = "Pkts65")]
    pub pkts_65_to_127: DisplayValue,
    #[serde(rename = "Pkts128")]
    pub pkts_128_to_255: DisplayValue,
    #[serde(rename = "Pkts256")]
    pub pkts_256_to_511: DisplayValue,
    #[serde(rename = "Pkts512")]
    pub pkts_512_to_1023: DisplayValue,
    #[serde(rename = "Pkts1023")]
    pub pkts_1024_plus: DisplayValue,
}
