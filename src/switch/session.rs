//! Device Session
//!
//! Scrapes one switch: log in, then walk a fixed sequence of read calls, filling a
//! [`DeviceRecord`] as it goes. Steps run strictly in order because every call after
//! login needs the session token, and the per-port calls need the port inventory.
//!
//! A failing step aborts the session. The partially filled record is dropped with
//! the session and never handed back.

use crate::config::Credentials;
use crate::error::{ExporterError, Result};
use crate::switch::client::SwitchClient;
use crate::switch::record::{
    DeviceRecord, MacVlanBinding, PortCounters, PortRecord, SessionToken, SystemInfo,
    VlanMembership,
};
use crate::switch::types::{
    CpuInfo, LoginData, MacVlanModel, MemoryInfo, PortEntry, SystemSummary, VlanPortCfgRow,
};
use secrecy::ExposeSecret;
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// One step of a device session, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrapeStep {
    Authenticate,
    SystemSummary,
    PortInventory,
    PortStatistics,
    PortVlans,
    PortVlanConfig,
    MacVlanBindings,
    Memory,
    Cpu,
}

impl ScrapeStep {
    pub const ALL: [ScrapeStep; 9] = [
        ScrapeStep::Authenticate,
        ScrapeStep::SystemSummary,
        ScrapeStep::PortInventory,
        ScrapeStep::PortStatistics,
        ScrapeStep::PortVlans,
        ScrapeStep::PortVlanConfig,
        ScrapeStep::MacVlanBindings,
        ScrapeStep::Memory,
        ScrapeStep::Cpu,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScrapeStep::Authenticate => "login",
            ScrapeStep::SystemSummary => "system summary",
            ScrapeStep::PortInventory => "port inventory",
            ScrapeStep::PortStatistics => "port statistics",
            ScrapeStep::PortVlans => "port vlans",
            ScrapeStep::PortVlanConfig => "port vlan config",
            ScrapeStep::MacVlanBindings => "mac vlan bindings",
            ScrapeStep::Memory => "memory",
            ScrapeStep::Cpu => "cpu",
        }
    }
}

impl fmt::Display for ScrapeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scrape lifecycle of a single switch
pub struct DeviceSession<'a> {
    client: &'a SwitchClient,
    credentials: &'a Credentials,
    record: DeviceRecord,
}

impl<'a> DeviceSession<'a> {
    pub fn new(client: &'a SwitchClient, credentials: &'a Credentials, host: String) -> Self {
        Self {
            client,
            credentials,
            record: DeviceRecord {
                host,
                ..Default::default()
            },
        }
    }

    pub fn host(&self) -> &str {
        &self.record.host
    }

    /// Run every step in order and return the populated record
    ///
    /// On failure the error is [`ExporterError::Scrape`], naming the host and the
    /// step that aborted the session.
    pub async fn run(mut self) -> Result<DeviceRecord> {
        for step in ScrapeStep::ALL {
            debug!(host = %self.record.host, "Running step: {}", step);
            if let Err(e) = self.execute(step).await {
                return Err(ExporterError::Scrape {
                    host: self.record.host,
                    step,
                    source: Box::new(e),
                });
            }
        }
        Ok(self.record)
    }

    async fn execute(&mut self, step: ScrapeStep) -> Result<()> {
        match step {
            ScrapeStep::Authenticate => self.authenticate().await,
            ScrapeStep::SystemSummary => self.read_system_summary().await,
            ScrapeStep::PortInventory => self.read_port_inventory().await,
            ScrapeStep::PortStatistics => self.read_port_statistics().await,
            ScrapeStep::PortVlans => self.read_port_vlans().await,
            ScrapeStep::PortVlanConfig => self.read_port_vlan_config().await,
            ScrapeStep::MacVlanBindings => self.read_mac_vlan_bindings().await,
            ScrapeStep::Memory => self.read_memory().await,
            ScrapeStep::Cpu => self.read_cpu().await,
        }
    }

    async fn fetch<T>(&self, endpoint: &str, body: serde_json::Value) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.client
            .fetch(&self.record.host, endpoint, &self.record.session, &body)
            .await
    }

    async fn authenticate(&mut self) -> Result<()> {
        let body = json!({
            "username": self.credentials.username,
            "password": self.credentials.password.expose_secret(),
            "operation": "write",
        });
        let response = self
            .client
            .call::<LoginData>(&self.record.host, "login.json", None, &body)
            .await?;

        if !response.success || response.errorcode != 0 {
            return Err(ExporterError::Auth(format!(
                "login rejected by {} (errorcode {})",
                self.record.host, response.errorcode
            )));
        }

        let login = response
            .data
            .filter(|d| !d.tid.is_empty())
            .ok_or_else(|| {
                ExporterError::Auth(format!(
                    "{} returned no transaction id",
                    self.record.host
                ))
            })?;

        if login.pwd_need_change != 0 {
            warn!(host = %self.record.host, "Switch asks for a password change");
        }

        self.record.session = SessionToken {
            transaction_id: login.tid,
            permission_level: login.usr_lvl,
        };
        Ok(())
    }

    async fn read_system_summary(&mut self) -> Result<()> {
        let summary: SystemSummary = self
            .fetch(
                "systemSummaryConfig.json",
                json!({"operation": "read", "tab": "unit1"}),
            )
            .await?;
        self.record.system = SystemInfo::from(summary);
        Ok(())
    }

    async fn read_port_inventory(&mut self) -> Result<()> {
        let entries: Vec<PortEntry> = self
            .fetch(
                "port.json",
                json!({"operation": "load", "special": "display", "tab": "unit1"}),
            )
            .await?;

        let mut ports: Vec<PortRecord> = Vec::with_capacity(entries.len());
        for entry in entries {
            if ports.iter().any(|p| p.id == entry.port) {
                warn!(host = %self.record.host, port = %entry.port, "Duplicate port in inventory, ignoring");
                continue;
            }
            ports.push(PortRecord::from(entry));
        }
        self.record.ports = ports;
        Ok(())
    }

    async fn read_port_statistics(&mut self) -> Result<()> {
        for index in 0..self.record.ports.len() {
            let body = json!({"operation": "read", "port": self.record.ports[index].id});
            let counters: PortCounters = self
                .fetch("trafficMonitorCfgDetailModel.json", body)
                .await?;
            self.record.ports[index].counters = counters;
        }
        Ok(())
    }

    async fn read_port_vlans(&mut self) -> Result<()> {
        for index in 0..self.record.ports.len() {
            let body = json!({"operation": "load", "port": self.record.ports[index].id});
            let vlans: Vec<VlanMembership> = self.fetch("vlanPortDetailCfg.json", body).await?;
            self.record.ports[index].vlans = vlans;
        }
        Ok(())
    }

    async fn read_port_vlan_config(&mut self) -> Result<()> {
        let rows: Vec<VlanPortCfgRow> = self
            .fetch(
                "vlanPortCfg.json",
                json!({"operation": "load", "tab": "unit1"}),
            )
            .await?;

        let by_port: HashMap<&str, &VlanPortCfgRow> =
            rows.iter().map(|row| (row.key.as_str(), row)).collect();
        for port in &mut self.record.ports {
            if let Some(row) = by_port.get(port.id.as_str()) {
                port.apply_vlan_config(row);
            }
        }
        Ok(())
    }

    async fn read_mac_vlan_bindings(&mut self) -> Result<()> {
        let model: MacVlanModel = self
            .fetch(
                "vlanMacCfgModel.json",
                json!({"operation": "read", "tab": "unit1"}),
            )
            .await?;

        let mut enrolled: Vec<usize> = model
            .enrolled_ports()
            .filter_map(|id| self.record.ports.iter().position(|p| p.id == id))
            .collect();
        enrolled.sort_unstable();
        enrolled.dedup();

        for index in enrolled {
            let body = json!({"operation": "load", "port": self.record.ports[index].id});
            let bindings: Vec<MacVlanBinding> = self.fetch("vlanMacCfg.json", body).await?;
            self.record.ports[index].mac_vlans = bindings;
        }
        Ok(())
    }

    async fn read_memory(&mut self) -> Result<()> {
        let info: MemoryInfo = self
            .fetch("memoryInfo.json", json!({"unit": "unit1"}))
            .await?;
        self.record.system.memory = info.memory;
        Ok(())
    }

    async fn read_cpu(&mut self) -> Result<()> {
        let info: CpuInfo = self.fetch("cpuInfo.json", json!({"unit": "unit1"})).await?;
        self.record.system.cpu = info.cpu;
        Ok(())
    }
}
