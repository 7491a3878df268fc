//! Prometheus Metrics Definitions
//!
//! This module defines the Prometheus metrics exposed by the TP-Link exporter and
//! projects scraped [`DeviceRecord`]s onto them.
//!
//! # Metric Categories
//!
//! ## Port Metrics (labels: portnum, host)
//! - Packet counts (`port_rx_metric`, `port_tx_metric`)
//! - Bad packets (`port_badrx_metric`, `port_badtx_metric`)
//! - Broadcast / multicast / unicast breakdowns
//! - Normalized link speed (`port_speed_metric`, 0/100/1000)
//! - VLAN membership (`port_vlans_metric`, VLAN names and ids as labels)
//!
//! ## Switch Metrics
//! - Memory and CPU utilization (labels: host, macaddress)
//! - General information (`switch_generalinfo_metric`), descriptive labels with the
//!   temperature as its value
//!
//! ## Exporter Metrics
//! - Configured vs. scraped device counts and cycle duration (`tplink_exporter_` prefix)
//!
//! Metric names other than the exporter's own keep their historical, un-prefixed
//! form so existing dashboards keep working.

use crate::scrape::CycleReport;
use crate::switch::{DeviceRecord, DisplayValue, PortRecord};
use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const PORT_LABELS: &[&str] = &["portnum", "host"];

/// Metrics collector for TP-Link switches
///
/// Built fresh for each `/metrics` request, so a render only ever shows the devices
/// of a single scrape cycle.
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,

    // Port metrics
    pub port_rx_packets: Arc<GaugeVec>,
    pub port_tx_packets: Arc<GaugeVec>,
    pub port_speed: Arc<GaugeVec>,
    pub port_vlans: Arc<GaugeVec>,
    pub port_rx_bad_packets: Arc<GaugeVec>,
    pub port_tx_bad_packets: Arc<GaugeVec>,
    pub port_rx_broadcast_packets: Arc<GaugeVec>,
    pub port_tx_broadcast_packets: Arc<GaugeVec>,
    pub port_rx_multicast_packets: Arc<GaugeVec>,
    pub port_tx_multicast_packets: Arc<GaugeVec>,
    pub port_rx_unicast_packets: Arc<GaugeVec>,
    pub port_tx_unicast_packets: Arc<GaugeVec>,

    // Switch metrics
    pub switch_memory: Arc<GaugeVec>,
    pub switch_cpu: Arc<GaugeVec>,
    pub switch_general_info: Arc<GaugeVec>,

    // Exporter metrics
    pub devices_configured: Arc<Gauge>,
    pub devices_scraped: Arc<Gauge>,
    pub scrape_duration_seconds: Arc<Gauge>,
}

fn port_gauge(name: &str, help: &str) -> prometheus::Result<GaugeVec> {
    GaugeVec::new(Opts::new(name, help), PORT_LABELS)
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Port metrics
        let port_tx_packets = port_gauge("port_tx_metric", "Shows tx packets on the hosts port")?;
        let port_rx_packets = port_gauge("port_rx_metric", "Shows rx packets on the hosts port")?;
        let port_speed = port_gauge("port_speed_metric", "Shows the hosts port speed")?;

        let port_vlans = GaugeVec::new(
            Opts::new("port_vlans_metric", "Shows the vlans on port number"),
            &["vlanname", "vlanid", "host", "port"],
        )?;

        let port_rx_bad_packets =
            port_gauge("port_badrx_metric", "Shows bad rx packets on the hosts port")?;
        let port_tx_bad_packets =
            port_gauge("port_badtx_metric", "Shows bad tx packets on the hosts port")?;
        let port_rx_broadcast_packets = port_gauge(
            "port_broadcastrx_metric",
            "Shows broadcast rx packets the hosts port",
        )?;
        let port_tx_broadcast_packets = port_gauge(
            "port_broadcasttx_metric",
            "Shows broadcast tx packets on the hosts port",
        )?;
        let port_rx_multicast_packets = port_gauge(
            "port_multicastrx_metric",
            "Shows multicast rx packets on the hosts port",
        )?;
        let port_tx_multicast_packets = port_gauge(
            "port_multicasttx_metric",
            "Shows multicast tx packets on the hosts port",
        )?;
        let port_rx_unicast_packets = port_gauge(
            "port_unicastrx_metric",
            "Shows unicast rx packets on the hosts port",
        )?;
        let port_tx_unicast_packets = port_gauge(
            "port_unicasttx_metric",
            "Shows unicast tx packets on the hosts port",
        )?;

        // Switch metrics
        let switch_memory = GaugeVec::new(
            Opts::new("switch_memory_metric", "Shows the specific switch memory"),
            &["host", "macaddress"],
        )?;

        let switch_cpu = GaugeVec::new(
            Opts::new("switch_cpu_metric", "Shows the specific switch cpu"),
            &["host", "macaddress"],
        )?;

        let switch_general_info = GaugeVec::new(
            Opts::new(
                "switch_generalinfo_metric",
                "Shows general information about the switch with temperature as a metric",
            ),
            &[
                "devloc",
                "sysdesc",
                "host",
                "hwversion",
                "fmversion",
                "macaddress",
                "systime",
                "runtime",
                "serialnum",
            ],
        )?;

        // Exporter metrics
        let devices_configured = Gauge::with_opts(
            Opts::new("devices_configured", "Number of switches in the configuration")
                .namespace("tplink_exporter"),
        )?;

        let devices_scraped = Gauge::with_opts(
            Opts::new(
                "devices_scraped",
                "Number of switches scraped successfully in this cycle",
            )
            .namespace("tplink_exporter"),
        )?;

        let scrape_duration_seconds = Gauge::with_opts(
            Opts::new(
                "scrape_duration_seconds",
                "Wall-clock duration of the scrape cycle",
            )
            .namespace("tplink_exporter"),
        )?;

        // Register all metrics
        registry.register(Box::new(port_tx_packets.clone()))?;
        registry.register(Box::new(port_rx_packets.clone()))?;
        registry.register(Box::new(port_speed.clone()))?;
        registry.register(Box::new(port_vlans.clone()))?;
        registry.register(Box::new(port_rx_bad_packets.clone()))?;
        registry.register(Box::new(port_tx_bad_packets.clone()))?;
        registry.register(Box::new(port_rx_broadcast_packets.clone()))?;
        registry.register(Box::new(port_tx_broadcast_packets.clone()))?;
        registry.register(Box::new(port_rx_multicast_packets.clone()))?;
        registry.register(Box::new(port_tx_multicast_packets.clone()))?;
        registry.register(Box::new(port_rx_unicast_packets.clone()))?;
        registry.register(Box::new(port_tx_unicast_packets.clone()))?;
        registry.register(Box::new(switch_memory.clone()))?;
        registry.register(Box::new(switch_cpu.clone()))?;
        registry.register(Box::new(switch_general_info.clone()))?;
        registry.register(Box::new(devices_configured.clone()))?;
        registry.register(Box::new(devices_scraped.clone()))?;
        registry.register(Box::new(scrape_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            port_rx_packets: Arc::new(port_rx_packets),
            port_tx_packets: Arc::new(port_tx_packets),
            port_speed: Arc::new(port_speed),
            port_vlans: Arc::new(port_vlans),
            port_rx_bad_packets: Arc::new(port_rx_bad_packets),
            port_tx_bad_packets: Arc::new(port_tx_bad_packets),
            port_rx_broadcast_packets: Arc::new(port_rx_broadcast_packets),
            port_tx_broadcast_packets: Arc::new(port_tx_broadcast_packets),
            port_rx_multicast_packets: Arc::new(port_rx_multicast_packets),
            port_tx_multicast_packets: Arc::new(port_tx_multicast_packets),
            port_rx_unicast_packets: Arc::new(port_rx_unicast_packets),
            port_tx_unicast_packets: Arc::new(port_tx_unicast_packets),
            switch_memory: Arc::new(switch_memory),
            switch_cpu: Arc::new(switch_cpu),
            switch_general_info: Arc::new(switch_general_info),
            devices_configured: Arc::new(devices_configured),
            devices_scraped: Arc::new(devices_scraped),
            scrape_duration_seconds: Arc::new(scrape_duration_seconds),
        })
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Set exporter self-metrics from a finished cycle
    pub fn record_cycle(&self, report: &CycleReport, elapsed: Duration) {
        self.devices_configured.set(report.attempted as f64);
        self.devices_scraped.set(report.records.len() as f64);
        self.scrape_duration_seconds.set(elapsed.as_secs_f64());
    }

    /// Project device records onto the switch and port gauges
    pub fn record_devices(&self, devices: &[DeviceRecord]) {
        for device in devices {
            self.record_device(device);
        }
    }

    fn record_device(&self, device: &DeviceRecord) {
        let host = device.host.as_str();
        let system = &device.system;
        let mac = system.mac_address.as_str();

        if let Some(memory) = system.memory.first() {
            self.switch_memory.with_label_values(&[host, mac]).set(*memory);
        }
        if let Some(cpu) = system.cpu.first() {
            self.switch_cpu.with_label_values(&[host, mac]).set(*cpu);
        }

        self.switch_general_info
            .with_label_values(&[
                system.location.as_str(),
                system.description.as_str(),
                host,
                system.hardware_version.as_str(),
                system.firmware_version.as_str(),
                mac,
                system.system_time.as_str(),
                system.uptime.as_str(),
                system.serial_number.as_str(),
            ])
            .set(system.temperature);

        for port in &device.ports {
            self.record_port(host, port);
        }
    }

    fn record_port(&self, host: &str, port: &PortRecord) {
        let Some(number) = port.number() else {
            debug!(host, port = %port.id, "Port id has no port number, skipping");
            return;
        };
        let portnum = number.to_string();
        let labels = [portnum.as_str(), host];
        let counters = &port.counters;

        let set_counter = |gauge: &GaugeVec, value: &DisplayValue| match value.as_f64() {
            Some(v) => gauge.with_label_values(&labels).set(v),
            None => debug!(host, port = %port.id, "Non-numeric counter {:?}, skipping", value),
        };

        set_counter(&self.port_rx_packets, &counters.rx_packets);
        set_counter(&self.port_tx_packets, &counters.tx_packets);
        set_counter(&self.port_rx_bad_packets, &counters.rx_errors);
        set_counter(&self.port_tx_bad_packets, &counters.tx_errors);
        set_counter(&self.port_rx_broadcast_packets, &counters.rx_broadcast);
        set_counter(&self.port_tx_broadcast_packets, &counters.tx_broadcast);
        set_counter(&self.port_rx_multicast_packets, &counters.rx_multicast);
        set_counter(&self.port_tx_multicast_packets, &counters.tx_multicast);
        set_counter(&self.port_rx_unicast_packets, &counters.rx_unicast);
        set_counter(&self.port_tx_unicast_packets, &counters.tx_unicast);

        self.port_speed
            .with_label_values(&labels)
            .set(port.link_speed.mbps() as f64);

        let names: Vec<&str> = port.vlans.iter().map(|v| v.name.as_str()).collect();
        let ids: Vec<String> = port.vlans.iter().map(|v| v.vlan_id.to_string()).collect();
        let names = names.join(",");
        let ids = ids.join(",");
        self.port_vlans
            .with_label_values(&[names.as_str(), ids.as_str(), host, portnum.as_str()])
            .set(number as f64);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics collector")
    }
}
