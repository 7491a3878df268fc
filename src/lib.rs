//! TP-Link Switch Prometheus Exporter
//!
//! A Prometheus metrics exporter for TP-Link managed switches that expose the JSON
//! web management API (`/data/*.json`).
//!
//! # Overview
//!
//! Each Prometheus scrape of `/metrics` logs into every configured switch, reads its
//! system summary, port inventory, per-port traffic counters, VLAN and MAC-VLAN
//! configuration, and memory/CPU utilization, then renders the result as gauges.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   HTTPS JSON (POST)  ┌──────────────┐
//! │  Switch 1   │ ◄──────────────────► │   Exporter   │
//! └─────────────┘                      │              │
//! ┌─────────────┐                      │  ┌────────┐  │      HTTP      ┌────────────┐
//! │  Switch N   │ ◄──────────────────► │  │ Scrape │  │ ◄────────────► │ Prometheus │
//! └─────────────┘   up to 20 at once   │  └────────┘  │   /metrics     └────────────┘
//!                                      │  ┌────────┐  │
//!                                      │  │Metrics │  │
//!                                      │  └────────┘  │
//!                                      └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`switch`] - HTTP client, device session, API types and scrape records
//! - [`scrape`] - Bounded concurrent scrape of all configured switches
//! - [`metrics`] - Prometheus metric definitions and projection
//! - [`server`] - HTTP server
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use tplink_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod scrape;
pub mod server;
pub mod switch;
