//! Scrape Orchestrator
//!
//! Runs one [`DeviceSession`] per configured switch, at most `concurrency` at a time,
//! and waits for every session to finish before handing back the records of the
//! sessions that succeeded.
//!
//! # Error Handling
//!
//! Device failures never fail the cycle. Each one is logged with its host and the
//! step that aborted it, and the device simply contributes no record.

use crate::config::{Config, Credentials};
use crate::error::Result;
use crate::switch::{DeviceRecord, DeviceSession, SwitchClient};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Outcome of one scrape cycle
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Number of sessions dispatched, one per configured device
    pub attempted: usize,
    /// Records of the sessions that completed every step, in completion order
    pub records: Vec<DeviceRecord>,
}

impl CycleReport {
    pub fn failed(&self) -> usize {
        self.attempted - self.records.len()
    }

    /// False only when devices were attempted and none of them answered
    pub fn any_success(&self) -> bool {
        self.attempted == 0 || !self.records.is_empty()
    }
}

/// Everything a scrape cycle needs, built once at startup
#[derive(Debug, Clone)]
pub struct Scraper {
    client: Arc<SwitchClient>,
    credentials: Arc<Credentials>,
    devices: Arc<[String]>,
    concurrency: usize,
}

impl Scraper {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: Arc::new(SwitchClient::new(&config.switches)?),
            credentials: Arc::new(config.switches.credentials()?),
            devices: config.switches.devices.iter().cloned().collect(),
            concurrency: config.scrape.concurrency,
        })
    }

    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    /// Scrape every configured device once
    pub async fn scrape(&self) -> CycleReport {
        run_cycle(
            Arc::clone(&self.client),
            Arc::clone(&self.credentials),
            &self.devices,
            self.concurrency,
        )
        .await
    }
}

/// Dispatch one session per device onto a pool of `concurrency` workers
///
/// Returns once every dispatched session has succeeded or failed.
pub async fn run_cycle(
    client: Arc<SwitchClient>,
    credentials: Arc<Credentials>,
    devices: &[String],
    concurrency: usize,
) -> CycleReport {
    info!(devices = devices.len(), "Scanning all devices");

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles = Vec::with_capacity(devices.len());

    for host in devices {
        let semaphore = Arc::clone(&semaphore);
        let client = Arc::clone(&client);
        let credentials = Arc::clone(&credentials);
        let host = host.clone();

        let handle = tokio::spawn(async move {
            let _permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!(host = %host, "Worker pool closed before session start: {}", e);
                    return None;
                }
            };

            match DeviceSession::new(&client, &credentials, host.clone()).run().await {
                Ok(record) => Some(record),
                Err(e) => {
                    let step = e.step().map(|s| s.as_str()).unwrap_or("session");
                    warn!(host = %host, step, "Skipping device this cycle: {}", e);
                    None
                }
            }
        });

        handles.push(handle);
    }

    let mut records = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => warn!("Device session task failed: {}", e),
        }
    }

    let report = CycleReport {
        attempted: devices.len(),
        records,
    };
    info!(
        devices = report.attempted,
        scraped = report.records.len(),
        failed = report.failed(),
        "Scrape cycle finished"
    );
    report
}
