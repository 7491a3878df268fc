pub mod client;
pub mod record;
pub mod session;
pub mod types;

pub use client::SwitchClient;
pub use record::{DeviceRecord, DisplayValue, LinkSpeed, PortRecord, SessionToken, SystemInfo};
pub use session::{DeviceSession, ScrapeStep};
