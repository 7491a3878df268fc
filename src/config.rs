use crate::error::ExporterError;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Environment variable consulted when the config file has no username
pub const USER_ENV: &str = "TPLINK_USER";
/// Environment variable consulted when the config file has no password
pub const PASSWORD_ENV: &str = "TPLINK_PASSWORD";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub switches: SwitchConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,

    // Flat layout with `devices`, `user` and `password` at the top level.
    // Folded into `switches` by `merge_flat_layout`.
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SwitchConfig {
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
    #[serde(default)]
    pub verify_ssl: bool,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScrapeConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

/// Resolved login credentials shared by every device session
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9797
}

fn default_use_tls() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_idle_connections() -> usize {
    20
}

fn default_concurrency() -> usize {
    20
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            user: None,
            password: None,
            use_tls: default_use_tls(),
            verify_ssl: false,
            timeout_seconds: default_timeout_seconds(),
            max_idle_connections: default_max_idle_connections(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

impl SwitchConfig {
    /// Fill a missing or empty username/password from `lookup`
    ///
    /// `lookup` is keyed by [`USER_ENV`] and [`PASSWORD_ENV`]. Values already
    /// present in the file always win.
    pub fn resolve_credentials<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let user_missing = self.user.as_deref().is_none_or(str::is_empty);
        let password_missing = self
            .password
            .as_ref()
            .is_none_or(|p| p.expose_secret().is_empty());

        if !user_missing && !password_missing {
            return;
        }

        tracing::info!("Username or password missing from config file, trying environment");

        if user_missing {
            if let Some(user) = lookup(USER_ENV).filter(|u| !u.is_empty()) {
                self.user = Some(user);
            }
        }
        if password_missing {
            if let Some(password) = lookup(PASSWORD_ENV).filter(|p| !p.is_empty()) {
                self.password = Some(SecretString::from(password));
            }
        }
    }

    /// Credentials for device login, or a configuration error if either half is absent
    pub fn credentials(&self) -> crate::error::Result<Credentials> {
        let username = self.user.as_deref().filter(|u| !u.is_empty());
        let password = self
            .password
            .as_ref()
            .filter(|p| !p.expose_secret().is_empty());

        match (username, password) {
            (Some(username), Some(password)) => Ok(Credentials {
                username: username.to_string(),
                password: password.clone(),
            }),
            _ => Err(ExporterError::Config(format!(
                "switch credentials missing: set switches.user and switches.password or {} and {}",
                USER_ENV, PASSWORD_ENV
            ))),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("TPLINK_EXPORTER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("switches.devices")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.merge_flat_layout();
        config
            .switches
            .resolve_credentials(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Fill gaps in `switches` from the flat top-level keys
    ///
    /// Values under `switches` win. Empty strings count as missing.
    pub fn merge_flat_layout(&mut self) {
        if self.switches.devices.is_empty() {
            self.switches.devices = std::mem::take(&mut self.devices);
        }
        if self.switches.user.as_deref().is_none_or(str::is_empty) {
            if let Some(user) = self.user.take() {
                self.switches.user = Some(user);
            }
        }
        let password_missing = self
            .switches
            .password
            .as_ref()
            .is_none_or(|p| p.expose_secret().is_empty());
        if password_missing {
            if let Some(password) = self.password.take() {
                self.switches.password = Some(password);
            }
        }
    }

    /// Check the startup preconditions: devices, credentials and a usable pool size
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.switches.devices.is_empty() {
            return Err(ExporterError::Config(
                "no devices configured: add hostnames to devices or switches.devices".to_string(),
            ));
        }
        if self.switches.devices.iter().any(|d| d.trim().is_empty()) {
            return Err(ExporterError::Config(
                "switches.devices contains an empty hostname".to_string(),
            ));
        }

        self.switches.credentials()?;

        if self.scrape.concurrency == 0 {
            return Err(ExporterError::Config(
                "scrape.concurrency must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
