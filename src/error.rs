use crate::switch::ScrapeStep;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Switch API error: {0}")]
    SwitchApi(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("{step} failed for {host}: {source}")]
    Scrape {
        host: String,
        step: ScrapeStep,
        #[source]
        source: Box<ExporterError>,
    },
}

impl ExporterError {
    /// Step at which a device session was aborted, if this is a scrape failure
    pub fn step(&self) -> Option<ScrapeStep> {
        match self {
            ExporterError::Scrape { step, .. } => Some(*step),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
