use reqwest::StatusCode;
use shared::error::CatalogError;
use thiserror::Error;

/// Failure of a single round trip to the compiler service.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error! status: {status}")]
    Status { status: StatusCode, url: String },
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid compiler service url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl TransportError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Request { source, .. } => source.status(),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to fetch compiler catalog: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid compiler catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("compiler catalog has not been loaded")]
    NotLoaded,
}
