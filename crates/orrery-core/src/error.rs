//! Error types for Orrery

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed geometry, date or id input. Never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A collaborator (ephemeris, chart store, life theme) failed.
    #[error("Service error: {0}")]
    Service(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Cache backend failure. The cache manager logs and drops these.
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// True for the kinds produced by collaborators rather than by our own input checks
    pub fn is_service(&self) -> bool {
        matches!(self, Error::Service(_) | Error::ServiceUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
