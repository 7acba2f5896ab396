//! Data-backed route providers, registered best-effort at startup.
//!
//! Each backend implements the same generate contract as the synthetic
//! providers. A backend that cannot initialize is logged and left out of
//! the registry; a backend that fails at request time degrades that request
//! to a direct line. Startup never fails because a backend is unavailable.

pub mod graph;
pub mod remote;
pub mod spatial_db;

use thiserror::Error;

/// Why a candidate backend could not be registered at startup.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("failed to read network file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid network definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("road network is empty")]
    EmptyNetwork,
    #[error("network node {0} has invalid coordinates")]
    InvalidNode(u64),
    #[error("edge references unknown node {0}")]
    MissingNode(u64),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("road database is missing the {0} table")]
    MissingSchema(&'static str),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
