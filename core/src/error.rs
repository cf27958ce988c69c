//! Error types for the portsync-core library.

use thiserror::Error;

use crate::application::{AppliedPort, PortOperation};

/// Result type alias for portsync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling configuration ports with host mappings.
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration document could not be parsed as XML.
    #[error("Failed to parse configuration document: {0}")]
    ParseError(String),

    /// The current port mappings could not be fetched or decoded.
    #[error("Failed to fetch port mappings: {0}")]
    Fetch(String),

    /// A request to the port-manager failed or was rejected.
    #[error("Port manager request failed: {0}")]
    Request(String),

    /// A port mapping entry was not of the form `host:container`.
    #[error("Invalid port mapping entry: '{0}'")]
    InvalidMapping(String),

    /// An add or remove call failed. Operations in `applied` went through
    /// before the failure and were not rolled back.
    #[error("Failed to {operation} port {port}: {reason}")]
    Apply {
        operation: PortOperation,
        port: u16,
        applied: Vec<AppliedPort>,
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
