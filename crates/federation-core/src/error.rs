//! Management error types

use federation_proxy::TransportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManagementError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Broker returned error: {status} - {message}")]
    Broker { status: u16, message: String },

    #[error("Failed to update upstream set {set} in vhost {vhost}: {source}")]
    SetUpdate {
        vhost: String,
        set: String,
        #[source]
        source: Box<ManagementError>,
    },
}

impl ManagementError {
    /// The underlying error with any context wrappers removed
    pub fn root(&self) -> &ManagementError {
        match self {
            ManagementError::SetUpdate { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the broker reported the resource as absent
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), ManagementError::NotFound(_))
    }
}
