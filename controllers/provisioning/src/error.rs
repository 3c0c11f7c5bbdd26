//! Controller-specific error types.
//!
//! Store failures keep their own taxonomy in [`StoreError`]; this enum wraps
//! them together with the failures that only the controller process can hit.

use kube::Error as KubeError;
use resource_store::StoreError;
use thiserror::Error;

/// Errors that can occur in the Provisioning Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error outside the resource store (client setup, watches)
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Resource store read/write failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Object handed to the reconciler has no name or namespace
    #[error("Object key missing: {0}")]
    MissingObjectKey(String),

    /// Owner reference could not be derived from the Provisioning instance
    #[error("Owner reference unavailable: {0}")]
    OwnerReference(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),

    /// Metrics registration or encoding failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Probe server I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
