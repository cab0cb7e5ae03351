//! Host-side errors

use inlay_protocol::CellId;
use thiserror::Error;

/// Errors raised on the host side of the boundary.
#[derive(Debug, Error)]
pub enum HostError {
    /// The worker's inbound channel is closed.
    #[error("worker is no longer running")]
    WorkerGone,

    /// The render library rejected an operation.
    #[error("render library error: {reason}")]
    Library {
        /// The library's failure description.
        reason: String,
    },

    /// A patch arrived for a bridge that has already been released.
    #[error("sync bridge for cell '{cell}' has been released")]
    BridgeReleased {
        /// The cell whose bridge is gone.
        cell: CellId,
    },

    /// Patch or payload (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HostError {
    /// Wrap a render-library failure description.
    pub fn library(reason: impl Into<String>) -> Self {
        Self::Library {
            reason: reason.into(),
        }
    }
}
