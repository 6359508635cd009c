use thiserror::Error;

/// Failure reported by the object store client: network, auth or service
/// errors, formatted at the call site that observed them.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DiskError {
    #[error("listing failed under `{prefix}`")]
    ListingFailed {
        prefix: String,
        #[source]
        source: RemoteError,
    },

    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("{op} failed for `{key}`")]
    OperationFailed {
        op: &'static str,
        key: String,
        #[source]
        source: RemoteError,
    },

    #[error("listing cancelled under `{prefix}`")]
    Cancelled { prefix: String },
}

pub type Result<T> = std::result::Result<T, DiskError>;
