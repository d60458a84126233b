use crate::container::ContainerError;

/// Errors raised while resolving metadata facts.
///
/// A fact that is simply not present is not an error: getters return
/// `Ok(None)` for it.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A node the getter requires does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The node exists but its value does not have the required shape or type
    #[error("Malformed value at {path}: {reason}")]
    MalformedValue {
        /// Path of the offending node
        path: String,
        /// What was wrong with it
        reason: String,
    },

    /// The serialized configuration blob could not be decoded
    #[error("Decode error at offset {offset}: {message}")]
    DecodeError {
        /// Byte offset into the blob
        offset: usize,
        /// Description of the failure
        message: String,
    },

    /// Error reported by the container backend
    #[error("Container error: {0}")]
    ContainerError(#[source] ContainerError),
}

impl ResolveError {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ResolveError::MalformedValue {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<ContainerError> for ResolveError {
    fn from(err: ContainerError) -> Self {
        match err {
            ContainerError::NotFound(path) => ResolveError::NotFound(path),
            other => ResolveError::ContainerError(other),
        }
    }
}
