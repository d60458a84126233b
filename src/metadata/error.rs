use crate::resolver::ResolveError;

/// Errors that can occur while assembling or serializing metadata
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// A resolver getter failed
    #[error("Failed to resolve metadata: {0}")]
    ResolveError(#[from] ResolveError),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}
