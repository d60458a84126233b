use std::path::PathBuf;

/// Errors raised by container backends
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// I/O error opening or reading the container file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON dump could not be parsed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// No node exists at the given path
    #[error("No such node: {0}")]
    NotFound(String),

    /// The node exists but is a group where a dataset was required
    #[error("Not a dataset: {0}")]
    NotADataset(String),

    /// The node exists but is a dataset where a group was required
    #[error("Not a group: {0}")]
    NotAGroup(String),

    /// Container content does not follow the expected layout
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// No backend is available for the file
    #[error("Unsupported container format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Error reported by the HDF5 library
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5Error(#[from] hdf5::Error),
}
