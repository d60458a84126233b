//! # Container Access Layer
//!
//! Read-only access to the hierarchical "meta" files written by detector
//! control software. The resolvers never talk to a storage library directly;
//! they only rely on the small [`Container`] contract defined here:
//!
//! - named nested groups and typed datasets addressed by `/`-separated paths
//! - the list of top-level children
//! - one exhaustive depth-first traversal of every path
//!
//! Two backends implement it:
//!
//! - [`MemoryContainer`]: an in-memory tree, loadable from a JSON dump. Always built.
//! - `Hdf5Container`: real HDF5 files through `libhdf5` (cargo feature `hdf5`).
//!
//! ## Example
//!
//! ```rust
//! use metafile::container::{Container, Data, MemoryContainer};
//!
//! let container = MemoryContainer::builder()
//!     .dataset("_dectris/nimages", Data::Int(vec![100]))
//!     .build()?;
//!
//! assert_eq!(container.root_members()?, vec!["_dectris".to_string()]);
//! assert_eq!(container.walk()?, vec!["_dectris", "_dectris/nimages"]);
//! # Ok::<(), metafile::container::ContainerError>(())
//! ```

mod error;
#[cfg(feature = "hdf5")]
mod h5;
#[cfg(any(feature = "hdf5", test))]
mod links;
mod memory;
mod value;

use std::path::Path;

pub use error::ContainerError;
#[cfg(feature = "hdf5")]
pub use h5::Hdf5Container;
pub use memory::{MemoryContainer, MemoryContainerBuilder};
pub use value::{Data, DatasetValue, ScalarValue};

/// Kind of node found at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A group holding further named members
    Group,
    /// A typed dataset
    Dataset,
}

/// Read-only handle over a hierarchical container.
///
/// Paths are relative to the root (`entry/data`), an optional leading `/`
/// is accepted. Implementations must not change their contents while a
/// handle is borrowed by a resolver.
pub trait Container {
    /// Identity of the underlying file or session
    fn name(&self) -> String;

    /// Names of the top-level children, in iteration order
    fn root_members(&self) -> Result<Vec<String>, ContainerError>;

    /// Kind of the node at `path`, or `None` if nothing lives there
    fn kind(&self, path: &str) -> Result<Option<NodeKind>, ContainerError>;

    /// Names of the members of the group at `path`
    fn members(&self, path: &str) -> Result<Vec<String>, ContainerError>;

    /// Raw contents of the dataset at `path`
    fn read(&self, path: &str) -> Result<DatasetValue, ContainerError>;

    /// Every node path below the root, depth-first pre-order, members visited
    /// in ascending name order
    fn walk(&self) -> Result<Vec<String>, ContainerError>;
}

/// Strip the optional leading and trailing separators from a path
pub(crate) fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}

/// Open a container file, choosing the backend from the file extension.
///
/// - `.json` files are loaded as [`MemoryContainer`] dumps
/// - `.h5`, `.hdf5` and `.nxs` files need the `hdf5` feature
pub fn open<P: AsRef<Path>>(path: P) -> Result<Box<dyn Container>, ContainerError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => Ok(Box::new(MemoryContainer::open(path)?)),
        #[cfg(feature = "hdf5")]
        Some("h5") | Some("hdf5") | Some("nxs") => Ok(Box::new(Hdf5Container::open(path)?)),
        _ => Err(ContainerError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/entry/data/"), "entry/data");
        assert_eq!(normalize_path("entry"), "entry");
        assert_eq!(normalize_path("/"), "");
    }

    #[test]
    fn test_open_json_dump() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
        write!(
            file,
            r#"{{"wavelength": {{"kind": "dataset", "dtype": "float", "data": [0.9763]}}}}"#
        )?;

        let container = open(file.path())?;
        assert_eq!(container.walk()?, vec!["wavelength".to_string()]);
        Ok(())
    }

    #[test]
    fn test_open_unknown_extension() {
        let result = open("run_meta.tiff");
        assert!(matches!(result, Err(ContainerError::UnsupportedFormat(_))));
    }
}
