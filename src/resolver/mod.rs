//! # Metadata Resolution
//!
//! Detector vendors store the same logical facts (image count, pixel
//! geometry, sensor, applied corrections) under different and unstable
//! paths. Resolvers find them by substring search over a memoized listing of
//! every node path, then read and decode the value found there.
//!
//! - [`MetadataResolver`]: the shared primitives (path search, scalar reads)
//! - [`TriggerDetectorResolver`]: trigger-based area detectors
//! - [`EventDetectorResolver`]: event-driven timing detectors, organised in modules
//!
//! Facts that are not present come back as `Ok(None)`; errors are reserved
//! for files that break the minimal layout a getter depends on.
//!
//! ## Example
//!
//! ```rust
//! use metafile::container::{Data, MemoryContainer};
//! use metafile::resolver::TriggerDetectorResolver;
//!
//! let container = MemoryContainer::builder()
//!     .dataset("_dectris/nimages", Data::Int(vec![1]))
//!     .dataset("_dectris/ntrigger", Data::Int(vec![50]))
//!     .dataset("_dectris/wavelength", Data::Float(vec![0.9763]))
//!     .build()?;
//!
//! let resolver = TriggerDetectorResolver::new(&container);
//! assert_eq!(resolver.image_count()?, Some(50));
//! assert_eq!(resolver.wavelength()?, Some(0.9763));
//! assert_eq!(resolver.find_threshold_energy()?, None);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
pub mod event;
pub mod keys;
pub mod literal;
mod tree;
pub mod trigger;


use std::fmt;

use serde::{Deserialize, Serialize};

use crate::container::{Container, DatasetValue, NodeKind, ScalarValue};

pub use error::ResolveError;
pub use event::EventDetectorResolver;
pub use tree::TreeIndex;
pub use trigger::{ConfigValue, SensorInfo, TriggerDetectorResolver};

/// Path of a marker node paired with the path of its "applied" companion
pub type MarkerPaths = (Option<String>, Option<String>);

/// Generic path search and value extraction over one container.
///
/// Borrows the container for its whole lifetime and never closes it.
pub struct MetadataResolver<'a> {
    index: TreeIndex<'a>,
}

impl<'a> MetadataResolver<'a> {
    /// Wrap an open container
    pub fn new(container: &'a dyn Container) -> Self {
        Self {
            index: TreeIndex::new(container),
        }
    }

    /// The underlying container
    pub fn container(&self) -> &'a dyn Container {
        self.index.container()
    }

    /// The memoized path listing
    pub fn index(&self) -> &TreeIndex<'a> {
        &self.index
    }

    /// Every node path in traversal order
    pub fn paths(&self) -> Result<&[String], ResolveError> {
        self.index.paths()
    }

    /// Number of top-level members
    pub fn len(&self) -> Result<usize, ResolveError> {
        Ok(self.container().root_members()?.len())
    }

    /// True when the container root has no members
    pub fn is_empty(&self) -> Result<bool, ResolveError> {
        Ok(self.len()? == 0)
    }

    /// Raw contents of the dataset at `path`
    pub fn get(&self, path: &str) -> Result<DatasetValue, ResolveError> {
        Ok(self.container().read(path)?)
    }

    /// First path, in traversal order, whose text contains `needle`.
    ///
    /// Traversal order is the only tie-break between several matches.
    pub fn find_first_path_containing(&self, needle: &str) -> Result<Option<&str>, ResolveError> {
        Ok(self
            .paths()?
            .iter()
            .find(|path| path.contains(needle))
            .map(String::as_str))
    }

    /// Every path containing `needle`, in traversal order
    pub fn find_all_paths_containing(&self, needle: &str) -> Result<Vec<&str>, ResolveError> {
        Ok(self
            .paths()?
            .iter()
            .filter(|path| path.contains(needle))
            .map(String::as_str)
            .collect())
    }

    /// Read the single value stored at `path`.
    ///
    /// Single-element arrays are unwrapped and byte strings decoded to text.
    /// Fails with [`ResolveError::NotFound`] for a missing node and
    /// [`ResolveError::MalformedValue`] when the dataset does not hold
    /// exactly one element.
    pub fn read_scalar(&self, path: &str) -> Result<ScalarValue, ResolveError> {
        let value = self.get(path)?;
        value.single().ok_or_else(|| {
            ResolveError::malformed(
                path,
                format!("expected a single element, found {}", value.len()),
            )
        })
    }

    /// Scalar at the first path containing `needle`, or `None` if no path matches
    pub fn read_first_match_scalar(
        &self,
        needle: &str,
    ) -> Result<Option<ScalarValue>, ResolveError> {
        match self.find_first_path_containing(needle)? {
            Some(path) => Ok(Some(self.read_scalar(path)?)),
            None => Ok(None),
        }
    }

    /// Scalars at every path containing `needle`, or `None` if no path matches
    pub fn read_all_match_scalars(
        &self,
        needle: &str,
    ) -> Result<Option<Vec<(&str, ScalarValue)>>, ResolveError> {
        let paths = self.find_all_paths_containing(needle)?;
        if paths.is_empty() {
            return Ok(None);
        }
        paths
            .into_iter()
            .map(|path| Ok((path, self.read_scalar(path)?)))
            .collect::<Result<Vec<_>, ResolveError>>()
            .map(Some)
    }

    /// Whether a top-level member named `name` exists and has the given kind
    pub(crate) fn has_root_member(
        &self,
        name: &str,
        kind: Option<NodeKind>,
    ) -> Result<bool, ResolveError> {
        if !self.container().root_members()?.iter().any(|m| m == name) {
            return Ok(false);
        }
        match kind {
            Some(kind) => Ok(self.container().kind(name)? == Some(kind)),
            None => Ok(true),
        }
    }

    /// Whether the container has a `mask` node
    pub fn has_mask(&self) -> Result<bool, ResolveError> {
        self.index.has_marker(keys::MASK)
    }

    /// Whether the container has a `flatfield` node
    pub fn has_flatfield(&self) -> Result<bool, ResolveError> {
        self.index.has_marker(keys::FLATFIELD)
    }

    /// Locate a marker node and its "applied" companion.
    ///
    /// Returns `(None, None)` without the marker; otherwise the marker path
    /// (compared case-insensitively) and the first path containing
    /// `companion`, if any.
    pub(crate) fn find_marker(
        &self,
        marker: &str,
        companion: &str,
    ) -> Result<MarkerPaths, ResolveError> {
        if !self.index.has_marker(marker)? {
            return Ok((None, None));
        }
        let marker_path = self
            .paths()?
            .iter()
            .find(|path| path.to_lowercase() == marker)
            .cloned();
        let companion_path = self
            .find_first_path_containing(companion)?
            .map(str::to_string);
        Ok((marker_path, companion_path))
    }

    pub(crate) fn expect_i64(path: &str, value: &ScalarValue) -> Result<i64, ResolveError> {
        value.as_i64().ok_or_else(|| {
            ResolveError::malformed(path, format!("expected an integer, found {}", value.type_name()))
        })
    }

    pub(crate) fn expect_f64(path: &str, value: &ScalarValue) -> Result<f64, ResolveError> {
        value.as_f64().ok_or_else(|| {
            ResolveError::malformed(path, format!("expected a number, found {}", value.type_name()))
        })
    }

    /// First match read as an integer
    pub(crate) fn first_match_i64(&self, needle: &str) -> Result<Option<i64>, ResolveError> {
        match self.find_first_path_containing(needle)? {
            Some(path) => Ok(Some(Self::expect_i64(path, &self.read_scalar(path)?)?)),
            None => Ok(None),
        }
    }

    /// First match read as a float
    pub(crate) fn first_match_f64(&self, needle: &str) -> Result<Option<f64>, ResolveError> {
        match self.find_first_path_containing(needle)? {
            Some(path) => Ok(Some(Self::expect_f64(path, &self.read_scalar(path)?)?)),
            None => Ok(None),
        }
    }

    /// Every match read as a float
    pub(crate) fn all_matches_f64(&self, needle: &str) -> Result<Option<Vec<f64>>, ResolveError> {
        match self.read_all_match_scalars(needle)? {
            Some(values) => values
                .iter()
                .map(|(path, value)| Self::expect_f64(path, value))
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            None => Ok(None),
        }
    }

    /// First matching path, owned
    pub(crate) fn first_path(&self, needle: &str) -> Result<Option<String>, ResolveError> {
        Ok(self.find_first_path_containing(needle)?.map(str::to_string))
    }
}

impl fmt::Display for MetadataResolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File {} opened in 'r' mode.", self.container().name())
    }
}

/// Detector families with a dedicated resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    /// Trigger-based area detector
    TriggerDetector,
    /// Event-driven timing detector
    EventDetector,
    /// No vendor marker recognised
    Unknown,
}

impl Vendor {
    /// Classify an open container by its vendor-identifying markers.
    ///
    /// Event detectors are recognised by their numbered module groups,
    /// trigger detectors by their configuration group or legacy
    /// configuration dataset.
    pub fn detect(container: &dyn Container) -> Result<Self, ResolveError> {
        if EventDetectorResolver::matches_vendor(container)? {
            return Ok(Vendor::EventDetector);
        }
        let members = container.root_members()?;
        if members
            .iter()
            .any(|m| m == keys::CONFIG_GROUP || m == keys::LEGACY_CONFIG)
        {
            return Ok(Vendor::TriggerDetector);
        }
        Ok(Vendor::Unknown)
    }

    /// Resolver for this vendor, `None` for [`Vendor::Unknown`]
    pub fn resolver<'a>(&self, container: &'a dyn Container) -> Option<Box<dyn VendorResolver + 'a>> {
        match self {
            Vendor::TriggerDetector => Some(Box::new(TriggerDetectorResolver::new(container))),
            Vendor::EventDetector => Some(Box::new(EventDetectorResolver::new(container))),
            Vendor::Unknown => None,
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Vendor::TriggerDetector => "trigger-detector",
            Vendor::EventDetector => "event-detector",
            Vendor::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Capability set shared by the vendor resolvers.
///
/// Facts a vendor does not record default to `Ok(None)`. Getters named
/// `find_*` return the node path rather than its value, so callers can read
/// it lazily.
pub trait VendorResolver {
    /// Vendor family handled by this resolver
    fn vendor(&self) -> Vendor;

    /// Shared primitives over the same container
    fn base(&self) -> &MetadataResolver<'_>;

    /// Path of the software version node
    fn find_software_version(&self) -> Result<Option<String>, ResolveError>;

    /// Total number of images
    fn image_count(&self) -> Result<Option<i64>, ResolveError> {
        Ok(None)
    }

    /// Detector size as (fast, slow)
    fn detector_size(&self) -> Result<Option<(i64, i64)>, ResolveError> {
        Ok(None)
    }

    /// Pixel size per axis
    fn pixel_size(&self) -> Result<Option<Vec<f64>>, ResolveError> {
        Ok(None)
    }

    /// Beam center per axis
    fn beam_center(&self) -> Result<Option<Vec<f64>>, ResolveError> {
        Ok(None)
    }

    /// Incident wavelength
    fn wavelength(&self) -> Result<Option<f64>, ResolveError> {
        Ok(None)
    }

    /// Sample to detector distance in meters
    fn detector_distance(&self) -> Result<Option<f64>, ResolveError> {
        Ok(None)
    }

    /// Saturation (count-rate cutoff) value
    fn saturation_value(&self) -> Result<Option<i64>, ResolveError> {
        Ok(None)
    }

    /// Bit depth of the stored images
    fn bit_depth_image(&self) -> Result<Option<i64>, ResolveError> {
        Ok(None)
    }

    /// Sensor material and thickness
    fn sensor(&self) -> Result<Option<SensorInfo>, ResolveError> {
        Ok(None)
    }

    /// Mask node and its "applied" companion
    fn find_mask(&self) -> Result<MarkerPaths, ResolveError> {
        Ok((None, None))
    }

    /// Flatfield node and its "applied" companion
    fn find_flatfield(&self) -> Result<MarkerPaths, ResolveError> {
        Ok((None, None))
    }

    /// Number of detector modules
    fn module_count(&self) -> Result<Option<usize>, ResolveError> {
        Ok(None)
    }

    /// Path of the meta file layout version node
    fn find_meta_version(&self) -> Result<Option<String>, ResolveError> {
        Ok(None)
    }
}
