//! # metafile - Detector Meta File Resolution
//!
//! `metafile` reads the hierarchical "meta" files that X-ray detector control
//! software writes next to the image data of an experiment, and recovers the
//! facts downstream processing needs: how many images were taken, the pixel
//! grid, beam center, wavelength, sensor, and whether masks or flat-field
//! corrections were written and applied.
//!
//! ## Key Features
//!
//! - **Path-agnostic lookup**: facts are found by substring search over every
//!   node path, so layout changes between firmware versions do not break
//!   resolution.
//!
//! - **Two detector families**: trigger-based area detectors and event-driven
//!   timing detectors, classified from the top-level layout of the file.
//!
//! - **Safe legacy decoding**: configuration blobs stored as text literals are
//!   decoded structurally, never evaluated.
//!
//! - **Pluggable storage**: resolvers sit on a small [`container::Container`]
//!   trait, with an in-memory backend and an HDF5 backend (feature `hdf5`).
//!
//! ## Quick Start
//!
//! ```rust
//! use metafile::container::{Data, MemoryContainer};
//! use metafile::metadata::ExperimentMetadata;
//! use metafile::resolver::Vendor;
//!
//! let container = MemoryContainer::builder()
//!     .name("run_meta.h5")
//!     .dataset("_dectris/nimages", Data::Int(vec![10]))
//!     .dataset("_dectris/ntrigger", Data::Int(vec![1]))
//!     .dataset("_dectris/x_pixel_size", Data::Float(vec![75e-6]))
//!     .build()?;
//!
//! let vendor = Vendor::detect(&container)?;
//! let resolver = vendor.resolver(&container).expect("known vendor");
//! let metadata = ExperimentMetadata::from_resolver("run_meta.h5", resolver.as_ref())?;
//!
//! assert_eq!(metadata.image_count, Some(10));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`container`]: read-only access contract and its backends
//! - [`resolver`]: path search, vendor classification, per-vendor getters
//! - [`metadata`]: serializable summary of everything resolved from one file

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod container;
pub mod metadata;
pub mod resolver;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::container::{
        Container, ContainerError, Data, DatasetValue, MemoryContainer, NodeKind, ScalarValue,
    };
    pub use crate::metadata::{BeamMetadata, DetectorMetadata, ExperimentMetadata, MetadataError};
    pub use crate::resolver::{
        EventDetectorResolver, MetadataResolver, ResolveError, SensorInfo,
        TriggerDetectorResolver, Vendor, VendorResolver,
    };
}
