//! # Resolved Metadata
//!
//! Plain records the resolved facts are copied into, one field at a time.
//! They carry no knowledge of where a fact came from and invent no defaults:
//! a fact the meta file does not record stays `None`.
//!
//! 1. **Detector**: geometry, sensor, saturation, applied corrections
//! 2. **Beam**: wavelength (and the photon energy derived from it)
//! 3. **Experiment**: image count, vendor, version node paths, plus the two above

mod beam;
mod detector;
mod error;
mod experiment;


pub use beam::BeamMetadata;
pub use detector::DetectorMetadata;
pub use error::MetadataError;
pub use experiment::ExperimentMetadata;
