//! Substrings and node names used to locate facts.
//!
//! Matching is by substring over the full node path, first hit in traversal
//! order wins. Keep entries specific enough that no two facts can match the
//! same node: `pixel_size` must not be shortened to `pixel`, which would also
//! hit `pixels_in_detector`.

/// Configuration group written by trigger-based detectors
pub const CONFIG_GROUP: &str = "_dectris";
/// Legacy single-dataset serialized configuration
pub const LEGACY_CONFIG: &str = "config";

/// Images per trigger
pub const NIMAGES: &str = "nimages";
/// Number of triggers
pub const NTRIGGER: &str = "ntrigger";
/// Detector dimensions in pixels, one node per axis
pub const PIXELS_IN_DETECTOR: &str = "pixels_in_detector";
/// Pixel pitch, one node per axis
pub const PIXEL_SIZE: &str = "pixel_size";
/// Beam center, one node per axis
pub const BEAM_CENTER: &str = "beam_center";
/// Incident wavelength
pub const WAVELENGTH: &str = "wavelength";
/// Sample to detector distance, stored in meters
pub const DETECTOR_DISTANCE: &str = "detector_distance";
/// Count-rate cutoff, used as the saturation value
pub const SATURATION_VALUE: &str = "countrate_correction_count_cutoff";
/// Sensor material
pub const SENSOR_MATERIAL: &str = "sensor_material";
/// Sensor thickness, stored in meters
pub const SENSOR_THICKNESS: &str = "sensor_thickness";
/// Bit depth of the stored images
pub const BIT_DEPTH_IMAGE: &str = "bit_depth_image";
/// Bit depth of the readout
pub const BIT_DEPTH_READOUT: &str = "bit_depth_readout";
/// Software (firmware) version
pub const SOFTWARE_VERSION: &str = "software_version";
/// Threshold energy
pub const THRESHOLD_ENERGY: &str = "threshold_energy";
/// Detector serial number
pub const DETECTOR_NUMBER: &str = "detector_number";
/// Readout time
pub const DETECTOR_READOUT_TIME: &str = "detector_readout_time";
/// Meta file layout version (event detectors)
pub const META_VERSION: &str = "meta_version";

/// Pixel mask marker node
pub const MASK: &str = "mask";
/// Companion of [`MASK`] telling whether the mask was applied
pub const MASK_APPLIED: &str = "mask_applied";
/// Flatfield marker node
pub const FLATFIELD: &str = "flatfield";
/// Companion of [`FLATFIELD`] telling whether the correction was applied
pub const FLATFIELD_APPLIED: &str = "flatfield_correction_applied";
