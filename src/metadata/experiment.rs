use serde::{Deserialize, Serialize};

use crate::resolver::{Vendor, VendorResolver};

use super::beam::BeamMetadata;
use super::detector::DetectorMetadata;
use super::MetadataError;

/// Every fact resolved from one meta file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentMetadata {
    /// Meta file the facts were read from
    pub source_file: String,

    /// Detector family
    pub vendor: Vendor,

    /// Total number of images
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_count: Option<i64>,

    /// Detector description
    pub detector: DetectorMetadata,

    /// Beam description
    pub beam: BeamMetadata,

    /// Path of the software version node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_version_path: Option<String>,

    /// Path of the meta layout version node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_version_path: Option<String>,
}

impl ExperimentMetadata {
    /// Create an empty description for `source_file`
    pub fn new(source_file: &str, vendor: Vendor) -> Self {
        Self {
            source_file: source_file.to_string(),
            vendor,
            image_count: None,
            detector: DetectorMetadata::new(),
            beam: BeamMetadata::new(),
            software_version_path: None,
            meta_version_path: None,
        }
    }

    /// Copy every fact a resolver provides, one field at a time
    pub fn from_resolver(
        source_file: &str,
        resolver: &dyn VendorResolver,
    ) -> Result<Self, MetadataError> {
        let mut metadata = Self::new(source_file, resolver.vendor());

        metadata.image_count = resolver.image_count()?;
        metadata.software_version_path = resolver.find_software_version()?;
        metadata.meta_version_path = resolver.find_meta_version()?;

        let detector = &mut metadata.detector;
        detector.image_size = resolver.detector_size()?;
        detector.pixel_size = resolver.pixel_size()?;
        detector.beam_center = resolver.beam_center()?;
        detector.distance_m = resolver.detector_distance()?;
        detector.saturation_value = resolver.saturation_value()?;
        detector.bit_depth_image = resolver.bit_depth_image()?;
        detector.module_count = resolver.module_count()?;
        if let Some(sensor) = resolver.sensor()? {
            detector.sensor_material = Some(sensor.material);
            detector.sensor_thickness_m = Some(sensor.thickness);
        }
        detector.set_mask(resolver.find_mask()?);
        detector.set_flatfield(resolver.find_flatfield()?);

        metadata.beam.wavelength = resolver.wavelength()?;

        Ok(metadata)
    }

    /// Serialize to compact JSON
    pub fn to_json(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(json)?)
    }
}
