use serde::{Deserialize, Serialize};

/// Detector facts resolved from a meta file.
///
/// Absent facts stay `None`; supplying defaults is left to the writer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorMetadata {
    /// Image size in pixels as (fast, slow)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<(i64, i64)>,

    /// Pixel size per axis, in meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_size: Option<Vec<f64>>,

    /// Beam center per axis, in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beam_center: Option<Vec<f64>>,

    /// Sample to detector distance in meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,

    /// Sensor material
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_material: Option<String>,

    /// Sensor thickness in meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_thickness_m: Option<f64>,

    /// Saturation (overload) value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation_value: Option<i64>,

    /// Bit depth of the stored images
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_depth_image: Option<i64>,

    /// Number of detector modules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_count: Option<usize>,

    /// Path of the pixel mask node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_path: Option<String>,

    /// Path of the node telling whether the mask was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_applied_path: Option<String>,

    /// Path of the flatfield node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flatfield_path: Option<String>,

    /// Path of the node telling whether the flatfield correction was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flatfield_applied_path: Option<String>,
}

impl DetectorMetadata {
    /// Create an empty detector description
    pub fn new() -> Self {
        Self::default()
    }

    /// Set mask and "mask applied" paths from a marker lookup
    pub fn set_mask(&mut self, (mask, applied): (Option<String>, Option<String>)) {
        self.mask_path = mask;
        self.mask_applied_path = applied;
    }

    /// Set flatfield and "flatfield applied" paths from a marker lookup
    pub fn set_flatfield(&mut self, (flatfield, applied): (Option<String>, Option<String>)) {
        self.flatfield_path = flatfield;
        self.flatfield_applied_path = applied;
    }

    /// Whether a pixel mask is recorded
    pub fn has_mask(&self) -> bool {
        self.mask_path.is_some()
    }
}
