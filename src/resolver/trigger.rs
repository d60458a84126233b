//! Resolver for trigger-based area detectors.
//!
//! These files carry an authoritative flat configuration group next to the
//! usual tree. When the group is present it decides the image count;
//! every other fact is located by substring search over the whole tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::container::{Container, NodeKind, ScalarValue};

use super::{keys, literal, MarkerPaths, MetadataResolver, ResolveError, Vendor, VendorResolver};

/// Value of one entry of the configuration group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Single-element dataset, unwrapped and decoded
    Scalar(ScalarValue),
    /// Dataset with zero or several elements
    Array(Vec<ScalarValue>),
}

impl ConfigValue {
    /// The scalar, if this entry holds exactly one value
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            ConfigValue::Scalar(value) => Some(value),
            ConfigValue::Array(_) => None,
        }
    }
}

/// Sensor material and thickness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorInfo {
    /// Sensor material, e.g. "Si" or "CdTe"
    pub material: String,
    /// Sensor thickness in meters
    pub thickness: f64,
}

/// Metadata resolver for trigger-based area detectors
pub struct TriggerDetectorResolver<'a> {
    base: MetadataResolver<'a>,
}

impl<'a> TriggerDetectorResolver<'a> {
    /// Wrap an open container
    pub fn new(container: &'a dyn Container) -> Self {
        Self {
            base: MetadataResolver::new(container),
        }
    }

    /// Shared primitives over the same container
    pub fn base(&self) -> &MetadataResolver<'a> {
        &self.base
    }

    /// Whether the dedicated configuration group is present
    pub fn has_authoritative_config(&self) -> Result<bool, ResolveError> {
        self.base
            .has_root_member(keys::CONFIG_GROUP, Some(NodeKind::Group))
    }

    /// Whether the legacy serialized configuration dataset is present
    pub fn has_legacy_config(&self) -> Result<bool, ResolveError> {
        self.base.has_root_member(keys::LEGACY_CONFIG, None)
    }

    /// Read every dataset of the configuration group as a flat mapping.
    ///
    /// Nested groups are skipped. Fails with [`ResolveError::NotFound`] if
    /// the group does not exist.
    pub fn read_authoritative_config(&self) -> Result<BTreeMap<String, ConfigValue>, ResolveError> {
        let container = self.base.container();
        let mut config = BTreeMap::new();

        for name in container.members(keys::CONFIG_GROUP)? {
            let path = format!("{}/{}", keys::CONFIG_GROUP, name);
            if container.kind(&path)? != Some(NodeKind::Dataset) {
                continue;
            }
            let value = container.read(&path)?;
            let entry = match value.single() {
                Some(scalar) => ConfigValue::Scalar(scalar),
                None => ConfigValue::Array(value.elements()),
            };
            config.insert(name, entry);
        }

        Ok(config)
    }

    /// Decode the legacy serialized configuration, if present.
    ///
    /// The blob is a literal mapping; it is parsed structurally and never
    /// evaluated.
    pub fn read_legacy_config_blob(
        &self,
    ) -> Result<Option<serde_json::Map<String, serde_json::Value>>, ResolveError> {
        if !self.has_legacy_config()? {
            return Ok(None);
        }
        match self.base.read_scalar(keys::LEGACY_CONFIG)? {
            ScalarValue::Text(text) => literal::decode_mapping(&text).map(Some),
            other => Err(ResolveError::malformed(
                keys::LEGACY_CONFIG,
                format!("expected serialized text, found {}", other.type_name()),
            )),
        }
    }

    /// Total number of images.
    ///
    /// With the configuration group present the count is derived from
    /// `nimages` and `ntrigger`:
    ///
    /// | nimages | ntrigger | result |
    /// |---------|----------|--------|
    /// | n ≥ 1   | 1        | n      |
    /// | 1       | t > 1    | t      |
    /// | n > 1   | t > 1    | n × t  |
    /// | < 1     | any      | `None` |
    /// | any     | < 1      | `None` |
    ///
    /// Without it, the first node whose path contains `nimages` is read.
    pub fn image_count(&self) -> Result<Option<i64>, ResolveError> {
        if !self.has_authoritative_config()? {
            return self.base.first_match_i64(keys::NIMAGES);
        }

        let config = self.read_authoritative_config()?;
        let nimages = config_integer(&config, keys::NIMAGES)?;
        let ntrigger = config_integer(&config, keys::NTRIGGER)?;

        Ok(match (nimages, ntrigger) {
            (n, 1) if n >= 1 => Some(n),
            (1, t) if t > 1 => Some(t),
            // Every trigger acquires nimages frames
            (n, t) if n > 1 && t > 1 => n.checked_mul(t),
            _ => None,
        })
    }

    /// Detector size as (fast, slow).
    ///
    /// The per-axis nodes are stored slow axis first; exactly two are expected.
    pub fn detector_size(&self) -> Result<Option<(i64, i64)>, ResolveError> {
        let values = match self.base.read_all_match_scalars(keys::PIXELS_IN_DETECTOR)? {
            Some(values) => values,
            None => return Ok(None),
        };
        match values.as_slice() {
            [(slow_path, slow), (fast_path, fast)] => Ok(Some((
                MetadataResolver::expect_i64(fast_path, fast)?,
                MetadataResolver::expect_i64(slow_path, slow)?,
            ))),
            other => Err(ResolveError::malformed(
                keys::PIXELS_IN_DETECTOR,
                format!("expected one node per axis (2), found {}", other.len()),
            )),
        }
    }

    /// Pixel size per axis, in traversal order
    pub fn pixel_size(&self) -> Result<Option<Vec<f64>>, ResolveError> {
        self.base.all_matches_f64(keys::PIXEL_SIZE)
    }

    /// Beam center per axis, in traversal order
    pub fn beam_center(&self) -> Result<Option<Vec<f64>>, ResolveError> {
        self.base.all_matches_f64(keys::BEAM_CENTER)
    }

    /// Incident wavelength
    pub fn wavelength(&self) -> Result<Option<f64>, ResolveError> {
        self.base.first_match_f64(keys::WAVELENGTH)
    }

    /// Sample to detector distance in meters
    pub fn detector_distance(&self) -> Result<Option<f64>, ResolveError> {
        self.base.first_match_f64(keys::DETECTOR_DISTANCE)
    }

    /// Count-rate correction cutoff, used as the saturation value
    pub fn saturation_value(&self) -> Result<Option<i64>, ResolveError> {
        self.base.first_match_i64(keys::SATURATION_VALUE)
    }

    /// Bit depth of the stored images
    pub fn bit_depth_image(&self) -> Result<Option<i64>, ResolveError> {
        self.base.first_match_i64(keys::BIT_DEPTH_IMAGE)
    }

    /// Sensor material and thickness.
    ///
    /// Both are always written by this vendor: a missing node is reported as
    /// [`ResolveError::NotFound`], several candidates as
    /// [`ResolveError::MalformedValue`].
    pub fn sensor_info(&self) -> Result<SensorInfo, ResolveError> {
        let material_path = self.unique_path(keys::SENSOR_MATERIAL)?;
        let thickness_path = self.unique_path(keys::SENSOR_THICKNESS)?;

        let material = match self.base.read_scalar(material_path)? {
            ScalarValue::Text(text) => text,
            other => {
                return Err(ResolveError::malformed(
                    material_path,
                    format!("expected text, found {}", other.type_name()),
                ))
            }
        };
        let thickness = self.base.read_scalar(thickness_path)?;
        let thickness = MetadataResolver::expect_f64(thickness_path, &thickness)?;

        Ok(SensorInfo {
            material,
            thickness,
        })
    }

    fn unique_path(&self, needle: &str) -> Result<&str, ResolveError> {
        match self.base.find_all_paths_containing(needle)?.as_slice() {
            [path] => Ok(*path),
            [] => Err(ResolveError::NotFound(needle.to_string())),
            several => Err(ResolveError::malformed(
                needle,
                format!("expected a single node, found {}", several.len()),
            )),
        }
    }

    /// Mask node and "mask applied" node paths
    pub fn find_mask(&self) -> Result<MarkerPaths, ResolveError> {
        self.base.find_marker(keys::MASK, keys::MASK_APPLIED)
    }

    /// Flatfield node and "flatfield correction applied" node paths
    pub fn find_flatfield(&self) -> Result<MarkerPaths, ResolveError> {
        self.base.find_marker(keys::FLATFIELD, keys::FLATFIELD_APPLIED)
    }

    /// Path of the software version node
    pub fn find_software_version(&self) -> Result<Option<String>, ResolveError> {
        self.base.first_path(keys::SOFTWARE_VERSION)
    }

    /// Path of the threshold energy node
    pub fn find_threshold_energy(&self) -> Result<Option<String>, ResolveError> {
        self.base.first_path(keys::THRESHOLD_ENERGY)
    }

    /// Path of the readout bit depth node
    pub fn find_bit_depth_readout(&self) -> Result<Option<String>, ResolveError> {
        self.base.first_path(keys::BIT_DEPTH_READOUT)
    }

    /// Path of the image bit depth node
    pub fn find_bit_depth_image(&self) -> Result<Option<String>, ResolveError> {
        self.base.first_path(keys::BIT_DEPTH_IMAGE)
    }

    /// Path of the detector serial number node
    pub fn find_detector_number(&self) -> Result<Option<String>, ResolveError> {
        self.base.first_path(keys::DETECTOR_NUMBER)
    }

    /// Path of the readout time node
    pub fn find_detector_readout_time(&self) -> Result<Option<String>, ResolveError> {
        self.base.first_path(keys::DETECTOR_READOUT_TIME)
    }
}

fn config_integer(config: &BTreeMap<String, ConfigValue>, key: &str) -> Result<i64, ResolveError> {
    let path = format!("{}/{}", keys::CONFIG_GROUP, key);
    let value = config
        .get(key)
        .ok_or_else(|| ResolveError::NotFound(path.clone()))?;
    let scalar = value
        .as_scalar()
        .ok_or_else(|| ResolveError::malformed(&path, "expected a single element"))?;
    MetadataResolver::expect_i64(&path, scalar)
}

impl VendorResolver for TriggerDetectorResolver<'_> {
    fn vendor(&self) -> Vendor {
        Vendor::TriggerDetector
    }

    fn base(&self) -> &MetadataResolver<'_> {
        &self.base
    }

    fn find_software_version(&self) -> Result<Option<String>, ResolveError> {
        TriggerDetectorResolver::find_software_version(self)
    }

    fn image_count(&self) -> Result<Option<i64>, ResolveError> {
        TriggerDetectorResolver::image_count(self)
    }

    fn detector_size(&self) -> Result<Option<(i64, i64)>, ResolveError> {
        TriggerDetectorResolver::detector_size(self)
    }

    fn pixel_size(&self) -> Result<Option<Vec<f64>>, ResolveError> {
        TriggerDetectorResolver::pixel_size(self)
    }

    fn beam_center(&self) -> Result<Option<Vec<f64>>, ResolveError> {
        TriggerDetectorResolver::beam_center(self)
    }

    fn wavelength(&self) -> Result<Option<f64>, ResolveError> {
        TriggerDetectorResolver::wavelength(self)
    }

    fn detector_distance(&self) -> Result<Option<f64>, ResolveError> {
        TriggerDetectorResolver::detector_distance(self)
    }

    fn saturation_value(&self) -> Result<Option<i64>, ResolveError> {
        TriggerDetectorResolver::saturation_value(self)
    }

    fn bit_depth_image(&self) -> Result<Option<i64>, ResolveError> {
        TriggerDetectorResolver::bit_depth_image(self)
    }

    fn sensor(&self) -> Result<Option<SensorInfo>, ResolveError> {
        match self.sensor_info() {
            Ok(info) => Ok(Some(info)),
            Err(ResolveError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn find_mask(&self) -> Result<MarkerPaths, ResolveError> {
        TriggerDetectorResolver::find_mask(self)
    }

    fn find_flatfield(&self) -> Result<MarkerPaths, ResolveError> {
        TriggerDetectorResolver::find_flatfield(self)
    }
}
