//! Integration tests for metafile
//!
//! These tests go from a meta file on disk (JSON dump form) to the resolved
//! experiment summary.

use metafile::container::{self, ContainerError};
use metafile::metadata::ExperimentMetadata;
use metafile::resolver::{
    EventDetectorResolver, MetadataResolver, ResolveError, TriggerDetectorResolver, Vendor,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const TRIGGER_META: &str = r#"{
    "_dectris": {
        "kind": "group",
        "members": {
            "nimages": {"kind": "dataset", "dtype": "int", "data": 1},
            "ntrigger": {"kind": "dataset", "dtype": "int", "data": 3600},
            "wavelength": {"kind": "dataset", "dtype": "float", "data": 0.9763},
            "detector_distance": {"kind": "dataset", "dtype": "float", "data": 0.25},
            "x_pixels_in_detector": {"kind": "dataset", "dtype": "int", "data": 4148},
            "y_pixels_in_detector": {"kind": "dataset", "dtype": "int", "data": 4362},
            "x_pixel_size": {"kind": "dataset", "dtype": "float", "data": 7.5e-5},
            "y_pixel_size": {"kind": "dataset", "dtype": "float", "data": 7.5e-5},
            "beam_center_x": {"kind": "dataset", "dtype": "float", "data": 2079.5},
            "beam_center_y": {"kind": "dataset", "dtype": "float", "data": 2160.0},
            "countrate_correction_count_cutoff": {"kind": "dataset", "dtype": "int", "data": 126367},
            "bit_depth_image": {"kind": "dataset", "dtype": "int", "data": 32},
            "sensor_material": {"kind": "dataset", "dtype": "bytes", "data": "Si\u0000\u0000"},
            "sensor_thickness": {"kind": "dataset", "dtype": "float", "data": 4.5e-4},
            "software_version": {"kind": "dataset", "dtype": "bytes", "data": "1.8.0"},
            "flatfield_correction_applied": {"kind": "dataset", "dtype": "int", "data": 1},
            "pixel_mask_applied": {"kind": "dataset", "dtype": "int", "data": 1}
        }
    },
    "flatfield": {"kind": "dataset", "dtype": "float", "data": [[1.0, 1.0], [1.0, 1.0]]},
    "mask": {"kind": "dataset", "dtype": "int", "data": [[0, 0], [0, 1]]}
}"#;

const LEGACY_META: &str = r#"{
    "config": {
        "kind": "dataset",
        "dtype": "bytes",
        "data": "{'nimages': 900, 'ntrigger': 1, 'detector_readout_time': 1e-07, 'sensor_material': u'Si', 'compression': None}"
    },
    "entry": {
        "kind": "group",
        "members": {
            "nimages": {"kind": "dataset", "dtype": "int", "data": 900}
        }
    }
}"#;

const EVENT_META: &str = r#"{
    "ts_qty_module00": {"kind": "dataset", "dtype": "int", "data": [10, 20]},
    "ts_qty_module01": {"kind": "dataset", "dtype": "int", "data": [15, 25]},
    "meta_version": {"kind": "dataset", "dtype": "int", "data": 1},
    "software_version": {"kind": "dataset", "dtype": "text", "data": "0.1.2"}
}"#;

fn write_meta(dir: &TempDir, name: &str, json: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, json).unwrap();
    path
}

fn resolve(path: &Path) -> ExperimentMetadata {
    let container = container::open(path).unwrap();
    let vendor = Vendor::detect(container.as_ref()).unwrap();
    let resolver = vendor.resolver(container.as_ref()).unwrap();
    ExperimentMetadata::from_resolver(&path.display().to_string(), resolver.as_ref()).unwrap()
}

/// Test the complete trigger detector pipeline
#[test]
fn test_trigger_meta_file() {
    let dir = tempdir().unwrap();
    let path = write_meta(&dir, "sample_meta.json", TRIGGER_META);

    let metadata = resolve(&path);

    assert_eq!(metadata.vendor, Vendor::TriggerDetector);
    assert_eq!(metadata.image_count, Some(3600));
    assert_eq!(metadata.detector.image_size, Some((4362, 4148)));
    assert_eq!(metadata.detector.pixel_size, Some(vec![7.5e-5, 7.5e-5]));
    assert_eq!(metadata.detector.beam_center, Some(vec![2079.5, 2160.0]));
    assert_eq!(metadata.detector.distance_m, Some(0.25));
    assert_eq!(metadata.detector.saturation_value, Some(126367));
    assert_eq!(metadata.detector.bit_depth_image, Some(32));
    assert_eq!(metadata.detector.sensor_material.as_deref(), Some("Si"));
    assert_eq!(metadata.detector.sensor_thickness_m, Some(4.5e-4));
    assert_eq!(metadata.beam.wavelength, Some(0.9763));
    assert_eq!(
        metadata.software_version_path.as_deref(),
        Some("_dectris/software_version")
    );
    assert!(metadata.detector.has_mask());
}

/// Test the mask and flatfield markers on a file read from disk
#[test]
fn test_trigger_markers() {
    let dir = tempdir().unwrap();
    let path = write_meta(&dir, "sample_meta.json", TRIGGER_META);
    let container = container::open(&path).unwrap();
    let resolver = TriggerDetectorResolver::new(container.as_ref());

    let (mask, applied) = resolver.find_mask().unwrap();
    assert_eq!(mask.as_deref(), Some("mask"));
    assert_eq!(applied.as_deref(), Some("_dectris/pixel_mask_applied"));

    let (flatfield, applied) = resolver.find_flatfield().unwrap();
    assert_eq!(flatfield.as_deref(), Some("flatfield"));
    assert_eq!(applied.as_deref(), Some("_dectris/flatfield_correction_applied"));

    assert!(resolver.base().has_mask().unwrap());
    assert!(resolver.base().has_flatfield().unwrap());
}

/// Test a file that only carries the legacy configuration blob
#[test]
fn test_legacy_meta_file() {
    let dir = tempdir().unwrap();
    let path = write_meta(&dir, "legacy_meta.json", LEGACY_META);
    let container = container::open(&path).unwrap();

    assert_eq!(
        Vendor::detect(container.as_ref()).unwrap(),
        Vendor::TriggerDetector
    );

    let resolver = TriggerDetectorResolver::new(container.as_ref());
    assert!(!resolver.has_authoritative_config().unwrap());
    assert!(resolver.has_legacy_config().unwrap());

    let blob = resolver.read_legacy_config_blob().unwrap().unwrap();
    assert_eq!(blob["nimages"], 900);
    assert_eq!(blob["sensor_material"], "Si");
    assert!(blob["compression"].is_null());

    // Without the configuration group the count comes from tree search
    assert_eq!(resolver.image_count().unwrap(), Some(900));
}

/// Test the event detector pipeline
#[test]
fn test_event_meta_file() {
    let dir = tempdir().unwrap();
    let path = write_meta(&dir, "tristan_meta.json", EVENT_META);

    assert!(EventDetectorResolver::is_this_vendor(&path).unwrap());

    let metadata = resolve(&path);
    assert_eq!(metadata.vendor, Vendor::EventDetector);
    assert_eq!(metadata.detector.module_count, Some(2));
    assert_eq!(metadata.meta_version_path.as_deref(), Some("meta_version"));
    assert_eq!(metadata.software_version_path.as_deref(), Some("software_version"));
    assert_eq!(metadata.image_count, None);
}

/// Test that trigger files are not claimed by the event resolver
#[test]
fn test_is_this_vendor_rejects_trigger_file() {
    let dir = tempdir().unwrap();
    let path = write_meta(&dir, "sample_meta.json", TRIGGER_META);

    assert!(!EventDetectorResolver::is_this_vendor(&path).unwrap());
}

/// Test classification of a file with no vendor markers
#[test]
fn test_unknown_vendor() {
    let dir = tempdir().unwrap();
    let path = write_meta(
        &dir,
        "other.json",
        r#"{"entry": {"kind": "group", "members": {}}}"#,
    );
    let container = container::open(&path).unwrap();

    let vendor = Vendor::detect(container.as_ref()).unwrap();
    assert_eq!(vendor, Vendor::Unknown);
    assert!(vendor.resolver(container.as_ref()).is_none());
}

/// Test the error reported for an unreadable path
#[test]
fn test_missing_and_unsupported_files() {
    let dir = tempdir().unwrap();

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        container::open(&missing),
        Err(ContainerError::IoError(_))
    ));

    let unsupported = write_meta(&dir, "notes.txt", "{}");
    assert!(matches!(
        EventDetectorResolver::is_this_vendor(&unsupported),
        Err(ResolveError::ContainerError(ContainerError::UnsupportedFormat(_)))
    ));
}

/// Test the resolver description and summary on a file from disk
#[test]
fn test_resolver_display_and_len() {
    let dir = tempdir().unwrap();
    let path = write_meta(&dir, "sample_meta.json", TRIGGER_META);
    let container = container::open(&path).unwrap();
    let resolver = MetadataResolver::new(container.as_ref());

    assert_eq!(
        resolver.to_string(),
        format!("File {} opened in 'r' mode.", path.display())
    );
    assert_eq!(resolver.len().unwrap(), 3);
    assert_eq!(resolver.get("mask").unwrap().len(), 4);
}

/// Test the JSON summary survives a write and read back
#[test]
fn test_metadata_json_file() {
    let dir = tempdir().unwrap();
    let path = write_meta(&dir, "sample_meta.json", TRIGGER_META);
    let metadata = resolve(&path);

    let out = dir.path().join("summary.json");
    fs::write(&out, metadata.to_json_pretty().unwrap()).unwrap();

    let restored = ExperimentMetadata::from_json(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(restored, metadata);
}
