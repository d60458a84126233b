//! HDF5 backend, built with the `hdf5` feature.
//!
//! The walk lists objects, not links: soft and external links are skipped
//! and an object reachable through several hard links is listed once.

use std::path::Path;

use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{Dataset, File, Group, LinkType, LocationInfo, LocationType};
use log::debug;

use super::links::{walk_objects, Link};
use super::{normalize_path, Container, ContainerError, Data, DatasetValue, NodeKind};

/// Upper bound for fixed-length strings; longer strings are truncated on read
const FIXED_STRING_CAPACITY: usize = 4096;

/// Read-only handle on an HDF5 file.
///
/// The file is closed when the handle is dropped.
pub struct Hdf5Container {
    file: File,
}

impl Hdf5Container {
    /// Open an HDF5 file read-only
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        debug!("Opening HDF5 container {}", path.display());
        let file = File::open(path)?;
        Ok(Self { file })
    }

    fn group_at(&self, path: &str) -> Option<Group> {
        let path = normalize_path(path);
        if path.is_empty() {
            return self.file.as_group().ok();
        }
        self.file.group(path).ok()
    }

    fn dataset_at(&self, path: &str) -> Option<Dataset> {
        let path = normalize_path(path);
        if path.is_empty() {
            return None;
        }
        self.file.dataset(path).ok()
    }

    /// Links of the group at `path`, with hard link targets resolved
    fn links(&self, path: &str) -> Result<Vec<Link<LocationInfo>>, ContainerError> {
        let group = self
            .group_at(path)
            .ok_or_else(|| ContainerError::NotAGroup(path.to_string()))?;

        let entries = group.iter_visit_default(
            Vec::new(),
            |_, name, info, entries: &mut Vec<(String, LinkType)>| {
                entries.push((name.to_string(), info.link_type));
                true
            },
        )?;

        entries
            .into_iter()
            .map(
                |(name, link_type)| -> Result<Link<LocationInfo>, ContainerError> {
                    match link_type {
                        LinkType::Hard => {
                            let info = group.loc_info_by_name(&name)?;
                            let is_group = matches!(info.loc_type, LocationType::Group);
                            let shared = info.num_links > 1;
                            Ok(Link::hard(name, info, is_group, shared))
                        }
                        _ => Ok(Link::symbolic(name)),
                    }
                },
            )
            .collect()
    }
}

fn read_dataset(dataset: &Dataset) -> Result<DatasetValue, ContainerError> {
    let shape = dataset.shape();
    let descriptor = dataset.dtype()?.to_descriptor()?;

    let data = match descriptor {
        TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) | TypeDescriptor::Enum(_) => {
            Data::Int(dataset.read_raw::<i64>()?)
        }
        TypeDescriptor::Boolean => Data::Int(
            dataset
                .read_raw::<bool>()?
                .into_iter()
                .map(i64::from)
                .collect(),
        ),
        TypeDescriptor::Float(_) => Data::Float(dataset.read_raw::<f64>()?),
        TypeDescriptor::FixedAscii(_) => Data::Bytes(
            dataset
                .read_raw::<FixedAscii<FIXED_STRING_CAPACITY>>()?
                .iter()
                .map(|s| s.as_bytes().to_vec())
                .collect(),
        ),
        TypeDescriptor::VarLenAscii => Data::Bytes(
            dataset
                .read_raw::<VarLenAscii>()?
                .iter()
                .map(|s| s.as_bytes().to_vec())
                .collect(),
        ),
        TypeDescriptor::FixedUnicode(_) => Data::Text(
            dataset
                .read_raw::<FixedUnicode<FIXED_STRING_CAPACITY>>()?
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
        ),
        TypeDescriptor::VarLenUnicode => Data::Text(
            dataset
                .read_raw::<VarLenUnicode>()?
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
        ),
        other => {
            return Err(ContainerError::InvalidFormat(format!(
                "unsupported dataset type {:?}",
                other
            )))
        }
    };

    DatasetValue::with_shape(shape, data)
}

impl Container for Hdf5Container {
    fn name(&self) -> String {
        self.file.filename()
    }

    fn root_members(&self) -> Result<Vec<String>, ContainerError> {
        Ok(self.file.member_names()?)
    }

    fn kind(&self, path: &str) -> Result<Option<NodeKind>, ContainerError> {
        if self.group_at(path).is_some() {
            Ok(Some(NodeKind::Group))
        } else if self.dataset_at(path).is_some() {
            Ok(Some(NodeKind::Dataset))
        } else {
            Ok(None)
        }
    }

    fn members(&self, path: &str) -> Result<Vec<String>, ContainerError> {
        match self.group_at(path) {
            Some(group) => Ok(group.member_names()?),
            None if self.dataset_at(path).is_some() => {
                Err(ContainerError::NotAGroup(path.to_string()))
            }
            None => Err(ContainerError::NotFound(path.to_string())),
        }
    }

    fn read(&self, path: &str) -> Result<DatasetValue, ContainerError> {
        match self.dataset_at(path) {
            Some(dataset) => read_dataset(&dataset),
            None if self.group_at(path).is_some() => {
                Err(ContainerError::NotADataset(path.to_string()))
            }
            None => Err(ContainerError::NotFound(path.to_string())),
        }
    }

    fn walk(&self) -> Result<Vec<String>, ContainerError> {
        let root = self.file.loc_info()?;
        let paths = walk_objects(root, |path| self.links(path))?;
        debug!("Indexed {} nodes in {}", paths.len(), self.file.filename());
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ScalarValue;
    use crate::resolver::MetadataResolver;
    use hdf5::types::{FixedAscii, VarLenUnicode};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_meta_file(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("sample_meta.h5");
        let file = File::create(&path).unwrap();

        let config = file.create_group("_dectris").unwrap();
        config
            .new_dataset::<i64>()
            .shape(())
            .create("nimages")
            .unwrap()
            .write_scalar(&10i64)
            .unwrap();
        config
            .new_dataset_builder()
            .with_data(&[42i64])
            .create("ntrigger")
            .unwrap();
        let material = FixedAscii::<8>::from_ascii(b"Si").unwrap();
        config
            .new_dataset::<FixedAscii<8>>()
            .shape(())
            .create("sensor_material")
            .unwrap()
            .write_scalar(&material)
            .unwrap();
        let version: VarLenUnicode = "1.8.0".parse().unwrap();
        config
            .new_dataset::<VarLenUnicode>()
            .shape(())
            .create("software_version")
            .unwrap()
            .write_scalar(&version)
            .unwrap();
        config
            .new_dataset_builder()
            .with_data(&[true, false])
            .create("pixel_mask_applied")
            .unwrap();

        let entry = file.create_group("entry").unwrap();
        entry
            .create_group("instrument")
            .unwrap()
            .create_group("detector")
            .unwrap();
        entry.link_soft("/entry", "up").unwrap();
        entry.link_hard("/_dectris", "config_alias").unwrap();

        path
    }

    #[test]
    fn test_walk_lists_each_object_once() {
        let dir = TempDir::new().unwrap();
        let container = Hdf5Container::open(write_meta_file(&dir)).unwrap();

        assert_eq!(
            container.walk().unwrap(),
            vec![
                "_dectris",
                "_dectris/nimages",
                "_dectris/ntrigger",
                "_dectris/pixel_mask_applied",
                "_dectris/sensor_material",
                "_dectris/software_version",
                "entry",
                "entry/instrument",
                "entry/instrument/detector",
            ]
        );
        assert_eq!(container.root_members().unwrap(), vec!["_dectris", "entry"]);
    }

    #[test]
    fn test_read_scalars() {
        let dir = TempDir::new().unwrap();
        let container = Hdf5Container::open(write_meta_file(&dir)).unwrap();
        let resolver = MetadataResolver::new(&container);

        assert_eq!(
            resolver.read_scalar("_dectris/nimages").unwrap(),
            ScalarValue::Int(10)
        );
        assert_eq!(
            resolver.read_scalar("_dectris/ntrigger").unwrap(),
            ScalarValue::Int(42)
        );
        assert_eq!(
            resolver.read_scalar("/_dectris/sensor_material").unwrap(),
            ScalarValue::Text("Si".to_string())
        );
        assert_eq!(
            resolver.read_scalar("_dectris/software_version").unwrap(),
            ScalarValue::Text("1.8.0".to_string())
        );
    }

    #[test]
    fn test_read_bool_dataset() {
        let dir = TempDir::new().unwrap();
        let container = Hdf5Container::open(write_meta_file(&dir)).unwrap();

        let value = container.read("_dectris/pixel_mask_applied").unwrap();
        assert_eq!(value.shape, vec![2]);
        assert_eq!(value.data, Data::Int(vec![1, 0]));
    }

    #[test]
    fn test_kind_and_errors() {
        let dir = TempDir::new().unwrap();
        let container = Hdf5Container::open(write_meta_file(&dir)).unwrap();

        assert_eq!(container.kind("entry").unwrap(), Some(NodeKind::Group));
        assert_eq!(container.kind("_dectris/nimages").unwrap(), Some(NodeKind::Dataset));
        assert_eq!(container.kind("entry/missing").unwrap(), None);
        assert!(matches!(
            container.read("entry"),
            Err(ContainerError::NotADataset(_))
        ));
        assert!(matches!(
            container.members("_dectris/nimages"),
            Err(ContainerError::NotAGroup(_))
        ));
    }
}
