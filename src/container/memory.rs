//! In-memory container tree.
//!
//! Besides the builder used by tests and tools, a tree can be loaded from a
//! JSON dump of a meta file:
//!
//! ```json
//! {
//!   "_dectris": {
//!     "kind": "group",
//!     "members": {
//!       "nimages": { "kind": "dataset", "dtype": "int", "data": [100] },
//!       "software_version": { "kind": "dataset", "dtype": "bytes", "data": "1.8.0" }
//!     }
//!   }
//! }
//! ```
//!
//! A bare `data` value is stored as a rank-0 dataset, an array as a rank-1
//! dataset unless an explicit `shape` is given (nested arrays are flattened).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use super::{normalize_path, Container, ContainerError, Data, DatasetValue, NodeKind};

#[derive(Debug, Clone)]
enum Node {
    Group(BTreeMap<String, Node>),
    Dataset(DatasetValue),
}

/// Container held entirely in memory.
///
/// Members are kept sorted by name, so traversal order matches the default
/// link iteration order of HDF5 files.
#[derive(Debug, Clone)]
pub struct MemoryContainer {
    name: String,
    root: Node,
}

impl MemoryContainer {
    /// Start building a container
    pub fn builder() -> MemoryContainerBuilder {
        MemoryContainerBuilder::new()
    }

    /// Load a JSON dump from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        debug!("Loading container dump {}", path.display());

        let file = File::open(path)?;
        let members: BTreeMap<String, JsonNode> = serde_json::from_reader(BufReader::new(file))?;
        Self::from_json_members(path.display().to_string(), members)
    }

    /// Parse a JSON dump held in a string
    pub fn from_json_str(json: &str) -> Result<Self, ContainerError> {
        let members: BTreeMap<String, JsonNode> = serde_json::from_str(json)?;
        Self::from_json_members("<memory>".to_string(), members)
    }

    fn from_json_members(
        name: String,
        members: BTreeMap<String, JsonNode>,
    ) -> Result<Self, ContainerError> {
        let root = JsonNode::Group { members }.into_node()?;
        Ok(Self { name, root })
    }

    fn node(&self, path: &str) -> Option<&Node> {
        let path = normalize_path(path);
        if path.is_empty() {
            return Some(&self.root);
        }

        let mut current = &self.root;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            match current {
                Node::Group(members) => current = members.get(component)?,
                Node::Dataset(_) => return None,
            }
        }
        Some(current)
    }
}

fn visit(prefix: &str, members: &BTreeMap<String, Node>, out: &mut Vec<String>) {
    for (name, node) in members {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", prefix, name)
        };
        out.push(path.clone());
        if let Node::Group(children) = node {
            visit(&path, children, out);
        }
    }
}

impl Container for MemoryContainer {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn root_members(&self) -> Result<Vec<String>, ContainerError> {
        self.members("")
    }

    fn kind(&self, path: &str) -> Result<Option<NodeKind>, ContainerError> {
        Ok(self.node(path).map(|node| match node {
            Node::Group(_) => NodeKind::Group,
            Node::Dataset(_) => NodeKind::Dataset,
        }))
    }

    fn members(&self, path: &str) -> Result<Vec<String>, ContainerError> {
        match self.node(path) {
            Some(Node::Group(members)) => Ok(members.keys().cloned().collect()),
            Some(Node::Dataset(_)) => Err(ContainerError::NotAGroup(path.to_string())),
            None => Err(ContainerError::NotFound(path.to_string())),
        }
    }

    fn read(&self, path: &str) -> Result<DatasetValue, ContainerError> {
        match self.node(path) {
            Some(Node::Dataset(value)) => Ok(value.clone()),
            Some(Node::Group(_)) => Err(ContainerError::NotADataset(path.to_string())),
            None => Err(ContainerError::NotFound(path.to_string())),
        }
    }

    fn walk(&self) -> Result<Vec<String>, ContainerError> {
        let mut paths = Vec::new();
        if let Node::Group(members) = &self.root {
            visit("", members, &mut paths);
        }
        Ok(paths)
    }
}

/// Builder for [`MemoryContainer`].
///
/// Intermediate groups are created on demand. The first invalid insertion
/// (a path running through an existing dataset) is reported by
/// [`build`](Self::build).
#[derive(Debug)]
pub struct MemoryContainerBuilder {
    name: String,
    root: BTreeMap<String, Node>,
    error: Option<ContainerError>,
}

impl Default for MemoryContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContainerBuilder {
    /// Empty builder
    pub fn new() -> Self {
        Self {
            name: "<memory>".to_string(),
            root: BTreeMap::new(),
            error: None,
        }
    }

    /// Set the name reported by [`Container::name`]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add an (empty) group
    pub fn group(self, path: &str) -> Self {
        self.insert(path, Node::Group(BTreeMap::new()))
    }

    /// Add a one-dimensional dataset
    pub fn dataset(self, path: &str, data: Data) -> Self {
        self.insert(path, Node::Dataset(DatasetValue::array(data)))
    }

    /// Add a rank-0 dataset
    pub fn scalar(self, path: &str, data: Data) -> Self {
        self.insert(path, Node::Dataset(DatasetValue::scalar(data)))
    }

    /// Add a dataset with an explicit shape
    pub fn value(self, path: &str, value: DatasetValue) -> Self {
        self.insert(path, Node::Dataset(value))
    }

    fn insert(mut self, path: &str, node: Node) -> Self {
        if self.error.is_none() {
            if let Err(e) = insert_node(&mut self.root, path, node) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Finish the container
    pub fn build(self) -> Result<MemoryContainer, ContainerError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        Ok(MemoryContainer {
            name: self.name,
            root: Node::Group(self.root),
        })
    }
}

fn insert_node(
    root: &mut BTreeMap<String, Node>,
    path: &str,
    node: Node,
) -> Result<(), ContainerError> {
    let normalized = normalize_path(path);
    let mut components: Vec<&str> = normalized.split('/').filter(|c| !c.is_empty()).collect();
    let leaf = components
        .pop()
        .ok_or_else(|| ContainerError::InvalidFormat(format!("empty node path: {:?}", path)))?;

    let mut current = root;
    for component in components {
        let entry = current
            .entry(component.to_string())
            .or_insert_with(|| Node::Group(BTreeMap::new()));
        current = match entry {
            Node::Group(members) => members,
            Node::Dataset(_) => return Err(ContainerError::NotAGroup(component.to_string())),
        };
    }

    // Re-declaring a group keeps the members already added below it
    let existing_group = matches!(
        (current.get(leaf), &node),
        (Some(Node::Group(_)), Node::Group(_))
    );
    if !existing_group {
        current.insert(leaf.to_string(), node);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum JsonDtype {
    Int,
    Float,
    Bytes,
    Text,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum JsonNode {
    Group {
        #[serde(default)]
        members: BTreeMap<String, JsonNode>,
    },
    Dataset {
        dtype: JsonDtype,
        data: serde_json::Value,
        #[serde(default)]
        shape: Option<Vec<usize>>,
    },
}

impl JsonNode {
    fn into_node(self) -> Result<Node, ContainerError> {
        match self {
            JsonNode::Group { members } => {
                let members = members
                    .into_iter()
                    .map(|(name, node)| Ok((member_name(name)?, node.into_node()?)))
                    .collect::<Result<BTreeMap<_, _>, ContainerError>>()?;
                Ok(Node::Group(members))
            }
            JsonNode::Dataset { dtype, data, shape } => {
                let is_array = data.is_array();
                let mut flat = Vec::new();
                flatten(data, &mut flat);
                let data = convert_elements(dtype, flat)?;
                let value = match shape {
                    Some(shape) => DatasetValue::with_shape(shape, data)?,
                    None if is_array => DatasetValue::array(data),
                    None => DatasetValue::scalar(data),
                };
                Ok(Node::Dataset(value))
            }
        }
    }
}

/// Member names are single path components
fn member_name(name: String) -> Result<String, ContainerError> {
    if name.is_empty() || name.contains('/') {
        return Err(ContainerError::InvalidFormat(format!(
            "invalid member name {:?}",
            name
        )));
    }
    Ok(name)
}

fn flatten(value: serde_json::Value, out: &mut Vec<serde_json::Value>) {
    match value {
        serde_json::Value::Array(items) => items.into_iter().for_each(|v| flatten(v, out)),
        other => out.push(other),
    }
}

fn convert_elements(dtype: JsonDtype, values: Vec<serde_json::Value>) -> Result<Data, ContainerError> {
    let invalid = |v: &serde_json::Value| {
        ContainerError::InvalidFormat(format!("{:?} dataset cannot hold {}", dtype, v))
    };

    Ok(match dtype {
        JsonDtype::Int => Data::Int(
            values
                .iter()
                .map(|v| v.as_i64().ok_or_else(|| invalid(v)))
                .collect::<Result<_, _>>()?,
        ),
        JsonDtype::Float => Data::Float(
            values
                .iter()
                .map(|v| v.as_f64().ok_or_else(|| invalid(v)))
                .collect::<Result<_, _>>()?,
        ),
        JsonDtype::Bytes => Data::Bytes(
            values
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(|s| s.as_bytes().to_vec())
                        .ok_or_else(|| invalid(v))
                })
                .collect::<Result<_, _>>()?,
        ),
        JsonDtype::Text => Data::Text(
            values
                .iter()
                .map(|v| v.as_str().map(str::to_string).ok_or_else(|| invalid(v)))
                .collect::<Result<_, _>>()?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryContainer {
        MemoryContainer::builder()
            .dataset("entry/instrument/detector/beam_center_x", Data::Float(vec![1600.0]))
            .dataset("entry/instrument/detector/beam_center_y", Data::Float(vec![1700.0]))
            .scalar("mask", Data::Int(vec![0]))
            .group("entry/sample")
            .build()
            .unwrap()
    }

    #[test]
    fn test_walk_is_preorder_by_name() {
        let container = sample();
        assert_eq!(
            container.walk().unwrap(),
            vec![
                "entry",
                "entry/instrument",
                "entry/instrument/detector",
                "entry/instrument/detector/beam_center_x",
                "entry/instrument/detector/beam_center_y",
                "entry/sample",
                "mask",
            ]
        );
    }

    #[test]
    fn test_lookup_accepts_leading_slash() {
        let container = sample();
        assert_eq!(container.kind("/entry/sample").unwrap(), Some(NodeKind::Group));
        assert_eq!(container.kind("mask").unwrap(), Some(NodeKind::Dataset));
        assert_eq!(container.kind("entry/missing").unwrap(), None);
    }

    #[test]
    fn test_read_errors() {
        let container = sample();
        assert!(matches!(container.read("entry"), Err(ContainerError::NotADataset(_))));
        assert!(matches!(container.read("nothing"), Err(ContainerError::NotFound(_))));
        assert!(matches!(container.members("mask"), Err(ContainerError::NotAGroup(_))));
    }

    #[test]
    fn test_dataset_blocks_nested_insert() {
        let result = MemoryContainer::builder()
            .scalar("mask", Data::Int(vec![0]))
            .scalar("mask/applied", Data::Int(vec![1]))
            .build();
        assert!(matches!(result, Err(ContainerError::NotAGroup(_))));
    }

    #[test]
    fn test_group_redeclaration_keeps_members() {
        let container = MemoryContainer::builder()
            .dataset("_dectris/ntrigger", Data::Int(vec![1]))
            .group("_dectris")
            .build()
            .unwrap();
        assert_eq!(container.members("_dectris").unwrap(), vec!["ntrigger"]);
    }

    #[test]
    fn test_json_dump() {
        let json = r#"{
            "_dectris": {
                "kind": "group",
                "members": {
                    "nimages": { "kind": "dataset", "dtype": "int", "data": [100] },
                    "software_version": { "kind": "dataset", "dtype": "bytes", "data": "1.8.0" },
                    "flatfield": { "kind": "dataset", "dtype": "float", "data": [[1.0, 1.0], [0.5, 1.0]], "shape": [2, 2] }
                }
            }
        }"#;
        let container = MemoryContainer::from_json_str(json).unwrap();

        let nimages = container.read("_dectris/nimages").unwrap();
        assert_eq!(nimages.shape, vec![1]);
        assert_eq!(nimages.data, Data::Int(vec![100]));

        let version = container.read("_dectris/software_version").unwrap();
        assert!(version.shape.is_empty());
        assert_eq!(version.data, Data::Bytes(vec![b"1.8.0".to_vec()]));

        let flatfield = container.read("_dectris/flatfield").unwrap();
        assert_eq!(flatfield.shape, vec![2, 2]);
        assert_eq!(flatfield.len(), 4);
    }

    #[test]
    fn test_json_dtype_mismatch() {
        let json = r#"{"nimages": {"kind": "dataset", "dtype": "int", "data": "many"}}"#;
        assert!(matches!(
            MemoryContainer::from_json_str(json),
            Err(ContainerError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_json_member_names_are_single_components() {
        let slashed = r#"{"entry/wavelength": {"kind": "dataset", "dtype": "float", "data": 0.97}}"#;
        assert!(matches!(
            MemoryContainer::from_json_str(slashed),
            Err(ContainerError::InvalidFormat(_))
        ));

        let nested_empty = r#"{
            "entry": {"kind": "group", "members": {"": {"kind": "group"}}}
        }"#;
        assert!(matches!(
            MemoryContainer::from_json_str(nested_empty),
            Err(ContainerError::InvalidFormat(_))
        ));
    }
}
