use serde::{Deserialize, Serialize};

use super::ContainerError;

/// Typed element buffer of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Data {
    /// Signed or unsigned integers, widened to `i64`
    Int(Vec<i64>),
    /// Floating-point values, widened to `f64`
    Float(Vec<f64>),
    /// Byte strings (fixed or variable length ASCII)
    Bytes(Vec<Vec<u8>>),
    /// Already decoded text
    Text(Vec<String>),
}

impl Data {
    /// Number of elements held
    pub fn len(&self) -> usize {
        match self {
            Data::Int(v) => v.len(),
            Data::Float(v) => v.len(),
            Data::Bytes(v) => v.len(),
            Data::Text(v) => v.len(),
        }
    }

    /// True when no element is held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn element(&self, index: usize) -> Option<ScalarValue> {
        match self {
            Data::Int(v) => v.get(index).map(|x| ScalarValue::Int(*x)),
            Data::Float(v) => v.get(index).map(|x| ScalarValue::Float(*x)),
            Data::Bytes(v) => v.get(index).map(|b| ScalarValue::from_bytes(b)),
            Data::Text(v) => v.get(index).map(|s| ScalarValue::Text(s.clone())),
        }
    }
}

/// Raw contents of a dataset as handed out by a [`Container`](super::Container)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetValue {
    /// Dataset shape; empty for rank-0 scalars
    pub shape: Vec<usize>,
    /// Flattened elements
    pub data: Data,
}

impl DatasetValue {
    /// Rank-0 dataset holding a single element
    pub fn scalar(data: Data) -> Self {
        Self {
            shape: Vec::new(),
            data,
        }
    }

    /// One-dimensional dataset
    pub fn array(data: Data) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Dataset with an explicit shape.
    ///
    /// Fails if the shape does not account for every element.
    pub fn with_shape(shape: Vec<usize>, data: Data) -> Result<Self, ContainerError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ContainerError::InvalidFormat(format!(
                "shape {:?} holds {} elements, data has {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for an empty dataset
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The single element, unwrapped and decoded, or `None` when the dataset
    /// holds zero or several elements.
    pub fn single(&self) -> Option<ScalarValue> {
        if self.len() == 1 {
            self.data.element(0)
        } else {
            None
        }
    }

    /// All elements, each decoded to a [`ScalarValue`]
    pub fn elements(&self) -> Vec<ScalarValue> {
        (0..self.len()).filter_map(|i| self.data.element(i)).collect()
    }
}

/// A single decoded value read out of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    /// Integer value
    Int(i64),
    /// Floating-point value
    Float(f64),
    /// Decoded text
    Text(String),
    /// Byte sequence that is not valid UTF-8
    Bytes(Vec<u8>),
}

/// Floats that convert to `i64` without saturating; 2^63 is exactly representable
const I64_RANGE: std::ops::Range<f64> = (i64::MIN as f64)..(-(i64::MIN as f64));

impl ScalarValue {
    /// Decode a stored byte string.
    ///
    /// Trailing NUL padding from fixed-length strings is dropped; bytes that
    /// are not valid UTF-8 are kept as they are.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let end = bytes
            .iter()
            .rposition(|b| *b != 0)
            .map(|i| i + 1)
            .unwrap_or(0);
        match std::str::from_utf8(&bytes[..end]) {
            Ok(text) => ScalarValue::Text(text.to_string()),
            Err(_) => ScalarValue::Bytes(bytes.to_vec()),
        }
    }

    /// Integer view: integers, integral floats and numeric text.
    ///
    /// Floats outside the `i64` range have no integer view.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(v) => Some(*v),
            ScalarValue::Float(v) if v.fract() == 0.0 && I64_RANGE.contains(v) => Some(*v as i64),
            ScalarValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Floating-point view: numbers and numeric text
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Int(v) => Some(*v as f64),
            ScalarValue::Float(v) => Some(*v),
            ScalarValue::Text(s) => s.trim().parse().ok(),
            ScalarValue::Bytes(_) => None,
        }
    }

    /// Text view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarValue::Int(_) => "integer",
            ScalarValue::Float(_) => "float",
            ScalarValue::Text(_) => "text",
            ScalarValue::Bytes(_) => "bytes",
        }
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Int(v) => write!(f, "{}", v),
            ScalarValue::Float(v) => write!(f, "{}", v),
            ScalarValue::Text(s) => write!(f, "{}", s),
            ScalarValue::Bytes(b) => write!(f, "{:?}", b),
        }
    }
}
