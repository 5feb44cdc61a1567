//! The recursive document value all input and output flows through.
//!
//! A [`Document`] is a scalar, an ordered list, or a string-keyed mapping.
//! Mappings are kept in key order so re-encoding is deterministic; key order
//! carries no meaning when decoding. JSON is the text serialization.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use crate::error::{DecodeError, DecodeErrorKind};
use crate::limits::{MAX_DOCUMENT_SIZE, MAX_NESTING_DEPTH};
use crate::util::Timestamp;

/// A self-describing wire value.
///
/// Integers that fit `i64` are always [`Document::Int`]; [`Document::Uint`]
/// only holds values above `i64::MAX`. Build integers through `From` to keep
/// that split.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Document {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned integer too large for `i64`.
    Uint(u64),
    Float(f64),
    String(String),
    List(Vec<Document>),
    Map(BTreeMap<String, Document>),
}

impl Document {
    /// An empty mapping.
    pub fn empty_map() -> Self {
        Document::Map(BTreeMap::new())
    }

    /// An empty list.
    pub fn empty_list() -> Self {
        Document::List(Vec::new())
    }

    /// Name of this value's type, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Document::Null => "null",
            Document::Bool(_) => "bool",
            Document::Int(_) => "int",
            Document::Uint(_) => "uint",
            Document::Float(_) => "float",
            Document::String(_) => "string",
            Document::List(_) => "list",
            Document::Map(_) => "map",
        }
    }

    /// Renders `<type>(<value>)` for error messages.
    pub fn describe(&self) -> String {
        format!("{}({})", self.type_name(), self)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Document::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Document::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an integer. Integral floats are accepted since
    /// some producers write every number as a float.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Document::Int(i) => Some(*i),
            Document::Float(f)
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
            {
                Some(*f as i64)
            }
            _ => None,
        }
    }

    /// Returns the value as a non-negative integer, including values above
    /// `i64::MAX`.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Document::Uint(u) => Some(*u),
            _ => self.as_int().and_then(|i| u64::try_from(i).ok()),
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Document::Float(f) => Some(*f),
            Document::Int(i) => Some(*i as f64),
            Document::Uint(u) => Some(*u as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Document]> {
        match self {
            Document::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Document>> {
        match self {
            Document::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Nesting depth: scalars are 0, a list or map is one more than its
    /// deepest member.
    pub fn depth(&self) -> usize {
        match self {
            Document::List(items) => 1 + items.iter().map(Document::depth).max().unwrap_or(0),
            Document::Map(map) => 1 + map.values().map(Document::depth).max().unwrap_or(0),
            _ => 0,
        }
    }

    /// Parses JSON text into a document.
    pub fn from_json_str(text: &str) -> Result<Self, DecodeError> {
        if text.len() > MAX_DOCUMENT_SIZE {
            return Err(DecodeErrorKind::LengthExceedsLimit {
                field: "document",
                len: text.len(),
                max: MAX_DOCUMENT_SIZE,
            }
            .into());
        }

        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| DecodeError::new(DecodeErrorKind::Syntax(e.to_string())))?;

        if json_depth(&value) > MAX_NESTING_DEPTH {
            return Err(DecodeErrorKind::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            }
            .into());
        }

        Ok(Document::from(value))
    }

    /// Compact JSON text.
    pub fn to_json_string(&self) -> String {
        serde_json::Value::from(self).to_string()
    }

    /// Indented JSON text, for persisted artifacts and diagnostics.
    pub fn to_json_string_pretty(&self) -> String {
        format!("{:#}", serde_json::Value::from(self))
    }
}

static NULL: Document = Document::Null;

/// Missing keys, out-of-range indices and non-container values index to
/// [`Document::Null`].
impl Index<&str> for Document {
    type Output = Document;

    fn index(&self, key: &str) -> &Document {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for Document {
    type Output = Document;

    fn index(&self, index: usize) -> &Document {
        self.as_list().and_then(|items| items.get(index)).unwrap_or(&NULL)
    }
}

fn json_depth(value: &serde_json::Value) -> usize {
    match value {
        serde_json::Value::Array(items) => 1 + items.iter().map(json_depth).max().unwrap_or(0),
        serde_json::Value::Object(map) => 1 + map.values().map(json_depth).max().unwrap_or(0),
        _ => 0,
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Document::Null => f.write_str("null"),
            Document::Bool(b) => write!(f, "{}", b),
            Document::Int(i) => write!(f, "{}", i),
            Document::Uint(u) => write!(f, "{}", u),
            Document::Float(x) => write!(f, "{}", x),
            Document::String(s) => write!(f, "{:?}", s),
            Document::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Document::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<bool> for Document {
    fn from(b: bool) -> Self {
        Document::Bool(b)
    }
}

impl From<i64> for Document {
    fn from(i: i64) -> Self {
        Document::Int(i)
    }
}

impl From<u32> for Document {
    fn from(i: u32) -> Self {
        Document::Int(i as i64)
    }
}

impl From<u64> for Document {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => Document::Int(i),
            Err(_) => Document::Uint(u),
        }
    }
}

impl From<f64> for Document {
    fn from(x: f64) -> Self {
        Document::Float(x)
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Document::String(s.to_string())
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Document::String(s)
    }
}

impl From<Timestamp> for Document {
    fn from(ts: Timestamp) -> Self {
        Document::String(ts.to_rfc3339())
    }
}

impl<T: Into<Document>> From<Vec<T>> for Document {
    fn from(items: Vec<T>) -> Self {
        Document::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Document>> From<BTreeMap<String, T>> for Document {
    fn from(map: BTreeMap<String, T>) -> Self {
        Document::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<serde_json::Value> for Document {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Document::Null,
            serde_json::Value::Bool(b) => Document::Bool(b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Document::Int(i),
                (None, Some(u)) => Document::Uint(u),
                (None, None) => Document::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Document::String(s),
            serde_json::Value::Array(items) => {
                Document::List(items.into_iter().map(Document::from).collect())
            }
            serde_json::Value::Object(map) => Document::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Document::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&Document> for serde_json::Value {
    fn from(doc: &Document) -> Self {
        match doc {
            Document::Null => serde_json::Value::Null,
            Document::Bool(b) => serde_json::Value::Bool(*b),
            Document::Int(i) => serde_json::Value::from(*i),
            Document::Uint(u) => serde_json::Value::from(*u),
            Document::Float(x) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Document::String(s) => serde_json::Value::String(s.clone()),
            Document::List(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Document::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Document> for serde_json::Value {
    fn from(doc: Document) -> Self {
        serde_json::Value::from(&doc)
    }
}
