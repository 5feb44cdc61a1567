//! Primitive helpers shared by the per-kind encoders and decoders.

use std::collections::BTreeMap;

use crate::codec::schema::{FieldType, Fields, Schema};
use crate::codec::Document;
use crate::error::{ShapeError, VersionError};
use crate::model::{Collection, Entity, EntityKind, Platform};

/// Key of the version integer in every versioned scope.
pub const VERSION_KEY: &str = "version";

// =============================================================================
// DECODING
// =============================================================================

/// Reads the `version` integer of a versioned scope.
pub fn read_version(doc: &Document, kind: EntityKind) -> Result<i64, VersionError> {
    match doc.get(VERSION_KEY).filter(|v| !v.is_null()) {
        None => Err(VersionError::Missing { kind }),
        Some(value) => value.as_int().ok_or_else(|| VersionError::NotInteger {
            kind,
            got: value.describe(),
        }),
    }
}

/// Converts an empty string to `None`.
pub(crate) fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Schema of a structured platform object.
pub(crate) fn platform_schema() -> Schema {
    Schema::new()
        .required("architecture", FieldType::String)
        .required("os", FieldType::String)
        .required("channel", FieldType::String)
}

/// Builds a platform from fields checked by [`platform_schema`].
pub(crate) fn decode_platform(mut fields: Fields) -> Result<Platform, ShapeError> {
    Ok(Platform::new(
        fields.take::<String>("architecture")?,
        fields.take::<String>("os")?,
        fields.take::<String>("channel")?,
    ))
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for assembling a mapping document.
///
/// Keys land in a sorted map, so the output is independent of the order
/// fields are written in.
#[derive(Debug, Clone, Default)]
pub struct MapWriter {
    map: BTreeMap<String, Document>,
}

impl MapWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a versioned scope.
    pub fn versioned(version: u32) -> Self {
        Self::new().field(VERSION_KEY, version)
    }

    /// Writes a field unconditionally.
    pub fn field(mut self, name: &str, value: impl Into<Document>) -> Self {
        self.map.insert(name.to_string(), value.into());
        self
    }

    /// Writes a field only when it is set.
    pub fn opt_field<T: Into<Document>>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.field(name, value),
            None => self,
        }
    }

    /// Writes a string field only when it is non-empty.
    pub fn non_empty_str(self, name: &str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.field(name, value)
        }
    }

    /// Writes a list field only when it is non-empty.
    pub fn non_empty_list<T: Clone + Into<Document>>(self, name: &str, values: &[T]) -> Self {
        if values.is_empty() {
            self
        } else {
            self.field(name, values.to_vec())
        }
    }

    /// Writes a mapping field only when it is non-empty.
    pub fn non_empty_map<T: Clone + Into<Document>>(
        self,
        name: &str,
        values: &BTreeMap<String, T>,
    ) -> Self {
        if values.is_empty() {
            self
        } else {
            self.field(name, values.clone())
        }
    }

    /// Writes a nested mapping.
    pub fn object(self, name: &str, writer: MapWriter) -> Self {
        self.field(name, writer.finish())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn finish(self) -> Document {
        Document::Map(self.map)
    }
}

/// Encodes a collection as `{"version": <latest>, <key>: [...]}`.
pub fn encode_collection<T: Entity>(
    key: &str,
    items: &Collection<T>,
    encode: impl Fn(&T) -> Document,
) -> Document {
    let encoded: Vec<Document> = items.iter().map(encode).collect();
    MapWriter::versioned(T::LATEST_VERSION)
        .field(key, Document::List(encoded))
        .finish()
}

/// Encodes a platform as its structured `{architecture, os, channel}` form.
pub(crate) fn encode_platform(platform: &Platform) -> Document {
    MapWriter::new()
        .field("architecture", platform.architecture.as_str())
        .field("os", platform.os.as_str())
        .field("channel", platform.channel.as_str())
        .finish()
}

/// Converts identifier-keyed or identifier-valued maps to string maps.
pub(crate) fn string_map<K: AsRef<str>, V: AsRef<str>>(
    map: &BTreeMap<K, V>,
) -> BTreeMap<String, String> {
    map.iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .collect()
}

/// Converts a list of identifiers to strings.
pub(crate) fn string_list<T: AsRef<str>>(items: &[T]) -> Vec<String> {
    items.iter().map(|item| item.as_ref().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::doc;
    use serde_json::json;

    #[test]
    fn test_read_version() {
        assert_eq!(
            read_version(&doc(json!({"version": 3})), EntityKind::Machine),
            Ok(3)
        );
        assert_eq!(
            read_version(&doc(json!({})), EntityKind::Machine),
            Err(VersionError::Missing {
                kind: EntityKind::Machine
            })
        );
        let err = read_version(&doc(json!({"version": "2"})), EntityKind::Machine).unwrap_err();
        assert_eq!(err.to_string(), "machine version: expected int, got string(\"2\")");
    }

    #[test]
    fn test_map_writer_conditional_fields() {
        let written = MapWriter::versioned(2)
            .field("name", "mysql")
            .opt_field::<String>("leader", None)
            .opt_field("principal", Some("wordpress/0"))
            .non_empty_str("placement", "")
            .non_empty_list::<String>("jobs", &[])
            .non_empty_map("acl", &BTreeMap::from([("admin".to_string(), "admin".to_string())]))
            .finish();

        assert_eq!(
            written,
            doc(json!({
                "version": 2,
                "name": "mysql",
                "principal": "wordpress/0",
                "acl": {"admin": "admin"}
            }))
        );
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(String::new()), None);
        assert_eq!(non_empty("0".to_string()), Some("0".to_string()));
    }
}
