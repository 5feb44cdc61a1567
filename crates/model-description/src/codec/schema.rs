//! Field schemas and the coercion checker.
//!
//! A [`Schema`] declares the fields of one (entity kind, version) shape:
//! each field's expected [`FieldType`] and what happens when it is absent
//! ([`FieldDefault`]). [`Schema::coerce`] checks a mapping document against
//! the schema and produces [`Fields`], a typed mapping the decoders take
//! values out of.
//!
//! Schemas are built additively so that each version can be written as a
//! diff against the previous one:
//!
//! ```rust
//! use model_description::codec::{FieldType, Schema};
//!
//! let v1 = Schema::new()
//!     .required("id", FieldType::String)
//!     .defaulted("public", FieldType::Bool, false);
//! let v2 = v1.clone().remove("public").optional("provider-id", FieldType::String);
//!
//! assert!(v2.field("public").is_none());
//! ```

use std::collections::BTreeMap;

use crate::codec::Document;
use crate::error::{join_path, ShapeError};
use crate::util::Timestamp;

// =============================================================================
// SCHEMA
// =============================================================================

/// The expected type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    /// Signed integer. Integral floats are accepted.
    Int,
    /// Non-negative integer, up to `u64::MAX`.
    Uint,
    Bool,
    /// Floating point. Integers are accepted.
    Float,
    /// RFC 3339 timestamp string.
    Time,
    /// Ordered list with elements of one type.
    List(Box<FieldType>),
    /// Mapping from string keys to values of one type.
    Map(Box<FieldType>),
    /// Mapping checked by a nested schema.
    Object(Box<Schema>),
    /// Any document, passed through unchecked.
    Any,
}

impl FieldType {
    pub fn list(element: FieldType) -> Self {
        FieldType::List(Box::new(element))
    }

    pub fn map(value: FieldType) -> Self {
        FieldType::Map(Box::new(value))
    }

    pub fn object(schema: Schema) -> Self {
        FieldType::Object(Box::new(schema))
    }

    /// Name used in shape errors.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Uint => "uint",
            FieldType::Bool => "bool",
            FieldType::Float => "float",
            FieldType::Time => "time",
            FieldType::List(_) => "list",
            FieldType::Map(_) | FieldType::Object(_) => "map",
            FieldType::Any => "any",
        }
    }
}

/// What to do when a field is absent (or null).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    /// Absence is a shape error.
    Required,
    /// Absence leaves the field out of the result.
    Omit,
    /// Absence substitutes this value, coerced like a present one.
    Value(Document),
}

/// One declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub default: FieldDefault,
}

/// The declared fields of one entity shape.
///
/// Field order is declaration order; redeclaring a name replaces the
/// earlier declaration in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a required field.
    pub fn required(self, name: &'static str, ty: FieldType) -> Self {
        self.with(FieldSpec {
            name,
            ty,
            default: FieldDefault::Required,
        })
    }

    /// Declares an omit-if-absent field.
    pub fn optional(self, name: &'static str, ty: FieldType) -> Self {
        self.with(FieldSpec {
            name,
            ty,
            default: FieldDefault::Omit,
        })
    }

    /// Declares a field with a default value.
    pub fn defaulted(self, name: &'static str, ty: FieldType, value: impl Into<Document>) -> Self {
        self.with(FieldSpec {
            name,
            ty,
            default: FieldDefault::Value(value.into()),
        })
    }

    /// Removes a field. Removing an undeclared field is a no-op.
    pub fn remove(mut self, name: &str) -> Self {
        self.fields.retain(|f| f.name != name);
        self
    }

    /// Adds or replaces a field declaration.
    pub fn with(mut self, spec: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|f| f.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Checks and converts a mapping document.
    pub fn coerce(&self, doc: &Document) -> Result<Fields, ShapeError> {
        self.coerce_at(doc, "")
    }

    /// Checks a mapping document without keeping the result.
    pub fn check(&self, doc: &Document) -> Result<(), ShapeError> {
        self.coerce(doc).map(|_| ())
    }

    fn coerce_at(&self, doc: &Document, path: &str) -> Result<Fields, ShapeError> {
        let map = doc
            .as_map()
            .ok_or_else(|| ShapeError::mismatch(path, "map", doc))?;

        let mut values = BTreeMap::new();
        for spec in &self.fields {
            let field_path = join_path(path, spec.name);
            // Unknown keys are ignored; null counts as absent.
            match map.get(spec.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    values.insert(spec.name, coerce_value(&spec.ty, value, &field_path)?);
                }
                None => match &spec.default {
                    FieldDefault::Required => {
                        return Err(ShapeError::missing(field_path, spec.ty.name()));
                    }
                    FieldDefault::Omit => {}
                    FieldDefault::Value(default) => {
                        values.insert(spec.name, coerce_value(&spec.ty, default, &field_path)?);
                    }
                },
            }
        }
        Ok(Fields { values })
    }
}

fn coerce_value(ty: &FieldType, doc: &Document, path: &str) -> Result<FieldValue, ShapeError> {
    let mismatch = || ShapeError::mismatch(path, ty.name(), doc);
    match ty {
        FieldType::String => doc
            .as_str()
            .map(|s| FieldValue::String(s.to_string()))
            .ok_or_else(mismatch),
        FieldType::Int => doc.as_int().map(FieldValue::Int).ok_or_else(mismatch),
        FieldType::Uint => doc.as_uint().map(FieldValue::Uint).ok_or_else(mismatch),
        FieldType::Bool => doc.as_bool().map(FieldValue::Bool).ok_or_else(mismatch),
        FieldType::Float => doc.as_float().map(FieldValue::Float).ok_or_else(mismatch),
        FieldType::Time => doc
            .as_str()
            .and_then(|s| Timestamp::parse(s).ok())
            .map(FieldValue::Time)
            .ok_or_else(mismatch),
        FieldType::List(element) => {
            let items = doc.as_list().ok_or_else(mismatch)?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| coerce_value(element, item, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::List)
        }
        FieldType::Map(value) => {
            let map = doc.as_map().ok_or_else(mismatch)?;
            map.iter()
                .map(|(key, item)| {
                    coerce_value(value, item, &join_path(path, key)).map(|v| (key.clone(), v))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(FieldValue::Map)
        }
        FieldType::Object(schema) => schema.coerce_at(doc, path).map(FieldValue::Object),
        FieldType::Any => Ok(FieldValue::Any(doc.clone())),
    }
}

// =============================================================================
// COERCED VALUES
// =============================================================================

/// A coerced field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Time(Timestamp),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
    Object(Fields),
    Any(Document),
}

impl FieldValue {
    fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Uint(_) => "uint",
            FieldValue::Float(_) => "float",
            FieldValue::String(_) => "string",
            FieldValue::Time(_) => "time",
            FieldValue::List(_) => "list",
            FieldValue::Map(_) | FieldValue::Object(_) => "map",
            FieldValue::Any(_) => "any",
        }
    }
}

/// The typed result of a schema check.
///
/// Values are moved out by name. Required and defaulted fields are always
/// present; omit-if-absent fields are present only when the input had them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fields {
    values: BTreeMap<&'static str, FieldValue>,
}

impl Fields {
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Takes a field that the schema guarantees is present.
    pub fn take<T: FromField>(&mut self, name: &'static str) -> Result<T, ShapeError> {
        self.take_opt(name)?
            .ok_or_else(|| ShapeError::missing(name, T::EXPECTED))
    }

    /// Takes a field that may have been omitted.
    pub fn take_opt<T: FromField>(&mut self, name: &'static str) -> Result<Option<T>, ShapeError> {
        match self.values.remove(name) {
            Some(value) => T::from_field(value)
                .map(Some)
                .map_err(|value| ShapeError::invalid(name, T::EXPECTED, value.type_name())),
            None => Ok(None),
        }
    }

    /// Takes a field, falling back to the type's zero value when omitted.
    pub fn take_or_default<T: FromField + Default>(
        &mut self,
        name: &'static str,
    ) -> Result<T, ShapeError> {
        self.take_opt(name).map(Option::unwrap_or_default)
    }
}

/// Conversion out of a coerced [`FieldValue`].
pub trait FromField: Sized {
    /// Type name used when the conversion fails.
    const EXPECTED: &'static str;

    /// Converts the value, handing it back unchanged on mismatch.
    fn from_field(value: FieldValue) -> Result<Self, FieldValue>;
}

impl FromField for String {
    const EXPECTED: &'static str = "string";

    fn from_field(value: FieldValue) -> Result<Self, FieldValue> {
        match value {
            FieldValue::String(s) => Ok(s),
            other => Err(other),
        }
    }
}

impl FromField for i64 {
    const EXPECTED: &'static str = "int";

    fn from_field(value: FieldValue) -> Result<Self, FieldValue> {
        match value {
            FieldValue::Int(n) => Ok(n),
            other => Err(other),
        }
    }
}

impl FromField for u64 {
    const EXPECTED: &'static str = "uint";

    fn from_field(value: FieldValue) -> Result<Self, FieldValue> {
        match value {
            FieldValue::Uint(n) => Ok(n),
            other => Err(other),
        }
    }
}

impl FromField for bool {
    const EXPECTED: &'static str = "bool";

    fn from_field(value: FieldValue) -> Result<Self, FieldValue> {
        match value {
            FieldValue::Bool(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl FromField for f64 {
    const EXPECTED: &'static str = "float";

    fn from_field(value: FieldValue) -> Result<Self, FieldValue> {
        match value {
            FieldValue::Float(f) => Ok(f),
            other => Err(other),
        }
    }
}

impl FromField for Timestamp {
    const EXPECTED: &'static str = "time";

    fn from_field(value: FieldValue) -> Result<Self, FieldValue> {
        match value {
            FieldValue::Time(t) => Ok(t),
            other => Err(other),
        }
    }
}

impl FromField for Document {
    const EXPECTED: &'static str = "any";

    fn from_field(value: FieldValue) -> Result<Self, FieldValue> {
        match value {
            FieldValue::Any(doc) => Ok(doc),
            other => Err(other),
        }
    }
}

impl FromField for Fields {
    const EXPECTED: &'static str = "map";

    fn from_field(value: FieldValue) -> Result<Self, FieldValue> {
        match value {
            FieldValue::Object(fields) => Ok(fields),
            other => Err(other),
        }
    }
}

impl<T: FromField> FromField for Vec<T> {
    const EXPECTED: &'static str = "list";

    fn from_field(value: FieldValue) -> Result<Self, FieldValue> {
        match value {
            FieldValue::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(T::from_field(item)?);
                }
                Ok(out)
            }
            other => Err(other),
        }
    }
}

impl<T: FromField> FromField for BTreeMap<String, T> {
    const EXPECTED: &'static str = "map";

    fn from_field(value: FieldValue) -> Result<Self, FieldValue> {
        match value {
            FieldValue::Map(entries) => {
                let mut out = BTreeMap::new();
                for (key, item) in entries {
                    out.insert(key, T::from_field(item)?);
                }
                Ok(out)
            }
            other => Err(other),
        }
    }
}
