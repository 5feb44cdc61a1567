//! Error types for decoding, migration and validation.
//!
//! Decode failures are a low-level cause ([`DecodeErrorKind`]) wrapped in
//! successive [`ContextFrame`]s as the error propagates out through the
//! enclosing entities. Callers match on the kind; the rendered text is for
//! humans.

use std::fmt;

use thiserror::Error;

use crate::codec::Document;
use crate::model::EntityKind;

/// A field has the wrong type or a required field is absent.
///
/// Renders as `"<path>: expected <type>, got <kind>(<value>)"`, or
/// `"... got nothing"` when the field is missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}expected {expected}, got {}", path_prefix(.path), got_text(.got))]
pub struct ShapeError {
    /// Field path, `.`-separated with `[i]` list indices. Empty at the root.
    pub path: String,
    /// The expected type or shape.
    pub expected: String,
    /// What was found instead; `None` when nothing was present.
    pub got: Option<String>,
}

impl ShapeError {
    /// A required field with no default was absent.
    pub fn missing(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            got: None,
        }
    }

    /// A field held a value of the wrong type.
    pub fn mismatch(path: impl Into<String>, expected: impl Into<String>, got: &Document) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            got: Some(got.describe()),
        }
    }

    /// A field held a value of the right type that is still not acceptable.
    pub fn invalid(
        path: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            got: Some(got.into()),
        }
    }

    /// Prefixes the path with an enclosing field name or list index.
    pub(crate) fn within(mut self, parent: &str) -> Self {
        self.path = join_path(parent, &self.path);
        self
    }
}

fn path_prefix(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("{}: ", path)
    }
}

fn got_text(got: &Option<String>) -> &str {
    got.as_deref().unwrap_or("nothing")
}

/// Joins a parent path and a child segment.
pub(crate) fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else if child.is_empty() {
        parent.to_string()
    } else if child.starts_with('[') {
        format!("{}{}", parent, child)
    } else {
        format!("{}.{}", parent, child)
    }
}

/// The `version` of a versioned scope is missing, malformed or unknown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("{kind} version missing")]
    Missing { kind: EntityKind },

    #[error("{kind} version: expected int, got {got}")]
    NotInteger { kind: EntityKind, got: String },

    #[error("{kind} version {version} not valid")]
    Unknown { kind: EntityKind, version: i64 },
}

impl VersionError {
    /// The entity kind whose scope carried the bad version.
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            VersionError::Missing { kind }
            | VersionError::NotInteger { kind, .. }
            | VersionError::Unknown { kind, .. } => *kind,
        }
    }
}

/// A semantic upgrade of legacy data could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    #[error("cannot derive platform from series {series:?}: unknown series")]
    UnknownSeries { series: String },

    #[error(
        "cannot reclassify {auth_type:?} credential: attributes {attributes:?} match no known auth type"
    )]
    UnrecognisedCredential {
        auth_type: String,
        attributes: Vec<String>,
    },

    #[error("cannot classify empty host identifier")]
    EmptyHost,

    #[error("unit host {host:?} has an ordinal out of range")]
    UnitOrdinalOutOfRange { host: String },
}

/// The low-level cause of a [`DecodeError`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeErrorKind {
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("malformed document text: {0}")]
    Syntax(String),

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("document nesting exceeds maximum depth {max}")]
    NestingTooDeep { max: usize },
}

/// One level of context around a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextFrame {
    /// An entity of the given kind, decoded at `version`, optionally at a
    /// position in its enclosing list.
    Entity {
        kind: EntityKind,
        version: u32,
        index: Option<usize>,
    },
    /// A named field or collection of the enclosing entity.
    Field(&'static str),
}

impl ContextFrame {
    pub(crate) fn entity(kind: EntityKind, version: u32, index: Option<usize>) -> Self {
        ContextFrame::Entity {
            kind,
            version,
            index,
        }
    }
}

impl fmt::Display for ContextFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextFrame::Entity {
                kind,
                version,
                index: Some(index),
            } => write!(f, "{} {} v{}", kind, index, version),
            ContextFrame::Entity {
                kind,
                version,
                index: None,
            } => write!(f, "{} v{}", kind, version),
            ContextFrame::Field(name) => f.write_str(name),
        }
    }
}

/// Error decoding a document into a model graph.
///
/// Renders the context frames outermost first, then the cause:
/// `"model v1: applications: application 0 v1: name: expected string, got nothing"`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}{kind}", context_prefix(.context))]
pub struct DecodeError {
    #[source]
    kind: DecodeErrorKind,
    /// Outermost frame first.
    context: Vec<ContextFrame>,
}

impl DecodeError {
    /// Creates an error with no context.
    pub fn new(kind: DecodeErrorKind) -> Self {
        Self {
            kind,
            context: Vec::new(),
        }
    }

    /// The low-level cause.
    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }

    /// Context frames, outermost first.
    pub fn context(&self) -> &[ContextFrame] {
        &self.context
    }

    /// Wraps the error in an enclosing context frame.
    pub fn within(mut self, frame: ContextFrame) -> Self {
        self.context.insert(0, frame);
        self
    }

    /// Returns the shape error, if this is one.
    pub fn as_shape(&self) -> Option<&ShapeError> {
        match &self.kind {
            DecodeErrorKind::Shape(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the version error, if this is one.
    pub fn as_version(&self) -> Option<&VersionError> {
        match &self.kind {
            DecodeErrorKind::Version(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the migration error, if this is one.
    pub fn as_migration(&self) -> Option<&MigrationError> {
        match &self.kind {
            DecodeErrorKind::Migration(err) => Some(err),
            _ => None,
        }
    }
}

fn context_prefix(context: &[ContextFrame]) -> String {
    context.iter().map(|frame| format!("{}: ", frame)).collect()
}

impl From<DecodeErrorKind> for DecodeError {
    fn from(kind: DecodeErrorKind) -> Self {
        DecodeError::new(kind)
    }
}

impl From<ShapeError> for DecodeError {
    fn from(err: ShapeError) -> Self {
        DecodeError::new(DecodeErrorKind::Shape(err))
    }
}

impl From<VersionError> for DecodeError {
    fn from(err: VersionError) -> Self {
        DecodeError::new(DecodeErrorKind::Version(err))
    }
}

impl From<MigrationError> for DecodeError {
    fn from(err: MigrationError) -> Self {
        DecodeError::new(DecodeErrorKind::Migration(err))
    }
}

/// Adds context frames to fallible decode steps.
pub(crate) trait DecodeResultExt<T> {
    fn within(self, frame: ContextFrame) -> Result<T, DecodeError>;

    fn within_field(self, name: &'static str) -> Result<T, DecodeError>;
}

impl<T, E: Into<DecodeError>> DecodeResultExt<T> for Result<T, E> {
    fn within(self, frame: ContextFrame) -> Result<T, DecodeError> {
        self.map_err(|err| err.into().within(frame))
    }

    fn within_field(self, name: &'static str) -> Result<T, DecodeError> {
        self.within(ContextFrame::Field(name))
    }
}

/// A structural graph invariant does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} {id:?}: {reason}")]
pub struct ValidationError {
    /// Kind of the offending entity.
    pub kind: EntityKind,
    /// Identifier of the offending entity (may be empty when that is the
    /// problem).
    pub id: String,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub(crate) fn new(kind: EntityKind, id: impl Into<String>, reason: ValidationReason) -> Self {
        Self {
            kind,
            id: id.into(),
            reason,
        }
    }
}

/// Why a [`ValidationError`] was raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationReason {
    #[error("empty {field}")]
    EmptyIdentifier { field: &'static str },

    #[error("duplicate identifier")]
    DuplicateIdentifier,

    #[error("invalid identifier: {detail}")]
    InvalidIdentifier { detail: String },

    #[error("{field} references unknown {target} {id:?}")]
    MissingReference {
        field: &'static str,
        target: EntityKind,
        id: String,
    },

    #[error("{collection} must not be empty")]
    EmptyCollection { collection: &'static str },

    #[error("principal unit is not assigned to a machine")]
    Unassigned,

    #[error("invalid {field}: {detail}")]
    InvalidValue { field: &'static str, detail: String },
}

/// Error from the text-level import/export helpers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
