//! Status encoding/decoding.
//!
//! Status is a nested scope that carries its own `version`, independent of
//! the entity it belongs to.

use crate::codec::primitives::MapWriter;
use crate::codec::registry::{Registry, VersionHistory};
use crate::codec::schema::{FieldType, Fields};
use crate::codec::Document;
use crate::error::{DecodeError, DecodeResultExt};
use crate::model::{Entity, Status};

// =============================================================================
// DECODING
// =============================================================================

pub(crate) fn history() -> VersionHistory<Status> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("value", FieldType::String)
                    .defaulted("message", FieldType::String, "")
                    .optional("data", FieldType::map(FieldType::Any))
                    .required("updated", FieldType::Time)
            },
            decode_fields,
        )
        .version(
            2,
            |s| s.defaulted("neverset", FieldType::Bool, false),
            decode_fields,
        )
}

fn decode_fields(_: &Registry, _: u32, mut f: Fields) -> Result<Status, DecodeError> {
    Ok(Status {
        value: f.take("value")?,
        message: f.take("message")?,
        data: f.take_or_default("data")?,
        updated: f.take("updated")?,
        never_set: f.take_or_default("neverset")?,
    })
}

/// Decodes a standalone status document.
pub fn decode_status(registry: &Registry, doc: &Document) -> Result<Status, DecodeError> {
    registry.status.decode_versioned(registry, doc)
}

/// Takes and decodes a required nested status field.
pub(crate) fn take_status(
    registry: &Registry,
    fields: &mut Fields,
    name: &'static str,
) -> Result<Status, DecodeError> {
    let doc: Document = fields.take(name)?;
    decode_status(registry, &doc).within_field(name)
}

/// Takes and decodes an omit-if-absent nested status field.
pub(crate) fn take_status_opt(
    registry: &Registry,
    fields: &mut Fields,
    name: &'static str,
) -> Result<Option<Status>, DecodeError> {
    match fields.take_opt::<Document>(name)? {
        Some(doc) => decode_status(registry, &doc).within_field(name).map(Some),
        None => Ok(None),
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a status at the latest version.
pub fn encode_status(status: &Status) -> Document {
    MapWriter::versioned(Status::LATEST_VERSION)
        .field("value", status.value.as_str())
        .field("message", status.message.as_str())
        .non_empty_map("data", &status.data)
        .field("updated", status.updated)
        .field("neverset", status.never_set)
        .finish()
}
