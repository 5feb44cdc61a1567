//! Secret and secret revision encoding/decoding.

use crate::codec::primitives::{encode_collection, MapWriter};
use crate::codec::registry::{Registry, VersionHistory};
use crate::codec::schema::{FieldType, Fields};
use crate::codec::Document;
use crate::error::DecodeError;
use crate::model::{Collection, Secret, SecretRevision};

// =============================================================================
// DECODING
// =============================================================================

pub(crate) fn history() -> VersionHistory<Secret> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("id", FieldType::String)
                    .defaulted("description", FieldType::String, "")
                    .defaulted("label", FieldType::String, "")
                    .defaulted("rotate-policy", FieldType::String, "")
                    .required("owner", FieldType::String)
                    .required("create-time", FieldType::Time)
                    .required("update-time", FieldType::Time)
                    .optional("next-rotate-time", FieldType::Time)
                    .required("revisions", FieldType::Any)
            },
            decode_secret,
        )
        .version(
            2,
            |s| s.defaulted("auto-prune", FieldType::Bool, false),
            decode_secret,
        )
}

fn decode_secret(registry: &Registry, _: u32, mut f: Fields) -> Result<Secret, DecodeError> {
    let revisions_doc: Document = f.take("revisions")?;
    let revisions = registry
        .secret_revision
        .decode_collection(registry, &revisions_doc, "revisions")?;
    Ok(Secret {
        id: f.take::<String>("id")?.into(),
        description: f.take("description")?,
        label: f.take("label")?,
        rotate_policy: f.take("rotate-policy")?,
        owner: f.take("owner")?,
        create_time: f.take("create-time")?,
        update_time: f.take("update-time")?,
        next_rotate_time: f.take_opt("next-rotate-time")?,
        auto_prune: f.take_or_default("auto-prune")?,
        revisions,
    })
}

pub(crate) fn revision_history() -> VersionHistory<SecretRevision> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("number", FieldType::Int)
                    .required("create-time", FieldType::Time)
                    .required("update-time", FieldType::Time)
                    .defaulted("obsolete", FieldType::Bool, false)
                    .optional("content", FieldType::map(FieldType::String))
                    .optional("expire-time", FieldType::Time)
            },
            decode_revision,
        )
        .version(
            2,
            |s| {
                s.optional("backend-id", FieldType::String)
                    .defaulted("pending-delete", FieldType::Bool, false)
            },
            decode_revision,
        )
}

fn decode_revision(_: &Registry, _: u32, mut f: Fields) -> Result<SecretRevision, DecodeError> {
    Ok(SecretRevision {
        number: f.take("number")?,
        create_time: f.take("create-time")?,
        update_time: f.take("update-time")?,
        obsolete: f.take("obsolete")?,
        pending_delete: f.take_or_default("pending-delete")?,
        content: f.take_or_default("content")?,
        expire_time: f.take_opt("expire-time")?,
        backend_id: f.take_opt("backend-id")?,
    })
}

/// Decodes a standalone `{"version": N, "secrets": [...]}` collection.
pub fn decode_secrets(
    registry: &Registry,
    doc: &Document,
) -> Result<Collection<Secret>, DecodeError> {
    registry.secret.decode_collection(registry, doc, "secrets")
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a secret and its revisions at the latest version.
pub fn encode_secret(secret: &Secret) -> Document {
    MapWriter::new()
        .field("id", secret.id.as_str())
        .field("description", secret.description.as_str())
        .field("label", secret.label.as_str())
        .field("rotate-policy", secret.rotate_policy.as_str())
        .field("owner", secret.owner.as_str())
        .field("create-time", secret.create_time)
        .field("update-time", secret.update_time)
        .opt_field("next-rotate-time", secret.next_rotate_time)
        .field("auto-prune", secret.auto_prune)
        .field(
            "revisions",
            encode_collection("revisions", secret.revisions(), encode_revision),
        )
        .finish()
}

/// Encodes a secret revision at the latest version.
pub fn encode_revision(revision: &SecretRevision) -> Document {
    MapWriter::new()
        .field("number", revision.number)
        .field("create-time", revision.create_time)
        .field("update-time", revision.update_time)
        .field("obsolete", revision.obsolete)
        .field("pending-delete", revision.pending_delete)
        .non_empty_map("content", &revision.content)
        .opt_field("expire-time", revision.expire_time)
        .opt_field("backend-id", revision.backend_id.as_deref())
        .finish()
}
