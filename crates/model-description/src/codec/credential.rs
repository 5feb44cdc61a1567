//! Cloud credential encoding/decoding.
//!
//! The credential is a nested scope carrying its own `version`. Version 2
//! has the same fields as version 1; it marks documents whose auth type has
//! already been reclassified.

use crate::codec::migrate;
use crate::codec::primitives::MapWriter;
use crate::codec::registry::{Registry, VersionHistory};
use crate::codec::schema::{FieldType, Fields};
use crate::codec::Document;
use crate::error::{DecodeError, DecodeResultExt};
use crate::model::{CloudCredential, Entity};

// =============================================================================
// DECODING
// =============================================================================

pub(crate) fn history() -> VersionHistory<CloudCredential> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("owner", FieldType::String)
                    .required("cloud", FieldType::String)
                    .required("name", FieldType::String)
                    .required("auth-type", FieldType::String)
                    .defaulted(
                        "attributes",
                        FieldType::map(FieldType::String),
                        Document::empty_map(),
                    )
            },
            decode_credential,
        )
        .version(2, |s| s, decode_credential)
}

fn decode_credential(
    _: &Registry,
    version: u32,
    mut f: Fields,
) -> Result<CloudCredential, DecodeError> {
    let mut auth_type: String = f.take("auth-type")?;
    let mut attributes = f.take("attributes")?;
    if version < 2 {
        (auth_type, attributes) =
            migrate::reclassify_credential(auth_type, attributes).within_field("auth-type")?;
    }
    Ok(CloudCredential {
        owner: f.take("owner")?,
        cloud: f.take("cloud")?,
        name: f.take("name")?,
        auth_type,
        attributes,
    })
}

/// Decodes a standalone credential document.
pub fn decode_credential_doc(
    registry: &Registry,
    doc: &Document,
) -> Result<CloudCredential, DecodeError> {
    registry.credential.decode_versioned(registry, doc)
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a credential at the latest version.
pub fn encode_credential(credential: &CloudCredential) -> Document {
    MapWriter::versioned(CloudCredential::LATEST_VERSION)
        .field("owner", credential.owner.as_str())
        .field("cloud", credential.cloud.as_str())
        .field("name", credential.name.as_str())
        .field("auth-type", credential.auth_type.as_str())
        .field("attributes", credential.attributes.clone())
        .finish()
}
