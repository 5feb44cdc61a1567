//! Versioned encoding/decoding for model descriptions.
//!
//! Every entity kind has a [`VersionHistory`]: an ordered list of schemas,
//! each derived from its predecessor, paired with the decode function that
//! builds the entity from fields checked against that schema. The
//! [`Registry`] holds one history per kind; decoding a collection reads its
//! `version`, picks the matching schema and recurses into child collections.
//!
//! Top-level collections can be decoded on their own with the per-kind
//! `decode_<kind>s` functions; [`decode_model`] uses the same ones.
//!
//! Encoding always writes the latest version of every kind.

pub mod application;
pub mod credential;
pub mod document;
pub mod machine;
pub mod migrate;
pub mod model;
pub mod network;
pub mod primitives;
pub mod registry;
pub mod relation;
pub mod schema;
pub mod secret;
pub mod status;
pub mod storage;

pub use application::{
    decode_applications, encode_application, encode_offer, encode_resource, encode_unit,
};
pub use credential::{decode_credential_doc, encode_credential};
pub use document::Document;
pub use machine::{decode_machines, encode_machine};
pub use model::{
    decode_model, decode_model_with, encode_model, export_model, import_model, import_model_with,
    DecodeOptions, EncodeOptions,
};
pub use network::{decode_spaces, decode_subnets, encode_space, encode_subnet};
pub use primitives::{encode_collection, read_version, MapWriter, VERSION_KEY};
pub use registry::{DecodeFn, Registry, VersionEntry, VersionHistory};
pub use relation::{decode_relations, encode_endpoint, encode_relation};
pub use schema::{FieldDefault, FieldSpec, FieldType, FieldValue, Fields, FromField, Schema};
pub use secret::{decode_secrets, encode_revision, encode_secret};
pub use status::{decode_status, encode_status};
pub use storage::{
    decode_filesystems, decode_storages, decode_volumes, encode_filesystem,
    encode_filesystem_attachment, encode_storage, encode_volume, encode_volume_attachment,
};
