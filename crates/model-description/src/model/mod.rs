//! In-memory entity graph for model descriptions.
//!
//! This module contains the decoded, version-independent types:
//! - Entity kinds and versioned collections
//! - Typed identifiers for cross-references
//! - One record type per entity kind, with argument records
//! - The [`Model`] root and a fluent [`ModelBuilder`]

pub mod application;
pub mod builder;
pub mod credential;
pub mod entity;
pub mod graph;
pub mod id;
pub mod machine;
pub mod network;
pub mod platform;
pub mod relation;
pub mod secret;
pub mod status;
pub mod storage;

pub use application::{
    Application, ApplicationArgs, ApplicationOffer, ApplicationOfferArgs, ExposedEndpoint,
    Resource, ResourceArgs, ResourceRevision, Unit, UnitArgs,
};
pub use builder::{
    ApplicationBuilder, FilesystemBuilder, MachineBuilder, ModelBuilder, RelationBuilder,
    SecretBuilder, VolumeBuilder,
};
pub use credential::{CloudCredential, CloudCredentialArgs, LEGACY_CERTIFICATE_AUTH_TYPE};
pub use entity::{Collection, Entity, EntityKind};
pub use graph::{Model, ModelArgs, ModelType, NAME_CONFIG_KEY, UUID_CONFIG_KEY};
pub use id::{
    looks_like_unit_name, unit_ordinal_overflows, ApplicationName, AttachmentHost, FilesystemId,
    MachineId, SecretId, SpaceId, StorageId, UnitName, VolumeId,
};
pub use machine::{CloudInstance, Machine, MachineArgs};
pub use network::{Space, SpaceArgs, Subnet, SubnetArgs};
pub use platform::{Platform, PlatformParseError, DEFAULT_ARCHITECTURE};
pub use relation::{Endpoint, EndpointArgs, Relation, RelationArgs};
pub use secret::{Secret, SecretArgs, SecretRevision, SecretRevisionArgs, MODEL_SECRET_OWNER};
pub use status::{Status, StatusArgs};
pub use storage::{
    Filesystem, FilesystemArgs, FilesystemAttachment, FilesystemAttachmentArgs,
    StorageConstraints, StorageInstance, StorageInstanceArgs, Volume, VolumeArgs,
    VolumeAttachment, VolumeAttachmentArgs,
};
