//! Version dispatch.
//!
//! Every entity kind has a [`VersionHistory`]: the ordered list of wire
//! versions it has had, each with its field schema and the function that
//! turns coerced fields into the current in-memory entity. A version's
//! schema is written as a diff against the previous version's.
//!
//! The [`Registry`] holds one history per kind. It is built once and never
//! mutated, so a single instance can be shared freely between threads.

use lazy_static::lazy_static;
use tracing::debug;

use crate::codec::primitives::read_version;
use crate::codec::schema::{Fields, Schema};
use crate::codec::{
    application, credential, machine, model, network, relation, secret, status, storage, Document,
};
use crate::error::{
    ContextFrame, DecodeError, DecodeErrorKind, DecodeResultExt, ShapeError, VersionError,
};
use crate::limits::MAX_COLLECTION_LEN;
use crate::model::{
    Application, ApplicationOffer, CloudCredential, Collection, Endpoint, Entity, EntityKind,
    Filesystem, FilesystemAttachment, Machine, Model, Relation, Resource, Secret, SecretRevision,
    Space, Status, StorageInstance, Subnet, Unit, Volume, VolumeAttachment,
};

/// Builds an entity of type `T` from the fields of one wire version.
///
/// Receives the registry (for nested versioned scopes) and the version the
/// fields were decoded from.
pub type DecodeFn<T> = fn(&Registry, u32, Fields) -> Result<T, DecodeError>;

/// One wire version of an entity kind.
pub struct VersionEntry<T> {
    version: u32,
    schema: Schema,
    decode: DecodeFn<T>,
}

impl<T> VersionEntry<T> {
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl<T> std::fmt::Debug for VersionEntry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionEntry")
            .field("version", &self.version)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// The ordered wire versions of one entity kind.
#[derive(Debug)]
pub struct VersionHistory<T> {
    entries: Vec<VersionEntry<T>>,
}

impl<T: Entity> VersionHistory<T> {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a version whose schema is `diff` applied to the previous
    /// version's schema (or to an empty schema for the first version).
    pub fn version(
        mut self,
        version: u32,
        diff: impl FnOnce(Schema) -> Schema,
        decode: DecodeFn<T>,
    ) -> Self {
        debug_assert!(
            self.entries.last().is_none_or(|e| e.version < version),
            "{} versions must be strictly increasing",
            T::KIND
        );
        let base = self
            .entries
            .last()
            .map(|e| e.schema.clone())
            .unwrap_or_default();
        self.entries.push(VersionEntry {
            version,
            schema: diff(base),
            decode,
        });
        self
    }

    /// The newest version.
    pub fn latest(&self) -> u32 {
        self.entries.last().map_or(0, |e| e.version)
    }

    /// All known versions, oldest first.
    pub fn versions(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.version).collect()
    }

    /// Finds the entry for a version read off the wire.
    pub fn lookup(&self, version: i64) -> Result<&VersionEntry<T>, VersionError> {
        self.entries
            .iter()
            .find(|e| i64::from(e.version) == version)
            .ok_or(VersionError::Unknown {
                kind: T::KIND,
                version,
            })
    }

    /// The schema of a known version.
    pub fn schema(&self, version: u32) -> Option<&Schema> {
        self.entries
            .iter()
            .find(|e| e.version == version)
            .map(|e| &e.schema)
    }

    /// Coerces and decodes one entity document at a known version.
    fn decode_entry(
        &self,
        registry: &Registry,
        entry: &VersionEntry<T>,
        doc: &Document,
        index: Option<usize>,
    ) -> Result<T, DecodeError> {
        let frame = ContextFrame::entity(T::KIND, entry.version, index);
        let fields = entry.schema.coerce(doc).within(frame)?;
        (entry.decode)(registry, entry.version, fields).within(frame)
    }

    /// Decodes `{"version": N, <key>: [...]}` into a collection stamped at
    /// the latest version.
    ///
    /// Fails on the first bad element; no partial collection is returned.
    pub fn decode_collection(
        &self,
        registry: &Registry,
        doc: &Document,
        key: &'static str,
    ) -> Result<Collection<T>, DecodeError> {
        self.decode_collection_inner(registry, doc, key)
            .within_field(key)
    }

    fn decode_collection_inner(
        &self,
        registry: &Registry,
        doc: &Document,
        key: &'static str,
    ) -> Result<Collection<T>, DecodeError> {
        if doc.as_map().is_none() {
            return Err(ShapeError::mismatch("", "map", doc).into());
        }
        let entry = self.lookup(read_version(doc, T::KIND)?)?;
        let items = match doc.get(key).filter(|v| !v.is_null()) {
            None => return Err(ShapeError::missing(key, "list").into()),
            Some(items) => items
                .as_list()
                .ok_or_else(|| ShapeError::mismatch(key, "list", items))?,
        };
        if items.len() > MAX_COLLECTION_LEN {
            return Err(DecodeErrorKind::LengthExceedsLimit {
                field: key,
                len: items.len(),
                max: MAX_COLLECTION_LEN,
            }
            .into());
        }

        debug!(
            kind = %T::KIND,
            version = entry.version,
            count = items.len(),
            "decoding collection"
        );

        let decoded = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.decode_entry(registry, entry, item, Some(i)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Collection::from_decoded(decoded))
    }

    /// Decodes a single document carrying its own `version` key.
    pub fn decode_versioned(&self, registry: &Registry, doc: &Document) -> Result<T, DecodeError> {
        if doc.as_map().is_none() {
            return Err(ShapeError::mismatch("", "map", doc).into());
        }
        let entry = self.lookup(read_version(doc, T::KIND)?)?;
        self.decode_entry(registry, entry, doc, None)
    }
}

impl<T: Entity> Default for VersionHistory<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

lazy_static! {
    static ref GLOBAL_REGISTRY: Registry = Registry::new();
}

/// Version histories for every entity kind.
#[derive(Debug)]
pub struct Registry {
    pub(crate) model: VersionHistory<Model>,
    pub(crate) machine: VersionHistory<Machine>,
    pub(crate) application: VersionHistory<Application>,
    pub(crate) unit: VersionHistory<Unit>,
    pub(crate) offer: VersionHistory<ApplicationOffer>,
    pub(crate) resource: VersionHistory<Resource>,
    pub(crate) relation: VersionHistory<Relation>,
    pub(crate) endpoint: VersionHistory<Endpoint>,
    pub(crate) space: VersionHistory<Space>,
    pub(crate) subnet: VersionHistory<Subnet>,
    pub(crate) storage: VersionHistory<StorageInstance>,
    pub(crate) volume: VersionHistory<Volume>,
    pub(crate) volume_attachment: VersionHistory<VolumeAttachment>,
    pub(crate) filesystem: VersionHistory<Filesystem>,
    pub(crate) filesystem_attachment: VersionHistory<FilesystemAttachment>,
    pub(crate) credential: VersionHistory<CloudCredential>,
    pub(crate) secret: VersionHistory<Secret>,
    pub(crate) secret_revision: VersionHistory<SecretRevision>,
    pub(crate) status: VersionHistory<Status>,
}

impl Registry {
    /// Builds the registry of every known version of every kind.
    pub fn new() -> Self {
        Self {
            model: model::history(),
            machine: machine::history(),
            application: application::history(),
            unit: application::unit_history(),
            offer: application::offer_history(),
            resource: application::resource_history(),
            relation: relation::history(),
            endpoint: relation::endpoint_history(),
            space: network::space_history(),
            subnet: network::subnet_history(),
            storage: storage::storage_history(),
            volume: storage::volume_history(),
            volume_attachment: storage::volume_attachment_history(),
            filesystem: storage::filesystem_history(),
            filesystem_attachment: storage::filesystem_attachment_history(),
            credential: credential::history(),
            secret: secret::history(),
            secret_revision: secret::revision_history(),
            status: status::history(),
        }
    }

    /// The process-wide registry, built on first use.
    pub fn global() -> &'static Registry {
        &GLOBAL_REGISTRY
    }

    /// All known versions of a kind, oldest first.
    pub fn versions(&self, kind: EntityKind) -> Vec<u32> {
        match kind {
            EntityKind::Model => self.model.versions(),
            EntityKind::Machine => self.machine.versions(),
            EntityKind::Application => self.application.versions(),
            EntityKind::Unit => self.unit.versions(),
            EntityKind::ApplicationOffer => self.offer.versions(),
            EntityKind::Resource => self.resource.versions(),
            EntityKind::Relation => self.relation.versions(),
            EntityKind::Endpoint => self.endpoint.versions(),
            EntityKind::Space => self.space.versions(),
            EntityKind::Subnet => self.subnet.versions(),
            EntityKind::StorageInstance => self.storage.versions(),
            EntityKind::Volume => self.volume.versions(),
            EntityKind::VolumeAttachment => self.volume_attachment.versions(),
            EntityKind::Filesystem => self.filesystem.versions(),
            EntityKind::FilesystemAttachment => self.filesystem_attachment.versions(),
            EntityKind::CloudCredential => self.credential.versions(),
            EntityKind::Secret => self.secret.versions(),
            EntityKind::SecretRevision => self.secret_revision.versions(),
            EntityKind::Status => self.status.versions(),
        }
    }

    /// The newest known version of a kind.
    pub fn latest_version(&self, kind: EntityKind) -> u32 {
        self.versions(kind).last().copied().unwrap_or(0)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
