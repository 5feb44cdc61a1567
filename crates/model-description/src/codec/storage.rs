//! Storage instance, volume and filesystem encoding/decoding, with their
//! attachments.

use crate::codec::migrate;
use crate::codec::primitives::{encode_collection, non_empty, MapWriter};
use crate::codec::registry::{Registry, VersionHistory};
use crate::codec::schema::{FieldType, Fields, Schema};
use crate::codec::status::{encode_status, take_status};
use crate::codec::Document;
use crate::error::{DecodeError, DecodeResultExt, ShapeError};
use crate::model::{
    AttachmentHost, Collection, Filesystem, FilesystemAttachment, MachineId, StorageConstraints,
    StorageId, StorageInstance, UnitName, Volume, VolumeAttachment, VolumeId,
};

const HOST_ID: &str = "host-id";
const HOST_MACHINE_ID: &str = "host-machine-id";
const HOST_UNIT_ID: &str = "host-unit-id";

// =============================================================================
// DECODING
// =============================================================================

pub(crate) fn storage_history() -> VersionHistory<StorageInstance> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("id", FieldType::String)
                    .required("kind", FieldType::String)
                    .required("owner", FieldType::String)
                    .required("name", FieldType::String)
                    .defaulted(
                        "attachments",
                        FieldType::list(FieldType::String),
                        Document::empty_list(),
                    )
            },
            decode_storage,
        )
        .version(
            2,
            |s| s.optional("constraints", FieldType::object(constraints_schema())),
            decode_storage,
        )
        .version(3, |s| s.optional("owner", FieldType::String), decode_storage)
}

fn constraints_schema() -> Schema {
    Schema::new()
        .defaulted("pool", FieldType::String, "")
        .defaulted("size", FieldType::Uint, 0i64)
        .defaulted("count", FieldType::Uint, 1i64)
}

fn decode_constraints(mut f: Fields) -> Result<StorageConstraints, DecodeError> {
    Ok(StorageConstraints {
        pool: f.take("pool")?,
        size: f.take("size")?,
        count: f.take("count")?,
    })
}

fn decode_storage(_: &Registry, _: u32, mut f: Fields) -> Result<StorageInstance, DecodeError> {
    Ok(StorageInstance {
        id: f.take::<String>("id")?.into(),
        kind: f.take("kind")?,
        owner: f.take_opt::<String>("owner")?.and_then(non_empty),
        name: f.take("name")?,
        attachments: f.take("attachments")?,
        constraints: f
            .take_opt::<Fields>("constraints")?
            .map(decode_constraints)
            .transpose()
            .within_field("constraints")?,
    })
}

pub(crate) fn volume_history() -> VersionHistory<Volume> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("id", FieldType::String)
                    .optional("storage-id", FieldType::String)
                    .defaulted("provisioned", FieldType::Bool, false)
                    .required("size", FieldType::Uint)
                    .defaulted("pool", FieldType::String, "")
                    .defaulted("hardware-id", FieldType::String, "")
                    .defaulted("volume-id", FieldType::String, "")
                    .defaulted("persistent", FieldType::Bool, false)
                    .required("status", FieldType::Any)
                    .required("attachments", FieldType::Any)
            },
            decode_volume,
        )
        .version(
            2,
            |s| s.defaulted("wwn", FieldType::String, ""),
            decode_volume,
        )
}

fn decode_volume(registry: &Registry, _: u32, mut f: Fields) -> Result<Volume, DecodeError> {
    let attachments_doc: Document = f.take("attachments")?;
    let attachments =
        registry
            .volume_attachment
            .decode_collection(registry, &attachments_doc, "attachments")?;
    Ok(Volume {
        id: f.take::<String>("id")?.into(),
        storage_id: f
            .take_opt::<String>("storage-id")?
            .and_then(non_empty)
            .map(StorageId::from),
        provisioned: f.take("provisioned")?,
        size: f.take("size")?,
        pool: f.take("pool")?,
        hardware_id: f.take("hardware-id")?,
        wwn: f.take_or_default("wwn")?,
        volume_id: f.take("volume-id")?,
        persistent: f.take("persistent")?,
        status: take_status(registry, &mut f, "status")?,
        attachments,
    })
}

/// Host fields of a v1 attachment: one flat identifier.
fn legacy_host_schema(schema: Schema) -> Schema {
    schema.required(HOST_ID, FieldType::String)
}

/// Host fields of a v2 attachment: one of two typed identifiers.
fn split_host_schema(schema: Schema) -> Schema {
    schema
        .remove(HOST_ID)
        .optional(HOST_MACHINE_ID, FieldType::String)
        .optional(HOST_UNIT_ID, FieldType::String)
}

/// Takes the attachment host, disambiguating a legacy flat identifier.
fn take_host(f: &mut Fields) -> Result<AttachmentHost, DecodeError> {
    if let Some(host_id) = f.take_opt::<String>(HOST_ID)? {
        return migrate::classify_host(&host_id).within_field(HOST_ID);
    }
    let machine = f.take_opt::<String>(HOST_MACHINE_ID)?.and_then(non_empty);
    let unit = f.take_opt::<String>(HOST_UNIT_ID)?.and_then(non_empty);
    match (machine, unit) {
        (Some(machine), None) => Ok(AttachmentHost::Machine(MachineId::from(machine))),
        (None, Some(unit)) => Ok(AttachmentHost::Unit(UnitName::from(unit))),
        (machine, _) => {
            let got = if machine.is_some() { "both" } else { "neither" };
            Err(ShapeError::invalid(
                "",
                "exactly one of host-machine-id or host-unit-id",
                got,
            )
            .into())
        }
    }
}

pub(crate) fn volume_attachment_history() -> VersionHistory<VolumeAttachment> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                legacy_host_schema(s)
                    .defaulted("provisioned", FieldType::Bool, false)
                    .defaulted("read-only", FieldType::Bool, false)
                    .defaulted("device-name", FieldType::String, "")
                    .defaulted("device-link", FieldType::String, "")
                    .defaulted("bus-address", FieldType::String, "")
            },
            decode_volume_attachment,
        )
        .version(2, split_host_schema, decode_volume_attachment)
}

fn decode_volume_attachment(
    _: &Registry,
    _: u32,
    mut f: Fields,
) -> Result<VolumeAttachment, DecodeError> {
    Ok(VolumeAttachment {
        host: take_host(&mut f)?,
        provisioned: f.take("provisioned")?,
        read_only: f.take("read-only")?,
        device_name: f.take("device-name")?,
        device_link: f.take("device-link")?,
        bus_address: f.take("bus-address")?,
    })
}

pub(crate) fn filesystem_history() -> VersionHistory<Filesystem> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("id", FieldType::String)
                    .optional("storage-id", FieldType::String)
                    .defaulted("provisioned", FieldType::Bool, false)
                    .required("size", FieldType::Uint)
                    .defaulted("pool", FieldType::String, "")
                    .defaulted("filesystem-id", FieldType::String, "")
                    .required("status", FieldType::Any)
                    .required("attachments", FieldType::Any)
            },
            decode_filesystem,
        )
        .version(
            2,
            |s| s.optional("volume-id", FieldType::String),
            decode_filesystem,
        )
}

fn decode_filesystem(registry: &Registry, _: u32, mut f: Fields) -> Result<Filesystem, DecodeError> {
    let attachments_doc: Document = f.take("attachments")?;
    let attachments = registry.filesystem_attachment.decode_collection(
        registry,
        &attachments_doc,
        "attachments",
    )?;
    Ok(Filesystem {
        id: f.take::<String>("id")?.into(),
        storage_id: f
            .take_opt::<String>("storage-id")?
            .and_then(non_empty)
            .map(StorageId::from),
        volume_id: f
            .take_opt::<String>("volume-id")?
            .and_then(non_empty)
            .map(VolumeId::from),
        provisioned: f.take("provisioned")?,
        size: f.take("size")?,
        pool: f.take("pool")?,
        filesystem_id: f.take("filesystem-id")?,
        status: take_status(registry, &mut f, "status")?,
        attachments,
    })
}

pub(crate) fn filesystem_attachment_history() -> VersionHistory<FilesystemAttachment> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                legacy_host_schema(s)
                    .defaulted("provisioned", FieldType::Bool, false)
                    .defaulted("mount-point", FieldType::String, "")
                    .defaulted("read-only", FieldType::Bool, false)
            },
            decode_filesystem_attachment,
        )
        .version(2, split_host_schema, decode_filesystem_attachment)
}

fn decode_filesystem_attachment(
    _: &Registry,
    _: u32,
    mut f: Fields,
) -> Result<FilesystemAttachment, DecodeError> {
    Ok(FilesystemAttachment {
        host: take_host(&mut f)?,
        provisioned: f.take("provisioned")?,
        mount_point: f.take("mount-point")?,
        read_only: f.take("read-only")?,
    })
}

/// Decodes a standalone `{"version": N, "storages": [...]}` collection.
pub fn decode_storages(
    registry: &Registry,
    doc: &Document,
) -> Result<Collection<StorageInstance>, DecodeError> {
    registry.storage.decode_collection(registry, doc, "storages")
}

/// Decodes a standalone volume collection, attachments included.
pub fn decode_volumes(
    registry: &Registry,
    doc: &Document,
) -> Result<Collection<Volume>, DecodeError> {
    registry.volume.decode_collection(registry, doc, "volumes")
}

pub fn decode_filesystems(
    registry: &Registry,
    doc: &Document,
) -> Result<Collection<Filesystem>, DecodeError> {
    registry.filesystem.decode_collection(registry, doc, "filesystems")
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a storage instance at the latest version.
pub fn encode_storage(storage: &StorageInstance) -> Document {
    let constraints = storage.constraints.as_ref().map(|c| {
        MapWriter::new()
            .field("pool", c.pool.as_str())
            .field("size", c.size)
            .field("count", c.count)
            .finish()
    });
    MapWriter::new()
        .field("id", storage.id.as_str())
        .field("kind", storage.kind.as_str())
        .opt_field("owner", storage.owner.as_deref())
        .field("name", storage.name.as_str())
        .field("attachments", storage.attachments.clone())
        .opt_field("constraints", constraints)
        .finish()
}

/// Encodes a volume and its attachments at the latest version.
pub fn encode_volume(volume: &Volume) -> Document {
    MapWriter::new()
        .field("id", volume.id.as_str())
        .opt_field("storage-id", volume.storage_id.as_ref().map(StorageId::as_str))
        .field("provisioned", volume.provisioned)
        .field("size", volume.size)
        .field("pool", volume.pool.as_str())
        .field("hardware-id", volume.hardware_id.as_str())
        .field("wwn", volume.wwn.as_str())
        .field("volume-id", volume.volume_id.as_str())
        .field("persistent", volume.persistent)
        .field("status", encode_status(&volume.status))
        .field(
            "attachments",
            encode_collection("attachments", volume.attachments(), encode_volume_attachment),
        )
        .finish()
}

fn write_host(writer: MapWriter, host: &AttachmentHost) -> MapWriter {
    match host {
        AttachmentHost::Machine(id) => writer.field(HOST_MACHINE_ID, id.as_str()),
        AttachmentHost::Unit(name) => writer.field(HOST_UNIT_ID, name.as_str()),
    }
}

/// Encodes a volume attachment at the latest version.
pub fn encode_volume_attachment(attachment: &VolumeAttachment) -> Document {
    write_host(MapWriter::new(), &attachment.host)
        .field("provisioned", attachment.provisioned)
        .field("read-only", attachment.read_only)
        .field("device-name", attachment.device_name.as_str())
        .field("device-link", attachment.device_link.as_str())
        .field("bus-address", attachment.bus_address.as_str())
        .finish()
}

/// Encodes a filesystem and its attachments at the latest version.
pub fn encode_filesystem(filesystem: &Filesystem) -> Document {
    MapWriter::new()
        .field("id", filesystem.id.as_str())
        .opt_field(
            "storage-id",
            filesystem.storage_id.as_ref().map(StorageId::as_str),
        )
        .opt_field(
            "volume-id",
            filesystem.volume_id.as_ref().map(VolumeId::as_str),
        )
        .field("provisioned", filesystem.provisioned)
        .field("size", filesystem.size)
        .field("pool", filesystem.pool.as_str())
        .field("filesystem-id", filesystem.filesystem_id.as_str())
        .field("status", encode_status(&filesystem.status))
        .field(
            "attachments",
            encode_collection(
                "attachments",
                filesystem.attachments(),
                encode_filesystem_attachment,
            ),
        )
        .finish()
}

/// Encodes a filesystem attachment at the latest version.
pub fn encode_filesystem_attachment(attachment: &FilesystemAttachment) -> Document {
    write_host(MapWriter::new(), &attachment.host)
        .field("provisioned", attachment.provisioned)
        .field("mount-point", attachment.mount_point.as_str())
        .field("read-only", attachment.read_only)
        .finish()
}
