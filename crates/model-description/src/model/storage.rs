//! Storage instances, volumes, filesystems and their attachments.

use crate::model::id::present;
use crate::model::{
    AttachmentHost, Collection, Entity, EntityKind, FilesystemId, Status, StorageId, VolumeId,
};

// =============================================================================
// StorageInstance
// =============================================================================

/// A charm storage instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StorageInstance {
    pub id: StorageId,
    /// `block` or `filesystem`.
    pub kind: String,
    /// Owning unit or application name; `None` for detached storage.
    pub owner: Option<String>,
    pub name: String,
    /// Units the storage is attached to.
    pub attachments: Vec<String>,
    pub constraints: Option<StorageConstraints>,
}

impl Entity for StorageInstance {
    const KIND: EntityKind = EntityKind::StorageInstance;
    const LATEST_VERSION: u32 = 3;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StorageInstanceArgs {
    pub id: StorageId,
    pub kind: String,
    pub owner: Option<String>,
    pub name: String,
    pub attachments: Vec<String>,
    pub constraints: Option<StorageConstraints>,
}

impl StorageInstance {
    pub fn new(args: StorageInstanceArgs) -> Self {
        Self {
            id: args.id,
            kind: args.kind,
            owner: present(args.owner),
            name: args.name,
            attachments: args.attachments,
            constraints: args.constraints,
        }
    }
}

/// Pool, size (MiB) and count requested for a storage directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConstraints {
    pub pool: String,
    pub size: u64,
    pub count: u64,
}

impl Default for StorageConstraints {
    fn default() -> Self {
        Self {
            pool: String::new(),
            size: 0,
            count: 1,
        }
    }
}

// =============================================================================
// Volume
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub id: VolumeId,
    pub storage_id: Option<StorageId>,
    pub provisioned: bool,
    /// Size in MiB.
    pub size: u64,
    pub pool: String,
    pub hardware_id: String,
    pub wwn: String,
    /// Provider-side volume id.
    pub volume_id: String,
    pub persistent: bool,
    pub status: Status,
    pub(crate) attachments: Collection<VolumeAttachment>,
}

impl Entity for Volume {
    const KIND: EntityKind = EntityKind::Volume;
    const LATEST_VERSION: u32 = 2;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VolumeArgs {
    pub id: VolumeId,
    pub storage_id: Option<StorageId>,
    pub provisioned: bool,
    pub size: u64,
    pub pool: String,
    pub hardware_id: String,
    pub wwn: String,
    pub volume_id: String,
    pub persistent: bool,
    pub status: Status,
}

impl Volume {
    pub fn new(args: VolumeArgs) -> Self {
        Self {
            id: args.id,
            storage_id: present(args.storage_id),
            provisioned: args.provisioned,
            size: args.size,
            pool: args.pool,
            hardware_id: args.hardware_id,
            wwn: args.wwn,
            volume_id: args.volume_id,
            persistent: args.persistent,
            status: args.status,
            attachments: Collection::new(),
        }
    }

    pub fn attachments(&self) -> &Collection<VolumeAttachment> {
        &self.attachments
    }

    pub fn add_attachment(&mut self, args: VolumeAttachmentArgs) -> &mut VolumeAttachment {
        self.attachments.push(VolumeAttachment::new(args))
    }
}

/// A volume attached to a machine or a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeAttachment {
    pub host: AttachmentHost,
    pub provisioned: bool,
    pub read_only: bool,
    pub device_name: String,
    pub device_link: String,
    pub bus_address: String,
}

impl Entity for VolumeAttachment {
    const KIND: EntityKind = EntityKind::VolumeAttachment;
    const LATEST_VERSION: u32 = 2;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeAttachmentArgs {
    pub host: AttachmentHost,
    pub provisioned: bool,
    pub read_only: bool,
    pub device_name: String,
    pub device_link: String,
    pub bus_address: String,
}

impl VolumeAttachmentArgs {
    /// Arguments with every optional attribute at its default.
    pub fn on(host: AttachmentHost) -> Self {
        Self {
            host,
            provisioned: false,
            read_only: false,
            device_name: String::new(),
            device_link: String::new(),
            bus_address: String::new(),
        }
    }
}

impl VolumeAttachment {
    pub fn new(args: VolumeAttachmentArgs) -> Self {
        Self {
            host: args.host,
            provisioned: args.provisioned,
            read_only: args.read_only,
            device_name: args.device_name,
            device_link: args.device_link,
            bus_address: args.bus_address,
        }
    }
}

// =============================================================================
// Filesystem
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Filesystem {
    pub id: FilesystemId,
    pub storage_id: Option<StorageId>,
    /// Backing volume, if any.
    pub volume_id: Option<VolumeId>,
    pub provisioned: bool,
    pub size: u64,
    pub pool: String,
    /// Provider-side filesystem id.
    pub filesystem_id: String,
    pub status: Status,
    pub(crate) attachments: Collection<FilesystemAttachment>,
}

impl Entity for Filesystem {
    const KIND: EntityKind = EntityKind::Filesystem;
    const LATEST_VERSION: u32 = 2;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilesystemArgs {
    pub id: FilesystemId,
    pub storage_id: Option<StorageId>,
    pub volume_id: Option<VolumeId>,
    pub provisioned: bool,
    pub size: u64,
    pub pool: String,
    pub filesystem_id: String,
    pub status: Status,
}

impl Filesystem {
    pub fn new(args: FilesystemArgs) -> Self {
        Self {
            id: args.id,
            storage_id: present(args.storage_id),
            volume_id: present(args.volume_id),
            provisioned: args.provisioned,
            size: args.size,
            pool: args.pool,
            filesystem_id: args.filesystem_id,
            status: args.status,
            attachments: Collection::new(),
        }
    }

    pub fn attachments(&self) -> &Collection<FilesystemAttachment> {
        &self.attachments
    }

    pub fn add_attachment(
        &mut self,
        args: FilesystemAttachmentArgs,
    ) -> &mut FilesystemAttachment {
        self.attachments.push(FilesystemAttachment::new(args))
    }
}

/// A filesystem mounted on a machine or a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemAttachment {
    pub host: AttachmentHost,
    pub provisioned: bool,
    pub mount_point: String,
    pub read_only: bool,
}

impl Entity for FilesystemAttachment {
    const KIND: EntityKind = EntityKind::FilesystemAttachment;
    const LATEST_VERSION: u32 = 2;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemAttachmentArgs {
    pub host: AttachmentHost,
    pub provisioned: bool,
    pub mount_point: String,
    pub read_only: bool,
}

impl FilesystemAttachmentArgs {
    pub fn on(host: AttachmentHost) -> Self {
        Self {
            host,
            provisioned: false,
            mount_point: String::new(),
            read_only: false,
        }
    }
}

impl FilesystemAttachment {
    pub fn new(args: FilesystemAttachmentArgs) -> Self {
        Self {
            host: args.host,
            provisioned: args.provisioned,
            mount_point: args.mount_point,
            read_only: args.read_only,
        }
    }
}
