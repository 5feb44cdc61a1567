//! Builder API for ergonomic Model construction.
//!
//! Provides a fluent interface over the same mutators as [`Model`], so every
//! collection touched is stamped at its latest version.
//!
//! # Example
//!
//! ```rust
//! use model_description::model::{ApplicationArgs, MachineArgs, ModelBuilder, UnitArgs};
//!
//! let model = ModelBuilder::new("admin")
//!     .uuid("bd3fae18-5ea1-4bc5-8837-45400cf1f8f6")
//!     .cloud("aws", "us-east-1")
//!     .machine(MachineArgs { id: "0".into(), ..Default::default() }, |m| m)
//!     .application(
//!         ApplicationArgs { name: "mysql".into(), ..Default::default() },
//!         |a| a
//!             .unit(UnitArgs {
//!                 name: "mysql/0".into(),
//!                 machine: Some("0".into()),
//!                 ..Default::default()
//!             })
//!             .leader("mysql/0"),
//!     )
//!     .build();
//!
//! assert_eq!(model.applications().len(), 1);
//! ```

use crate::codec::Document;
use crate::model::{
    Application, ApplicationArgs, ApplicationOfferArgs, CloudCredential, CloudCredentialArgs,
    EndpointArgs, Filesystem, FilesystemArgs, FilesystemAttachmentArgs, Machine, MachineArgs,
    Model, ModelArgs, ModelType, Relation, RelationArgs, ResourceArgs, Secret, SecretArgs,
    SecretRevisionArgs, SpaceArgs, SpaceId, StorageInstanceArgs, SubnetArgs, UnitArgs,
    UnitName, Volume, VolumeArgs, VolumeAttachmentArgs, NAME_CONFIG_KEY, UUID_CONFIG_KEY,
};

/// Builder for constructing a [`Model`].
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    model: Model,
}

impl ModelBuilder {
    /// Creates a new builder for a model owned by `owner`.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            model: Model::new(ModelArgs {
                owner: owner.into(),
                ..Default::default()
            }),
        }
    }

    /// Starts from explicit model arguments.
    pub fn from_args(args: ModelArgs) -> Self {
        Self {
            model: Model::new(args),
        }
    }

    /// Sets the model UUID config entry.
    pub fn uuid(self, uuid: impl Into<String>) -> Self {
        let uuid: String = uuid.into();
        self.config(UUID_CONFIG_KEY, uuid)
    }

    /// Sets the model UUID config entry to a fresh random UUID.
    pub fn with_random_uuid(self) -> Self {
        self.uuid(uuid::Uuid::new_v4().to_string())
    }

    /// Sets the model name config entry.
    pub fn name(self, name: impl Into<String>) -> Self {
        let name: String = name.into();
        self.config(NAME_CONFIG_KEY, name)
    }

    /// Sets a config entry.
    pub fn config(mut self, key: impl Into<String>, value: impl Into<Document>) -> Self {
        self.model.config.insert(key.into(), value.into());
        self
    }

    pub fn model_type(mut self, model_type: ModelType) -> Self {
        self.model.model_type = model_type;
        self
    }

    pub fn cloud(mut self, cloud: impl Into<String>, region: impl Into<String>) -> Self {
        self.model.cloud = cloud.into();
        self.model.cloud_region = region.into();
        self
    }

    pub fn credential(mut self, args: CloudCredentialArgs) -> Self {
        self.model.cloud_credential = Some(CloudCredential::new(args));
        self
    }

    pub fn environ_version(mut self, version: i64) -> Self {
        self.model.environ_version = version;
        self
    }

    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.model.annotations.insert(key.into(), value.into());
        self
    }

    pub fn block(mut self, kind: impl Into<String>, message: impl Into<String>) -> Self {
        self.model.blocks.insert(kind.into(), message.into());
        self
    }

    // =========================================================================
    // Collections
    // =========================================================================

    /// Adds a machine, populating its containers with a builder function.
    pub fn machine<F>(mut self, args: MachineArgs, f: F) -> Self
    where
        F: FnOnce(MachineBuilder) -> MachineBuilder,
    {
        let builder = f(MachineBuilder::new(args));
        self.model.machines.push(builder.machine);
        self
    }

    /// Adds an application, populating its units, offers and resources with
    /// a builder function.
    pub fn application<F>(mut self, args: ApplicationArgs, f: F) -> Self
    where
        F: FnOnce(ApplicationBuilder) -> ApplicationBuilder,
    {
        let builder = f(ApplicationBuilder::new(args));
        self.model.applications.push(builder.application);
        self
    }

    /// Adds a relation, populating its endpoints with a builder function.
    pub fn relation<F>(mut self, args: RelationArgs, f: F) -> Self
    where
        F: FnOnce(RelationBuilder) -> RelationBuilder,
    {
        let builder = f(RelationBuilder::new(args));
        self.model.relations.push(builder.relation);
        self
    }

    pub fn space(mut self, args: SpaceArgs) -> Self {
        self.model.add_space(args);
        self
    }

    pub fn subnet(mut self, args: SubnetArgs) -> Self {
        self.model.add_subnet(args);
        self
    }

    pub fn storage(mut self, args: StorageInstanceArgs) -> Self {
        self.model.add_storage(args);
        self
    }

    /// Adds a volume, populating its attachments with a builder function.
    pub fn volume<F>(mut self, args: VolumeArgs, f: F) -> Self
    where
        F: FnOnce(VolumeBuilder) -> VolumeBuilder,
    {
        let builder = f(VolumeBuilder::new(args));
        self.model.volumes.push(builder.volume);
        self
    }

    /// Adds a filesystem, populating its attachments with a builder function.
    pub fn filesystem<F>(mut self, args: FilesystemArgs, f: F) -> Self
    where
        F: FnOnce(FilesystemBuilder) -> FilesystemBuilder,
    {
        let builder = f(FilesystemBuilder::new(args));
        self.model.filesystems.push(builder.filesystem);
        self
    }

    /// Adds a secret, populating its revisions with a builder function.
    pub fn secret<F>(mut self, args: SecretArgs, f: F) -> Self
    where
        F: FnOnce(SecretBuilder) -> SecretBuilder,
    {
        let builder = f(SecretBuilder::new(args));
        self.model.secrets.push(builder.secret);
        self
    }

    // =========================================================================
    // Build
    // =========================================================================

    /// Builds the final Model.
    pub fn build(self) -> Model {
        self.model
    }
}

/// Builder for a machine and its containers.
#[derive(Debug, Clone)]
pub struct MachineBuilder {
    machine: Machine,
}

impl MachineBuilder {
    pub fn new(args: MachineArgs) -> Self {
        Self {
            machine: Machine::new(args),
        }
    }

    /// Adds a nested container.
    pub fn container<F>(mut self, args: MachineArgs, f: F) -> Self
    where
        F: FnOnce(MachineBuilder) -> MachineBuilder,
    {
        let builder = f(MachineBuilder::new(args));
        self.machine.containers.push(builder.machine);
        self
    }

    pub fn job(mut self, job: impl Into<String>) -> Self {
        self.machine.jobs.push(job.into());
        self
    }
}

/// Builder for an application and the entities it owns.
#[derive(Debug, Clone)]
pub struct ApplicationBuilder {
    application: Application,
}

impl ApplicationBuilder {
    pub fn new(args: ApplicationArgs) -> Self {
        Self {
            application: Application::new(args),
        }
    }

    pub fn unit(mut self, args: UnitArgs) -> Self {
        self.application.add_unit(args);
        self
    }

    pub fn offer(mut self, args: ApplicationOfferArgs) -> Self {
        self.application.add_offer(args);
        self
    }

    pub fn resource(mut self, args: ResourceArgs) -> Self {
        self.application.add_resource(args);
        self
    }

    pub fn leader(mut self, unit: impl Into<UnitName>) -> Self {
        self.application.set_leader(unit);
        self
    }

    pub fn setting(mut self, key: impl Into<String>, value: impl Into<Document>) -> Self {
        self.application.settings.insert(key.into(), value.into());
        self
    }

    /// Binds an endpoint (`""` for the default binding) to a space.
    pub fn binding(mut self, endpoint: impl Into<String>, space: impl Into<String>) -> Self {
        self.application
            .endpoint_bindings
            .insert(endpoint.into(), SpaceId::new(space));
        self
    }
}

/// Builder for a relation and its endpoints.
#[derive(Debug, Clone)]
pub struct RelationBuilder {
    relation: Relation,
}

impl RelationBuilder {
    pub fn new(args: RelationArgs) -> Self {
        Self {
            relation: Relation::new(args),
        }
    }

    pub fn endpoint(mut self, args: EndpointArgs) -> Self {
        self.relation.add_endpoint(args);
        self
    }
}

/// Builder for a volume and its attachments.
#[derive(Debug, Clone)]
pub struct VolumeBuilder {
    volume: Volume,
}

impl VolumeBuilder {
    pub fn new(args: VolumeArgs) -> Self {
        Self {
            volume: Volume::new(args),
        }
    }

    pub fn attachment(mut self, args: VolumeAttachmentArgs) -> Self {
        self.volume.add_attachment(args);
        self
    }
}

/// Builder for a filesystem and its attachments.
#[derive(Debug, Clone)]
pub struct FilesystemBuilder {
    filesystem: Filesystem,
}

impl FilesystemBuilder {
    pub fn new(args: FilesystemArgs) -> Self {
        Self {
            filesystem: Filesystem::new(args),
        }
    }

    pub fn attachment(mut self, args: FilesystemAttachmentArgs) -> Self {
        self.filesystem.add_attachment(args);
        self
    }
}

/// Builder for a secret and its revisions.
#[derive(Debug, Clone)]
pub struct SecretBuilder {
    secret: Secret,
}

impl SecretBuilder {
    pub fn new(args: SecretArgs) -> Self {
        Self {
            secret: Secret::new(args),
        }
    }

    pub fn revision(mut self, args: SecretRevisionArgs) -> Self {
        self.secret.add_revision(args);
        self
    }
}
