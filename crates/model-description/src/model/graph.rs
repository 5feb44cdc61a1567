//! The model: root of the entity graph.
//!
//! A [`Model`] exclusively owns every entity collection. Cross-references
//! between entities (a unit's machine, an application's leader, a subnet's
//! space) are plain identifiers and are only checked by the validator.

use std::collections::BTreeMap;
use std::fmt;

use crate::codec::Document;
use crate::model::{
    Application, ApplicationArgs, CloudCredential, Collection, Entity, EntityKind, Filesystem,
    FilesystemArgs, Machine, MachineArgs, Relation, RelationArgs, Secret, SecretArgs, Space,
    SpaceArgs, StorageInstance, StorageInstanceArgs, Subnet, SubnetArgs, Volume, VolumeArgs,
};

/// Config key holding the model UUID.
pub const UUID_CONFIG_KEY: &str = "uuid";

/// Config key holding the model name.
pub const NAME_CONFIG_KEY: &str = "name";

/// Whether workloads run on machines or in a container orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelType {
    #[default]
    Iaas,
    Caas,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Iaas => "iaas",
            ModelType::Caas => "caas",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "iaas" => Some(ModelType::Iaas),
            "caas" => Some(ModelType::Caas),
            _ => None,
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete model description.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub model_type: ModelType,
    pub owner: String,
    pub config: BTreeMap<String, Document>,
    pub cloud: String,
    pub cloud_region: String,
    pub cloud_credential: Option<CloudCredential>,
    pub environ_version: i64,
    pub annotations: BTreeMap<String, String>,
    /// Block type to block message.
    pub blocks: BTreeMap<String, String>,
    pub(crate) machines: Collection<Machine>,
    pub(crate) applications: Collection<Application>,
    pub(crate) relations: Collection<Relation>,
    pub(crate) spaces: Collection<Space>,
    pub(crate) subnets: Collection<Subnet>,
    pub(crate) storages: Collection<StorageInstance>,
    pub(crate) volumes: Collection<Volume>,
    pub(crate) filesystems: Collection<Filesystem>,
    pub(crate) secrets: Collection<Secret>,
}

impl Entity for Model {
    const KIND: EntityKind = EntityKind::Model;
    const LATEST_VERSION: u32 = 3;
}

/// Arguments for [`Model::new`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelArgs {
    pub model_type: ModelType,
    pub owner: String,
    pub config: BTreeMap<String, Document>,
    pub cloud: String,
    pub cloud_region: String,
    pub cloud_credential: Option<CloudCredential>,
    pub environ_version: i64,
    pub annotations: BTreeMap<String, String>,
    pub blocks: BTreeMap<String, String>,
}

impl Model {
    /// Creates an empty model. Every collection starts stamped at its
    /// latest version.
    pub fn new(args: ModelArgs) -> Self {
        Self {
            model_type: args.model_type,
            owner: args.owner,
            config: args.config,
            cloud: args.cloud,
            cloud_region: args.cloud_region,
            cloud_credential: args.cloud_credential,
            environ_version: args.environ_version,
            annotations: args.annotations,
            blocks: args.blocks,
            machines: Collection::new(),
            applications: Collection::new(),
            relations: Collection::new(),
            spaces: Collection::new(),
            subnets: Collection::new(),
            storages: Collection::new(),
            volumes: Collection::new(),
            filesystems: Collection::new(),
            secrets: Collection::new(),
        }
    }

    /// The model UUID from config, if set to a string.
    pub fn uuid(&self) -> Option<&str> {
        self.config.get(UUID_CONFIG_KEY).and_then(Document::as_str)
    }

    /// The model name from config, if set to a string.
    pub fn name(&self) -> Option<&str> {
        self.config.get(NAME_CONFIG_KEY).and_then(Document::as_str)
    }

    pub fn is_caas(&self) -> bool {
        self.model_type == ModelType::Caas
    }

    // =========================================================================
    // Collections
    // =========================================================================

    pub fn machines(&self) -> &Collection<Machine> {
        &self.machines
    }

    pub fn applications(&self) -> &Collection<Application> {
        &self.applications
    }

    pub fn relations(&self) -> &Collection<Relation> {
        &self.relations
    }

    pub fn spaces(&self) -> &Collection<Space> {
        &self.spaces
    }

    pub fn subnets(&self) -> &Collection<Subnet> {
        &self.subnets
    }

    pub fn storages(&self) -> &Collection<StorageInstance> {
        &self.storages
    }

    pub fn volumes(&self) -> &Collection<Volume> {
        &self.volumes
    }

    pub fn filesystems(&self) -> &Collection<Filesystem> {
        &self.filesystems
    }

    pub fn secrets(&self) -> &Collection<Secret> {
        &self.secrets
    }

    // =========================================================================
    // Mutators
    // =========================================================================

    pub fn add_machine(&mut self, args: MachineArgs) -> &mut Machine {
        self.machines.push(Machine::new(args))
    }

    pub fn add_application(&mut self, args: ApplicationArgs) -> &mut Application {
        self.applications.push(Application::new(args))
    }

    pub fn add_relation(&mut self, args: RelationArgs) -> &mut Relation {
        self.relations.push(Relation::new(args))
    }

    pub fn add_space(&mut self, args: SpaceArgs) -> &mut Space {
        self.spaces.push(Space::new(args))
    }

    pub fn add_subnet(&mut self, args: SubnetArgs) -> &mut Subnet {
        self.subnets.push(Subnet::new(args))
    }

    pub fn add_storage(&mut self, args: StorageInstanceArgs) -> &mut StorageInstance {
        self.storages.push(StorageInstance::new(args))
    }

    pub fn add_volume(&mut self, args: VolumeArgs) -> &mut Volume {
        self.volumes.push(Volume::new(args))
    }

    pub fn add_filesystem(&mut self, args: FilesystemArgs) -> &mut Filesystem {
        self.filesystems.push(Filesystem::new(args))
    }

    pub fn add_secret(&mut self, args: SecretArgs) -> &mut Secret {
        self.secrets.push(Secret::new(args))
    }

    pub fn set_cloud_credential(&mut self, credential: CloudCredential) {
        self.cloud_credential = Some(credential);
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn application(&self, name: &str) -> Option<&Application> {
        self.applications.find(|a| a.name.as_str() == name)
    }

    pub fn application_mut(&mut self, name: &str) -> Option<&mut Application> {
        self.applications.find_mut(|a| a.name.as_str() == name)
    }

    /// Finds a machine or container anywhere in the machine tree.
    pub fn machine(&self, id: &str) -> Option<&Machine> {
        self.machines
            .iter()
            .flat_map(Machine::walk)
            .find(|m| m.id.as_str() == id)
    }

    /// Every machine and container, depth first.
    pub fn all_machines(&self) -> Vec<&Machine> {
        self.machines.iter().flat_map(Machine::walk).collect()
    }

    /// Every unit of every application.
    pub fn all_units(&self) -> impl Iterator<Item = &crate::model::Unit> {
        self.applications.iter().flat_map(|a| a.units().iter())
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(ModelArgs::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UnitArgs;

    #[test]
    fn test_new_model_is_stamped() {
        let model = Model::default();
        assert_eq!(model.machines().version(), Machine::LATEST_VERSION);
        assert_eq!(model.applications().version(), Application::LATEST_VERSION);
        assert_eq!(model.secrets().version(), Secret::LATEST_VERSION);
        assert_eq!(model.model_type, ModelType::Iaas);
    }

    #[test]
    fn test_uuid_from_config() {
        let mut model = Model::default();
        assert_eq!(model.uuid(), None);
        model.config.insert(
            UUID_CONFIG_KEY.to_string(),
            Document::from("bd3fae18-5ea1-4bc5-8837-45400cf1f8f6"),
        );
        assert_eq!(model.uuid(), Some("bd3fae18-5ea1-4bc5-8837-45400cf1f8f6"));
    }

    #[test]
    fn test_lookup_across_tree() {
        let mut model = Model::default();
        model
            .add_machine(MachineArgs {
                id: "0".into(),
                ..Default::default()
            })
            .add_container(MachineArgs {
                id: "0/lxd/0".into(),
                ..Default::default()
            });
        model
            .add_application(ApplicationArgs {
                name: "mysql".into(),
                ..Default::default()
            })
            .add_unit(UnitArgs {
                name: "mysql/0".into(),
                ..Default::default()
            });

        assert!(model.machine("0/lxd/0").is_some());
        assert_eq!(model.all_machines().len(), 2);
        assert_eq!(model.all_units().count(), 1);
        assert!(model.application("mysql").is_some());
    }

    #[test]
    fn test_mutators_stamp_child_collections() {
        use crate::model::{
            AttachmentHost, CloudCredentialArgs, EndpointArgs, FilesystemAttachmentArgs,
            SecretRevisionArgs, VolumeAttachmentArgs,
        };

        let mut model = Model::new(ModelArgs {
            owner: "admin".to_string(),
            ..Default::default()
        });
        model
            .add_relation(RelationArgs {
                key: "mysql:cluster".to_string(),
                ..Default::default()
            })
            .add_endpoint(EndpointArgs {
                application_name: "mysql".into(),
                ..Default::default()
            });
        model
            .add_volume(VolumeArgs {
                id: "0".into(),
                ..Default::default()
            })
            .add_attachment(VolumeAttachmentArgs::on(AttachmentHost::Machine("0".into())));
        model
            .add_filesystem(FilesystemArgs {
                id: "0".into(),
                ..Default::default()
            })
            .add_attachment(FilesystemAttachmentArgs::on(AttachmentHost::Unit(
                "mysql/0".into(),
            )));
        model
            .add_secret(SecretArgs {
                id: "s1".into(),
                ..Default::default()
            })
            .add_revision(SecretRevisionArgs {
                number: 1,
                ..Default::default()
            });
        model.set_cloud_credential(CloudCredential::new(CloudCredentialArgs {
            owner: "admin".to_string(),
            ..Default::default()
        }));

        assert_eq!(model.relations().as_slice()[0].endpoints().len(), 1);
        assert_eq!(
            model.volumes().as_slice()[0].attachments().version(),
            crate::model::VolumeAttachment::LATEST_VERSION
        );
        assert_eq!(model.filesystems().as_slice()[0].attachments().len(), 1);
        assert_eq!(model.secrets().as_slice()[0].revisions().len(), 1);
        assert_eq!(model.cloud_credential.as_ref().map(|c| c.owner.as_str()), Some("admin"));
        assert_eq!(model.secrets().version(), Secret::LATEST_VERSION);
    }

    #[test]
    fn test_application_mut_reaches_units() {
        let mut model = Model::default();
        model
            .add_application(ApplicationArgs {
                name: "mysql".into(),
                ..Default::default()
            })
            .add_unit(UnitArgs {
                name: "mysql/0".into(),
                ..Default::default()
            });

        let app = model.application_mut("mysql").unwrap();
        app.unit_mut("mysql/0").unwrap().workload_version = "8.0".to_string();
        assert!(model.application_mut("wordpress").is_none());
        assert_eq!(
            model.application("mysql").unwrap().unit("mysql/0").unwrap().workload_version,
            "8.0"
        );
    }

    #[test]
    fn test_model_type_parse() {
        assert_eq!(ModelType::parse("caas"), Some(ModelType::Caas));
        assert_eq!(ModelType::parse("k8s"), None);
        assert_eq!(ModelType::Iaas.to_string(), "iaas");
    }
}
