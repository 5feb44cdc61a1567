//! Graph validation for decoded or constructed models.
//!
//! Decoding checks each entity's fields in isolation; it cannot see
//! siblings. Validation runs over the assembled graph and checks the
//! invariants that span entities: identifiers are present and unique, and
//! every cross-reference resolves to an entity of the expected kind.
//!
//! Validation is read-only and may be run any number of times.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::{ValidationError, ValidationReason};
use crate::model::{
    unit_ordinal_overflows, Application, AttachmentHost, CloudCredential, EntityKind, Filesystem,
    Machine, Model, Relation, Secret, StorageInstance, Unit, Volume, MODEL_SECRET_OWNER,
    UUID_CONFIG_KEY,
};

// =============================================================================
// INDEX
// =============================================================================

/// Identifier lookups over a model, built once per validation pass.
#[derive(Debug, Default)]
pub struct ModelIndex<'a> {
    machines: FxHashSet<&'a str>,
    applications: FxHashSet<&'a str>,
    /// Unit name to owning application name.
    units: FxHashMap<&'a str, &'a str>,
    spaces: FxHashSet<&'a str>,
    storages: FxHashSet<&'a str>,
    volumes: FxHashSet<&'a str>,
}

impl<'a> ModelIndex<'a> {
    pub fn new(model: &'a Model) -> Self {
        let mut index = Self::default();
        for machine in model.all_machines() {
            index.machines.insert(machine.id.as_str());
        }
        for app in model.applications() {
            index.applications.insert(app.name.as_str());
            for unit in app.units() {
                index.units.insert(unit.name.as_str(), app.name.as_str());
            }
        }
        index
            .spaces
            .extend(model.spaces().iter().map(|s| s.id.as_str()));
        index
            .storages
            .extend(model.storages().iter().map(|s| s.id.as_str()));
        index
            .volumes
            .extend(model.volumes().iter().map(|v| v.id.as_str()));
        index
    }

    pub fn has_machine(&self, id: &str) -> bool {
        self.machines.contains(id)
    }

    pub fn has_application(&self, name: &str) -> bool {
        self.applications.contains(name)
    }

    pub fn has_unit(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// The application a unit belongs to.
    pub fn unit_application(&self, name: &str) -> Option<&'a str> {
        self.units.get(name).copied()
    }

    pub fn has_space(&self, id: &str) -> bool {
        self.spaces.contains(id)
    }

    pub fn has_storage(&self, id: &str) -> bool {
        self.storages.contains(id)
    }

    pub fn has_volume(&self, id: &str) -> bool {
        self.volumes.contains(id)
    }

    pub fn has_host(&self, host: &AttachmentHost) -> bool {
        match host {
            AttachmentHost::Machine(id) => self.has_machine(id.as_str()),
            AttachmentHost::Unit(name) => self.has_unit(name.as_str()),
        }
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Validates a model, returning the first violation found.
///
/// Checks run in a fixed order, so the same graph always reports the same
/// violation.
pub fn validate(model: &Model) -> Result<(), ValidationError> {
    let mut checker = Checker::new(model, true);
    checker.run(model);
    match checker.errors.into_iter().next() {
        Some(err) => {
            debug!(error = %err, "model validation failed");
            Err(err)
        }
        None => Ok(()),
    }
}

/// Validates a model, returning every violation found.
pub fn validate_all(model: &Model) -> Vec<ValidationError> {
    let mut checker = Checker::new(model, false);
    checker.run(model);
    if !checker.errors.is_empty() {
        debug!(count = checker.errors.len(), "model validation failed");
    }
    checker.errors
}

struct Checker<'a> {
    index: ModelIndex<'a>,
    iaas: bool,
    first_only: bool,
    errors: Vec<ValidationError>,
}

impl<'a> Checker<'a> {
    fn new(model: &'a Model, first_only: bool) -> Self {
        Self {
            index: ModelIndex::new(model),
            iaas: !model.is_caas(),
            first_only,
            errors: Vec::new(),
        }
    }

    fn done(&self) -> bool {
        self.first_only && !self.errors.is_empty()
    }

    fn fail(&mut self, kind: EntityKind, id: &str, reason: ValidationReason) {
        if !self.done() {
            self.errors.push(ValidationError::new(kind, id, reason));
        }
    }

    fn missing(
        &mut self,
        kind: EntityKind,
        id: &str,
        field: &'static str,
        target: EntityKind,
        target_id: &str,
    ) {
        self.fail(
            kind,
            id,
            ValidationReason::MissingReference {
                field,
                target,
                id: target_id.to_string(),
            },
        );
    }

    /// Records an empty or repeated identifier. Returns whether the
    /// identifier is usable.
    fn identifier<'s>(
        &mut self,
        seen: &mut FxHashSet<&'s str>,
        kind: EntityKind,
        field: &'static str,
        id: &'s str,
    ) -> bool {
        if id.is_empty() {
            self.fail(kind, id, ValidationReason::EmptyIdentifier { field });
            false
        } else if !seen.insert(id) {
            self.fail(kind, id, ValidationReason::DuplicateIdentifier);
            false
        } else {
            true
        }
    }

    fn run(&mut self, model: &Model) {
        self.check_model(model);

        let mut seen = FxHashSet::default();
        for machine in model.all_machines() {
            self.identifier(&mut seen, EntityKind::Machine, "id", machine.id.as_str());
        }
        for machine in model.machines() {
            self.check_machine(machine);
        }

        let mut seen = FxHashSet::default();
        for app in model.applications() {
            self.identifier(&mut seen, EntityKind::Application, "name", app.name.as_str());
        }
        let mut seen_units = FxHashSet::default();
        for app in model.applications() {
            self.check_application(app, &mut seen_units);
        }

        let mut seen = FxHashSet::default();
        for relation in model.relations() {
            self.identifier(&mut seen, EntityKind::Relation, "key", relation.key.as_str());
            self.check_relation(relation);
        }

        let mut seen = FxHashSet::default();
        for space in model.spaces() {
            self.identifier(&mut seen, EntityKind::Space, "id", space.id.as_str());
            if space.name.is_empty() {
                self.fail(
                    EntityKind::Space,
                    space.id.as_str(),
                    ValidationReason::EmptyIdentifier { field: "name" },
                );
            }
        }

        let mut seen = FxHashSet::default();
        for subnet in model.subnets() {
            self.identifier(&mut seen, EntityKind::Subnet, "cidr", subnet.cidr.as_str());
            if let Some(space) = &subnet.space_id {
                if !self.index.has_space(space.as_str()) {
                    self.missing(
                        EntityKind::Subnet,
                        &subnet.cidr,
                        "space-id",
                        EntityKind::Space,
                        space.as_str(),
                    );
                }
            }
        }

        let mut seen = FxHashSet::default();
        for storage in model.storages() {
            self.identifier(&mut seen, EntityKind::StorageInstance, "id", storage.id.as_str());
            self.check_storage(storage);
        }

        let mut seen = FxHashSet::default();
        for volume in model.volumes() {
            self.identifier(&mut seen, EntityKind::Volume, "id", volume.id.as_str());
            self.check_volume(volume);
        }

        let mut seen = FxHashSet::default();
        for filesystem in model.filesystems() {
            self.identifier(&mut seen, EntityKind::Filesystem, "id", filesystem.id.as_str());
            self.check_filesystem(filesystem);
        }

        let mut seen = FxHashSet::default();
        for secret in model.secrets() {
            self.identifier(&mut seen, EntityKind::Secret, "id", secret.id.as_str());
            self.check_secret(secret);
        }
    }

    fn check_model(&mut self, model: &Model) {
        let id = model.uuid().unwrap_or_default();
        if model.owner.is_empty() {
            self.fail(
                EntityKind::Model,
                id,
                ValidationReason::EmptyIdentifier { field: "owner" },
            );
        }
        match model.config.get(UUID_CONFIG_KEY) {
            None => self.fail(
                EntityKind::Model,
                id,
                ValidationReason::InvalidValue {
                    field: "uuid",
                    detail: "missing from config".to_string(),
                },
            ),
            Some(value) => match value.as_str().map(uuid::Uuid::parse_str) {
                Some(Ok(_)) => {}
                Some(Err(err)) => self.fail(
                    EntityKind::Model,
                    id,
                    ValidationReason::InvalidValue {
                        field: "uuid",
                        detail: err.to_string(),
                    },
                ),
                None => self.fail(
                    EntityKind::Model,
                    id,
                    ValidationReason::InvalidValue {
                        field: "uuid",
                        detail: format!("expected string, got {}", value.describe()),
                    },
                ),
            },
        }
        if let Some(credential) = &model.cloud_credential {
            self.check_credential(credential);
        }
    }

    fn check_credential(&mut self, credential: &CloudCredential) {
        for (field, value) in [
            ("owner", &credential.owner),
            ("cloud", &credential.cloud),
            ("name", &credential.name),
        ] {
            if value.is_empty() {
                self.fail(
                    EntityKind::CloudCredential,
                    &credential.name,
                    ValidationReason::EmptyIdentifier { field },
                );
            }
        }
    }

    fn check_machine(&mut self, machine: &Machine) {
        let id = machine.id.as_str();
        if machine.jobs.is_empty() {
            self.fail(
                EntityKind::Machine,
                id,
                ValidationReason::EmptyCollection { collection: "jobs" },
            );
        }
        for container in machine.containers() {
            let expected_prefix = format!("{}/{}/", id, container.container_type);
            let well_formed = container
                .id
                .as_str()
                .strip_prefix(&expected_prefix)
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
            if !well_formed {
                self.fail(
                    EntityKind::Machine,
                    container.id.as_str(),
                    ValidationReason::InvalidIdentifier {
                        detail: format!("container id must be {}<n>", expected_prefix),
                    },
                );
            }
            self.check_machine(container);
        }
    }

    fn check_application(&mut self, app: &Application, seen_units: &mut FxHashSet<String>) {
        let name = app.name.as_str();

        if let Some(leader) = &app.leader {
            if app.unit(leader.as_str()).is_none() {
                self.missing(
                    EntityKind::Application,
                    name,
                    "leader",
                    EntityKind::Unit,
                    leader.as_str(),
                );
            }
        }
        for space in app.endpoint_bindings.values() {
            if !self.index.has_space(space.as_str()) {
                self.missing(
                    EntityKind::Application,
                    name,
                    "endpoint-bindings",
                    EntityKind::Space,
                    space.as_str(),
                );
            }
        }
        for endpoint in app.exposed_endpoints.values() {
            for space in &endpoint.expose_to_spaces {
                if !self.index.has_space(space.as_str()) {
                    self.missing(
                        EntityKind::Application,
                        name,
                        "exposed-endpoints",
                        EntityKind::Space,
                        space.as_str(),
                    );
                }
            }
        }

        for offer in app.offers() {
            if offer.endpoints.is_empty() {
                self.fail(
                    EntityKind::ApplicationOffer,
                    &offer.offer_name,
                    ValidationReason::EmptyCollection {
                        collection: "endpoints",
                    },
                );
            }
            if app.endpoint_bindings.is_empty() {
                continue;
            }
            for endpoint in offer.endpoints.values() {
                if !app.endpoint_bindings.contains_key(endpoint) {
                    self.fail(
                        EntityKind::ApplicationOffer,
                        &offer.offer_name,
                        ValidationReason::InvalidValue {
                            field: "endpoints",
                            detail: format!("endpoint {:?} is not bound on {}", endpoint, name),
                        },
                    );
                }
            }
        }

        for resource in app.resources() {
            if resource.application_revision.is_none() {
                self.fail(
                    EntityKind::Resource,
                    &resource.name,
                    ValidationReason::EmptyCollection {
                        collection: "application-revision",
                    },
                );
            }
        }

        for unit in app.units() {
            let unit_name = unit.name.as_str();
            if unit_name.is_empty() {
                self.fail(
                    EntityKind::Unit,
                    unit_name,
                    ValidationReason::EmptyIdentifier { field: "name" },
                );
                continue;
            }
            if !seen_units.insert(unit_name.to_string()) {
                self.fail(EntityKind::Unit, unit_name, ValidationReason::DuplicateIdentifier);
            }
            self.check_unit(app, unit);
        }
    }

    fn check_unit(&mut self, app: &Application, unit: &Unit) {
        let name = unit.name.as_str();
        match unit.name.application() {
            Some(owner) if owner == app.name.as_str() => {}
            Some(owner) => self.fail(
                EntityKind::Unit,
                name,
                ValidationReason::InvalidIdentifier {
                    detail: format!("unit of {} named for {}", app.name, owner),
                },
            ),
            None if unit_ordinal_overflows(name) => self.fail(
                EntityKind::Unit,
                name,
                ValidationReason::InvalidIdentifier {
                    detail: format!("ordinal exceeds {}", u32::MAX),
                },
            ),
            None => self.fail(
                EntityKind::Unit,
                name,
                ValidationReason::InvalidIdentifier {
                    detail: "expected <application>/<n>".to_string(),
                },
            ),
        }

        match &unit.machine {
            Some(machine) if !self.index.has_machine(machine.as_str()) => {
                self.missing(EntityKind::Unit, name, "machine", EntityKind::Machine, machine.as_str())
            }
            Some(_) => {}
            None if self.iaas && !unit.is_subordinate() => {
                self.fail(EntityKind::Unit, name, ValidationReason::Unassigned)
            }
            None => {}
        }
        if let Some(principal) = &unit.principal {
            if !self.index.has_unit(principal.as_str()) {
                self.missing(EntityKind::Unit, name, "principal", EntityKind::Unit, principal.as_str());
            }
        }
        for subordinate in &unit.subordinates {
            if !self.index.has_unit(subordinate.as_str()) {
                self.missing(
                    EntityKind::Unit,
                    name,
                    "subordinates",
                    EntityKind::Unit,
                    subordinate.as_str(),
                );
            }
        }
    }

    fn check_relation(&mut self, relation: &Relation) {
        let key = relation.key.as_str();
        if relation.endpoints().is_empty() {
            self.fail(
                EntityKind::Relation,
                key,
                ValidationReason::EmptyCollection {
                    collection: "endpoints",
                },
            );
        }
        for endpoint in relation.endpoints() {
            let app = endpoint.application_name.as_str();
            if !self.index.has_application(app) {
                self.missing(
                    EntityKind::Relation,
                    key,
                    "application-name",
                    EntityKind::Application,
                    app,
                );
                continue;
            }
            for unit in endpoint.unit_settings.keys() {
                if self.index.unit_application(unit.as_str()) != Some(app) {
                    self.missing(
                        EntityKind::Relation,
                        key,
                        "unit-settings",
                        EntityKind::Unit,
                        unit.as_str(),
                    );
                }
            }
        }
    }

    fn check_storage(&mut self, storage: &StorageInstance) {
        let id = storage.id.as_str();
        if let Some(owner) = &storage.owner {
            let resolved = self.index.has_unit(owner) || self.index.has_application(owner);
            if !resolved {
                let target = if crate::model::looks_like_unit_name(owner) {
                    EntityKind::Unit
                } else {
                    EntityKind::Application
                };
                self.missing(EntityKind::StorageInstance, id, "owner", target, owner);
            }
        }
        for unit in &storage.attachments {
            if !self.index.has_unit(unit) {
                self.missing(EntityKind::StorageInstance, id, "attachments", EntityKind::Unit, unit);
            }
        }
    }

    fn check_host(&mut self, kind: EntityKind, id: &str, host: &AttachmentHost) {
        if !self.index.has_host(host) {
            let target = match host {
                AttachmentHost::Machine(_) => EntityKind::Machine,
                AttachmentHost::Unit(_) => EntityKind::Unit,
            };
            self.missing(kind, id, "attachments", target, host.as_str());
        }
    }

    fn check_volume(&mut self, volume: &Volume) {
        let id = volume.id.as_str();
        if let Some(storage) = &volume.storage_id {
            if !self.index.has_storage(storage.as_str()) {
                self.missing(
                    EntityKind::Volume,
                    id,
                    "storage-id",
                    EntityKind::StorageInstance,
                    storage.as_str(),
                );
            }
        }
        for attachment in volume.attachments() {
            self.check_host(EntityKind::Volume, id, &attachment.host);
        }
    }

    fn check_filesystem(&mut self, filesystem: &Filesystem) {
        let id = filesystem.id.as_str();
        if let Some(storage) = &filesystem.storage_id {
            if !self.index.has_storage(storage.as_str()) {
                self.missing(
                    EntityKind::Filesystem,
                    id,
                    "storage-id",
                    EntityKind::StorageInstance,
                    storage.as_str(),
                );
            }
        }
        if let Some(volume) = &filesystem.volume_id {
            if !self.index.has_volume(volume.as_str()) {
                self.missing(
                    EntityKind::Filesystem,
                    id,
                    "volume-id",
                    EntityKind::Volume,
                    volume.as_str(),
                );
            }
        }
        for attachment in filesystem.attachments() {
            self.check_host(EntityKind::Filesystem, id, &attachment.host);
        }
    }

    fn check_secret(&mut self, secret: &Secret) {
        let id = secret.id.as_str();
        let owner = secret.owner.as_str();
        let resolved = owner == MODEL_SECRET_OWNER
            || self.index.has_application(owner)
            || self.index.has_unit(owner);
        if !resolved {
            let target = if crate::model::looks_like_unit_name(owner) {
                EntityKind::Unit
            } else {
                EntityKind::Application
            };
            self.missing(EntityKind::Secret, id, "owner", target, owner);
        }
        if secret.revisions().is_empty() {
            self.fail(
                EntityKind::Secret,
                id,
                ValidationReason::EmptyCollection {
                    collection: "revisions",
                },
            );
        }
        let mut numbers = FxHashSet::default();
        for revision in secret.revisions() {
            if !numbers.insert(revision.number) {
                self.fail(
                    EntityKind::SecretRevision,
                    &format!("{}/{}", id, revision.number),
                    ValidationReason::DuplicateIdentifier,
                );
            }
        }
    }
}
