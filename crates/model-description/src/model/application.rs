//! Applications and the entities they own: units, offers and resources.

use std::collections::BTreeMap;

use crate::codec::Document;
use crate::model::id::present;
use crate::model::{
    ApplicationName, Collection, Entity, EntityKind, MachineId, Platform, SpaceId, Status,
    UnitName,
};
use crate::util::Timestamp;

// =============================================================================
// Application
// =============================================================================

/// A deployed component and everything it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub name: ApplicationName,
    pub platform: Platform,
    pub charm_url: String,
    pub charm_mod_version: i64,
    pub force_charm: bool,
    pub subordinate: bool,
    pub exposed: bool,
    /// Per-endpoint exposure, keyed by endpoint name (`""` for all endpoints).
    pub exposed_endpoints: BTreeMap<String, ExposedEndpoint>,
    pub min_units: i64,
    pub desired_scale: i64,
    pub password_hash: String,
    pub status: Status,
    pub settings: BTreeMap<String, Document>,
    /// The unit currently holding leadership, if any.
    pub leader: Option<UnitName>,
    pub leadership_settings: BTreeMap<String, Document>,
    pub metrics_creds: String,
    /// Endpoint name to space id.
    pub endpoint_bindings: BTreeMap<String, SpaceId>,
    /// Carried as-is; not derived from `resources`.
    pub has_resources: bool,
    pub annotations: BTreeMap<String, String>,
    pub(crate) units: Collection<Unit>,
    pub(crate) offers: Collection<ApplicationOffer>,
    pub(crate) resources: Collection<Resource>,
}

impl Entity for Application {
    const KIND: EntityKind = EntityKind::Application;
    const LATEST_VERSION: u32 = 4;
}

/// Arguments for [`Application::new`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplicationArgs {
    pub name: ApplicationName,
    pub platform: Platform,
    pub charm_url: String,
    pub charm_mod_version: i64,
    pub force_charm: bool,
    pub subordinate: bool,
    pub exposed: bool,
    pub exposed_endpoints: BTreeMap<String, ExposedEndpoint>,
    pub min_units: i64,
    pub desired_scale: i64,
    pub password_hash: String,
    pub status: Status,
    pub settings: BTreeMap<String, Document>,
    pub leader: Option<UnitName>,
    pub leadership_settings: BTreeMap<String, Document>,
    pub metrics_creds: String,
    pub endpoint_bindings: BTreeMap<String, SpaceId>,
    pub has_resources: bool,
    pub annotations: BTreeMap<String, String>,
}

impl Application {
    pub fn new(args: ApplicationArgs) -> Self {
        Self {
            name: args.name,
            platform: args.platform,
            charm_url: args.charm_url,
            charm_mod_version: args.charm_mod_version,
            force_charm: args.force_charm,
            subordinate: args.subordinate,
            exposed: args.exposed,
            exposed_endpoints: args.exposed_endpoints,
            min_units: args.min_units,
            desired_scale: args.desired_scale,
            password_hash: args.password_hash,
            status: args.status,
            settings: args.settings,
            leader: present(args.leader),
            leadership_settings: args.leadership_settings,
            metrics_creds: args.metrics_creds,
            endpoint_bindings: args.endpoint_bindings,
            has_resources: args.has_resources,
            annotations: args.annotations,
            units: Collection::new(),
            offers: Collection::new(),
            resources: Collection::new(),
        }
    }

    pub fn units(&self) -> &Collection<Unit> {
        &self.units
    }

    pub fn offers(&self) -> &Collection<ApplicationOffer> {
        &self.offers
    }

    pub fn resources(&self) -> &Collection<Resource> {
        &self.resources
    }

    /// Adds a unit, stamping the unit collection.
    pub fn add_unit(&mut self, args: UnitArgs) -> &mut Unit {
        self.units.push(Unit::new(args))
    }

    /// Adds an offer, stamping the offer collection.
    pub fn add_offer(&mut self, args: ApplicationOfferArgs) -> &mut ApplicationOffer {
        self.offers.push(ApplicationOffer::new(args))
    }

    /// Adds a resource, stamping the resource collection.
    pub fn add_resource(&mut self, args: ResourceArgs) -> &mut Resource {
        self.resources.push(Resource::new(args))
    }

    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.find(|u| u.name.as_str() == name)
    }

    pub fn unit_mut(&mut self, name: &str) -> Option<&mut Unit> {
        self.units.find_mut(|u| u.name.as_str() == name)
    }

    /// Sets the leader unit. An empty name clears it.
    pub fn set_leader(&mut self, leader: impl Into<UnitName>) {
        self.leader = present(Some(leader.into()));
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}

/// Exposure of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExposedEndpoint {
    pub expose_to_spaces: Vec<SpaceId>,
    pub expose_to_cidrs: Vec<String>,
}

// =============================================================================
// Unit
// =============================================================================

/// A running instance of an application.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub name: UnitName,
    /// Hosting machine; `None` for units of container-based models.
    pub machine: Option<MachineId>,
    /// Principal unit of a subordinate.
    pub principal: Option<UnitName>,
    pub subordinates: Vec<UnitName>,
    pub workload_status: Status,
    pub agent_status: Status,
    pub workload_version: String,
    pub password_hash: String,
    pub meter_status_code: String,
    pub meter_status_info: String,
    pub charm_state: BTreeMap<String, String>,
    pub provider_id: Option<String>,
    pub annotations: BTreeMap<String, String>,
}

impl Entity for Unit {
    const KIND: EntityKind = EntityKind::Unit;
    const LATEST_VERSION: u32 = 3;
}

/// Arguments for [`Unit::new`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnitArgs {
    pub name: UnitName,
    pub machine: Option<MachineId>,
    pub principal: Option<UnitName>,
    pub subordinates: Vec<UnitName>,
    pub workload_status: Status,
    pub agent_status: Status,
    pub workload_version: String,
    pub password_hash: String,
    pub meter_status_code: String,
    pub meter_status_info: String,
    pub charm_state: BTreeMap<String, String>,
    pub provider_id: Option<String>,
    pub annotations: BTreeMap<String, String>,
}

impl Unit {
    pub fn new(args: UnitArgs) -> Self {
        Self {
            name: args.name,
            machine: present(args.machine),
            principal: present(args.principal),
            subordinates: args.subordinates,
            workload_status: args.workload_status,
            agent_status: args.agent_status,
            workload_version: args.workload_version,
            password_hash: args.password_hash,
            meter_status_code: args.meter_status_code,
            meter_status_info: args.meter_status_info,
            charm_state: args.charm_state,
            provider_id: args.provider_id,
            annotations: args.annotations,
        }
    }

    pub fn is_subordinate(&self) -> bool {
        self.principal.is_some()
    }
}

// =============================================================================
// ApplicationOffer
// =============================================================================

/// An application's endpoints offered for cross-model relations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplicationOffer {
    pub offer_uuid: String,
    pub offer_name: String,
    /// Offered alias to application endpoint name.
    pub endpoints: BTreeMap<String, String>,
    /// User to access level.
    pub acl: BTreeMap<String, String>,
    pub application_description: String,
}

impl Entity for ApplicationOffer {
    const KIND: EntityKind = EntityKind::ApplicationOffer;
    const LATEST_VERSION: u32 = 2;
}

/// Arguments for [`ApplicationOffer::new`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplicationOfferArgs {
    pub offer_uuid: String,
    pub offer_name: String,
    pub endpoints: BTreeMap<String, String>,
    pub acl: BTreeMap<String, String>,
    pub application_description: String,
}

impl ApplicationOffer {
    pub fn new(args: ApplicationOfferArgs) -> Self {
        Self {
            offer_uuid: args.offer_uuid,
            offer_name: args.offer_name,
            endpoints: args.endpoints,
            acl: args.acl,
            application_description: args.application_description,
        }
    }

    /// The endpoints as a sorted list of endpoint names, the shape legacy
    /// readers expect.
    pub fn endpoint_list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.endpoints.values().cloned().collect();
        names.sort();
        names
    }
}

// =============================================================================
// Resource
// =============================================================================

/// A charm resource and the revisions in use.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resource {
    pub name: String,
    /// The revision the application uses. Required for a valid resource.
    pub application_revision: Option<ResourceRevision>,
    /// The newest revision known to the charm store, if tracked.
    pub charmstore_revision: Option<ResourceRevision>,
}

impl Entity for Resource {
    const KIND: EntityKind = EntityKind::Resource;
    const LATEST_VERSION: u32 = 2;
}

/// Arguments for [`Resource::new`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceArgs {
    pub name: String,
    pub application_revision: Option<ResourceRevision>,
    pub charmstore_revision: Option<ResourceRevision>,
}

impl Resource {
    pub fn new(args: ResourceArgs) -> Self {
        Self {
            name: args.name,
            application_revision: args.application_revision,
            charmstore_revision: args.charmstore_revision,
        }
    }
}

/// One revision of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRevision {
    pub revision: i64,
    /// `file` or `oci-image`.
    pub kind: String,
    pub path: String,
    pub description: String,
    /// `upload` or `store`.
    pub origin: String,
    pub fingerprint: String,
    pub size: u64,
    pub timestamp: Option<Timestamp>,
    pub username: String,
}

impl Default for ResourceRevision {
    fn default() -> Self {
        Self {
            revision: 0,
            kind: "file".to_string(),
            path: String::new(),
            description: String::new(),
            origin: "upload".to_string(),
            fingerprint: String::new(),
            size: 0,
            timestamp: None,
            username: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_unit_stamps_units_only() {
        let mut app = Application::new(ApplicationArgs {
            name: "mysql".into(),
            ..Default::default()
        });
        app.add_unit(UnitArgs {
            name: "mysql/0".into(),
            ..Default::default()
        });

        assert_eq!(app.units().len(), 1);
        assert_eq!(app.units().version(), Unit::LATEST_VERSION);
        assert_eq!(app.offers().version(), ApplicationOffer::LATEST_VERSION);
        assert!(app.unit("mysql/0").is_some());
        assert!(app.unit("mysql/1").is_none());
    }

    #[test]
    fn test_set_leader() {
        let mut app = Application::new(ApplicationArgs {
            name: "mysql".into(),
            ..Default::default()
        });
        assert_eq!(app.leader, None);
        app.set_leader("mysql/0");
        assert_eq!(app.leader, Some(UnitName::new("mysql/0")));
        app.set_leader("");
        assert_eq!(app.leader, None);
    }

    #[test]
    fn test_offer_endpoint_list_is_sorted() {
        let offer = ApplicationOffer::new(ApplicationOfferArgs {
            offer_name: "db".to_string(),
            endpoints: [
                ("z-alias".to_string(), "a".to_string()),
                ("a-alias".to_string(), "b".to_string()),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        });
        assert_eq!(offer.endpoint_list(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_resource_revision_defaults() {
        let rev = ResourceRevision::default();
        assert_eq!(rev.kind, "file");
        assert_eq!(rev.origin, "upload");
        assert_eq!(rev.timestamp, None);
    }
}
