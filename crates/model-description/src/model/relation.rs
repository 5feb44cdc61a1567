//! Relations between applications.

use std::collections::BTreeMap;

use crate::codec::Document;
use crate::model::{ApplicationName, Collection, Entity, EntityKind, Status, UnitName};

/// A relation joining two (or, for peers, one) application endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: i64,
    pub key: String,
    pub status: Option<Status>,
    pub suspended: bool,
    pub suspended_reason: String,
    pub(crate) endpoints: Collection<Endpoint>,
}

impl Entity for Relation {
    const KIND: EntityKind = EntityKind::Relation;
    const LATEST_VERSION: u32 = 3;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelationArgs {
    pub id: i64,
    pub key: String,
    pub status: Option<Status>,
    pub suspended: bool,
    pub suspended_reason: String,
}

impl Relation {
    pub fn new(args: RelationArgs) -> Self {
        Self {
            id: args.id,
            key: args.key,
            status: args.status,
            suspended: args.suspended,
            suspended_reason: args.suspended_reason,
            endpoints: Collection::new(),
        }
    }

    pub fn endpoints(&self) -> &Collection<Endpoint> {
        &self.endpoints
    }

    pub fn add_endpoint(&mut self, args: EndpointArgs) -> &mut Endpoint {
        self.endpoints.push(Endpoint::new(args))
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = Some(status);
    }
}

/// One side of a relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub application_name: ApplicationName,
    pub name: String,
    /// `provider`, `requirer` or `peer`.
    pub role: String,
    pub interface: String,
    pub optional: bool,
    pub limit: i64,
    /// `global` or `container`.
    pub scope: String,
    pub application_settings: BTreeMap<String, Document>,
    /// Relation settings per unit of the endpoint's application.
    pub unit_settings: BTreeMap<UnitName, BTreeMap<String, Document>>,
}

impl Entity for Endpoint {
    const KIND: EntityKind = EntityKind::Endpoint;
    const LATEST_VERSION: u32 = 2;
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointArgs {
    pub application_name: ApplicationName,
    pub name: String,
    pub role: String,
    pub interface: String,
    pub optional: bool,
    pub limit: i64,
    pub scope: String,
    pub application_settings: BTreeMap<String, Document>,
    pub unit_settings: BTreeMap<UnitName, BTreeMap<String, Document>>,
}

impl Default for EndpointArgs {
    fn default() -> Self {
        Self {
            application_name: ApplicationName::default(),
            name: String::new(),
            role: String::new(),
            interface: String::new(),
            optional: false,
            limit: 0,
            scope: "global".to_string(),
            application_settings: BTreeMap::new(),
            unit_settings: BTreeMap::new(),
        }
    }
}

impl Endpoint {
    pub fn new(args: EndpointArgs) -> Self {
        Self {
            application_name: args.application_name,
            name: args.name,
            role: args.role,
            interface: args.interface,
            optional: args.optional,
            limit: args.limit,
            scope: args.scope,
            application_settings: args.application_settings,
            unit_settings: args.unit_settings,
        }
    }

    /// Sets one unit's relation settings, replacing any previous ones.
    pub fn set_unit_settings(
        &mut self,
        unit: impl Into<UnitName>,
        settings: BTreeMap<String, Document>,
    ) {
        self.unit_settings.insert(unit.into(), settings);
    }
}
