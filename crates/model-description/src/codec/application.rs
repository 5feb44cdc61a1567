//! Application, unit, offer and resource encoding/decoding.

use std::collections::BTreeMap;

use crate::codec::migrate;
use crate::codec::primitives::{
    decode_platform, encode_collection, encode_platform, non_empty, platform_schema, string_list,
    string_map, MapWriter,
};
use crate::codec::registry::{Registry, VersionHistory};
use crate::codec::schema::{FieldType, Fields, Schema};
use crate::codec::status::{encode_status, take_status};
use crate::codec::Document;
use crate::error::{DecodeError, DecodeResultExt};
use crate::model::{
    Application, ApplicationOffer, Collection, Entity, ExposedEndpoint, MachineId, Resource,
    ResourceRevision, SpaceId, Unit, UnitName,
};

// =============================================================================
// DECODING
// =============================================================================

pub(crate) fn history() -> VersionHistory<Application> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("name", FieldType::String)
                    .required("series", FieldType::String)
                    .required("charm-url", FieldType::String)
                    .defaulted("charm-mod-version", FieldType::Int, 0i64)
                    .defaulted("force-charm", FieldType::Bool, false)
                    .defaulted("subordinate", FieldType::Bool, false)
                    .defaulted("exposed", FieldType::Bool, false)
                    .defaulted("min-units", FieldType::Int, 0i64)
                    .defaulted("password-hash", FieldType::String, "")
                    .required("status", FieldType::Any)
                    .required("settings", FieldType::map(FieldType::Any))
                    .optional("leader", FieldType::String)
                    .defaulted(
                        "leadership-settings",
                        FieldType::map(FieldType::Any),
                        Document::empty_map(),
                    )
                    .defaulted("metrics-creds", FieldType::String, "")
                    .required("units", FieldType::Any)
                    .optional("annotations", FieldType::map(FieldType::String))
            },
            decode_application,
        )
        .version(
            2,
            |s| {
                s.optional("endpoint-bindings", FieldType::map(FieldType::String))
                    .defaulted("has-resources", FieldType::Bool, false)
                    .optional("resources", FieldType::Any)
                    .optional("offers", FieldType::Any)
            },
            decode_application,
        )
        .version(
            3,
            |s| {
                s.remove("series")
                    .required("platform", FieldType::object(platform_schema()))
            },
            decode_application,
        )
        .version(
            4,
            |s| {
                s.optional(
                    "exposed-endpoints",
                    FieldType::map(FieldType::object(exposed_endpoint_schema())),
                )
                .defaulted("desired-scale", FieldType::Int, 0i64)
            },
            decode_application,
        )
}

fn exposed_endpoint_schema() -> Schema {
    Schema::new()
        .defaulted(
            "expose-to-spaces",
            FieldType::list(FieldType::String),
            Document::empty_list(),
        )
        .defaulted(
            "expose-to-cidrs",
            FieldType::list(FieldType::String),
            Document::empty_list(),
        )
}

fn decode_application(
    registry: &Registry,
    _: u32,
    mut f: Fields,
) -> Result<Application, DecodeError> {
    let platform = match f.take_opt::<Fields>("platform")? {
        Some(platform) => decode_platform(platform)?,
        None => {
            let series: String = f.take("series")?;
            migrate::platform_from_series(&series, None).within_field("series")?
        }
    };

    let bindings: BTreeMap<String, String> = f.take_or_default("endpoint-bindings")?;
    let exposed: BTreeMap<String, Fields> = f.take_or_default("exposed-endpoints")?;
    let exposed_endpoints = exposed
        .into_iter()
        .map(|(name, mut e)| {
            let spaces: Vec<String> = e.take("expose-to-spaces")?;
            let endpoint = ExposedEndpoint {
                expose_to_spaces: spaces.into_iter().map(SpaceId::from).collect(),
                expose_to_cidrs: e.take("expose-to-cidrs")?,
            };
            Ok((name, endpoint))
        })
        .collect::<Result<BTreeMap<_, _>, DecodeError>>()?;

    let units_doc: Document = f.take("units")?;
    let units = registry.unit.decode_collection(registry, &units_doc, "units")?;
    let offers = match f.take_opt::<Document>("offers")? {
        Some(doc) => registry.offer.decode_collection(registry, &doc, "offers")?,
        None => Collection::new(),
    };
    let resources = match f.take_opt::<Document>("resources")? {
        Some(doc) => registry
            .resource
            .decode_collection(registry, &doc, "resources")?,
        None => Collection::new(),
    };

    Ok(Application {
        name: f.take::<String>("name")?.into(),
        platform,
        charm_url: f.take("charm-url")?,
        charm_mod_version: f.take("charm-mod-version")?,
        force_charm: f.take("force-charm")?,
        subordinate: f.take("subordinate")?,
        exposed: f.take("exposed")?,
        exposed_endpoints,
        min_units: f.take("min-units")?,
        desired_scale: f.take_or_default("desired-scale")?,
        password_hash: f.take("password-hash")?,
        status: take_status(registry, &mut f, "status")?,
        settings: f.take("settings")?,
        leader: f
            .take_opt::<String>("leader")?
            .and_then(non_empty)
            .map(UnitName::from),
        leadership_settings: f.take("leadership-settings")?,
        metrics_creds: f.take("metrics-creds")?,
        endpoint_bindings: bindings
            .into_iter()
            .map(|(endpoint, space)| (endpoint, SpaceId::from(space)))
            .collect(),
        has_resources: f.take_or_default("has-resources")?,
        annotations: f.take_or_default("annotations")?,
        units,
        offers,
        resources,
    })
}

pub(crate) fn unit_history() -> VersionHistory<Unit> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("name", FieldType::String)
                    .required("machine", FieldType::String)
                    .optional("principal", FieldType::String)
                    .defaulted(
                        "subordinates",
                        FieldType::list(FieldType::String),
                        Document::empty_list(),
                    )
                    .required("workload-status", FieldType::Any)
                    .required("agent-status", FieldType::Any)
                    .defaulted("workload-version", FieldType::String, "")
                    .required("password-hash", FieldType::String)
                    .defaulted("meter-status-code", FieldType::String, "")
                    .defaulted("meter-status-info", FieldType::String, "")
                    .optional("annotations", FieldType::map(FieldType::String))
            },
            decode_unit,
        )
        .version(
            2,
            |s| s.optional("charm-state", FieldType::map(FieldType::String)),
            decode_unit,
        )
        .version(
            3,
            |s| {
                s.optional("machine", FieldType::String)
                    .optional("provider-id", FieldType::String)
            },
            decode_unit,
        )
}

fn decode_unit(registry: &Registry, _: u32, mut f: Fields) -> Result<Unit, DecodeError> {
    let subordinates: Vec<String> = f.take("subordinates")?;
    Ok(Unit {
        name: f.take::<String>("name")?.into(),
        machine: f
            .take_opt::<String>("machine")?
            .and_then(non_empty)
            .map(MachineId::from),
        principal: f
            .take_opt::<String>("principal")?
            .and_then(non_empty)
            .map(UnitName::from),
        subordinates: subordinates.into_iter().map(UnitName::from).collect(),
        workload_status: take_status(registry, &mut f, "workload-status")?,
        agent_status: take_status(registry, &mut f, "agent-status")?,
        workload_version: f.take("workload-version")?,
        password_hash: f.take("password-hash")?,
        meter_status_code: f.take("meter-status-code")?,
        meter_status_info: f.take("meter-status-info")?,
        charm_state: f.take_or_default("charm-state")?,
        provider_id: f.take_opt("provider-id")?,
        annotations: f.take_or_default("annotations")?,
    })
}

pub(crate) fn offer_history() -> VersionHistory<ApplicationOffer> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("offer-name", FieldType::String)
                    .required("endpoints", FieldType::list(FieldType::String))
                    .defaulted(
                        "acl",
                        FieldType::map(FieldType::String),
                        Document::empty_map(),
                    )
            },
            decode_offer,
        )
        .version(
            2,
            |s| {
                s.required("endpoints", FieldType::map(FieldType::String))
                    .defaulted("offer-uuid", FieldType::String, "")
                    .defaulted("application-description", FieldType::String, "")
            },
            decode_offer,
        )
}

fn decode_offer(_: &Registry, version: u32, mut f: Fields) -> Result<ApplicationOffer, DecodeError> {
    let endpoints = if version >= 2 {
        f.take("endpoints")?
    } else {
        migrate::offer_endpoints_from_list(f.take("endpoints")?)
    };
    Ok(ApplicationOffer {
        offer_uuid: f.take_or_default("offer-uuid")?,
        offer_name: f.take("offer-name")?,
        endpoints,
        acl: f.take("acl")?,
        application_description: f.take_or_default("application-description")?,
    })
}

pub(crate) fn resource_history() -> VersionHistory<Resource> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("name", FieldType::String)
                    .required("revision", FieldType::object(revision_schema()))
            },
            decode_resource,
        )
        .version(
            2,
            |s| {
                s.remove("revision")
                    .optional(
                        "application-revision",
                        FieldType::object(revision_schema()),
                    )
                    .optional(
                        "charmstore-revision",
                        FieldType::object(revision_schema()),
                    )
            },
            decode_resource,
        )
}

fn revision_schema() -> Schema {
    Schema::new()
        .required("revision", FieldType::Int)
        .defaulted("type", FieldType::String, "file")
        .required("path", FieldType::String)
        .defaulted("description", FieldType::String, "")
        .defaulted("origin", FieldType::String, "upload")
        .defaulted("fingerprint", FieldType::String, "")
        .defaulted("size", FieldType::Uint, 0i64)
        .optional("timestamp", FieldType::Time)
        .defaulted("username", FieldType::String, "")
}

fn decode_revision(mut f: Fields) -> Result<ResourceRevision, DecodeError> {
    Ok(ResourceRevision {
        revision: f.take("revision")?,
        kind: f.take("type")?,
        path: f.take("path")?,
        description: f.take("description")?,
        origin: f.take("origin")?,
        fingerprint: f.take("fingerprint")?,
        size: f.take("size")?,
        timestamp: f.take_opt("timestamp")?,
        username: f.take("username")?,
    })
}

fn decode_resource(_: &Registry, _: u32, mut f: Fields) -> Result<Resource, DecodeError> {
    // A single revision predates the application/charm store split and is
    // the revision the application uses.
    let application_revision = match f.take_opt::<Fields>("revision")? {
        Some(legacy) => Some(legacy),
        None => f.take_opt::<Fields>("application-revision")?,
    };
    Ok(Resource {
        name: f.take("name")?,
        application_revision: application_revision.map(decode_revision).transpose()?,
        charmstore_revision: f
            .take_opt::<Fields>("charmstore-revision")?
            .map(decode_revision)
            .transpose()?,
    })
}

/// Decodes a standalone `{"version": N, "applications": [...]}` collection.
pub fn decode_applications(
    registry: &Registry,
    doc: &Document,
) -> Result<Collection<Application>, DecodeError> {
    registry.application.decode_collection(registry, doc, "applications")
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes an application and its owned collections at the latest version.
pub fn encode_application(app: &Application) -> Document {
    let exposed: BTreeMap<String, Document> = app
        .exposed_endpoints
        .iter()
        .map(|(name, e)| {
            let endpoint = MapWriter::new()
                .field("expose-to-spaces", string_list(&e.expose_to_spaces))
                .field("expose-to-cidrs", e.expose_to_cidrs.clone())
                .finish();
            (name.clone(), endpoint)
        })
        .collect();

    let mut writer = MapWriter::new()
        .field("name", app.name.as_str())
        .field("platform", encode_platform(&app.platform))
        .field("charm-url", app.charm_url.as_str())
        .field("charm-mod-version", app.charm_mod_version)
        .field("force-charm", app.force_charm)
        .field("subordinate", app.subordinate)
        .field("exposed", app.exposed)
        .non_empty_map("exposed-endpoints", &exposed)
        .field("min-units", app.min_units)
        .field("desired-scale", app.desired_scale)
        .field("password-hash", app.password_hash.as_str())
        .field("status", encode_status(&app.status))
        .field("settings", app.settings.clone())
        .opt_field("leader", app.leader.as_ref().map(UnitName::as_str))
        .field("leadership-settings", app.leadership_settings.clone())
        .field("metrics-creds", app.metrics_creds.as_str())
        .non_empty_map("endpoint-bindings", &string_map(&app.endpoint_bindings))
        .field("has-resources", app.has_resources)
        .non_empty_map("annotations", &app.annotations)
        .field("units", encode_collection("units", app.units(), encode_unit));
    if !app.offers().is_empty() {
        writer = writer.field("offers", encode_collection("offers", app.offers(), encode_offer));
    }
    if !app.resources().is_empty() {
        writer = writer.field(
            "resources",
            encode_collection("resources", app.resources(), encode_resource),
        );
    }
    writer.finish()
}

/// Encodes a unit at the latest version.
pub fn encode_unit(unit: &Unit) -> Document {
    MapWriter::new()
        .field("name", unit.name.as_str())
        .opt_field("machine", unit.machine.as_ref().map(MachineId::as_str))
        .opt_field("principal", unit.principal.as_ref().map(UnitName::as_str))
        .field("subordinates", string_list(&unit.subordinates))
        .field("workload-status", encode_status(&unit.workload_status))
        .field("agent-status", encode_status(&unit.agent_status))
        .field("workload-version", unit.workload_version.as_str())
        .field("password-hash", unit.password_hash.as_str())
        .field("meter-status-code", unit.meter_status_code.as_str())
        .field("meter-status-info", unit.meter_status_info.as_str())
        .non_empty_map("charm-state", &unit.charm_state)
        .opt_field("provider-id", unit.provider_id.as_deref())
        .non_empty_map("annotations", &unit.annotations)
        .finish()
}

/// Encodes an offer at the latest version, with endpoints as a mapping.
pub fn encode_offer(offer: &ApplicationOffer) -> Document {
    MapWriter::new()
        .field("offer-uuid", offer.offer_uuid.as_str())
        .field("offer-name", offer.offer_name.as_str())
        .field("endpoints", offer.endpoints.clone())
        .field("acl", offer.acl.clone())
        .field(
            "application-description",
            offer.application_description.as_str(),
        )
        .finish()
}

/// Encodes a resource at the latest version.
pub fn encode_resource(resource: &Resource) -> Document {
    MapWriter::new()
        .field("name", resource.name.as_str())
        .opt_field(
            "application-revision",
            resource.application_revision.as_ref().map(encode_revision),
        )
        .opt_field(
            "charmstore-revision",
            resource.charmstore_revision.as_ref().map(encode_revision),
        )
        .finish()
}

fn encode_revision(rev: &ResourceRevision) -> Document {
    MapWriter::new()
        .field("revision", rev.revision)
        .field("type", rev.kind.as_str())
        .field("path", rev.path.as_str())
        .field("description", rev.description.as_str())
        .field("origin", rev.origin.as_str())
        .field("fingerprint", rev.fingerprint.as_str())
        .field("size", rev.size)
        .opt_field("timestamp", rev.timestamp)
        .field("username", rev.username.as_str())
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApplicationArgs, ApplicationOfferArgs, Platform, ResourceArgs, UnitArgs};
    use crate::testing::{doc, status_json};
    use serde_json::json;

    fn unit_v1() -> serde_json::Value {
        json!({
            "name": "mysql/0",
            "machine": "0",
            "workload-status": status_json(),
            "agent-status": status_json(),
            "password-hash": "hash"
        })
    }

    fn app_v1(units: Vec<serde_json::Value>) -> serde_json::Value {
        json!({
            "name": "mysql",
            "series": "bionic",
            "charm-url": "cs:mysql-42",
            "status": status_json(),
            "settings": {"dataset-size": "80%"},
            "leader": "mysql/0",
            "units": {"version": 1, "units": units}
        })
    }

    fn decode_apps(doc_value: serde_json::Value) -> Result<Collection<Application>, DecodeError> {
        let registry = Registry::global();
        registry
            .application
            .decode_collection(registry, &doc(doc_value), "applications")
    }

    #[test]
    fn test_decode_v1_backfills_platform() {
        let apps = decode_apps(json!({"version": 1, "applications": [app_v1(vec![unit_v1()])]}))
            .unwrap();
        let app = &apps.as_slice()[0];

        assert_eq!(apps.version(), Application::LATEST_VERSION);
        assert_eq!(app.platform, Platform::parse("amd64/ubuntu/18.04/stable").unwrap());
        assert_eq!(app.leader, Some(UnitName::new("mysql/0")));
        assert_eq!(app.units().version(), Unit::LATEST_VERSION);
        assert_eq!(app.units().as_slice()[0].machine, Some(MachineId::new("0")));
        assert!(app.offers().is_empty());
        assert!(!app.has_resources);
        assert_eq!(app.desired_scale, 0);
    }

    #[test]
    fn test_decode_unknown_series_fails() {
        let mut app = app_v1(vec![]);
        app["series"] = json!("not-a-series");
        let err = decode_apps(json!({"version": 2, "applications": [app]})).unwrap_err();

        assert!(matches!(
            err.as_migration(),
            Some(crate::error::MigrationError::UnknownSeries { series }) if series == "not-a-series"
        ));
        assert!(err.to_string().starts_with("applications: application 0 v2: series: "));
    }

    #[test]
    fn test_missing_unit_field_context() {
        let mut unit = unit_v1();
        unit.as_object_mut().unwrap().remove("password-hash");
        let err = decode_apps(json!({
            "version": 1,
            "applications": [app_v1(vec![unit_v1(), unit])]
        }))
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "applications: application 0 v1: units: unit 1 v1: password-hash: expected string, got nothing"
        );
        assert_eq!(err.as_shape().map(|e| e.path.as_str()), Some("password-hash"));
    }

    #[test]
    fn test_offer_v1_endpoints_become_map() {
        let registry = Registry::global();
        let offers = registry
            .offer
            .decode_collection(
                registry,
                &doc(json!({
                    "version": 1,
                    "offers": [{"offer-name": "db", "endpoints": ["b", "a"]}]
                })),
                "offers",
            )
            .unwrap();
        let offer = &offers.as_slice()[0];

        let expected: BTreeMap<String, String> = [("a", "a"), ("b", "b")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(offer.endpoints, expected);
        assert_eq!(offer.endpoint_list(), vec!["a".to_string(), "b".to_string()]);

        let encoded = encode_offer(offer);
        assert_eq!(encoded.get("endpoints"), Some(&doc(json!({"a": "a", "b": "b"}))));
    }

    #[test]
    fn test_resource_v1_revision_is_application_revision() {
        let registry = Registry::global();
        let resources = registry
            .resource
            .decode_collection(
                registry,
                &doc(json!({
                    "version": 1,
                    "resources": [{
                        "name": "data",
                        "revision": {"revision": 3, "path": "data.tgz", "size": 1024}
                    }]
                })),
                "resources",
            )
            .unwrap();
        let resource = &resources.as_slice()[0];
        let revision = resource.application_revision.as_ref().unwrap();

        assert_eq!(revision.revision, 3);
        assert_eq!(revision.kind, "file");
        assert_eq!(revision.size, 1024);
        assert_eq!(resource.charmstore_revision, None);
    }

    #[test]
    fn test_application_roundtrip() {
        let mut app = Application::new(ApplicationArgs {
            name: "mysql".into(),
            platform: Platform::parse("amd64/ubuntu/22.04/stable").unwrap(),
            charm_url: "ch:mysql-7".to_string(),
            exposed: true,
            exposed_endpoints: BTreeMap::from([(
                "db".to_string(),
                ExposedEndpoint {
                    expose_to_spaces: vec![SpaceId::new("alpha")],
                    expose_to_cidrs: vec!["10.0.0.0/8".to_string()],
                },
            )]),
            endpoint_bindings: BTreeMap::from([("".to_string(), SpaceId::new("alpha"))]),
            has_resources: true,
            ..Default::default()
        });
        app.add_unit(UnitArgs {
            name: "mysql/0".into(),
            machine: Some("0".into()),
            charm_state: BTreeMap::from([("k".to_string(), "v".to_string())]),
            provider_id: Some("pod-0".to_string()),
            ..Default::default()
        });
        app.add_offer(ApplicationOfferArgs {
            offer_name: "db".to_string(),
            endpoints: BTreeMap::from([("db".to_string(), "db".to_string())]),
            ..Default::default()
        });
        app.add_resource(ResourceArgs {
            name: "data".to_string(),
            application_revision: Some(ResourceRevision {
                revision: 2,
                path: "data.tgz".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        });
        app.set_leader("mysql/0");

        let encoded = encode_application(&app);
        assert!(encoded.get("offers").is_some());
        assert!(encoded.get("series").is_none());

        let wrapped = MapWriter::versioned(Application::LATEST_VERSION)
            .field("applications", vec![encoded])
            .finish();
        let registry = Registry::global();
        let decoded = registry
            .application
            .decode_collection(registry, &wrapped, "applications")
            .unwrap();
        assert_eq!(decoded.as_slice(), &[app]);
    }
}
