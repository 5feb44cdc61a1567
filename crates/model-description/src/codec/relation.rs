//! Relation and endpoint encoding/decoding.

use std::collections::BTreeMap;

use crate::codec::primitives::{encode_collection, MapWriter};
use crate::codec::registry::{Registry, VersionHistory};
use crate::codec::schema::{FieldType, Fields};
use crate::codec::status::{encode_status, take_status_opt};
use crate::codec::Document;
use crate::error::DecodeError;
use crate::model::{Collection, Endpoint, Relation, UnitName};

// =============================================================================
// DECODING
// =============================================================================

pub(crate) fn history() -> VersionHistory<Relation> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("id", FieldType::Int)
                    .required("key", FieldType::String)
                    .required("endpoints", FieldType::Any)
            },
            decode_relation,
        )
        .version(2, |s| s.optional("status", FieldType::Any), decode_relation)
        .version(
            3,
            |s| {
                s.defaulted("suspended", FieldType::Bool, false)
                    .defaulted("suspended-reason", FieldType::String, "")
            },
            decode_relation,
        )
}

fn decode_relation(registry: &Registry, _: u32, mut f: Fields) -> Result<Relation, DecodeError> {
    let endpoints_doc: Document = f.take("endpoints")?;
    let endpoints = registry
        .endpoint
        .decode_collection(registry, &endpoints_doc, "endpoints")?;
    Ok(Relation {
        id: f.take("id")?,
        key: f.take("key")?,
        status: take_status_opt(registry, &mut f, "status")?,
        suspended: f.take_or_default("suspended")?,
        suspended_reason: f.take_or_default("suspended-reason")?,
        endpoints,
    })
}

pub(crate) fn endpoint_history() -> VersionHistory<Endpoint> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("application-name", FieldType::String)
                    .required("name", FieldType::String)
                    .required("role", FieldType::String)
                    .required("interface", FieldType::String)
                    .defaulted("optional", FieldType::Bool, false)
                    .defaulted("limit", FieldType::Int, 0i64)
                    .defaulted("scope", FieldType::String, "global")
                    .defaulted(
                        "unit-settings",
                        FieldType::map(FieldType::map(FieldType::Any)),
                        Document::empty_map(),
                    )
            },
            decode_endpoint,
        )
        .version(
            2,
            |s| {
                s.defaulted(
                    "application-settings",
                    FieldType::map(FieldType::Any),
                    Document::empty_map(),
                )
            },
            decode_endpoint,
        )
}

fn decode_endpoint(_: &Registry, _: u32, mut f: Fields) -> Result<Endpoint, DecodeError> {
    let unit_settings: BTreeMap<String, BTreeMap<String, Document>> = f.take("unit-settings")?;
    Ok(Endpoint {
        application_name: f.take::<String>("application-name")?.into(),
        name: f.take("name")?,
        role: f.take("role")?,
        interface: f.take("interface")?,
        optional: f.take("optional")?,
        limit: f.take("limit")?,
        scope: f.take("scope")?,
        application_settings: f.take_or_default("application-settings")?,
        unit_settings: unit_settings
            .into_iter()
            .map(|(unit, settings)| (UnitName::from(unit), settings))
            .collect(),
    })
}

/// Decodes a standalone `{"version": N, "relations": [...]}` collection.
pub fn decode_relations(
    registry: &Registry,
    doc: &Document,
) -> Result<Collection<Relation>, DecodeError> {
    registry.relation.decode_collection(registry, doc, "relations")
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a relation and its endpoints at the latest version.
pub fn encode_relation(relation: &Relation) -> Document {
    MapWriter::new()
        .field("id", relation.id)
        .field("key", relation.key.as_str())
        .opt_field("status", relation.status.as_ref().map(encode_status))
        .field("suspended", relation.suspended)
        .field("suspended-reason", relation.suspended_reason.as_str())
        .field(
            "endpoints",
            encode_collection("endpoints", relation.endpoints(), encode_endpoint),
        )
        .finish()
}

/// Encodes an endpoint at the latest version.
pub fn encode_endpoint(endpoint: &Endpoint) -> Document {
    let unit_settings: BTreeMap<String, Document> = endpoint
        .unit_settings
        .iter()
        .map(|(unit, settings)| (unit.to_string(), Document::from(settings.clone())))
        .collect();
    MapWriter::new()
        .field("application-name", endpoint.application_name.as_str())
        .field("name", endpoint.name.as_str())
        .field("role", endpoint.role.as_str())
        .field("interface", endpoint.interface.as_str())
        .field("optional", endpoint.optional)
        .field("limit", endpoint.limit)
        .field("scope", endpoint.scope.as_str())
        .field("application-settings", endpoint.application_settings.clone())
        .field("unit-settings", unit_settings)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Collection, EndpointArgs, Entity, RelationArgs, Status};
    use crate::testing::{doc, status_json};
    use crate::util::Timestamp;
    use serde_json::json;

    fn decode_json(value: serde_json::Value) -> Result<Collection<Relation>, DecodeError> {
        decode_relations(Registry::global(), &doc(value))
    }

    fn endpoint_v1(app: &str, role: &str) -> serde_json::Value {
        json!({
            "application-name": app,
            "name": "db",
            "role": role,
            "interface": "mysql",
            "unit-settings": {format!("{}/0", app): {"host": "10.0.0.1"}}
        })
    }

    #[test]
    fn test_decode_v1_defaults() {
        let relations = decode_json(json!({
            "version": 1,
            "relations": [{
                "id": 7,
                "key": "wordpress:db mysql:db",
                "endpoints": {
                    "version": 1,
                    "endpoints": [endpoint_v1("wordpress", "requirer"), endpoint_v1("mysql", "provider")]
                }
            }]
        }))
        .unwrap();
        let relation = &relations.as_slice()[0];

        assert_eq!(relation.id, 7);
        assert_eq!(relation.status, None);
        assert!(!relation.suspended);
        assert_eq!(relation.endpoints().len(), 2);

        let endpoint = &relation.endpoints().as_slice()[0];
        assert_eq!(endpoint.scope, "global");
        assert_eq!(endpoint.limit, 0);
        assert!(endpoint.application_settings.is_empty());
        assert_eq!(
            endpoint.unit_settings[&UnitName::new("wordpress/0")]["host"],
            Document::from("10.0.0.1")
        );
    }

    #[test]
    fn test_decode_v2_status() {
        let relations = decode_json(json!({
            "version": 2,
            "relations": [{
                "id": 1,
                "key": "a:b c:d",
                "status": status_json(),
                "endpoints": {"version": 2, "endpoints": []}
            }]
        }))
        .unwrap();
        assert_eq!(
            relations.as_slice()[0].status.as_ref().map(|s| s.value.as_str()),
            Some("active")
        );
    }

    #[test]
    fn test_bad_endpoint_context() {
        let mut endpoint = endpoint_v1("mysql", "provider");
        endpoint["limit"] = json!("one");
        let err = decode_json(json!({
            "version": 3,
            "relations": [{"id": 1, "key": "k", "endpoints": {"version": 2, "endpoints": [endpoint]}}]
        }))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "relations: relation 0 v3: endpoints: endpoint 0 v2: limit: expected int, got string(\"one\")"
        );
    }

    #[test]
    fn test_roundtrip() {
        let mut relation = Relation::new(RelationArgs {
            id: 3,
            key: "wordpress:db mysql:db".to_string(),
            suspended: true,
            suspended_reason: "maintenance".to_string(),
            ..Default::default()
        });
        relation.set_status(Status::simple("joined", Timestamp::default()));
        relation
            .add_endpoint(EndpointArgs {
                application_name: "mysql".into(),
                name: "db".to_string(),
                role: "provider".to_string(),
                interface: "mysql".to_string(),
                limit: 1,
                ..Default::default()
            })
            .set_unit_settings("mysql/0", BTreeMap::from([("port".to_string(), Document::Int(3306))]));

        let wrapped = MapWriter::versioned(Relation::LATEST_VERSION)
            .field("relations", vec![encode_relation(&relation)])
            .finish();
        let registry = Registry::global();
        let decoded = registry
            .relation
            .decode_collection(registry, &wrapped, "relations")
            .unwrap();
        assert_eq!(decoded.as_slice(), &[relation]);
    }
}
