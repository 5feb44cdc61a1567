//! Top-level model document encoding/decoding.
//!
//! The model document carries its own `version`; every entity collection
//! inside it is a separately versioned scope dispatched to its kind's
//! history. Child collections are decoded by their parent's decoder.

use tracing::debug;

use crate::codec::application::{decode_applications, encode_application};
use crate::codec::credential::encode_credential;
use crate::codec::machine::{decode_machines, encode_machine};
use crate::codec::network::{decode_spaces, decode_subnets, encode_space, encode_subnet};
use crate::codec::primitives::{encode_collection, MapWriter};
use crate::codec::registry::{Registry, VersionHistory};
use crate::codec::relation::{decode_relations, encode_relation};
use crate::codec::schema::{FieldType, Fields};
use crate::codec::secret::{decode_secrets, encode_secret};
use crate::codec::storage::{
    decode_filesystems, decode_storages, decode_volumes, encode_filesystem, encode_storage,
    encode_volume,
};
use crate::codec::Document;
use crate::error::{DecodeError, DecodeErrorKind, DecodeResultExt, ImportError, ShapeError};
use crate::limits::MAX_NESTING_DEPTH;
use crate::model::{Collection, Entity, Model, ModelType};
use crate::validate::validate;

// =============================================================================
// DECODING
// =============================================================================

pub(crate) fn history() -> VersionHistory<Model> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("owner", FieldType::String)
                    .required("config", FieldType::map(FieldType::Any))
                    .required("cloud", FieldType::String)
                    .defaulted("cloud-region", FieldType::String, "")
                    .optional("cloud-credential", FieldType::Any)
                    .optional("annotations", FieldType::map(FieldType::String))
                    .optional("blocks", FieldType::map(FieldType::String))
                    .required("machines", FieldType::Any)
                    .required("applications", FieldType::Any)
                    .required("relations", FieldType::Any)
                    .required("spaces", FieldType::Any)
                    .required("subnets", FieldType::Any)
                    .required("storages", FieldType::Any)
                    .required("volumes", FieldType::Any)
                    .required("filesystems", FieldType::Any)
            },
            decode_fields,
        )
        .version(
            2,
            |s| {
                s.defaulted("type", FieldType::String, ModelType::Iaas.as_str())
                    .optional("secrets", FieldType::Any)
            },
            decode_fields,
        )
        .version(
            3,
            |s| s.defaulted("environ-version", FieldType::Int, 0i64),
            decode_fields,
        )
}

fn decode_fields(registry: &Registry, _: u32, mut f: Fields) -> Result<Model, DecodeError> {
    let model_type = match f.take_opt::<String>("type")? {
        None => ModelType::default(),
        Some(raw) => ModelType::parse(&raw)
            .ok_or_else(|| ShapeError::invalid("type", "iaas or caas", format!("{:?}", raw)))?,
    };
    let cloud_credential = match f.take_opt::<Document>("cloud-credential")? {
        Some(doc) => Some(
            registry
                .credential
                .decode_versioned(registry, &doc)
                .within_field("cloud-credential")?,
        ),
        None => None,
    };

    let machines = decode_machines(registry, &f.take("machines")?)?;
    let applications = decode_applications(registry, &f.take("applications")?)?;
    let relations = decode_relations(registry, &f.take("relations")?)?;
    let spaces = decode_spaces(registry, &f.take("spaces")?)?;
    let subnets = decode_subnets(registry, &f.take("subnets")?)?;
    let storages = decode_storages(registry, &f.take("storages")?)?;
    let volumes = decode_volumes(registry, &f.take("volumes")?)?;
    let filesystems = decode_filesystems(registry, &f.take("filesystems")?)?;
    let secrets = match f.take_opt::<Document>("secrets")? {
        Some(doc) => decode_secrets(registry, &doc)?,
        None => Collection::new(),
    };

    Ok(Model {
        model_type,
        owner: f.take("owner")?,
        config: f.take("config")?,
        cloud: f.take("cloud")?,
        cloud_region: f.take("cloud-region")?,
        cloud_credential,
        environ_version: f.take_or_default("environ-version")?,
        annotations: f.take_or_default("annotations")?,
        blocks: f.take_or_default("blocks")?,
        machines,
        applications,
        relations,
        spaces,
        subnets,
        storages,
        volumes,
        filesystems,
        secrets,
    })
}

/// Decodes a model document using the process-wide registry.
///
/// The result is not validated; call [`validate`](crate::validate::validate)
/// to check cross-references.
///
/// # Example
///
/// ```rust
/// use model_description::codec::{decode_model, encode_model};
/// use model_description::model::ModelBuilder;
///
/// let model = ModelBuilder::new("admin").cloud("aws", "us-east-1").build();
/// let decoded = decode_model(&encode_model(&model))?;
/// assert_eq!(decoded, model);
/// # Ok::<(), model_description::DecodeError>(())
/// ```
pub fn decode_model(doc: &Document) -> Result<Model, DecodeError> {
    decode_model_with(Registry::global(), doc)
}

/// Decodes a model document using an explicit registry.
pub fn decode_model_with(registry: &Registry, doc: &Document) -> Result<Model, DecodeError> {
    if doc.depth() > MAX_NESTING_DEPTH {
        return Err(DecodeErrorKind::NestingTooDeep {
            max: MAX_NESTING_DEPTH,
        }
        .into());
    }
    let model = registry.model.decode_versioned(registry, doc)?;
    debug!(
        machines = model.machines().len(),
        applications = model.applications().len(),
        relations = model.relations().len(),
        "decoded model"
    );
    Ok(model)
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a model at the latest version of every kind.
pub fn encode_model(model: &Model) -> Document {
    let mut writer = MapWriter::versioned(Model::LATEST_VERSION)
        .field("type", model.model_type.as_str())
        .field("owner", model.owner.as_str())
        .field("config", model.config.clone())
        .field("cloud", model.cloud.as_str())
        .field("cloud-region", model.cloud_region.as_str())
        .opt_field(
            "cloud-credential",
            model.cloud_credential.as_ref().map(encode_credential),
        )
        .field("environ-version", model.environ_version)
        .non_empty_map("annotations", &model.annotations)
        .non_empty_map("blocks", &model.blocks)
        .field(
            "machines",
            encode_collection("machines", model.machines(), encode_machine),
        )
        .field(
            "applications",
            encode_collection("applications", model.applications(), encode_application),
        )
        .field(
            "relations",
            encode_collection("relations", model.relations(), encode_relation),
        )
        .field("spaces", encode_collection("spaces", model.spaces(), encode_space))
        .field(
            "subnets",
            encode_collection("subnets", model.subnets(), encode_subnet),
        )
        .field(
            "storages",
            encode_collection("storages", model.storages(), encode_storage),
        )
        .field(
            "volumes",
            encode_collection("volumes", model.volumes(), encode_volume),
        )
        .field(
            "filesystems",
            encode_collection("filesystems", model.filesystems(), encode_filesystem),
        );
    if !model.secrets().is_empty() {
        writer = writer.field(
            "secrets",
            encode_collection("secrets", model.secrets(), encode_secret),
        );
    }
    debug!(
        machines = model.machines().len(),
        applications = model.applications().len(),
        "encoded model"
    );
    writer.finish()
}

// =============================================================================
// TEXT IMPORT / EXPORT
// =============================================================================

/// Options for [`import_model`].
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Validate the decoded graph before returning it.
    pub validate: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { validate: true }
    }
}

impl DecodeOptions {
    /// Creates default (validating) decode options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode options that skip graph validation.
    pub fn unchecked() -> Self {
        Self { validate: false }
    }
}

/// Options for [`export_model`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeOptions {
    /// Indent the output for humans.
    pub pretty: bool,
}

impl EncodeOptions {
    /// Creates default (compact) encoding options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates indented encoding options.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

/// Parses JSON text and decodes it into a model.
pub fn import_model(text: &str, options: &DecodeOptions) -> Result<Model, ImportError> {
    import_model_with(Registry::global(), text, options)
}

/// Parses JSON text and decodes it using an explicit registry.
pub fn import_model_with(
    registry: &Registry,
    text: &str,
    options: &DecodeOptions,
) -> Result<Model, ImportError> {
    let doc = Document::from_json_str(text)?;
    let model = decode_model_with(registry, &doc)?;
    if options.validate {
        validate(&model)?;
    }
    Ok(model)
}

/// Validates a model and serializes it as JSON text.
pub fn export_model(model: &Model, options: &EncodeOptions) -> Result<String, ImportError> {
    validate(model)?;
    let doc = encode_model(model);
    Ok(if options.pretty {
        doc.to_json_string_pretty()
    } else {
        doc.to_json_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ValidationError, ValidationReason, VersionError};
    use crate::model::{
        ApplicationArgs, EntityKind, MachineArgs, ModelBuilder, Platform, SpaceArgs,
        StorageConstraints, StorageInstanceArgs, SubnetArgs, UnitArgs, UnitName, VolumeArgs,
    };
    use crate::testing::{doc, legacy_model_json, sample_model};
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_sample_roundtrip() {
        let model = sample_model();
        let decoded = decode_model(&encode_model(&model)).unwrap();
        assert_eq!(decoded, model);
    }

    #[test]
    fn test_encode_decode_idempotent() {
        let encoded = encode_model(&sample_model());
        let reencoded = encode_model(&decode_model(&encoded).unwrap());
        assert_eq!(reencoded, encoded);
    }

    #[test]
    fn test_timestamp_spelling_survives_reencode() {
        let mut value = serde_json::Value::from(&encode_model(&sample_model()));
        value["machines"]["machines"][0]["status"]["updated"] = json!("2024-01-15T10:30:00.500Z");
        value["applications"]["applications"][0]["status"]["updated"] =
            json!("2024-01-15T10:30:00+00:00");
        value["secrets"]["secrets"][0]["create-time"] = json!("2024-01-15T10:30:00.123456789Z");
        let input = doc(value);

        let reencoded = encode_model(&decode_model(&input).unwrap());
        assert_eq!(reencoded, input);
        assert_eq!(
            reencoded["secrets"]["secrets"][0]["create-time"],
            Document::from("2024-01-15T10:30:00.123456789Z")
        );
    }

    fn huge_storage_model() -> Model {
        ModelBuilder::new("admin")
            .storage(StorageInstanceArgs {
                id: "data/0".into(),
                kind: "block".to_string(),
                name: "data".to_string(),
                constraints: Some(StorageConstraints {
                    pool: "ebs".to_string(),
                    size: u64::MAX,
                    count: i64::MAX as u64 + 1,
                }),
                ..Default::default()
            })
            .volume(
                VolumeArgs {
                    id: "0".into(),
                    size: u64::MAX,
                    ..Default::default()
                },
                |v| v,
            )
            .build()
    }

    #[test]
    fn test_unsigned_sizes_roundtrip() {
        let model = huge_storage_model();
        let encoded = encode_model(&model);
        assert_eq!(
            encoded["volumes"]["volumes"][0]["size"],
            Document::Uint(u64::MAX)
        );

        let decoded = decode_model(&encoded).unwrap();
        assert_eq!(decoded.volumes().as_slice()[0].size, u64::MAX);
        assert_eq!(decoded, model);
    }

    #[test]
    fn test_unsigned_sizes_survive_json_text() {
        let model = huge_storage_model();
        let text = encode_model(&model).to_json_string();
        assert!(text.contains("\"size\":18446744073709551615"));

        let imported = import_model(&text, &DecodeOptions::unchecked()).unwrap();
        assert_eq!(imported, model);
    }

    #[test]
    fn test_empty_references_normalize_on_construction() {
        let model = ModelBuilder::new("admin")
            .subnet(SubnetArgs {
                cidr: "10.0.0.0/24".to_string(),
                space_id: Some("".into()),
                ..Default::default()
            })
            .application(
                ApplicationArgs {
                    name: "mysql".into(),
                    leader: Some("".into()),
                    ..Default::default()
                },
                |a| {
                    a.unit(UnitArgs {
                        name: "mysql/0".into(),
                        machine: Some("".into()),
                        principal: Some("".into()),
                        ..Default::default()
                    })
                },
            )
            .storage(StorageInstanceArgs {
                id: "data/0".into(),
                owner: Some(String::new()),
                ..Default::default()
            })
            .volume(
                VolumeArgs {
                    id: "0".into(),
                    storage_id: Some("".into()),
                    ..Default::default()
                },
                |v| v,
            )
            .build();

        let app = model.application("mysql").unwrap();
        assert_eq!(app.leader, None);
        assert_eq!(app.unit("mysql/0").unwrap().machine, None);
        assert_eq!(app.unit("mysql/0").unwrap().principal, None);
        assert_eq!(model.subnets().as_slice()[0].space_id, None);
        assert_eq!(model.storages().as_slice()[0].owner, None);
        assert_eq!(model.volumes().as_slice()[0].storage_id, None);

        assert_eq!(decode_model(&encode_model(&model)).unwrap(), model);
    }

    #[test]
    fn test_collections_decode_standalone() {
        let model = sample_model();
        let encoded = encode_model(&model);
        let registry = Registry::global();

        let machines = decode_machines(registry, &encoded["machines"]).unwrap();
        assert_eq!(&machines, model.machines());
        let applications = decode_applications(registry, &encoded["applications"]).unwrap();
        assert_eq!(&applications, model.applications());
        let volumes = decode_volumes(registry, &encoded["volumes"]).unwrap();
        assert_eq!(&volumes, model.volumes());
        let secrets = decode_secrets(registry, &encoded["secrets"]).unwrap();
        assert_eq!(&secrets, model.secrets());

        let legacy = doc(legacy_model_json());
        let spaces = decode_spaces(registry, &legacy["spaces"]).unwrap();
        assert_eq!(spaces.as_slice()[0].name, "alpha");
        let subnets = decode_subnets(registry, &legacy["subnets"]).unwrap();
        assert_eq!(subnets.version(), crate::model::Subnet::LATEST_VERSION);

        let err = decode_relations(registry, &doc(json!({"version": 1}))).unwrap_err();
        assert_eq!(err.to_string(), "relations: relations: expected list, got nothing");
    }

    #[test]
    fn test_legacy_document_upgrades() {
        let model = decode_model(&doc(legacy_model_json())).unwrap();

        assert_eq!(model.model_type, ModelType::Iaas);
        assert_eq!(model.environ_version, 0);
        assert!(model.secrets().is_empty());
        assert_eq!(model.machines().version(), 3);
        assert_eq!(model.applications().version(), 4);

        let app = model.application("wordpress").unwrap();
        assert_eq!(app.platform, Platform::parse("amd64/ubuntu/18.04/stable").unwrap());
        assert_eq!(app.units().version(), 3);

        let credential = model.cloud_credential.as_ref().unwrap();
        assert_eq!(credential.auth_type, "oauth2");

        let volume = &model.volumes().as_slice()[0];
        assert_eq!(
            volume.attachments().as_slice()[0].host.unit(),
            Some(&UnitName::new("wordpress/0"))
        );

        validate(&model).unwrap();
    }

    #[test]
    fn test_bad_model_type() {
        let mut value = legacy_model_json();
        value["version"] = json!(2);
        value["type"] = json!("paas");
        let err = decode_model(&doc(value)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "model v2: type: expected iaas or caas, got \"paas\""
        );
    }

    #[test]
    fn test_unknown_model_version() {
        let mut value = legacy_model_json();
        value["version"] = json!(42);
        let err = decode_model(&doc(value)).unwrap_err();
        assert_eq!(
            err.as_version(),
            Some(&VersionError::Unknown {
                kind: EntityKind::Model,
                version: 42
            })
        );
    }

    #[test]
    fn test_missing_collection() {
        let mut value = legacy_model_json();
        value.as_object_mut().unwrap().remove("relations");
        let err = decode_model(&doc(value)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "model v1: relations: expected any, got nothing"
        );
    }

    #[test]
    fn test_nested_error_context() {
        let mut value = legacy_model_json();
        value["applications"]["applications"][0]["units"]["units"][0]["agent-status"]["updated"] =
            json!(12);
        let err = decode_model(&doc(value)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "model v1: applications: application 0 v1: units: unit 0 v1: agent-status: status v2: updated: expected time, got int(12)"
        );
    }

    #[test]
    fn test_not_a_map() {
        let err = decode_model(&Document::from("model")).unwrap_err();
        assert_eq!(err.to_string(), "expected map, got string(\"model\")");
    }

    #[test]
    fn test_too_deep() {
        let mut nested = Document::empty_list();
        for _ in 0..=MAX_NESTING_DEPTH {
            nested = Document::List(vec![nested]);
        }
        let err = decode_model(&nested).unwrap_err();
        assert_eq!(
            err.kind(),
            &DecodeErrorKind::NestingTooDeep {
                max: MAX_NESTING_DEPTH
            }
        );
    }

    #[test]
    fn test_import_export() {
        let model = sample_model();
        let text = export_model(&model, &EncodeOptions::pretty()).unwrap();
        assert!(text.contains('\n'));

        let imported = import_model(&text, &DecodeOptions::new()).unwrap();
        assert_eq!(imported, model);
    }

    #[test]
    fn test_import_syntax_error() {
        let err = import_model("{\"version\": ", &DecodeOptions::new()).unwrap_err();
        match err {
            ImportError::Decode(err) => {
                assert!(matches!(err.kind(), DecodeErrorKind::Syntax(_)))
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_import_validates() {
        let model = ModelBuilder::new("admin")
            .uuid("bd3fae18-5ea1-4bc5-8837-45400cf1f8f6")
            .application(
                ApplicationArgs {
                    name: "mysql".into(),
                    ..Default::default()
                },
                |a| a.leader("mysql/7"),
            )
            .build();
        let text = encode_model(&model).to_json_string();

        let err = import_model(&text, &DecodeOptions::new()).unwrap_err();
        assert!(matches!(
            err,
            ImportError::Validation(ValidationError {
                kind: EntityKind::Application,
                reason: ValidationReason::MissingReference { .. },
                ..
            })
        ));
        assert!(import_model(&text, &DecodeOptions::unchecked()).is_ok());
        assert!(export_model(&model, &EncodeOptions::new()).is_err());
    }

    fn arb_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,8}"
    }

    fn arb_model() -> impl Strategy<Value = Model> {
        (
            arb_name(),
            prop::collection::btree_set(arb_name(), 0..4),
            0u32..4,
            prop::collection::vec(("[0-9]{1,3}", any::<i64>(), any::<bool>()), 0..4),
            prop::bool::ANY,
        )
            .prop_map(|(owner, apps, machines, subnets, caas)| {
                let mut builder = ModelBuilder::new(owner)
                    .uuid("bd3fae18-5ea1-4bc5-8837-45400cf1f8f6")
                    .model_type(if caas { ModelType::Caas } else { ModelType::Iaas })
                    .space(SpaceArgs {
                        id: "0".into(),
                        name: "alpha".to_string(),
                        ..Default::default()
                    });
                for i in 0..machines {
                    builder = builder.machine(
                        MachineArgs {
                            id: i.to_string().into(),
                            jobs: vec!["host-units".to_string()],
                            ..Default::default()
                        },
                        |m| m,
                    );
                }
                for (i, (octet, vlan, public)) in subnets.into_iter().enumerate() {
                    builder = builder.subnet(SubnetArgs {
                        cidr: format!("10.{}.{}.0/24", octet, i),
                        vlan_tag: vlan,
                        is_public: public,
                        space_id: Some("0".into()),
                        ..Default::default()
                    });
                }
                for app in apps {
                    let unit = format!("{}/0", app);
                    builder = builder.application(
                        ApplicationArgs {
                            name: app.as_str().into(),
                            ..Default::default()
                        },
                        |a| {
                            a.unit(UnitArgs {
                                name: unit.as_str().into(),
                                ..Default::default()
                            })
                            .leader(unit.as_str())
                            .setting("replicas", 3i64)
                        },
                    );
                }
                builder.build()
            })
    }

    proptest! {
        #[test]
        fn test_construct_encode_decode(model in arb_model()) {
            let encoded = encode_model(&model);
            let decoded = decode_model(&encoded).unwrap();
            prop_assert_eq!(&decoded, &model);
            prop_assert_eq!(encode_model(&decoded), encoded);
        }

        #[test]
        fn test_text_roundtrip(model in arb_model()) {
            let text = encode_model(&model).to_json_string();
            let imported = import_model(&text, &DecodeOptions::unchecked()).unwrap();
            prop_assert_eq!(imported, model);
        }
    }
}
