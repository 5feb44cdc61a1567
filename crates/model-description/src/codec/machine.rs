//! Machine encoding/decoding. Containers nest as a machine collection of
//! their own, at any depth.

use crate::codec::migrate;
use crate::codec::primitives::{
    decode_platform, encode_collection, encode_platform, platform_schema, MapWriter,
};
use crate::codec::registry::{Registry, VersionHistory};
use crate::codec::schema::{FieldType, Fields, Schema};
use crate::codec::status::{encode_status, take_status};
use crate::codec::Document;
use crate::error::{DecodeError, DecodeResultExt};
use crate::model::{CloudInstance, Collection, Machine};

// =============================================================================
// DECODING
// =============================================================================

pub(crate) fn history() -> VersionHistory<Machine> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("id", FieldType::String)
                    .defaulted("nonce", FieldType::String, "")
                    .required("password-hash", FieldType::String)
                    .defaulted("placement", FieldType::String, "")
                    .required("series", FieldType::String)
                    .defaulted("container-type", FieldType::String, "")
                    .required("status", FieldType::Any)
                    .required("jobs", FieldType::list(FieldType::String))
                    .optional("supported-containers", FieldType::list(FieldType::String))
                    .required("containers", FieldType::Any)
                    .optional("annotations", FieldType::map(FieldType::String))
            },
            decode_machine,
        )
        .version(
            2,
            |s| s.optional("instance", FieldType::object(instance_schema())),
            decode_machine,
        )
        .version(
            3,
            |s| {
                s.remove("series")
                    .required("platform", FieldType::object(platform_schema()))
            },
            decode_machine,
        )
}

fn instance_schema() -> Schema {
    Schema::new()
        .required("instance-id", FieldType::String)
        .defaulted("status", FieldType::String, "")
        .optional("architecture", FieldType::String)
        .optional("memory", FieldType::Uint)
        .optional("root-disk", FieldType::Uint)
        .optional("cpu-cores", FieldType::Uint)
        .optional("availability-zone", FieldType::String)
}

fn decode_instance(mut f: Fields) -> Result<CloudInstance, DecodeError> {
    Ok(CloudInstance {
        instance_id: f.take("instance-id")?,
        status: f.take("status")?,
        architecture: f.take_opt("architecture")?,
        memory: f.take_opt("memory")?,
        root_disk: f.take_opt("root-disk")?,
        cpu_cores: f.take_opt("cpu-cores")?,
        availability_zone: f.take_opt("availability-zone")?,
    })
}

fn decode_machine(registry: &Registry, _: u32, mut f: Fields) -> Result<Machine, DecodeError> {
    let instance = f
        .take_opt::<Fields>("instance")?
        .map(decode_instance)
        .transpose()
        .within_field("instance")?;

    let platform = match f.take_opt::<Fields>("platform")? {
        Some(platform) => decode_platform(platform)?,
        None => {
            let series: String = f.take("series")?;
            let architecture = instance.as_ref().and_then(|i| i.architecture.as_deref());
            migrate::platform_from_series(&series, architecture).within_field("series")?
        }
    };

    let containers_doc: Document = f.take("containers")?;
    let containers = registry
        .machine
        .decode_collection(registry, &containers_doc, "containers")?;

    Ok(Machine {
        id: f.take::<String>("id")?.into(),
        nonce: f.take("nonce")?,
        password_hash: f.take("password-hash")?,
        placement: f.take("placement")?,
        platform,
        container_type: f.take("container-type")?,
        status: take_status(registry, &mut f, "status")?,
        jobs: f.take("jobs")?,
        supported_containers: f.take_opt("supported-containers")?,
        instance,
        annotations: f.take_or_default("annotations")?,
        containers,
    })
}

/// Decodes a standalone `{"version": N, "machines": [...]}` collection.
pub fn decode_machines(
    registry: &Registry,
    doc: &Document,
) -> Result<Collection<Machine>, DecodeError> {
    registry.machine.decode_collection(registry, doc, "machines")
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a machine and its containers at the latest version.
pub fn encode_machine(machine: &Machine) -> Document {
    MapWriter::new()
        .field("id", machine.id.as_str())
        .field("nonce", machine.nonce.as_str())
        .field("password-hash", machine.password_hash.as_str())
        .field("placement", machine.placement.as_str())
        .field("platform", encode_platform(&machine.platform))
        .field("container-type", machine.container_type.as_str())
        .field("status", encode_status(&machine.status))
        .field("jobs", machine.jobs.clone())
        .opt_field("supported-containers", machine.supported_containers.clone())
        .opt_field("instance", machine.instance.as_ref().map(encode_instance))
        .non_empty_map("annotations", &machine.annotations)
        .field(
            "containers",
            encode_collection("containers", machine.containers(), encode_machine),
        )
        .finish()
}

fn encode_instance(instance: &CloudInstance) -> Document {
    MapWriter::new()
        .field("instance-id", instance.instance_id.as_str())
        .field("status", instance.status.as_str())
        .opt_field("architecture", instance.architecture.as_deref())
        .opt_field("memory", instance.memory)
        .opt_field("root-disk", instance.root_disk)
        .opt_field("cpu-cores", instance.cpu_cores)
        .opt_field("availability-zone", instance.availability_zone.as_deref())
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrationError;
    use crate::model::{Collection, Entity, MachineArgs, Platform};
    use crate::testing::{doc, status_json};
    use serde_json::json;

    fn machine_v1(id: &str, series: &str) -> serde_json::Value {
        json!({
            "id": id,
            "password-hash": "hash",
            "series": series,
            "status": status_json(),
            "jobs": ["host-units"],
            "containers": {"version": 1, "containers": []}
        })
    }

    fn decode_json(value: serde_json::Value) -> Result<Collection<Machine>, DecodeError> {
        decode_machines(Registry::global(), &doc(value))
    }

    #[test]
    fn test_v1_bionic_backfills_platform() {
        let machines =
            decode_json(json!({"version": 1, "machines": [machine_v1("0", "bionic")]}))
                .unwrap();
        let machine = &machines.as_slice()[0];

        assert_eq!(machines.version(), Machine::LATEST_VERSION);
        assert_eq!(
            machine.platform,
            Platform::parse("amd64/ubuntu/18.04/stable").unwrap()
        );
        assert_eq!(machine.instance, None);
        assert_eq!(machine.containers().version(), Machine::LATEST_VERSION);
    }

    #[test]
    fn test_v2_uses_instance_architecture() {
        let mut machine = machine_v1("0", "focal");
        machine["instance"] = json!({"instance-id": "i-1", "architecture": "arm64", "memory": 2048});
        let machines = decode_json(json!({"version": 2, "machines": [machine]})).unwrap();
        let machine = &machines.as_slice()[0];

        assert_eq!(
            machine.platform,
            Platform::parse("arm64/ubuntu/20.04/stable").unwrap()
        );
        let instance = machine.instance.as_ref().unwrap();
        assert_eq!(instance.memory, Some(2048));
        assert_eq!(instance.status, "");
    }

    #[test]
    fn test_unknown_series_fails() {
        let err =
            decode_json(json!({"version": 1, "machines": [machine_v1("0", "not-a-series")]}))
                .unwrap_err();
        assert_eq!(
            err.as_migration(),
            Some(&MigrationError::UnknownSeries {
                series: "not-a-series".to_string()
            })
        );
    }

    #[test]
    fn test_nested_container_error_context() {
        let mut container = machine_v1("0/lxd/0", "bionic");
        container["jobs"] = json!("host-units");
        let mut host = machine_v1("0", "bionic");
        host["containers"] = json!({"version": 1, "containers": [container]});

        let err = decode_json(json!({"version": 1, "machines": [host]})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "machines: machine 0 v1: containers: machine 0 v1: jobs: expected list, got string(\"host-units\")"
        );
    }

    #[test]
    fn test_unknown_version() {
        let err = decode_json(json!({"version": 9, "machines": []})).unwrap_err();
        assert_eq!(err.to_string(), "machines: machine version 9 not valid");
    }

    #[test]
    fn test_roundtrip_with_containers() {
        let mut machine = Machine::new(MachineArgs {
            id: "0".into(),
            platform: Platform::parse("amd64/ubuntu/22.04/stable").unwrap(),
            jobs: vec!["host-units".to_string()],
            supported_containers: Some(vec!["lxd".to_string()]),
            ..Default::default()
        });
        machine.set_instance(CloudInstance {
            instance_id: "i-1".to_string(),
            cpu_cores: Some(4),
            ..Default::default()
        });
        machine.add_container(MachineArgs {
            id: "0/lxd/0".into(),
            container_type: "lxd".to_string(),
            platform: Platform::parse("amd64/ubuntu/22.04/stable").unwrap(),
            ..Default::default()
        });

        let encoded = encode_machine(&machine);
        let containers = encoded.get("containers").unwrap();
        assert_eq!(containers.get("version"), Some(&Document::Int(3)));

        let wrapped = MapWriter::versioned(Machine::LATEST_VERSION)
            .field("machines", vec![encoded])
            .finish();
        let registry = Registry::global();
        let decoded = registry
            .machine
            .decode_collection(registry, &wrapped, "machines")
            .unwrap();
        assert_eq!(decoded.as_slice(), &[machine]);
    }
}
