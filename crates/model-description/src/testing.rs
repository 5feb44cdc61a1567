//! Shared test fixtures.

use std::collections::BTreeMap;

use serde_json::json;

use crate::codec::Document;
use crate::model::{
    ApplicationArgs, ApplicationOfferArgs, AttachmentHost, CloudCredentialArgs, CloudInstance,
    EndpointArgs, ExposedEndpoint, FilesystemArgs, FilesystemAttachmentArgs, MachineArgs, Model,
    ModelBuilder, Platform, RelationArgs, ResourceArgs, ResourceRevision, SecretArgs,
    SecretRevisionArgs, SpaceArgs, SpaceId, Status, StorageConstraints, StorageInstanceArgs,
    SubnetArgs, UnitArgs, VolumeArgs, VolumeAttachmentArgs,
};
use crate::util::Timestamp;

pub const SAMPLE_UUID: &str = "bd3fae18-5ea1-4bc5-8837-45400cf1f8f6";

/// Converts a JSON fixture into a document.
pub fn doc(value: serde_json::Value) -> Document {
    Document::from(value)
}

/// A valid version 2 status document.
pub fn status_json() -> serde_json::Value {
    json!({
        "version": 2,
        "value": "active",
        "message": "ready",
        "updated": "2024-01-15T10:30:00Z"
    })
}

fn status(value: &str) -> Status {
    Status::simple(value, updated())
}

fn updated() -> Timestamp {
    Timestamp::parse("2024-01-15T10:30:00Z").unwrap()
}

fn jammy() -> Platform {
    Platform::parse("amd64/ubuntu/22.04/stable").unwrap()
}

/// A model at version 1 throughout, exercising every legacy migration
/// that applies to a small deployment.
pub fn legacy_model_json() -> serde_json::Value {
    let unit = json!({
        "name": "wordpress/0",
        "machine": "0",
        "workload-status": status_json(),
        "agent-status": status_json(),
        "password-hash": "unit-hash"
    });
    json!({
        "version": 1,
        "owner": "admin",
        "config": {"uuid": SAMPLE_UUID, "name": "legacy"},
        "cloud": "aws",
        "cloud-region": "us-east-1",
        "cloud-credential": {
            "version": 1,
            "owner": "admin",
            "cloud": "aws",
            "name": "default",
            "auth-type": "certificate",
            "attributes": {"Token": "t0k3n"}
        },
        "machines": {
            "version": 1,
            "machines": [{
                "id": "0",
                "password-hash": "machine-hash",
                "series": "bionic",
                "status": status_json(),
                "jobs": ["host-units"],
                "containers": {"version": 1, "containers": []}
            }]
        },
        "applications": {
            "version": 1,
            "applications": [{
                "name": "wordpress",
                "series": "bionic",
                "charm-url": "cs:wordpress-5",
                "status": status_json(),
                "settings": {"blog-title": "legacy"},
                "leader": "wordpress/0",
                "units": {"version": 1, "units": [unit]}
            }]
        },
        "relations": {"version": 1, "relations": []},
        "spaces": {"version": 1, "spaces": [{"id": "0", "name": "alpha", "public": true}]},
        "subnets": {
            "version": 1,
            "subnets": [{"cidr": "10.0.0.0/24", "space-id": "0", "availability-zone": "us-east-1a"}]
        },
        "storages": {
            "version": 1,
            "storages": [{
                "id": "data/0",
                "kind": "block",
                "owner": "wordpress/0",
                "name": "data",
                "attachments": ["wordpress/0"]
            }]
        },
        "volumes": {
            "version": 1,
            "volumes": [{
                "id": "0",
                "storage-id": "data/0",
                "size": 1024,
                "status": status_json(),
                "attachments": {"version": 1, "attachments": [{"host-id": "wordpress/0"}]}
            }]
        },
        "filesystems": {"version": 1, "filesystems": []}
    })
}

/// A valid model at the latest version that touches every entity kind.
pub fn sample_model() -> Model {
    ModelBuilder::new("admin")
        .uuid(SAMPLE_UUID)
        .name("sample")
        .config("logging-config", "<root>=INFO")
        .cloud("aws", "us-east-1")
        .credential(CloudCredentialArgs {
            owner: "admin".to_string(),
            cloud: "aws".to_string(),
            name: "default".to_string(),
            auth_type: "access-key".to_string(),
            attributes: BTreeMap::from([("access-key".to_string(), "AKIA".to_string())]),
        })
        .environ_version(2)
        .annotation("owner-team", "platform")
        .block("remove-object", "no removals during freeze")
        .space(SpaceArgs {
            id: "1".into(),
            name: "db".to_string(),
            provider_id: "space-db".to_string(),
        })
        .subnet(SubnetArgs {
            cidr: "10.0.0.0/24".to_string(),
            space_id: Some("1".into()),
            availability_zones: vec!["us-east-1a".to_string()],
            ..Default::default()
        })
        .machine(
            MachineArgs {
                id: "0".into(),
                platform: jammy(),
                status: status("started"),
                jobs: vec!["host-units".to_string()],
                instance: Some(CloudInstance {
                    instance_id: "i-0abc".to_string(),
                    status: "running".to_string(),
                    architecture: Some("amd64".to_string()),
                    memory: Some(4096),
                    ..Default::default()
                }),
                ..Default::default()
            },
            |m| {
                m.container(
                    MachineArgs {
                        id: "0/lxd/0".into(),
                        platform: jammy(),
                        container_type: "lxd".to_string(),
                        status: status("started"),
                        ..Default::default()
                    },
                    |c| c.job("host-units"),
                )
            },
        )
        .application(
            ApplicationArgs {
                name: "mysql".into(),
                platform: jammy(),
                charm_url: "ch:mysql-7".to_string(),
                status: status("active"),
                has_resources: true,
                exposed: true,
                exposed_endpoints: BTreeMap::from([(
                    "db".to_string(),
                    ExposedEndpoint {
                        expose_to_spaces: vec![SpaceId::new("1")],
                        expose_to_cidrs: vec![],
                    },
                )]),
                ..Default::default()
            },
            |a| {
                a.unit(UnitArgs {
                    name: "mysql/0".into(),
                    machine: Some("0".into()),
                    workload_status: status("active"),
                    agent_status: status("idle"),
                    ..Default::default()
                })
                .leader("mysql/0")
                .setting("dataset-size", "80%")
                .binding("db", "1")
                .offer(ApplicationOfferArgs {
                    offer_uuid: "4d0b6c8e-1f1a-4b0c-9a57-0f6c6b1f8c11".to_string(),
                    offer_name: "hosted-mysql".to_string(),
                    endpoints: BTreeMap::from([("db".to_string(), "db".to_string())]),
                    acl: BTreeMap::from([("admin".to_string(), "admin".to_string())]),
                    ..Default::default()
                })
                .resource(ResourceArgs {
                    name: "mysql-image".to_string(),
                    application_revision: Some(ResourceRevision {
                        revision: 3,
                        kind: "oci-image".to_string(),
                        path: "image.json".to_string(),
                        size: 512,
                        timestamp: Some(updated()),
                        ..Default::default()
                    }),
                    ..Default::default()
                })
            },
        )
        .application(
            ApplicationArgs {
                name: "wordpress".into(),
                platform: jammy(),
                charm_url: "ch:wordpress-12".to_string(),
                status: status("active"),
                ..Default::default()
            },
            |a| {
                a.unit(UnitArgs {
                    name: "wordpress/0".into(),
                    machine: Some("0/lxd/0".into()),
                    subordinates: vec!["telegraf/0".into()],
                    ..Default::default()
                })
                .leader("wordpress/0")
            },
        )
        .application(
            ApplicationArgs {
                name: "telegraf".into(),
                platform: jammy(),
                charm_url: "ch:telegraf-3".to_string(),
                subordinate: true,
                ..Default::default()
            },
            |a| {
                a.unit(UnitArgs {
                    name: "telegraf/0".into(),
                    principal: Some("wordpress/0".into()),
                    ..Default::default()
                })
            },
        )
        .relation(
            RelationArgs {
                id: 0,
                key: "wordpress:db mysql:db".to_string(),
                status: Some(status("joined")),
                ..Default::default()
            },
            |r| {
                r.endpoint(EndpointArgs {
                    application_name: "wordpress".into(),
                    name: "db".to_string(),
                    role: "requirer".to_string(),
                    interface: "mysql".to_string(),
                    unit_settings: BTreeMap::from([(
                        "wordpress/0".into(),
                        BTreeMap::from([("database".to_string(), Document::from("wp"))]),
                    )]),
                    ..Default::default()
                })
                .endpoint(EndpointArgs {
                    application_name: "mysql".into(),
                    name: "db".to_string(),
                    role: "provider".to_string(),
                    interface: "mysql".to_string(),
                    ..Default::default()
                })
            },
        )
        .storage(StorageInstanceArgs {
            id: "data/0".into(),
            kind: "block".to_string(),
            owner: Some("mysql/0".to_string()),
            name: "data".to_string(),
            attachments: vec!["mysql/0".to_string()],
            constraints: Some(StorageConstraints {
                pool: "ebs".to_string(),
                size: 10240,
                count: 1,
            }),
        })
        .volume(
            VolumeArgs {
                id: "0".into(),
                storage_id: Some("data/0".into()),
                provisioned: true,
                size: 10240,
                pool: "ebs".to_string(),
                status: status("attached"),
                ..Default::default()
            },
            |v| {
                v.attachment(VolumeAttachmentArgs {
                    provisioned: true,
                    device_name: "xvdf".to_string(),
                    ..VolumeAttachmentArgs::on(AttachmentHost::Machine("0".into()))
                })
            },
        )
        .filesystem(
            FilesystemArgs {
                id: "0".into(),
                storage_id: Some("data/0".into()),
                volume_id: Some("0".into()),
                size: 10240,
                status: status("attached"),
                ..Default::default()
            },
            |f| {
                f.attachment(FilesystemAttachmentArgs {
                    mount_point: "/var/lib/mysql".to_string(),
                    ..FilesystemAttachmentArgs::on(AttachmentHost::Unit("mysql/0".into()))
                })
            },
        )
        .secret(
            SecretArgs {
                id: "cj8k5ihqrkbc77ipcv0g".into(),
                owner: "mysql".to_string(),
                create_time: updated(),
                update_time: updated(),
                ..Default::default()
            },
            |s| {
                s.revision(SecretRevisionArgs {
                    number: 1,
                    create_time: updated(),
                    update_time: updated(),
                    content: BTreeMap::from([("password".to_string(), "czNjcjN0".to_string())]),
                    ..Default::default()
                })
            },
        )
        .build()
}
