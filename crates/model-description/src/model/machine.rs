//! Machines and the containers they host.

use std::collections::BTreeMap;

use crate::model::{Collection, Entity, EntityKind, MachineId, Platform, Status};

/// A machine, possibly a container inside another machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    pub id: MachineId,
    pub nonce: String,
    pub password_hash: String,
    pub placement: String,
    pub platform: Platform,
    /// `lxd`, `kvm`, ... for containers; empty for top-level machines.
    pub container_type: String,
    pub status: Status,
    pub jobs: Vec<String>,
    pub supported_containers: Option<Vec<String>>,
    pub instance: Option<CloudInstance>,
    pub annotations: BTreeMap<String, String>,
    pub(crate) containers: Collection<Machine>,
}

impl Entity for Machine {
    const KIND: EntityKind = EntityKind::Machine;
    const LATEST_VERSION: u32 = 3;
}

/// Arguments for [`Machine::new`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MachineArgs {
    pub id: MachineId,
    pub nonce: String,
    pub password_hash: String,
    pub placement: String,
    pub platform: Platform,
    pub container_type: String,
    pub status: Status,
    pub jobs: Vec<String>,
    pub supported_containers: Option<Vec<String>>,
    pub instance: Option<CloudInstance>,
    pub annotations: BTreeMap<String, String>,
}

impl Machine {
    pub fn new(args: MachineArgs) -> Self {
        Self {
            id: args.id,
            nonce: args.nonce,
            password_hash: args.password_hash,
            placement: args.placement,
            platform: args.platform,
            container_type: args.container_type,
            status: args.status,
            jobs: args.jobs,
            supported_containers: args.supported_containers,
            instance: args.instance,
            annotations: args.annotations,
            containers: Collection::new(),
        }
    }

    pub fn containers(&self) -> &Collection<Machine> {
        &self.containers
    }

    /// Adds a container, stamping the container collection.
    pub fn add_container(&mut self, args: MachineArgs) -> &mut Machine {
        self.containers.push(Machine::new(args))
    }

    pub fn set_instance(&mut self, instance: CloudInstance) -> &mut CloudInstance {
        self.instance.insert(instance)
    }

    /// This machine followed by every nested container, depth first.
    pub fn walk(&self) -> Vec<&Machine> {
        let mut out = vec![self];
        for container in &self.containers {
            out.extend(container.walk());
        }
        out
    }
}

/// Provider-side details of a provisioned machine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CloudInstance {
    pub instance_id: String,
    pub status: String,
    pub architecture: Option<String>,
    /// Memory in MiB.
    pub memory: Option<u64>,
    /// Root disk in MiB.
    pub root_disk: Option<u64>,
    pub cpu_cores: Option<u64>,
    pub availability_zone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_container_and_walk() {
        let mut machine = Machine::new(MachineArgs {
            id: "0".into(),
            jobs: vec!["host-units".to_string()],
            ..Default::default()
        });
        machine
            .add_container(MachineArgs {
                id: "0/lxd/0".into(),
                container_type: "lxd".to_string(),
                ..Default::default()
            })
            .add_container(MachineArgs {
                id: "0/lxd/0/kvm/0".into(),
                container_type: "kvm".to_string(),
                ..Default::default()
            });

        let ids: Vec<_> = machine.walk().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "0/lxd/0", "0/lxd/0/kvm/0"]);
        assert_eq!(machine.containers().version(), Machine::LATEST_VERSION);
    }

    #[test]
    fn test_set_instance() {
        let mut machine = Machine::new(MachineArgs::default());
        machine.set_instance(CloudInstance {
            instance_id: "i-123".to_string(),
            ..Default::default()
        });
        assert_eq!(machine.instance.as_ref().map(|i| i.instance_id.as_str()), Some("i-123"));
    }
}
