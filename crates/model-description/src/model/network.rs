//! Network spaces and subnets.

use crate::model::id::present;
use crate::model::{Entity, EntityKind, SpaceId};

/// A named set of subnets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Space {
    pub id: SpaceId,
    pub name: String,
    pub provider_id: String,
}

impl Entity for Space {
    const KIND: EntityKind = EntityKind::Space;
    const LATEST_VERSION: u32 = 2;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpaceArgs {
    pub id: SpaceId,
    pub name: String,
    pub provider_id: String,
}

impl Space {
    pub fn new(args: SpaceArgs) -> Self {
        Self {
            id: args.id,
            name: args.name,
            provider_id: args.provider_id,
        }
    }
}

/// An address range, optionally placed in a space.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Subnet {
    pub cidr: String,
    pub provider_id: String,
    pub provider_network_id: String,
    pub vlan_tag: i64,
    pub space_id: Option<SpaceId>,
    pub availability_zones: Vec<String>,
    pub is_public: bool,
    pub fan_local_underlay: String,
    pub fan_overlay: String,
}

impl Entity for Subnet {
    const KIND: EntityKind = EntityKind::Subnet;
    const LATEST_VERSION: u32 = 3;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubnetArgs {
    pub cidr: String,
    pub provider_id: String,
    pub provider_network_id: String,
    pub vlan_tag: i64,
    pub space_id: Option<SpaceId>,
    pub availability_zones: Vec<String>,
    pub is_public: bool,
    pub fan_local_underlay: String,
    pub fan_overlay: String,
}

impl Subnet {
    pub fn new(args: SubnetArgs) -> Self {
        Self {
            cidr: args.cidr,
            provider_id: args.provider_id,
            provider_network_id: args.provider_network_id,
            vlan_tag: args.vlan_tag,
            space_id: present(args.space_id),
            availability_zones: args.availability_zones,
            is_public: args.is_public,
            fan_local_underlay: args.fan_local_underlay,
            fan_overlay: args.fan_overlay,
        }
    }
}
