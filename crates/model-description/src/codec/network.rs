//! Space and subnet encoding/decoding.

use crate::codec::migrate;
use crate::codec::primitives::{non_empty, MapWriter};
use crate::codec::registry::{Registry, VersionHistory};
use crate::codec::schema::{FieldType, Fields};
use crate::codec::Document;
use crate::error::DecodeError;
use crate::model::{Collection, Space, SpaceId, Subnet};

// =============================================================================
// DECODING
// =============================================================================

pub(crate) fn space_history() -> VersionHistory<Space> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("id", FieldType::String)
                    .required("name", FieldType::String)
                    .defaulted("public", FieldType::Bool, false)
                    .defaulted("provider-id", FieldType::String, "")
            },
            decode_space,
        )
        // `public` was never meaningful and is dropped without migration.
        .version(2, |s| s.remove("public"), decode_space)
}

fn decode_space(_: &Registry, _: u32, mut f: Fields) -> Result<Space, DecodeError> {
    Ok(Space {
        id: f.take::<String>("id")?.into(),
        name: f.take("name")?,
        provider_id: f.take("provider-id")?,
    })
}

pub(crate) fn subnet_history() -> VersionHistory<Subnet> {
    VersionHistory::new()
        .version(
            1,
            |s| {
                s.required("cidr", FieldType::String)
                    .defaulted("provider-id", FieldType::String, "")
                    .defaulted("vlan-tag", FieldType::Int, 0i64)
                    .optional("space-id", FieldType::String)
                    .defaulted("availability-zone", FieldType::String, "")
            },
            decode_subnet,
        )
        .version(
            2,
            |s| {
                s.remove("availability-zone")
                    .defaulted(
                        "availability-zones",
                        FieldType::list(FieldType::String),
                        Document::empty_list(),
                    )
                    .defaulted("provider-network-id", FieldType::String, "")
            },
            decode_subnet,
        )
        .version(
            3,
            |s| {
                s.defaulted("is-public", FieldType::Bool, false)
                    .defaulted("fan-local-underlay", FieldType::String, "")
                    .defaulted("fan-overlay", FieldType::String, "")
            },
            decode_subnet,
        )
}

fn decode_subnet(_: &Registry, _: u32, mut f: Fields) -> Result<Subnet, DecodeError> {
    let availability_zones = match f.take_opt::<String>("availability-zone")? {
        Some(zone) => migrate::zones_from_single(zone),
        None => f.take("availability-zones")?,
    };
    Ok(Subnet {
        cidr: f.take("cidr")?,
        provider_id: f.take("provider-id")?,
        provider_network_id: f.take_or_default("provider-network-id")?,
        vlan_tag: f.take("vlan-tag")?,
        space_id: f
            .take_opt::<String>("space-id")?
            .and_then(non_empty)
            .map(SpaceId::from),
        availability_zones,
        is_public: f.take_or_default("is-public")?,
        fan_local_underlay: f.take_or_default("fan-local-underlay")?,
        fan_overlay: f.take_or_default("fan-overlay")?,
    })
}

/// Decodes a standalone `{"version": N, "spaces": [...]}` collection.
pub fn decode_spaces(
    registry: &Registry,
    doc: &Document,
) -> Result<Collection<Space>, DecodeError> {
    registry.space.decode_collection(registry, doc, "spaces")
}

/// Subnet counterpart of [`decode_spaces`].
pub fn decode_subnets(
    registry: &Registry,
    doc: &Document,
) -> Result<Collection<Subnet>, DecodeError> {
    registry.subnet.decode_collection(registry, doc, "subnets")
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a space at the latest version.
pub fn encode_space(space: &Space) -> Document {
    MapWriter::new()
        .field("id", space.id.as_str())
        .field("name", space.name.as_str())
        .field("provider-id", space.provider_id.as_str())
        .finish()
}

/// Encodes a subnet at the latest version.
pub fn encode_subnet(subnet: &Subnet) -> Document {
    MapWriter::new()
        .field("cidr", subnet.cidr.as_str())
        .field("provider-id", subnet.provider_id.as_str())
        .field("provider-network-id", subnet.provider_network_id.as_str())
        .field("vlan-tag", subnet.vlan_tag)
        .opt_field("space-id", subnet.space_id.as_ref().map(SpaceId::as_str))
        .field("availability-zones", subnet.availability_zones.clone())
        .field("is-public", subnet.is_public)
        .field("fan-local-underlay", subnet.fan_local_underlay.as_str())
        .field("fan-overlay", subnet.fan_overlay.as_str())
        .finish()
}
