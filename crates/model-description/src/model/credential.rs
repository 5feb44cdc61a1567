//! Cloud credentials.

use std::collections::BTreeMap;

use crate::model::{Entity, EntityKind};

/// Auth type carried by legacy credentials whose real type is decided by
/// their attributes.
pub const LEGACY_CERTIFICATE_AUTH_TYPE: &str = "certificate";

/// Attribute bundles that identify an auth type, in priority order.
pub(crate) const AUTH_TYPE_BUNDLES: &[(&str, &[&str])] = &[
    ("clientcertificate", &["ClientCertificateData", "ClientKeyData"]),
    ("oauth2", &["Token"]),
];

/// The credential a model uses to talk to its cloud.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CloudCredential {
    pub owner: String,
    pub cloud: String,
    pub name: String,
    pub auth_type: String,
    pub attributes: BTreeMap<String, String>,
}

impl Entity for CloudCredential {
    const KIND: EntityKind = EntityKind::CloudCredential;
    const LATEST_VERSION: u32 = 2;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CloudCredentialArgs {
    pub owner: String,
    pub cloud: String,
    pub name: String,
    pub auth_type: String,
    pub attributes: BTreeMap<String, String>,
}

impl CloudCredential {
    pub fn new(args: CloudCredentialArgs) -> Self {
        Self {
            owner: args.owner,
            cloud: args.cloud,
            name: args.name,
            auth_type: args.auth_type,
            attributes: args.attributes,
        }
    }
}

/// Picks the first auth type whose full attribute bundle is present.
pub(crate) fn classify_auth_type(
    attributes: &BTreeMap<String, String>,
) -> Option<(&'static str, &'static [&'static str])> {
    AUTH_TYPE_BUNDLES
        .iter()
        .find(|(_, keys)| keys.iter().all(|key| attributes.contains_key(*key)))
        .copied()
}
